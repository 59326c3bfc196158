//! GitLab identity provider adapter.
//!
//! GitLab exposes an OpenID Connect layer, so the exchange posts the code to `/oauth/token`
//! with HTTP Basic client authentication and reads identity claims from `/oauth/userinfo`.

// crates.io
use reqwest::header::{ACCEPT, AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::UserDetails,
	error::{ConfigError, ExchangeError, TransportError},
	http::{ExchangeHttpClient, decode_json, read_success_body},
	provider::{IdentityProvider, ProviderKind, TokenResponse, observed_exchange, parse_endpoint},
};

const DEFAULT_HOST: &str = "gitlab.com";
const SCOPES: [&str; 2] = ["email", "openid"];

/// Validated configuration for the GitLab adapter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	/// OAuth application client identifier.
	pub client_id: String,
	/// OAuth application client secret.
	pub client_secret: String,
	/// Redirect URI; must match the application configuration on the GitLab side exactly.
	pub redirect_url: String,
	/// GitLab host with an optional port; self-hosted installations override this.
	pub host: Option<String>,
	/// Restricts access to members of these groups.
	pub groups: Vec<String>,
}
impl Config {
	/// Creates a configuration from the required credentials and redirect URI.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		redirect_url: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			redirect_url: redirect_url.into(),
			..Default::default()
		}
	}

	/// Points the adapter at a self-hosted GitLab installation.
	pub fn host(mut self, host: impl Into<String>) -> Self {
		self.host = Some(host.into());

		self
	}

	/// Restricts access to members of the given groups.
	pub fn groups<I>(mut self, groups: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		self.groups = groups.into_iter().map(Into::into).collect();

		self
	}

	/// Validates the configuration and builds the adapter.
	pub fn into_provider(self, http: ExchangeHttpClient) -> Result<GitLabProvider, ConfigError> {
		self.validate()?;

		let base = format!("https://{}/oauth", self.host.as_deref().unwrap_or(DEFAULT_HOST));

		Ok(GitLabProvider {
			client_id: self.client_id,
			client_secret: self.client_secret,
			redirect_url: self.redirect_url,
			groups: self.groups,
			authorize_endpoint: parse_endpoint("authorization", &format!("{base}/authorize"))?,
			token_endpoint: parse_endpoint("token", &format!("{base}/token"))?,
			userinfo_endpoint: parse_endpoint("userinfo", &format!("{base}/userinfo"))?,
			http,
		})
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.client_secret.is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}
		if self.redirect_url.is_empty() {
			return Err(ConfigError::MissingRedirectUri);
		}

		Ok(())
	}
}

/// Concrete [`IdentityProvider`] backed by GitLab.
#[derive(Clone, Debug)]
pub struct GitLabProvider {
	client_id: String,
	client_secret: String,
	redirect_url: String,
	/// Groups the user must belong to; empty means no restriction.
	groups: Vec<String>,
	authorize_endpoint: Url,
	token_endpoint: Url,
	userinfo_endpoint: Url,
	http: ExchangeHttpClient,
}
impl GitLabProvider {
	async fn fetch_access_token(&self, code: &str) -> Result<String, ExchangeError> {
		let response = self
			.http
			.post(self.token_endpoint.clone())
			.basic_auth(&self.client_id, Some(&self.client_secret))
			.header(ACCEPT, "application/json")
			.form(&[
				("grant_type", "authorization_code"),
				("code", code),
				("redirect_uri", self.redirect_url.as_str()),
			])
			.send()
			.await
			.map_err(TransportError::from)?;
		let body = read_success_body("token", response).await?;

		decode_json::<TokenResponse>("token", &body)?.into_access_token()
	}

	async fn fetch_identity(&self, token: &str) -> Result<UserDetails, ExchangeError> {
		#[derive(Deserialize)]
		struct Claims {
			name: Option<String>,
			email: Option<String>,
			#[serde(default)]
			groups: Vec<String>,
		}

		let response = self
			.http
			.get(self.userinfo_endpoint.clone())
			.header(ACCEPT, "application/json")
			.header(AUTHORIZATION, format!("Bearer {token}"))
			.send()
			.await
			.map_err(TransportError::from)?;
		let body = read_success_body("userinfo", response).await?;
		let claims: Claims = decode_json("userinfo", &body)?;
		let name = claims.name.ok_or(ExchangeError::MissingClaim { claim: "name" })?;
		let email = claims.email.ok_or(ExchangeError::MissingClaim { claim: "email" })?;

		if !self.groups.is_empty()
			&& !self.groups.iter().any(|group| claims.groups.contains(group))
		{
			return Err(ExchangeError::MembershipDenied {
				requirement: "group",
				detail: format!(
					"user is not a member of any of the groups: {}",
					self.groups.join(",")
				),
			});
		}

		Ok(UserDetails { name, email })
	}
}
#[async_trait]
impl IdentityProvider for GitLabProvider {
	fn kind(&self) -> ProviderKind {
		ProviderKind::GitLab
	}

	fn authorize_url(&self, state: &str) -> Url {
		let mut url = self.authorize_endpoint.clone();

		url.set_query(Some(&format!(
			"client_id={}&state={state}&response_type=code&redirect_uri={}&scope={}",
			self.client_id,
			self.redirect_url,
			SCOPES.join("+"),
		)));

		url
	}

	async fn user_details(&self, code: &str) -> Result<UserDetails, ExchangeError> {
		observed_exchange(self.kind(), async {
			let token = self.fetch_access_token(code).await?;

			self.fetch_identity(&token).await
		})
		.await
	}
}
