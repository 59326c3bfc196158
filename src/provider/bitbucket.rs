//! Bitbucket Cloud identity provider adapter.

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

const OAUTH_BASE: &str = "https://bitbucket.org/site/oauth2";
const API_BASE: &str = "https://api.bitbucket.org/2.0";

/// Validated configuration for the Bitbucket adapter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	/// OAuth consumer key.
	pub client_id: String,
	/// OAuth consumer secret.
	pub client_secret: String,
	/// Restricts access to members of this workspace.
	pub workspace: Option<String>,
}
impl Config {
	/// Creates a configuration from the required credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), client_secret: client_secret.into(), workspace: None }
	}

	/// Restricts access to members of `workspace` (matched by slug or name).
	pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
		self.workspace = Some(workspace.into());

		self
	}

	/// Validates the configuration and builds the adapter.
	pub fn into_provider(self, http: ExchangeHttpClient) -> Result<BitbucketProvider, ConfigError> {
		self.validate()?;

		Ok(BitbucketProvider {
			client_id: self.client_id,
			client_secret: self.client_secret,
			workspace: self.workspace,
			authorize_endpoint: parse_endpoint("authorization", &format!("{OAUTH_BASE}/authorize"))?,
			token_endpoint: parse_endpoint("token", &format!("{OAUTH_BASE}/access_token"))?,
			user_endpoint: parse_endpoint("user", &format!("{API_BASE}/user"))?,
			emails_endpoint: parse_endpoint("user emails", &format!("{API_BASE}/user/emails"))?,
			workspaces_endpoint: parse_endpoint(
				"workspace permissions",
				&format!("{API_BASE}/user/permissions/workspaces"),
			)?,
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

		Ok(())
	}
}

/// Concrete [`IdentityProvider`] backed by Bitbucket Cloud.
#[derive(Clone, Debug)]
pub struct BitbucketProvider {
	client_id: String,
	client_secret: String,
	workspace: Option<String>,
	authorize_endpoint: Url,
	token_endpoint: Url,
	user_endpoint: Url,
	emails_endpoint: Url,
	workspaces_endpoint: Url,
	http: ExchangeHttpClient,
}
impl BitbucketProvider {
	async fn fetch_access_token(&self, code: &str) -> Result<String, ExchangeError> {
		let response = self
			.http
			.post(self.token_endpoint.clone())
			.basic_auth(&self.client_id, Some(&self.client_secret))
			.header(ACCEPT, "application/json")
			.form(&[("grant_type", "authorization_code"), ("code", code)])
			.send()
			.await
			.map_err(TransportError::from)?;
		let body = read_success_body("token", response).await?;

		decode_json::<TokenResponse>("token", &body)?.into_access_token()
	}

	async fn fetch_api(
		&self,
		endpoint: &'static str,
		url: Url,
		token: &str,
	) -> Result<String, ExchangeError> {
		let response = self
			.http
			.get(url)
			.header(ACCEPT, "application/json")
			.header(AUTHORIZATION, format!("Bearer {token}"))
			.send()
			.await
			.map_err(TransportError::from)?;

		read_success_body(endpoint, response).await
	}

	async fn fetch_user_name(&self, token: &str) -> Result<String, ExchangeError> {
		#[derive(Deserialize)]
		struct User {
			display_name: Option<String>,
			username: Option<String>,
		}

		let body = self.fetch_api("user", self.user_endpoint.clone(), token).await?;
		let user: User = decode_json("user", &body)?;

		user.display_name
			.filter(|name| !name.is_empty())
			.or(user.username)
			.ok_or(ExchangeError::MissingClaim { claim: "display_name" })
	}

	async fn fetch_primary_email(&self, token: &str) -> Result<String, ExchangeError> {
		#[derive(Deserialize)]
		struct Emails {
			values: Vec<Email>,
		}
		#[derive(Deserialize)]
		struct Email {
			email: String,
			#[serde(default)]
			is_primary: bool,
		}

		let body = self.fetch_api("user emails", self.emails_endpoint.clone(), token).await?;
		let emails: Emails = decode_json("user emails", &body)?;

		emails
			.values
			.into_iter()
			.find(|entry| entry.is_primary)
			.map(|entry| entry.email)
			.ok_or(ExchangeError::NoVerifiedEmail)
	}

	async fn ensure_membership(&self, token: &str) -> Result<(), ExchangeError> {
		#[derive(Deserialize)]
		struct Permissions {
			values: Vec<Permission>,
		}
		#[derive(Deserialize)]
		struct Permission {
			workspace: Workspace,
		}
		#[derive(Deserialize)]
		struct Workspace {
			slug: Option<String>,
			name: Option<String>,
		}

		let Some(workspace) = &self.workspace else {
			return Ok(());
		};
		let body = self
			.fetch_api("workspace permissions", self.workspaces_endpoint.clone(), token)
			.await?;
		let permissions: Permissions = decode_json("workspace permissions", &body)?;
		let is_member = permissions.values.iter().any(|permission| {
			permission.workspace.slug.as_deref() == Some(workspace)
				|| permission.workspace.name.as_deref() == Some(workspace)
		});

		if is_member {
			Ok(())
		} else {
			Err(ExchangeError::MembershipDenied {
				requirement: "workspace",
				detail: format!("user is not a member of the {workspace} workspace"),
			})
		}
	}
}
#[async_trait]
impl IdentityProvider for BitbucketProvider {
	fn kind(&self) -> ProviderKind {
		ProviderKind::Bitbucket
	}

	fn authorize_url(&self, state: &str) -> Url {
		let mut url = self.authorize_endpoint.clone();

		url.set_query(Some(&format!(
			"client_id={}&state={state}&response_type=code",
			self.client_id
		)));

		url
	}

	async fn user_details(&self, code: &str) -> Result<UserDetails, ExchangeError> {
		observed_exchange(self.kind(), async {
			let token = self.fetch_access_token(code).await?;
			let name = self.fetch_user_name(&token).await?;
			let email = self.fetch_primary_email(&token).await?;

			self.ensure_membership(&token).await?;

			Ok(UserDetails { name, email })
		})
		.await
	}
}
