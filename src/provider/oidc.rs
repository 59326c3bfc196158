//! Generic OpenID Connect identity provider adapter.
//!
//! Unlike the hosted adapters, nothing is assumed about the issuer: every endpoint is supplied
//! through configuration, which is what lets the registry sit behind Keycloak, Okta, Dex, or
//! any other OIDC-compatible deployment.

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

const SCOPE: &str = "openid";

/// Validated configuration for the generic OIDC adapter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// Issuer's authorization endpoint.
	pub authorize_url: String,
	/// Issuer's token endpoint.
	pub token_url: String,
	/// Issuer's userinfo endpoint.
	pub userinfo_url: String,
	/// Redirect URI registered with the issuer.
	pub redirect_url: String,
}
impl Config {
	/// Validates the configuration and builds the adapter.
	pub fn into_provider(self, http: ExchangeHttpClient) -> Result<OidcProvider, ConfigError> {
		self.validate()?;

		Ok(OidcProvider {
			client_id: self.client_id,
			client_secret: self.client_secret,
			redirect_url: self.redirect_url,
			authorize_endpoint: parse_endpoint("authorization", &self.authorize_url)?,
			token_endpoint: parse_endpoint("token", &self.token_url)?,
			userinfo_endpoint: parse_endpoint("userinfo", &self.userinfo_url)?,
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
		if self.authorize_url.is_empty() {
			return Err(ConfigError::MissingEndpoint { endpoint: "authorization" });
		}
		if self.token_url.is_empty() {
			return Err(ConfigError::MissingEndpoint { endpoint: "token" });
		}
		if self.userinfo_url.is_empty() {
			return Err(ConfigError::MissingEndpoint { endpoint: "userinfo" });
		}
		if self.redirect_url.is_empty() {
			return Err(ConfigError::MissingRedirectUri);
		}

		Ok(())
	}
}

/// Concrete [`IdentityProvider`] backed by any OIDC-compatible issuer.
#[derive(Clone, Debug)]
pub struct OidcProvider {
	client_id: String,
	client_secret: String,
	redirect_url: String,
	authorize_endpoint: Url,
	token_endpoint: Url,
	userinfo_endpoint: Url,
	http: ExchangeHttpClient,
}
impl OidcProvider {
	async fn fetch_access_token(&self, code: &str) -> Result<String, ExchangeError> {
		let response = self
			.http
			.post(self.token_endpoint.clone())
			.header(ACCEPT, "application/json")
			.form(&[
				("client_id", self.client_id.as_str()),
				("client_secret", self.client_secret.as_str()),
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
			sub: Option<String>,
			name: Option<String>,
			email: Option<String>,
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
		// `name` is an optional claim under the bare `openid` scope; `sub` always exists.
		let name = claims
			.name
			.filter(|name| !name.is_empty())
			.or(claims.sub)
			.ok_or(ExchangeError::MissingClaim { claim: "sub" })?;
		let email = claims.email.ok_or(ExchangeError::MissingClaim { claim: "email" })?;

		Ok(UserDetails { name, email })
	}
}
#[async_trait]
impl IdentityProvider for OidcProvider {
	fn kind(&self) -> ProviderKind {
		ProviderKind::Oidc
	}

	fn authorize_url(&self, state: &str) -> Url {
		let mut url = self.authorize_endpoint.clone();

		url.set_query(Some(&format!(
			"client_id={}&state={state}&response_type=code&redirect_uri={}&scope={SCOPE}",
			self.client_id, self.redirect_url,
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
