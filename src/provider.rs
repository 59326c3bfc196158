//! Identity provider contract and the concrete OAuth adapters.
//!
//! [`IdentityProvider`] is the boundary the authentication orchestrator is written against:
//! two operations, one pure URL construction and one network exchange. The adapters cover the
//! backends the registry supports (GitHub, GitLab, Bitbucket, and generic OIDC) and are
//! selected once at startup through [`ProviderSettings`], so the orchestrator never learns
//! which concrete provider is active.

#[cfg(feature = "reqwest")] pub mod bitbucket;
#[cfg(feature = "reqwest")] pub mod github;
#[cfg(feature = "reqwest")] pub mod gitlab;
#[cfg(feature = "reqwest")] pub mod oidc;

// self
use crate::{_prelude::*, auth::UserDetails, error::ExchangeError};
#[cfg(feature = "reqwest")]
use crate::{
	error::ConfigError,
	http::ExchangeHttpClient,
	obs::{ExchangeOutcome, ExchangeSpan, record_exchange_outcome},
};

/// Identity provider backends supported by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
	/// GitHub or GitHub Enterprise.
	GitHub,
	/// GitLab (self-hosted or gitlab.com).
	GitLab,
	/// Bitbucket Cloud.
	Bitbucket,
	/// Any OpenID Connect compatible issuer.
	Oidc,
}
impl ProviderKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ProviderKind::GitHub => "github",
			ProviderKind::GitLab => "gitlab",
			ProviderKind::Bitbucket => "bitbucket",
			ProviderKind::Oidc => "oidc",
		}
	}
}
impl Display for ProviderKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Contract every OAuth identity provider satisfies.
///
/// Implementations hold immutable configuration plus a cloned HTTP client, so unrelated
/// requests can call [`user_details`](IdentityProvider::user_details) concurrently without any
/// shared mutable state between calls.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
	/// Which backend this provider talks to.
	fn kind(&self) -> ProviderKind;

	/// Builds the authorization-redirect URL for this provider.
	///
	/// The caller-supplied anti-forgery `state` token is embedded verbatim so it can be
	/// validated on callback; callers must supply a URL-safe token. Pure construction, no side
	/// effects.
	fn authorize_url(&self, state: &str) -> Url;

	/// Exchanges an authorization code for the user's identity details.
	///
	/// Performs network I/O against the provider's token and user-info endpoints; slow and
	/// failure-prone by nature. Fails with an [`ExchangeError`] when the code is invalid or
	/// expired, when the provider is unreachable, or when it returns malformed data. It never
	/// resolves to a partially populated identity.
	async fn user_details(&self, code: &str) -> Result<UserDetails, ExchangeError>;
}

/// Startup selection of the active identity provider.
///
/// The orchestrator resolves this once during process initialization and only ever sees the
/// resulting trait object.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "backend")]
pub enum ProviderSettings {
	/// GitHub backend configuration.
	GitHub(github::Config),
	/// GitLab backend configuration.
	GitLab(gitlab::Config),
	/// Bitbucket backend configuration.
	Bitbucket(bitbucket::Config),
	/// Generic OIDC backend configuration.
	Oidc(oidc::Config),
}
#[cfg(feature = "reqwest")]
impl ProviderSettings {
	/// Which backend these settings select.
	pub fn kind(&self) -> ProviderKind {
		match self {
			ProviderSettings::GitHub(_) => ProviderKind::GitHub,
			ProviderSettings::GitLab(_) => ProviderKind::GitLab,
			ProviderSettings::Bitbucket(_) => ProviderKind::Bitbucket,
			ProviderSettings::Oidc(_) => ProviderKind::Oidc,
		}
	}

	/// Validates the configuration and builds the active provider.
	pub fn into_provider(self, http: ExchangeHttpClient) -> Result<Arc<dyn IdentityProvider>> {
		Ok(match self {
			ProviderSettings::GitHub(config) => Arc::new(config.into_provider(http)?),
			ProviderSettings::GitLab(config) => Arc::new(config.into_provider(http)?),
			ProviderSettings::Bitbucket(config) => Arc::new(config.into_provider(http)?),
			ProviderSettings::Oidc(config) => Arc::new(config.into_provider(http)?),
		})
	}
}

/// Standard token endpoint response shared by every adapter.
#[cfg(feature = "reqwest")]
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
	access_token: Option<String>,
	error: Option<String>,
	error_description: Option<String>,
}
#[cfg(feature = "reqwest")]
impl TokenResponse {
	/// Extracts the access token, surfacing provider-reported grant failures.
	pub fn into_access_token(self) -> Result<String, ExchangeError> {
		if let Some(error) = self.error {
			return Err(ExchangeError::InvalidGrant {
				reason: self.error_description.unwrap_or(error),
			});
		}

		self.access_token.ok_or(ExchangeError::MissingClaim { claim: "access_token" })
	}
}

/// Parses a provider endpoint, attributing failures to `endpoint`.
#[cfg(feature = "reqwest")]
pub(crate) fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
}

/// Runs an exchange future under the crate's observability hooks.
#[cfg(feature = "reqwest")]
pub(crate) async fn observed_exchange<F>(
	kind: ProviderKind,
	fut: F,
) -> Result<UserDetails, ExchangeError>
where
	F: Future<Output = Result<UserDetails, ExchangeError>>,
{
	record_exchange_outcome(kind, ExchangeOutcome::Attempt);

	let span = ExchangeSpan::new(kind, "user_details");
	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_exchange_outcome(kind, ExchangeOutcome::Success),
		Err(_) => record_exchange_outcome(kind, ExchangeOutcome::Failure),
	}

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn provider_kind_labels_are_stable() {
		assert_eq!(ProviderKind::GitHub.as_str(), "github");
		assert_eq!(ProviderKind::GitLab.as_str(), "gitlab");
		assert_eq!(ProviderKind::Bitbucket.as_str(), "bitbucket");
		assert_eq!(ProviderKind::Oidc.as_str(), "oidc");
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn token_response_surfaces_grant_failures() {
		let rejected = TokenResponse {
			access_token: None,
			error: Some("bad_verification_code".into()),
			error_description: Some("The code passed is incorrect or expired.".into()),
		};

		assert!(matches!(
			rejected.into_access_token(),
			Err(ExchangeError::InvalidGrant { reason }) if reason.contains("incorrect or expired")
		));

		let empty = TokenResponse { access_token: None, error: None, error_description: None };

		assert!(matches!(
			empty.into_access_token(),
			Err(ExchangeError::MissingClaim { claim: "access_token" })
		));
	}
}
