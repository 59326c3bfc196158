//! Crate-level error types shared across providers, sessions, and discovery consumers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Code-for-identity exchange failure.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// Login session payload codec failure.
	#[error(transparent)]
	Session(#[from] crate::session::SessionError),
}

/// Configuration and validation failures raised while assembling providers.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client identifier is required for every provider.
	#[error("Missing required client ID.")]
	MissingClientId,
	/// Client secret is required for every provider.
	#[error("Missing required client secret.")]
	MissingClientSecret,
	/// Redirect URI is required when the provider echoes it during the exchange.
	#[error("Missing required redirect URI.")]
	MissingRedirectUri,
	/// Team restrictions are scoped to an organization.
	#[error("Missing organization when using teams.")]
	TeamsWithoutOrganization,
	/// Endpoint-configured providers must name every endpoint.
	#[error("Missing required {endpoint} URL.")]
	MissingEndpoint {
		/// Which endpoint was omitted.
		endpoint: &'static str,
	},
	/// Provider endpoint could not be parsed as a URL.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed parsing.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failure raised while exchanging an authorization code for identity details.
///
/// The exchange performs network I/O against the provider's token and user-info endpoints, so
/// callers must treat it as slow and failure-prone. Every variant is propagated; the exchange
/// never falls back to a partially populated identity.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// Provider rejected the authorization code grant.
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Upstream endpoint answered with a non-success status.
	#[error("The {endpoint} endpoint responded with status {status}.")]
	Rejected {
		/// Which endpoint failed.
		endpoint: &'static str,
		/// HTTP status code returned by the provider.
		status: u16,
	},
	/// Upstream endpoint returned JSON that could not be decoded.
	#[error("The {endpoint} endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Which endpoint failed.
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Identity document lacks a claim the registry requires.
	#[error("Identity response is missing the `{claim}` claim.")]
	MissingClaim {
		/// Name of the absent claim.
		claim: &'static str,
	},
	/// None of the reported email addresses is marked primary.
	#[error("Access could not be granted, no verified email information found.")]
	NoVerifiedEmail,
	/// A configured organization, team, group, or workspace restriction was not satisfied.
	#[error("User does not satisfy the {requirement} restriction: {detail}.")]
	MembershipDenied {
		/// Kind of restriction (organization, team, group, workspace).
		requirement: &'static str,
		/// Human-readable explanation.
		detail: String,
	},
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
