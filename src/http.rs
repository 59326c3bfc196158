//! Transport primitives shared by the provider adapters.
//!
//! Every adapter receives an [`ExchangeHttpClient`] at construction time and keeps a clone of
//! it. Reqwest clients are cheap handles over a shared connection pool, so concurrent exchanges
//! across unrelated requests never contend on adapter state.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
use std::time::Duration;
// crates.io
#[cfg(feature = "reqwest")] use serde::de::DeserializeOwned;
// self
#[cfg(feature = "reqwest")]
use crate::{
	_prelude::*,
	error::{ConfigError, ExchangeError, TransportError},
};

/// Request-scoped timeout applied by [`ExchangeHttpClient::with_default_timeout`].
///
/// The code exchange blocks a login round-trip, so a stalled provider should fail the request
/// instead of holding it open.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that token endpoints
/// return results directly instead of delegating to another URI. Configure any custom
/// [`ReqwestClient`] accordingly before handing it to [`ExchangeHttpClient::with_client`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ExchangeHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ExchangeHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that aborts every exchange request after `timeout`.
	pub fn with_timeout(timeout: Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Builds a client with the [`DEFAULT_EXCHANGE_TIMEOUT`] applied.
	pub fn with_default_timeout() -> Result<Self, ConfigError> {
		Self::with_timeout(DEFAULT_EXCHANGE_TIMEOUT)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ExchangeHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ExchangeHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Reads the response body, mapping non-success statuses to [`ExchangeError::Rejected`].
#[cfg(feature = "reqwest")]
pub(crate) async fn read_success_body(
	endpoint: &'static str,
	response: reqwest::Response,
) -> Result<String, ExchangeError> {
	let status = response.status();
	let body = response.text().await.map_err(TransportError::from)?;

	if !status.is_success() {
		return Err(ExchangeError::Rejected { endpoint, status: status.as_u16() });
	}

	Ok(body)
}

/// Decodes a JSON payload, attributing failures to `endpoint`.
#[cfg(feature = "reqwest")]
pub(crate) fn decode_json<T>(endpoint: &'static str, body: &str) -> Result<T, ExchangeError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_str(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ExchangeError::MalformedResponse { endpoint, source })
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	#[derive(Debug, serde::Deserialize)]
	struct Probe {
		value: u8,
	}

	#[test]
	fn decode_json_reports_endpoint_and_path() {
		let probe: Probe = decode_json("token", r#"{"value":7}"#)
			.expect("Well-formed payload should decode successfully.");

		assert_eq!(probe.value, 7);

		let err = decode_json::<Probe>("token", r#"{"value":"seven"}"#)
			.expect_err("Type mismatch should fail decoding.");

		assert!(matches!(err, ExchangeError::MalformedResponse { endpoint: "token", .. }));
	}

	#[test]
	fn with_timeout_builds_a_client() {
		ExchangeHttpClient::with_timeout(Duration::from_secs(1))
			.expect("Timeout-bound client should build successfully.");
		ExchangeHttpClient::with_default_timeout()
			.expect("Default-timeout client should build successfully.");
	}
}
