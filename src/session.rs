//! Login session payloads round-tripped through the provider redirect.
//!
//! The login flow folds the inbound authorization request into the opaque `state` parameter it
//! sends to the identity provider, and folds the resolved identity (plus the PKCE challenge)
//! into the authorization code it hands back to the CLI. Both payloads share one sealed codec:
//! `base64(salt + "/" + json)`, where the salt is a process-local secret that ties a payload to
//! the instance that minted it. Decoding verifies the salt prefix before touching the JSON.

// crates.io
use base64::{
	Engine as _,
	engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Challenge method accepted by [`CodeComponents::verify_challenge`].
pub const CHALLENGE_METHOD_S256: &str = "S256";

/// Errors raised by the session payload codec.
#[derive(Debug, ThisError)]
pub enum SessionError {
	/// Payload could not be serialized to JSON.
	#[error("Session payload could not be serialized.")]
	Encode {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Payload is not valid base64.
	#[error("Session payload is not valid base64.")]
	InvalidBase64(#[from] base64::DecodeError),
	/// Payload did not decode to UTF-8 text.
	#[error("Session payload is not valid UTF-8.")]
	InvalidUtf8(#[from] std::string::FromUtf8Error),
	/// Payload was sealed by a different instance.
	#[error("Session payload does not match the expected salt.")]
	SaltMismatch,
	/// Payload JSON could not be decoded.
	#[error("Session payload contains malformed JSON.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Only S256 challenges are verifiable.
	#[error("The `{method}` code challenge method is not supported.")]
	UnsupportedChallengeMethod {
		/// Method requested by the client.
		method: String,
	},
	/// Verifier hash does not match the stored challenge.
	#[error("Code verification failed.")]
	ChallengeMismatch,
}

/// Opaque, base64-encoded session payload round-tripped through a provider redirect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatePayload(String);
impl StatePayload {
	/// Borrows the encoded payload text.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Recovers the authorization request folded into a `state` parameter.
	pub fn to_request(&self, salt: &str) -> Result<AuthorizationRequest, SessionError> {
		open(&self.0, salt)
	}

	/// Recovers the code components folded into an authorization code.
	pub fn to_code_components(&self, salt: &str) -> Result<CodeComponents, SessionError> {
		open(&self.0, salt)
	}
}
impl From<String> for StatePayload {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for StatePayload {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Display for StatePayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Authorization request folded into the provider `state` parameter.
///
/// Carrying the request through the redirect keeps the login endpoint stateless: whatever comes
/// back from the provider is everything needed to resume the flow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
	/// OAuth client identifier supplied by the CLI.
	pub client_id: String,
	/// PKCE code challenge supplied by the CLI.
	pub code_challenge: String,
	/// PKCE code challenge method supplied by the CLI.
	pub code_challenge_method: String,
	/// Redirect URI the CLI is listening on.
	pub redirect_uri: String,
	/// OAuth response type (`code`).
	pub response_type: String,
	/// Anti-forgery token generated by the CLI.
	pub state: String,
}
impl AuthorizationRequest {
	/// Seals the request into an opaque payload usable as a provider `state` parameter.
	pub fn to_payload(&self, salt: &str) -> Result<StatePayload, SessionError> {
		seal(salt, self)
	}
}

/// Components folded into the authorization code handed back to the CLI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeComponents {
	/// Exchange key that ties the code to the issuing instance.
	pub key: String,
	/// PKCE code challenge captured from the original request.
	pub code_challenge: String,
	/// PKCE code challenge method captured from the original request.
	pub code_challenge_method: String,
	/// Resolved display name.
	pub user_name: String,
	/// Resolved primary email address.
	pub user_email: String,
}
impl CodeComponents {
	/// Seals the components into an opaque payload usable as an authorization code.
	pub fn to_payload(&self, salt: &str) -> Result<StatePayload, SessionError> {
		seal(salt, self)
	}

	/// Checks a PKCE code verifier against the stored challenge.
	///
	/// Only `S256` is accepted: the verifier is hashed with SHA-256, encoded as unpadded
	/// base64url, and compared against the stored challenge.
	pub fn verify_challenge(&self, verifier: &str) -> Result<(), SessionError> {
		if self.code_challenge_method != CHALLENGE_METHOD_S256 {
			return Err(SessionError::UnsupportedChallengeMethod {
				method: self.code_challenge_method.clone(),
			});
		}
		if challenge_of(verifier) != self.code_challenge {
			return Err(SessionError::ChallengeMismatch);
		}

		Ok(())
	}
}

/// Computes the S256 challenge for a code verifier.
pub fn challenge_of(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn seal<T>(salt: &str, value: &T) -> Result<StatePayload, SessionError>
where
	T: Serialize,
{
	let json = serde_json::to_string(value).map_err(|source| SessionError::Encode { source })?;

	Ok(StatePayload(STANDARD.encode(format!("{salt}/{json}"))))
}

fn open<T>(payload: &str, salt: &str) -> Result<T, SessionError>
where
	T: DeserializeOwned,
{
	let raw = String::from_utf8(STANDARD.decode(payload)?)?;
	let json = raw
		.strip_prefix(salt)
		.and_then(|rest| rest.strip_prefix('/'))
		.ok_or(SessionError::SaltMismatch)?;
	let mut deserializer = serde_json::Deserializer::from_str(json);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| SessionError::Decode { source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const SALT: &str = "unit-salt";

	fn request() -> AuthorizationRequest {
		AuthorizationRequest {
			client_id: "terraform-cli".into(),
			code_challenge: challenge_of("verifier-123"),
			code_challenge_method: CHALLENGE_METHOD_S256.into(),
			redirect_uri: "http://localhost:10000/login".into(),
			response_type: "code".into(),
			state: "state-abc".into(),
		}
	}

	#[test]
	fn request_payload_round_trips() {
		let request = request();
		let payload =
			request.to_payload(SALT).expect("Request should seal into a payload successfully.");
		let recovered = payload
			.to_request(SALT)
			.expect("Payload sealed with the same salt should open successfully.");

		assert_eq!(recovered, request);
	}

	#[test]
	fn mismatched_salt_is_rejected() {
		let payload = request()
			.to_payload(SALT)
			.expect("Request should seal into a payload successfully.");
		let err = payload
			.to_request("other-salt")
			.expect_err("Payload sealed with a different salt must be rejected.");

		assert!(matches!(err, SessionError::SaltMismatch));
	}

	#[test]
	fn garbage_payloads_are_rejected() {
		assert!(matches!(
			StatePayload::from("not base64!").to_request(SALT),
			Err(SessionError::InvalidBase64(_))
		));

		let sealed_garbage = StatePayload::from(STANDARD.encode(format!("{SALT}/not json")));

		assert!(matches!(sealed_garbage.to_request(SALT), Err(SessionError::Decode { .. })));
	}

	#[test]
	fn challenge_verification_accepts_the_matching_verifier() {
		let components = CodeComponents {
			key: "exchange-key".into(),
			code_challenge: challenge_of("verifier-123"),
			code_challenge_method: CHALLENGE_METHOD_S256.into(),
			user_name: "Jane Doe".into(),
			user_email: "jane@example.com".into(),
		};

		components
			.verify_challenge("verifier-123")
			.expect("Matching verifier should pass verification.");

		assert!(matches!(
			components.verify_challenge("verifier-456"),
			Err(SessionError::ChallengeMismatch)
		));
	}

	#[test]
	fn plain_challenge_method_is_unsupported() {
		let components = CodeComponents {
			code_challenge: "verifier-123".into(),
			code_challenge_method: "plain".into(),
			..Default::default()
		};
		let err = components
			.verify_challenge("verifier-123")
			.expect_err("Plain challenges must be rejected.");

		assert!(matches!(err, SessionError::UnsupportedChallengeMethod { .. }));
	}

	#[test]
	fn code_components_round_trip() {
		let components = CodeComponents {
			key: "exchange-key".into(),
			code_challenge: challenge_of("verifier-123"),
			code_challenge_method: CHALLENGE_METHOD_S256.into(),
			user_name: "Jane Doe".into(),
			user_email: "jane@example.com".into(),
		};
		let payload = components
			.to_payload(SALT)
			.expect("Components should seal into a payload successfully.");
		let recovered = payload
			.to_code_components(SALT)
			.expect("Payload sealed with the same salt should open successfully.");

		assert_eq!(recovered, components);
	}
}
