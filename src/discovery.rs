//! Service discovery descriptor and the well-known document rendered from it.
//!
//! The descriptor is the single source of truth for the top-level path prefixes the registry
//! exposes, so the well-known endpoint and the internal routers never drift apart. It is built
//! once at process start, handed out by reference, and never mutated afterwards, which makes
//! unsynchronized concurrent reads safe.

// self
use crate::_prelude::*;

/// Local ports the Terraform CLI may bind while waiting for the login redirect.
const LOGIN_PORTS: [u16; 2] = [10000, 10010];
/// OAuth client name advertised to the Terraform CLI.
const LOGIN_CLIENT: &str = "terraform-cli";
/// Grant types the login service accepts.
const LOGIN_GRANT_TYPES: [&str; 1] = ["authz_code"];

/// Immutable table of the top-level path prefixes the registry exposes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDiscovery {
	/// Path prefix of the login API.
	pub login_endpoint: String,
	/// Path prefix of the module registry API.
	pub module_endpoint: String,
	/// Path prefix of the provider registry API.
	pub provider_endpoint: String,
}
impl ServiceDiscovery {
	/// Path of the endpoint that starts an authorization, beneath the login prefix.
	pub fn authorization_endpoint(&self) -> String {
		format!("{}/oauth/authorization", self.login_endpoint)
	}

	/// Path of the endpoint that validates an authorization code, beneath the login prefix.
	pub fn token_endpoint(&self) -> String {
		format!("{}/oauth/token", self.login_endpoint)
	}

	/// Renders the well-known discovery document advertised to clients.
	pub fn document(&self) -> DiscoveryDocument {
		DiscoveryDocument {
			login: LoginDiscovery {
				client: LOGIN_CLIENT.into(),
				grant_types: LOGIN_GRANT_TYPES.iter().map(|grant| (*grant).into()).collect(),
				authz: self.authorization_endpoint(),
				token: self.token_endpoint(),
				ports: LOGIN_PORTS.to_vec(),
			},
			modules: format!("{}/", self.module_endpoint),
			providers: format!("{}/", self.provider_endpoint),
		}
	}
}
impl Default for ServiceDiscovery {
	fn default() -> Self {
		Self {
			login_endpoint: "/v1/login".into(),
			module_endpoint: "/v1/modules".into(),
			provider_endpoint: "/v1/providers".into(),
		}
	}
}

/// Well-known service discovery document.
///
/// Serialized under `/.well-known/terraform.json` per the remote service discovery protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
	/// OAuth client block consumed by the Terraform CLI login flow.
	#[serde(rename = "login.v1")]
	pub login: LoginDiscovery,
	/// Module registry protocol prefix.
	#[serde(rename = "modules.v1")]
	pub modules: String,
	/// Provider registry protocol prefix.
	#[serde(rename = "providers.v1")]
	pub providers: String,
}

/// OAuth client description advertised under `login.v1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginDiscovery {
	/// OAuth client name the CLI should present.
	pub client: String,
	/// Grant types the login service accepts.
	pub grant_types: Vec<String>,
	/// Path that starts an authorization.
	pub authz: String,
	/// Path that validates an authorization code.
	pub token: String,
	/// Local ports the CLI may bind for the redirect listener.
	pub ports: Vec<u16>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_descriptor_exposes_the_literal_prefixes() {
		let discovery = ServiceDiscovery::default();

		assert_eq!(discovery.login_endpoint, "/v1/login");
		assert_eq!(discovery.module_endpoint, "/v1/modules");
		assert_eq!(discovery.provider_endpoint, "/v1/providers");
	}

	#[test]
	fn document_uses_protocol_keys() {
		let document = ServiceDiscovery::default().document();
		let value = serde_json::to_value(&document)
			.expect("Discovery document should serialize successfully.");

		assert_eq!(value["modules.v1"], "/v1/modules/");
		assert_eq!(value["providers.v1"], "/v1/providers/");
		assert_eq!(value["login.v1"]["client"], "terraform-cli");
		assert_eq!(value["login.v1"]["grant_types"][0], "authz_code");
		assert_eq!(value["login.v1"]["authz"], "/v1/login/oauth/authorization");
		assert_eq!(value["login.v1"]["token"], "/v1/login/oauth/token");
		assert_eq!(value["login.v1"]["ports"][0], 10000);
		assert_eq!(value["login.v1"]["ports"][1], 10010);
	}
}
