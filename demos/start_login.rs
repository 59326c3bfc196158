//! Walks through the first half of a registry login: folding the CLI's authorization request
//! into a provider `state` payload and producing the redirect URL for the active provider.

// crates.io
use color_eyre::Result;
// self
use registry_auth::{
	http::ExchangeHttpClient,
	provider::{IdentityProvider, ProviderSettings, github},
	session::{AuthorizationRequest, CHALLENGE_METHOD_S256, CodeComponents, challenge_of},
};

const SALT: &str = "demo-salt";

fn main() -> Result<()> {
	color_eyre::install()?;

	let settings = ProviderSettings::GitHub(
		github::Config::new("demo-client", "demo-secret").organization("acme"),
	);
	let provider = settings.into_provider(ExchangeHttpClient::with_default_timeout()?)?;
	let request = AuthorizationRequest {
		client_id: "terraform-cli".into(),
		code_challenge: challenge_of("demo-verifier"),
		code_challenge_method: CHALLENGE_METHOD_S256.into(),
		redirect_uri: "http://localhost:10000/login".into(),
		response_type: "code".into(),
		state: "cli-generated-state".into(),
	};
	let state = request.to_payload(SALT)?;

	println!("Send your user to {}.", provider.authorize_url(state.as_str()));

	// Simulate the redirect handler recovering the request from the returned state.
	let recovered = state.to_request(SALT)?;

	println!("Recovered CLI state `{}` for client `{}`.", recovered.state, recovered.client_id);

	// After `user_details` resolves an identity, the login service seals it into the
	// authorization code it hands back to the CLI.
	let code = CodeComponents {
		key: "demo-exchange-key".into(),
		code_challenge: recovered.code_challenge,
		code_challenge_method: recovered.code_challenge_method,
		user_name: "Jane Doe".into(),
		user_email: "jane@example.com".into(),
	}
	.to_payload(SALT)?;
	let components = code.to_code_components(SALT)?;

	components.verify_challenge("demo-verifier")?;
	println!("Issued code for {} <{}>.", components.user_name, components.user_email);

	Ok(())
}
