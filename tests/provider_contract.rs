#![cfg(feature = "reqwest")]

// self
use registry_auth::{
	http::ExchangeHttpClient,
	provider::{IdentityProvider, ProviderKind, ProviderSettings, bitbucket, github, gitlab, oidc},
};

// Opaque tokens are embedded verbatim, including the base64 alphabet.
const STATE_FIXTURES: [&str; 3] =
	["plain-state", "c3RhdGUtMTIz+/=", "eyJhbGciOiJIUzI1NiJ9.payload.sig"];

fn all_settings() -> Vec<ProviderSettings> {
	vec![
		ProviderSettings::GitHub(github::Config::new("client-123", "secret")),
		ProviderSettings::GitLab(gitlab::Config::new(
			"client-123",
			"secret",
			"https://registry.example.com/callback",
		)),
		ProviderSettings::Bitbucket(bitbucket::Config::new("client-123", "secret")),
		ProviderSettings::Oidc(oidc::Config {
			client_id: "client-123".into(),
			client_secret: "secret".into(),
			authorize_url: "https://issuer.example.com/authorize".into(),
			token_url: "https://issuer.example.com/token".into(),
			userinfo_url: "https://issuer.example.com/userinfo".into(),
			redirect_url: "https://registry.example.com/callback".into(),
		}),
	]
}

#[test]
fn settings_report_their_backend() {
	let kinds: Vec<ProviderKind> =
		all_settings().iter().map(ProviderSettings::kind).collect();

	assert_eq!(kinds, [
		ProviderKind::GitHub,
		ProviderKind::GitLab,
		ProviderKind::Bitbucket,
		ProviderKind::Oidc
	]);
}

#[test]
fn every_adapter_builds_and_keeps_its_kind() {
	for settings in all_settings() {
		let kind = settings.kind();
		let provider = settings
			.into_provider(ExchangeHttpClient::default())
			.expect("Valid settings should build a provider.");

		assert_eq!(provider.kind(), kind);
	}
}

#[test]
fn every_adapter_embeds_the_state_token_verbatim() {
	for settings in all_settings() {
		let kind = settings.kind();
		let provider = settings
			.into_provider(ExchangeHttpClient::default())
			.expect("Valid settings should build a provider.");

		for state in STATE_FIXTURES {
			let url = provider.authorize_url(state);

			assert!(
				url.as_str().contains(&format!("state={state}")),
				"{kind} dropped or mutated the state token in {url}",
			);
		}
	}
}

#[test]
fn authorize_urls_are_pure_construction() {
	let provider = ProviderSettings::GitHub(github::Config::new("client-123", "secret"))
		.into_provider(ExchangeHttpClient::default())
		.expect("Valid settings should build a provider.");

	assert_eq!(provider.authorize_url("repeat"), provider.authorize_url("repeat"));
}
