//! GitHub (and GitHub Enterprise) identity provider adapter.
//!
//! The exchange follows GitHub's OAuth web flow: the authorization code is posted to the
//! access-token endpoint, then the user and email documents are fetched from the REST API.
//! Optional organization and team restrictions are enforced before any identity is returned.

// crates.io
use reqwest::header::{ACCEPT, AUTHORIZATION};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::UserDetails,
	error::{ConfigError, ExchangeError, TransportError},
	http::{ExchangeHttpClient, decode_json, read_success_body},
	provider::{IdentityProvider, ProviderKind, TokenResponse, observed_exchange, parse_endpoint},
};

const DEFAULT_DOMAIN: &str = "github.com";
const API_ACCEPT: &str = "application/vnd.github.v3+json";

/// Validated configuration for the GitHub adapter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	/// OAuth application client identifier.
	pub client_id: String,
	/// OAuth application client secret.
	pub client_secret: String,
	/// Restricts access to members of this organization.
	pub organization: Option<String>,
	/// Restricts access to members of these team slugs; requires an organization.
	pub teams: Vec<String>,
	/// GitHub host; GitHub Enterprise installations override this.
	pub domain: Option<String>,
}
impl Config {
	/// Creates a configuration from the required credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), client_secret: client_secret.into(), ..Default::default() }
	}

	/// Restricts access to members of `organization`.
	pub fn organization(mut self, organization: impl Into<String>) -> Self {
		self.organization = Some(organization.into());

		self
	}

	/// Restricts access to members of the given team slugs.
	pub fn teams<I>(mut self, teams: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		self.teams = teams.into_iter().map(Into::into).collect();

		self
	}

	/// Points the adapter at a GitHub Enterprise host.
	pub fn domain(mut self, domain: impl Into<String>) -> Self {
		self.domain = Some(domain.into());

		self
	}

	/// Validates the configuration and builds the adapter.
	pub fn into_provider(self, http: ExchangeHttpClient) -> Result<GitHubProvider, ConfigError> {
		self.validate()?;

		let domain = self.domain.as_deref().unwrap_or(DEFAULT_DOMAIN);
		// GitHub Enterprise serves the REST API under `/api/v3` instead of a dedicated host.
		let api = if domain.eq_ignore_ascii_case(DEFAULT_DOMAIN) {
			"https://api.github.com".to_owned()
		} else {
			format!("https://{domain}/api/v3")
		};
		let organization = self
			.organization
			.map(|name| {
				Ok::<_, ConfigError>(OrganizationGate {
					membership_endpoint: parse_endpoint(
						"organization membership",
						&format!("{api}/user/memberships/orgs/{name}"),
					)?,
					teams_endpoint: parse_endpoint("teams", &format!("{api}/orgs/{name}/teams"))?,
					name,
					teams: self.teams,
				})
			})
			.transpose()?;

		Ok(GitHubProvider {
			client_id: self.client_id,
			client_secret: self.client_secret,
			organization,
			authorize_endpoint: parse_endpoint(
				"authorization",
				&format!("https://{domain}/login/oauth/authorize"),
			)?,
			token_endpoint: parse_endpoint(
				"token",
				&format!("https://{domain}/login/oauth/access_token"),
			)?,
			user_endpoint: parse_endpoint("user", &format!("{api}/user"))?,
			emails_endpoint: parse_endpoint("user emails", &format!("{api}/user/emails"))?,
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
		if !self.teams.is_empty() && self.organization.is_none() {
			return Err(ConfigError::TeamsWithoutOrganization);
		}

		Ok(())
	}
}

/// Membership restrictions resolved against one organization.
#[derive(Clone, Debug)]
struct OrganizationGate {
	name: String,
	membership_endpoint: Url,
	/// Team slugs the user must belong to; empty means organization membership suffices.
	teams: Vec<String>,
	teams_endpoint: Url,
}

/// Concrete [`IdentityProvider`] backed by GitHub.
#[derive(Clone, Debug)]
pub struct GitHubProvider {
	client_id: String,
	client_secret: String,
	organization: Option<OrganizationGate>,
	authorize_endpoint: Url,
	token_endpoint: Url,
	user_endpoint: Url,
	emails_endpoint: Url,
	http: ExchangeHttpClient,
}
impl GitHubProvider {
	async fn fetch_access_token(&self, code: &str) -> Result<String, ExchangeError> {
		let mut url = self.token_endpoint.clone();

		url.set_query(Some(&format!(
			"client_id={}&client_secret={}&code={code}",
			self.client_id, self.client_secret
		)));

		let response = self
			.http
			.post(url)
			.header(ACCEPT, "application/json")
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
			.header(ACCEPT, API_ACCEPT)
			.header(AUTHORIZATION, format!("token {token}"))
			.send()
			.await
			.map_err(TransportError::from)?;

		read_success_body(endpoint, response).await
	}

	async fn fetch_user_name(&self, token: &str) -> Result<String, ExchangeError> {
		#[derive(Deserialize)]
		struct User {
			name: Option<String>,
			login: Option<String>,
		}

		let body = self.fetch_api("user", self.user_endpoint.clone(), token).await?;
		let user: User = decode_json("user", &body)?;

		// The profile name is optional on GitHub; the login always exists.
		user.name
			.filter(|name| !name.is_empty())
			.or(user.login)
			.ok_or(ExchangeError::MissingClaim { claim: "name" })
	}

	async fn fetch_primary_email(&self, token: &str) -> Result<String, ExchangeError> {
		#[derive(Deserialize)]
		struct Email {
			email: String,
			#[serde(default)]
			primary: bool,
		}

		let body = self.fetch_api("user emails", self.emails_endpoint.clone(), token).await?;
		let emails: Vec<Email> = decode_json("user emails", &body)?;

		emails
			.into_iter()
			.find(|entry| entry.primary)
			.map(|entry| entry.email)
			.ok_or(ExchangeError::NoVerifiedEmail)
	}

	async fn ensure_membership(&self, token: &str) -> Result<(), ExchangeError> {
		#[derive(Deserialize)]
		struct Team {
			slug: String,
		}

		let Some(gate) = &self.organization else {
			return Ok(());
		};
		let response = self
			.http
			.get(gate.membership_endpoint.clone())
			.header(ACCEPT, API_ACCEPT)
			.header(AUTHORIZATION, format!("token {token}"))
			.send()
			.await
			.map_err(TransportError::from)?;

		if !response.status().is_success() {
			return Err(ExchangeError::MembershipDenied {
				requirement: "organization",
				detail: format!("user is not a member of the {} organization", gate.name),
			});
		}
		if gate.teams.is_empty() {
			return Ok(());
		}

		let body = self.fetch_api("teams", gate.teams_endpoint.clone(), token).await?;
		let teams: Vec<Team> = decode_json("teams", &body)?;

		if teams.iter().any(|team| gate.teams.iter().any(|slug| slug == &team.slug)) {
			Ok(())
		} else {
			Err(ExchangeError::MembershipDenied {
				requirement: "team",
				detail: format!(
					"user is not a member of any of the teams: {}",
					gate.teams.join(",")
				),
			})
		}
	}
}
#[async_trait]
impl IdentityProvider for GitHubProvider {
	fn kind(&self) -> ProviderKind {
		ProviderKind::GitHub
	}

	fn authorize_url(&self, state: &str) -> Url {
		let mut scopes = vec!["read:user", "user:email"];

		if self.organization.is_some() {
			scopes.push("read:org");
		}

		let scope: String = form_urlencoded::byte_serialize(scopes.join(" ").as_bytes()).collect();
		let mut url = self.authorize_endpoint.clone();

		url.set_query(Some(&format!(
			"client_id={}&state={state}&scope={scope}",
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

#[cfg(test)]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	// self
	use super::*;
	use crate::_preludet::test_exchange_client;

	/// Builds the adapter from `config`, then repoints it at the mock server.
	fn mock_provider(server: &MockServer, config: Config) -> GitHubProvider {
		let parse = |path: &str| {
			Url::parse(&server.url(path)).expect("Mock endpoint should parse successfully.")
		};
		let mut provider = config
			.into_provider(test_exchange_client())
			.expect("GitHub configuration should build successfully.");

		provider.token_endpoint = parse("/login/oauth/access_token");
		provider.user_endpoint = parse("/user");
		provider.emails_endpoint = parse("/user/emails");

		if let Some(gate) = provider.organization.as_mut() {
			gate.membership_endpoint = parse(&format!("/user/memberships/orgs/{}", gate.name));
			gate.teams_endpoint = parse(&format!("/orgs/{}/teams", gate.name));
		}

		provider
	}

	async fn mock_happy_identity(server: &MockServer) {
		server
			.mock_async(|when, then| {
				when.method(POST)
					.path("/login/oauth/access_token")
					.query_param("code", "valid-code");
				then.status(200)
					.header("content-type", "application/json")
					.body(r#"{"access_token":"gho_success"}"#);
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(GET).path("/user").header("authorization", "token gho_success");
				then.status(200)
					.header("content-type", "application/json")
					.body(r#"{"name":null,"login":"octocat"}"#);
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(GET).path("/user/emails").header("authorization", "token gho_success");
				then.status(200).header("content-type", "application/json").body(
					r#"[{"email":"noreply@example.com","primary":false},{"email":"octocat@example.com","primary":true}]"#,
				);
			})
			.await;
	}

	#[tokio::test]
	async fn exchange_resolves_login_and_primary_email() {
		let server = MockServer::start_async().await;
		let provider = mock_provider(&server, Config::new("client-123", "secret"));

		mock_happy_identity(&server).await;

		let details = provider
			.user_details("valid-code")
			.await
			.expect("Exchange with a valid code should succeed.");

		assert_eq!(details.name, "octocat");
		assert_eq!(details.email, "octocat@example.com");
	}

	#[tokio::test]
	async fn missing_primary_email_fails_the_exchange() {
		let server = MockServer::start_async().await;
		let provider = mock_provider(&server, Config::new("client-123", "secret"));

		server
			.mock_async(|when, then| {
				when.method(POST).path("/login/oauth/access_token");
				then.status(200)
					.header("content-type", "application/json")
					.body(r#"{"access_token":"gho_success"}"#);
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(GET).path("/user");
				then.status(200)
					.header("content-type", "application/json")
					.body(r#"{"name":"Octo Cat","login":"octocat"}"#);
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(GET).path("/user/emails");
				then.status(200)
					.header("content-type", "application/json")
					.body(r#"[{"email":"noreply@example.com","primary":false}]"#);
			})
			.await;

		let err = provider
			.user_details("valid-code")
			.await
			.expect_err("Identities without a primary email must be rejected.");

		assert!(matches!(err, ExchangeError::NoVerifiedEmail));
	}

	#[tokio::test]
	async fn organization_membership_is_enforced() {
		let server = MockServer::start_async().await;
		let provider =
			mock_provider(&server, Config::new("client-123", "secret").organization("acme"));

		mock_happy_identity(&server).await;
		server
			.mock_async(|when, then| {
				when.method(GET).path("/user/memberships/orgs/acme");
				then.status(404);
			})
			.await;

		let err = provider
			.user_details("valid-code")
			.await
			.expect_err("Non-members must be rejected.");

		assert!(matches!(err, ExchangeError::MembershipDenied { requirement: "organization", .. }));
	}

	#[tokio::test]
	async fn team_membership_is_matched_by_slug() {
		let server = MockServer::start_async().await;
		let provider = mock_provider(
			&server,
			Config::new("client-123", "secret").organization("acme").teams(["platform"]),
		);

		mock_happy_identity(&server).await;
		server
			.mock_async(|when, then| {
				when.method(GET).path("/user/memberships/orgs/acme");
				then.status(200)
					.header("content-type", "application/json")
					.body(r#"{"state":"active"}"#);
			})
			.await;
		server
			.mock_async(|when, then| {
				when.method(GET).path("/orgs/acme/teams");
				then.status(200).header("content-type", "application/json").body(
					r#"[{"name":"Platform","id":1,"slug":"platform","permission":"pull"}]"#,
				);
			})
			.await;

		let details = provider
			.user_details("valid-code")
			.await
			.expect("Team members should pass the membership gate.");

		assert_eq!(details.name, "octocat");
	}

	#[test]
	fn validation_rejects_incomplete_configurations() {
		assert!(matches!(
			Config::new("", "secret").into_provider(test_exchange_client()),
			Err(ConfigError::MissingClientId)
		));
		assert!(matches!(
			Config::new("id", "").into_provider(test_exchange_client()),
			Err(ConfigError::MissingClientSecret)
		));
		assert!(matches!(
			Config::new("id", "secret")
				.teams(["platform"])
				.into_provider(test_exchange_client()),
			Err(ConfigError::TeamsWithoutOrganization)
		));
	}

	#[test]
	fn authorize_url_embeds_state_and_scopes() {
		let provider = Config::new("client-123", "secret")
			.into_provider(test_exchange_client())
			.expect("GitHub configuration should build successfully.");
		let url = provider.authorize_url("state-F0oB4r=");

		assert_eq!(url.domain(), Some("github.com"));
		assert_eq!(url.path(), "/login/oauth/authorize");
		assert!(url.as_str().contains("state=state-F0oB4r="));
		assert!(url.as_str().contains("client_id=client-123"));
		assert!(url.as_str().contains("scope=read%3Auser+user%3Aemail"));
		assert!(!url.as_str().contains("read%3Aorg"));
	}

	#[test]
	fn organization_adds_the_read_org_scope() {
		let provider = Config::new("client-123", "secret")
			.organization("acme")
			.into_provider(test_exchange_client())
			.expect("GitHub configuration should build successfully.");

		assert!(provider.authorize_url("s").as_str().contains("read%3Aorg"));
	}

	#[test]
	fn enterprise_domain_switches_the_api_root() {
		let provider = Config::new("client-123", "secret")
			.domain("github.acme.dev")
			.into_provider(test_exchange_client())
			.expect("GitHub Enterprise configuration should build successfully.");

		assert_eq!(
			provider.user_endpoint.as_str(),
			"https://github.acme.dev/api/v3/user"
		);
		assert_eq!(
			provider.authorize_url("s").as_str(),
			"https://github.acme.dev/login/oauth/authorize?client_id=client-123&state=s&scope=read%3Auser+user%3Aemail"
		);
	}
}
