#![cfg(all(feature = "reqwest", feature = "test"))]

// std
use std::collections::BTreeMap;
// crates.io
use httpmock::prelude::*;
// self
use oauth2_grant_control::{
	AuthUriOptions, AuthorizationCodeGrantOptions, AuthorizationTokenParams, Error,
	OauthClientConfig, PkcePair, RefreshParams, ReqwestOauthClient,
	_preludet::test_reqwest_http_client, generate_basic_authentication, url::Url,
};

const CLIENT_ID: &str = "client-it";
const CLIENT_SECRET: &str = "secret-it";
const CALLBACK: &str = "https://app.example.com/callback";

fn build_client(server: &MockServer) -> ReqwestOauthClient {
	let config = OauthClientConfig::builder(
		CLIENT_ID,
		Url::parse(&server.url("/token")).expect("Mock token endpoint should parse successfully."),
	)
	.client_secret(CLIENT_SECRET)
	.auth_url(
		Url::parse(&server.url("/authorize"))
			.expect("Mock authorization endpoint should parse successfully."),
	)
	.scopes(["openid", "profile"])
	.build();

	ReqwestOauthClient::with_http_client(config, test_reqwest_http_client())
}

fn grant_options() -> AuthorizationCodeGrantOptions {
	AuthorizationCodeGrantOptions::new(
		Url::parse(CALLBACK).expect("Redirect URI should parse successfully."),
	)
}

#[tokio::test]
async fn authorize_exchange_and_refresh() {
	let server = MockServer::start_async().await;
	let grant = build_client(&server)
		.authorization_code(grant_options())
		.expect("Authorization code grant should build.");
	let pkce = PkcePair::generate();
	let authorize_url =
		grant.get_auth_uri(&AuthUriOptions::default().with_state("state-123").with_pkce(&pkce));
	let authorize_pairs: BTreeMap<_, _> = authorize_url.query_pairs().into_owned().collect();

	assert_eq!(authorize_url.path(), "/authorize");
	assert_eq!(authorize_pairs.get("response_type"), Some(&"code".into()));
	assert_eq!(authorize_pairs.get("client_id"), Some(&CLIENT_ID.into()));
	assert_eq!(authorize_pairs.get("redirect_uri"), Some(&CALLBACK.into()));
	assert_eq!(authorize_pairs.get("scope"), Some(&"openid profile".into()));
	assert_eq!(authorize_pairs.get("code_challenge"), Some(&pkce.challenge().into()));
	assert_eq!(authorize_pairs.get("code_challenge_method"), Some(&"S256".into()));

	let basic = generate_basic_authentication(CLIENT_ID, CLIENT_SECRET);
	let exchange = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.header("authorization", basic.as_str());
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-1\",\"refresh_token\":\"refresh-1\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	let token = grant
		.get_token(
			AuthorizationTokenParams::new(format!("{CALLBACK}?code=valid-code&state=state-123"))
				.with_state("state-123")
				.with_pkce(&pkce),
		)
		.await
		.expect("Authorization code exchange should succeed.");

	exchange.assert_async().await;

	assert_eq!(token.access_token(), Some("access-1"));
	assert_eq!(token.refresh_token(), Some("refresh-1"));
	assert_eq!(grant.control().token(), Some(token));

	exchange.delete_async().await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-2\",\"token_type\":\"bearer\"}");
		})
		.await;
	let refreshed = grant
		.refresh(RefreshParams::default())
		.await
		.expect("Refresh should succeed with a stored refresh token.");

	refresh.assert_async().await;

	assert_eq!(refreshed.access_token(), Some("access-2"));
	assert_eq!(grant.control().refresh_token(), None);
	assert_eq!(grant.control().token_version(), 2);
}

#[tokio::test]
async fn callback_validation_never_reaches_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let grant = build_client(&server)
		.authorization_code(grant_options())
		.expect("Authorization code grant should build.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let mismatch = grant
		.get_token(
			AuthorizationTokenParams::new(format!("{CALLBACK}?code=abc&state=forged"))
				.with_states(["state-1", "state-2"]),
		)
		.await
		.expect_err("Forged state should be rejected.");
	let denied = grant
		.get_token(AuthorizationTokenParams::new(format!(
			"{CALLBACK}?error=access_denied&error_description=user%20declined"
		)))
		.await
		.expect_err("Denied authorization should be reported.");

	assert!(matches!(mismatch, Error::StateMismatch { .. }));
	assert_eq!(denied.oauth_error(), Some("access_denied"));
	assert_eq!(denied.to_string(), "Authorization server did not return a code: user declined.");
	assert_eq!(mock.hits_async().await, 0);
	assert!(grant.control().token().is_none());
}

#[tokio::test]
async fn token_endpoint_errors_keep_the_oauth_payload() {
	let server = MockServer::start_async().await;
	let grant = build_client(&server)
		.authorization_code(grant_options())
		.expect("Authorization code grant should build.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"already used\"}");
		})
		.await;
	let err = grant
		.get_token(AuthorizationTokenParams::new(format!("{CALLBACK}?code=stale")))
		.await
		.expect_err("Invalid grant errors should surface.");

	mock.assert_async().await;

	assert_eq!(err.oauth_error(), Some("invalid_grant"));
	assert_eq!(err.to_string(), "Token endpoint returned HTTP 400: already used.");
	assert!(grant.control().token().is_none());
}
