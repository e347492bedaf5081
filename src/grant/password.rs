//! Resource-owner password credentials grant (RFC 6749 §4.3).

// self
use crate::{
	_prelude::*,
	auth::{RequestOptions, TokenResponse, join_scopes},
	executor::{self, RefreshParams, TokenRequest},
	grant::{GrantControl, GrantFuture, TokenRefreshable},
	http::TokenHttpClient,
	obs::{self, FlowKind},
};
#[cfg(feature = "reqwest")] use crate::{auth::OauthClientConfig, http::ReqwestHttpClient};

const GRANT_TYPE: &str = "password";

/// Default resource-owner credentials and scopes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PasswordGrantOptions {
	/// Default username.
	pub username: Option<String>,
	/// Default password.
	pub password: Option<String>,
	/// Default scopes; the client configuration applies when unset.
	pub scopes: Option<Vec<String>>,
}
impl PasswordGrantOptions {
	/// Creates options with default credentials.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: Some(username.into()), password: Some(password.into()), scopes: None }
	}

	/// Overrides the default scopes.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = Some(scopes.into_iter().map(Into::into).collect());

		self
	}
}
impl Debug for PasswordGrantOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PasswordGrantOptions")
			.field("username", &self.username)
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.field("scopes", &self.scopes)
			.finish()
	}
}

/// Per-call inputs of [`PasswordGrant::get_token`]; unset credentials fall back to the options.
#[derive(Clone, Default)]
pub struct PasswordTokenParams {
	/// Username for this call.
	pub username: Option<String>,
	/// Password for this call.
	pub password: Option<String>,
	/// Call-wide overrides.
	pub request_options: Option<RequestOptions>,
	/// Logs the outbound exchange for this call.
	pub log: bool,
}
impl PasswordTokenParams {
	/// Sets the credentials for this call.
	pub fn with_credentials(
		mut self,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		self.username = Some(username.into());
		self.password = Some(password.into());

		self
	}

	/// Sets the call-wide overrides.
	pub fn with_request_options(mut self, options: RequestOptions) -> Self {
		self.request_options = Some(options);

		self
	}

	/// Enables logging for this call.
	pub fn with_log(mut self, log: bool) -> Self {
		self.log = log;

		self
	}
}
impl Debug for PasswordTokenParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PasswordTokenParams")
			.field("username", &self.username)
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.field("request_options", &self.request_options)
			.field("log", &self.log)
			.finish()
	}
}

/// Resource-owner password credentials grant control.
pub struct PasswordGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	control: GrantControl<C>,
	options: PasswordGrantOptions,
}
impl<C> PasswordGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Wraps a control with the default credentials.
	pub fn with_control(control: GrantControl<C>, options: PasswordGrantOptions) -> Self {
		Self { control, options }
	}

	/// Shared grant state.
	pub fn control(&self) -> &GrantControl<C> {
		&self.control
	}

	/// Grant-specific configuration.
	pub fn options(&self) -> &PasswordGrantOptions {
		&self.options
	}

	/// Exchanges the resource owner's credentials for a token.
	///
	/// Missing credentials are sent as empty strings; the authorization server decides. An
	/// empty `scope` is the one exception: when neither the grant options nor the client
	/// configuration name a scope, the parameter is left out of the body instead of being sent
	/// as `scope=`.
	pub async fn get_token(&self, params: PasswordTokenParams) -> Result<TokenResponse> {
		obs::observe(FlowKind::Password, "get_token", async {
			let config = self.control.oauth_options();
			let username = params.username.as_ref().or(self.options.username.as_ref());
			let password = params.password.as_ref().or(self.options.password.as_ref());
			let scopes = self.options.scopes.as_deref().unwrap_or(&config.scopes);
			let mut body = BTreeMap::from([
				("grant_type".to_owned(), GRANT_TYPE.to_owned()),
				("username".to_owned(), username.cloned().unwrap_or_default()),
				("password".to_owned(), password.cloned().unwrap_or_default()),
				("scope".to_owned(), join_scopes(scopes).unwrap_or_default()),
			]);
			let mut headers = BTreeMap::new();

			self.control.client_authentication().apply(&mut body, &mut headers);

			executor::request_token(
				&self.control,
				TokenRequest::new(body)
					.with_headers(headers)
					.with_request_options(params.request_options.as_ref())
					.with_log(params.log),
			)
			.await
		})
		.await
	}

	/// Exchanges the stored refresh token.
	///
	/// Without a stored refresh token the call reports the problem at `error` level, sends
	/// nothing, and resolves to `Ok(None)`.
	pub async fn refresh(&self, params: RefreshParams) -> Result<Option<TokenResponse>> {
		if self.control.refresh_token().is_none() {
			obs::log_missing_refresh_token(FlowKind::Password);

			return Ok(None);
		}

		obs::observe(FlowKind::Refresh, "password.refresh", async {
			executor::refresh_token(&self.control, &params).await.map(Some)
		})
		.await
	}
}
#[cfg(feature = "reqwest")]
impl PasswordGrant<ReqwestHttpClient> {
	/// Creates a grant backed by a default reqwest transport.
	pub fn new(config: OauthClientConfig, options: PasswordGrantOptions) -> Self {
		Self::with_control(GrantControl::new(config), options)
	}
}
impl<C> TokenRefreshable for PasswordGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn refresh(&self, params: RefreshParams) -> GrantFuture<'_, Option<TokenResponse>> {
		Box::pin(PasswordGrant::refresh(self, params))
	}
}
impl<C> Debug for PasswordGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PasswordGrant")
			.field("control", &self.control)
			.field("options", &self.options)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, auth::OauthClientConfig};

	fn grant_with(
		config: OauthClientConfig,
		options: PasswordGrantOptions,
		transport: &RecordingHttpClient,
	) -> PasswordGrant<RecordingHttpClient> {
		let control = GrantControl::with_http_client(config, transport.clone());

		PasswordGrant::with_control(control, options)
	}

	#[tokio::test]
	async fn call_credentials_win_over_defaults() {
		let transport = RecordingHttpClient::default().respond(200, r#"{"access_token":"a"}"#);
		let grant = grant_with(
			test_config(),
			PasswordGrantOptions::new("alice", "default").with_scopes(["read", "write"]),
			&transport,
		);

		grant
			.get_token(PasswordTokenParams::default().with_credentials("bob", "hunter2"))
			.await
			.expect("Exchange should succeed.");

		let sent = transport.last_request().expect("A request should have been recorded.");
		let form = sent.form();

		assert_eq!(form.get("grant_type").map(String::as_str), Some("password"));
		assert_eq!(form.get("username").map(String::as_str), Some("bob"));
		assert_eq!(form.get("password").map(String::as_str), Some("hunter2"));
		assert_eq!(form.get("scope").map(String::as_str), Some("read write"));
		assert!(sent.header("authorization").is_some_and(|value| value.starts_with("Basic ")));
	}

	#[tokio::test]
	async fn missing_credentials_are_sent_empty() {
		let transport = RecordingHttpClient::default().respond(400, r#"{"error":"invalid_grant"}"#);
		let config = OauthClientConfig { basic_auth_header: Some(false), ..test_config() };
		let grant = grant_with(config, PasswordGrantOptions::default(), &transport);
		let err = grant
			.get_token(PasswordTokenParams::default())
			.await
			.expect_err("Server rejection should surface.");
		let form = transport.last_request().expect("A request should have been recorded.").form();

		assert_eq!(err.oauth_error(), Some("invalid_grant"));
		assert_eq!(form.get("username").map(String::as_str), Some(""));
		assert_eq!(form.get("password").map(String::as_str), Some(""));
		assert_eq!(form.get("client_id").map(String::as_str), Some("client-id"));
		assert!(!form.contains_key("scope"));
	}

	#[tokio::test]
	async fn refresh_without_token_is_skipped() {
		let transport = RecordingHttpClient::default();
		let grant = grant_with(test_config(), PasswordGrantOptions::new("alice", "pw"), &transport);
		let outcome =
			grant.refresh(RefreshParams::default()).await.expect("Skipped refresh should not fail.");

		assert!(outcome.is_none());
		assert_eq!(transport.calls(), 0);
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn skipped_refresh_reports_an_error_event() {
		let recorder = RecordingSubscriber::default();
		let _guard = recorder.install();
		let transport = RecordingHttpClient::default();
		let grant = grant_with(test_config(), PasswordGrantOptions::new("alice", "pw"), &transport);

		grant.refresh(RefreshParams::default()).await.expect("Skipped refresh should not fail.");

		let events = recorder.events_at(tracing::Level::ERROR);

		assert_eq!(events.len(), 1);
		assert_eq!(events[0].message, "Refresh token is required.");
		assert_eq!(events[0].field("flow"), Some("password"));
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn refresh_fully_replaces_the_record() {
		let transport = RecordingHttpClient::default()
			.respond(200, r#"{"access_token":"a","refresh_token":"r"}"#)
			.respond(200, r#"{"access_token":"b"}"#);
		let grant = grant_with(test_config(), PasswordGrantOptions::new("alice", "pw"), &transport);

		grant.get_token(PasswordTokenParams::default()).await.expect("Exchange should succeed.");

		let refreshed = grant
			.refresh(RefreshParams::default())
			.await
			.expect("Refresh should succeed.")
			.expect("Refresh should not be skipped.");
		let sent = transport.last_request().expect("A refresh request should have been recorded.");

		assert_eq!(sent.form().get("refresh_token").map(String::as_str), Some("r"));
		assert_eq!(refreshed.access_token(), Some("b"));
		assert_eq!(grant.control().refresh_token(), None);

		let outcome =
			grant.refresh(RefreshParams::default()).await.expect("Skipped refresh should not fail.");

		assert!(outcome.is_none());
		assert_eq!(transport.calls(), 2);
	}

	#[test]
	fn debug_redacts_passwords() {
		let options = PasswordGrantOptions::new("alice", "very-secret");
		let params = PasswordTokenParams::default().with_credentials("bob", "also-secret");

		assert!(!format!("{options:?}").contains("very-secret"));
		assert!(!format!("{params:?}").contains("also-secret"));
	}
}
