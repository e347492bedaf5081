//! Authorization Code grant (RFC 6749 §4.1) with CSRF `state` checks and optional PKCE.
//!
//! The control builds the redirect URL with [`AuthorizationCodeGrant::get_auth_uri`], then
//! consumes the callback URL in [`AuthorizationCodeGrant::get_token`]. The callback is
//! validated before any request is sent:
//!
//! - a non-empty `state` must belong to the expected set, else [`Error::StateMismatch`];
//! - a missing or empty `code` fails with [`Error::AuthorizationDenied`] carrying the raw query;
//! - a repeated `state` counts as a mismatch and a repeated `code` is rejected.

// self
use crate::{
	_prelude::*,
	auth::{PkceCodeChallengeMethod, PkcePair, RequestOptions, TokenResponse},
	auth::{inject_query_params, join_scopes},
	error::ConfigError,
	executor::{self, RefreshParams, TokenRequest},
	grant::{GrantControl, GrantFuture, TokenRefreshable},
	http::TokenHttpClient,
	obs::{self, FlowKind},
};
#[cfg(feature = "reqwest")] use crate::{auth::OauthClientConfig, http::ReqwestHttpClient};

const GRANT_TYPE: &str = "authorization_code";
const DEFAULT_RESPONSE_TYPE: &str = "code";
const CALLBACK_BASE: &str = "http://callback.invalid/";

/// Static configuration of the Authorization Code grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationCodeGrantOptions {
	/// Redirect URI registered with the authorization server.
	pub callback_url: Url,
	/// Scopes requested by default; the client configuration applies when unset.
	pub scopes: Option<Vec<String>>,
}
impl AuthorizationCodeGrantOptions {
	/// Creates options for the registered redirect URI.
	pub fn new(callback_url: Url) -> Self {
		Self { callback_url, scopes: None }
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

/// Per-call inputs of [`AuthorizationCodeGrant::get_auth_uri`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthUriOptions {
	/// Opaque CSRF value echoed back by the authorization server.
	pub state: Option<String>,
	/// Scopes for this request.
	pub scopes: Option<Vec<String>>,
	/// Redirect URI for this request.
	pub callback_url: Option<Url>,
	/// `response_type` value; `code` when unset.
	pub response_type: Option<String>,
	/// PKCE challenge and its method.
	pub code_challenge: Option<(String, PkceCodeChallengeMethod)>,
}
impl AuthUriOptions {
	/// Sets the CSRF `state`.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Overrides the requested scopes.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = Some(scopes.into_iter().map(Into::into).collect());

		self
	}

	/// Overrides the redirect URI.
	pub fn with_callback_url(mut self, url: Url) -> Self {
		self.callback_url = Some(url);

		self
	}

	/// Overrides `response_type`.
	pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
		self.response_type = Some(response_type.into());

		self
	}

	/// Attaches the challenge half of a PKCE pair.
	pub fn with_pkce(mut self, pkce: &PkcePair) -> Self {
		self.code_challenge = Some((pkce.challenge().to_owned(), pkce.method()));

		self
	}
}

/// Per-call inputs of [`AuthorizationCodeGrant::get_token`].
#[derive(Clone, Default)]
pub struct AuthorizationTokenParams {
	/// Callback URL received from the authorization server, absolute or relative.
	pub callback_url: String,
	/// Accepted `state` values; a single value is a one-element set.
	pub state: Vec<String>,
	/// Redirect URI sent with the token request; the configured callback applies when unset.
	pub redirect_uri: Option<Url>,
	/// PKCE verifier sent with the token request.
	pub code_verifier: Option<String>,
	/// Call-wide overrides.
	pub request_options: Option<RequestOptions>,
	/// Logs state mismatches and the outbound exchange for this call.
	pub log: bool,
}
impl AuthorizationTokenParams {
	/// Creates parameters for the received callback URL.
	pub fn new(callback_url: impl Into<String>) -> Self {
		Self { callback_url: callback_url.into(), ..Default::default() }
	}

	/// Expects exactly one `state` value.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.state = vec![state.into()];

		self
	}

	/// Accepts any of the provided `state` values.
	pub fn with_states<I, S>(mut self, states: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.state = states.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the redirect URI sent with the token request.
	pub fn with_redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Sends the PKCE verifier with the token request.
	pub fn with_code_verifier(mut self, verifier: impl Into<String>) -> Self {
		self.code_verifier = Some(verifier.into());

		self
	}

	/// Sends the verifier half of a PKCE pair.
	pub fn with_pkce(self, pkce: &PkcePair) -> Self {
		self.with_code_verifier(pkce.verifier())
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
impl Debug for AuthorizationTokenParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationTokenParams")
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri.as_ref().map(Url::as_str))
			.field("code_verifier", &self.code_verifier.as_ref().map(|_| "<redacted>"))
			.field("request_options", &self.request_options)
			.field("log", &self.log)
			.finish()
	}
}

/// Token issued by [`AuthorizationCodeGrant::exchange`] with the `state` the callback echoed.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthorizationCodeToken {
	/// Raw token response.
	pub token: TokenResponse,
	/// Non-empty `state` carried by the callback, if any.
	pub state: Option<String>,
}

/// Authorization Code grant control.
pub struct AuthorizationCodeGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	control: GrantControl<C>,
	options: AuthorizationCodeGrantOptions,
	auth_url: Url,
}
impl<C> AuthorizationCodeGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Wraps a control; fails when the configuration has no authorization endpoint.
	pub fn with_control(
		control: GrantControl<C>,
		options: AuthorizationCodeGrantOptions,
	) -> Result<Self> {
		let auth_url = control
			.oauth_options()
			.auth_url
			.clone()
			.ok_or(ConfigError::MissingAuthUrl { grant: GRANT_TYPE })?;

		Ok(Self { control, options, auth_url })
	}

	/// Shared grant state.
	pub fn control(&self) -> &GrantControl<C> {
		&self.control
	}

	/// Grant-specific configuration.
	pub fn options(&self) -> &AuthorizationCodeGrantOptions {
		&self.options
	}

	/// Builds the authorization redirect URL.
	///
	/// Client-wide query overrides are merged over the protocol parameters and replace them on
	/// key conflicts, `client_id` and `redirect_uri` included. Parameters left empty after the
	/// merge are not sent; the query already present on `auth_url` is kept as configured.
	pub fn get_auth_uri(&self, options: &AuthUriOptions) -> Url {
		let config = self.control.oauth_options();
		let scopes = options
			.scopes
			.as_deref()
			.or(self.options.scopes.as_deref())
			.unwrap_or(&config.scopes);
		let redirect_uri = options.callback_url.as_ref().unwrap_or(&self.options.callback_url);
		let response_type = options.response_type.as_deref().unwrap_or(DEFAULT_RESPONSE_TYPE);
		let mut params = vec![
			("response_type".to_owned(), response_type.to_owned()),
			("redirect_uri".to_owned(), redirect_uri.to_string()),
			("client_id".to_owned(), config.client_id.clone()),
			("state".to_owned(), options.state.clone().unwrap_or_default()),
			("scope".to_owned(), join_scopes(scopes).unwrap_or_default()),
		];

		if let Some((challenge, method)) = &options.code_challenge {
			params.push(("code_challenge".into(), challenge.clone()));
			params.push(("code_challenge_method".into(), method.as_str().to_owned()));
		}

		for (key, value) in &self.control.request_options().query {
			match params.iter_mut().find(|(existing, _)| existing == key) {
				Some(param) => param.1 = value.clone(),
				None => params.push((key.clone(), value.clone())),
			}
		}

		inject_query_params(
			&self.auth_url,
			params.iter().map(|(key, value)| (key.as_str(), value.as_str())),
		)
	}

	/// Validates the callback and exchanges its `code` for a token.
	pub async fn get_token(&self, params: AuthorizationTokenParams) -> Result<TokenResponse> {
		self.exchange(params).await.map(|issued| issued.token)
	}

	/// Same as [`get_token`](Self::get_token) but also returns the callback's `state`.
	///
	/// A callback that repeats `state` is treated as a mismatch; one that repeats `code` fails
	/// with [`ConfigError::RepeatedCallbackParameter`].
	pub async fn exchange(
		&self,
		params: AuthorizationTokenParams,
	) -> Result<AuthorizationCodeToken> {
		obs::observe(FlowKind::AuthorizationCode, "get_token", self.exchange_code(params)).await
	}

	/// Exchanges the stored refresh token.
	pub async fn refresh(&self, params: RefreshParams) -> Result<TokenResponse> {
		obs::observe(FlowKind::Refresh, "authorization_code.refresh", async {
			executor::refresh_token(&self.control, &params).await
		})
		.await
	}

	async fn exchange_code(
		&self,
		params: AuthorizationTokenParams,
	) -> Result<AuthorizationCodeToken> {
		let config = self.control.oauth_options();
		let callback = parse_callback(&params.callback_url)?;
		let pairs = callback.query_pairs().into_owned().collect::<Vec<_>>();
		let values_of = |name: &str| {
			pairs.iter().filter(|(key, _)| key == name).map(|(_, value)| value).collect::<Vec<_>>()
		};
		let states = values_of("state");
		let returned_state = match states.as_slice() {
			[] => None,
			[state] if state.is_empty() => None,
			[state] => Some((*state).clone()),
			repeated =>
				Some(repeated.iter().map(|state| state.as_str()).collect::<Vec<_>>().join(",")),
		};

		if let Some(returned) = returned_state
			.as_ref()
			.filter(|returned| states.len() > 1 || !params.state.contains(returned))
		{
			if params.log || config.log {
				obs::log_state_mismatch(&callback, returned, &params.state);
			}

			return Err(Error::StateMismatch { returned: returned.clone(), expected: params.state });
		}

		let code = match values_of("code").as_slice() {
			[code] if !code.is_empty() => (*code).clone(),
			[_, _, ..] =>
				return Err(ConfigError::RepeatedCallbackParameter { name: "code" }.into()),
			_ => return Err(Error::AuthorizationDenied { query: pairs.iter().cloned().collect() }),
		};
		let redirect_uri = params.redirect_uri.as_ref().unwrap_or(&self.options.callback_url);
		let mut body = BTreeMap::from([
			("grant_type".to_owned(), GRANT_TYPE.to_owned()),
			("code".to_owned(), code),
			("redirect_uri".to_owned(), redirect_uri.to_string()),
		]);

		if let Some(state) = &returned_state {
			body.insert("state".into(), state.clone());
		}
		if let Some(verifier) = &params.code_verifier {
			body.insert("code_verifier".into(), verifier.clone());
		}

		let mut headers = BTreeMap::new();

		self.control.client_authentication().apply(&mut body, &mut headers);

		let token = executor::request_token(
			&self.control,
			TokenRequest::new(body)
				.with_headers(headers)
				.with_request_options(params.request_options.as_ref())
				.with_log(params.log),
		)
		.await?;

		Ok(AuthorizationCodeToken { token, state: returned_state })
	}
}
#[cfg(feature = "reqwest")]
impl AuthorizationCodeGrant<ReqwestHttpClient> {
	/// Creates a grant backed by a default reqwest transport.
	pub fn new(config: OauthClientConfig, options: AuthorizationCodeGrantOptions) -> Result<Self> {
		Self::with_control(GrantControl::new(config), options)
	}
}
impl<C> TokenRefreshable for AuthorizationCodeGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn refresh(&self, params: RefreshParams) -> GrantFuture<'_, Option<TokenResponse>> {
		Box::pin(async move { AuthorizationCodeGrant::refresh(self, params).await.map(Some) })
	}
}
impl<C> Debug for AuthorizationCodeGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCodeGrant")
			.field("control", &self.control)
			.field("options", &self.options)
			.field("auth_url", &self.auth_url.as_str())
			.finish()
	}
}

fn parse_callback(raw: &str) -> Result<Url> {
	let parsed = match Url::parse(raw) {
		Err(url::ParseError::RelativeUrlWithoutBase) =>
			Url::parse(CALLBACK_BASE).and_then(|base| base.join(raw)),
		other => other,
	};

	parsed.map_err(|source| ConfigError::InvalidCallbackUrl { source }.into())
}
