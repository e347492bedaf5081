//! JWT bearer grant (RFC 7523 §2.1).

// self
use crate::{
	_prelude::*,
	auth::{RequestOptions, TokenResponse},
	error::ConfigError,
	executor::{self, RefreshParams, TokenRequest},
	grant::{GrantControl, GrantFuture, TokenRefreshable},
	http::TokenHttpClient,
	obs::{self, FlowKind},
};
#[cfg(feature = "reqwest")] use crate::{auth::OauthClientConfig, http::ReqwestHttpClient};

/// Grant type URN registered by RFC 7523.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Pre-bound assertion and grant type.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct JwtGrantOptions {
	/// Default assertion sent as `Authorization: JWT <token>`.
	pub jwt_token: Option<String>,
	/// Default `grant_type`; [`JWT_BEARER_GRANT_TYPE`] when unset.
	pub grant_type: Option<String>,
}
impl JwtGrantOptions {
	/// Pre-binds the assertion.
	pub fn with_jwt_token(mut self, token: impl Into<String>) -> Self {
		self.jwt_token = Some(token.into());

		self
	}

	/// Pre-binds the grant type.
	pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
		self.grant_type = Some(grant_type.into());

		self
	}
}
impl Debug for JwtGrantOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwtGrantOptions")
			.field("jwt_token", &self.jwt_token.as_ref().map(|_| "<redacted>"))
			.field("grant_type", &self.grant_type)
			.finish()
	}
}

/// Per-call inputs of [`JwtGrant::get_token`].
#[derive(Clone, Default)]
pub struct JwtTokenParams {
	/// Assertion for this call.
	pub jwt_token: Option<String>,
	/// Grant type for this call.
	pub grant_type: Option<String>,
	/// Call-wide overrides.
	pub request_options: Option<RequestOptions>,
	/// Logs the outbound exchange for this call.
	pub log: bool,
}
impl JwtTokenParams {
	/// Sets the assertion for this call.
	pub fn with_jwt_token(mut self, token: impl Into<String>) -> Self {
		self.jwt_token = Some(token.into());

		self
	}

	/// Sets the grant type for this call.
	pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
		self.grant_type = Some(grant_type.into());

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
impl Debug for JwtTokenParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwtTokenParams")
			.field("jwt_token", &self.jwt_token.as_ref().map(|_| "<redacted>"))
			.field("grant_type", &self.grant_type)
			.field("request_options", &self.request_options)
			.field("log", &self.log)
			.finish()
	}
}

/// JWT bearer grant control.
///
/// The assertion travels in the `Authorization` header and replaces client authentication.
pub struct JwtGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	control: GrantControl<C>,
	options: JwtGrantOptions,
}
impl<C> JwtGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Wraps a control with the pre-bound options.
	pub fn with_control(control: GrantControl<C>, options: JwtGrantOptions) -> Self {
		Self { control, options }
	}

	/// Shared grant state.
	pub fn control(&self) -> &GrantControl<C> {
		&self.control
	}

	/// Grant-specific configuration.
	pub fn options(&self) -> &JwtGrantOptions {
		&self.options
	}

	/// Exchanges the assertion for a token.
	pub async fn get_token(&self, params: JwtTokenParams) -> Result<TokenResponse> {
		obs::observe(FlowKind::JwtBearer, "get_token", async {
			let token = params
				.jwt_token
				.as_ref()
				.or(self.options.jwt_token.as_ref())
				.filter(|token| !token.is_empty())
				.ok_or(ConfigError::MissingJwtToken)?;
			let grant_type = params
				.grant_type
				.as_deref()
				.or(self.options.grant_type.as_deref())
				.unwrap_or(JWT_BEARER_GRANT_TYPE);
			let body = BTreeMap::from([("grant_type".to_owned(), grant_type.to_owned())]);
			let headers = BTreeMap::from([("Authorization".to_owned(), format!("JWT {token}"))]);

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
	pub async fn refresh(&self, params: RefreshParams) -> Result<TokenResponse> {
		obs::observe(FlowKind::Refresh, "jwt.refresh", async {
			executor::refresh_token(&self.control, &params).await
		})
		.await
	}
}
#[cfg(feature = "reqwest")]
impl JwtGrant<ReqwestHttpClient> {
	/// Creates a grant backed by a default reqwest transport.
	pub fn new(config: OauthClientConfig, options: JwtGrantOptions) -> Self {
		Self::with_control(GrantControl::new(config), options)
	}
}
impl<C> TokenRefreshable for JwtGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn refresh(&self, params: RefreshParams) -> GrantFuture<'_, Option<TokenResponse>> {
		Box::pin(async move { JwtGrant::refresh(self, params).await.map(Some) })
	}
}
impl<C> Debug for JwtGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwtGrant")
			.field("control", &self.control)
			.field("options", &self.options)
			.finish()
	}
}
