//! Client Credentials grant (RFC 6749 §4.4). Tokens issued by this grant are never refreshed.

// self
use crate::{
	_prelude::*,
	auth::{RequestOptions, TokenResponse, join_scopes},
	executor::{self, TokenRequest},
	grant::GrantControl,
	http::TokenHttpClient,
	obs::{self, FlowKind},
};
#[cfg(feature = "reqwest")] use crate::{auth::OauthClientConfig, http::ReqwestHttpClient};

const GRANT_TYPE: &str = "client_credentials";

/// Per-call inputs of [`ClientCredentialsGrant::get_token`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientCredentialsTokenParams {
	/// Scopes for this call; the client configuration applies when unset.
	pub scopes: Option<Vec<String>>,
	/// Call-wide overrides.
	pub request_options: Option<RequestOptions>,
	/// Logs the outbound exchange for this call.
	pub log: bool,
}
impl ClientCredentialsTokenParams {
	/// Overrides the requested scopes.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = Some(scopes.into_iter().map(Into::into).collect());

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

/// Client Credentials grant control.
pub struct ClientCredentialsGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	control: GrantControl<C>,
}
impl<C> ClientCredentialsGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Wraps a control.
	pub fn with_control(control: GrantControl<C>) -> Self {
		Self { control }
	}

	/// Shared grant state.
	pub fn control(&self) -> &GrantControl<C> {
		&self.control
	}

	/// Requests a token on behalf of the client itself.
	pub async fn get_token(&self, params: ClientCredentialsTokenParams) -> Result<TokenResponse> {
		obs::observe(FlowKind::ClientCredentials, "get_token", async {
			let config = self.control.oauth_options();
			let scopes = params.scopes.as_deref().unwrap_or(&config.scopes);
			let mut body = BTreeMap::from([("grant_type".to_owned(), GRANT_TYPE.to_owned())]);

			if let Some(scope) = join_scopes(scopes) {
				body.insert("scope".into(), scope);
			}

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
}
#[cfg(feature = "reqwest")]
impl ClientCredentialsGrant<ReqwestHttpClient> {
	/// Creates a grant backed by a default reqwest transport.
	pub fn new(config: OauthClientConfig) -> Self {
		Self::with_control(GrantControl::new(config))
	}
}
impl<C> Debug for ClientCredentialsGrant<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsGrant").field("control", &self.control).finish()
	}
}
