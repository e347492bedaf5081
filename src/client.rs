//! Entry point that builds grant controls from one client configuration.

// self
use crate::{
	_prelude::*,
	auth::{OauthClientConfig, RequestOptions},
	grant::{
		AuthorizationCodeGrant, AuthorizationCodeGrantOptions, ClientCredentialsGrant,
		GrantControl, JwtGrant, JwtGrantOptions, PasswordGrant, PasswordGrantOptions,
	},
	http::TokenHttpClient,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestOauthClient = OauthClient<ReqwestHttpClient>;

/// Shares one configuration, one set of client-wide overrides, and one transport across grants.
///
/// Every grant built by the client owns its own token record; tokens are never shared between
/// grants or between calls to the builders.
pub struct OauthClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	config: OauthClientConfig,
	request_options: RequestOptions,
	http_client: Arc<C>,
}
impl<C> OauthClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(config: OauthClientConfig, http_client: impl Into<Arc<C>>) -> Self {
		Self { config, request_options: RequestOptions::default(), http_client: http_client.into() }
	}

	/// Sets the client-wide overrides inherited by every grant built afterwards.
	pub fn with_request_options(mut self, options: RequestOptions) -> Self {
		self.request_options = options;

		self
	}

	/// Client configuration.
	pub fn config(&self) -> &OauthClientConfig {
		&self.config
	}

	/// Client-wide overrides.
	pub fn request_options(&self) -> &RequestOptions {
		&self.request_options
	}

	/// Builds an Authorization Code grant; requires `auth_url` in the configuration.
	pub fn authorization_code(
		&self,
		options: AuthorizationCodeGrantOptions,
	) -> Result<AuthorizationCodeGrant<C>> {
		AuthorizationCodeGrant::with_control(self.control(), options)
	}

	/// Builds a resource-owner password grant.
	pub fn password(&self, options: PasswordGrantOptions) -> PasswordGrant<C> {
		PasswordGrant::with_control(self.control(), options)
	}

	/// Builds a JWT bearer grant.
	pub fn jwt(&self, options: JwtGrantOptions) -> JwtGrant<C> {
		JwtGrant::with_control(self.control(), options)
	}

	/// Builds a Client Credentials grant.
	pub fn client_credentials(&self) -> ClientCredentialsGrant<C> {
		ClientCredentialsGrant::with_control(self.control())
	}

	fn control(&self) -> GrantControl<C> {
		GrantControl::with_http_client(self.config.clone(), self.http_client.clone())
			.with_request_options(self.request_options.clone())
	}
}
#[cfg(feature = "reqwest")]
impl OauthClient<ReqwestHttpClient> {
	/// Creates a client that provisions its own reqwest transport.
	pub fn new(config: OauthClientConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Clone for OauthClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			request_options: self.request_options.clone(),
			http_client: self.http_client.clone(),
		}
	}
}
impl<C> Debug for OauthClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OauthClient")
			.field("config", &self.config)
			.field("request_options", &self.request_options)
			.finish()
	}
}
