//! Shared state owned by every grant control: configuration, client-wide request overrides,
//! transport, and the single token record.

// self
use crate::{
	_prelude::*,
	auth::{ClientAuthentication, OauthClientConfig, RequestOptions},
	auth::{TokenResponse, generate_basic_authentication},
	http::TokenHttpClient,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[derive(Default)]
struct TokenSlot {
	version: u64,
	token: Option<TokenResponse>,
}

/// Base record composed into each grant variant.
///
/// # Token record
///
/// The token slot starts empty and is replaced wholesale by every successful exchange; it is
/// never merged, expired, or cleared by the crate. Concurrent exchanges on the same control do
/// not coordinate: whichever response resolves last wins. [`token_version`](Self::token_version)
/// lets callers detect an intervening replacement, and
/// [`serialize_exchanges`](Self::serialize_exchanges) hands out an opt-in guard for callers that
/// need one exchange at a time.
pub struct GrantControl<C>
where
	C: ?Sized + TokenHttpClient,
{
	config: OauthClientConfig,
	request_options: RequestOptions,
	http_client: Arc<C>,
	slot: RwLock<TokenSlot>,
	exchange_guard: AsyncMutex<()>,
}
impl<C> GrantControl<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a control that sends requests through the caller-provided transport.
	pub fn with_http_client(config: OauthClientConfig, http_client: impl Into<Arc<C>>) -> Self {
		Self {
			config,
			request_options: RequestOptions::default(),
			http_client: http_client.into(),
			slot: Default::default(),
			exchange_guard: AsyncMutex::new(()),
		}
	}

	/// Sets the client-wide request overrides.
	pub fn with_request_options(mut self, options: RequestOptions) -> Self {
		self.request_options = options;

		self
	}

	/// Echo of the configuration supplied at construction.
	pub fn oauth_options(&self) -> &OauthClientConfig {
		&self.config
	}

	/// Client-wide request overrides.
	pub fn request_options(&self) -> &RequestOptions {
		&self.request_options
	}

	/// Transport shared by every exchange.
	pub fn http_client(&self) -> &Arc<C> {
		&self.http_client
	}

	/// Returns a copy of the current token record, if any.
	pub fn token(&self) -> Option<TokenResponse> {
		self.slot.read().token.clone()
	}

	/// Returns the `refresh_token` carried by the current token record, if any.
	pub fn refresh_token(&self) -> Option<String> {
		self.slot.read().token.as_ref().and_then(TokenResponse::refresh_token).map(str::to_owned)
	}

	/// Number of times the token record has been replaced.
	pub fn token_version(&self) -> u64 {
		self.slot.read().version
	}

	/// Replaces the token record wholesale and returns the new version.
	///
	/// The response shape is not validated; different grants return different shapes.
	pub fn set_token(&self, response: TokenResponse) -> u64 {
		let mut slot = self.slot.write();

		slot.token = Some(response);
		slot.version += 1;

		slot.version
	}

	/// Waits for exclusive use of this control's exchanges.
	///
	/// Grant operations never take this guard themselves; hold it around `get_token`/`refresh`
	/// calls that must not interleave.
	pub async fn serialize_exchanges(&self) -> AsyncMutexGuard<'_, ()> {
		self.exchange_guard.lock().await
	}

	/// Builds the RFC 7617 Basic credential value for `id:secret`.
	pub fn generate_basic_authentication(&self, id: &str, secret: &str) -> String {
		generate_basic_authentication(id, secret)
	}

	/// Client authentication derived from the configuration.
	pub fn client_authentication(&self) -> ClientAuthentication {
		ClientAuthentication::from_config(&self.config)
	}
}
#[cfg(feature = "reqwest")]
impl GrantControl<ReqwestHttpClient> {
	/// Creates a control backed by a default reqwest transport.
	pub fn new(config: OauthClientConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Debug for GrantControl<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let slot = self.slot.read();

		f.debug_struct("GrantControl")
			.field("config", &self.config)
			.field("request_options", &self.request_options)
			.field("token", &slot.token)
			.field("token_version", &slot.version)
			.finish()
	}
}
