//! Immutable client configuration shared by every grant control.

// self
use crate::_prelude::*;

/// Client identity and endpoint configuration supplied at construction.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OauthClientConfig {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret; absent for public clients.
	#[serde(default)]
	pub client_secret: Option<String>,
	/// Token endpoint.
	pub access_token_url: Url,
	/// Authorization endpoint, required by redirect-based grants only.
	#[serde(default)]
	pub auth_url: Option<Url>,
	/// Client authentication mode; `None` behaves like `Some(true)` (Basic header).
	#[serde(default)]
	pub basic_auth_header: Option<bool>,
	/// Ordered scopes, joined with a single space on the wire.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Emits diagnostic events for every exchange made with this configuration.
	#[serde(default)]
	pub log: bool,
}
impl OauthClientConfig {
	/// Creates a builder seeded with the mandatory client identifier and token endpoint.
	pub fn builder(
		client_id: impl Into<String>,
		access_token_url: Url,
	) -> OauthClientConfigBuilder {
		OauthClientConfigBuilder::new(client_id.into(), access_token_url)
	}

	/// Returns `true` unless Basic authentication was explicitly disabled.
	pub fn uses_basic_auth_header(&self) -> bool {
		self.basic_auth_header != Some(false)
	}
}
impl Debug for OauthClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OauthClientConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
			.field("access_token_url", &self.access_token_url.as_str())
			.field("auth_url", &self.auth_url.as_ref().map(Url::as_str))
			.field("basic_auth_header", &self.basic_auth_header)
			.field("scopes", &self.scopes)
			.field("log", &self.log)
			.finish()
	}
}

/// Builder for [`OauthClientConfig`] values.
#[derive(Debug)]
pub struct OauthClientConfigBuilder {
	config: OauthClientConfig,
}
impl OauthClientConfigBuilder {
	fn new(client_id: String, access_token_url: Url) -> Self {
		Self {
			config: OauthClientConfig {
				client_id,
				client_secret: None,
				access_token_url,
				auth_url: None,
				basic_auth_header: None,
				scopes: Vec::new(),
				log: false,
			},
		}
	}

	/// Sets the client secret for confidential clients.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.config.client_secret = Some(secret.into());

		self
	}

	/// Sets the authorization endpoint used by redirect-based grants.
	pub fn auth_url(mut self, url: Url) -> Self {
		self.config.auth_url = Some(url);

		self
	}

	/// Chooses between the Basic header (`true`) and body credentials (`false`).
	pub fn basic_auth_header(mut self, enabled: bool) -> Self {
		self.config.basic_auth_header = Some(enabled);

		self
	}

	/// Replaces the configured scopes; order is preserved.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.config.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Enables diagnostic logging for every exchange.
	pub fn log(mut self, enabled: bool) -> Self {
		self.config.log = enabled;

		self
	}

	/// Finishes the builder.
	pub fn build(self) -> OauthClientConfig {
		self.config
	}
}
