//! Client-side OAuth 2.0 grant controls.
//!
//! Each grant negotiates, refreshes, and tracks an access token for the authorization code
//! (+ PKCE), password, JWT bearer, or client credentials flow over a pluggable transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod executor;
pub mod grant;
pub mod http;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fakes for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// crates.io
	use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode};
	// self
	#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
	use crate::{
		auth::OauthClientConfig,
		http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	};

	/// Token endpoint used by [`test_config`].
	pub const TEST_TOKEN_URL: &str = "https://auth.example.com/oauth/token";
	/// Authorization endpoint used by [`test_config`].
	pub const TEST_AUTH_URL: &str = "https://auth.example.com/oauth/authorize";

	/// Builds a confidential client configuration pointing at the `example.com` endpoints.
	pub fn test_config() -> OauthClientConfig {
		OauthClientConfig::builder(
			"client-id",
			Url::parse(TEST_TOKEN_URL).expect("Test token URL should parse."),
		)
		.client_secret("client-secret")
		.auth_url(Url::parse(TEST_AUTH_URL).expect("Test authorization URL should parse."))
		.build()
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Event captured by [`RecordingSubscriber`].
	#[cfg(feature = "tracing")]
	#[derive(Clone, Debug)]
	pub struct RecordedEvent {
		/// Event level.
		pub level: tracing::Level,
		/// Rendered `message` field.
		pub message: String,
		/// Remaining fields, rendered without quotes for strings.
		pub fields: BTreeMap<String, String>,
	}
	#[cfg(feature = "tracing")]
	impl RecordedEvent {
		/// Returns a rendered field by name.
		pub fn field(&self, name: &str) -> Option<&str> {
			self.fields.get(name).map(String::as_str)
		}
	}

	/// Subscriber that keeps every event emitted while it is the thread's default.
	#[cfg(feature = "tracing")]
	#[derive(Clone, Default)]
	pub struct RecordingSubscriber(Arc<Mutex<Vec<RecordedEvent>>>);
	#[cfg(feature = "tracing")]
	impl RecordingSubscriber {
		/// Installs the subscriber for the current thread until the guard drops.
		pub fn install(&self) -> tracing::subscriber::DefaultGuard {
			tracing::subscriber::set_default(self.clone())
		}

		/// Returns every captured event.
		pub fn events(&self) -> Vec<RecordedEvent> {
			self.0.lock().clone()
		}

		/// Returns the captured events at `level`.
		pub fn events_at(&self, level: tracing::Level) -> Vec<RecordedEvent> {
			self.events().into_iter().filter(|event| event.level == level).collect()
		}
	}
	#[cfg(feature = "tracing")]
	impl tracing::Subscriber for RecordingSubscriber {
		fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
			true
		}

		fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
			tracing::span::Id::from_u64(1)
		}

		fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}

		fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}

		fn event(&self, event: &tracing::Event<'_>) {
			let mut visitor = FieldRecorder::default();

			event.record(&mut visitor);

			self.0.lock().push(RecordedEvent {
				level: *event.metadata().level(),
				message: visitor.message,
				fields: visitor.fields,
			});
		}

		fn enter(&self, _: &tracing::span::Id) {}

		fn exit(&self, _: &tracing::span::Id) {}
	}

	#[cfg(feature = "tracing")]
	#[derive(Default)]
	struct FieldRecorder {
		message: String,
		fields: BTreeMap<String, String>,
	}
	#[cfg(feature = "tracing")]
	impl FieldRecorder {
		fn insert(&mut self, field: &tracing::field::Field, value: String) {
			if field.name() == "message" {
				self.message = value;
			} else {
				self.fields.insert(field.name().to_owned(), value);
			}
		}
	}
	#[cfg(feature = "tracing")]
	impl tracing::field::Visit for FieldRecorder {
		fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
			self.insert(field, value.to_owned());
		}

		fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn Debug) {
			self.insert(field, format!("{value:?}"));
		}
	}

	/// Error emitted by [`RecordingHttpClient`] when no canned response is queued.
	#[derive(Debug, ThisError)]
	#[error("No canned response is queued.")]
	pub struct RecordingError;

	/// Snapshot of a request captured by [`RecordingHttpClient`].
	#[derive(Clone, Debug)]
	pub struct RecordedRequest {
		/// HTTP method.
		pub method: String,
		/// Full request URI including the query string.
		pub uri: Url,
		/// Headers with lowercase names.
		pub headers: BTreeMap<String, String>,
		/// Raw request body.
		pub body: String,
	}
	impl RecordedRequest {
		/// Decodes the form-encoded body.
		pub fn form(&self) -> BTreeMap<String, String> {
			url::form_urlencoded::parse(self.body.as_bytes()).into_owned().collect()
		}

		/// Decodes the query string.
		pub fn query(&self) -> BTreeMap<String, String> {
			self.uri.query_pairs().into_owned().collect()
		}

		/// Returns a header value by lowercase name.
		pub fn header(&self, name: &str) -> Option<&str> {
			self.headers.get(name).map(String::as_str)
		}
	}

	#[derive(Default)]
	struct RecordingState {
		requests: Mutex<Vec<RecordedRequest>>,
		responses: Mutex<VecDeque<(u16, String)>>,
	}

	/// Fake transport that records every request and replays queued responses in order.
	#[derive(Clone, Default)]
	pub struct RecordingHttpClient(Arc<RecordingState>);
	impl RecordingHttpClient {
		/// Queues a response; returns `self` for chaining.
		pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
			self.0.responses.lock().push_back((status, body.into()));

			self
		}

		/// Returns every captured request.
		pub fn requests(&self) -> Vec<RecordedRequest> {
			self.0.requests.lock().clone()
		}

		/// Number of requests dispatched so far.
		pub fn calls(&self) -> usize {
			self.0.requests.lock().len()
		}

		/// Returns the most recent request, if any.
		pub fn last_request(&self) -> Option<RecordedRequest> {
			self.0.requests.lock().last().cloned()
		}
	}
	impl TokenHttpClient for RecordingHttpClient {
		type Handle = RecordingHandle;
		type TransportError = RecordingError;

		fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
			RecordingHandle { state: self.0.clone(), slot }
		}
	}

	/// Handle returned by [`RecordingHttpClient`].
	pub struct RecordingHandle {
		state: Arc<RecordingState>,
		slot: ResponseMetadataSlot,
	}
	impl<'c> AsyncHttpClient<'c> for RecordingHandle {
		type Error = HttpClientError<RecordingError>;
		type Future =
			Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			Box::pin(async move {
				self.slot.take();

				let recorded = RecordedRequest {
					method: request.method().to_string(),
					uri: Url::parse(&request.uri().to_string())
						.map_err(|e| HttpClientError::Other(e.to_string()))?,
					headers: request
						.headers()
						.iter()
						.map(|(name, value)| {
							(
								name.as_str().to_owned(),
								value.to_str().unwrap_or_default().to_owned(),
							)
						})
						.collect(),
					body: String::from_utf8_lossy(request.body()).into_owned(),
				};

				self.state.requests.lock().push(recorded);

				let (status, body) = self
					.state
					.responses
					.lock()
					.pop_front()
					.ok_or_else(|| HttpClientError::Reqwest(Box::new(RecordingError)))?;

				self.slot.store(ResponseMetadata { status: Some(status), retry_after: None });

				let mut response = HttpResponse::new(body.into_bytes());

				*response.status_mut() = StatusCode::from_u16(status)
					.map_err(|e| HttpClientError::Other(e.to_string()))?;

				Ok(response)
			})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use auth::{
	OauthClientConfig, PkcePair, RequestOptions, TokenResponse, generate_basic_authentication,
	generate_code_challenge, generate_code_verifier, inject_query_params,
};
#[cfg(feature = "reqwest")] pub use client::ReqwestOauthClient;
pub use client::OauthClient;
pub use error::{Error, Result};
pub use executor::{RefreshParams, TokenRequest, refresh_token, request_token};
pub use grant::{
	AuthUriOptions, AuthorizationCodeGrant, AuthorizationCodeGrantOptions,
	AuthorizationCodeToken, AuthorizationTokenParams, CallbackOutcome, Callbacks,
	ClientCredentialsGrant, ClientCredentialsTokenParams, Grant, GrantControl, JwtGrant,
	JwtGrantOptions, JwtTokenParams, PasswordGrant, PasswordGrantOptions, PasswordTokenParams,
	TokenRefreshable,
};
pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
