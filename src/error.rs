//! Grant-level error types shared by every grant control and the request executor.

// crates.io
use oauth2::HttpClientError;
// self
use crate::{_prelude::*, http::ResponseMetadata};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by every grant control.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Network failure or non-2xx response from the token endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The callback carried a `state` value that is not in the expected set.
	#[error("Corrupted answer, the state `{returned}` doesn't match.")]
	StateMismatch {
		/// `state` value echoed by the authorization server.
		returned: String,
		/// Normalized set of accepted values.
		expected: Vec<String>,
	},
	/// The callback carried no `code`; the query holds the server's error response.
	#[error("Authorization server did not return a code: {}.", describe_denial(.query))]
	AuthorizationDenied {
		/// Raw callback query (typically `error`, `error_description`, `state`).
		query: BTreeMap<String, String>,
	},
	/// A refresh was attempted but the stored token carries no `refresh_token`.
	#[error("Refresh token is required.")]
	MissingRefreshToken,
}
impl Error {
	/// Returns the OAuth `error` code carried by the failure, if any.
	pub fn oauth_error(&self) -> Option<&str> {
		match self {
			Self::AuthorizationDenied { query } => query.get("error").map(String::as_str),
			Self::Transport(TransportError::Status { oauth_error, .. }) => oauth_error.as_deref(),
			_ => None,
		}
	}
}

fn describe_denial(query: &BTreeMap<String, String>) -> &str {
	query
		.get("error_description")
		.or_else(|| query.get("error"))
		.map(String::as_str)
		.unwrap_or("no error was reported")
}

/// Configuration and validation failures raised before any request is sent.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Redirect-based grants need an authorization endpoint.
	#[error("The {grant} grant requires an authorization URL.")]
	MissingAuthUrl {
		/// Grant label.
		grant: &'static str,
	},
	/// Callback URL cannot be parsed.
	#[error("Callback URL is invalid.")]
	InvalidCallbackUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The callback carries a parameter that must appear at most once more than once.
	#[error("Callback URL repeats the `{name}` parameter.")]
	RepeatedCallbackParameter {
		/// Parameter name.
		name: &'static str,
	},
	/// A merged header name or value is not valid HTTP.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Neither the call nor the grant configuration supplied a JWT assertion.
	#[error("A JWT assertion is required for the JWT bearer grant.")]
	MissingJwtToken,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while talking to the token endpoint.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// Transport reported a failure without a structured error.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint answered with a non-2xx status.
	#[error("Token endpoint returned HTTP {status}{}.", describe_oauth_error(.oauth_error, .error_description))]
	Status {
		/// HTTP status code.
		status: u16,
		/// OAuth `error` field, when the body is an OAuth error response.
		oauth_error: Option<String>,
		/// OAuth `error_description` field, when present.
		error_description: Option<String>,
		/// Raw response body.
		body: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint answered 2xx with a body that is not a JSON object.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
}
impl TransportError {
	/// Maps an [`HttpClientError`] emitted by a transport handle, keeping any captured status.
	pub fn from_client_error<E>(err: HttpClientError<E>, meta: Option<&ResponseMetadata>) -> Error
	where
		E: 'static + Send + Sync + StdError,
	{
		let status = meta.and_then(|value| value.status);

		match err {
			HttpClientError::Reqwest(inner) => Self::Network { source: inner, status }.into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => Self::Io(inner).into(),
			HttpClientError::Other(message) => Self::Other { message, status }.into(),
			_ => Self::Other { message: "unknown transport failure".into(), status }.into(),
		}
	}

	/// HTTP status code associated with the failure, when known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Network { status, .. } | Self::Other { status, .. } => *status,
			Self::Status { status, .. } | Self::Parse { status, .. } => Some(*status),
			Self::Io(_) => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		let status = e.status().map(|code| code.as_u16());

		Self::Network { source: Box::new(e), status }
	}
}

fn describe_oauth_error(oauth_error: &Option<String>, description: &Option<String>) -> String {
	match (oauth_error, description) {
		(_, Some(description)) => format!(": {description}"),
		(Some(code), None) => format!(": {code}"),
		(None, None) => String::new(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn authorization_denied_prefers_error_description() {
		let query = BTreeMap::from([
			("error".to_owned(), "access_denied".to_owned()),
			("error_description".to_owned(), "user declined".to_owned()),
		]);
		let err = Error::AuthorizationDenied { query };

		assert_eq!(err.to_string(), "Authorization server did not return a code: user declined.");
		assert_eq!(err.oauth_error(), Some("access_denied"));

		let err = Error::AuthorizationDenied { query: BTreeMap::new() };

		assert_eq!(
			err.to_string(),
			"Authorization server did not return a code: no error was reported."
		);
	}

	#[test]
	fn status_errors_describe_oauth_fields() {
		let err = TransportError::Status {
			status: 400,
			oauth_error: Some("invalid_grant".into()),
			error_description: None,
			body: "{\"error\":\"invalid_grant\"}".into(),
			retry_after: None,
		};

		assert_eq!(err.to_string(), "Token endpoint returned HTTP 400: invalid_grant.");
		assert_eq!(err.status(), Some(400));
		assert_eq!(Error::from(err).oauth_error(), Some("invalid_grant"));
	}

	#[test]
	fn client_errors_keep_captured_status() {
		let meta = ResponseMetadata { status: Some(503), retry_after: None };
		let err = TransportError::from_client_error(
			HttpClientError::<std::io::Error>::Other("connection reset".into()),
			Some(&meta),
		);

		match err {
			Error::Transport(inner) => assert_eq!(inner.status(), Some(503)),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
