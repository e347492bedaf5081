//! Token endpoint request executor shared by every grant control.
//!
//! [`request_token`] performs the initial exchange for a grant and [`refresh_token`] performs the
//! `refresh_token` exchange. Both merge three layers (parameters built by the grant, client-wide
//! [`RequestOptions`], then call-wide [`RequestOptions`]), POST a form-encoded body to the
//! configured token endpoint, and replace the control's token record on a 2xx response.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{
		Method,
		header::{HeaderName, HeaderValue},
	},
};
use serde_json::Value;
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	auth::{
		RequestOptions, TokenResponse, inject_query_params, join_scopes, merge_headers,
		merge_params,
	},
	error::{ConfigError, TransportError},
	grant::GrantControl,
	http::{ResponseMetadataSlot, TokenHttpClient, parse_retry_after},
	obs,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_ACCEPT: &str = "application/json";

/// Parameters assembled by a grant for one token endpoint call.
#[derive(Clone, Debug, Default)]
pub struct TokenRequest<'a> {
	/// Body parameters built by the grant.
	pub body: BTreeMap<String, String>,
	/// Headers built by the grant (client authentication, JWT assertion).
	pub headers: BTreeMap<String, String>,
	/// Call-wide overrides; they win over everything else.
	pub request_options: Option<&'a RequestOptions>,
	/// Emits a diagnostic event for this call even when the configuration does not.
	pub log: bool,
}
impl<'a> TokenRequest<'a> {
	/// Starts a request with the grant-built body.
	pub fn new(body: BTreeMap<String, String>) -> Self {
		Self { body, ..Default::default() }
	}

	/// Sets the grant-built headers.
	pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
		self.headers = headers;

		self
	}

	/// Sets the call-wide overrides.
	pub fn with_request_options(mut self, options: Option<&'a RequestOptions>) -> Self {
		self.request_options = options;

		self
	}

	/// Enables the per-call diagnostic event.
	pub fn with_log(mut self, log: bool) -> Self {
		self.log = log;

		self
	}
}

/// Per-call inputs of a refresh exchange.
#[derive(Clone, Debug, Default)]
pub struct RefreshParams {
	/// Scopes requested for the refreshed token; the configured scopes apply when unset.
	pub scopes: Option<Vec<String>>,
	/// Call-wide overrides.
	pub request_options: Option<RequestOptions>,
	/// Emits a diagnostic event for this call.
	pub log: bool,
}
impl RefreshParams {
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

	/// Enables the per-call diagnostic event.
	pub fn with_log(mut self, log: bool) -> Self {
		self.log = log;

		self
	}
}

/// Sends a token request and stores the response on `control`.
///
/// An empty `scope` body parameter is dropped after merging. Any other empty value is sent as
/// is, so the authorization server sees exactly what the grant and the overrides asked for.
pub async fn request_token<C>(
	control: &GrantControl<C>,
	request: TokenRequest<'_>,
) -> Result<TokenResponse>
where
	C: ?Sized + TokenHttpClient,
{
	let config = control.oauth_options();
	let layers = std::iter::once(control.request_options())
		.chain(request.request_options)
		.collect::<Vec<_>>();
	let mut body = merge_params(request.body, layers.iter().map(|options| &options.body));

	body.retain(|key, value| !(key == "scope" && value.is_empty()));

	let mut base_headers = BTreeMap::from([
		("content-type".to_owned(), FORM_CONTENT_TYPE.to_owned()),
		("accept".to_owned(), JSON_ACCEPT.to_owned()),
	]);

	base_headers.extend(request.headers);

	let headers = merge_headers(base_headers, layers.iter().map(|options| &options.headers));
	let query = merge_params(BTreeMap::new(), layers.iter().map(|options| &options.query));
	let endpoint = inject_query_params(
		&config.access_token_url,
		query.iter().map(|(key, value)| (key.as_str(), value.as_str())),
	);

	if request.log || config.log {
		obs::log_exchange(&endpoint, body.get("grant_type").map_or("", String::as_str));
	}

	let http_request = build_request(&endpoint, &headers, &body)?;
	let slot = ResponseMetadataSlot::default();
	let handle = control.http_client().with_metadata(slot.clone());
	let response = handle
		.call(http_request)
		.await
		.map_err(|e| TransportError::from_client_error(e, slot.take().as_ref()))?;
	let meta = slot.take();
	let status = response.status();

	if !status.is_success() {
		let raw = String::from_utf8_lossy(response.body()).into_owned();
		let (oauth_error, error_description) = describe_error_body(&raw);
		let retry_after = meta
			.and_then(|value| value.retry_after)
			.or_else(|| parse_retry_after(response.headers()));

		return Err(TransportError::Status {
			status: status.as_u16(),
			oauth_error,
			error_description,
			body: raw,
			retry_after,
		}
		.into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let token: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransportError::Parse { source, status: status.as_u16() })?;

	control.set_token(token.clone());

	Ok(token)
}

/// Exchanges the stored `refresh_token` for a new token record.
///
/// Fails with [`Error::MissingRefreshToken`] without touching the network when the current
/// record carries no refresh token.
pub async fn refresh_token<C>(
	control: &GrantControl<C>,
	params: &RefreshParams,
) -> Result<TokenResponse>
where
	C: ?Sized + TokenHttpClient,
{
	let refresh = control.refresh_token().ok_or(Error::MissingRefreshToken)?;
	let config = control.oauth_options();
	let scope = join_scopes(params.scopes.as_deref().unwrap_or(&config.scopes));
	let mut body = BTreeMap::from([
		("grant_type".to_owned(), "refresh_token".to_owned()),
		("refresh_token".to_owned(), refresh),
	]);

	if let Some(scope) = scope {
		body.insert("scope".into(), scope);
	}

	let mut headers = BTreeMap::new();

	control.client_authentication().apply(&mut body, &mut headers);

	request_token(
		control,
		TokenRequest::new(body)
			.with_headers(headers)
			.with_request_options(params.request_options.as_ref())
			.with_log(params.log),
	)
	.await
}

fn build_request(
	endpoint: &Url,
	headers: &BTreeMap<String, String>,
	body: &BTreeMap<String, String>,
) -> Result<HttpRequest> {
	let mut builder = oauth2::http::Request::builder().method(Method::POST).uri(endpoint.as_str());

	for (name, value) in headers {
		let invalid = || ConfigError::InvalidHeader { name: name.clone() };
		let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

		builder = builder.header(header_name, header_value);
	}

	let payload = Serializer::new(String::new()).extend_pairs(body).finish();
	let request = builder.body(payload.into_bytes()).map_err(ConfigError::from)?;

	Ok(request)
}

fn describe_error_body(raw: &str) -> (Option<String>, Option<String>) {
	let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(raw) else {
		return (None, None);
	};
	let read = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_owned);

	(read("error"), read("error_description"))
}
