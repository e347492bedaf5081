//! Raw token endpoint response kept as an opaque JSON object.

// crates.io
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

const REDACTED_FIELDS: [&str; 3] = ["access_token", "refresh_token", "id_token"];

/// JSON body returned by a token endpoint.
///
/// The crate never validates the shape beyond the presence checks its grants need; accessors
/// return `None` for absent or non-string fields and the full mapping stays available for
/// provider-specific data.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenResponse(Map<String, Value>);
impl TokenResponse {
	/// Wraps an already-decoded JSON object.
	pub fn new(fields: Map<String, Value>) -> Self {
		Self(fields)
	}

	/// Returns the `access_token` field.
	pub fn access_token(&self) -> Option<&str> {
		self.get_str("access_token")
	}

	/// Returns the `refresh_token` field.
	pub fn refresh_token(&self) -> Option<&str> {
		self.get_str("refresh_token")
	}

	/// Returns the `token_type` field.
	pub fn token_type(&self) -> Option<&str> {
		self.get_str("token_type")
	}

	/// Returns the `scope` field.
	pub fn scope(&self) -> Option<&str> {
		self.get_str("scope")
	}

	/// Returns `expires_in`, accepting both numeric and numeric-string encodings.
	pub fn expires_in(&self) -> Option<Duration> {
		let seconds = match self.0.get("expires_in")? {
			Value::Number(n) => n.as_i64()?,
			Value::String(s) => s.trim().parse().ok()?,
			_ => return None,
		};

		Some(Duration::seconds(seconds))
	}

	/// Returns an arbitrary field.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Returns an arbitrary field when it is a JSON string.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(Value::as_str)
	}

	/// Borrows the underlying mapping.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	/// Consumes the response and returns the underlying mapping.
	pub fn into_map(self) -> Map<String, Value> {
		self.0
	}
}
impl From<Map<String, Value>> for TokenResponse {
	fn from(fields: Map<String, Value>) -> Self {
		Self(fields)
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut map = f.debug_map();

		for (key, value) in &self.0 {
			if REDACTED_FIELDS.contains(&key.as_str()) {
				map.entry(key, &"<redacted>");
			} else {
				map.entry(key, value);
			}
		}

		map.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn response(value: Value) -> TokenResponse {
		serde_json::from_value(value).expect("Token response fixture should deserialize.")
	}

	#[test]
	fn accessors_read_standard_fields() {
		let token = response(json!({
			"access_token": "a",
			"refresh_token": "r",
			"token_type": "bearer",
			"scope": "openid profile",
			"expires_in": 3600,
			"custom": {"tenant": "acme"}
		}));

		assert_eq!(token.access_token(), Some("a"));
		assert_eq!(token.refresh_token(), Some("r"));
		assert_eq!(token.token_type(), Some("bearer"));
		assert_eq!(token.scope(), Some("openid profile"));
		assert_eq!(token.expires_in(), Some(Duration::hours(1)));
		assert_eq!(token.get("custom"), Some(&json!({"tenant": "acme"})));
	}

	#[test]
	fn expires_in_accepts_string_encoding() {
		assert_eq!(response(json!({"expires_in": "60"})).expires_in(), Some(Duration::minutes(1)));
		assert_eq!(response(json!({"expires_in": true})).expires_in(), None);
		assert_eq!(response(json!({})).expires_in(), None);
	}

	#[test]
	fn debug_redacts_secrets() {
		let token = response(json!({"access_token": "secret-a", "refresh_token": "secret-r"}));
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("secret-a"));
		assert!(!rendered.contains("secret-r"));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn serializes_back_to_the_raw_object() {
		let raw = json!({"access_token": "a", "extra": 1});
		let token = response(raw.clone());

		assert_eq!(serde_json::to_value(&token).expect("Token should serialize."), raw);
	}
}
