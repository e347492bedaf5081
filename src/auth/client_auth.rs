//! Client authentication strategy (RFC 6749 §2.3.1), orthogonal to the grant type.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, auth::OauthClientConfig};

/// How client credentials travel to the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub enum ClientAuthentication {
	/// `Authorization: Basic <base64(client_id:client_secret)>`.
	BasicHeader(String),
	/// `client_id` (and `client_secret`, when configured) embedded in the request body.
	RequestBody {
		/// Client identifier.
		client_id: String,
		/// Client secret; omitted from the body when absent.
		client_secret: Option<String>,
	},
}
impl ClientAuthentication {
	/// Picks the strategy from the configuration; only an explicit `false` selects the body.
	pub fn from_config(config: &OauthClientConfig) -> Self {
		if config.uses_basic_auth_header() {
			Self::BasicHeader(generate_basic_authentication(
				&config.client_id,
				config.client_secret.as_deref().unwrap_or_default(),
			))
		} else {
			Self::RequestBody {
				client_id: config.client_id.clone(),
				client_secret: config.client_secret.clone(),
			}
		}
	}

	/// Writes the credentials into the outbound body or headers.
	pub fn apply(
		self,
		body: &mut BTreeMap<String, String>,
		headers: &mut BTreeMap<String, String>,
	) {
		match self {
			Self::BasicHeader(value) => {
				headers.insert("Authorization".into(), value);
			},
			Self::RequestBody { client_id, client_secret } => {
				body.insert("client_id".into(), client_id);

				if let Some(secret) = client_secret {
					body.insert("client_secret".into(), secret);
				}
			},
		}
	}
}
impl Debug for ClientAuthentication {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::BasicHeader(_) => f.debug_tuple("BasicHeader").field(&"<redacted>").finish(),
			Self::RequestBody { client_id, client_secret } => f
				.debug_struct("RequestBody")
				.field("client_id", client_id)
				.field("client_secret", &client_secret.as_ref().map(|_| "<redacted>"))
				.finish(),
		}
	}
}

/// Builds the RFC 7617 Basic credential value for `id:secret`.
pub fn generate_basic_authentication(id: &str, secret: &str) -> String {
	format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
}
