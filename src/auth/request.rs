//! Request override layers (query, body, headers) and the merge rules applied to them.
//!
//! Two layers exist: client-wide options set once on a grant control, and call-wide options
//! passed per invocation. Parameters built by a grant form the base, client-wide options are
//! merged over it, and call-wide options win over both.

// self
use crate::_prelude::*;

/// Query, body, and header overrides merged into outbound requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
	/// Parameters merged into the URL query string.
	pub query: BTreeMap<String, String>,
	/// Parameters merged into the POST payload.
	pub body: BTreeMap<String, String>,
	/// Headers merged into the outbound request.
	pub headers: BTreeMap<String, String>,
}
impl RequestOptions {
	/// Adds (or replaces) a query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.insert(key.into(), value.into());

		self
	}

	/// Adds (or replaces) a body parameter.
	pub fn with_body(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.body.insert(key.into(), value.into());

		self
	}

	/// Adds (or replaces) a header; names are compared case-insensitively when merged.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Returns `true` when no override is configured.
	pub fn is_empty(&self) -> bool {
		self.query.is_empty() && self.body.is_empty() && self.headers.is_empty()
	}
}

/// Merges `layers` over `base`; later layers win on key conflicts.
pub(crate) fn merge_params<'a>(
	mut base: BTreeMap<String, String>,
	layers: impl IntoIterator<Item = &'a BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
	for layer in layers {
		base.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
	}

	base
}

/// Same as [`merge_params`] but keys are lowercased so header names merge case-insensitively.
pub(crate) fn merge_headers<'a>(
	base: BTreeMap<String, String>,
	layers: impl IntoIterator<Item = &'a BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
	let mut merged: BTreeMap<String, String> =
		base.into_iter().map(|(k, v)| (k.to_ascii_lowercase(), v)).collect();

	for layer in layers {
		merged.extend(layer.iter().map(|(k, v)| (k.to_ascii_lowercase(), v.clone())));
	}

	merged
}

/// Sets each parameter on `url`, replacing existing values with the same key.
///
/// Empty values are skipped and never touch the query already present on `url`.
pub fn inject_query_params<'a, I>(url: &Url, params: I) -> Url
where
	I: IntoIterator<Item = (&'a str, &'a str)>,
{
	let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
	let mut changed = false;

	for (key, value) in params.into_iter().filter(|(_, value)| !value.is_empty()) {
		changed = true;

		match pairs.iter().position(|(existing, _)| existing == key) {
			Some(idx) => {
				let mut index = 0;

				pairs[idx].1 = value.to_owned();
				pairs.retain(|(existing, _)| {
					let keep = existing != key || index == idx;

					index += 1;

					keep
				});
			},
			None => pairs.push((key.to_owned(), value.to_owned())),
		}
	}

	if !changed {
		return url.clone();
	}

	let mut out = url.clone();

	out.query_pairs_mut().clear().extend_pairs(pairs);

	out
}

/// Joins scopes with a single space; `None` when there is nothing to send.
pub(crate) fn join_scopes(scopes: &[String]) -> Option<String> {
	let joined = scopes.join(" ");

	if joined.is_empty() { None } else { Some(joined) }
}
