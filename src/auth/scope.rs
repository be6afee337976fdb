//! Scope joining for authorize URLs and parsing of granted scopes from token responses.

// crates.io
use percent_encoding::percent_decode_str;
// self
use crate::_prelude::*;

/// Separator used when the endpoint does not declare one.
pub const DEFAULT_SCOPE_SEPARATOR: &str = " ";

/// Joins requested scopes with the endpoint separator (space when empty).
pub fn join_scopes<S>(scopes: &[S], separator: &str) -> String
where
	S: AsRef<str>,
{
	let separator = if separator.is_empty() { DEFAULT_SCOPE_SEPARATOR } else { separator };
	let mut joined = String::new();

	for (i, scope) in scopes.iter().enumerate() {
		if i > 0 {
			joined.push_str(separator);
		}

		joined.push_str(scope.as_ref());
	}

	joined
}

/// Parses the granted scopes carried by a `scope`/`scopes` response value.
///
/// Strings are split on commas and whitespace; arrays contribute their string entries.
/// Every entry is URL-unescaped and trimmed, and empty entries are dropped.
pub fn parse_granted_scopes(value: &Value) -> Vec<String> {
	let raw: Vec<&str> = match value {
		Value::String(s) => s.split(|c: char| c == ',' || c.is_whitespace()).collect(),
		Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
		_ => Vec::new(),
	};

	raw.into_iter().map(unescape_scope).filter(|scope| !scope.is_empty()).collect()
}

fn unescape_scope(scope: &str) -> String {
	let plus_decoded = scope.replace('+', " ");
	let decoded = percent_decode_str(&plus_decoded)
		.decode_utf8()
		.map(|s| s.into_owned())
		.unwrap_or_else(|_| scope.to_owned());

	decoded.trim().to_owned()
}
