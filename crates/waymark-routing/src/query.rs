//! Query-string codec.
//!
//! Thin wrapper over `serde_urlencoded`. Keys come back sorted (`BTreeMap`)
//! so stringified URLs are deterministic.

use std::collections::BTreeMap;

/// Parses a query string into a sorted key/value map.
///
/// Tolerates a leading `?`. Repeated keys keep the last value. A malformed
/// query string yields an empty map rather than an error; query parsing is
/// best effort, matching how browsers treat junk queries.
pub fn parse_query(search: &str) -> BTreeMap<String, String> {
	let trimmed = search.strip_prefix('?').unwrap_or(search);
	serde_urlencoded::from_str::<Vec<(String, String)>>(trimmed)
		.unwrap_or_default()
		.into_iter()
		.collect()
}

/// Stringifies a key/value map into a query string without a leading `?`.
pub fn stringify_query(params: &BTreeMap<String, String>) -> String {
	serde_urlencoded::to_string(params).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_with_and_without_question_mark() {
		let expected: BTreeMap<_, _> = [("a".to_string(), "1".to_string())].into();
		assert_eq!(parse_query("?a=1"), expected);
		assert_eq!(parse_query("a=1"), expected);
	}

	#[test]
	fn test_parse_empty() {
		assert!(parse_query("").is_empty());
		assert!(parse_query("?").is_empty());
	}

	#[test]
	fn test_parse_decodes_values() {
		let parsed = parse_query("?q=caf%C3%A9+au+lait");
		assert_eq!(parsed.get("q").map(String::as_str), Some("café au lait"));
	}

	#[test]
	fn test_stringify_sorts_keys() {
		let params: BTreeMap<_, _> = [
			("z".to_string(), "3".to_string()),
			("a".to_string(), "1".to_string()),
		]
		.into();
		assert_eq!(stringify_query(&params), "a=1&z=3");
	}

	#[test]
	fn test_round_trip() {
		let params: BTreeMap<_, _> = [
			("name".to_string(), "café au lait".to_string()),
			("page".to_string(), "2".to_string()),
		]
		.into();
		assert_eq!(parse_query(&stringify_query(&params)), params);
	}
}
