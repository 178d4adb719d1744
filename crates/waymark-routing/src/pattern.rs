//! Path pattern compilation, matching, and interpolation.
//!
//! A pattern is a path template with named placeholders: `/users/:id`,
//! `/reports/:year/:month?`. A trailing `?` marks the segment optional.
//! Matching extracts percent-decoded parameter values; interpolation fills
//! placeholders with percent-encoded values and drops absent optional
//! segments.

use std::collections::HashMap;

use regex::Regex;

use crate::error::PatternError;

/// One segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	/// A fixed path segment, stored without the leading slash.
	Literal(String),
	/// A named placeholder.
	Param { name: String, optional: bool },
}

/// A compiled path pattern. Immutable once created.
#[derive(Debug, Clone)]
pub struct PathPattern {
	raw: String,
	regex: Regex,
	segments: Vec<Segment>,
	param_names: Vec<String>,
}

impl PathPattern {
	/// Compiles a pattern string.
	///
	/// # Errors
	///
	/// Returns [`PatternError`] for an empty placeholder name or a
	/// duplicated placeholder.
	pub fn new(pattern: &str) -> Result<Self, PatternError> {
		let mut segments = Vec::new();
		let mut param_names = Vec::new();

		for part in pattern.split('/').filter(|part| !part.is_empty()) {
			if let Some(spec) = part.strip_prefix(':') {
				let (name, optional) = match spec.strip_suffix('?') {
					Some(name) => (name, true),
					None => (spec, false),
				};

				if name.is_empty() {
					return Err(PatternError::EmptyParamName {
						pattern: pattern.to_string(),
					});
				}
				if param_names.iter().any(|existing| existing == name) {
					return Err(PatternError::DuplicateParam {
						pattern: pattern.to_string(),
						name: name.to_string(),
					});
				}

				param_names.push(name.to_string());
				segments.push(Segment::Param {
					name: name.to_string(),
					optional,
				});
			} else {
				segments.push(Segment::Literal(part.to_string()));
			}
		}

		let mut source = String::from("^");
		if segments.is_empty() {
			source.push('/');
		}
		for segment in &segments {
			match segment {
				Segment::Literal(literal) => {
					source.push('/');
					source.push_str(&regex::escape(literal));
				}
				Segment::Param { optional, .. } => {
					if *optional {
						source.push_str("(?:/([^/]+))?");
					} else {
						source.push_str("/([^/]+)");
					}
				}
			}
		}
		source.push_str("/?$");

		let regex = Regex::new(&source).map_err(|source| PatternError::Compile {
			pattern: pattern.to_string(),
			source,
		})?;

		Ok(Self {
			raw: pattern.to_string(),
			regex,
			segments,
			param_names,
		})
	}

	/// The original pattern string.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	/// Placeholder names in the order they appear in the pattern.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Matches a concrete path against this pattern.
	///
	/// Returns the extracted, percent-decoded parameters, or `None` when the
	/// path does not match. Absent optional placeholders are left out of the
	/// result.
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		let captures = self.regex.captures(path)?;

		let mut params = HashMap::new();
		for (index, name) in self.param_names.iter().enumerate() {
			if let Some(value) = captures.get(index + 1) {
				let raw = value.as_str();
				let decoded = urlencoding::decode(raw)
					.map(|cow| cow.into_owned())
					.unwrap_or_else(|_| raw.to_string());
				params.insert(name.clone(), decoded);
			}
		}
		Some(params)
	}

	/// Fills the pattern's placeholders from `params` to produce a path.
	///
	/// Values are percent-encoded. An optional placeholder with no value is
	/// dropped together with its slash.
	///
	/// # Errors
	///
	/// Returns [`PatternError::MissingParam`] when a required placeholder has
	/// no value.
	pub fn interpolate(&self, params: &HashMap<String, String>) -> Result<String, PatternError> {
		let mut path = String::new();

		for segment in &self.segments {
			match segment {
				Segment::Literal(literal) => {
					path.push('/');
					path.push_str(literal);
				}
				Segment::Param { name, optional } => match params.get(name) {
					Some(value) => {
						path.push('/');
						path.push_str(&urlencoding::encode(value));
					}
					None if *optional => {}
					None => {
						return Err(PatternError::MissingParam {
							pattern: self.raw.clone(),
							name: name.clone(),
						});
					}
				},
			}
		}

		if path.is_empty() {
			path.push('/');
		}
		Ok(path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	#[case("/", "/", &[])]
	#[case("/users", "/users", &[])]
	#[case("/users", "/users/", &[])]
	#[case("/users/:id", "/users/42", &[("id", "42")])]
	#[case("/:a/:b", "/x/y", &[("a", "x"), ("b", "y")])]
	#[case("/:z?", "/temecula", &[("z", "temecula")])]
	#[case("/:z?", "/", &[])]
	#[case("/reports/:year/:month?", "/reports/2024", &[("year", "2024")])]
	fn test_pattern_matches(
		#[case] pattern: &str,
		#[case] path: &str,
		#[case] expected: &[(&str, &str)],
	) {
		let compiled = PathPattern::new(pattern).unwrap();
		let matched = compiled.matches(path).unwrap();
		assert_eq!(matched, params(expected));
	}

	#[rstest]
	#[case("/", "/users")]
	#[case("/users/:id", "/users")]
	#[case("/users/:id", "/posts/42")]
	#[case("/:z", "/")]
	#[case("/users/:id", "/users/1/2")]
	fn test_pattern_rejects(#[case] pattern: &str, #[case] path: &str) {
		let compiled = PathPattern::new(pattern).unwrap();
		assert!(compiled.matches(path).is_none());
	}

	#[test]
	fn test_match_decodes_values() {
		let compiled = PathPattern::new("/tags/:tag").unwrap();
		let matched = compiled.matches("/tags/caf%C3%A9%20au%20lait").unwrap();
		assert_eq!(matched.get("tag").map(String::as_str), Some("café au lait"));
	}

	#[test]
	fn test_interpolate_fills_and_encodes() {
		let compiled = PathPattern::new("/tags/:tag").unwrap();
		let path = compiled.interpolate(&params(&[("tag", "café au lait")])).unwrap();
		assert_eq!(path, "/tags/caf%C3%A9%20au%20lait");
	}

	#[test]
	fn test_interpolate_drops_absent_optional() {
		let compiled = PathPattern::new("/:z?").unwrap();
		assert_eq!(compiled.interpolate(&params(&[])).unwrap(), "/");
		assert_eq!(
			compiled.interpolate(&params(&[("z", "zzz")])).unwrap(),
			"/zzz"
		);
	}

	#[test]
	fn test_interpolate_missing_required_errors() {
		let compiled = PathPattern::new("/users/:id").unwrap();
		let result = compiled.interpolate(&params(&[]));
		assert!(matches!(result, Err(PatternError::MissingParam { .. })));
	}

	#[test]
	fn test_compile_rejects_empty_name() {
		assert!(matches!(
			PathPattern::new("/users/:"),
			Err(PatternError::EmptyParamName { .. })
		));
	}

	#[test]
	fn test_compile_rejects_duplicate_name() {
		assert!(matches!(
			PathPattern::new("/:id/:id"),
			Err(PatternError::DuplicateParam { .. })
		));
	}

	#[test]
	fn test_param_names_are_ordered() {
		let compiled = PathPattern::new("/:a/static/:b?").unwrap();
		assert_eq!(compiled.param_names(), ["a", "b"]);
	}
}
