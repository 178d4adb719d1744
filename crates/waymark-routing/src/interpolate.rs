//! URL interpolation: merged params → final URL.
//!
//! Splits the merged parameter map into path-slot values (names that appear
//! as pattern placeholders) and query values (everything else), drops
//! ignorable query values, re-merges pass-through query parameters from the
//! live location, and assembles `path?query`.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::RouteUpdateError;
use crate::pattern::PathPattern;
use crate::query::{parse_query, stringify_query};
use crate::store::with_routing_store;
use crate::update::{ParamValue, RouteCandidate, text_params};

const DEFAULT_PASSTHROUGH_PREFIX: &str = "utm";

thread_local! {
	static PASSTHROUGH_PREFIXES: RefCell<Vec<String>> =
		RefCell::new(vec![DEFAULT_PASSTHROUGH_PREFIX.to_string()]);
}

/// Configures which query parameters survive updates untouched.
///
/// Any parameter on the current location whose name starts with one of the
/// prefixes is carried into every interpolated URL. Defaults to `["utm"]`,
/// covering the common tracking parameters.
pub fn set_passthrough_prefixes<I, S>(prefixes: I)
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	PASSTHROUGH_PREFIXES.with(|slot| {
		*slot.borrow_mut() = prefixes.into_iter().map(Into::into).collect();
	});
}

/// Restores the default pass-through configuration (test teardown).
pub(crate) fn reset_passthrough_prefixes() {
	PASSTHROUGH_PREFIXES.with(|slot| {
		*slot.borrow_mut() = vec![DEFAULT_PASSTHROUGH_PREFIX.to_string()];
	});
}

fn is_passthrough(key: &str) -> bool {
	PASSTHROUGH_PREFIXES.with(|slot| {
		slot.borrow()
			.iter()
			.any(|prefix| key.starts_with(prefix.as_str()))
	})
}

/// A query value that means "removed": the clean sentinel, the empty
/// string, and the literal `"false"` (a false boolean param is expressed
/// by absence).
fn is_ignorable(value: &ParamValue) -> bool {
	match value {
		ParamValue::Cleaned => true,
		ParamValue::Text(text) => text.is_empty() || text == "false",
	}
}

/// Interpolates the merged params into the candidate pattern.
///
/// Path-slot values are percent-encoded by the pattern; query values are
/// filtered through [`is_ignorable`] and rendered sorted by key.
///
/// # Errors
///
/// Returns [`RouteUpdateError::Interpolation`] when the pattern fails to
/// compile (literal candidates are compiled here) or a required path slot
/// has no value.
pub(crate) fn interpolate_url(
	candidate: &RouteCandidate,
	merged: &BTreeMap<String, ParamValue>,
) -> Result<String, RouteUpdateError> {
	let compiled = match &candidate.compiled {
		Some(compiled) => compiled.clone(),
		None => PathPattern::new(&candidate.pattern)?,
	};

	let path_values = text_params(merged);
	let path = compiled.interpolate(&path_values)?;

	let mut query: BTreeMap<String, String> = merged
		.iter()
		.filter(|(key, _)| !compiled.param_names().contains(key))
		.filter(|(_, value)| !is_ignorable(value))
		.filter_map(|(key, value)| match value {
			ParamValue::Text(text) => Some((key.clone(), text.clone())),
			ParamValue::Cleaned => None,
		})
		.collect();

	// Unrelated external query parameters (tracking et al.) survive the
	// update untouched, overriding explicit params of the same name.
	let location_query = with_routing_store(|store| parse_query(&store.search()));
	for (key, value) in location_query {
		if is_passthrough(&key) {
			query.insert(key, value);
		}
	}

	if query.is_empty() {
		Ok(path)
	} else {
		Ok(format!("{path}?{}", stringify_query(&query)))
	}
}
