//! Reactive route parameter cache.
//!
//! [`route_params`] returns a memo that recomputes the merged
//! `{path params, query params}` map for the current location. Memos are
//! cached per pattern list, so N computed parameters sharing a pattern set
//! share one subscription instead of re-matching the location on every read.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use waymark_reactive::Memo;

use crate::error::PatternError;
use crate::pattern::PathPattern;
use crate::query::parse_query;
use crate::store::with_routing_store;

/// Merged parameter map for a location. `Rc` so the shared empty sentinel
/// supports identity-based "did anything change" checks.
pub type ParamMap = Rc<BTreeMap<String, String>>;

thread_local! {
	static CACHE: RefCell<HashMap<Vec<String>, Memo<ParamMap>>> = RefCell::new(HashMap::new());
	static EMPTY: ParamMap = Rc::new(BTreeMap::new());
}

/// The shared empty parameter map.
///
/// Every no-params location resolves to this exact allocation, so
/// `Rc::ptr_eq` can answer "did anything change" without comparing maps.
pub fn empty_params() -> ParamMap {
	EMPTY.with(Rc::clone)
}

/// Returns the reactive parameter map for a pattern list.
///
/// Patterns are tried in order against the current pathname and the **last
/// matching pattern wins** for path params, so more specific overrides go
/// last. Query params are parsed from the current search string and merged
/// over path params. The memo is cached by the pattern list, and recomputes
/// only when the location changes.
///
/// # Errors
///
/// Returns [`PatternError`] when a pattern in the list does not compile.
pub fn route_params(patterns: &[String]) -> Result<Memo<ParamMap>, PatternError> {
	let key: Vec<String> = patterns.to_vec();

	if let Some(memo) = CACHE.with(|cache| cache.borrow().get(&key).cloned()) {
		return Ok(memo);
	}

	let matchers = patterns
		.iter()
		.map(|pattern| PathPattern::new(pattern))
		.collect::<Result<Vec<_>, _>>()?;

	let memo = Memo::new(move || compute_params(&matchers));

	CACHE.with(|cache| {
		cache.borrow_mut().insert(key, memo.clone());
	});
	Ok(memo)
}

fn compute_params(matchers: &[PathPattern]) -> ParamMap {
	with_routing_store(|store| {
		let location = store.location();

		let mut path_params: HashMap<String, String> = HashMap::new();
		for matcher in matchers {
			if let Some(matched) = matcher.matches(&location.pathname) {
				path_params = matched;
			}
		}

		// Query params apply whether or not any pattern matched the path
		let query_params = parse_query(&location.search);

		if path_params.is_empty() && query_params.is_empty() {
			return empty_params();
		}

		let mut merged: BTreeMap<String, String> = path_params.into_iter().collect();
		merged.extend(query_params);
		Rc::new(merged)
	})
}

/// Clears the memo cache (test teardown).
pub(crate) fn reset_params_cache() {
	CACHE.with(|cache| {
		cache.borrow_mut().clear();
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::{Location, RoutingStore, set_routing_store};
	use serial_test::serial;

	fn install(pathname: &str, search: &str) -> RoutingStore {
		crate::reset_routing_state();
		let (store, _history) = RoutingStore::in_memory(Location::new(pathname, search));
		set_routing_store(store.clone());
		store
	}

	fn strings(patterns: &[&str]) -> Vec<String> {
		patterns.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	#[serial]
	fn test_no_match_no_query_returns_shared_empty() {
		install("/other", "");
		let params = route_params(&strings(&["/users/:id"])).unwrap();
		let first = params.get();
		assert!(Rc::ptr_eq(&first, &empty_params()));
	}

	#[test]
	#[serial]
	fn test_last_matching_pattern_wins() {
		install("/users/42", "");
		let params = route_params(&strings(&["/users/:id", "/:section/:entry"])).unwrap();
		let map = params.get();

		// Both match; the later, more specific override wins wholesale
		assert_eq!(map.get("section").map(String::as_str), Some("users"));
		assert_eq!(map.get("entry").map(String::as_str), Some("42"));
		assert_eq!(map.get("id"), None);
	}

	#[test]
	#[serial]
	fn test_query_params_merge_over_path_params() {
		install("/users/42", "?id=override&tab=posts");
		let params = route_params(&strings(&["/users/:id"])).unwrap();
		let map = params.get();

		assert_eq!(map.get("id").map(String::as_str), Some("override"));
		assert_eq!(map.get("tab").map(String::as_str), Some("posts"));
	}

	#[test]
	#[serial]
	fn test_query_applies_without_a_path_match() {
		install("/other", "?tab=posts");
		let params = route_params(&strings(&["/users/:id"])).unwrap();
		assert_eq!(params.get().get("tab").map(String::as_str), Some("posts"));
	}

	#[test]
	#[serial]
	fn test_memo_is_cached_per_pattern_list() {
		install("/", "");
		let patterns = strings(&["/", "/:z"]);
		let first = route_params(&patterns).unwrap();
		let second = route_params(&patterns).unwrap();
		assert_eq!(first.id(), second.id());
	}

	#[test]
	#[serial]
	fn test_recomputes_on_navigation() {
		let store = install("/users/1", "");
		let params = route_params(&strings(&["/users/:id"])).unwrap();
		assert_eq!(params.get().get("id").map(String::as_str), Some("1"));

		store.push("/users/2");
		assert_eq!(params.get().get("id").map(String::as_str), Some("2"));
	}

	#[test]
	#[serial]
	fn test_invalid_pattern_surfaces_at_construction() {
		install("/", "");
		assert!(route_params(&strings(&["/users/:"])).is_err());
	}
}
