//! Computed route parameters.
//!
//! A [`ComputedRouteParam`] is one reactive, typed value per named URL
//! parameter. Reading goes through the shared reactive param cache; writing
//! enqueues a batched route update, so any number of parameters written in
//! the same synchronous burst produce a single navigation.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use chrono::NaiveDate;
use waymark_reactive::Memo;

use crate::error::PatternError;
use crate::params::{ParamMap, route_params};
use crate::pattern::PathPattern;
use crate::store::{NavigationType, with_routing_store};
use crate::update::{
	PendingUpdate, RouteCandidate, UpdateHandle, request_route_update, sanitize_params,
};

/// A value that can live in a URL parameter.
///
/// Provides the default parse/format pair for a computed param; both can be
/// overridden per param via [`RouteParamOptions`].
pub trait RouteParamValue: Clone + 'static {
	/// Human-readable type name used in parse-failure logs.
	const TYPE_NAME: &'static str;

	/// Parses the raw URL string into the typed value.
	fn parse_param(raw: &str) -> Result<Self, String>;

	/// Formats the typed value back into its URL string form.
	fn format_param(&self) -> String;
}

impl RouteParamValue for String {
	const TYPE_NAME: &'static str = "string";

	fn parse_param(raw: &str) -> Result<Self, String> {
		Ok(raw.to_string())
	}

	fn format_param(&self) -> String {
		self.clone()
	}
}

impl RouteParamValue for i64 {
	const TYPE_NAME: &'static str = "int";

	fn parse_param(raw: &str) -> Result<Self, String> {
		raw.parse::<i64>().map_err(|err| err.to_string())
	}

	fn format_param(&self) -> String {
		self.to_string()
	}
}

impl RouteParamValue for f64 {
	const TYPE_NAME: &'static str = "float";

	fn parse_param(raw: &str) -> Result<Self, String> {
		raw.parse::<f64>().map_err(|err| err.to_string())
	}

	fn format_param(&self) -> String {
		self.to_string()
	}
}

impl RouteParamValue for bool {
	const TYPE_NAME: &'static str = "boolean";

	// A false boolean never appears in a URL (the interpolator drops
	// "false"), so presence of anything other than an explicit false
	// spelling reads as true.
	fn parse_param(raw: &str) -> Result<Self, String> {
		Ok(!matches!(raw, "" | "false" | "0"))
	}

	fn format_param(&self) -> String {
		self.to_string()
	}
}

impl RouteParamValue for NaiveDate {
	const TYPE_NAME: &'static str = "date";

	fn parse_param(raw: &str) -> Result<Self, String> {
		NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| err.to_string())
	}

	fn format_param(&self) -> String {
		self.format("%Y-%m-%d").to_string()
	}
}

type ParseFn<T> = Rc<dyn Fn(&str) -> Result<T, String>>;
type FormatFn<T> = Rc<dyn Fn(&T) -> String>;

/// Options for defining a computed route parameter.
pub struct RouteParamOptions<T: RouteParamValue> {
	/// The route patterns this parameter is valid on. Empty means "wherever
	/// we currently are": setters fall back to the literal current pathname.
	pub patterns: Vec<String>,
	/// Custom parser overriding [`RouteParamValue::parse_param`].
	pub parse: Option<ParseFn<T>>,
	/// Custom formatter overriding [`RouteParamValue::format_param`].
	pub format: Option<FormatFn<T>>,
	/// Value reported when the parameter is absent from the URL.
	pub default_value: Option<T>,
	/// Keep the reactive subscription alive with no live readers.
	pub keep_alive: bool,
}

impl<T: RouteParamValue> RouteParamOptions<T> {
	/// Options for the given pattern list, everything else defaulted.
	pub fn on_patterns<I, S>(patterns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			patterns: patterns.into_iter().map(Into::into).collect(),
			..Self::default()
		}
	}

	/// Sets the default value.
	pub fn default_value(mut self, value: T) -> Self {
		self.default_value = Some(value);
		self
	}

	/// Sets the custom parser.
	pub fn parse<F>(mut self, parse: F) -> Self
	where
		F: Fn(&str) -> Result<T, String> + 'static,
	{
		self.parse = Some(Rc::new(parse));
		self
	}

	/// Sets the custom formatter.
	pub fn format<F>(mut self, format: F) -> Self
	where
		F: Fn(&T) -> String + 'static,
	{
		self.format = Some(Rc::new(format));
		self
	}

	/// Keeps the reactive subscription alive with no live readers.
	pub fn keep_alive(mut self) -> Self {
		self.keep_alive = true;
		self
	}
}

impl<T: RouteParamValue> Default for RouteParamOptions<T> {
	fn default() -> Self {
		Self {
			patterns: Vec::new(),
			parse: None,
			format: None,
			default_value: None,
			keep_alive: false,
		}
	}
}

/// Which other parameters a setter call should clear from the final URL.
#[derive(Debug, Clone, Default)]
pub enum CleanParams {
	/// Clear nothing.
	#[default]
	None,
	/// Clear every other currently-active parameter.
	All,
	/// Clear the named parameters.
	Named(Vec<String>),
}

impl CleanParams {
	/// Clears the given computed params (any value types).
	pub fn of(params: &[&dyn NamedParam]) -> Self {
		Self::Named(params.iter().map(|p| p.param_name().to_string()).collect())
	}

	fn is_cleaning(&self) -> bool {
		match self {
			Self::None => false,
			Self::All => true,
			Self::Named(names) => !names.is_empty(),
		}
	}
}

/// Anything with a route-parameter name. Lets [`CleanParams::of`] accept
/// computed params of heterogeneous value types.
pub trait NamedParam {
	/// The URL parameter name.
	fn param_name(&self) -> &str;
}

/// Options for a single `push`/`replace` call.
#[derive(Debug, Clone, Default)]
pub struct SetRouteParamOptions {
	/// Force a navigation even when the formatted value is unchanged.
	pub enforce: bool,
	/// Override pattern resolution with this single literal pattern.
	pub enforce_pattern: Option<String>,
	/// Other parameters to clear from the final URL.
	pub clean_params: CleanParams,
}

impl SetRouteParamOptions {
	/// Options that clean the given params.
	pub fn cleaning(params: &[&dyn NamedParam]) -> Self {
		Self {
			clean_params: CleanParams::of(params),
			..Self::default()
		}
	}

	/// Options that clean every other active parameter.
	pub fn cleaning_all() -> Self {
		Self {
			clean_params: CleanParams::All,
			..Self::default()
		}
	}

	/// Options that enforce the given pattern for this call.
	pub fn enforcing_pattern(pattern: impl Into<String>) -> Self {
		Self {
			enforce_pattern: Some(pattern.into()),
			..Self::default()
		}
	}
}

/// A reactive, typed route parameter.
///
/// Created once at binding-definition time and expected to live for the
/// process lifetime; its value recomputes on demand whenever the location
/// changes.
pub struct ComputedRouteParam<T: RouteParamValue> {
	name: String,
	patterns: Vec<String>,
	candidates: Vec<RouteCandidate>,
	route_params: Memo<ParamMap>,
	value: Memo<Option<T>>,
	format: Option<FormatFn<T>>,
}

impl<T: RouteParamValue> ComputedRouteParam<T> {
	/// Defines a computed route parameter.
	///
	/// # Errors
	///
	/// Returns [`PatternError`] when a configured pattern does not compile.
	pub fn new(name: impl Into<String>, options: RouteParamOptions<T>) -> Result<Self, PatternError> {
		let name = name.into();
		let RouteParamOptions {
			patterns,
			parse,
			format,
			default_value,
			keep_alive,
		} = options;

		let candidates = patterns
			.iter()
			.map(|pattern| PathPattern::new(pattern).map(RouteCandidate::compiled))
			.collect::<Result<Vec<_>, _>>()?;

		let params = route_params(&patterns)?;

		let value = {
			let params = params.clone();
			let name = name.clone();
			let compute = move || {
				let map = params.get();
				let raw = map.get(&name).filter(|raw| !raw.is_empty());

				let typed = raw.and_then(|raw| {
					let parsed = match &parse {
						Some(parse) => parse(raw),
						None => T::parse_param(raw),
					};
					match parsed {
						Ok(value) => Some(value),
						Err(message) => {
							tracing::warn!(
								param = %name,
								expected = T::TYPE_NAME,
								raw = %raw,
								error = %message,
								"failed to parse route parameter; falling back to default"
							);
							None
						}
					}
				});

				typed.or_else(|| default_value.clone())
			};

			if keep_alive {
				Memo::keep_alive(compute)
			} else {
				Memo::new(compute)
			}
		};

		Ok(Self {
			name,
			patterns,
			candidates,
			route_params: params,
			value,
			format,
		})
	}

	/// The URL parameter name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The current typed value: the parsed URL parameter when present,
	/// otherwise the configured default. Tracked: reading inside a memo or
	/// effect records a dependency.
	pub fn get(&self) -> Option<T> {
		self.value.get()
	}

	/// Requests a navigation that sets this parameter, adding a history
	/// entry. `None` removes the parameter.
	///
	/// Returns a handle resolving to the final URL of the batch, or the
	/// empty string when the call was suppressed as a no-op.
	pub fn push(&self, value: Option<T>, options: SetRouteParamOptions) -> UpdateHandle {
		self.set_with(NavigationType::Push, value, options)
	}

	/// Requests a navigation that sets this parameter, replacing the current
	/// history entry. `None` removes the parameter.
	pub fn replace(&self, value: Option<T>, options: SetRouteParamOptions) -> UpdateHandle {
		self.set_with(NavigationType::Replace, value, options)
	}

	fn format_value(&self, value: &T) -> String {
		match &self.format {
			Some(format) => format(value),
			None => value.format_param(),
		}
	}

	/// Candidate patterns for one setter call: the enforced pattern when
	/// given, the literal current pathname when no patterns are configured,
	/// the compiled configured list otherwise.
	fn call_candidates(&self, enforce_pattern: Option<&str>) -> Vec<RouteCandidate> {
		if let Some(pattern) = enforce_pattern {
			return vec![RouteCandidate::literal(pattern)];
		}

		if self.patterns.is_empty() {
			let pathname = with_routing_store(|store| store.pathname());
			return vec![RouteCandidate::literal(pathname)];
		}

		self.candidates.clone()
	}

	fn set_with(
		&self,
		setter: NavigationType,
		value: Option<T>,
		options: SetRouteParamOptions,
	) -> UpdateHandle {
		let SetRouteParamOptions {
			enforce,
			enforce_pattern,
			clean_params,
		} = options;

		let candidates = self.call_candidates(enforce_pattern.as_deref());

		let current_params: BTreeMap<String, String> = (*self.route_params.get()).clone();
		let (clean_all, clean_keys) = match &clean_params {
			CleanParams::None => (false, Vec::new()),
			CleanParams::All => (true, Vec::new()),
			CleanParams::Named(names) => (false, names.clone()),
		};
		let snapshot = sanitize_params(&current_params, clean_all, &clean_keys);

		let new_value_formatted = value.as_ref().map(|v| self.format_value(v));
		let current_value_formatted = self.get().map(|v| self.format_value(&v));

		let value_unchanged = new_value_formatted == current_value_formatted;
		if value_unchanged && !clean_params.is_cleaning() && !enforce {
			tracing::debug!(param = %self.name, "route parameter unchanged; skipping navigation");
			return UpdateHandle::resolved(Ok(String::new()));
		}

		request_route_update(PendingUpdate {
			key: self.name.clone(),
			value: new_value_formatted,
			patterns: candidates,
			params: snapshot,
			setter,
		})
	}
}

impl<T: RouteParamValue> NamedParam for ComputedRouteParam<T> {
	fn param_name(&self) -> &str {
		&self.name
	}
}

impl<T: RouteParamValue> Clone for ComputedRouteParam<T> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			patterns: self.patterns.clone(),
			candidates: self.candidates.clone(),
			route_params: self.route_params.clone(),
			value: self.value.clone(),
			format: self.format.clone(),
		}
	}
}

impl<T: RouteParamValue> fmt::Debug for ComputedRouteParam<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComputedRouteParam")
			.field("name", &self.name)
			.field("patterns", &self.patterns)
			.finish()
	}
}

/// Defines a computed route parameter. Free-function alias for
/// [`ComputedRouteParam::new`].
pub fn computed_route_param<T: RouteParamValue>(
	name: impl Into<String>,
	options: RouteParamOptions<T>,
) -> Result<ComputedRouteParam<T>, PatternError> {
	ComputedRouteParam::new(name, options)
}

impl ComputedRouteParam<NaiveDate> {
	/// A `YYYY-MM-DD` date parameter.
	pub fn date(
		name: impl Into<String>,
		options: RouteParamOptions<NaiveDate>,
	) -> Result<Self, PatternError> {
		Self::new(name, options)
	}
}

impl ComputedRouteParam<i64> {
	/// An integer parameter.
	pub fn int(
		name: impl Into<String>,
		options: RouteParamOptions<i64>,
	) -> Result<Self, PatternError> {
		Self::new(name, options)
	}
}

impl ComputedRouteParam<f64> {
	/// A float parameter.
	pub fn float(
		name: impl Into<String>,
		options: RouteParamOptions<f64>,
	) -> Result<Self, PatternError> {
		Self::new(name, options)
	}
}

impl ComputedRouteParam<bool> {
	/// A boolean parameter. `false` reads from absence and formats to
	/// `"false"`, which the interpolator drops from URLs.
	pub fn boolean(
		name: impl Into<String>,
		options: RouteParamOptions<bool>,
	) -> Result<Self, PatternError> {
		Self::new(name, options)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::{Location, RoutingStore, set_routing_store};
	use serial_test::serial;

	fn install(pathname: &str, search: &str) {
		crate::reset_routing_state();
		let (store, _history) = RoutingStore::in_memory(Location::new(pathname, search));
		set_routing_store(store);
	}

	#[test]
	#[serial]
	fn test_get_reads_query_param() {
		install("/", "?page=3");
		let page =
			ComputedRouteParam::int("page", RouteParamOptions::on_patterns(["/"])).unwrap();
		assert_eq!(page.get(), Some(3));
	}

	#[test]
	#[serial]
	fn test_get_reads_path_param() {
		install("/users/42", "");
		let id =
			ComputedRouteParam::int("id", RouteParamOptions::on_patterns(["/users/:id"])).unwrap();
		assert_eq!(id.get(), Some(42));
	}

	#[test]
	#[serial]
	fn test_absent_param_falls_back_to_default() {
		install("/", "");
		let page = ComputedRouteParam::int(
			"page",
			RouteParamOptions::on_patterns(["/"]).default_value(1),
		)
		.unwrap();
		assert_eq!(page.get(), Some(1));
	}

	#[test]
	#[serial]
	fn test_parse_failure_falls_back_to_default() {
		install("/", "?page=banana");
		let page = ComputedRouteParam::int(
			"page",
			RouteParamOptions::on_patterns(["/"]).default_value(1),
		)
		.unwrap();
		assert_eq!(page.get(), Some(1));
	}

	#[test]
	#[serial]
	fn test_empty_string_counts_as_absent() {
		install("/", "?q=");
		let q =
			ComputedRouteParam::<String>::new("q", RouteParamOptions::on_patterns(["/"])).unwrap();
		assert_eq!(q.get(), None);
	}

	#[test]
	#[serial]
	fn test_date_round_trip() {
		install("/", "?day=2024-03-09");
		let day =
			ComputedRouteParam::date("day", RouteParamOptions::on_patterns(["/"])).unwrap();
		let value = day.get().unwrap();
		assert_eq!(value.format_param(), "2024-03-09");
	}

	#[test]
	#[serial]
	fn test_boolean_spellings() {
		install("/", "?a=1&b=false&c=0&d=anything");
		let opts = || RouteParamOptions::<bool>::on_patterns(["/"]);
		assert_eq!(
			ComputedRouteParam::boolean("a", opts()).unwrap().get(),
			Some(true)
		);
		assert_eq!(
			ComputedRouteParam::boolean("b", opts()).unwrap().get(),
			Some(false)
		);
		assert_eq!(
			ComputedRouteParam::boolean("c", opts()).unwrap().get(),
			Some(false)
		);
		assert_eq!(
			ComputedRouteParam::boolean("d", opts()).unwrap().get(),
			Some(true)
		);
	}

	#[test]
	#[serial]
	fn test_custom_parse_and_format() {
		install("/", "?tag=RUST");
		let tag = ComputedRouteParam::<String>::new(
			"tag",
			RouteParamOptions::on_patterns(["/"])
				.parse(|raw| Ok(raw.to_lowercase()))
				.format(|value: &String| value.to_uppercase()),
		)
		.unwrap();
		assert_eq!(tag.get(), Some("rust".to_string()));
	}

	#[test]
	#[serial]
	fn test_noop_push_is_suppressed() {
		install("/", "?page=2");
		let page =
			ComputedRouteParam::int("page", RouteParamOptions::on_patterns(["/"])).unwrap();

		let handle = page.push(Some(2), SetRouteParamOptions::default());
		assert_eq!(handle.try_result(), Some(Ok(String::new())));
		assert_eq!(crate::update::pending_update_count(), 0);
	}

	#[test]
	#[serial]
	fn test_enforce_overrides_noop_suppression() {
		install("/", "?page=2");
		let page =
			ComputedRouteParam::int("page", RouteParamOptions::on_patterns(["/"])).unwrap();

		let handle = page.push(
			Some(2),
			SetRouteParamOptions {
				enforce: true,
				..Default::default()
			},
		);
		assert_eq!(handle.try_result(), None);
		assert_eq!(crate::update::pending_update_count(), 1);
	}

	#[test]
	#[serial]
	fn test_cleaning_overrides_noop_suppression() {
		install("/", "?page=2&q=x");
		let page =
			ComputedRouteParam::int("page", RouteParamOptions::on_patterns(["/"])).unwrap();
		let q =
			ComputedRouteParam::<String>::new("q", RouteParamOptions::on_patterns(["/"])).unwrap();

		let handle = page.push(Some(2), SetRouteParamOptions::cleaning(&[&q]));
		assert_eq!(handle.try_result(), None);
		assert_eq!(crate::update::pending_update_count(), 1);
	}

	#[test]
	#[serial]
	fn test_no_patterns_falls_back_to_current_pathname() {
		install("/wherever", "");
		let q =
			ComputedRouteParam::<String>::new("q", RouteParamOptions::default()).unwrap();

		let _handle = q.push(Some("term".to_string()), SetRouteParamOptions::default());
		let url = crate::update::flush_route_updates().unwrap();
		assert_eq!(url, "/wherever?q=term");
	}
}
