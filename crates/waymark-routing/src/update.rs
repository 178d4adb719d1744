//! Batched route update queue.
//!
//! Every `push`/`replace` on a computed parameter lands here as a
//! [`PendingUpdate`]. Requests arriving within the same synchronous burst
//! accumulate into one batch; the flush reconciles them into a single
//! parameter map and a single route pattern, and performs exactly one
//! navigation. This is the entire reason the queue exists: N parameter
//! writers in one turn must not produce N history entries.
//!
//! ## States
//!
//! Idle (no pending updates, no scheduled flush) → Accumulating (≥1 pending
//! update, flush scheduled) → Flushing (draining and computing the merged
//! result) → Idle. The pending list is snapshotted and cleared at the start
//! of the flush, so requests arriving during computation start a fresh
//! batch.
//!
//! Without an installed scheduler ([`set_flush_scheduler`]), batches stay
//! queued until [`flush_route_updates`] is called explicitly, the mode used
//! by native hosts and tests, mirroring the reactive runtime's manual-flush
//! mode.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::OnceLock;
use std::task::{Context, Poll, Waker};

use crate::error::RouteUpdateError;
use crate::interpolate::interpolate_url;
use crate::pattern::PathPattern;
use crate::store::{NavigationType, with_routing_store};

/// A parameter value inside a merged update map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
	/// A concrete value destined for the final URL.
	Text(String),
	/// The clean sentinel: this parameter must be removed from the final
	/// URL. Distinct from "not present" so that "explicitly remove" survives
	/// merging with other updates' snapshots.
	Cleaned,
}

/// One candidate route pattern for a pending update.
///
/// Candidates produced from a parameter's configured pattern list carry a
/// compiled matcher. Candidates produced from an `enforce_pattern` override
/// or from the literal current pathname carry none and are compared to the
/// pathname by string equality.
#[derive(Debug, Clone)]
pub struct RouteCandidate {
	/// The pattern string.
	pub pattern: String,
	/// Compiled matcher, when this candidate came from a configured list.
	pub compiled: Option<PathPattern>,
}

impl RouteCandidate {
	/// A candidate with a compiled matcher.
	pub fn compiled(compiled: PathPattern) -> Self {
		Self {
			pattern: compiled.raw().to_string(),
			compiled: Some(compiled),
		}
	}

	/// A literal candidate matched by string equality.
	pub fn literal(pattern: impl Into<String>) -> Self {
		Self {
			pattern: pattern.into(),
			compiled: None,
		}
	}

	fn matches_pathname(&self, pathname: &str) -> bool {
		match &self.compiled {
			Some(compiled) => compiled.matches(pathname).is_some(),
			None => self.pattern == pathname,
		}
	}
}

/// One request record produced by a single `push`/`replace` call.
#[derive(Debug, Clone)]
pub struct PendingUpdate {
	/// The parameter being set.
	pub key: String,
	/// The formatted new value, or `None` to remove the parameter.
	pub value: Option<String>,
	/// Candidate patterns applicable to this call.
	pub patterns: Vec<RouteCandidate>,
	/// Snapshot of the other currently-active parameters at the call site,
	/// already marked for cleaning where requested.
	pub params: BTreeMap<String, ParamValue>,
	/// Which navigation action this call asked for.
	pub setter: NavigationType,
}

#[derive(Debug, Default)]
struct HandleState {
	result: Option<Result<String, RouteUpdateError>>,
	waker: Option<Waker>,
}

/// Resolves once the batch containing the originating request has flushed.
///
/// Carries the final interpolated URL, or the empty string when the batch
/// (or the suppressed no-op call) produced nothing to navigate to.
#[derive(Debug, Clone)]
pub struct UpdateHandle {
	state: Rc<RefCell<HandleState>>,
}

impl UpdateHandle {
	fn pending() -> Self {
		Self {
			state: Rc::new(RefCell::new(HandleState::default())),
		}
	}

	/// A handle that is already resolved (suppressed no-op calls).
	pub(crate) fn resolved(result: Result<String, RouteUpdateError>) -> Self {
		Self {
			state: Rc::new(RefCell::new(HandleState {
				result: Some(result),
				waker: None,
			})),
		}
	}

	fn resolve(&self, result: Result<String, RouteUpdateError>) {
		let mut state = self.state.borrow_mut();
		state.result = Some(result);
		if let Some(waker) = state.waker.take() {
			waker.wake();
		}
	}

	/// The batch outcome, or `None` while the batch has not flushed yet.
	pub fn try_result(&self) -> Option<Result<String, RouteUpdateError>> {
		self.state.borrow().result.clone()
	}
}

impl Future for UpdateHandle {
	type Output = Result<String, RouteUpdateError>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let mut state = self.state.borrow_mut();
		match &state.result {
			Some(result) => Poll::Ready(result.clone()),
			None => {
				state.waker = Some(cx.waker().clone());
				Poll::Pending
			}
		}
	}
}

/// Type for the flush scheduler function.
type SchedulerFn = Box<dyn Fn(Box<dyn FnOnce() + Send>) + Send + Sync>;

static SCHEDULER: OnceLock<SchedulerFn> = OnceLock::new();

/// Set the scheduler used to defer batch flushes to the next tick.
///
/// When no scheduler is installed, batches wait for an explicit
/// [`flush_route_updates`] call.
pub fn set_flush_scheduler<F>(scheduler: F)
where
	F: Fn(Box<dyn FnOnce() + Send>) + Send + Sync + 'static,
{
	let _ = SCHEDULER.set(Box::new(scheduler));
}

thread_local! {
	static QUEUE: RefCell<Vec<(PendingUpdate, UpdateHandle)>> = const { RefCell::new(Vec::new()) };
	static FLUSH_SCHEDULED: Cell<bool> = const { Cell::new(false) };
}

/// Enqueues one pending update and returns its handle.
///
/// At most one flush is outstanding at a time: the first request of a burst
/// schedules it, later requests join the same batch.
pub fn request_route_update(update: PendingUpdate) -> UpdateHandle {
	let handle = UpdateHandle::pending();

	QUEUE.with(|queue| {
		queue.borrow_mut().push((update, handle.clone()));
	});

	if !FLUSH_SCHEDULED.get() {
		FLUSH_SCHEDULED.set(true);
		if let Some(scheduler) = SCHEDULER.get() {
			scheduler(Box::new(|| {
				let _ = flush_route_updates();
			}));
		}
	}

	handle
}

/// Number of updates waiting in the current batch (for testing).
pub fn pending_update_count() -> usize {
	QUEUE.with(|queue| queue.borrow().len())
}

/// Drains the current batch into one navigation.
///
/// Resolves every handle from the batch with the final URL (or the shared
/// error). Returns the final URL, the empty string when there was nothing
/// to do, or the batch error.
///
/// # Errors
///
/// [`RouteUpdateError::NoCommonRoute`] when the batched updates' candidate
/// pattern lists share no pattern: a caller bug surfaced loudly, never
/// resolved to an arbitrary pattern. [`RouteUpdateError::Interpolation`]
/// when the chosen pattern cannot produce a URL from the merged params.
pub fn flush_route_updates() -> Result<String, RouteUpdateError> {
	FLUSH_SCHEDULED.set(false);

	let batch: Vec<(PendingUpdate, UpdateHandle)> =
		QUEUE.with(|queue| std::mem::take(&mut *queue.borrow_mut()));

	if batch.is_empty() {
		return Ok(String::new());
	}

	let result = compute_batch_url(batch.iter().map(|(update, _)| update));

	match &result {
		Ok(url) => {
			if !url.is_empty() {
				// Batch order = enqueue order; the last caller's setter
				// performs the single navigation.
				let setter = batch
					.last()
					.map(|(update, _)| update.setter)
					.unwrap_or(NavigationType::Push);
				with_routing_store(|store| store.navigate(setter, url));
				tracing::debug!(url = %url, updates = batch.len(), "flushed route update batch");
			}
		}
		Err(error) => {
			tracing::error!(error = %error, updates = batch.len(), "route update batch failed");
		}
	}

	for (_, handle) in &batch {
		handle.resolve(result.clone());
	}

	result
}

/// Reconciles a batch into the final URL.
fn compute_batch_url<'a>(
	updates: impl Iterator<Item = &'a PendingUpdate> + Clone,
) -> Result<String, RouteUpdateError> {
	let keys_being_set: BTreeSet<&str> = updates
		.clone()
		.map(|update| update.key.as_str())
		.collect();

	// Fold parameter snapshots in enqueue order. Snapshot entries for keys
	// being set are skipped, the clean sentinel is sticky, and each update's
	// own key always wins.
	let mut merged: BTreeMap<String, ParamValue> = BTreeMap::new();
	for update in updates.clone() {
		for (key, value) in &update.params {
			if keys_being_set.contains(key.as_str()) {
				continue;
			}
			if merged.get(key) == Some(&ParamValue::Cleaned) {
				continue;
			}
			merged.insert(key.clone(), value.clone());
		}

		let own = match &update.value {
			Some(value) => ParamValue::Text(value.clone()),
			None => ParamValue::Cleaned,
		};
		merged.insert(update.key.clone(), own);
	}

	// Ordered intersection of candidate lists, by pattern string. The first
	// update's order is preserved so "first common pattern" is stable.
	let mut common: Vec<&RouteCandidate> = Vec::new();
	let mut first = true;
	for update in updates {
		if first {
			common = update.patterns.iter().collect();
			first = false;
		} else {
			common.retain(|candidate| {
				update
					.patterns
					.iter()
					.any(|other| other.pattern == candidate.pattern)
			});
		}
	}

	if common.is_empty() {
		return Err(RouteUpdateError::NoCommonRoute);
	}

	let pathname = with_routing_store(|store| store.pathname());
	let chosen = common
		.iter()
		.find(|candidate| candidate.matches_pathname(&pathname))
		.unwrap_or(&common[0]);

	interpolate_url(chosen, &merged)
}

/// Clears the pending queue and scheduled flag (test teardown).
pub(crate) fn reset_update_queue() {
	QUEUE.with(|queue| {
		queue.borrow_mut().clear();
	});
	FLUSH_SCHEDULED.set(false);
}

/// Builds a sanitized snapshot of the currently-active parameters.
///
/// `clean_all` marks every entry with the clean sentinel; otherwise the
/// entries named in `clean_keys` are marked and the rest keep their values.
pub(crate) fn sanitize_params(
	current: &BTreeMap<String, String>,
	clean_all: bool,
	clean_keys: &[String],
) -> BTreeMap<String, ParamValue> {
	current
		.iter()
		.map(|(key, value)| {
			let sanitized = if clean_all || clean_keys.iter().any(|k| k == key) {
				ParamValue::Cleaned
			} else {
				ParamValue::Text(value.clone())
			};
			(key.clone(), sanitized)
		})
		.collect()
}

/// Convenience used by interpolation: merged text params as plain strings.
pub(crate) fn text_params(params: &BTreeMap<String, ParamValue>) -> HashMap<String, String> {
	params
		.iter()
		.filter_map(|(key, value)| match value {
			ParamValue::Text(text) => Some((key.clone(), text.clone())),
			ParamValue::Cleaned => None,
		})
		.collect()
}
