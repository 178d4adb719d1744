//! Routing store: the reactive current location plus navigation actions.
//!
//! The store must be installed with [`set_routing_store`] before any route
//! parameter is read or written; this is the documented init step for the
//! otherwise-ambient module state. Reads of [`RoutingStore::location`] go
//! through a [`Signal`], so memos over route parameters recompute when a
//! navigation lands.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use waymark_reactive::Signal;

/// Navigation type for history operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
	/// Adds a new history entry.
	Push,
	/// Replaces the current history entry.
	Replace,
}

/// The current location: path and query portions of the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
	/// Path portion, always starting with `/`.
	pub pathname: String,
	/// Query portion including the leading `?`, or empty.
	pub search: String,
}

impl Location {
	/// Creates a location from explicit parts.
	pub fn new(pathname: impl Into<String>, search: impl Into<String>) -> Self {
		Self {
			pathname: pathname.into(),
			search: search.into(),
		}
	}

	/// Splits a relative URL into pathname and search.
	pub fn from_url(url: &str) -> Self {
		match url.split_once('?') {
			Some((pathname, query)) => Self::new(pathname, format!("?{query}")),
			None => Self::new(url, ""),
		}
	}

	/// Re-assembles the URL string.
	pub fn to_url(&self) -> String {
		format!("{}{}", self.pathname, self.search)
	}
}

/// External history sink invoked at most once per flushed batch.
pub trait HistoryBackend {
	/// Records a push navigation to `url`.
	fn push(&self, url: &str);
	/// Records a replace navigation to `url`.
	fn replace(&self, url: &str);
}

/// In-memory history backend.
///
/// Keeps every navigation in order, which doubles as the navigation-count
/// probe for tests. This is the default backend for native hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
	entries: Rc<RefCell<Vec<(NavigationType, String)>>>,
}

impl MemoryHistory {
	/// Creates an empty history.
	pub fn new() -> Self {
		Self::default()
	}

	/// All recorded navigations, in order.
	pub fn entries(&self) -> Vec<(NavigationType, String)> {
		self.entries.borrow().clone()
	}

	/// Number of recorded navigations.
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Whether no navigation has been recorded.
	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}
}

impl HistoryBackend for MemoryHistory {
	fn push(&self, url: &str) {
		self.entries
			.borrow_mut()
			.push((NavigationType::Push, url.to_string()));
	}

	fn replace(&self, url: &str) {
		self.entries
			.borrow_mut()
			.push((NavigationType::Replace, url.to_string()));
	}
}

/// The routing store: reactive location plus navigation actions.
#[derive(Clone)]
pub struct RoutingStore {
	location: Signal<Location>,
	backend: Rc<dyn HistoryBackend>,
}

impl RoutingStore {
	/// Creates a store over an in-memory history backend.
	pub fn in_memory(initial: Location) -> (Self, MemoryHistory) {
		let history = MemoryHistory::new();
		let store = Self::with_backend(initial, Rc::new(history.clone()));
		(store, history)
	}

	/// Creates a store over a custom history backend.
	pub fn with_backend(initial: Location, backend: Rc<dyn HistoryBackend>) -> Self {
		Self {
			location: Signal::new(initial),
			backend,
		}
	}

	/// The current location. Tracked: reading inside a memo or effect
	/// records a dependency on the location.
	pub fn location(&self) -> Location {
		self.location.get()
	}

	/// The current pathname, tracked like [`Self::location`].
	pub fn pathname(&self) -> String {
		self.location.with(|location| location.pathname.clone())
	}

	/// The current search string, tracked like [`Self::location`].
	pub fn search(&self) -> String {
		self.location.with(|location| location.search.clone())
	}

	/// Navigates by pushing a new history entry, then updates the location.
	pub fn push(&self, url: &str) {
		self.backend.push(url);
		self.location.set(Location::from_url(url));
	}

	/// Navigates by replacing the current history entry, then updates the
	/// location.
	pub fn replace(&self, url: &str) {
		self.backend.replace(url);
		self.location.set(Location::from_url(url));
	}

	/// Dispatches to [`Self::push`] or [`Self::replace`].
	pub fn navigate(&self, nav_type: NavigationType, url: &str) {
		match nav_type {
			NavigationType::Push => self.push(url),
			NavigationType::Replace => self.replace(url),
		}
	}
}

impl fmt::Debug for RoutingStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RoutingStore")
			.field("location", &self.location)
			.finish()
	}
}

thread_local! {
	static STORE: RefCell<Option<RoutingStore>> = const { RefCell::new(None) };
}

/// Installs the routing store for the current thread.
///
/// Must be called before any computed route parameter is read or written.
pub fn set_routing_store(store: RoutingStore) {
	STORE.with(|slot| {
		*slot.borrow_mut() = Some(store);
	});
}

/// Runs a closure against the installed routing store.
///
/// # Panics
///
/// Panics when no store has been installed: reading or writing route
/// parameters before `set_routing_store` is a setup bug, not a runtime
/// condition.
pub fn with_routing_store<F, R>(f: F) -> R
where
	F: FnOnce(&RoutingStore) -> R,
{
	STORE.with(|slot| {
		let borrowed = slot.borrow();
		let store = borrowed
			.as_ref()
			.expect("routing store not installed; call set_routing_store() first");
		f(store)
	})
}

/// Whether a routing store is installed on this thread.
pub fn routing_store_installed() -> bool {
	STORE.with(|slot| slot.borrow().is_some())
}

/// Clears the installed store (test teardown).
pub(crate) fn reset_store() {
	STORE.with(|slot| {
		*slot.borrow_mut() = None;
	});
}
