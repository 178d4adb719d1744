//! Memo - Lazily Cached Reactive Computation
//!
//! `Memo<T>` wraps a producer closure and caches its result. The cached
//! value is invalidated (marked dirty) when any dependency changes and is
//! recomputed on the next `get()`, never eagerly.
//!
//! ## Keep-alive
//!
//! By default a Memo removes itself from the dependency graph when its last
//! handle is dropped. A keep-alive Memo leaves its subscription registered
//! even with no live handles, so a long-lived computation keyed in a cache
//! keeps receiving invalidations.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::runtime::{NodeId, NodeType, Observer, try_with_runtime, with_runtime};

// Dirty flags for all live memos, keyed by node id. The runtime consults
// this map to distinguish memo subscribers (invalidate) from effect
// subscribers (schedule).
thread_local! {
	static DIRTY_FLAGS: RefCell<BTreeMap<NodeId, Rc<Cell<bool>>>> =
		const { RefCell::new(BTreeMap::new()) };
}

/// Mark the memo with the given id dirty.
///
/// Returns true if the id belongs to a registered memo.
pub(crate) fn mark_dirty(node_id: NodeId) -> bool {
	DIRTY_FLAGS.with(|flags| {
		if let Some(flag) = flags.borrow().get(&node_id) {
			flag.set(true);
			true
		} else {
			false
		}
	})
}

type ComputeFn<T> = Box<dyn FnMut() -> T + 'static>;

struct MemoState<T> {
	value: RefCell<Option<T>>,
	compute: RefCell<ComputeFn<T>>,
}

/// A cached reactive computation.
///
/// Reading a Memo inside an Effect or another Memo records a dependency,
/// exactly like reading a Signal.
pub struct Memo<T: 'static> {
	id: NodeId,
	state: Rc<MemoState<T>>,
	dirty: Rc<Cell<bool>>,
	keep_alive: bool,
}

impl<T: 'static> Memo<T> {
	/// Create a new Memo from a producer closure.
	///
	/// The closure does not run until the first `get()`.
	pub fn new<F>(f: F) -> Self
	where
		F: FnMut() -> T + 'static,
	{
		Self::with_keep_alive(f, false)
	}

	/// Create a Memo whose dependency-graph subscription outlives its handles.
	pub fn keep_alive<F>(f: F) -> Self
	where
		F: FnMut() -> T + 'static,
	{
		Self::with_keep_alive(f, true)
	}

	fn with_keep_alive<F>(f: F, keep_alive: bool) -> Self
	where
		F: FnMut() -> T + 'static,
	{
		let id = NodeId::new();
		let dirty = Rc::new(Cell::new(true));

		DIRTY_FLAGS.with(|flags| {
			flags.borrow_mut().insert(id, dirty.clone());
		});

		Self {
			id,
			state: Rc::new(MemoState {
				value: RefCell::new(None),
				compute: RefCell::new(Box::new(f)),
			}),
			dirty,
			keep_alive,
		}
	}

	/// Get the memoized value, recomputing it first if stale.
	///
	/// Tracks this memo as a dependency of the calling observer.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		with_runtime(|rt| rt.track_dependency(self.id));

		if self.dirty.get() || self.state.value.borrow().is_none() {
			self.recompute();
		}

		self.state
			.value
			.borrow()
			.clone()
			.unwrap_or_else(|| unreachable!("memo value present after recompute"))
	}

	/// Recompute the value, re-tracking dependencies from scratch.
	fn recompute(&self) {
		with_runtime(|rt| {
			rt.clear_dependencies(self.id);
			rt.push_observer(Observer {
				id: self.id,
				node_type: NodeType::Memo,
			});
		});

		let value = (self.state.compute.borrow_mut())();

		with_runtime(|rt| {
			rt.pop_observer();
		});

		*self.state.value.borrow_mut() = Some(value);
		self.dirty.set(false);
	}

	/// Whether the cached value is stale (for testing).
	pub fn is_dirty(&self) -> bool {
		self.dirty.get()
	}

	/// The node id of this memo (for testing and diagnostics).
	pub fn id(&self) -> NodeId {
		self.id
	}
}

impl<T: 'static> Clone for Memo<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			state: self.state.clone(),
			dirty: self.dirty.clone(),
			keep_alive: self.keep_alive,
		}
	}
}

impl<T: 'static> fmt::Debug for Memo<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Memo")
			.field("id", &self.id)
			.field("dirty", &self.dirty.get())
			.field("keep_alive", &self.keep_alive)
			.finish()
	}
}

impl<T: 'static> Drop for Memo<T> {
	fn drop(&mut self) {
		if Rc::strong_count(&self.state) == 1 && !self.keep_alive {
			// try_with: this Drop can run from a TLS destructor after the
			// flag map itself was destroyed
			let _ = DIRTY_FLAGS.try_with(|flags| {
				flags.borrow_mut().remove(&self.id);
			});
			try_with_runtime(|rt| rt.remove_node(self.id));
		}
	}
}
