//! Reactive Runtime
//!
//! This module provides the core reactive runtime for managing Signal
//! dependencies, Memo invalidation, and Effect scheduling.
//!
//! ## Architecture
//!
//! The reactive system follows a pull-based reactivity model:
//!
//! 1. **Observer Stack**: Tracks the currently executing Effect or Memo
//! 2. **Dependency Tracking**: Automatically records dependencies when `Signal::get()` is called
//! 3. **Update Scheduling**: Batches multiple Signal changes into a single update cycle
//! 4. **Lazy Recomputation**: Memos are only marked dirty on change and recompute on the next read
//!
//! ## Example
//!
//! ```ignore
//! use waymark_reactive::{Signal, Effect};
//!
//! let count = Signal::new(0);
//!
//! Effect::new(move || {
//!     // This get() call automatically registers the dependency
//!     println!("Count is: {}", count.get());
//! });
//!
//! // The effect is scheduled and re-runs on the next flush
//! count.set(42);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Unique identifier for reactive nodes (Signals, Effects, Memos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	/// Create a new unique NodeId.
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// Type of reactive node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
	/// A Signal node (source of reactivity)
	Signal,
	/// An Effect node (side effect that runs when dependencies change)
	Effect,
	/// A Memo node (cached computation)
	Memo,
}

/// Observer represents a currently executing Effect or Memo.
#[derive(Debug, Clone, Copy)]
pub struct Observer {
	/// Unique identifier for this observer
	pub id: NodeId,
	/// Type of this observer
	pub node_type: NodeType,
}

/// Dependency graph node.
#[derive(Debug, Default)]
pub(crate) struct DependencyNode {
	/// IDs of nodes that depend on this node
	pub(crate) subscribers: Vec<NodeId>,
	/// IDs of nodes this node depends on
	pub(crate) dependencies: Vec<NodeId>,
}

/// Type for async task scheduler function.
type SchedulerFn = Box<dyn Fn(Box<dyn FnOnce() + Send>) + Send + Sync>;

/// Global scheduler function.
static SCHEDULER: OnceLock<SchedulerFn> = OnceLock::new();

/// Set the global scheduler function for deferred update execution.
///
/// This should be called once at application startup to configure how
/// batched updates are scheduled. When no scheduler is installed, updates
/// stay queued until [`Runtime::flush_updates`] is called explicitly,
/// the mode used by native hosts and tests.
pub fn set_scheduler<F>(scheduler: F)
where
	F: Fn(Box<dyn FnOnce() + Send>) + Send + Sync + 'static,
{
	let _ = SCHEDULER.set(Box::new(scheduler));
}

/// Per-thread reactive runtime.
///
/// Manages the reactive dependency graph and update scheduling. Uses
/// thread-local storage, so each thread gets an independent runtime.
pub struct Runtime {
	/// Observer stack for tracking currently executing effects/memos
	observer_stack: RefCell<Vec<Observer>>,
	/// Dependency graph: NodeId -> DependencyNode
	pub(crate) dependency_graph: RefCell<BTreeMap<NodeId, DependencyNode>>,
	/// Pending updates (effects that need to be re-executed)
	pending_updates: RefCell<Vec<NodeId>>,
	/// Whether an update flush is currently scheduled
	update_scheduled: RefCell<bool>,
}

impl Runtime {
	/// Create a new Runtime instance.
	pub fn new() -> Self {
		Self {
			observer_stack: RefCell::new(Vec::new()),
			dependency_graph: RefCell::new(BTreeMap::new()),
			pending_updates: RefCell::new(Vec::new()),
			update_scheduled: RefCell::new(false),
		}
	}

	/// Get the current observer (the currently executing Effect or Memo).
	pub fn current_observer(&self) -> Option<NodeId> {
		self.observer_stack
			.borrow()
			.last()
			.map(|observer| observer.id)
	}

	/// Push an observer onto the stack.
	///
	/// Called when starting to execute an Effect or Memo.
	pub fn push_observer(&self, observer: Observer) {
		self.observer_stack.borrow_mut().push(observer);
	}

	/// Pop an observer from the stack.
	///
	/// Called when finishing execution of an Effect or Memo.
	pub fn pop_observer(&self) -> Option<Observer> {
		self.observer_stack.borrow_mut().pop()
	}

	/// Track a dependency between the current observer and a source node.
	///
	/// Called automatically when `Signal::get()` or `Memo::get()` is invoked.
	pub fn track_dependency(&self, source_id: NodeId) {
		if let Some(observer_id) = self.current_observer() {
			// A node never depends on itself (a memo reading its own value)
			if observer_id == source_id {
				return;
			}

			let mut graph = self.dependency_graph.borrow_mut();

			let source_node = graph.entry(source_id).or_default();
			if !source_node.subscribers.contains(&observer_id) {
				source_node.subscribers.push(observer_id);
			}

			let observer_node = graph.entry(observer_id).or_default();
			if !observer_node.dependencies.contains(&source_id) {
				observer_node.dependencies.push(source_id);
			}
		}
	}

	/// Notify that a source node (Signal or invalidated Memo) has changed.
	///
	/// Memo subscribers are marked dirty synchronously and their own
	/// subscribers are notified in turn (invalidation cascades through the
	/// graph without recomputation). Effect subscribers are scheduled for
	/// batched re-execution.
	pub fn notify_change(&self, source_id: NodeId) {
		let subscribers = self
			.dependency_graph
			.borrow()
			.get(&source_id)
			.map(|node| node.subscribers.clone())
			.unwrap_or_default();

		for subscriber_id in subscribers {
			if crate::memo::mark_dirty(subscriber_id) {
				self.notify_change(subscriber_id);
			} else {
				self.schedule_update(subscriber_id);
			}
		}
	}

	/// Schedule an effect for re-execution.
	///
	/// The actual execution is performed in a batched flush. Only one flush
	/// is scheduled at a time; further calls join the same batch.
	pub fn schedule_update(&self, node_id: NodeId) {
		let mut pending = self.pending_updates.borrow_mut();
		if !pending.contains(&node_id) {
			pending.push(node_id);
		}
		drop(pending);

		if !*self.update_scheduled.borrow() {
			*self.update_scheduled.borrow_mut() = true;

			// If a scheduler is installed, use it to schedule the flush.
			// Otherwise updates are flushed manually (native/testing mode).
			if let Some(scheduler) = SCHEDULER.get() {
				scheduler(Box::new(|| {
					RUNTIME.with(|rt| rt.flush_updates());
				}));
			}
		}
	}

	/// Flush all pending effect updates.
	pub fn flush_updates(&self) {
		*self.update_scheduled.borrow_mut() = false;

		let pending = std::mem::take(&mut *self.pending_updates.borrow_mut());

		for effect_id in pending {
			crate::effect::execute_effect(effect_id);
		}
	}

	/// Clear dependencies for a node.
	///
	/// Called before re-executing an Effect or recomputing a Memo so stale
	/// dependencies from the previous run are dropped.
	pub fn clear_dependencies(&self, node_id: NodeId) {
		let mut graph = self.dependency_graph.borrow_mut();

		if let Some(node) = graph.get(&node_id) {
			let dependencies = node.dependencies.clone();

			for dep_id in dependencies {
				if let Some(dep_node) = graph.get_mut(&dep_id) {
					dep_node.subscribers.retain(|&id| id != node_id);
				}
			}
		}

		if let Some(node) = graph.get_mut(&node_id) {
			node.dependencies.clear();
		}
	}

	/// Remove a node from the dependency graph.
	///
	/// Called when a Signal/Effect/Memo is dropped.
	pub fn remove_node(&self, node_id: NodeId) {
		self.clear_dependencies(node_id);
		self.dependency_graph.borrow_mut().remove(&node_id);
	}

	/// Check if a node exists in the dependency graph (for testing).
	pub fn has_node(&self, node_id: NodeId) -> bool {
		self.dependency_graph.borrow().contains_key(&node_id)
	}

	/// Get the number of subscribers for a node (for testing).
	pub fn subscriber_count(&self, node_id: NodeId) -> usize {
		self.dependency_graph
			.borrow()
			.get(&node_id)
			.map(|node| node.subscribers.len())
			.unwrap_or(0)
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

thread_local! {
	static RUNTIME: Runtime = Runtime::new();
}

/// Run a closure with a reference to the thread-local runtime.
pub fn with_runtime<F, R>(f: F) -> R
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.with(f)
}

/// Try to access the thread-local runtime (safe version for Drop implementations).
///
/// Returns None if the thread-local storage has been destroyed.
pub(crate) fn try_with_runtime<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.try_with(f).ok()
}
