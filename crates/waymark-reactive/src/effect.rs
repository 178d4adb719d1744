//! Effect - Reactive Side Effects
//!
//! `Effect` represents a side effect that automatically re-runs when its
//! dependencies change. Dependencies are tracked automatically: any Signal
//! or Memo accessed inside the effect closure becomes a dependency.
//!
//! Effects run immediately when created. Re-runs are batched through the
//! runtime's pending-update queue and performed on flush.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::runtime::{NodeId, NodeType, Observer, try_with_runtime, with_runtime};

/// Type alias for effect functions.
type EffectFn = Box<dyn FnMut() + 'static>;

// Storage for Effect closures so they can be re-executed when dependencies
// change. Keyed by node id, mirroring the dependency graph.
thread_local! {
	static EFFECT_FUNCTIONS: RefCell<BTreeMap<NodeId, EffectFn>> =
		const { RefCell::new(BTreeMap::new()) };
}

/// Execute the effect with the given id, re-tracking its dependencies.
///
/// The closure is taken out of storage for the duration of the call so a
/// re-entrant schedule from inside the effect cannot alias the borrow.
pub(crate) fn execute_effect(effect_id: NodeId) {
	let f = EFFECT_FUNCTIONS.with(|storage| storage.borrow_mut().remove(&effect_id));

	let Some(mut f) = f else {
		return;
	};

	with_runtime(|rt| {
		rt.clear_dependencies(effect_id);
		rt.push_observer(Observer {
			id: effect_id,
			node_type: NodeType::Effect,
		});
	});

	f();

	with_runtime(|rt| {
		rt.pop_observer();
	});

	EFFECT_FUNCTIONS.with(|storage| {
		storage.borrow_mut().insert(effect_id, f);
	});
}

/// A reactive effect that automatically re-runs when its dependencies change.
///
/// ## Example
///
/// ```ignore
/// use waymark_reactive::{Signal, Effect, with_runtime};
///
/// let count = Signal::new(0);
///
/// let count_clone = count.clone();
/// let _effect = Effect::new(move || {
///     println!("Count: {}", count_clone.get());
/// });
///
/// count.set(42);
/// with_runtime(|rt| rt.flush_updates()); // Prints: "Count: 42"
/// ```
pub struct Effect {
	/// Unique identifier for this effect
	id: NodeId,
	/// Whether this effect has been disposed
	disposed: Rc<RefCell<bool>>,
}

impl Effect {
	/// Create a new Effect that runs the given function.
	///
	/// The function runs immediately, and re-runs on flush whenever any
	/// dependency it accessed changes.
	pub fn new<F>(mut f: F) -> Self
	where
		F: FnMut() + 'static,
	{
		let id = NodeId::new();
		let disposed = Rc::new(RefCell::new(false));

		let disposed_clone = disposed.clone();
		EFFECT_FUNCTIONS.with(|storage| {
			storage.borrow_mut().insert(
				id,
				Box::new(move || {
					if !*disposed_clone.borrow() {
						f();
					}
				}),
			);
		});

		execute_effect(id);

		Self { id, disposed }
	}

	/// Stop this effect from ever running again.
	pub fn dispose(&self) {
		*self.disposed.borrow_mut() = true;
		// try_with: dispose runs from Drop, which can fire in a TLS
		// destructor after the function storage was destroyed
		let _ = EFFECT_FUNCTIONS.try_with(|storage| {
			storage.borrow_mut().remove(&self.id);
		});
		try_with_runtime(|rt| rt.remove_node(self.id));
	}

	/// The node id of this effect (for testing and diagnostics).
	pub fn id(&self) -> NodeId {
		self.id
	}
}

impl Drop for Effect {
	fn drop(&mut self) {
		self.dispose();
	}
}
