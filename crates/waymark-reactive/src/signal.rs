//! Signal - Fine-grained Reactive Primitive
//!
//! `Signal<T>` is the core reactive primitive that holds a value and
//! automatically tracks dependencies when accessed.
//!
//! ## Key Features
//!
//! - **Automatic Dependency Tracking**: When `get()` is called inside an
//!   Effect or Memo, the dependency is automatically recorded.
//! - **Change Notification**: When `set()` or `update()` is called, dependent
//!   Memos are invalidated and dependent Effects are scheduled.
//! - **Lightweight**: `Signal<T>` is just a NodeId plus an `Rc`, making it
//!   cheap to clone and pass around.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::runtime::{NodeId, try_with_runtime, with_runtime};

/// A reactive signal that holds a value and tracks dependencies.
///
/// All clones of the same Signal share the same underlying value.
#[derive(Clone)]
pub struct Signal<T: 'static> {
	/// Unique identifier for this signal
	id: NodeId,
	/// The actual value, shared via reference counting
	value: Rc<RefCell<T>>,
}

impl<T: 'static> Signal<T> {
	/// Create a new Signal with the given initial value.
	pub fn new(value: T) -> Self {
		Self {
			id: NodeId::new(),
			value: Rc::new(RefCell::new(value)),
		}
	}

	/// Get the current value of the signal.
	///
	/// This automatically tracks the dependency when called from within an
	/// Effect or Memo.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		with_runtime(|rt| rt.track_dependency(self.id));
		self.get_untracked()
	}

	/// Get the current value without tracking dependencies.
	pub fn get_untracked(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Run a closure against a borrow of the current value, with tracking.
	///
	/// Avoids cloning when only a projection of the value is needed.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		with_runtime(|rt| rt.track_dependency(self.id));
		f(&self.value.borrow())
	}

	/// Set the signal to a new value.
	///
	/// Invalidates dependent Memos and schedules dependent Effects.
	pub fn set(&self, value: T) {
		*self.value.borrow_mut() = value;
		with_runtime(|rt| rt.notify_change(self.id));
	}

	/// Update the signal's value in place using a function.
	///
	/// Dependents are notified once, after the closure returns.
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(&mut T),
	{
		f(&mut self.value.borrow_mut());
		with_runtime(|rt| rt.notify_change(self.id));
	}

	/// The node id of this signal (for testing and diagnostics).
	pub fn id(&self) -> NodeId {
		self.id
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("id", &self.id)
			.field("value", &*self.value.borrow())
			.finish()
	}
}

impl<T: 'static> Drop for Signal<T> {
	fn drop(&mut self) {
		// Only the last clone removes the node from the graph
		if Rc::strong_count(&self.value) == 1 {
			try_with_runtime(|rt| rt.remove_node(self.id));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_signal_new_and_get() {
		let signal = Signal::new(42);
		assert_eq!(signal.get(), 42);
	}

	#[test]
	fn test_signal_set() {
		let signal = Signal::new(0);
		signal.set(10);
		assert_eq!(signal.get(), 10);
	}

	#[test]
	fn test_signal_update() {
		let signal = Signal::new(5);
		signal.update(|n| *n *= 2);
		assert_eq!(signal.get(), 10);
	}

	#[test]
	fn test_signal_clone_shares_value() {
		let a = Signal::new(String::from("one"));
		let b = a.clone();
		b.set(String::from("two"));
		assert_eq!(a.get(), "two");
	}

	#[test]
	fn test_signal_with_projection() {
		let signal = Signal::new(vec![1, 2, 3]);
		let len = signal.with(|v| v.len());
		assert_eq!(len, 3);
	}

	#[test]
	fn test_signal_drop_removes_node() {
		let signal = Signal::new(1);
		let id = signal.id();

		// Force the node into the graph by subscribing a memo to it
		let sig = signal.clone();
		let memo = crate::Memo::new(move || sig.get());
		let _ = memo.get();
		assert!(with_runtime(|rt| rt.has_node(id)));

		drop(memo);
		drop(signal);
		assert!(!with_runtime(|rt| rt.has_node(id)));
	}
}
