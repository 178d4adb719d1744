//! Integration tests for the reactive system
//!
//! These tests verify:
//! 1. Effects are automatically re-executed when Signals change
//! 2. Memo values are cached and recalculated only when dependent Signals change
//! 3. Invalidation cascades through Memo chains
//! 4. Nodes are removed from the dependency graph when dropped

use std::cell::RefCell;
use std::rc::Rc;
use waymark_reactive::{Effect, Memo, Signal, with_runtime};

#[test]
fn test_effect_auto_execution_on_signal_change() {
	let count = Signal::new(0);
	let execution_log = Rc::new(RefCell::new(Vec::new()));
	let log_clone = execution_log.clone();

	let count_clone = count.clone();
	let _effect = Effect::new(move || {
		log_clone.borrow_mut().push(count_clone.get());
	});

	// Initial execution
	assert_eq!(*execution_log.borrow(), vec![0]);

	count.set(10);
	with_runtime(|rt| rt.flush_updates());
	assert_eq!(*execution_log.borrow(), vec![0, 10]);

	count.update(|n| *n += 5);
	with_runtime(|rt| rt.flush_updates());
	assert_eq!(*execution_log.borrow(), vec![0, 10, 15]);
}

#[test]
fn test_effect_with_multiple_signals() {
	let first = Signal::new(1);
	let second = Signal::new(2);
	let sum = Rc::new(RefCell::new(0));
	let sum_clone = sum.clone();

	let s1 = first.clone();
	let s2 = second.clone();
	let _effect = Effect::new(move || {
		*sum_clone.borrow_mut() = s1.get() + s2.get();
	});

	assert_eq!(*sum.borrow(), 3);

	first.set(10);
	with_runtime(|rt| rt.flush_updates());
	assert_eq!(*sum.borrow(), 12);

	second.set(20);
	with_runtime(|rt| rt.flush_updates());
	assert_eq!(*sum.borrow(), 30);
}

#[test]
fn test_burst_of_changes_coalesces_into_one_flush() {
	let count = Signal::new(0);
	let runs = Rc::new(RefCell::new(0));

	let count_clone = count.clone();
	let runs_clone = runs.clone();
	let _effect = Effect::new(move || {
		let _ = count_clone.get();
		*runs_clone.borrow_mut() += 1;
	});
	assert_eq!(*runs.borrow(), 1);

	// Three synchronous writes, one flush, one re-run
	count.set(1);
	count.set(2);
	count.set(3);
	with_runtime(|rt| rt.flush_updates());

	assert_eq!(*runs.borrow(), 2);
	assert_eq!(count.get(), 3);
}

#[test]
fn test_memo_recomputes_only_when_stale() {
	let items = Signal::new(vec![1, 2, 3]);
	let computations = Rc::new(RefCell::new(0));

	let items_clone = items.clone();
	let computations_clone = computations.clone();
	let total = Memo::new(move || {
		*computations_clone.borrow_mut() += 1;
		items_clone.get().iter().sum::<i32>()
	});

	assert_eq!(total.get(), 6);
	assert_eq!(total.get(), 6);
	assert_eq!(*computations.borrow(), 1);

	items.update(|v| v.push(4));
	assert_eq!(total.get(), 10);
	assert_eq!(*computations.borrow(), 2);
}

#[test]
fn test_memo_chain_propagates_invalidation() {
	let base = Signal::new(2);

	let b = base.clone();
	let squared = Memo::new(move || {
		let n = b.get();
		n * n
	});

	let sq = squared.clone();
	let described = Memo::new(move || format!("value: {}", sq.get()));

	assert_eq!(described.get(), "value: 4");

	base.set(3);
	assert_eq!(described.get(), "value: 9");
}

#[test]
fn test_effect_depending_on_memo() {
	let base = Signal::new(1);
	let b = base.clone();
	let doubled = Memo::new(move || b.get() * 2);

	let seen = Rc::new(RefCell::new(Vec::new()));
	let seen_clone = seen.clone();
	let d = doubled.clone();
	let _effect = Effect::new(move || {
		seen_clone.borrow_mut().push(d.get());
	});

	assert_eq!(*seen.borrow(), vec![2]);

	base.set(5);
	with_runtime(|rt| rt.flush_updates());
	assert_eq!(*seen.borrow(), vec![2, 10]);
}

#[test]
fn test_memo_held_in_tls_drops_cleanly_at_thread_exit() {
	// A memo stored in thread-local state is dropped by the TLS destructor,
	// possibly after the runtime's own thread locals are already gone. The
	// drop must degrade to a no-op instead of aborting the process.
	std::thread::spawn(|| {
		thread_local! {
			static HELD: RefCell<Option<Memo<i32>>> = const { RefCell::new(None) };
		}

		let source = Signal::new(1);
		let s = source.clone();
		let memo = Memo::new(move || s.get());
		assert_eq!(memo.get(), 1);
		HELD.with(|slot| *slot.borrow_mut() = Some(memo));
	})
	.join()
	.unwrap();
}

#[test]
fn test_no_leak_after_drop() {
	let signal = Signal::new(0);
	let signal_id = signal.id();

	let s = signal.clone();
	let memo = Memo::new(move || s.get());
	let memo_id = memo.id();
	let _ = memo.get();

	assert!(with_runtime(|rt| rt.has_node(signal_id)));
	assert_eq!(with_runtime(|rt| rt.subscriber_count(signal_id)), 1);

	drop(memo);
	assert!(!with_runtime(|rt| rt.has_node(memo_id)));
	assert_eq!(with_runtime(|rt| rt.subscriber_count(signal_id)), 0);
}
