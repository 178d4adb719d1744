//! # waymark-reactive
//!
//! Pull-based reactive primitives for waymark.
//!
//! The model mirrors fine-grained signal systems: [`Signal`] holds state,
//! [`Memo`] caches a derived computation and recomputes lazily on read, and
//! [`Effect`] bridges reactivity to the outside world. A thread-local
//! [`Runtime`](runtime::Runtime) maintains the dependency graph and batches
//! effect re-runs behind a single scheduled flush.
//!
//! Without an installed scheduler ([`set_scheduler`]), pending effect runs
//! stay queued until `with_runtime(|rt| rt.flush_updates())`, the mode used
//! by native hosts and tests.

pub mod effect;
pub mod memo;
pub mod runtime;
pub mod signal;

pub use effect::Effect;
pub use memo::Memo;
pub use runtime::{NodeId, NodeType, Observer, Runtime, set_scheduler, with_runtime};
pub use signal::Signal;
