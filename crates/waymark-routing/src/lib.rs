//! # waymark-routing
//!
//! Reactive, typed URL route parameters with batched navigation.
//!
//! Each [`ComputedRouteParam`] exposes one named URL parameter as a typed
//! reactive value with `push`/`replace` setters. Setter calls issued within
//! the same synchronous burst accumulate in the [`update`] queue and flush
//! as a single navigation: the batch is reconciled into one parameter map
//! and one route pattern, the URL is interpolated once, and the installed
//! [`store::RoutingStore`] is invoked exactly once.
//!
//! ## Setup
//!
//! ```ignore
//! use waymark_routing::{
//!     ComputedRouteParam, Location, RouteParamOptions, RoutingStore,
//!     SetRouteParamOptions, set_routing_store,
//! };
//!
//! let (store, history) = RoutingStore::in_memory(Location::new("/", ""));
//! set_routing_store(store);
//!
//! let page = ComputedRouteParam::int("page", RouteParamOptions::on_patterns(["/"]))?;
//! let handle = page.push(Some(2), SetRouteParamOptions::default());
//! let url = waymark_routing::flush_route_updates()?;
//! assert_eq!(url, "/?page=2");
//! ```

pub mod computed;
pub mod error;
pub mod interpolate;
pub mod params;
pub mod pattern;
pub mod query;
pub mod store;
pub mod update;

pub use computed::{
	CleanParams, ComputedRouteParam, NamedParam, RouteParamOptions, RouteParamValue,
	SetRouteParamOptions, computed_route_param,
};
pub use error::{PatternError, RouteUpdateError};
pub use interpolate::set_passthrough_prefixes;
pub use params::{ParamMap, empty_params, route_params};
pub use pattern::PathPattern;
pub use query::{parse_query, stringify_query};
pub use store::{
	HistoryBackend, Location, MemoryHistory, NavigationType, RoutingStore,
	routing_store_installed, set_routing_store, with_routing_store,
};
pub use update::{
	ParamValue, PendingUpdate, RouteCandidate, UpdateHandle, flush_route_updates,
	pending_update_count, request_route_update, set_flush_scheduler,
};

/// Tears down all per-thread routing state: the installed store, the param
/// memo cache, the pending update queue, and the pass-through prefix
/// configuration. Intended for test isolation.
pub fn reset_routing_state() {
	store::reset_store();
	params::reset_params_cache();
	update::reset_update_queue();
	interpolate::reset_passthrough_prefixes();
}
