//! # Waymark
//!
//! Reactive, typed URL route parameters with batched navigation.
//!
//! Waymark keeps pieces of application state in the URL: each
//! [`ComputedRouteParam`] binds one named parameter (path slot or query
//! entry) to a typed reactive value. Reads recompute automatically when the
//! location changes; writes accumulate in a per-tick batch that reconciles
//! every pending change into a single URL and performs exactly one
//! navigation, however many parameters were written in the burst.
//!
//! The workspace splits into two crates, re-exported here:
//!
//! - `waymark-reactive` - the pull-based signal/memo/effect runtime
//! - `waymark-routing` - patterns, the routing store, and the batched
//!   update engine
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use waymark::prelude::*;
//!
//! let (store, history) = RoutingStore::in_memory(Location::new("/", ""));
//! set_routing_store(store);
//!
//! let page = ComputedRouteParam::int("page", RouteParamOptions::on_patterns(["/"]))?;
//! let tab = ComputedRouteParam::<String>::new("tab", RouteParamOptions::on_patterns(["/"]))?;
//!
//! // Two writes in one burst: one navigation.
//! page.push(Some(2), SetRouteParamOptions::default());
//! tab.push(Some("posts".into()), SetRouteParamOptions::default());
//! assert_eq!(flush_route_updates()?, "/?page=2&tab=posts");
//! assert_eq!(history.len(), 1);
//! ```

// Re-export the reactive runtime
pub use waymark_reactive::{Effect, Memo, Signal, set_scheduler, with_runtime};

// Re-export patterns and the routing store
pub use waymark_routing::{
	HistoryBackend, Location, MemoryHistory, NavigationType, PathPattern, PatternError,
	RouteUpdateError, RoutingStore, parse_query, routing_store_installed, set_routing_store,
	stringify_query, with_routing_store,
};

// Re-export computed parameters and the update engine
pub use waymark_routing::{
	CleanParams, ComputedRouteParam, NamedParam, ParamMap, ParamValue, PendingUpdate,
	RouteCandidate, RouteParamOptions, RouteParamValue, SetRouteParamOptions, UpdateHandle,
	computed_route_param, empty_params, flush_route_updates, pending_update_count,
	request_route_update, reset_routing_state, route_params, set_flush_scheduler,
	set_passthrough_prefixes,
};

pub mod prelude {
	pub use crate::{
		CleanParams, ComputedRouteParam, Effect, Location, Memo, NavigationType, RouteParamOptions,
		RouteParamValue, RoutingStore, SetRouteParamOptions, Signal, UpdateHandle,
		computed_route_param, flush_route_updates, set_routing_store,
	};
}
