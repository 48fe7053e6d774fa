//! HTTP surface of the notification bridge.
//!
//! Three route groups: the host-platform hook intake, the internal
//! deferred-dispatch endpoint, and the operator settings endpoints.

pub mod api;
pub mod host;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
