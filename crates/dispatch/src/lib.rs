//! Deferred fire-and-forget notification dispatch.
//!
//! Moves the Slack round-trip off the critical path of the request that
//! triggered an event: `launch` posts a self-addressed loopback request
//! carrying a signed one-time token plus the full message, and the
//! process-side endpoint redeems the token and performs the delivery on a
//! fresh request cycle. The two requests may land on different workers
//! behind a load balancer, so nothing bridges them except the request body.

pub mod dispatcher;
pub mod token;

pub use dispatcher::{DeferredDispatcher, DeferredRequest, DISPATCH_ACTION};
pub use token::TokenIssuer;
