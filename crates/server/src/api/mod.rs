//! Route handlers, grouped by concern.

mod dispatch;
mod health;
mod hooks;
mod settings;

pub use dispatch::internal_dispatch;
pub use health::health;
pub use hooks::hook_event;
pub use settings::{settings_get, settings_test, settings_update};
