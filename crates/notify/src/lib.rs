//! Notification engine for host-platform activity events.
//!
//! This crate provides:
//! - Collaborator traits for the host's user, location, and action-log data
//! - Per-event message formatting rules
//! - A windowed duplicate suppressor for noisy event kinds
//! - The Slack incoming-webhook delivery client
//! - `NotificationService` tying them together behind a `Dispatch` seam

pub mod format;
pub mod service;
pub mod slack;
pub mod suppress;
pub mod traits;

pub use service::NotificationService;
pub use slack::SlackClient;
pub use suppress::DuplicateSuppressor;
pub use traits::{
    ActionLog, DeliveryOutcome, Dispatch, GeoLookup, NotifyError, SlackMessage, UserDirectory,
    UserRecord,
};
