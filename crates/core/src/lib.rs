pub mod config;
pub mod error;
pub mod event;
pub mod settings;

pub use config::Config;
pub use error::ChimeError;
pub use event::*;
pub use settings::{Settings, SettingsStore};
