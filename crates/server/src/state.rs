use std::sync::Arc;

use chime_core::SettingsStore;
use chime_dispatch::DeferredDispatcher;
use chime_notify::{NotificationService, SlackClient};

pub struct AppState {
    pub service: NotificationService,
    pub dispatcher: Arc<DeferredDispatcher>,
    pub slack: SlackClient,
    pub settings: Arc<SettingsStore>,
}
