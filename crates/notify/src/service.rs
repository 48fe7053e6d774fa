//! Process-wide notification service.
//!
//! Constructed once at startup with injected collaborators and driven by
//! the host's hook surface. Every failure path is a silent no-op from the
//! caller's perspective: the triggering feature must never fail because
//! notification handling failed.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use chime_core::{NotificationEvent, SettingsStore};

use crate::format;
use crate::suppress::DuplicateSuppressor;
use crate::traits::{ActionLog, Dispatch, GeoLookup, UserDirectory};

pub struct NotificationService {
    users: Arc<dyn UserDirectory>,
    geo: Arc<dyn GeoLookup>,
    actions: Arc<dyn ActionLog>,
    settings: Arc<SettingsStore>,
    dispatch: Arc<dyn Dispatch>,
    suppressor: DuplicateSuppressor,
}

impl NotificationService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        geo: Arc<dyn GeoLookup>,
        actions: Arc<dyn ActionLog>,
        settings: Arc<SettingsStore>,
        dispatch: Arc<dyn Dispatch>,
        suppressor: DuplicateSuppressor,
    ) -> Self {
        Self {
            users,
            geo,
            actions,
            settings,
            dispatch,
            suppressor,
        }
    }

    /// Entry point for one fired hook: suppressor gate, then formatting,
    /// then hand-off to the deferred dispatcher.
    pub async fn handle(&self, event: &NotificationEvent) {
        self.handle_at(event, Utc::now()).await;
    }

    /// Like [`handle`](Self::handle) with an explicit clock, so the
    /// suppression window is testable.
    pub async fn handle_at(&self, event: &NotificationEvent, now: DateTime<Utc>) {
        if event.is_throttled()
            && self
                .suppressor
                .is_duplicate(
                    self.actions.as_ref(),
                    event.actor_id(),
                    event.group_key(),
                    event.action_name(),
                    now,
                )
                .await
        {
            tracing::debug!(
                action = event.action_name(),
                user_id = event.actor_id(),
                "repeat inside suppression window, dropped"
            );
            return;
        }

        let settings = self.settings.get().await;
        let message = match format::format(
            event,
            self.users.as_ref(),
            self.geo.as_ref(),
            &settings.channel,
        )
        .await
        {
            Some(message) => message,
            None => {
                tracing::debug!(action = event.action_name(), "event skipped by formatter");
                return;
            }
        };

        self.dispatch.launch(message).await;
    }
}
