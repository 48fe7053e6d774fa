//! Typed event model for the host-platform hook surface.
//!
//! Each hook the host fires maps to one variant with a fixed field set,
//! validated at deserialization instead of trusted as a loose payload bag.
//! The same tagged form travels over the hook intake endpoint and inside
//! the deferred dispatch request.

use serde::{Deserialize, Serialize};

pub type UserId = u64;

/// One domain event fired by the host platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    UserRegistered {
        user_id: UserId,
    },
    GroupCreated {
        user_id: UserId,
        group_key: String,
        #[serde(default)]
        group: GroupMeta,
    },
    ThreeMonthPlanUpdated {
        user_id: UserId,
        #[serde(default)]
        plan_items: Vec<String>,
    },
    ColeaderInvitationResponded {
        user_id: UserId,
        group_key: String,
        decision: InvitationDecision,
    },
    SessionCompleted {
        group_key: String,
        session: u32,
        owner_id: UserId,
        current_user_id: UserId,
    },
}

impl NotificationEvent {
    /// Stable key used when querying the action log for duplicates.
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "user_registered",
            Self::GroupCreated { .. } => "group_created",
            Self::ThreeMonthPlanUpdated { .. } => "three_month_plan_updated",
            Self::ColeaderInvitationResponded { .. } => "coleader_invitation_responded",
            Self::SessionCompleted { .. } => "session_completed",
        }
    }

    /// The user whose alias appears in the message text.
    pub fn actor_id(&self) -> UserId {
        match self {
            Self::UserRegistered { user_id }
            | Self::GroupCreated { user_id, .. }
            | Self::ThreeMonthPlanUpdated { user_id, .. }
            | Self::ColeaderInvitationResponded { user_id, .. } => *user_id,
            Self::SessionCompleted { current_user_id, .. } => *current_user_id,
        }
    }

    pub fn group_key(&self) -> Option<&str> {
        match self {
            Self::GroupCreated { group_key, .. }
            | Self::ColeaderInvitationResponded { group_key, .. }
            | Self::SessionCompleted { group_key, .. } => Some(group_key),
            _ => None,
        }
    }

    /// Whether this kind is noisy enough to run through the duplicate
    /// suppressor (recurring progress pings).
    pub fn is_throttled(&self) -> bool {
        matches!(
            self,
            Self::ThreeMonthPlanUpdated { .. } | Self::SessionCompleted { .. }
        )
    }
}

/// Group metadata supplied by the host alongside group events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMeta {
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub member_count: Option<u32>,
}

/// A co-leader's answer to a group invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationDecision {
    Accepted,
    Declined,
}

impl InvitationDecision {
    /// Past-tense verb used directly in the message text.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}
