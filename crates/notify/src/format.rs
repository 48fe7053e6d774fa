//! Per-event message formatting rules.
//!
//! `format` maps an event to a `SlackMessage`, or to `None` (skip) when a
//! required lookup comes back empty. A skip is silent: one malformed event
//! must never disrupt the host request that fired the hook.

use chime_core::{GroupMeta, NotificationEvent};

use crate::traits::{GeoLookup, SlackMessage, UserDirectory, UserRecord};

/// Build the message for one event, or skip it.
///
/// `channel` is the configured default channel; every rule currently posts
/// there. Username and icon are left empty so the webhook's configured
/// identity applies.
pub async fn format(
    event: &NotificationEvent,
    users: &dyn UserDirectory,
    geo: &dyn GeoLookup,
    channel: &str,
) -> Option<SlackMessage> {
    let actor = users.user(event.actor_id()).await?;

    let text = match event {
        NotificationEvent::UserRegistered { user_id } => {
            let location = geo.location(*user_id).await;
            format!("{} just joined Zúme!", with_location(&alias(&actor), &location))
        }
        NotificationEvent::GroupCreated { user_id, group, .. } => {
            let location = geo.location(*user_id).await;
            group_created_text(&with_location(&alias(&actor), &location), group)
        }
        NotificationEvent::ThreeMonthPlanUpdated { .. } => {
            format!("{} is working on their 3 month plan.", alias(&actor))
        }
        NotificationEvent::ColeaderInvitationResponded { decision, .. } => {
            format!(
                "{} {} an invitation to join a group.",
                alias(&actor),
                decision.verb()
            )
        }
        NotificationEvent::SessionCompleted { session, .. } => {
            format!(
                "{} is leading a group through session {} right now!",
                alias(&actor),
                session
            )
        }
    };

    Some(SlackMessage {
        channel: channel.to_string(),
        text,
        username: String::new(),
        icon_emoji: String::new(),
    })
}

fn group_created_text(lead: &str, group: &GroupMeta) -> String {
    let mut text = format!("{lead} created a new group");
    if let Some(name) = group.group_name.as_deref().filter(|n| !n.trim().is_empty()) {
        text.push_str(&format!(" called {}", name.trim()));
    }
    if let Some(count) = group.member_count {
        text.push_str(&format!(" ({count} members)"));
    }
    text.push('.');
    text
}

/// Short display alias: first+last initial, else the first two letters of
/// the login, else `User-<id>`.
pub fn alias(user: &UserRecord) -> String {
    let first = user.first_name.trim().chars().next();
    let last = user.last_name.trim().chars().next();
    if let (Some(f), Some(l)) = (first, last) {
        return format!("{}{}", f.to_uppercase(), l.to_uppercase());
    }

    let login: String = user.login.trim().chars().take(2).collect();
    if !login.is_empty() {
        return login;
    }

    format!("User-{}", user.id)
}

/// Insert the location clause after the alias: `"AR, from Texas, USA,"`.
/// An empty location leaves the alias untouched.
fn with_location(alias: &str, location: &str) -> String {
    if location.is_empty() {
        alias.to_string()
    } else {
        format!("{alias}, from {location},")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chime_core::{InvitationDecision, UserId};
    use std::collections::HashMap;

    struct FakeUsers(HashMap<UserId, UserRecord>);

    #[async_trait]
    impl UserDirectory for FakeUsers {
        async fn user(&self, id: UserId) -> Option<UserRecord> {
            self.0.get(&id).cloned()
        }
    }

    struct FakeGeo(HashMap<UserId, String>);

    #[async_trait]
    impl GeoLookup for FakeGeo {
        async fn location(&self, id: UserId) -> String {
            self.0.get(&id).cloned().unwrap_or_default()
        }
    }

    fn user(id: UserId, login: &str, first: &str, last: &str) -> UserRecord {
        UserRecord {
            id,
            login: login.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    fn no_geo() -> FakeGeo {
        FakeGeo(HashMap::new())
    }

    #[test]
    fn alias_prefers_initials() {
        assert_eq!(alias(&user(1, "anar", "Ana", "Ruiz")), "AR");
    }

    #[test]
    fn alias_uppercases_initials() {
        assert_eq!(alias(&user(1, "x", "ana", "ruiz")), "AR");
    }

    #[test]
    fn alias_falls_back_to_login_prefix() {
        assert_eq!(alias(&user(1, "benjamin", "", "")), "be");
        assert_eq!(alias(&user(1, "benjamin", "Ben", "")), "be");
    }

    #[test]
    fn alias_degrades_to_user_id() {
        assert_eq!(alias(&user(42, "", "", "")), "User-42");
        assert_eq!(alias(&user(7, "  ", " ", " ")), "User-7");
    }

    #[tokio::test]
    async fn user_registered_without_location() {
        let users = FakeUsers(HashMap::from([(42, user(42, "anar", "Ana", "Ruiz"))]));
        let event = NotificationEvent::UserRegistered { user_id: 42 };
        let msg = format(&event, &users, &no_geo(), "activity").await.unwrap();
        assert_eq!(msg.text, "AR just joined Zúme!");
        assert_eq!(msg.channel, "activity");
        assert_eq!(msg.username, "");
        assert_eq!(msg.icon_emoji, "");
    }

    #[tokio::test]
    async fn user_registered_with_location() {
        let users = FakeUsers(HashMap::from([(42, user(42, "anar", "Ana", "Ruiz"))]));
        let geo = FakeGeo(HashMap::from([(42, "Texas, USA".to_string())]));
        let event = NotificationEvent::UserRegistered { user_id: 42 };
        let msg = format(&event, &users, &geo, "activity").await.unwrap();
        assert_eq!(msg.text, "AR, from Texas, USA, just joined Zúme!");
    }

    #[tokio::test]
    async fn unknown_user_is_skipped() {
        let users = FakeUsers(HashMap::new());
        let event = NotificationEvent::UserRegistered { user_id: 99 };
        assert!(format(&event, &users, &no_geo(), "activity").await.is_none());
    }

    #[tokio::test]
    async fn group_created_with_title() {
        let users = FakeUsers(HashMap::from([(7, user(7, "hanna", "Hanna", "Baker"))]));
        let event = NotificationEvent::GroupCreated {
            user_id: 7,
            group_key: "g1".to_string(),
            group: GroupMeta {
                group_name: Some("Hope".to_string()),
                member_count: None,
            },
        };
        let msg = format(&event, &users, &no_geo(), "activity").await.unwrap();
        assert_eq!(msg.text, "HB created a new group called Hope.");
    }

    #[tokio::test]
    async fn group_created_without_title() {
        let users = FakeUsers(HashMap::from([(7, user(7, "hanna", "Hanna", "Baker"))]));
        let event = NotificationEvent::GroupCreated {
            user_id: 7,
            group_key: "g1".to_string(),
            group: GroupMeta::default(),
        };
        let msg = format(&event, &users, &no_geo(), "activity").await.unwrap();
        assert_eq!(msg.text, "HB created a new group.");
    }

    #[tokio::test]
    async fn group_created_with_member_count() {
        let users = FakeUsers(HashMap::from([(7, user(7, "hanna", "Hanna", "Baker"))]));
        let event = NotificationEvent::GroupCreated {
            user_id: 7,
            group_key: "g1".to_string(),
            group: GroupMeta {
                group_name: Some("Hope".to_string()),
                member_count: Some(5),
            },
        };
        let msg = format(&event, &users, &no_geo(), "activity").await.unwrap();
        assert_eq!(msg.text, "HB created a new group called Hope (5 members).");
    }

    #[tokio::test]
    async fn plan_update_text() {
        let users = FakeUsers(HashMap::from([(3, user(3, "sam", "Sam", "Okoro"))]));
        let event = NotificationEvent::ThreeMonthPlanUpdated {
            user_id: 3,
            plan_items: vec!["pray daily".to_string()],
        };
        let msg = format(&event, &users, &no_geo(), "activity").await.unwrap();
        assert_eq!(msg.text, "SO is working on their 3 month plan.");
    }

    #[tokio::test]
    async fn invitation_response_uses_decision_verb() {
        let users = FakeUsers(HashMap::from([(8, user(8, "", "", ""))]));
        let event = NotificationEvent::ColeaderInvitationResponded {
            user_id: 8,
            group_key: "g2".to_string(),
            decision: InvitationDecision::Declined,
        };
        let msg = format(&event, &users, &no_geo(), "activity").await.unwrap();
        // No resolvable alias — degrades to User-<id> rather than failing.
        assert_eq!(msg.text, "User-8 declined an invitation to join a group.");
    }

    #[tokio::test]
    async fn session_complete_uses_current_user() {
        let users = FakeUsers(HashMap::from([(11, user(11, "lee", "Lena", "Ek"))]));
        let event = NotificationEvent::SessionCompleted {
            group_key: "g1".to_string(),
            session: 6,
            owner_id: 10,
            current_user_id: 11,
        };
        let msg = format(&event, &users, &no_geo(), "activity").await.unwrap();
        assert_eq!(msg.text, "LE is leading a group through session 6 right now!");
    }
}
