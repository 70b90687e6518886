use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::models::notification::{Notification, NotificationKind};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    User,
    Driver,
}

/// Builds one notification and writes it to every target feed.
pub struct NotificationBuilder {
    title: String,
    body: String,
    kind: NotificationKind,
    booking_id: Option<Uuid>,
    targets: Vec<(Feed, Uuid)>,
}

impl NotificationBuilder {
    pub fn new(title: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            title: title.into(),
            body: String::new(),
            kind,
            booking_id: None,
            targets: Vec::new(),
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn booking(mut self, booking_id: Uuid) -> Self {
        self.booking_id = Some(booking_id);
        self
    }

    pub fn to_user(mut self, user_id: Uuid) -> Self {
        self.targets.push((Feed::User, user_id));
        self
    }

    pub fn to_driver(mut self, driver_id: Uuid) -> Self {
        self.targets.push((Feed::Driver, driver_id));
        self
    }

    pub fn send(self, state: &AppState) -> usize {
        let now = Utc::now();
        for (feed, recipient_id) in &self.targets {
            let notification = Notification {
                id: Uuid::new_v4(),
                recipient_id: *recipient_id,
                title: self.title.clone(),
                body: self.body.clone(),
                kind: self.kind,
                booking_id: self.booking_id,
                read: false,
                created_at: now,
            };
            let collection = match feed {
                Feed::User => &state.notifications,
                Feed::Driver => &state.driver_notifications,
            };
            collection.insert(notification.id, notification);
        }
        self.targets.len()
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationFeed {
    pub unread: usize,
    pub items: Vec<Notification>,
}

/// Newest first.
pub fn feed_for(collection: &DashMap<Uuid, Notification>, recipient_id: Uuid) -> NotificationFeed {
    let mut items: Vec<Notification> = collection
        .iter()
        .filter(|entry| entry.recipient_id == recipient_id)
        .map(|entry| entry.value().clone())
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    NotificationFeed {
        unread: items.iter().filter(|n| !n.read).count(),
        items,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::email::HttpEmailSender;
    use crate::state::Settings;

    fn state() -> AppState {
        AppState::new(
            16,
            Settings::default(),
            Arc::new(HttpEmailSender::new(Default::default())),
        )
    }

    #[test]
    fn targets_land_in_their_own_feeds() {
        let state = state();
        let customer = Uuid::new_v4();
        let driver = Uuid::new_v4();

        let sent = NotificationBuilder::new("Ride accepted", NotificationKind::BookingAccepted)
            .body("Your driver is on the way")
            .to_user(customer)
            .to_driver(driver)
            .send(&state);

        assert_eq!(sent, 2);
        assert_eq!(feed_for(&state.notifications, customer).items.len(), 1);
        assert_eq!(feed_for(&state.driver_notifications, driver).items.len(), 1);
        assert_eq!(feed_for(&state.notifications, driver).items.len(), 0);
    }

    #[test]
    fn unread_count_ignores_read_items() {
        let state = state();
        let customer = Uuid::new_v4();
        for _ in 0..3 {
            NotificationBuilder::new("Update", NotificationKind::RideStatusChanged)
                .to_user(customer)
                .send(&state);
        }
        if let Some(mut first) = state.notifications.iter_mut().next() {
            first.read = true;
        }

        let feed = feed_for(&state.notifications, customer);
        assert_eq!(feed.items.len(), 3);
        assert_eq!(feed.unread, 2);
    }
}
