use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::{AdminSeed, Config};
use crate::email::EmailSender;
use crate::models::booking::{Booking, BookingEvent};
use crate::models::driver::Driver;
use crate::models::issue::Issue;
use crate::models::notification::Notification;
use crate::models::pricing::DriverPricing;
use crate::models::user::{Role, User};
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub users: DashMap<Uuid, User>,
    /// Lowercased email to user id; the entry lock makes registration unique.
    pub emails: DashMap<String, Uuid>,
    pub drivers: DashMap<Uuid, Driver>,
    pub bookings: DashMap<Uuid, Booking>,
    pub notifications: DashMap<Uuid, Notification>,
    pub driver_notifications: DashMap<Uuid, Notification>,
    pub driver_pricing: DashMap<Uuid, DriverPricing>,
    pub issues: DashMap<Uuid, Issue>,
    pub booking_events_tx: broadcast::Sender<BookingEvent>,
    pub email: Arc<dyn EmailSender>,
    pub settings: Settings,
    pub metrics: Metrics,
}

/// Runtime knobs the handlers read.
#[derive(Debug, Clone)]
pub struct Settings {
    pub carousel_interval_ms: u64,
    pub compliance_window_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            carousel_interval_ms: 5000,
            compliance_window_days: 30,
        }
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            carousel_interval_ms: config.carousel_interval_ms,
            compliance_window_days: config.compliance_window_days,
        }
    }
}

impl AppState {
    pub fn new(event_buffer_size: usize, settings: Settings, email: Arc<dyn EmailSender>) -> Self {
        let (booking_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            drivers: DashMap::new(),
            bookings: DashMap::new(),
            notifications: DashMap::new(),
            driver_notifications: DashMap::new(),
            driver_pricing: DashMap::new(),
            issues: DashMap::new(),
            booking_events_tx,
            email,
            settings,
            metrics: Metrics::new(),
        }
    }

    /// Stores `user` if no account holds its email yet.
    pub fn register(&self, user: User) -> Option<User> {
        match self.emails.entry(user.email.to_lowercase()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Some(user)
            }
        }
    }

    /// Registers the configured administrator unless the email is taken.
    pub fn seed_admin(&self, seed: &AdminSeed) -> Option<User> {
        self.register(User {
            id: Uuid::new_v4(),
            name: seed.name.clone(),
            email: seed.email.trim().to_lowercase(),
            phone: String::new(),
            role: Role::Admin,
            created_at: Utc::now(),
        })
    }

    /// Publishes the booking's current state to live listeners.
    pub fn publish(&self, booking: &Booking) {
        let event = BookingEvent {
            booking_id: booking.id,
            ride_status: booking.ride_status,
            booking: booking.clone(),
            at: booking.updated_at,
        };
        let _ = self.booking_events_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::HttpEmailSender;

    fn state() -> AppState {
        AppState::new(
            16,
            Settings::default(),
            Arc::new(HttpEmailSender::new(Default::default())),
        )
    }

    fn customer(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Wanjiru".to_string(),
            email: email.to_string(),
            phone: "254712345678".to_string(),
            role: Role::Customer,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn email_is_claimed_once_regardless_of_case() {
        let state = state();
        assert!(state.register(customer("wanjiru@example.com")).is_some());
        assert!(state.register(customer("Wanjiru@Example.com")).is_none());
        assert_eq!(state.users.len(), 1);
    }

    #[test]
    fn seeded_admin_is_not_duplicated() {
        let state = state();
        let seed = AdminSeed {
            name: "Ops".to_string(),
            email: "ops@taxitao.app".to_string(),
        };
        assert!(state.seed_admin(&seed).is_some());
        assert!(state.seed_admin(&seed).is_none());
        assert!(state.register(customer("OPS@taxitao.app")).is_none());
    }

    #[test]
    fn concurrent_registrations_keep_one_account_per_email() {
        let state = Arc::new(state());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || state.register(customer("race@example.com")).is_some())
            })
            .collect();
        let winners = handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(state.users.len(), 1);
    }
}
