pub mod api;
pub mod config;
pub mod contact;
pub mod email;
pub mod engine;
pub mod error;
pub mod geo;
pub mod models;
pub mod notifications;
pub mod observability;
pub mod payments;
pub mod ride;
pub mod session;
pub mod state;
