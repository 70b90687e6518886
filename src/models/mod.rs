pub mod booking;
pub mod driver;
pub mod issue;
pub mod notification;
pub mod pricing;
pub mod user;
