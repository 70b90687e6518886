pub mod display;
pub mod lifecycle;
pub mod progress;
