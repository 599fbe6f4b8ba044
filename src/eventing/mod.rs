//! Eventing - Controller to UI Messages

pub mod app_event;

pub use app_event::*;
