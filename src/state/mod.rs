//! State - Controller and View State
//!
//! Each state module owns one distinct piece of application state. The
//! scenario controller is the only one that writes to storage.

pub mod change_tracker;
pub mod connection_state;
pub mod mass_fetch_state;
pub mod scenario_state;

pub use change_tracker::*;
pub use connection_state::*;
pub use mass_fetch_state::*;
pub use scenario_state::*;
