//! Domain - Pure Data Structures
//!
//! These types carry no storage or UI dependencies.

pub mod inheritance;
pub mod job;
pub mod radar;
pub mod scenario;
pub mod ticker;
