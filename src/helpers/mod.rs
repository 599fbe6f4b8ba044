//! Helper Utilities
//!
//! Common utilities used across the application.

mod fs;
mod string;

pub use fs::*;
pub use string::*;
