//! Finalyze Library
//!
//! Named analytics scenarios over browser-style key-value storage, the
//! inheritance rules of the post-transform settings table, and the client
//! side of the mass-fetch ingestion jobs.

pub mod cli;
pub mod constants;
pub mod domain;
pub mod error;
pub mod eventing;
pub mod helpers;
pub mod services;
pub mod settings;
pub mod state;
pub mod storage;

pub use error::{Error, Result};
