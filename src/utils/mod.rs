//! Shared utilities: the crate error type, log setup and form helpers

pub mod errors;
pub mod logging;
pub mod helpers;

pub use errors::{OpenHouseError, Result};
