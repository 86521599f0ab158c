//! Test helpers module
//!
//! Shared fixtures and a test context wired on the in-memory store.

#![allow(dead_code)]

pub mod test_context;
pub mod test_data;

pub use test_context::*;
pub use test_data::*;
