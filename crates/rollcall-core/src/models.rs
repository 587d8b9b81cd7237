//! Domain models for ROLLCALL.
//!
//! These are the core types shared across all crates.

pub mod principal;
pub mod record;
pub mod session;
