//! Test utilities for HTTP-level testing.
//!
//! This module provides:
//! - A fixed test configuration with overridable fields
//! - Token and cookie factories for building authenticated requests
//! - A helper that assembles the full application behind a `TestServer`

mod app;
mod factories;

pub use app::*;
pub use factories::*;
