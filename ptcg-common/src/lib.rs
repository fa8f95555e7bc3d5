//! # PTCG Common Library
//!
//! Shared code for the catalog sync tools:
//! - Error type shared across crates
//! - Configuration resolution (CLI → environment → TOML → default)
//! - SQLite connection setup and catalog table definitions

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use error::{Error, Result};
