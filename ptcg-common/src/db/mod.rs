//! Database connection setup and catalog schema

pub mod init;
pub mod schema;

pub use init::*;
pub use schema::*;
