//! Database initialization and shared queries

pub mod init;
pub mod settings;

pub use init::*;
