//! Database connection management and configuration.

mod connection;

pub use connection::{DatabaseConfig, DatabasePool};
