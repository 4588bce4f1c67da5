/// Account Service Library
///
/// User identity for CeramiCraft: registration with emailed activation
/// codes, login, profiles and shipping addresses.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `db`: Store contracts with PostgreSQL and in-memory backends
/// - `error`: Error types
/// - `metrics`: Prometheus counters
/// - `models`: Data models and events
/// - `security`: Password hashing, activation codes, access tokens
/// - `services`: Business logic (registration, login, profile, addresses, email, kafka)
/// - `state`: Dependency wiring
/// - `validators`: Input validation
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod security;
pub mod services;
pub mod state;
pub mod validators;

// Re-export commonly used types
pub use error::{AccountError, Result};
pub use state::AppState;
