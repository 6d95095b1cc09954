//! # Travel Booking
//!
//! Trip scheduling and seat reservation service for a small vehicle fleet.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Vehicles, customers, trips and reservations with their rules and repository traits
//! - **application**: Services that coordinate repositories under per-vehicle and per-trip locks
//! - **infrastructure**: SeaORM (SQLite) and in-memory repository implementations
//! - **interfaces**: REST API with Swagger documentation and Prometheus metrics
//! - **shared**: Errors, clock, locks and shutdown plumbing
//! - **server**: Process bootstrap used by the CLI

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};

pub use application::BookingServices;

// Re-export API router
pub use interfaces::http::create_api_router;
