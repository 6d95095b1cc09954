//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod customer_repository;
pub mod repository_provider;
pub mod reservation_repository;
pub mod trip_repository;
pub mod vehicle_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use log::error;
use sea_orm::{DbErr, SqlErr};

use crate::domain::DomainError;

/// Constraint violations become `Conflict`, everything else `Storage`.
pub(crate) fn db_err(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            DomainError::conflict(format!("Duplicate record: {}", detail))
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            DomainError::conflict(format!("Record is still referenced: {}", detail))
        }
        _ => {
            error!("Database error: {}", e);
            DomainError::Storage(e.to_string())
        }
    }
}
