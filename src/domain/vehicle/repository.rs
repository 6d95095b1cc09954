//! Vehicle repository interface

use async_trait::async_trait;

use super::model::Vehicle;
use crate::domain::DomainResult;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Insert a new vehicle and return it with its generated id.
    /// A duplicate plate yields `DomainError::Conflict`.
    async fn save(&self, vehicle: Vehicle) -> DomainResult<Vehicle>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Vehicle>>;

    async fn find_by_plate(&self, plate: &str) -> DomainResult<Option<Vehicle>>;

    async fn find_all(&self) -> DomainResult<Vec<Vehicle>>;

    /// Overwrite capacity and type of an existing vehicle.
    async fn update(&self, vehicle: Vehicle) -> DomainResult<Vehicle>;

    async fn delete(&self, id: i32) -> DomainResult<()>;
}
