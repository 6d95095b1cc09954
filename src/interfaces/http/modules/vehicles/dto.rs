//! Vehicle DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::Vehicle;

/// Request to register a vehicle
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterVehicleRequest {
    /// Licence plate, unique across the fleet
    #[validate(length(max = 10))]
    #[schema(example = "ABC123")]
    pub plate: String,
    /// Passenger seats (> 0)
    #[schema(example = 40)]
    pub capacity: i32,
    /// Type label
    #[validate(length(max = 50))]
    #[schema(example = "bus")]
    pub vehicle_type: String,
}

/// Request to change capacity and type
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVehicleRequest {
    pub capacity: i32,
    #[validate(length(max = 50))]
    pub vehicle_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VehicleDto {
    pub id: i32,
    pub plate: String,
    pub capacity: i32,
    pub vehicle_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleDto {
    fn from(v: Vehicle) -> Self {
        Self {
            id: v.id,
            plate: v.plate,
            capacity: v.capacity,
            vehicle_type: v.vehicle_type,
            created_at: v.created_at,
        }
    }
}
