//! Vehicle domain entity

use chrono::{DateTime, Utc};

use crate::domain::{DomainError, DomainResult};

pub const MAX_PLATE_LEN: usize = 10;
pub const MAX_TYPE_LEN: usize = 50;

/// A registered vehicle. Its capacity bounds the seats of every trip it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    /// Store-generated id (0 until persisted)
    pub id: i32,
    /// Licence plate, unique across the fleet
    pub plate: String,
    /// Passenger seats
    pub capacity: i32,
    /// Free-form type label ("bus", "van", ...)
    pub vehicle_type: String,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(
        plate: impl Into<String>,
        capacity: i32,
        vehicle_type: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let vehicle = Self {
            id: 0,
            plate: plate.into().trim().to_string(),
            capacity,
            vehicle_type: vehicle_type.into().trim().to_string(),
            created_at,
        };
        vehicle.validate()?;
        Ok(vehicle)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.plate.is_empty() {
            return Err(DomainError::invalid("plate is required"));
        }
        if self.plate.chars().count() > MAX_PLATE_LEN {
            return Err(DomainError::invalid(format!(
                "plate must be at most {} characters",
                MAX_PLATE_LEN
            )));
        }
        if self.capacity <= 0 {
            return Err(DomainError::invalid("capacity must be greater than zero"));
        }
        if self.vehicle_type.is_empty() || self.vehicle_type.chars().count() > MAX_TYPE_LEN {
            return Err(DomainError::invalid(format!(
                "vehicle type must be 1..={} characters",
                MAX_TYPE_LEN
            )));
        }
        Ok(())
    }
}
