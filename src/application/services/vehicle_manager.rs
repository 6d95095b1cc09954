//! Vehicle registration and fleet maintenance

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::{DomainError, DomainResult, RepositoryProvider, Vehicle};
use crate::shared::{ScheduleGuard, ScheduleLocks, SharedClock};

/// Vehicle CRUD keyed by plate. Vehicles with trips departing in the future
/// are pinned: they can be neither edited nor removed.
pub struct VehicleManager {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    locks: Arc<ScheduleLocks>,
}

impl VehicleManager {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        locks: Arc<ScheduleLocks>,
    ) -> Self {
        Self { repos, clock, locks }
    }

    pub async fn register(
        &self,
        plate: &str,
        capacity: i32,
        vehicle_type: &str,
    ) -> DomainResult<Vehicle> {
        let vehicle = Vehicle::new(plate, capacity, vehicle_type, self.clock.now())?;

        if self
            .repos
            .vehicles()
            .find_by_plate(&vehicle.plate)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "Vehicle with plate {} already exists",
                vehicle.plate
            )));
        }

        let saved = self.repos.vehicles().save(vehicle).await?;
        info!(vehicle_id = saved.id, plate = %saved.plate, capacity = saved.capacity, "Vehicle registered");
        Ok(saved)
    }

    pub async fn get(&self, plate: &str) -> DomainResult<Option<Vehicle>> {
        self.repos.vehicles().find_by_plate(plate.trim()).await
    }

    pub async fn get_by_id(&self, id: i32) -> DomainResult<Option<Vehicle>> {
        self.repos.vehicles().find_by_id(id).await
    }

    pub async fn list(&self) -> DomainResult<Vec<Vehicle>> {
        self.repos.vehicles().find_all().await
    }

    /// Change capacity and type of the vehicle with `plate`.
    pub async fn update(
        &self,
        plate: &str,
        capacity: i32,
        vehicle_type: &str,
    ) -> DomainResult<Vehicle> {
        let now = self.clock.now();
        let (mut vehicle, _guard) = self.lock_by_plate(plate).await?;
        self.ensure_unpinned(&vehicle, now).await?;

        vehicle.capacity = capacity;
        vehicle.vehicle_type = vehicle_type.trim().to_string();
        vehicle.validate()?;

        let saved = self.repos.vehicles().update(vehicle).await?;
        info!(vehicle_id = saved.id, capacity = saved.capacity, "Vehicle updated");
        Ok(saved)
    }

    pub async fn remove(&self, plate: &str) -> DomainResult<()> {
        let now = self.clock.now();
        let (vehicle, _guard) = self.lock_by_plate(plate).await?;
        self.ensure_unpinned(&vehicle, now).await?;

        self.repos.vehicles().delete(vehicle.id).await?;
        info!(vehicle_id = vehicle.id, plate = %vehicle.plate, "Vehicle removed");
        Ok(())
    }

    /// Resolve `plate`, take the vehicle's lock and re-read it under the lock.
    async fn lock_by_plate(&self, plate: &str) -> DomainResult<(Vehicle, ScheduleGuard)> {
        let plate = plate.trim();
        let found = self
            .repos
            .vehicles()
            .find_by_plate(plate)
            .await?
            .ok_or_else(|| DomainError::not_found("Vehicle", "plate", plate))?;

        let guard = self.locks.vehicle(found.id).await;
        let vehicle = self
            .repos
            .vehicles()
            .find_by_id(found.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Vehicle", "plate", plate))?;
        Ok((vehicle, guard))
    }

    async fn ensure_unpinned(&self, vehicle: &Vehicle, now: DateTime<Utc>) -> DomainResult<()> {
        if self
            .repos
            .trips()
            .has_departures_from(vehicle.id, now)
            .await?
        {
            return Err(DomainError::Locked(format!(
                "Vehicle {} has upcoming trips",
                vehicle.plate
            )));
        }
        Ok(())
    }
}
