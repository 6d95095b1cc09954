//! Trip repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{TimeWindow, Trip};
use crate::domain::DomainResult;

#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn save(&self, trip: Trip) -> DomainResult<Trip>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Trip>>;

    async fn find_all(&self) -> DomainResult<Vec<Trip>>;

    async fn update(&self, trip: Trip) -> DomainResult<Trip>;

    async fn delete(&self, id: i32) -> DomainResult<()>;

    /// Whether any trip on `vehicle_id` (other than `exclude_trip`) intersects
    /// `window` under closed-interval comparison.
    async fn exists_overlap(
        &self,
        vehicle_id: i32,
        window: TimeWindow,
        exclude_trip: Option<i32>,
    ) -> DomainResult<bool>;

    /// Whether `vehicle_id` has a trip departing at or after `instant`, i.e. one
    /// that can still take bookings.
    async fn has_departures_from(
        &self,
        vehicle_id: i32,
        instant: DateTime<Utc>,
    ) -> DomainResult<bool>;
}
