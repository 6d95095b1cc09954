//! Reservation repository interface

use async_trait::async_trait;

use super::model::Reservation;
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a new reservation. A second row for the same (trip, customer)
    /// pair is a `Conflict`.
    async fn save(&self, reservation: Reservation) -> DomainResult<Reservation>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>>;

    async fn find_all(&self) -> DomainResult<Vec<Reservation>>;

    async fn find_by_customer(&self, customer_id: i32) -> DomainResult<Vec<Reservation>>;

    async fn find_by_trip_and_customer(
        &self,
        trip_id: i32,
        customer_id: i32,
    ) -> DomainResult<Option<Reservation>>;

    async fn update(&self, reservation: Reservation) -> DomainResult<Reservation>;

    /// Reservations on `trip_id` that still hold a seat (not cancelled).
    async fn count_for_trip(&self, trip_id: i32) -> DomainResult<u64>;

    /// Whether `trip_id` has a reservation in a non-terminal state.
    async fn has_active_for_trip(&self, trip_id: i32) -> DomainResult<bool>;

    async fn exists_for_customer(&self, customer_id: i32) -> DomainResult<bool>;
}
