//! Seat booking and reservation lifecycle
//!
//! Every mutation runs under the trip's lock, so the seat count read before
//! a booking is still true when the reservation is written.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{CustomerDirectory, TripScheduler};
use crate::domain::{
    DomainError, DomainResult, ErrorKind, RepositoryProvider, Reservation, ReservationChanges,
    ReservationStatus, Trip,
};
use crate::shared::{ScheduleGuard, ScheduleLocks, SharedClock};

pub struct ReservationEngine {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    locks: Arc<ScheduleLocks>,
    trips: Arc<TripScheduler>,
    customers: Arc<CustomerDirectory>,
}

impl ReservationEngine {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        locks: Arc<ScheduleLocks>,
        trips: Arc<TripScheduler>,
        customers: Arc<CustomerDirectory>,
    ) -> Self {
        Self {
            repos,
            clock,
            locks,
            trips,
            customers,
        }
    }

    /// Book one seat on `trip_id` for `customer_id`.
    pub async fn book(&self, trip_id: i32, customer_id: i32) -> DomainResult<Reservation> {
        let result = self.try_book(trip_id, customer_id).await;
        metrics::counter!("bookings_total", "outcome" => outcome_label(&result)).increment(1);
        match &result {
            Ok(r) => info!(reservation_id = r.id, trip_id, customer_id, "Seat booked"),
            Err(e) => warn!(trip_id, customer_id, error = %e, "Booking rejected"),
        }
        result
    }

    async fn try_book(&self, trip_id: i32, customer_id: i32) -> DomainResult<Reservation> {
        let now = self.clock.now();
        let _guard = self.locks.trip(trip_id).await;

        if self.customers.get_by_id(customer_id).await?.is_none() {
            return Err(DomainError::not_found("Customer", "id", customer_id));
        }
        let trip = self.require_trip(trip_id).await?;
        if trip.has_departed(now) {
            return Err(DomainError::invalid(format!(
                "Trip {} has already departed",
                trip_id
            )));
        }
        if self.trips.available_seats(trip_id).await? <= 0 {
            return Err(DomainError::conflict(format!(
                "Trip {} has no available seats",
                trip_id
            )));
        }
        if self
            .repos
            .reservations()
            .find_by_trip_and_customer(trip_id, customer_id)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "Customer {} already has a reservation on trip {}",
                customer_id, trip_id
            )));
        }

        self.repos
            .reservations()
            .save(Reservation::new(trip_id, customer_id, now))
            .await
    }

    pub async fn get(&self, id: i32) -> DomainResult<Option<Reservation>> {
        self.repos.reservations().find_by_id(id).await
    }

    pub async fn list(&self) -> DomainResult<Vec<Reservation>> {
        self.repos.reservations().find_all().await
    }

    pub async fn list_by_customer(&self, customer_id: i32) -> DomainResult<Vec<Reservation>> {
        if self.customers.get_by_id(customer_id).await?.is_none() {
            return Err(DomainError::not_found("Customer", "id", customer_id));
        }
        self.repos.reservations().find_by_customer(customer_id).await
    }

    /// Apply caller-editable changes to a reservation whose trip has not departed.
    pub async fn modify(&self, id: i32, changes: ReservationChanges) -> DomainResult<Reservation> {
        let now = self.clock.now();
        let (mut reservation, _guard) = self.lock_reservation(id).await?;
        let trip = self.require_trip(reservation.trip_id).await?;

        if trip.has_departed(now) {
            return Err(DomainError::conflict(format!(
                "Trip {} has already departed; reservation {} cannot change",
                trip.id, id
            )));
        }

        match changes.status {
            None => Ok(reservation),
            Some(ReservationStatus::Cancelled) => self.apply_cancel(reservation, &trip, now).await,
            Some(next) => {
                reservation.transition(next, now)?;
                let saved = self.repos.reservations().update(reservation).await?;
                info!(reservation_id = id, status = %saved.status, "Reservation modified");
                Ok(saved)
            }
        }
    }

    /// Operational state change. No departure guard and no seat check;
    /// the lifecycle edges still apply and `cancelled` goes through [`cancel`](Self::cancel).
    pub async fn set_state(&self, id: i32, next: ReservationStatus) -> DomainResult<Reservation> {
        if next == ReservationStatus::Cancelled {
            return self.cancel(id).await;
        }

        let now = self.clock.now();
        let (mut reservation, _guard) = self.lock_reservation(id).await?;
        let previous = reservation.status;
        reservation.transition(next, now)?;
        let saved = self.repos.reservations().update(reservation).await?;
        info!(reservation_id = id, from = %previous, to = %saved.status, "Reservation state changed");
        Ok(saved)
    }

    /// Release the seat. The record stays, in state `cancelled`.
    pub async fn cancel(&self, id: i32) -> DomainResult<Reservation> {
        let now = self.clock.now();
        let (reservation, _guard) = self.lock_reservation(id).await?;
        let trip = self.require_trip(reservation.trip_id).await?;
        self.apply_cancel(reservation, &trip, now).await
    }

    /// Cancellation rules; the caller holds the trip lock.
    async fn apply_cancel(
        &self,
        mut reservation: Reservation,
        trip: &Trip,
        now: DateTime<Utc>,
    ) -> DomainResult<Reservation> {
        if trip.has_departed(now) {
            return Err(DomainError::invalid(format!(
                "Trip {} has already departed",
                trip.id
            )));
        }
        match reservation.status {
            ReservationStatus::Cancelled => {
                return Err(DomainError::AlreadyCancelled(reservation.id))
            }
            ReservationStatus::Pending | ReservationStatus::Confirmed => {}
            other => {
                return Err(DomainError::invalid(format!(
                    "Reservation {} is {} and can no longer be cancelled",
                    reservation.id, other
                )))
            }
        }

        reservation.transition(ReservationStatus::Cancelled, now)?;
        let saved = self.repos.reservations().update(reservation).await?;
        metrics::counter!("reservations_cancelled_total").increment(1);
        info!(reservation_id = saved.id, trip_id = trip.id, "Reservation cancelled");
        Ok(saved)
    }

    /// Find the reservation, lock its trip and re-read it under the lock.
    async fn lock_reservation(
        &self,
        id: i32,
    ) -> DomainResult<(Reservation, ScheduleGuard)> {
        let seen = self.require_reservation(id).await?;
        let guard = self.locks.trip(seen.trip_id).await;
        let current = self.require_reservation(id).await?;
        Ok((current, guard))
    }

    async fn require_reservation(&self, id: i32) -> DomainResult<Reservation> {
        self.repos
            .reservations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))
    }

    /// Trips are read through the scheduler, never from the trip store directly.
    async fn require_trip(&self, trip_id: i32) -> DomainResult<Trip> {
        self.trips
            .get(trip_id)
            .await?
            .map(|view| view.trip)
            .ok_or_else(|| DomainError::not_found("Trip", "id", trip_id))
    }
}

fn outcome_label(result: &DomainResult<Reservation>) -> &'static str {
    match result {
        Ok(_) => "booked",
        Err(e) => match e.kind() {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidRequest => "invalid",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "error",
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use tokio::task::JoinSet;

    use super::super::testing::Harness;
    use crate::domain::{DomainError, ReservationChanges, ReservationStatus};

    async fn trip_with_customers(h: &Harness, capacity: i32, customers: usize) -> (i32, Vec<i32>) {
        let v = h.vehicles.register("ABC123", capacity, "van").await.unwrap();
        let trip = h.schedule(v.id, 24, 2).await.unwrap();
        let mut ids = Vec::new();
        for n in 0..customers {
            let c = h
                .customers
                .register(&format!("C{}", n + 1), "Passenger", None, None)
                .await
                .unwrap();
            ids.push(c.id);
        }
        (trip.id, ids)
    }

    #[tokio::test]
    async fn booking_starts_pending_and_stamps_creation() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 1).await;
        let r = h.reservations.book(trip, c[0]).await.unwrap();
        assert_eq!(r.status, ReservationStatus::Pending);
        assert_eq!(r.created_at, h.at(0));
        assert_eq!(h.reservations.get(r.id).await.unwrap(), Some(r));
    }

    #[tokio::test]
    async fn customer_is_checked_before_trip() {
        let h = Harness::new();
        let err = h.reservations.book(77, 88).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Customer", .. }));

        let c = h.customers.register("C1", "Ana", None, None).await.unwrap();
        let err = h.reservations.book(77, c.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Trip", .. }));
    }

    #[tokio::test]
    async fn booking_a_departed_trip_is_invalid() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 1).await;
        h.clock.advance(Duration::hours(25));
        let err = h.reservations.book(trip, c[0]).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn capacity_is_never_exceeded() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 3).await;
        h.reservations.book(trip, c[0]).await.unwrap();
        h.reservations.book(trip, c[1]).await.unwrap();
        let err = h.reservations.book(trip, c[2]).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn cancelling_frees_a_seat_but_not_the_pair() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 1, 2).await;
        let r = h.reservations.book(trip, c[0]).await.unwrap();
        h.reservations.cancel(r.id).await.unwrap();

        let err = h.reservations.book(trip, c[0]).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        h.reservations.book(trip, c[1]).await.unwrap();
    }

    #[tokio::test]
    async fn second_cancel_is_reported_distinctly() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 1).await;
        let r = h.reservations.book(trip, c[0]).await.unwrap();
        h.reservations.cancel(r.id).await.unwrap();
        let err = h.reservations.cancel(r.id).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyCancelled(id) if id == r.id));
    }

    #[tokio::test]
    async fn cancel_only_from_pending_or_confirmed() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 2).await;
        let confirmed = h.reservations.book(trip, c[0]).await.unwrap();
        h.reservations
            .set_state(confirmed.id, ReservationStatus::Confirmed)
            .await
            .unwrap();
        h.reservations.cancel(confirmed.id).await.unwrap();

        let boarding = h.reservations.book(trip, c[1]).await.unwrap();
        h.reservations
            .set_state(boarding.id, ReservationStatus::Confirmed)
            .await
            .unwrap();
        h.reservations
            .set_state(boarding.id, ReservationStatus::InProgress)
            .await
            .unwrap();
        let err = h.reservations.cancel(boarding.id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn set_state_enforces_lifecycle() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 1).await;
        let r = h.reservations.book(trip, c[0]).await.unwrap();

        let err = h
            .reservations
            .set_state(r.id, ReservationStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        let err = h
            .reservations
            .set_state(r.id, ReservationStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        for next in [
            ReservationStatus::Confirmed,
            ReservationStatus::InProgress,
            ReservationStatus::Completed,
        ] {
            let r = h.reservations.set_state(r.id, next).await.unwrap();
            assert_eq!(r.status, next);
        }
    }

    #[tokio::test]
    async fn set_state_ignores_departure() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 1).await;
        let r = h.reservations.book(trip, c[0]).await.unwrap();
        h.reservations
            .set_state(r.id, ReservationStatus::Confirmed)
            .await
            .unwrap();
        h.clock.advance(Duration::hours(25));
        let r = h
            .reservations
            .set_state(r.id, ReservationStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(r.status, ReservationStatus::InProgress);
    }

    #[tokio::test]
    async fn set_state_cancelled_uses_cancel_rules() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 1).await;
        let r = h.reservations.book(trip, c[0]).await.unwrap();
        h.clock.advance(Duration::hours(25));
        let err = h
            .reservations
            .set_state(r.id, ReservationStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn modify_after_departure_conflicts() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 1).await;
        let r = h.reservations.book(trip, c[0]).await.unwrap();
        let changes = ReservationChanges {
            status: Some(ReservationStatus::Confirmed),
        };
        let modified = h.reservations.modify(r.id, changes.clone()).await.unwrap();
        assert_eq!(modified.status, ReservationStatus::Confirmed);

        h.clock.advance(Duration::hours(25));
        let err = h.reservations.modify(r.id, changes).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        let err = h.reservations.cancel(r.id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn unknown_reservation_is_not_found() {
        let h = Harness::new();
        assert!(h.reservations.get(5).await.unwrap().is_none());
        let err = h.reservations.cancel(5).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        let err = h
            .reservations
            .modify(5, ReservationChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn cancelled_trip_is_no_longer_bookable() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 1).await;
        h.trips.cancel(trip).await.unwrap();

        let err = h.reservations.book(trip, c[0]).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Trip", .. }));
    }

    #[tokio::test]
    async fn list_by_customer_requires_customer() {
        let h = Harness::new();
        let (trip, c) = trip_with_customers(&h, 2, 2).await;
        h.reservations.book(trip, c[0]).await.unwrap();
        assert_eq!(h.reservations.list_by_customer(c[0]).await.unwrap().len(), 1);
        assert!(h.reservations.list_by_customer(c[1]).await.unwrap().is_empty());
        let err = h.reservations.list_by_customer(999).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_fill_exactly_capacity() {
        let h = Arc::new(Harness::new());
        let (trip, customers) = trip_with_customers(&h, 3, 10).await;

        let mut set = JoinSet::new();
        for customer in customers {
            let h = Arc::clone(&h);
            set.spawn(async move { h.reservations.book(trip, customer).await });
        }

        let mut booked = 0;
        while let Some(joined) = set.join_next().await {
            match joined.unwrap() {
                Ok(_) => booked += 1,
                Err(e) => assert!(matches!(e, DomainError::Conflict(_))),
            }
        }
        assert_eq!(booked, 3);
        assert_eq!(h.trips.available_seats(trip).await.unwrap(), 0);
    }
}
