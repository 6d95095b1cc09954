//! Trip scheduling
//!
//! Owns the temporal invariants of the fleet: no two trips on one vehicle
//! share any instant of their closed `[departure, arrival]` windows, and a
//! trip stops being editable once it has departed or, for its route, once
//! customers hold active reservations on it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::{
    DomainError, DomainResult, RepositoryProvider, TimeWindow, Trip, TripChanges, TripView,
};
use crate::shared::{LockKey, ScheduleGuard, ScheduleLocks, SharedClock};

pub struct TripScheduler {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    locks: Arc<ScheduleLocks>,
}

impl TripScheduler {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        locks: Arc<ScheduleLocks>,
    ) -> Self {
        Self { repos, clock, locks }
    }

    /// Create a trip on `vehicle_id`.
    ///
    /// Field checks run first (departure, window, route, price), then the
    /// vehicle must exist and be free for the whole window.
    pub async fn schedule(
        &self,
        vehicle_id: i32,
        origin: &str,
        destination: &str,
        departure_at: DateTime<Utc>,
        arrival_at: DateTime<Utc>,
        price: Decimal,
    ) -> DomainResult<Trip> {
        let now = self.clock.now();
        let trip = Trip::new(
            vehicle_id,
            origin,
            destination,
            departure_at,
            arrival_at,
            price,
            now,
        )?;

        let _guard = self.locks.vehicle(vehicle_id).await;

        if self.repos.vehicles().find_by_id(vehicle_id).await?.is_none() {
            return Err(DomainError::not_found("Vehicle", "id", vehicle_id));
        }
        if self
            .repos
            .trips()
            .exists_overlap(vehicle_id, trip.window(), None)
            .await?
        {
            return Err(DomainError::conflict(format!(
                "Vehicle {} already has a trip overlapping {} - {}",
                vehicle_id, departure_at, arrival_at
            )));
        }

        let saved = self.repos.trips().save(trip).await?;
        metrics::counter!("trips_scheduled_total").increment(1);
        info!(
            trip_id = saved.id,
            vehicle_id,
            origin = %saved.origin,
            destination = %saved.destination,
            departure = %saved.departure_at,
            "Trip scheduled"
        );
        Ok(saved)
    }

    pub async fn get(&self, trip_id: i32) -> DomainResult<Option<TripView>> {
        match self.repos.trips().find_by_id(trip_id).await? {
            Some(trip) => Ok(Some(self.view(trip).await?)),
            None => Ok(None),
        }
    }

    pub async fn list(&self) -> DomainResult<Vec<TripView>> {
        let trips = self.repos.trips().find_all().await?;
        let mut views = Vec::with_capacity(trips.len());
        for trip in trips {
            views.push(self.view(trip).await?);
        }
        Ok(views)
    }

    /// Merge `changes` onto trip `trip_id`.
    pub async fn update(&self, trip_id: i32, changes: TripChanges) -> DomainResult<Trip> {
        let now = self.clock.now();
        let (current, _guard) = self.lock_trip(trip_id, changes.vehicle_id).await?;

        if let Some(departure) = changes.departure_at {
            if departure < now {
                return Err(DomainError::invalid("departure cannot be in the past"));
            }
        }
        let updated = current.merged(&changes, now);
        updated.validate_shape()?;

        if current.has_departed(now) {
            return Err(DomainError::conflict(format!(
                "Trip {} has already departed",
                trip_id
            )));
        }

        let reservations = self.repos.reservations();
        if !updated.same_route(&current) && reservations.has_active_for_trip(trip_id).await? {
            return Err(DomainError::conflict(format!(
                "Trip {} has active reservations; its route cannot change",
                trip_id
            )));
        }

        let vehicle_changed = updated.vehicle_id != current.vehicle_id;
        if vehicle_changed {
            let vehicle = self
                .repos
                .vehicles()
                .find_by_id(updated.vehicle_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Vehicle", "id", updated.vehicle_id))?;
            let reserved = reservations.count_for_trip(trip_id).await?;
            if (vehicle.capacity as u64) < reserved {
                return Err(DomainError::conflict(format!(
                    "Vehicle {} seats {} but trip {} holds {} reservations",
                    vehicle.plate, vehicle.capacity, trip_id, reserved
                )));
            }
        }

        if vehicle_changed || updated.window() != current.window() {
            if self
                .repos
                .trips()
                .exists_overlap(updated.vehicle_id, updated.window(), Some(trip_id))
                .await?
            {
                return Err(DomainError::conflict(format!(
                    "Vehicle {} already has a trip overlapping {} - {}",
                    updated.vehicle_id, updated.departure_at, updated.arrival_at
                )));
            }
        }

        let saved = self.repos.trips().update(updated).await?;
        info!(trip_id, vehicle_id = saved.vehicle_id, "Trip updated");
        Ok(saved)
    }

    /// Remove a trip that has not departed and holds no active reservations.
    pub async fn cancel(&self, trip_id: i32) -> DomainResult<()> {
        let now = self.clock.now();
        let (trip, _guard) = self.lock_trip(trip_id, None).await?;

        if trip.has_departed(now) {
            return Err(DomainError::conflict(format!(
                "Trip {} has already departed",
                trip_id
            )));
        }
        if self.repos.reservations().has_active_for_trip(trip_id).await? {
            return Err(DomainError::conflict(format!(
                "Trip {} has active reservations",
                trip_id
            )));
        }

        self.repos.trips().delete(trip_id).await?;
        info!(trip_id, vehicle_id = trip.vehicle_id, "Trip cancelled");
        Ok(())
    }

    pub async fn has_active_reservations(&self, trip_id: i32) -> DomainResult<bool> {
        self.repos.reservations().has_active_for_trip(trip_id).await
    }

    pub async fn reservation_count(&self, trip_id: i32) -> DomainResult<u64> {
        self.repos.reservations().count_for_trip(trip_id).await
    }

    pub async fn exists_overlap(
        &self,
        vehicle_id: i32,
        departure_at: DateTime<Utc>,
        arrival_at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        self.repos
            .trips()
            .exists_overlap(vehicle_id, TimeWindow::new(departure_at, arrival_at), None)
            .await
    }

    /// Vehicle capacity minus seats held by non-cancelled reservations.
    pub async fn available_seats(&self, trip_id: i32) -> DomainResult<i64> {
        let trip = self
            .repos
            .trips()
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Trip", "id", trip_id))?;
        Ok(self.view(trip).await?.available_seats())
    }

    async fn view(&self, trip: Trip) -> DomainResult<TripView> {
        let capacity = self
            .repos
            .vehicles()
            .find_by_id(trip.vehicle_id)
            .await?
            .map(|v| v.capacity)
            .ok_or_else(|| DomainError::not_found("Vehicle", "id", trip.vehicle_id))?;
        let reserved = self.repos.reservations().count_for_trip(trip.id).await?;
        Ok(TripView {
            trip,
            capacity,
            reserved,
        })
    }

    /// Lock the trip together with its current vehicle (and `target_vehicle`
    /// when given). The vehicle can move while we wait for the locks, in
    /// which case the guard is released and the keys recomputed.
    async fn lock_trip(
        &self,
        trip_id: i32,
        target_vehicle: Option<i32>,
    ) -> DomainResult<(Trip, ScheduleGuard)> {
        loop {
            let seen = self
                .repos
                .trips()
                .find_by_id(trip_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Trip", "id", trip_id))?;

            let mut keys = vec![LockKey::Vehicle(seen.vehicle_id), LockKey::Trip(trip_id)];
            if let Some(target) = target_vehicle {
                keys.push(LockKey::Vehicle(target));
            }
            let guard = self.locks.acquire(keys).await;

            let current = self
                .repos
                .trips()
                .find_by_id(trip_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Trip", "id", trip_id))?;
            if current.vehicle_id == seen.vehicle_id {
                return Ok((current, guard));
            }
            debug!(trip_id, "Trip moved to another vehicle while locking; retrying");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use rust_decimal::Decimal;
    use tokio::task::JoinSet;

    use super::super::testing::Harness;
    use crate::domain::{DomainError, ReservationStatus, TripChanges};

    #[tokio::test]
    async fn schedule_rejects_missing_vehicle() {
        let h = Harness::new();
        let err = h.schedule(42, 2, 1).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Vehicle", .. }));
    }

    #[tokio::test]
    async fn field_checks_run_before_vehicle_lookup() {
        let h = Harness::new();
        let err = h
            .trips
            .schedule(
                42,
                "Cali",
                "Pasto",
                h.at(-1),
                h.at(1),
                Decimal::ZERO,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn scheduling_fails_iff_windows_intersect() {
        let h = Harness::new();
        let v = h.vehicles.register("ABC123", 2, "van").await.unwrap();
        // 10:00 - 12:00 relative to the harness base
        h.schedule(v.id, 2, 2).await.unwrap();

        let cases = [
            (3, 2, true),  // 11:00 - 13:00
            (4, 1, true),  // 12:00 - 13:00, touches
            (0, 2, true),  // 08:00 - 10:00, touches
            (5, 1, false), // 13:00 - 14:00
        ];
        for (start, len, conflicts) in cases {
            let overlap = h
                .trips
                .exists_overlap(v.id, h.at(start), h.at(start + len))
                .await
                .unwrap();
            assert_eq!(overlap, conflicts, "start={}", start);
        }

        let err = h.schedule(v.id, 3, 2).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        h.schedule(v.id, 5, 1).await.unwrap();
    }

    #[tokio::test]
    async fn other_vehicles_do_not_conflict() {
        let h = Harness::new();
        let a = h.vehicles.register("AAA111", 2, "van").await.unwrap();
        let b = h.vehicles.register("BBB222", 2, "van").await.unwrap();
        h.schedule(a.id, 2, 2).await.unwrap();
        h.schedule(b.id, 2, 2).await.unwrap();
    }

    #[tokio::test]
    async fn view_reports_available_seats() {
        let h = Harness::new();
        let v = h.vehicles.register("ABC123", 2, "van").await.unwrap();
        let trip = h.schedule(v.id, 2, 2).await.unwrap();
        let c = h.customers.register("C1", "Ana", None, None).await.unwrap();
        h.reservations.book(trip.id, c.id).await.unwrap();

        let view = h.trips.get(trip.id).await.unwrap().unwrap();
        assert_eq!(view.capacity, 2);
        assert_eq!(view.available_seats(), 1);
        assert_eq!(h.trips.available_seats(trip.id).await.unwrap(), 1);
        assert_eq!(h.trips.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_excludes_the_trip_itself_from_overlap() {
        let h = Harness::new();
        let v = h.vehicles.register("ABC123", 2, "van").await.unwrap();
        let trip = h.schedule(v.id, 2, 2).await.unwrap();

        let moved = h
            .trips
            .update(
                trip.id,
                TripChanges {
                    arrival_at: Some(h.at(5)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.arrival_at, h.at(5));
    }

    #[tokio::test]
    async fn update_into_another_window_conflicts() {
        let h = Harness::new();
        let v = h.vehicles.register("ABC123", 2, "van").await.unwrap();
        h.schedule(v.id, 2, 2).await.unwrap();
        let later = h.schedule(v.id, 6, 2).await.unwrap();

        let err = h
            .trips
            .update(
                later.id,
                TripChanges {
                    departure_at: Some(h.at(4)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn route_is_frozen_while_reservations_are_active() {
        let h = Harness::new();
        let v = h.vehicles.register("ABC123", 2, "van").await.unwrap();
        let trip = h.schedule(v.id, 2, 2).await.unwrap();
        let c = h.customers.register("C1", "Ana", None, None).await.unwrap();
        let r = h.reservations.book(trip.id, c.id).await.unwrap();

        let change_route = TripChanges {
            destination: Some("Medellín".into()),
            ..Default::default()
        };
        let err = h.trips.update(trip.id, change_route.clone()).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // Recasing rewrites the stored route; resending it unchanged does not.
        let recased = TripChanges {
            origin: Some(trip.origin.to_uppercase()),
            ..Default::default()
        };
        let err = h.trips.update(trip.id, recased).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        let unchanged = TripChanges {
            origin: Some(trip.origin.clone()),
            ..Default::default()
        };
        h.trips.update(trip.id, unchanged).await.unwrap();

        assert!(h.trips.has_active_reservations(trip.id).await.unwrap());
        h.reservations.cancel(r.id).await.unwrap();
        assert!(!h.trips.has_active_reservations(trip.id).await.unwrap());
        h.trips.update(trip.id, change_route).await.unwrap();
    }

    #[tokio::test]
    async fn moving_to_a_smaller_vehicle_checks_reservations() {
        let h = Harness::new();
        let big = h.vehicles.register("BIG1", 3, "bus").await.unwrap();
        let small = h.vehicles.register("SML1", 1, "car").await.unwrap();
        let trip = h.schedule(big.id, 2, 2).await.unwrap();
        for ident in ["C1", "C2"] {
            let c = h.customers.register(ident, "x", None, None).await.unwrap();
            h.reservations.book(trip.id, c.id).await.unwrap();
        }

        let err = h
            .trips
            .update(
                trip.id,
                TripChanges {
                    vehicle_id: Some(small.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let err = h
            .trips
            .update(
                trip.id,
                TripChanges {
                    vehicle_id: Some(999),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Vehicle", .. }));
    }

    #[tokio::test]
    async fn departed_trip_is_immutable() {
        let h = Harness::new();
        let v = h.vehicles.register("ABC123", 2, "van").await.unwrap();
        let trip = h.schedule(v.id, 1, 2).await.unwrap();
        h.clock.advance(Duration::hours(2));

        let err = h
            .trips
            .update(
                trip.id,
                TripChanges {
                    price: Some(Decimal::new(100, 0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        let err = h.trips.cancel(trip.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn past_departure_in_update_is_invalid_before_departed_check() {
        let h = Harness::new();
        let v = h.vehicles.register("ABC123", 2, "van").await.unwrap();
        let trip = h.schedule(v.id, 1, 2).await.unwrap();
        h.clock.advance(Duration::hours(2));
        let err = h
            .trips
            .update(
                trip.id,
                TripChanges {
                    departure_at: Some(h.at(0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn cancel_requires_no_active_reservations() {
        let h = Harness::new();
        let v = h.vehicles.register("ABC123", 2, "van").await.unwrap();
        let trip = h.schedule(v.id, 2, 2).await.unwrap();
        let c = h.customers.register("C1", "Ana", None, None).await.unwrap();
        let r = h.reservations.book(trip.id, c.id).await.unwrap();

        let err = h.trips.cancel(trip.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let cancelled = h.reservations.cancel(r.id).await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        h.trips.cancel(trip.id).await.unwrap();
        assert!(h.trips.get(trip.id).await.unwrap().is_none());
        let err = h.trips.cancel(trip.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_overlapping_schedules_admit_one() {
        let h = Arc::new(Harness::new());
        let vehicle_id = h.vehicles.register("ABC123", 2, "van").await.unwrap().id;

        let mut set = JoinSet::new();
        for offset in 0..8 {
            let h = Arc::clone(&h);
            // Every window covers 11:00 on the first day.
            set.spawn(async move { h.schedule(vehicle_id, 2 + (offset % 2), 2).await });
        }

        let mut ok = 0;
        while let Some(joined) = set.join_next().await {
            match joined.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert!(matches!(e, DomainError::Conflict(_))),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(h.trips.list().await.unwrap().len(), 1);
    }
}
