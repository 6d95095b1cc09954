//! In-memory repository provider for development and testing
//!
//! Mirrors the relational constraints of the SQLite schema: unique plate,
//! unique identification, unique (trip, customer) pair, restrict on
//! vehicle/customer deletion while referenced, cascade from trips to their
//! reservations. Writes that check a reference and then act on it run under
//! one store-wide lock, so a delete never interleaves with an insert that
//! points at the row being deleted.

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::{
    Customer, CustomerRepository, DomainError, DomainResult, RepositoryProvider, Reservation,
    ReservationRepository, TimeWindow, Trip, TripRepository, Vehicle, VehicleRepository,
};

pub struct InMemoryRepositoryProvider {
    vehicles: DashMap<i32, Vehicle>,
    plates: DashMap<String, i32>,
    trips: DashMap<i32, Trip>,
    customers: DashMap<i32, Customer>,
    identifications: DashMap<String, i32>,
    reservations: DashMap<i32, Reservation>,
    pairs: DashMap<(i32, i32), i32>,
    vehicle_counter: AtomicI32,
    trip_counter: AtomicI32,
    customer_counter: AtomicI32,
    reservation_counter: AtomicI32,
    references: Mutex<()>,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            vehicles: DashMap::new(),
            plates: DashMap::new(),
            trips: DashMap::new(),
            customers: DashMap::new(),
            identifications: DashMap::new(),
            reservations: DashMap::new(),
            pairs: DashMap::new(),
            vehicle_counter: AtomicI32::new(1),
            trip_counter: AtomicI32::new(1),
            customer_counter: AtomicI32::new(1),
            reservation_counter: AtomicI32::new(1),
            references: Mutex::new(()),
        }
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn vehicles(&self) -> &dyn VehicleRepository {
        self
    }

    fn trips(&self) -> &dyn TripRepository {
        self
    }

    fn customers(&self) -> &dyn CustomerRepository {
        self
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        self
    }
}

fn sorted_by_id<T: Clone, F: Fn(&T) -> i32>(map: &DashMap<i32, T>, id: F) -> Vec<T> {
    let mut rows: Vec<T> = map.iter().map(|e| e.value().clone()).collect();
    rows.sort_by_key(|row| id(row));
    rows
}

// ── Vehicles ───────────────────────────────────────────────────

#[async_trait]
impl VehicleRepository for InMemoryRepositoryProvider {
    async fn save(&self, mut vehicle: Vehicle) -> DomainResult<Vehicle> {
        match self.plates.entry(vehicle.plate.clone()) {
            Entry::Occupied(_) => Err(DomainError::conflict(format!(
                "Vehicle with plate {} already exists",
                vehicle.plate
            ))),
            Entry::Vacant(slot) => {
                vehicle.id = self.vehicle_counter.fetch_add(1, Ordering::SeqCst);
                slot.insert(vehicle.id);
                self.vehicles.insert(vehicle.id, vehicle.clone());
                Ok(vehicle)
            }
        }
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Vehicle>> {
        Ok(self.vehicles.get(&id).map(|v| v.clone()))
    }

    async fn find_by_plate(&self, plate: &str) -> DomainResult<Option<Vehicle>> {
        let id = match self.plates.get(plate) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.vehicles.get(&id).map(|v| v.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Vehicle>> {
        Ok(sorted_by_id(&self.vehicles, |v: &Vehicle| v.id))
    }

    async fn update(&self, vehicle: Vehicle) -> DomainResult<Vehicle> {
        let previous_plate = match self.vehicles.get(&vehicle.id) {
            Some(existing) => existing.plate.clone(),
            None => return Err(DomainError::not_found("Vehicle", "id", vehicle.id)),
        };
        if previous_plate != vehicle.plate {
            match self.plates.entry(vehicle.plate.clone()) {
                Entry::Occupied(_) => {
                    return Err(DomainError::conflict(format!(
                        "Vehicle with plate {} already exists",
                        vehicle.plate
                    )))
                }
                Entry::Vacant(slot) => {
                    slot.insert(vehicle.id);
                }
            }
            self.plates.remove(&previous_plate);
        }
        self.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let _refs = self.references.lock().await;
        if self.trips.iter().any(|t| t.vehicle_id == id) {
            return Err(DomainError::conflict(format!(
                "Vehicle {} is still referenced by trips",
                id
            )));
        }
        let (_, vehicle) = self
            .vehicles
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("Vehicle", "id", id))?;
        self.plates.remove(&vehicle.plate);
        Ok(())
    }
}

// ── Trips ──────────────────────────────────────────────────────

#[async_trait]
impl TripRepository for InMemoryRepositoryProvider {
    async fn save(&self, mut trip: Trip) -> DomainResult<Trip> {
        let _refs = self.references.lock().await;
        if !self.vehicles.contains_key(&trip.vehicle_id) {
            return Err(DomainError::not_found("Vehicle", "id", trip.vehicle_id));
        }
        trip.id = self.trip_counter.fetch_add(1, Ordering::SeqCst);
        self.trips.insert(trip.id, trip.clone());
        Ok(trip)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Trip>> {
        Ok(self.trips.get(&id).map(|t| t.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Trip>> {
        Ok(sorted_by_id(&self.trips, |t: &Trip| t.id))
    }

    async fn update(&self, trip: Trip) -> DomainResult<Trip> {
        let _refs = self.references.lock().await;
        if !self.vehicles.contains_key(&trip.vehicle_id) {
            return Err(DomainError::not_found("Vehicle", "id", trip.vehicle_id));
        }
        match self.trips.get_mut(&trip.id) {
            Some(mut slot) => {
                *slot = trip.clone();
                Ok(trip)
            }
            None => Err(DomainError::not_found("Trip", "id", trip.id)),
        }
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let _refs = self.references.lock().await;
        self.trips
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("Trip", "id", id))?;
        self.reservations.retain(|_, r| {
            if r.trip_id == id {
                self.pairs.remove(&(r.trip_id, r.customer_id));
                false
            } else {
                true
            }
        });
        Ok(())
    }

    async fn exists_overlap(
        &self,
        vehicle_id: i32,
        window: TimeWindow,
        exclude_trip: Option<i32>,
    ) -> DomainResult<bool> {
        Ok(self.trips.iter().any(|t| {
            t.vehicle_id == vehicle_id
                && Some(t.id) != exclude_trip
                && t.window().overlaps(&window)
        }))
    }

    async fn has_departures_from(
        &self,
        vehicle_id: i32,
        instant: DateTime<Utc>,
    ) -> DomainResult<bool> {
        Ok(self
            .trips
            .iter()
            .any(|t| t.vehicle_id == vehicle_id && t.departure_at >= instant))
    }
}

// ── Customers ──────────────────────────────────────────────────

#[async_trait]
impl CustomerRepository for InMemoryRepositoryProvider {
    async fn save(&self, mut customer: Customer) -> DomainResult<Customer> {
        match self.identifications.entry(customer.identification.clone()) {
            Entry::Occupied(_) => Err(DomainError::conflict(format!(
                "Customer with identification {} already exists",
                customer.identification
            ))),
            Entry::Vacant(slot) => {
                customer.id = self.customer_counter.fetch_add(1, Ordering::SeqCst);
                slot.insert(customer.id);
                self.customers.insert(customer.id, customer.clone());
                Ok(customer)
            }
        }
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Customer>> {
        Ok(self.customers.get(&id).map(|c| c.clone()))
    }

    async fn find_by_identification(&self, identification: &str) -> DomainResult<Option<Customer>> {
        let id = match self.identifications.get(identification) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.customers.get(&id).map(|c| c.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Customer>> {
        Ok(sorted_by_id(&self.customers, |c: &Customer| c.id))
    }

    async fn update(&self, customer: Customer) -> DomainResult<Customer> {
        match self.customers.get_mut(&customer.id) {
            Some(mut slot) => {
                if slot.identification != customer.identification {
                    return Err(DomainError::invalid("identification cannot change"));
                }
                *slot = customer.clone();
                Ok(customer)
            }
            None => Err(DomainError::not_found("Customer", "id", customer.id)),
        }
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let _refs = self.references.lock().await;
        if self.reservations.iter().any(|r| r.customer_id == id) {
            return Err(DomainError::conflict(format!(
                "Customer {} is still referenced by reservations",
                id
            )));
        }
        let (_, customer) = self
            .customers
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("Customer", "id", id))?;
        self.identifications.remove(&customer.identification);
        Ok(())
    }
}

// ── Reservations ───────────────────────────────────────────────

#[async_trait]
impl ReservationRepository for InMemoryRepositoryProvider {
    async fn save(&self, mut reservation: Reservation) -> DomainResult<Reservation> {
        let _refs = self.references.lock().await;
        if !self.trips.contains_key(&reservation.trip_id) {
            return Err(DomainError::not_found("Trip", "id", reservation.trip_id));
        }
        if !self.customers.contains_key(&reservation.customer_id) {
            return Err(DomainError::not_found(
                "Customer",
                "id",
                reservation.customer_id,
            ));
        }
        match self
            .pairs
            .entry((reservation.trip_id, reservation.customer_id))
        {
            Entry::Occupied(_) => Err(DomainError::conflict(format!(
                "Customer {} already holds a reservation on trip {}",
                reservation.customer_id, reservation.trip_id
            ))),
            Entry::Vacant(slot) => {
                reservation.id = self.reservation_counter.fetch_add(1, Ordering::SeqCst);
                slot.insert(reservation.id);
                self.reservations.insert(reservation.id, reservation.clone());
                Ok(reservation)
            }
        }
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(&id).map(|r| r.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Reservation>> {
        Ok(sorted_by_id(&self.reservations, |r: &Reservation| r.id))
    }

    async fn find_by_customer(&self, customer_id: i32) -> DomainResult<Vec<Reservation>> {
        let mut rows: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| r.customer_id == customer_id)
            .map(|r| r.clone())
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn find_by_trip_and_customer(
        &self,
        trip_id: i32,
        customer_id: i32,
    ) -> DomainResult<Option<Reservation>> {
        let id = match self.pairs.get(&(trip_id, customer_id)) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.reservations.get(&id).map(|r| r.clone()))
    }

    async fn update(&self, reservation: Reservation) -> DomainResult<Reservation> {
        match self.reservations.get_mut(&reservation.id) {
            Some(mut slot) => {
                slot.status = reservation.status;
                slot.updated_at = reservation.updated_at;
                Ok(slot.clone())
            }
            None => Err(DomainError::not_found("Reservation", "id", reservation.id)),
        }
    }

    async fn count_for_trip(&self, trip_id: i32) -> DomainResult<u64> {
        Ok(self
            .reservations
            .iter()
            .filter(|r| r.trip_id == trip_id && r.status.counts_toward_capacity())
            .count() as u64)
    }

    async fn has_active_for_trip(&self, trip_id: i32) -> DomainResult<bool> {
        Ok(self
            .reservations
            .iter()
            .any(|r| r.trip_id == trip_id && r.status.is_active()))
    }

    async fn exists_for_customer(&self, customer_id: i32) -> DomainResult<bool> {
        Ok(self.reservations.iter().any(|r| r.customer_id == customer_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReservationStatus;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap()
    }

    async fn seeded() -> (InMemoryRepositoryProvider, Vehicle, Trip, Customer) {
        let repos = InMemoryRepositoryProvider::new();
        let vehicle = repos
            .vehicles()
            .save(Vehicle::new("ABC123", 2, "van", base()).unwrap())
            .await
            .unwrap();
        let trip = Trip::new(
            vehicle.id,
            "Cali",
            "Pasto",
            base() + Duration::hours(2),
            base() + Duration::hours(4),
            Decimal::new(5000, 2),
            base(),
        )
        .unwrap();
        let trip = repos.trips().save(trip).await.unwrap();
        let customer = repos
            .customers()
            .save(Customer::new("C1", "Ana", None, None, base()).unwrap())
            .await
            .unwrap();
        (repos, vehicle, trip, customer)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn customer_delete_and_booking_never_both_succeed() {
        let (repos, _, trip, _) = seeded().await;
        let repos = std::sync::Arc::new(repos);
        let trip_id = trip.id;

        for round in 0..100 {
            let customer_id = repos
                .customers()
                .save(Customer::new(format!("R{round}"), "x", None, None, base()).unwrap())
                .await
                .unwrap()
                .id;
            let deleting = {
                let repos = repos.clone();
                tokio::spawn(async move { repos.customers().delete(customer_id).await })
            };
            let booking = {
                let repos = repos.clone();
                tokio::spawn(async move {
                    repos
                        .reservations()
                        .save(Reservation::new(trip_id, customer_id, base()))
                        .await
                })
            };
            let deleted = deleting.await.unwrap().is_ok();
            let booked = booking.await.unwrap().is_ok();
            assert!(deleted != booked, "round {round}: deleted={deleted} booked={booked}");
        }

        for reservation in repos.reservations().find_all().await.unwrap() {
            assert!(repos
                .customers()
                .find_by_id(reservation.customer_id)
                .await
                .unwrap()
                .is_some());
        }
    }

    #[tokio::test]
    async fn duplicate_plate_conflicts() {
        let (repos, _, _, _) = seeded().await;
        let err = repos
            .vehicles()
            .save(Vehicle::new("ABC123", 4, "bus", base()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_pair_conflicts_even_when_cancelled() {
        let (repos, _, trip, customer) = seeded().await;
        let mut first = repos
            .reservations()
            .save(Reservation::new(trip.id, customer.id, base()))
            .await
            .unwrap();
        first.status = ReservationStatus::Cancelled;
        repos.reservations().update(first).await.unwrap();

        let err = repos
            .reservations()
            .save(Reservation::new(trip.id, customer.id, base()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(repos.reservations().count_for_trip(trip.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn overlap_query_excludes_given_trip() {
        let (repos, vehicle, trip, _) = seeded().await;
        let window = trip.window();
        assert!(repos
            .trips()
            .exists_overlap(vehicle.id, window, None)
            .await
            .unwrap());
        assert!(!repos
            .trips()
            .exists_overlap(vehicle.id, window, Some(trip.id))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn trip_delete_cascades_reservations() {
        let (repos, _, trip, customer) = seeded().await;
        repos
            .reservations()
            .save(Reservation::new(trip.id, customer.id, base()))
            .await
            .unwrap();
        repos.trips().delete(trip.id).await.unwrap();
        assert!(repos.reservations().find_all().await.unwrap().is_empty());
        assert!(!repos.reservations().exists_for_customer(customer.id).await.unwrap());
    }

    #[tokio::test]
    async fn referenced_rows_cannot_be_deleted() {
        let (repos, vehicle, trip, customer) = seeded().await;
        repos
            .reservations()
            .save(Reservation::new(trip.id, customer.id, base()))
            .await
            .unwrap();
        assert!(repos.vehicles().delete(vehicle.id).await.is_err());
        assert!(repos.customers().delete(customer.id).await.is_err());
    }
}
