//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::customer::CustomerRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;
use crate::domain::trip::TripRepository;
use crate::domain::vehicle::VehicleRepository;

use super::customer_repository::SeaOrmCustomerRepository;
use super::reservation_repository::SeaOrmReservationRepository;
use super::trip_repository::SeaOrmTripRepository;
use super::vehicle_repository::SeaOrmVehicleRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let trip = repos.trips().find_by_id(7).await?;
/// let held = repos.reservations().count_for_trip(7).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    vehicles: SeaOrmVehicleRepository,
    trips: SeaOrmTripRepository,
    customers: SeaOrmCustomerRepository,
    reservations: SeaOrmReservationRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            vehicles: SeaOrmVehicleRepository::new(db.clone()),
            trips: SeaOrmTripRepository::new(db.clone()),
            customers: SeaOrmCustomerRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn vehicles(&self) -> &dyn VehicleRepository {
        &self.vehicles
    }

    fn trips(&self) -> &dyn TripRepository {
        &self.trips
    }

    fn customers(&self) -> &dyn CustomerRepository {
        &self.customers
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::domain::{Customer, DomainError, Reservation, ReservationStatus, Trip, Vehicle};
    use crate::infrastructure::database::{init_database, migrator::Migrator, DatabaseConfig};

    async fn provider() -> SeaOrmRepositoryProvider {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SeaOrmRepositoryProvider::new(db)
    }

    #[tokio::test]
    async fn sqlite_round_trip_and_constraints() {
        let repos = provider().await;
        let now = Utc.with_ymd_and_hms(2030, 3, 1, 6, 0, 0).unwrap();

        let vehicle = repos
            .vehicles()
            .save(Vehicle::new("ABC123", 2, "van", now).unwrap())
            .await
            .unwrap();
        assert!(vehicle.id > 0);
        let dup = repos
            .vehicles()
            .save(Vehicle::new("ABC123", 9, "bus", now).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(dup, DomainError::Conflict(_)));

        let trip = Trip::new(
            vehicle.id,
            "Cali",
            "Pasto",
            now + Duration::hours(4),
            now + Duration::hours(6),
            Decimal::new(12050, 2),
            now,
        )
        .unwrap();
        let trip = repos.trips().save(trip).await.unwrap();
        let loaded = repos.trips().find_by_id(trip.id).await.unwrap().unwrap();
        assert_eq!(loaded.price, Decimal::new(12050, 2));
        assert_eq!(loaded.departure_at, trip.departure_at);

        // Touching windows overlap; the trip never overlaps itself.
        let touching = crate::domain::TimeWindow::new(trip.arrival_at, trip.arrival_at + Duration::hours(1));
        assert!(repos.trips().exists_overlap(vehicle.id, touching, None).await.unwrap());
        assert!(!repos
            .trips()
            .exists_overlap(vehicle.id, trip.window(), Some(trip.id))
            .await
            .unwrap());
        assert!(repos.trips().has_departures_from(vehicle.id, now).await.unwrap());
        assert!(repos
            .trips()
            .has_departures_from(vehicle.id, trip.departure_at)
            .await
            .unwrap());
        assert!(!repos
            .trips()
            .has_departures_from(vehicle.id, trip.departure_at + Duration::seconds(1))
            .await
            .unwrap());

        let customer = repos
            .customers()
            .save(Customer::new("C1", "Ana", None, None, now).unwrap())
            .await
            .unwrap();
        let mut r = repos
            .reservations()
            .save(Reservation::new(trip.id, customer.id, now))
            .await
            .unwrap();
        assert_eq!(r.status, ReservationStatus::Pending);
        assert_eq!(repos.reservations().count_for_trip(trip.id).await.unwrap(), 1);
        assert!(repos.reservations().has_active_for_trip(trip.id).await.unwrap());

        r.status = ReservationStatus::Cancelled;
        repos.reservations().update(r).await.unwrap();
        assert_eq!(repos.reservations().count_for_trip(trip.id).await.unwrap(), 0);
        assert!(!repos.reservations().has_active_for_trip(trip.id).await.unwrap());

        let dup = repos
            .reservations()
            .save(Reservation::new(trip.id, customer.id, now))
            .await
            .unwrap_err();
        assert!(matches!(dup, DomainError::Conflict(_)));

        // Restrict on customers and vehicles, cascade from trips.
        assert!(repos.customers().delete(customer.id).await.is_err());
        assert!(repos.vehicles().delete(vehicle.id).await.is_err());
        repos.trips().delete(trip.id).await.unwrap();
        assert!(!repos.reservations().exists_for_customer(customer.id).await.unwrap());
        repos.customers().delete(customer.id).await.unwrap();
        repos.vehicles().delete(vehicle.id).await.unwrap();
    }
}
