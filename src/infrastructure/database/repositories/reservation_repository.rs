//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use log::{debug, warn};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::db_err;
use crate::domain::reservation::{Reservation, ReservationRepository, ReservationStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::reservation;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    let status = m.status.parse::<ReservationStatus>().map_err(|_| {
        warn!("Reservation {} has unknown status '{}'", m.id, m.status);
        DomainError::Storage(format!("unknown reservation status '{}'", m.status))
    })?;
    Ok(Reservation {
        id: m.id,
        trip_id: m.trip_id,
        customer_id: m.customer_id,
        status,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn models_to_domain(models: Vec<reservation::Model>) -> DomainResult<Vec<Reservation>> {
    models.into_iter().map(model_to_domain).collect()
}

const ACTIVE_STATUSES: [ReservationStatus; 3] = [
    ReservationStatus::Pending,
    ReservationStatus::Confirmed,
    ReservationStatus::InProgress,
];

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn save(&self, r: Reservation) -> DomainResult<Reservation> {
        debug!(
            "Saving reservation: trip {} customer {}",
            r.trip_id, r.customer_id
        );

        let model = reservation::ActiveModel {
            trip_id: Set(r.trip_id),
            customer_id: Set(r.customer_id),
            status: Set(r.status.as_str().to_string()),
            created_at: Set(r.created_at),
            updated_at: Set(r.updated_at),
            ..Default::default()
        };
        let saved = model.insert(&self.db).await.map_err(db_err)?;
        model_to_domain(saved)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .order_by_asc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn find_by_customer(&self, customer_id: i32) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::CustomerId.eq(customer_id))
            .order_by_asc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn find_by_trip_and_customer(
        &self,
        trip_id: i32,
        customer_id: i32,
    ) -> DomainResult<Option<Reservation>> {
        reservation::Entity::find()
            .filter(reservation::Column::TripId.eq(trip_id))
            .filter(reservation::Column::CustomerId.eq(customer_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn update(&self, r: Reservation) -> DomainResult<Reservation> {
        debug!("Updating reservation {} -> {}", r.id, r.status);

        let existing = reservation::Entity::find_by_id(r.id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", r.id))?;

        // Trip, customer and creation time are fixed at booking.
        let mut model: reservation::ActiveModel = existing.into();
        model.status = Set(r.status.as_str().to_string());
        model.updated_at = Set(r.updated_at);
        let saved = model.update(&self.db).await.map_err(db_err)?;
        model_to_domain(saved)
    }

    async fn count_for_trip(&self, trip_id: i32) -> DomainResult<u64> {
        reservation::Entity::find()
            .filter(reservation::Column::TripId.eq(trip_id))
            .filter(reservation::Column::Status.ne(ReservationStatus::Cancelled.as_str()))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn has_active_for_trip(&self, trip_id: i32) -> DomainResult<bool> {
        let count = reservation::Entity::find()
            .filter(reservation::Column::TripId.eq(trip_id))
            .filter(reservation::Column::Status.is_in(ACTIVE_STATUSES.map(|s| s.as_str())))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn exists_for_customer(&self, customer_id: i32) -> DomainResult<bool> {
        let count = reservation::Entity::find()
            .filter(reservation::Column::CustomerId.eq(customer_id))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }
}
