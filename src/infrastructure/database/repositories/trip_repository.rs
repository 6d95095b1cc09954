//! SeaORM implementation of TripRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::db_err;
use crate::domain::trip::{TimeWindow, Trip, TripRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::trip;

pub struct SeaOrmTripRepository {
    db: DatabaseConnection,
}

impl SeaOrmTripRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: trip::Model) -> Trip {
    Trip {
        id: m.id,
        vehicle_id: m.vehicle_id,
        origin: m.origin,
        destination: m.destination,
        departure_at: m.departure_at,
        arrival_at: m.arrival_at,
        price: Decimal::new(m.price_minor, 2),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

/// Prices are stored in cents.
fn price_to_minor(price: Decimal) -> DomainResult<i64> {
    let mut cents = price.round_dp(2);
    cents.rescale(2);
    i64::try_from(cents.mantissa())
        .map_err(|_| DomainError::invalid(format!("price {} is out of range", price)))
}

fn to_active(t: Trip, with_id: bool) -> DomainResult<trip::ActiveModel> {
    let mut model = trip::ActiveModel {
        vehicle_id: Set(t.vehicle_id),
        origin: Set(t.origin),
        destination: Set(t.destination),
        departure_at: Set(t.departure_at),
        arrival_at: Set(t.arrival_at),
        price_minor: Set(price_to_minor(t.price)?),
        created_at: Set(t.created_at),
        updated_at: Set(t.updated_at),
        ..Default::default()
    };
    if with_id {
        model.id = Set(t.id);
    }
    Ok(model)
}

// ── TripRepository impl ─────────────────────────────────────────

#[async_trait]
impl TripRepository for SeaOrmTripRepository {
    async fn save(&self, t: Trip) -> DomainResult<Trip> {
        debug!("Saving trip for vehicle {}", t.vehicle_id);
        let saved = to_active(t, false)?
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model_to_domain(saved))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Trip>> {
        let model = trip::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<Trip>> {
        let models = trip::Entity::find()
            .order_by_asc(trip::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn update(&self, t: Trip) -> DomainResult<Trip> {
        debug!("Updating trip: {}", t.id);

        if trip::Entity::find_by_id(t.id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .is_none()
        {
            return Err(DomainError::not_found("Trip", "id", t.id));
        }

        let saved = to_active(t, true)?
            .update(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model_to_domain(saved))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let result = trip::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Trip", "id", id));
        }
        Ok(())
    }

    async fn exists_overlap(
        &self,
        vehicle_id: i32,
        window: TimeWindow,
        exclude_trip: Option<i32>,
    ) -> DomainResult<bool> {
        let mut query = trip::Entity::find()
            .filter(trip::Column::VehicleId.eq(vehicle_id))
            .filter(trip::Column::DepartureAt.lte(window.arrival))
            .filter(trip::Column::ArrivalAt.gte(window.departure));
        if let Some(id) = exclude_trip {
            query = query.filter(trip::Column::Id.ne(id));
        }
        let count = query.count(&self.db).await.map_err(db_err)?;
        Ok(count > 0)
    }

    async fn has_departures_from(
        &self,
        vehicle_id: i32,
        instant: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let count = trip::Entity::find()
            .filter(trip::Column::VehicleId.eq(vehicle_id))
            .filter(trip::Column::DepartureAt.gte(instant))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }
}
