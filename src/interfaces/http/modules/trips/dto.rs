//! Trip DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{TripChanges, TripView};

/// Request to schedule a trip
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ScheduleTripRequest {
    pub vehicle_id: i32,
    #[validate(length(max = 50))]
    #[schema(example = "Cali")]
    pub origin: String,
    #[validate(length(max = 50))]
    #[schema(example = "Pasto")]
    pub destination: String,
    /// RFC 3339 timestamp
    pub departure_at: DateTime<Utc>,
    /// RFC 3339 timestamp, not earlier than departure
    pub arrival_at: DateTime<Utc>,
    /// Ticket price, at most two decimals
    #[schema(value_type = String, example = "45000.00")]
    pub price: Decimal,
}

/// Partial trip update; omitted fields keep their value
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTripRequest {
    pub vehicle_id: Option<i32>,
    #[validate(length(max = 50))]
    pub origin: Option<String>,
    #[validate(length(max = 50))]
    pub destination: Option<String>,
    pub departure_at: Option<DateTime<Utc>>,
    pub arrival_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
}

impl From<UpdateTripRequest> for TripChanges {
    fn from(r: UpdateTripRequest) -> Self {
        Self {
            vehicle_id: r.vehicle_id,
            origin: r.origin,
            destination: r.destination,
            departure_at: r.departure_at,
            arrival_at: r.arrival_at,
            price: r.price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TripDto {
    pub id: i32,
    pub vehicle_id: i32,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub price: Decimal,
    /// Seats of the assigned vehicle
    pub capacity: i32,
    /// Seats held by non-cancelled reservations
    pub reserved_seats: u64,
    pub available_seats: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TripView> for TripDto {
    fn from(view: TripView) -> Self {
        let available_seats = view.available_seats();
        let trip = view.trip;
        Self {
            id: trip.id,
            vehicle_id: trip.vehicle_id,
            origin: trip.origin,
            destination: trip.destination,
            departure_at: trip.departure_at,
            arrival_at: trip.arrival_at,
            price: trip.price,
            capacity: view.capacity,
            reserved_seats: view.reserved,
            available_seats,
            created_at: trip.created_at,
            updated_at: trip.updated_at,
        }
    }
}
