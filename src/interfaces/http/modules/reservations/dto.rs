//! Reservation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{Customer, Reservation, ReservationStatus, Trip};

/// Reservation lifecycle state on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatusDto {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl From<ReservationStatus> for ReservationStatusDto {
    fn from(s: ReservationStatus) -> Self {
        match s {
            ReservationStatus::Pending => Self::Pending,
            ReservationStatus::Confirmed => Self::Confirmed,
            ReservationStatus::InProgress => Self::InProgress,
            ReservationStatus::Completed => Self::Completed,
            ReservationStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<ReservationStatusDto> for ReservationStatus {
    fn from(s: ReservationStatusDto) -> Self {
        match s {
            ReservationStatusDto::Pending => Self::Pending,
            ReservationStatusDto::Confirmed => Self::Confirmed,
            ReservationStatusDto::InProgress => Self::InProgress,
            ReservationStatusDto::Completed => Self::Completed,
            ReservationStatusDto::Cancelled => Self::Cancelled,
        }
    }
}

/// Request to book a seat
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookReservationRequest {
    pub trip_id: i32,
    pub customer_id: i32,
}

/// Caller-editable reservation fields
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ModifyReservationRequest {
    pub status: Option<ReservationStatusDto>,
}

/// Operational state change
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetStateRequest {
    pub status: ReservationStatusDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TripSummary {
    pub id: i32,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
}

impl From<&Trip> for TripSummary {
    fn from(t: &Trip) -> Self {
        Self {
            id: t.id,
            origin: t.origin.clone(),
            destination: t.destination.clone(),
            departure_at: t.departure_at,
            arrival_at: t.arrival_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerSummary {
    pub id: i32,
    pub identification: String,
    pub name: String,
}

impl From<&Customer> for CustomerSummary {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.id,
            identification: c.identification.clone(),
            name: c.name.clone(),
        }
    }
}

/// Reservation with its trip and customer resolved
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationDto {
    pub id: i32,
    pub status: ReservationStatusDto,
    pub trip: Option<TripSummary>,
    pub customer: Option<CustomerSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReservationDto {
    pub fn new(r: Reservation, trip: Option<&Trip>, customer: Option<&Customer>) -> Self {
        Self {
            id: r.id,
            status: r.status.into(),
            trip: trip.map(Into::into),
            customer: customer.map(Into::into),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
