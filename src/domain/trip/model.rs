//! Trip domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{DomainError, DomainResult};

pub const MAX_PLACE_LEN: usize = 50;

/// Closed `[departure, arrival]` interval a vehicle is busy for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(departure: DateTime<Utc>, arrival: DateTime<Utc>) -> Self {
        Self { departure, arrival }
    }

    /// Closed-interval intersection. Touching endpoints count, so a trip
    /// arriving at 12:00 conflicts with one departing at 12:00.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.departure <= other.arrival && other.departure <= self.arrival
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: i32,
    pub vehicle_id: i32,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Build an unsaved trip, running the field checks in their fixed order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vehicle_id: i32,
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_at: DateTime<Utc>,
        arrival_at: DateTime<Utc>,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let trip = Self {
            id: 0,
            vehicle_id,
            origin: origin.into().trim().to_string(),
            destination: destination.into().trim().to_string(),
            departure_at,
            arrival_at,
            price,
            created_at: now,
            updated_at: now,
        };
        trip.validate_fields(now)?;
        Ok(trip)
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.departure_at, self.arrival_at)
    }

    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure_at < now
    }

    /// Same origin and destination, byte for byte. A recased city is a
    /// different stored route.
    pub fn same_route(&self, other: &Trip) -> bool {
        self.origin == other.origin && self.destination == other.destination
    }

    /// Departure not past, arrival not before departure, distinct endpoints,
    /// non-negative price. First failure wins.
    pub fn validate_fields(&self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.departure_at < now {
            return Err(DomainError::invalid("departure cannot be in the past"));
        }
        self.validate_shape()
    }

    /// Field checks that do not depend on the clock.
    pub fn validate_shape(&self) -> DomainResult<()> {
        if self.arrival_at < self.departure_at {
            return Err(DomainError::invalid(
                "arrival must not be earlier than departure",
            ));
        }
        if self.origin.is_empty() || self.destination.is_empty() {
            return Err(DomainError::invalid("origin and destination are required"));
        }
        if eq_ignore_case(&self.origin, &self.destination) {
            return Err(DomainError::invalid(
                "origin and destination must be different",
            ));
        }
        if self.origin.chars().count() > MAX_PLACE_LEN
            || self.destination.chars().count() > MAX_PLACE_LEN
        {
            return Err(DomainError::invalid(format!(
                "origin and destination must be at most {} characters",
                MAX_PLACE_LEN
            )));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::invalid("price cannot be negative"));
        }
        if self.price.round_dp(2) != self.price {
            return Err(DomainError::invalid(
                "price supports at most two decimal places",
            ));
        }
        Ok(())
    }

    /// Copy of this trip with `changes` merged on top.
    pub fn merged(&self, changes: &TripChanges, now: DateTime<Utc>) -> Trip {
        Trip {
            id: self.id,
            vehicle_id: changes.vehicle_id.unwrap_or(self.vehicle_id),
            origin: changes
                .origin
                .as_deref()
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| self.origin.clone()),
            destination: changes
                .destination
                .as_deref()
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| self.destination.clone()),
            departure_at: changes.departure_at.unwrap_or(self.departure_at),
            arrival_at: changes.arrival_at.unwrap_or(self.arrival_at),
            price: changes.price.unwrap_or(self.price),
            created_at: self.created_at,
            updated_at: now,
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Partial update of a trip; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct TripChanges {
    pub vehicle_id: Option<i32>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_at: Option<DateTime<Utc>>,
    pub arrival_at: Option<DateTime<Utc>>,
    pub price: Option<Decimal>,
}

/// Trip as read by callers: the stored record plus live seat figures.
#[derive(Debug, Clone)]
pub struct TripView {
    pub trip: Trip,
    pub capacity: i32,
    /// Non-cancelled reservations currently held
    pub reserved: u64,
}

impl TripView {
    pub fn available_seats(&self) -> i64 {
        self.capacity as i64 - self.reserved as i64
    }
}
