//! Reservation domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::DomainError;

/// Reservation lifecycle state
///
/// `Pending → Confirmed → InProgress → Completed`, with `Cancelled`
/// reachable from `Pending` or `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    /// Booked, awaiting confirmation
    Pending,
    /// Confirmed by the operator
    Confirmed,
    /// Trip underway with the customer aboard
    InProgress,
    /// Trip finished
    Completed,
    /// Released by the customer or operator
    Cancelled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, InProgress)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Not yet in a terminal state.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether the reservation still holds a seat.
    pub fn counts_toward_capacity(&self) -> bool {
        *self != Self::Cancelled
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::invalid(format!(
                "unknown reservation state '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer's seat on a trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: i32,
    /// Set once at booking
    pub trip_id: i32,
    /// Set once at booking
    pub customer_id: i32,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Unsaved pending reservation.
    pub fn new(trip_id: i32, customer_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            trip_id,
            customer_id,
            status: ReservationStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next` if the edge exists.
    pub fn transition(
        &mut self,
        next: ReservationStatus,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::conflict(format!(
                "Reservation {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Mutable fields of a reservation. Trip and customer are fixed at booking.
#[derive(Debug, Clone, Default)]
pub struct ReservationChanges {
    pub status: Option<ReservationStatus>,
}

// ── Tests ──────────────────────────────────────────────────────
