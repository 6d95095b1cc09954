//! Test wiring: in-memory store and a clock pinned to 2030-01-01 08:00 UTC.

use std::ops::Deref;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use super::BookingServices;
use crate::domain::{DomainResult, Trip};
use crate::infrastructure::InMemoryRepositoryProvider;
use crate::shared::FixedClock;

pub(crate) struct Harness {
    pub services: BookingServices,
    pub clock: Arc<FixedClock>,
    base: DateTime<Utc>,
}

impl Harness {
    pub fn new() -> Self {
        let base = Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(base));
        let services =
            BookingServices::new(Arc::new(InMemoryRepositoryProvider::new()), clock.clone());
        Self {
            services,
            clock,
            base,
        }
    }

    /// `hours` after the starting instant.
    pub fn at(&self, hours: i64) -> DateTime<Utc> {
        self.base + Duration::hours(hours)
    }

    /// Cali → Pasto on `vehicle_id`, departing `start` hours after base.
    pub async fn schedule(&self, vehicle_id: i32, start: i64, hours: i64) -> DomainResult<Trip> {
        self.services
            .trips
            .schedule(
                vehicle_id,
                "Cali",
                "Pasto",
                self.at(start),
                self.at(start + hours),
                Decimal::new(4500, 2),
            )
            .await
    }
}

impl Deref for Harness {
    type Target = BookingServices;

    fn deref(&self) -> &BookingServices {
        &self.services
    }
}
