//! Application services

mod customer_directory;
mod reservation_engine;
mod trip_scheduler;
mod vehicle_manager;

#[cfg(test)]
pub(crate) mod testing;

pub use customer_directory::CustomerDirectory;
pub use reservation_engine::ReservationEngine;
pub use trip_scheduler::TripScheduler;
pub use vehicle_manager::VehicleManager;

use std::sync::Arc;

use crate::domain::RepositoryProvider;
use crate::shared::{ScheduleLocks, SharedClock};

/// The four managers wired over one store, one clock and one lock table.
#[derive(Clone)]
pub struct BookingServices {
    pub vehicles: Arc<VehicleManager>,
    pub customers: Arc<CustomerDirectory>,
    pub trips: Arc<TripScheduler>,
    pub reservations: Arc<ReservationEngine>,
}

impl BookingServices {
    pub fn new(repos: Arc<dyn RepositoryProvider>, clock: SharedClock) -> Self {
        let locks = Arc::new(ScheduleLocks::new());
        let vehicles = Arc::new(VehicleManager::new(
            repos.clone(),
            clock.clone(),
            locks.clone(),
        ));
        let customers = Arc::new(CustomerDirectory::new(repos.clone(), clock.clone()));
        let trips = Arc::new(TripScheduler::new(
            repos.clone(),
            clock.clone(),
            locks.clone(),
        ));
        let reservations = Arc::new(ReservationEngine::new(
            repos,
            clock,
            locks,
            trips.clone(),
            customers.clone(),
        ));
        Self {
            vehicles,
            customers,
            trips,
            reservations,
        }
    }
}
