//! Repository access for the domain layer
//!
//! `RepositoryProvider` gathers the per-aggregate repositories so consumers
//! request only the one they need:
//!
//! ```ignore
//! async fn handle(repos: &dyn RepositoryProvider) {
//!     let trip = repos.trips().find_by_id(7).await?;
//!     let seats = repos.reservations().count_for_trip(7).await?;
//! }
//! ```

use super::customer::CustomerRepository;
use super::reservation::ReservationRepository;
use super::trip::TripRepository;
use super::vehicle::VehicleRepository;

pub trait RepositoryProvider: Send + Sync {
    fn vehicles(&self) -> &dyn VehicleRepository;
    fn trips(&self) -> &dyn TripRepository;
    fn customers(&self) -> &dyn CustomerRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
}
