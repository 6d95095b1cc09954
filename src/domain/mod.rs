//! Domain layer
//!
//! One module per aggregate (model + repository trait) and the
//! `RepositoryProvider` that gathers them.

pub mod customer;
pub mod repositories;
pub mod reservation;
pub mod trip;
pub mod vehicle;

pub use customer::{Customer, CustomerRepository};
pub use repositories::RepositoryProvider;
pub use reservation::{Reservation, ReservationChanges, ReservationRepository, ReservationStatus};
pub use trip::{TimeWindow, Trip, TripChanges, TripRepository, TripView};
pub use vehicle::{Vehicle, VehicleRepository};

pub use crate::shared::errors::{DomainError, DomainResult, ErrorKind};
