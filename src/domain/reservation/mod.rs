//! Reservation aggregate
//!
//! Contains the Reservation entity, its lifecycle states, and repository interface.

pub mod model;
pub mod repository;

pub use model::{Reservation, ReservationChanges, ReservationStatus};
pub use repository::ReservationRepository;
