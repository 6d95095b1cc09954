//! Trip aggregate
//!
//! Contains the Trip entity, its time window and the repository interface.

pub mod model;
pub mod repository;

pub use model::{TimeWindow, Trip, TripChanges, TripView};
pub use repository::TripRepository;
