//! Application layer: the managers that enforce scheduling and booking rules

pub mod services;

pub use services::{
    BookingServices, CustomerDirectory, ReservationEngine, TripScheduler, VehicleManager,
};
