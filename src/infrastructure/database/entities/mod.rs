//! Database entities module

pub mod customer;
pub mod reservation;
pub mod trip;
pub mod vehicle;

pub use customer::Entity as Customer;
pub use reservation::Entity as Reservation;
pub use trip::Entity as Trip;
pub use vehicle::Entity as Vehicle;
