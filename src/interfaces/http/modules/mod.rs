pub mod customers;
pub mod health;
pub mod metrics;
pub mod request_id;
pub mod reservations;
pub mod trips;
pub mod vehicles;
