pub mod booking;
pub mod customer;
pub mod error;
pub mod events;
pub mod health;
pub mod job;
pub mod provider;
pub mod validation;
