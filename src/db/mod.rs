pub mod booking_repository;
pub mod connection;
pub mod customer_repository;
pub mod job_repository;
pub mod migrations;
pub mod models;
pub mod provider_repository;
