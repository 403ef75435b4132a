use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::api::job::models::JobStatus;
use crate::db::models::{BookingCustomerRow, BookingRow};

const BOOKING_COLUMNS: &str = "b.id, b.customer_id, b.service_id, b.category, b.sub_service, \
     b.description, b.price, b.city, b.status, b.date, b.time, b.created_at, b.updated_at";

const CUSTOMER_COLUMNS: &str = "c.full_name AS customer_full_name, \
     c.phone_number AS customer_phone_number, c.email AS customer_email";

/// Repository for Booking database operations
pub struct BookingRepository;

impl BookingRepository {
    /// Every booking joined with its customer, newest first
    ///
    /// Bookings are written by the customer-facing application, so they
    /// carry no stored area keys; callers scope them in memory.
    pub async fn list_with_customers(pool: &Pool<Postgres>) -> Result<Vec<BookingCustomerRow>, sqlx::Error> {
        debug!("Listing bookings with customers");
        sqlx::query_as::<_, BookingCustomerRow>(&format!(
            "SELECT {BOOKING_COLUMNS}, {CUSTOMER_COLUMNS} FROM bookings b \
             LEFT JOIN customers c ON c.id = b.customer_id ORDER BY b.created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    /// Every booking without the customer join, newest first
    pub async fn list(pool: &Pool<Postgres>) -> Result<Vec<BookingRow>, sqlx::Error> {
        debug!("Listing bookings");
        sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b ORDER BY b.created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_with_customer(
        pool: &Pool<Postgres>,
        id: Uuid,
    ) -> Result<Option<BookingCustomerRow>, sqlx::Error> {
        sqlx::query_as::<_, BookingCustomerRow>(&format!(
            "SELECT {BOOKING_COLUMNS}, {CUSTOMER_COLUMNS} FROM bookings b \
             LEFT JOIN customers c ON c.id = b.customer_id WHERE b.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<BookingRow>, sqlx::Error> {
        sqlx::query_as::<_, BookingRow>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &Pool<Postgres>,
        id: Uuid,
        status: JobStatus,
    ) -> Result<Option<BookingRow>, sqlx::Error> {
        debug!("Updating booking {} status to {}", id, status);
        sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings b SET status = $2, updated_at = now() WHERE b.id = $1 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await
    }

    /// Delete a booking, returning the removed record
    pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<BookingRow>, sqlx::Error> {
        debug!("Deleting booking {}", id);
        sqlx::query_as::<_, BookingRow>(&format!(
            "DELETE FROM bookings b WHERE b.id = $1 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
