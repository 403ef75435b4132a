use sqlx::{Pool, Postgres};
use tracing::warn;
use uuid::Uuid;

use crate::area::ListingFilter;
use crate::db::booking_repository::BookingRepository;
use crate::db::models::BookingView;

/// Bookings passing `filter`, with their customer, degrading to bare
/// bookings when the customer join fails.
///
/// Location and status are evaluated here with [`ListingFilter::admits`],
/// the same check the live event stream applies.
pub async fn read_bookings(pool: &Pool<Postgres>, filter: &ListingFilter) -> Result<Vec<BookingView>, sqlx::Error> {
    match BookingRepository::list_with_customers(pool).await {
        Ok(rows) => Ok(rows
            .into_iter()
            .filter(|row| filter.admits(&row.booking))
            .map(BookingView::from)
            .collect()),
        Err(e) => {
            warn!("Customer join failed, returning bookings without customers: {}", e);
            let rows = BookingRepository::list(pool).await?;
            Ok(rows
                .into_iter()
                .filter(|row| filter.admits(row))
                .map(BookingView::from)
                .collect())
        }
    }
}

/// Single-booking variant of [`read_bookings`].
pub async fn read_booking(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<BookingView>, sqlx::Error> {
    match BookingRepository::find_with_customer(pool, id).await {
        Ok(row) => Ok(row.map(BookingView::from)),
        Err(e) => {
            warn!("Customer join failed for booking {}, reading without customer: {}", id, e);
            Ok(BookingRepository::find(pool, id).await?.map(BookingView::from))
        }
    }
}
