use actix_web::{
    get,
    web::{Data, Json, ServiceConfig, scope},
};
use sqlx::{Pool, Postgres};
use tracing::info;

use super::service::read_bookings;
use crate::api::error::ServiceError;
use crate::area::ListingFilter;
use crate::db::models::BookingView;

/// Every booking, newest first, with customers populated when possible
#[get("")]
async fn list_bookings(pool: Data<Pool<Postgres>>) -> Result<Json<Vec<BookingView>>, ServiceError> {
    let bookings = read_bookings(&pool, &ListingFilter::default()).await?;
    info!("Listed {} bookings", bookings.len());
    Ok(Json(bookings))
}

pub fn booking_config(config: &mut ServiceConfig) {
    config.service(scope("/api/bookings").service(list_bookings));
}
