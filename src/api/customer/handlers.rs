use actix_web::{
    get,
    web::{Data, Json, ServiceConfig, scope},
};
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::api::error::ServiceError;
use crate::db::customer_repository::CustomerRepository;
use crate::db::models::CustomerRow;

/// Every customer, newest first
#[get("")]
async fn list_customers(pool: Data<Pool<Postgres>>) -> Result<Json<Vec<CustomerRow>>, ServiceError> {
    let customers = CustomerRepository::list(&pool).await?;
    info!("Listed {} customers", customers.len());
    Ok(Json(customers))
}

pub fn customer_config(config: &mut ServiceConfig) {
    config.service(scope("/api/customers").service(list_customers));
}
