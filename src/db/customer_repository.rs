use sqlx::{Pool, Postgres};

use crate::db::models::CustomerRow;

pub struct CustomerRepository;

impl CustomerRepository {
    pub async fn list(pool: &Pool<Postgres>) -> Result<Vec<CustomerRow>, sqlx::Error> {
        sqlx::query_as::<_, CustomerRow>(
            "SELECT id, full_name, phone_number, email, created_at FROM customers ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &Pool<Postgres>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(pool)
            .await
    }
}
