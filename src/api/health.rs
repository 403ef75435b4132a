use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use sqlx::{Pool, Postgres};
use tracing::error;

use crate::events::EventBus;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscribers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn database_reachable(pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| ())
}

/// Health check endpoint
///
/// Database connectivity plus the number of live event subscribers.
#[get("/health")]
async fn health_check(pool: web::Data<Pool<Postgres>>, bus: web::Data<EventBus>) -> impl Responder {
    match database_reachable(&pool).await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "healthy",
            database: "connected",
            subscribers: Some(bus.subscriber_count()),
            error: None,
        }),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "unhealthy",
                database: "disconnected",
                subscribers: Some(bus.subscriber_count()),
                error: Some(format!("Database error: {}", e)),
            })
        }
    }
}

/// Readiness check endpoint
///
/// Returns 503 while the database is unavailable.
#[get("/ready")]
async fn readiness_check(pool: web::Data<Pool<Postgres>>) -> impl Responder {
    match database_reachable(&pool).await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "ready",
            database: "connected",
            subscribers: None,
            error: None,
        }),
        Err(e) => {
            error!("Readiness check failed: database unavailable: {:?}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "not_ready",
                database: "disconnected",
                subscribers: None,
                error: Some(format!("Database unavailable: {}", e)),
            })
        }
    }
}

/// Liveness check endpoint. Does not touch dependencies.
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive",
        database: "not_checked",
        subscribers: None,
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn liveness_needs_no_database() {
        let app = test::init_service(App::new().service(liveness_check)).await;
        let req = test::TestRequest::get().uri("/live").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "alive");
        assert_eq!(body["database"], "not_checked");
        assert!(body.get("error").is_none());
        assert!(body.get("subscribers").is_none());
    }
}
