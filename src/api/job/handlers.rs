use actix_multipart::form::MultipartForm;
use actix_web::{
    Either, HttpRequest, HttpResponse, delete, get, patch, post,
    web::{Data, Path, Query, ServiceConfig, scope},
};
use actix_web_validator::Json;
use uuid::Uuid;
use validator::Validate;

use super::dto::{DeleteResponse, JobResponse, Listing, MutationResponse};
use super::models::{CityChange, ListingQuery, NewJob, NewJobUpload, StatusUpdate};
use super::service::JobService;
use crate::api::error::ServiceError;
use crate::api::provider::ProviderService;
use crate::area::LocationPredicate;

/// JSON body, or a multipart form with an optional `image` file field
#[post("")]
async fn create_job(
    service: Data<JobService>,
    body: Either<Json<NewJob>, MultipartForm<NewJobUpload>>,
) -> Result<HttpResponse, ServiceError> {
    let (job, image) = match body {
        Either::Left(job) => (job.into_inner(), None),
        Either::Right(MultipartForm(form)) => {
            let (job, image) = form.into_parts().map_err(ServiceError::ValidationError)?;
            job.validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
            (job, image)
        }
    };
    let created = service.create_job(job, image).await?;
    Ok(HttpResponse::Created().json(JobResponse { job: created }))
}

/// Bookings and jobs, scoped to the calling provider's service area
#[get("")]
async fn list_jobs(
    req: HttpRequest,
    service: Data<JobService>,
    providers: Data<ProviderService>,
    query: Query<ListingQuery>,
) -> Result<HttpResponse, ServiceError> {
    let location = providers
        .identify(&req)
        .await
        .map(|provider| LocationPredicate::for_service_area(&provider.service_area));
    let listings = service.list(location, query.status.as_deref()).await?;
    Ok(HttpResponse::Ok().json(listings))
}

#[get("/{id}")]
async fn get_job(
    service: Data<JobService>,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.get(path.into_inner()).await?))
}

#[patch("/{id}/status")]
async fn update_status(
    service: Data<JobService>,
    path: Path<Uuid>,
    body: Json<StatusUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let listing = service.update_status(path.into_inner(), &body.status).await?;
    Ok(HttpResponse::Ok().json(MutationResponse { success: true, listing }))
}

#[patch("/{id}/add-city")]
async fn add_city(
    service: Data<JobService>,
    path: Path<Uuid>,
    body: Json<CityChange>,
) -> Result<HttpResponse, ServiceError> {
    let job = service.add_city(path.into_inner(), &body.city).await?;
    Ok(HttpResponse::Ok().json(MutationResponse {
        success: true,
        listing: Listing::Job(job),
    }))
}

#[patch("/{id}/remove-city")]
async fn remove_city(
    service: Data<JobService>,
    path: Path<Uuid>,
    body: Json<CityChange>,
) -> Result<HttpResponse, ServiceError> {
    let job = service.remove_city(path.into_inner(), &body.city).await?;
    Ok(HttpResponse::Ok().json(MutationResponse {
        success: true,
        listing: Listing::Job(job),
    }))
}

#[delete("/{id}")]
async fn delete_job(
    service: Data<JobService>,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    service.delete(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DeleteResponse { success: true }))
}

pub fn job_config(config: &mut ServiceConfig) {
    config.service(
        scope("/api/jobs")
            .service(create_job)
            .service(list_jobs)
            .service(get_job)
            .service(update_status)
            .service(add_city)
            .service(remove_city)
            .service(delete_job),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::validation::json_config;
    use crate::events::EventBus;
    use crate::uploads::UploadStore;
    use actix_web::{test, App};
    use sqlx::PgPool;

    const BOUNDARY: &str = "jobform";

    fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\n\
                     Content-Type: image/jpeg\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn uploads_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("job-uploads-{}", Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[sqlx::test]
    async fn json_job_with_blank_code_gets_a_generated_one(pool: PgPool) {
        let dir = uploads_dir();
        let service = JobService::new(pool, EventBus::new(8), UploadStore::new(&dir));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service))
                .app_data(json_config())
                .configure(job_config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/jobs")
            .set_json(serde_json::json!({
                "jobId": "",
                "category": "Plumbing",
                "cities": ["Pune"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["job"]["jobId"].as_str().unwrap().starts_with("JOB-"));
        assert_eq!(body["job"]["city"], "Pune");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[sqlx::test]
    async fn multipart_job_stores_its_image(pool: PgPool) {
        let dir = uploads_dir();
        let service = JobService::new(pool, EventBus::new(8), UploadStore::new(&dir));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service))
                .app_data(json_config())
                .configure(job_config),
        )
        .await;

        let body = multipart_body(
            &[("category", "Plumbing"), ("cities", "Pune, Delhi"), ("price", "450")],
            Some(("sink.jpg", b"jpeg")),
        );
        let req = test::TestRequest::post()
            .uri("/api/jobs")
            .insert_header(("content-type", format!("multipart/form-data; boundary={BOUNDARY}")))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["job"]["cities"], serde_json::json!(["Pune", "Delhi"]));
        assert_eq!(body["job"]["price"], 450.0);
        let image_url = body["job"]["imageUrl"].as_str().unwrap();
        let stored = image_url.strip_prefix("/uploads/").unwrap();
        assert!(stored.ends_with("-sink.jpg"));
        assert_eq!(std::fs::read(dir.join(stored)).unwrap(), b"jpeg");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[sqlx::test]
    async fn multipart_job_with_bad_price_is_rejected(pool: PgPool) {
        let dir = uploads_dir();
        let service = JobService::new(pool, EventBus::new(8), UploadStore::new(&dir));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service))
                .app_data(json_config())
                .configure(job_config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/jobs")
            .insert_header(("content-type", format!("multipart/form-data; boundary={BOUNDARY}")))
            .set_payload(multipart_body(&[("price", "cheap")], None))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
