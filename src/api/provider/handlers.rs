use actix_multipart::form::MultipartForm;
use actix_web::{
    Either, HttpResponse, get, route,
    web::{self, Data, Path, ServiceConfig, scope},
};
use actix_web_validator::Json;
use uuid::Uuid;
use validator::Validate;

use super::models::{NewProvider, NewProviderUpload, ProviderChanges};
use super::service::ProviderService;
use crate::api::error::ServiceError;

/// JSON body, or a multipart form carrying the identity documents.
/// Mounted on both `""` and `/add`.
async fn add_provider(
    service: Data<ProviderService>,
    body: Either<Json<NewProvider>, MultipartForm<NewProviderUpload>>,
) -> Result<HttpResponse, ServiceError> {
    let created = match body {
        Either::Left(provider) => service.register(provider.into_inner()).await?,
        Either::Right(MultipartForm(form)) => {
            let (provider, documents) = form.into_parts().map_err(ServiceError::ValidationError)?;
            provider
                .validate()
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
            service.register_with_documents(provider, documents).await?
        }
    };
    Ok(HttpResponse::Created().json(created))
}

#[get("")]
async fn list_providers(service: Data<ProviderService>) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.list().await?))
}

#[get("/active")]
async fn list_active_providers(service: Data<ProviderService>) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.list_active().await?))
}

#[get("/phone/{phone_number}")]
async fn login_by_phone(
    service: Data<ProviderService>,
    path: Path<String>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.login(&path.into_inner()).await?))
}

#[get("/{id}")]
async fn get_provider(
    service: Data<ProviderService>,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.get(path.into_inner()).await?))
}

#[route("/{id}", method = "PATCH", method = "PUT")]
async fn update_provider(
    service: Data<ProviderService>,
    path: Path<Uuid>,
    changes: Json<ProviderChanges>,
) -> Result<HttpResponse, ServiceError> {
    let provider = service.update(path.into_inner(), changes.into_inner()).await?;
    Ok(HttpResponse::Ok().json(provider))
}

pub fn provider_config(config: &mut ServiceConfig) {
    config.service(
        scope("/api/providers")
            .route("", web::post().to(add_provider))
            .route("/add", web::post().to(add_provider))
            .service(list_providers)
            .service(list_active_providers)
            .service(login_by_phone)
            .service(get_provider)
            .service(update_provider),
    );
}
