use actix_web::HttpRequest;
use serde::Serialize;
use sqlx::{Pool, Postgres};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::models::{NewProvider, ProviderChanges, ProviderDocuments, ProviderStatus};
use crate::api::error::ServiceError;
use crate::auth::{bearer_token, Claims, TokenKeys};
use crate::db::models::ProviderRow;
use crate::db::provider_repository::ProviderRepository;
use crate::events::{Count, Event, EventBus};
use crate::uploads::UploadStore;

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub provider: ProviderRow,
    pub token: String,
}

/// Provider registration, administration and identity
pub struct ProviderService {
    pool: Pool<Postgres>,
    events: EventBus,
    keys: TokenKeys,
    uploads: UploadStore,
}

impl ProviderService {
    pub fn new(pool: Pool<Postgres>, events: EventBus, keys: TokenKeys, uploads: UploadStore) -> Self {
        Self {
            pool,
            events,
            keys,
            uploads,
        }
    }

    /// Register a provider as pending
    ///
    /// # Business Logic
    /// - Requires non-blank name and phone number
    /// - Rejects a phone number that is already registered
    /// - Publishes `providerAdded` and the refreshed active count
    pub async fn register(&self, provider: NewProvider) -> Result<ProviderRow, ServiceError> {
        let provider = provider.normalized();
        if provider.full_name.is_empty() || provider.phone_number.is_empty() {
            return Err(ServiceError::ValidationError(
                "fullName and phoneNumber are required.".to_string(),
            ));
        }

        info!("Service: Registering provider phone={}", provider.phone_number);

        if ProviderRepository::find_by_phone(&self.pool, &provider.phone_number)
            .await?
            .is_some()
        {
            return Err(ServiceError::ValidationError("Provider already exists.".to_string()));
        }

        let created = ProviderRepository::create(&self.pool, &provider).await?;
        info!("Service: Provider created with id={}", created.id);

        self.events.publish(Event::ProviderAdded(created.clone()));
        self.publish_active_count().await;
        Ok(created)
    }

    /// [`register`](Self::register) with uploaded documents. Each stored
    /// file replaces the matching path field; the files are removed again
    /// if registration fails.
    pub async fn register_with_documents(
        &self,
        mut provider: NewProvider,
        documents: ProviderDocuments,
    ) -> Result<ProviderRow, ServiceError> {
        let mut stored = Vec::new();
        let slots = [
            (documents.profile_photo, &mut provider.profile_photo),
            (documents.government_id_proof, &mut provider.government_id_proof),
            (documents.address_proof, &mut provider.address_proof),
            (documents.skill_certificate, &mut provider.skill_certificate),
        ];
        for (file, slot) in slots {
            let Some(file) = file else { continue };
            match self.uploads.save(file).await {
                Ok(Some(path)) => {
                    *slot = path.clone();
                    stored.push(path);
                }
                Ok(None) => {}
                Err(e) => {
                    self.discard_all(&stored).await;
                    return Err(e);
                }
            }
        }

        let registered = self.register(provider).await;
        if registered.is_err() {
            self.discard_all(&stored).await;
        }
        registered
    }

    pub async fn list(&self) -> Result<Vec<ProviderRow>, ServiceError> {
        Ok(ProviderRepository::list(&self.pool).await?)
    }

    pub async fn list_active(&self) -> Result<Vec<ProviderRow>, ServiceError> {
        Ok(ProviderRepository::list_by_status(&self.pool, ProviderStatus::Active).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<ProviderRow, ServiceError> {
        ProviderRepository::find(&self.pool, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Provider not found".to_string()))
    }

    /// Apply an administrative update
    ///
    /// Publishes `providerSuspended` when the new status is suspended,
    /// `providerUpdated` otherwise, then the active count.
    pub async fn update(&self, id: Uuid, changes: ProviderChanges) -> Result<ProviderRow, ServiceError> {
        let status = changes
            .status
            .as_deref()
            .map(str::parse::<ProviderStatus>)
            .transpose()
            .map_err(ServiceError::ValidationError)?;

        info!("Service: Updating provider {} (status={:?})", id, status);

        let provider = ProviderRepository::update(&self.pool, id, &changes, status)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Provider not found".to_string()))?;

        if status == Some(ProviderStatus::Suspended) {
            self.events.publish(Event::ProviderSuspended(provider.clone()));
        } else {
            self.events.publish(Event::ProviderUpdated(provider.clone()));
        }
        self.publish_active_count().await;
        Ok(provider)
    }

    /// Phone-number login issuing a provider token
    pub async fn login(&self, phone_number: &str) -> Result<LoginResponse, ServiceError> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(ServiceError::ValidationError("Phone number is required".to_string()));
        }

        let provider = ProviderRepository::find_by_phone(&self.pool, phone_number)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Provider not found".to_string()))?;

        if provider.status.eq_ignore_ascii_case(ProviderStatus::Suspended.as_str()) {
            return Err(ServiceError::Forbidden("This provider account is suspended".to_string()));
        }

        let token = self
            .keys
            .issue(provider.id, &provider.phone_number)
            .map_err(|e| ServiceError::TokenError(e.to_string()))?;

        info!("Service: Provider {} logged in", provider.id);
        Ok(LoginResponse {
            message: "Login successful".to_string(),
            provider,
            token,
        })
    }

    /// Provider behind the request's bearer token, if any.
    ///
    /// Every failure (no token, bad token, unknown provider, database
    /// error) yields `None` so listings fall back to the unscoped view.
    pub async fn identify(&self, req: &HttpRequest) -> Option<ProviderRow> {
        let Some(token) = bearer_token(req) else {
            debug!("No bearer token; request is unscoped");
            return None;
        };
        let claims = self.keys.verify(token)?;
        match self.lookup(&claims).await {
            Ok(Some(provider)) => Some(provider),
            Ok(None) => {
                debug!("Token names no known provider; request is unscoped");
                None
            }
            Err(e) => {
                warn!("Provider lookup failed, request is unscoped: {}", e);
                None
            }
        }
    }

    async fn lookup(&self, claims: &Claims) -> Result<Option<ProviderRow>, sqlx::Error> {
        if let Some(id) = claims.provider_ref() {
            if let Some(provider) = ProviderRepository::find(&self.pool, id).await? {
                return Ok(Some(provider));
            }
        }
        match claims.email.as_deref() {
            Some(email) => ProviderRepository::find_by_email(&self.pool, email).await,
            None => Ok(None),
        }
    }

    async fn discard_all(&self, paths: &[String]) {
        for path in paths {
            self.uploads.discard(path).await;
        }
    }

    async fn publish_active_count(&self) {
        match ProviderRepository::count_by_status(&self.pool, ProviderStatus::Active).await {
            Ok(count) => self.events.publish(Event::ProviderCount(Count { count })),
            Err(e) => warn!("Could not count active providers: {}", e),
        }
    }
}
