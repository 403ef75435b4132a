use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::api::provider::models::{NewProvider, ProviderChanges, ProviderStatus};
use crate::db::models::ProviderRow;

const PROVIDER_COLUMNS: &str = "id, full_name, phone_number, email, service_category, sub_service, \
     experience, service_area, pin_code, language_spoken, profile_photo, government_id_proof, \
     address_proof, skill_certificate, bank_account_number, ifsc_code, upi_id, status, rating, \
     created_at, updated_at";

/// Repository for Provider database operations
pub struct ProviderRepository;

impl ProviderRepository {
    /// Register a provider as pending
    pub async fn create(pool: &Pool<Postgres>, provider: &NewProvider) -> Result<ProviderRow, sqlx::Error> {
        debug!("Creating provider: phone={}", provider.phone_number);

        let row = sqlx::query_as::<_, ProviderRow>(&format!(
            r#"
            INSERT INTO providers (id, full_name, phone_number, email, service_category, sub_service,
                                   experience, service_area, pin_code, language_spoken, profile_photo,
                                   government_id_proof, address_proof, skill_certificate,
                                   bank_account_number, ifsc_code, upi_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {PROVIDER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&provider.full_name)
        .bind(&provider.phone_number)
        .bind(&provider.email)
        .bind(&provider.service_category)
        .bind(&provider.sub_service)
        .bind(provider.experience.unwrap_or(0))
        .bind(&provider.service_area)
        .bind(&provider.pin_code)
        .bind(&provider.language_spoken)
        .bind(&provider.profile_photo)
        .bind(&provider.government_id_proof)
        .bind(&provider.address_proof)
        .bind(&provider.skill_certificate)
        .bind(&provider.bank_account_number)
        .bind(&provider.ifsc_code)
        .bind(&provider.upi_id)
        .bind(ProviderStatus::Pending.as_str())
        .fetch_one(pool)
        .await?;

        debug!("Provider created with id={}", row.id);
        Ok(row)
    }

    pub async fn list(pool: &Pool<Postgres>) -> Result<Vec<ProviderRow>, sqlx::Error> {
        sqlx::query_as::<_, ProviderRow>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn list_by_status(
        pool: &Pool<Postgres>,
        status: ProviderStatus,
    ) -> Result<Vec<ProviderRow>, sqlx::Error> {
        sqlx::query_as::<_, ProviderRow>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers WHERE status = $1 ORDER BY created_at DESC"
        ))
        .bind(status.as_str())
        .fetch_all(pool)
        .await
    }

    pub async fn find(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<ProviderRow>, sqlx::Error> {
        sqlx::query_as::<_, ProviderRow>(&format!("SELECT {PROVIDER_COLUMNS} FROM providers WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_phone(pool: &Pool<Postgres>, phone_number: &str) -> Result<Option<ProviderRow>, sqlx::Error> {
        sqlx::query_as::<_, ProviderRow>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers WHERE phone_number = $1"
        ))
        .bind(phone_number)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<ProviderRow>, sqlx::Error> {
        sqlx::query_as::<_, ProviderRow>(&format!("SELECT {PROVIDER_COLUMNS} FROM providers WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_by_status(pool: &Pool<Postgres>, status: ProviderStatus) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM providers WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(pool)
            .await
    }

    /// Apply the fields present in `changes`; absent fields keep their value.
    pub async fn update(
        pool: &Pool<Postgres>,
        id: Uuid,
        changes: &ProviderChanges,
        status: Option<ProviderStatus>,
    ) -> Result<Option<ProviderRow>, sqlx::Error> {
        debug!("Updating provider {} (status={:?})", id, status);

        sqlx::query_as::<_, ProviderRow>(&format!(
            r#"
            UPDATE providers SET
                status = COALESCE($2, status),
                service_category = COALESCE($3, service_category),
                sub_service = COALESCE($4, sub_service),
                experience = COALESCE($5, experience),
                service_area = COALESCE($6, service_area),
                pin_code = COALESCE($7, pin_code),
                language_spoken = COALESCE($8, language_spoken),
                profile_photo = COALESCE($9, profile_photo),
                government_id_proof = COALESCE($10, government_id_proof),
                address_proof = COALESCE($11, address_proof),
                skill_certificate = COALESCE($12, skill_certificate),
                bank_account_number = COALESCE($13, bank_account_number),
                ifsc_code = COALESCE($14, ifsc_code),
                upi_id = COALESCE($15, upi_id),
                rating = COALESCE($16, rating),
                updated_at = now()
            WHERE id = $1
            RETURNING {PROVIDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.map(ProviderStatus::as_str))
        .bind(&changes.service_category)
        .bind(&changes.sub_service)
        .bind(changes.experience)
        .bind(&changes.service_area)
        .bind(&changes.pin_code)
        .bind(&changes.language_spoken)
        .bind(&changes.profile_photo)
        .bind(&changes.government_id_proof)
        .bind(&changes.address_proof)
        .bind(&changes.skill_certificate)
        .bind(&changes.bank_account_number)
        .bind(&changes.ifsc_code)
        .bind(&changes.upi_id)
        .bind(changes.rating)
        .fetch_optional(pool)
        .await
    }
}
