use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::area::Located;

/// Database representation of a job with all fields
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    pub id: Uuid,
    pub job_id: String,
    pub category: String,
    pub sub_service: String,
    pub description: String,
    pub requirement: String,
    pub image_url: String,
    pub price: f64,
    pub cities: Vec<String>,
    /// First of `cities` at creation; kept for older clients.
    pub city: String,
    pub status: String,
    pub date: String,
    pub time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Located for JobRow {
    fn cities(&self) -> &[String] {
        &self.cities
    }

    fn city(&self) -> &str {
        &self.city
    }

    fn status(&self) -> &str {
        &self.status
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRow {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    /// Job this booking was made against, if any.
    pub service_id: Option<Uuid>,
    pub category: String,
    pub sub_service: String,
    pub description: String,
    pub price: f64,
    pub city: String,
    pub status: String,
    pub date: String,
    pub time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Located for BookingRow {
    fn cities(&self) -> &[String] {
        &[]
    }

    fn city(&self) -> &str {
        &self.city
    }

    fn status(&self) -> &str {
        &self.status
    }
}

/// Booking joined with the customer who made it.
#[derive(Debug, FromRow)]
pub struct BookingCustomerRow {
    #[sqlx(flatten)]
    pub booking: BookingRow,
    pub customer_full_name: Option<String>,
    pub customer_phone_number: Option<String>,
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub full_name: String,
    pub phone_number: String,
    pub email: Option<String>,
}

/// Booking as returned to clients; `customer` is absent when it could not
/// be joined.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: BookingRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
}

impl From<BookingRow> for BookingView {
    fn from(booking: BookingRow) -> Self {
        Self {
            booking,
            customer: None,
        }
    }
}

impl From<BookingCustomerRow> for BookingView {
    fn from(row: BookingCustomerRow) -> Self {
        let customer = row.customer_full_name.map(|full_name| CustomerSummary {
            full_name,
            phone_number: row.customer_phone_number.unwrap_or_default(),
            email: row.customer_email,
        });
        Self {
            booking: row.booking,
            customer,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRow {
    pub id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub service_category: String,
    pub sub_service: String,
    pub experience: i32,
    /// Comma-separated areas, e.g. "Mumbai (400001), Pune".
    pub service_area: String,
    pub pin_code: String,
    pub language_spoken: String,
    pub profile_photo: String,
    pub government_id_proof: String,
    pub address_proof: String,
    pub skill_certificate: String,
    pub bank_account_number: String,
    pub ifsc_code: String,
    pub upi_id: String,
    pub status: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRow {
    pub id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}
