use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Pending,
    Active,
    Suspended,
}

impl ProviderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderStatus::Pending => "pending",
            ProviderStatus::Active => "active",
            ProviderStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ProviderStatus::Pending),
            "active" => Ok(ProviderStatus::Active),
            "suspended" => Ok(ProviderStatus::Suspended),
            other => Err(format!("Invalid provider status: {}", other)),
        }
    }
}

/// Registration payload. New providers always start as pending.
#[derive(Deserialize, Debug, Default, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProvider {
    #[validate(length(min = 1, message = "fullName is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "phoneNumber is required"))]
    pub phone_number: String,
    /// Blank means no email, so it never collides on the unique index.
    #[serde(deserialize_with = "crate::api::validation::blank_as_none")]
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    pub service_category: String,
    pub sub_service: String,
    #[validate(range(min = 0, message = "experience cannot be negative"))]
    pub experience: Option<i32>,
    pub service_area: String,
    pub pin_code: String,
    pub language_spoken: String,
    pub profile_photo: String,
    #[serde(alias = "governmentIDProof")]
    pub government_id_proof: String,
    pub address_proof: String,
    pub skill_certificate: String,
    pub bank_account_number: String,
    pub ifsc_code: String,
    pub upi_id: String,
}

impl NewProvider {
    pub fn normalized(mut self) -> Self {
        self.full_name = self.full_name.trim().to_string();
        self.phone_number = self.phone_number.trim().to_string();
        self
    }
}

/// Multipart variant of [`NewProvider`]. The four document fields carry
/// files; text values for them are only accepted in the JSON form.
#[derive(Debug, MultipartForm)]
pub struct NewProviderUpload {
    #[multipart(rename = "fullName")]
    pub full_name: Option<Text<String>>,
    #[multipart(rename = "phoneNumber")]
    pub phone_number: Option<Text<String>>,
    pub email: Option<Text<String>>,
    #[multipart(rename = "serviceCategory")]
    pub service_category: Option<Text<String>>,
    #[multipart(rename = "subService")]
    pub sub_service: Option<Text<String>>,
    pub experience: Option<Text<String>>,
    #[multipart(rename = "serviceArea")]
    pub service_area: Option<Text<String>>,
    #[multipart(rename = "pinCode")]
    pub pin_code: Option<Text<String>>,
    #[multipart(rename = "languageSpoken")]
    pub language_spoken: Option<Text<String>>,
    #[multipart(rename = "bankAccountNumber")]
    pub bank_account_number: Option<Text<String>>,
    #[multipart(rename = "ifscCode")]
    pub ifsc_code: Option<Text<String>>,
    #[multipart(rename = "upiId")]
    pub upi_id: Option<Text<String>>,
    #[multipart(rename = "profilePhoto")]
    pub profile_photo: Option<TempFile>,
    #[multipart(rename = "governmentIDProof")]
    pub government_id_proof: Option<TempFile>,
    #[multipart(rename = "addressProof")]
    pub address_proof: Option<TempFile>,
    #[multipart(rename = "skillCertificate")]
    pub skill_certificate: Option<TempFile>,
}

/// Files sent with a multipart registration
#[derive(Debug, Default)]
pub struct ProviderDocuments {
    pub profile_photo: Option<TempFile>,
    pub government_id_proof: Option<TempFile>,
    pub address_proof: Option<TempFile>,
    pub skill_certificate: Option<TempFile>,
}

/// Form text, unwrapping values that were sent JSON-encoded (`"\"Asha\""`).
fn form_text(field: Option<Text<String>>) -> Option<String> {
    let raw = field.map(Text::into_inner)?;
    let value = serde_json::from_str::<String>(&raw).unwrap_or(raw);
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parts without a file name are not files.
fn document(file: Option<TempFile>) -> Option<TempFile> {
    file.filter(|f| f.file_name.is_some())
}

impl NewProviderUpload {
    pub fn into_parts(self) -> Result<(NewProvider, ProviderDocuments), String> {
        let experience = match form_text(self.experience) {
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| format!("experience must be a whole number, got {:?}", raw))?,
            ),
            None => None,
        };

        let provider = NewProvider {
            full_name: form_text(self.full_name).unwrap_or_default(),
            phone_number: form_text(self.phone_number).unwrap_or_default(),
            email: form_text(self.email),
            service_category: form_text(self.service_category).unwrap_or_default(),
            sub_service: form_text(self.sub_service).unwrap_or_default(),
            experience,
            service_area: form_text(self.service_area).unwrap_or_default(),
            pin_code: form_text(self.pin_code).unwrap_or_default(),
            language_spoken: form_text(self.language_spoken).unwrap_or_default(),
            bank_account_number: form_text(self.bank_account_number).unwrap_or_default(),
            ifsc_code: form_text(self.ifsc_code).unwrap_or_default(),
            upi_id: form_text(self.upi_id).unwrap_or_default(),
            ..Default::default()
        };
        let documents = ProviderDocuments {
            profile_photo: document(self.profile_photo),
            government_id_proof: document(self.government_id_proof),
            address_proof: document(self.address_proof),
            skill_certificate: document(self.skill_certificate),
        };
        Ok((provider, documents))
    }
}

/// Administrative update. Fields outside this set are ignored.
#[derive(Deserialize, Debug, Default, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderChanges {
    pub status: Option<String>,
    pub service_category: Option<String>,
    pub sub_service: Option<String>,
    #[validate(range(min = 0, message = "experience cannot be negative"))]
    pub experience: Option<i32>,
    pub service_area: Option<String>,
    pub pin_code: Option<String>,
    pub language_spoken: Option<String>,
    pub profile_photo: Option<String>,
    #[serde(alias = "governmentIDProof")]
    pub government_id_proof: Option<String>,
    pub address_proof: Option<String>,
    pub skill_certificate: Option<String>,
    pub bank_account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub upi_id: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "rating must be between 0 and 5"))]
    pub rating: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_normalized_to_lowercase() {
        assert_eq!(" Active ".parse::<ProviderStatus>(), Ok(ProviderStatus::Active));
        assert_eq!("SUSPENDED".parse::<ProviderStatus>(), Ok(ProviderStatus::Suspended));
        assert!("banned".parse::<ProviderStatus>().is_err());
    }

    #[test]
    fn blank_email_is_dropped() {
        let provider: NewProvider = serde_json::from_value(serde_json::json!({
            "fullName": " Asha ",
            "phoneNumber": "9000000001",
            "email": "  ",
            "serviceArea": "Mumbai (400001), Pune"
        }))
        .unwrap();
        let provider = provider.normalized();

        assert_eq!(provider.full_name, "Asha");
        assert_eq!(provider.email, None);
        assert!(provider.validate().is_ok());
    }

    #[test]
    fn registration_requires_name_and_phone() {
        let provider = NewProvider::default().normalized();
        let errors = provider.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("phone_number"));
    }

    fn text(value: &str) -> Option<Text<String>> {
        Some(Text(value.to_string()))
    }

    fn upload() -> NewProviderUpload {
        NewProviderUpload {
            full_name: None,
            phone_number: None,
            email: None,
            service_category: None,
            sub_service: None,
            experience: None,
            service_area: None,
            pin_code: None,
            language_spoken: None,
            bank_account_number: None,
            ifsc_code: None,
            upi_id: None,
            profile_photo: None,
            government_id_proof: None,
            address_proof: None,
            skill_certificate: None,
        }
    }

    #[test]
    fn form_text_unwraps_json_strings_and_drops_blanks() {
        let form = NewProviderUpload {
            full_name: text("\"Asha\""),
            phone_number: text(" 9000000001 "),
            email: text(""),
            service_area: text("Mumbai (400001), Pune"),
            experience: text("4"),
            ..upload()
        };
        let (provider, documents) = form.into_parts().unwrap();

        assert_eq!(provider.full_name, "Asha");
        assert_eq!(provider.phone_number, "9000000001");
        assert_eq!(provider.email, None);
        assert_eq!(provider.experience, Some(4));
        assert_eq!(provider.service_area, "Mumbai (400001), Pune");
        assert!(documents.profile_photo.is_none());
    }

    #[test]
    fn non_numeric_experience_is_rejected() {
        let form = NewProviderUpload {
            experience: text("five years"),
            ..upload()
        };
        assert!(form.into_parts().is_err());
    }

    #[test]
    fn changes_ignore_fields_outside_the_allow_list() {
        let changes: ProviderChanges = serde_json::from_value(serde_json::json!({
            "status": "active",
            "phoneNumber": "1234",
            "governmentIDProof": "id.png"
        }))
        .unwrap();
        assert_eq!(changes.status.as_deref(), Some("active"));
        assert_eq!(changes.government_id_proof.as_deref(), Some("id.png"));
    }
}
