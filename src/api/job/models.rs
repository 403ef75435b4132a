use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Job status enum representing the state of a job or booking
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Pending,
    Active,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
    Inactive,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Active => "active",
            JobStatus::Accepted => "accepted",
            JobStatus::InProgress => "in-progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Inactive => "inactive",
        }
    }

    /// Whether listings may be narrowed to this status.
    pub fn is_listing_filter(self) -> bool {
        !matches!(self, JobStatus::Active | JobStatus::Inactive)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "active" => Ok(JobStatus::Active),
            "accepted" => Ok(JobStatus::Accepted),
            "in-progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            "inactive" => Ok(JobStatus::Inactive),
            other => Err(format!("Invalid status value: {}", other)),
        }
    }
}

/// City list as clients send it: a JSON array, a JSON-array string, or a
/// comma-separated string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CitiesInput {
    List(Vec<String>),
    Text(String),
}

impl CitiesInput {
    pub fn into_cities(self) -> Vec<String> {
        match self {
            CitiesInput::List(items) => clean_cities(items),
            CitiesInput::Text(text) => match serde_json::from_str::<Vec<String>>(&text) {
                Ok(items) => clean_cities(items),
                Err(_) => split_cities(&text),
            },
        }
    }
}

fn clean_cities(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn split_cities(text: &str) -> Vec<String> {
    clean_cities(text.split(',').map(str::to_string).collect())
}

/// Resolve the `cities` list and legacy `city` of a new job. `city` is read
/// as a comma-separated list when `cities` yields nothing, so the legacy
/// value is always the first entry or empty.
pub fn resolve_cities(cities: Option<CitiesInput>, city: Option<&str>) -> (Vec<String>, String) {
    let mut list = cities.map(CitiesInput::into_cities).unwrap_or_default();
    if list.is_empty() {
        list = city.map(split_cities).unwrap_or_default();
    }
    let first = list.first().cloned().unwrap_or_default();
    (list, first)
}

/// Job creation payload
#[derive(Deserialize, Debug, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    /// Generated when absent or blank.
    #[serde(default, deserialize_with = "crate::api::validation::blank_as_none")]
    #[validate(length(max = 64, message = "jobId must be at most 64 characters"))]
    pub job_id: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_service: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirement: String,
    pub image_url: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    pub cities: Option<CitiesInput>,
    pub city: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Multipart variant of [`NewJob`] carrying an optional image file.
#[derive(Debug, MultipartForm)]
pub struct NewJobUpload {
    pub image: Option<TempFile>,
    #[multipart(rename = "jobId")]
    pub job_id: Option<Text<String>>,
    pub category: Option<Text<String>>,
    #[multipart(rename = "subService")]
    pub sub_service: Option<Text<String>>,
    pub description: Option<Text<String>>,
    pub requirement: Option<Text<String>>,
    #[multipart(rename = "imageUrl")]
    pub image_url: Option<Text<String>>,
    pub price: Option<Text<String>>,
    pub cities: Vec<Text<String>>,
    pub city: Option<Text<String>>,
    pub status: Option<Text<String>>,
    pub date: Option<Text<String>>,
    pub time: Option<Text<String>>,
}

fn text(field: Option<Text<String>>) -> Option<String> {
    field.map(Text::into_inner).filter(|s| !s.trim().is_empty())
}

impl NewJobUpload {
    /// Split the form into its JSON-equivalent payload and the image file.
    pub fn into_parts(self) -> Result<(NewJob, Option<TempFile>), String> {
        let price = match text(self.price) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("price must be a number, got {:?}", raw))?,
            ),
            None => None,
        };

        let mut cities: Vec<String> = self.cities.into_iter().map(Text::into_inner).collect();
        let cities = match cities.len() {
            0 => None,
            1 => cities.pop().map(CitiesInput::Text),
            _ => Some(CitiesInput::List(cities)),
        };

        let job = NewJob {
            job_id: text(self.job_id),
            category: text(self.category).unwrap_or_default(),
            sub_service: text(self.sub_service).unwrap_or_default(),
            description: text(self.description).unwrap_or_default(),
            requirement: text(self.requirement).unwrap_or_default(),
            image_url: text(self.image_url),
            price,
            cities,
            city: text(self.city),
            status: text(self.status),
            date: text(self.date),
            time: text(self.time),
        };
        Ok((job, self.image))
    }
}

/// Fully resolved job ready to be inserted
#[derive(Debug, Clone)]
pub struct JobDraft {
    pub id: Uuid,
    pub job_id: String,
    pub category: String,
    pub sub_service: String,
    pub description: String,
    pub requirement: String,
    pub image_url: String,
    pub price: f64,
    pub cities: Vec<String>,
    pub city: String,
    pub status: JobStatus,
    pub date: String,
    pub time: String,
}

#[derive(Deserialize, Debug, Validate)]
pub struct StatusUpdate {
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
}

#[derive(Deserialize, Debug, Validate)]
pub struct CityChange {
    #[serde(default)]
    #[validate(length(min = 1, message = "city is required in request body"))]
    pub city: String,
}

#[derive(Deserialize, Debug)]
pub struct ListingQuery {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("In-Progress".parse::<JobStatus>(), Ok(JobStatus::InProgress));
        assert_eq!("CANCELLED".parse::<JobStatus>(), Ok(JobStatus::Cancelled));
        assert!("done".parse::<JobStatus>().is_err());
        assert_eq!(JobStatus::InProgress.to_string(), "in-progress");
    }

    #[test]
    fn cities_accept_array_json_string_and_comma_list() {
        let from_array: NewJob =
            serde_json::from_value(serde_json::json!({"cities": [" Pune ", "", "Delhi"]})).unwrap();
        assert_eq!(from_array.cities.unwrap().into_cities(), vec!["Pune", "Delhi"]);

        let from_json_text: NewJob =
            serde_json::from_value(serde_json::json!({"cities": "[\"Pune\",\"Delhi\"]"})).unwrap();
        assert_eq!(from_json_text.cities.unwrap().into_cities(), vec!["Pune", "Delhi"]);

        let from_commas: NewJob =
            serde_json::from_value(serde_json::json!({"cities": "Pune, ,Mumbai (400001)"})).unwrap();
        assert_eq!(from_commas.cities.unwrap().into_cities(), vec!["Pune", "Mumbai (400001)"]);
    }

    #[test]
    fn legacy_city_is_first_of_cities() {
        let (cities, city) = resolve_cities(Some(CitiesInput::Text("Pune, Delhi".into())), Some("Chennai"));
        assert_eq!(cities, vec!["Pune", "Delhi"]);
        assert_eq!(city, "Pune");

        let (cities, city) = resolve_cities(None, Some(" Chennai, Delhi "));
        assert_eq!(cities, vec!["Chennai", "Delhi"]);
        assert_eq!(city, "Chennai");

        let (cities, city) = resolve_cities(Some(CitiesInput::List(vec![])), Some(" Goa "));
        assert_eq!(cities, vec!["Goa"]);
        assert_eq!(city, "Goa");

        let (cities, city) = resolve_cities(None, None);
        assert!(cities.is_empty());
        assert_eq!(city, "");
    }

    #[test]
    fn blank_job_id_is_left_to_the_generator() {
        let job: NewJob = serde_json::from_value(serde_json::json!({
            "jobId": "  ",
            "category": "Plumbing"
        }))
        .unwrap();
        assert_eq!(job.job_id, None);
        assert!(job.validate().is_ok());

        let job: NewJob = serde_json::from_value(serde_json::json!({ "category": "Plumbing" })).unwrap();
        assert_eq!(job.job_id, None);

        let job: NewJob = serde_json::from_value(serde_json::json!({ "jobId": " JOB-7 " })).unwrap();
        assert_eq!(job.job_id.as_deref(), Some("JOB-7"));
    }

    #[test]
    fn negative_price_fails_validation() {
        let job = NewJob {
            price: Some(-1.0),
            ..Default::default()
        };
        assert!(job.validate().is_err());

        let job = NewJob {
            price: Some(250.0),
            ..Default::default()
        };
        assert!(job.validate().is_ok());
    }
}
