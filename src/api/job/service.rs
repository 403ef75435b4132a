use actix_multipart::form::tempfile::TempFile;
use chrono::{Local, Utc};
use rand::Rng;
use sqlx::{Pool, Postgres};
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{Listing, ListingsResponse};
use super::models::{resolve_cities, JobDraft, JobStatus, NewJob};
use crate::api::booking::service::{read_booking, read_bookings};
use crate::api::error::ServiceError;
use crate::area::{cities, normalize_area, ListingFilter, LocationPredicate};
use crate::db::booking_repository::BookingRepository;
use crate::db::job_repository::JobRepository;
use crate::db::models::{BookingView, JobRow};
use crate::events::{Event, EventBus};
use crate::uploads::UploadStore;

/// Job service containing business logic
pub struct JobService {
    pool: Pool<Postgres>,
    events: EventBus,
    uploads: UploadStore,
}

impl JobService {
    /// Create a new JobService instance
    pub fn new(pool: Pool<Postgres>, events: EventBus, uploads: UploadStore) -> Self {
        Self { pool, events, uploads }
    }

    /// Create a single job
    ///
    /// # Business Logic
    /// - Stores the uploaded image, if any, under the uploads directory,
    ///   removing it again when the insert fails
    /// - Resolves `cities` and the legacy `city`
    /// - Generates a job code when none is supplied
    /// - Publishes `jobAdded`
    pub async fn create_job(&self, job: NewJob, image: Option<TempFile>) -> Result<JobRow, ServiceError> {
        let status = match job.status.as_deref() {
            Some(raw) => raw.trim().parse::<JobStatus>().map_err(ServiceError::ValidationError)?,
            None => JobStatus::Pending,
        };

        let uploaded = match image {
            Some(image) => self.uploads.save(image).await?,
            None => None,
        };
        let image_url = uploaded
            .clone()
            .or(job.image_url)
            .unwrap_or_default();

        let (cities, city) = resolve_cities(job.cities, job.city.as_deref());
        let (date, time) = display_timestamp();

        let draft = JobDraft {
            id: Uuid::new_v4(),
            job_id: job.job_id.unwrap_or_else(generate_job_code),
            category: job.category,
            sub_service: job.sub_service,
            description: job.description,
            requirement: job.requirement,
            image_url,
            price: job.price.unwrap_or(0.0),
            cities,
            city,
            status,
            date: job.date.unwrap_or(date),
            time: job.time.unwrap_or(time),
        };

        info!("Service: Creating job {} for cities {:?}", draft.job_id, draft.cities);
        let created = match JobRepository::create(&self.pool, &draft).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(path) = uploaded {
                    self.uploads.discard(&path).await;
                }
                return Err(e.into());
            }
        };
        info!("Service: Job created successfully with id={}", created.id);

        self.events.publish(Event::JobAdded(created.clone()));
        Ok(created)
    }

    /// Bookings and jobs passing the caller's location scope and status
    ///
    /// `location` is `None` for callers without a provider identity.
    pub async fn list(
        &self,
        location: Option<LocationPredicate>,
        status: Option<&str>,
    ) -> Result<ListingsResponse, ServiceError> {
        let filter = ListingFilter::new(location, status);
        let bookings = read_bookings(&self.pool, &filter).await?;
        let jobs = JobRepository::list(&self.pool, &filter).await?;

        info!(
            "Service: Listed {} bookings and {} jobs (scoped={}, status={:?})",
            bookings.len(),
            jobs.len(),
            filter.location.is_some(),
            filter.status
        );
        Ok(ListingsResponse { bookings, jobs })
    }

    /// Booking with this id, else job with this id
    pub async fn get(&self, id: Uuid) -> Result<Listing, ServiceError> {
        if let Some(booking) = read_booking(&self.pool, id).await? {
            return Ok(Listing::Booking(booking));
        }
        JobRepository::find(&self.pool, id)
            .await?
            .map(Listing::Job)
            .ok_or_else(|| ServiceError::NotFound("Not found".to_string()))
    }

    /// Set the status of a booking or job. A job's display date and time
    /// are refreshed as well.
    pub async fn update_status(&self, id: Uuid, raw_status: &str) -> Result<Listing, ServiceError> {
        let status = raw_status
            .trim()
            .parse::<JobStatus>()
            .map_err(|_| ServiceError::ValidationError("Invalid status value".to_string()))?;

        if let Some(booking) = BookingRepository::update_status(&self.pool, id, status).await? {
            info!("Service: Booking {} status set to {}", id, status);
            self.events.publish(Event::BookingUpdated(booking.clone()));
            return Ok(Listing::Booking(BookingView::from(booking)));
        }

        let (date, time) = display_timestamp();
        let job = JobRepository::update_status(&self.pool, id, status, &date, &time)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking/Job not found".to_string()))?;

        info!("Service: Job {} status set to {}", id, status);
        self.events.publish(Event::JobUpdated {
            job: job.clone(),
            previous: None,
        });
        Ok(Listing::Job(job))
    }

    /// Add a city to a job unless one with the same area key is present
    pub async fn add_city(&self, id: Uuid, raw_city: &str) -> Result<JobRow, ServiceError> {
        let city = validated_city(raw_city)?;
        let previous = self.resolve_job(id).await?;
        let mut job = previous.clone();

        if cities::add_city(&mut job.cities, &mut job.city, city) {
            info!("Service: Added city {:?} to job {}", city, job.id);
        } else {
            info!("Service: City {:?} already on job {}", city, job.id);
        }
        self.save_locations(job, previous).await
    }

    /// Remove every city with the same area key from a job
    pub async fn remove_city(&self, id: Uuid, raw_city: &str) -> Result<JobRow, ServiceError> {
        let city = validated_city(raw_city)?;
        let previous = self.resolve_job(id).await?;
        let mut job = previous.clone();

        if cities::remove_city(&mut job.cities, &mut job.city, city) {
            info!("Service: Removed city {:?} from job {}", city, job.id);
        } else {
            info!("Service: City {:?} not on job {}", city, job.id);
        }
        self.save_locations(job, previous).await
    }

    /// Delete a booking, else a job
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if let Some(booking) = BookingRepository::delete(&self.pool, id).await? {
            info!("Service: Booking {} deleted", id);
            self.events.publish(Event::BookingDeleted(booking));
            return Ok(());
        }

        let job = JobRepository::delete(&self.pool, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking/Job not found".to_string()))?;
        info!("Service: Job {} deleted", id);
        self.events.publish(Event::JobDeleted(job));
        Ok(())
    }

    /// The job itself, or the job a booking with this id was made against.
    async fn resolve_job(&self, id: Uuid) -> Result<JobRow, ServiceError> {
        if let Some(job) = JobRepository::find(&self.pool, id).await? {
            return Ok(job);
        }

        let service_id = match BookingRepository::find(&self.pool, id).await {
            Ok(booking) => booking.and_then(|b| b.service_id),
            Err(e) => {
                warn!("Booking lookup for job {} failed: {}", id, e);
                None
            }
        };
        let job = match service_id {
            Some(job_id) => JobRepository::find(&self.pool, job_id).await?,
            None => None,
        };
        job.ok_or_else(|| {
            ServiceError::NotFound("Job not found; pass a Job id or a Booking referencing a Job".to_string())
        })
    }

    async fn save_locations(&self, job: JobRow, previous: JobRow) -> Result<JobRow, ServiceError> {
        let saved = JobRepository::save_locations(&self.pool, job.id, &job.cities, &job.city)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job not found".to_string()))?;
        self.events.publish(Event::JobUpdated {
            job: saved.clone(),
            previous: Some(Box::new(previous)),
        });
        Ok(saved)
    }
}

/// Trimmed city with a usable area key.
fn validated_city(raw: &str) -> Result<&str, ServiceError> {
    let city = raw.trim();
    if city.is_empty() {
        return Err(ServiceError::ValidationError("city is required in request body".to_string()));
    }
    if normalize_area(city).is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "city {:?} does not name a location",
            city
        )));
    }
    Ok(city)
}

/// Date and time as shown to users, e.g. "18/10/2026" and "2:05:09 pm".
fn display_timestamp() -> (String, String) {
    let now = Local::now();
    (
        now.format("%-d/%-m/%Y").to_string(),
        now.format("%-I:%M:%S %P").to_string(),
    )
}

/// `JOB-<base36 millis>-<1000..=9999>`
fn generate_job_code() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix = rand::thread_rng().gen_range(1000..=9999);
    format!("JOB-{}-{}", to_base36(millis), suffix)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;
    use std::io::Write;

    #[test]
    fn base36_matches_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn generated_job_code_has_prefix_and_four_digit_suffix() {
        let code = generate_job_code();
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "JOB");
        let suffix: u32 = parts[2].parse().unwrap();
        assert!((1000..=9999).contains(&suffix));
    }

    #[test]
    fn blank_or_noise_city_is_rejected() {
        assert!(matches!(validated_city("   "), Err(ServiceError::ValidationError(_))));
        assert!(matches!(validated_city("(400001)"), Err(ServiceError::ValidationError(_))));
        assert_eq!(validated_city("  Pune ").unwrap(), "Pune");
    }

    #[test]
    fn display_timestamp_uses_day_month_year() {
        let (date, time) = display_timestamp();
        assert_eq!(date.split('/').count(), 3);
        assert!(time.ends_with("am") || time.ends_with("pm"));
    }

    fn service_with_uploads(pool: PgPool) -> (JobService, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("job-service-{}", Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        (JobService::new(pool, EventBus::new(8), UploadStore::new(&dir)), dir)
    }

    #[sqlx::test]
    async fn failed_insert_discards_the_uploaded_image(pool: PgPool) {
        let (service, dir) = service_with_uploads(pool);
        let first = NewJob {
            job_id: Some("JOB-DUP".to_string()),
            city: Some("Pune".to_string()),
            ..Default::default()
        };
        service.create_job(first, None).await.unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"jpeg").unwrap();
        let image = TempFile {
            file,
            content_type: None,
            file_name: Some("sink.jpg".to_string()),
            size: 4,
        };
        let duplicate = NewJob {
            job_id: Some("JOB-DUP".to_string()),
            ..Default::default()
        };
        let err = service.create_job(duplicate, Some(image)).await.unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[sqlx::test]
    async fn city_change_event_carries_the_previous_job(pool: PgPool) {
        let (service, dir) = service_with_uploads(pool);
        let job = NewJob {
            city: Some("Pune".to_string()),
            ..Default::default()
        };
        let created = service.create_job(job, None).await.unwrap();

        let mut events = service.events.subscribe();
        let moved = service.remove_city(created.id, "pune").await.unwrap();
        assert!(moved.cities.is_empty());

        match events.recv().await.unwrap() {
            Event::JobUpdated { job, previous } => {
                assert!(job.cities.is_empty());
                assert_eq!(previous.map(|p| p.cities.clone()), Some(vec!["Pune".to_string()]));
            }
            other => panic!("unexpected event {}", other.name()),
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
