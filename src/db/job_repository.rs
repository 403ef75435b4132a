use sqlx::{Pool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::api::job::models::{JobDraft, JobStatus};
use crate::area::{area_keys, normalize_area, ListingFilter};
use crate::db::models::JobRow;

const JOB_COLUMNS: &str = "id, job_id, category, sub_service, description, requirement, image_url, \
     price, cities, city, status, date, time, created_at, updated_at";

/// Repository for Job database operations
///
/// Every write of `cities`/`city` also writes their area keys, so the
/// store never derives keys itself.
pub struct JobRepository;

/// `(city_keys, city_key)` for a job's locations.
fn location_keys(cities: &[String], city: &str) -> (Vec<String>, String) {
    (area_keys(cities), normalize_area(city))
}

impl JobRepository {
    /// Insert a job and return the full stored record
    pub async fn create(pool: &Pool<Postgres>, job: &JobDraft) -> Result<JobRow, sqlx::Error> {
        debug!(
            "Creating job: job_id={}, cities={:?}, status={}",
            job.job_id, job.cities, job.status
        );

        let (city_keys, city_key) = location_keys(&job.cities, &job.city);
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            INSERT INTO jobs (id, job_id, category, sub_service, description, requirement,
                              image_url, price, cities, city, status, date, time,
                              city_keys, city_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job.id)
        .bind(&job.job_id)
        .bind(&job.category)
        .bind(&job.sub_service)
        .bind(&job.description)
        .bind(&job.requirement)
        .bind(&job.image_url)
        .bind(job.price)
        .bind(&job.cities)
        .bind(&job.city)
        .bind(job.status.as_str())
        .bind(&job.date)
        .bind(&job.time)
        .bind(city_keys)
        .bind(city_key)
        .fetch_one(pool)
        .await?;

        debug!("Job created with id={}", row.id);
        Ok(row)
    }

    /// Jobs passing `filter`, newest first
    pub async fn list(pool: &Pool<Postgres>, filter: &ListingFilter) -> Result<Vec<JobRow>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE TRUE"));
        filter.push_job_conditions(&mut qb);
        qb.push(" ORDER BY created_at DESC");

        debug!("Listing jobs: {}", qb.sql());
        let rows = qb.build_query_as::<JobRow>().fetch_all(pool).await?;
        debug!("Listed {} jobs", rows.len());
        Ok(rows)
    }

    pub async fn find(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite status and the display date/time
    pub async fn update_status(
        pool: &Pool<Postgres>,
        id: Uuid,
        status: JobStatus,
        date: &str,
        time: &str,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        debug!("Updating job {} status to {}", id, status);
        sqlx::query_as::<_, JobRow>(&format!(
            r#"
            UPDATE jobs SET status = $2, date = $3, time = $4, updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(date)
        .bind(time)
        .fetch_optional(pool)
        .await
    }

    /// Persist an edited city list. Last write wins.
    pub async fn save_locations(
        pool: &Pool<Postgres>,
        id: Uuid,
        cities: &[String],
        city: &str,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        debug!("Saving job {} cities={:?} city={:?}", id, cities, city);
        let (city_keys, city_key) = location_keys(cities, city);
        sqlx::query_as::<_, JobRow>(&format!(
            r#"
            UPDATE jobs SET cities = $2, city = $3, city_keys = $4, city_key = $5, updated_at = now()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(cities)
        .bind(city)
        .bind(city_keys)
        .bind(city_key)
        .fetch_optional(pool)
        .await
    }

    /// Derive area keys for jobs stored without them (rows written before
    /// keys existed, or by other tools). Returns the number of rows filled.
    pub async fn backfill_area_keys(pool: &Pool<Postgres>) -> Result<u64, sqlx::Error> {
        let pending = sqlx::query_as::<_, (Uuid, Vec<String>, String)>(
            "SELECT id, cities, city FROM jobs WHERE city_keys IS NULL OR city_key IS NULL",
        )
        .fetch_all(pool)
        .await?;

        let mut filled = 0;
        for (id, cities, city) in pending {
            let (city_keys, city_key) = location_keys(&cities, &city);
            filled += sqlx::query("UPDATE jobs SET city_keys = $2, city_key = $3 WHERE id = $1")
                .bind(id)
                .bind(city_keys)
                .bind(city_key)
                .execute(pool)
                .await?
                .rows_affected();
        }

        debug!("Backfilled area keys for {} jobs", filled);
        Ok(filled)
    }

    /// Delete a job, returning the removed record
    pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
        debug!("Deleting job {}", id);
        sqlx::query_as::<_, JobRow>(&format!("DELETE FROM jobs WHERE id = $1 RETURNING {JOB_COLUMNS}"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::LocationPredicate;
    use sqlx::PgPool;

    fn draft(cities: &[&str], status: JobStatus) -> JobDraft {
        let cities: Vec<String> = cities.iter().map(|c| c.to_string()).collect();
        JobDraft {
            id: Uuid::new_v4(),
            job_id: format!("JOB-{}", Uuid::new_v4().simple()),
            category: "Cleaning".to_string(),
            sub_service: "Deep clean".to_string(),
            description: String::new(),
            requirement: String::new(),
            image_url: String::new(),
            price: 499.0,
            city: cities.first().cloned().unwrap_or_default(),
            cities,
            status,
            date: "18/10/2026".to_string(),
            time: "10:00:00 am".to_string(),
        }
    }

    async fn listed_cities(pool: &PgPool, filter: &ListingFilter) -> Vec<Vec<String>> {
        let mut cities: Vec<Vec<String>> = JobRepository::list(pool, filter)
            .await
            .unwrap()
            .into_iter()
            .map(|job| job.cities)
            .collect();
        cities.sort();
        cities
    }

    fn scoped(service_area: &str, status: Option<&str>) -> ListingFilter {
        ListingFilter::new(Some(LocationPredicate::for_service_area(service_area)), status)
    }

    #[sqlx::test]
    async fn provider_lists_only_jobs_in_its_areas(pool: PgPool) {
        JobRepository::create(&pool, &draft(&["Mumbai"], JobStatus::Pending)).await.unwrap();
        JobRepository::create(&pool, &draft(&["Chennai"], JobStatus::Pending)).await.unwrap();

        let visible = listed_cities(&pool, &scoped("Delhi, Mumbai (110001)", None)).await;
        assert_eq!(visible, vec![vec!["Mumbai".to_string()]]);

        let everything = listed_cities(&pool, &ListingFilter::default()).await;
        assert_eq!(everything.len(), 2);
    }

    #[sqlx::test]
    async fn status_narrows_the_scoped_listing(pool: PgPool) {
        JobRepository::create(&pool, &draft(&["Mumbai"], JobStatus::Pending)).await.unwrap();
        let done = JobRepository::create(&pool, &draft(&["Mumbai"], JobStatus::Completed)).await.unwrap();

        let jobs = JobRepository::list(&pool, &scoped("Mumbai", Some("completed"))).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, done.id);
    }

    #[sqlx::test]
    async fn stored_match_is_anchored_and_empty_areas_see_nothing(pool: PgPool) {
        JobRepository::create(&pool, &draft(&["Navi Mumbai"], JobStatus::Pending)).await.unwrap();
        JobRepository::create(&pool, &draft(&["Mumbai (400001)"], JobStatus::Pending)).await.unwrap();

        let visible = listed_cities(&pool, &scoped("Mumbai", None)).await;
        assert_eq!(visible, vec![vec!["Mumbai (400001)".to_string()]]);

        assert!(listed_cities(&pool, &scoped(" , 400001", None)).await.is_empty());
    }

    #[sqlx::test]
    async fn store_and_memory_agree_on_unicode_spacing(pool: PgPool) {
        let filter = scoped("Mumbai (400001)", None);
        for cities in [&["Mumbai\u{a0}"][..], &["Pune-\u{c}", "Mumbai (4000\n01)"][..], &["Thane (W)"][..]] {
            let job = JobRepository::create(&pool, &draft(cities, JobStatus::Pending)).await.unwrap();
            let listed = JobRepository::list(&pool, &filter)
                .await
                .unwrap()
                .iter()
                .any(|row| row.id == job.id);
            assert_eq!(listed, filter.admits(&job), "cities={:?}", cities);
        }
    }

    #[sqlx::test]
    async fn legacy_city_alone_is_matched(pool: PgPool) {
        let mut legacy = draft(&[], JobStatus::Pending);
        legacy.city = "Pune".to_string();
        JobRepository::create(&pool, &legacy).await.unwrap();

        assert_eq!(listed_cities(&pool, &scoped("Pune", None)).await.len(), 1);
    }

    #[sqlx::test]
    async fn saved_locations_refresh_keys(pool: PgPool) {
        let job = JobRepository::create(&pool, &draft(&["Pune"], JobStatus::Pending)).await.unwrap();
        JobRepository::save_locations(&pool, job.id, &["Delhi".to_string()], "Delhi")
            .await
            .unwrap();

        assert!(listed_cities(&pool, &scoped("Pune", None)).await.is_empty());
        assert_eq!(listed_cities(&pool, &scoped("delhi", None)).await.len(), 1);
    }

    #[sqlx::test]
    async fn rows_without_keys_are_backfilled(pool: PgPool) {
        sqlx::query("INSERT INTO jobs (id, job_id, cities, city) VALUES ($1, 'JOB-legacy', $2, 'Pune (411001)')")
            .bind(Uuid::new_v4())
            .bind(vec!["Pune (411001)".to_string()])
            .execute(&pool)
            .await
            .unwrap();
        assert!(listed_cities(&pool, &scoped("Pune", None)).await.is_empty());

        assert_eq!(JobRepository::backfill_area_keys(&pool).await.unwrap(), 1);
        assert_eq!(listed_cities(&pool, &scoped("Pune", None)).await.len(), 1);
        assert_eq!(JobRepository::backfill_area_keys(&pool).await.unwrap(), 0);
    }
}
