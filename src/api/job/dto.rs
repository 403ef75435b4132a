use serde::Serialize;

use crate::db::models::{BookingView, JobRow};

/// A record addressed by id on `/api/jobs/{id}`: either a job or a booking.
/// Serializes as `{"job": {...}}` or `{"booking": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Listing {
    Job(JobRow),
    Booking(BookingView),
}

/// Response for single job creation
#[derive(Serialize)]
pub struct JobResponse {
    pub job: JobRow,
}

/// Bookings and jobs visible to the caller
#[derive(Serialize)]
pub struct ListingsResponse {
    pub bookings: Vec<BookingView>,
    pub jobs: Vec<JobRow>,
}

/// Response for a mutation on a job or booking
#[derive(Serialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub listing: Listing,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::fixtures::{booking, job};

    #[test]
    fn listing_is_keyed_by_kind() {
        let as_job = serde_json::to_value(Listing::Job(job(&["Pune"], "pending"))).unwrap();
        assert!(as_job.get("job").is_some());
        assert!(as_job.get("booking").is_none());

        let as_booking =
            serde_json::to_value(Listing::Booking(booking("Pune", "pending").into())).unwrap();
        assert_eq!(as_booking["booking"]["city"], "Pune");
        assert!(as_booking["booking"].get("customer").is_none());
    }

    #[test]
    fn mutation_response_flattens_the_record_key() {
        let response = MutationResponse {
            success: true,
            listing: Listing::Job(job(&["Delhi"], "completed")),
        };
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["job"]["status"], "completed");
    }
}
