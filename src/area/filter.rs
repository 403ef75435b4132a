use sqlx::{Postgres, QueryBuilder};
use std::collections::BTreeSet;

use super::normalize::{normalize_area, parse_service_areas};
use crate::api::job::models::JobStatus;

/// A record that carries location fields a provider can be matched against.
///
/// Bookings have a single city and report no `cities`.
pub trait Located {
    fn cities(&self) -> &[String];
    fn city(&self) -> &str;
    fn status(&self) -> &str;
}

/// Which locations a provider may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationPredicate {
    /// No usable area keys: nothing location-scoped is visible.
    MatchNothing,
    /// Records whose normalized location equals one of these keys.
    AnyOf(BTreeSet<String>),
}

impl LocationPredicate {
    /// Build the predicate for a set of area keys. Empty keys are discarded
    /// and an empty set matches nothing, so an unconfigured provider sees
    /// no jobs rather than all of them.
    pub fn for_areas(keys: BTreeSet<String>) -> Self {
        let keys: BTreeSet<String> = keys.into_iter().filter(|key| !key.is_empty()).collect();
        if keys.is_empty() {
            LocationPredicate::MatchNothing
        } else {
            LocationPredicate::AnyOf(keys)
        }
    }

    /// Predicate for a provider's raw `serviceArea` field.
    pub fn for_service_area(service_area: &str) -> Self {
        Self::for_areas(parse_service_areas(service_area))
    }

    fn key_matches(keys: &BTreeSet<String>, raw: &str) -> bool {
        let key = normalize_area(raw);
        !key.is_empty() && keys.contains(&key)
    }

    /// In-memory evaluation: any of `cities` OR the legacy `city`.
    pub fn admits<R: Located + ?Sized>(&self, record: &R) -> bool {
        match self {
            LocationPredicate::MatchNothing => false,
            LocationPredicate::AnyOf(keys) => {
                record.cities().iter().any(|c| Self::key_matches(keys, c))
                    || Self::key_matches(keys, record.city())
            }
        }
    }

    fn bound_keys(keys: &BTreeSet<String>) -> Vec<String> {
        keys.iter().cloned().collect()
    }
}

/// Statuses a listing may be narrowed to. `active` and `inactive` are
/// valid job statuses but not listing filters.
pub fn status_filter(raw: Option<&str>) -> Option<JobStatus> {
    let status = raw?.trim().parse::<JobStatus>().ok()?;
    status.is_listing_filter().then_some(status)
}

/// Everything a listing query is narrowed by.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// `None` leaves the listing unscoped (no provider identity).
    pub location: Option<LocationPredicate>,
    pub status: Option<JobStatus>,
}

impl ListingFilter {
    pub fn new(location: Option<LocationPredicate>, status: Option<&str>) -> Self {
        Self {
            location,
            status: status_filter(status),
        }
    }

    pub fn admits<R: Located + ?Sized>(&self, record: &R) -> bool {
        let location_ok = self
            .location
            .as_ref()
            .map_or(true, |predicate| predicate.admits(record));
        let status_ok = self
            .status
            .map_or(true, |status| record.status().eq_ignore_ascii_case(status.as_str()));
        location_ok && status_ok
    }

    /// Append `AND ...` conditions for the `jobs` table.
    ///
    /// Matches against the stored `city_keys`/`city_key` columns, which
    /// hold [`normalize_area`] output written alongside the cities. The
    /// builder must already hold a `WHERE` clause.
    pub fn push_job_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match &self.location {
            None => {}
            Some(LocationPredicate::MatchNothing) => {
                qb.push(" AND FALSE");
            }
            Some(LocationPredicate::AnyOf(keys)) => {
                qb.push(" AND (city_keys && ");
                qb.push_bind(LocationPredicate::bound_keys(keys));
                qb.push(" OR city_key = ANY(");
                qb.push_bind(LocationPredicate::bound_keys(keys));
                qb.push("))");
            }
        }
        if let Some(status) = self.status {
            qb.push(" AND lower(status) = ");
            qb.push_bind(status.as_str());
        }
    }
}
