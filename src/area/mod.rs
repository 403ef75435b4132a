//! Location matching between providers and jobs/bookings.
//!
//! Free-text locations are reduced to area keys with [`normalize_area`];
//! a provider sees a record only when one of its area keys equals the key
//! of one of the record's cities.

pub mod cities;
pub mod filter;
pub mod normalize;

pub use filter::{Located, ListingFilter, LocationPredicate};
pub use normalize::{area_keys, normalize_area};
