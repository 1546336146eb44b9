//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp carried by events and error bodies.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
