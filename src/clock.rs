//! Clock collaborator
//!
//! Audit stamping reads the current time through this seam so the
//! transition logic stays deterministic under test.

use chrono::{DateTime, SecondsFormat, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time as an ISO-8601 string with the UTC `Z` designator,
    /// the form every `date_*` attribute is stored in.
    fn now_stamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Wall-clock implementation used by the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
