use chrono::{DateTime, Utc};

use crate::session::SessionContext;

/// Per-session minimum interval between accepted submissions of one kind.
pub struct SubmissionThrottle {
    key: String,
    min_interval_secs: u64,
}

impl SubmissionThrottle {
    pub fn new(kind: &str, min_interval_secs: u64) -> Self {
        Self {
            key: format!("last_{kind}"),
            min_interval_secs,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Admit the submission and record `now`, or return the seconds left to wait.
    /// A rejected attempt leaves the stored timestamp untouched.
    pub fn admit(&self, session: &dyn SessionContext, now: DateTime<Utc>) -> Result<(), u64> {
        if let Some(last) = session.get(&self.key) {
            let elapsed_ms = (now - last).num_milliseconds();
            let interval_ms = (self.min_interval_secs as i64).saturating_mul(1000);

            if elapsed_ms < interval_ms {
                let remaining_ms = interval_ms - elapsed_ms;
                return Err((remaining_ms as u64).div_ceil(1000));
            }
        }

        session.set(&self.key, now);
        Ok(())
    }
}
