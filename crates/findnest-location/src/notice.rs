use chrono::{DateTime, Utc};

use crate::error::LocationError;

/// A user-visible, non-fatal message for the hosting form (e.g. an inline
/// "location not found" hint).
#[derive(Debug, Clone)]
pub struct Notice {
    pub error: LocationError,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub(crate) fn new(error: LocationError) -> Self {
        Self {
            error,
            raised_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.raised_at.format("%H:%M:%S"), self.error)
    }
}
