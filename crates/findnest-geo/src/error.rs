use thiserror::Error;

/// Errors returned by the FindNest API and style clients.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The service answered but has no match for the query.
    #[error("no result for {query}")]
    NotFound { query: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The body parsed but its content is unusable (e.g. out-of-range coordinates).
    #[error("invalid payload from {context}: {reason}")]
    InvalidPayload { context: String, reason: String },
}

impl GeoError {
    /// Network failures, timeouts and 5xx responses are transient.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            GeoError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            GeoError::UnexpectedStatus { status, .. } => *status >= 500,
            GeoError::Deserialize { .. }
            | GeoError::NotFound { .. }
            | GeoError::InvalidBaseUrl { .. }
            | GeoError::InvalidPayload { .. } => false,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, GeoError::Http(e) if e.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retriable() {
        let err = GeoError::UnexpectedStatus {
            status: 503,
            url: "http://x/location/route".to_owned(),
        };
        assert!(err.is_retriable());
    }

    #[test]
    fn client_errors_are_not_retriable() {
        let err = GeoError::UnexpectedStatus {
            status: 400,
            url: "http://x/ai/search".to_owned(),
        };
        assert!(!err.is_retriable());
        assert!(!GeoError::NotFound {
            query: "nowhere".to_owned()
        }
        .is_retriable());
    }
}
