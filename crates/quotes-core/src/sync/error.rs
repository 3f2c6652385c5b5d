//! Sync errors

use thiserror::Error;

/// Errors that abort a sync attempt
///
/// None of these touch local state; the next scheduled sync simply
/// tries again.
#[derive(Error, Debug)]
pub enum SyncError {
    /// HTTP client could not be built
    #[error("Failed to set up sync client: {0}")]
    Client(String),

    /// Request could not be sent or the connection failed
    #[error("Failed to reach sync server ({url}): {message}")]
    Request { url: String, message: String },

    /// Request took longer than the configured timeout
    #[error("Sync server ({url}) did not respond in time")]
    Timeout { url: String },

    /// Server answered with a non-success status
    #[error("Server responded with {status} ({url})")]
    Status { url: String, status: u16 },

    /// Response body was not the expected shape
    #[error("Unexpected response from sync server ({url}): {message}")]
    Decode { url: String, message: String },
}

impl SyncError {
    /// Classify a reqwest failure for `url`
    pub fn from_reqwest(error: reqwest::Error, url: &str) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            SyncError::Timeout { url }
        } else if let Some(status) = error.status() {
            SyncError::Status {
                url,
                status: status.as_u16(),
            }
        } else if error.is_decode() {
            SyncError::Decode {
                url,
                message: error.to_string(),
            }
        } else {
            SyncError::Request {
                url,
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = SyncError::Status {
            url: "http://example.com/posts".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "Server responded with 503 (http://example.com/posts)"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = SyncError::Timeout {
            url: "http://example.com".to_string(),
        };
        assert!(err.to_string().contains("did not respond in time"));
    }
}
