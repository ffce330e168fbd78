//! Error types for vidya.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidyaError {
    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("Remote service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Agent timed out after {0} ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VidyaError {
    /// Whether a remote call that failed with this error is worth repeating.
    ///
    /// Only rate limiting and transient server-side statuses qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VidyaError::Http {
                status: 429 | 500 | 502 | 503 | 504,
                ..
            }
        )
    }

    /// Delay requested by the server via a `retry-after` hint in the body, in ms.
    pub fn retry_after_ms(&self) -> Option<u64> {
        let VidyaError::Http { body, .. } = self else {
            return None;
        };
        let lower = body.to_lowercase();
        let pos = lower.find("retry-after")?;
        lower[pos..]
            .split(|c: char| !c.is_ascii_digit())
            .find(|part| !part.is_empty())
            .and_then(|secs| secs.parse::<u64>().ok())
            .map(|secs| secs * 1000)
    }
}

pub type Result<T> = std::result::Result<T, VidyaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            let err = VidyaError::Http {
                status,
                body: String::new(),
            };
            assert!(err.is_retryable(), "{status} should be retryable");
        }
        let unauthorized = VidyaError::Http {
            status: 401,
            body: "bad key".into(),
        };
        assert!(!unauthorized.is_retryable());
        assert!(!VidyaError::Remote("connection refused".into()).is_retryable());
        assert!(!VidyaError::Timeout(100).is_retryable());
    }

    #[test]
    fn retry_after_is_parsed_from_body() {
        let err = VidyaError::Http {
            status: 429,
            body: "Too Many Requests, Retry-After: 5".into(),
        };
        assert_eq!(err.retry_after_ms(), Some(5000));

        let none = VidyaError::Http {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(none.retry_after_ms(), None);
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            VidyaError::Timeout(250).to_string(),
            "Agent timed out after 250 ms"
        );
        assert_eq!(
            VidyaError::UnknownAgent("ghost".into()).to_string(),
            "Unknown agent: ghost"
        );
    }
}
