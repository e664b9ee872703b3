//! Transport trait and raw response type.
//!
//! The driver only sees this trait, so the HTTP client can be swapped for a
//! canned-response fake in tests.

use crate::error::PullError;

/// Body and status of one HTTP exchange.
///
/// Non-success statuses are not errors at this layer: the API reports
/// logical failures as a JSON error envelope with a 4xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues exactly one GET per call. No retries, no caching.
pub trait Transport {
    fn get(&self, url: &str) -> Result<RawResponse, PullError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(RawResponse::ok("{}").is_success());
        assert!(RawResponse { status: 204, body: vec![] }.is_success());
        assert!(!RawResponse { status: 404, body: vec![] }.is_success());
        assert!(!RawResponse { status: 301, body: vec![] }.is_success());
    }
}
