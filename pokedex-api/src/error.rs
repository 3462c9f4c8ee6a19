//! Errors returned by `PokedexClient`
//!
use snafu::prelude::*;

/// Errors returned by pokedex crate
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PokedexError {
    // Http connection or timeout error
    #[snafu(display("HTTP error {method} url:{url}"))]
    Http {
        method: String,
        url: String,
        source: reqwest::Error,
    },

    /// Server responded with an error status.
    #[snafu(display("Api Server reported error ({code}) {method} {url}: {message}"))]
    ApiError {
        code: u16,
        method: String,
        url: String,
        message: String,
    },

    /// Requested resource does not exist (http 404 or 410).
    #[snafu(display("{kind} {key} not found"))]
    NotFound { kind: String, key: String },

    /// Too many requests occurred.
    ///
    /// When the server responds with http 429, the http client waits for the
    /// duration in the rate-limit headers and retries, up to `rate_limit_max_retries`
    /// times, before giving up and returning this error.
    /// If `rate_limit_max_retries` is zero, the http client will always wait and retry.
    #[snafu(display("Rate limit exceeded: \"{header}\" (parsed wait_time: {} secs)", duration.as_secs()))]
    RateLimitExceeded {
        header: String,
        duration: std::time::Duration,
    },

    /// Deserialization error. The server response did not have the expected shape.
    #[snafu(display("Deserialization at {path}: {source}"))]
    Deserialization {
        path: String,
        source: serde_json::Error,
    },

    /// A reference that can't be fetched, such as an empty string.
    #[snafu(display("Invalid reference '{reference}'"))]
    InvalidReference { reference: String },

    /// A detail record's id disagrees with the id encoded in its reference.
    #[snafu(display("Detail for {reference} has id {actual}, expected {expected}"))]
    InconsistentDetail {
        reference: String,
        expected: u32,
        actual: u32,
    },

    /// Page number outside `1..=total_pages`.
    #[snafu(display("Page {requested} out of range (1..={total_pages})"))]
    PageOutOfRange { requested: usize, total_pages: usize },

    /// Some other error occurred
    #[snafu(display("{message}"))]
    Other { message: String },
}

impl PokedexError {
    /// Returns true for failures that may succeed if the request is repeated:
    /// transport errors, rate limiting, and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::RateLimitExceeded { .. } => true,
            Self::ApiError { code, .. } => *code >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PokedexError;

    #[test]
    fn transient_classification() {
        let server = PokedexError::ApiError {
            code: 503,
            method: "GET".into(),
            url: "/pokemon".into(),
            message: String::new(),
        };
        assert!(server.is_transient());

        let missing = PokedexError::NotFound {
            kind: "pokemon".into(),
            key: "99999".into(),
        };
        assert!(!missing.is_transient());
        assert_eq!(missing.to_string(), "pokemon 99999 not found");
    }

    #[test]
    fn page_out_of_range_message() {
        let err = PokedexError::PageOutOfRange {
            requested: 6,
            total_pages: 5,
        };
        assert_eq!(err.to_string(), "Page 6 out of range (1..=5)");
    }
}
