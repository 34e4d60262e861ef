//! Blocking page fetches over a shared async client.
//!
//! Uses async reqwest on a shared tokio runtime, but presents a sync
//! interface so worker threads can call it directly.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whole-request timeout (headers + body)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("bettificator/", env!("CARGO_PKG_VERSION"));

/// HTTP failure with optional status code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(s) => write!(f, "HTTP {s}: {}", self.message),
            None => write!(f, "HTTP error: {}", self.message),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// GET `url` and return the body as text. Non-2xx statuses are errors.
pub fn fetch_text(url: &str) -> Result<String, HttpError> {
    SHARED_RUNTIME.handle().block_on(async {
        let response = SHARED_CLIENT
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| HttpError::from_reqwest(&e))?;
        response
            .text()
            .await
            .map_err(|e| HttpError::from_reqwest(&e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_status() {
        let err = HttpError {
            status: Some(503),
            message: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
        assert!(!err.is_not_found());
    }

    #[test]
    fn display_without_status() {
        let err = HttpError {
            status: None,
            message: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn not_found() {
        let err = HttpError {
            status: Some(404),
            message: "gone".into(),
        };
        assert!(err.is_not_found());
    }

    #[test]
    #[ignore]
    fn fetch_unreachable_host_fails() {
        let err = fetch_text("http://127.0.0.1:9/").unwrap_err();
        assert!(err.status.is_none());
    }
}
