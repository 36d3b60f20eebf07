use std::time::Duration;

/// Terminal failures for one research request.
///
/// Every variant carries a message that is safe to show to the caller; API
/// keys never appear in any of them.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    /// The question was missing or blank.
    #[error("{0}")]
    Input(String),

    /// The search provider returned no URLs.
    #[error("no search results found")]
    NoResults,

    /// Every fetch failed or was filtered out.
    #[error("no data could be scraped")]
    NoDataScraped,

    /// The language model call failed.
    #[error("language model service failed: {0}")]
    Llm(#[source] ServiceError),

    /// The caller went away before an answer was produced.
    #[error("request cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Why a single page could not be fetched. Logged, never surfaced.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected status code {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure talking to an external HTTP service (search or language model).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("response contained no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Http(err.to_string())
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_terminal_errors() {
        assert_eq!(ResearchError::NoResults.to_string(), "no search results found");
        assert_eq!(
            ResearchError::NoDataScraped.to_string(),
            "no data could be scraped"
        );
        assert_eq!(ResearchError::Cancelled.to_string(), "request cancelled");
        assert_eq!(
            ResearchError::Input("No question provided".into()).to_string(),
            "No question provided"
        );
    }

    #[test]
    fn display_llm_error_includes_cause() {
        let err = ResearchError::Llm(ServiceError::Status {
            status: 429,
            body: "quota exceeded".into(),
        });
        assert_eq!(
            err.to_string(),
            "language model service failed: service returned 429: quota exceeded"
        );
    }

    #[test]
    fn display_fetch_errors() {
        assert_eq!(
            FetchError::Timeout(Duration::from_secs(10)).to_string(),
            "timed out after 10s"
        );
        assert_eq!(FetchError::Status(404).to_string(), "unexpected status code 404");
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResearchError>();
        assert_send_sync::<FetchError>();
        assert_send_sync::<ServiceError>();
    }
}
