use thiserror::Error;

/// Failures while downloading or reading job board pages.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} returned status {status}")]
    Fetch { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unrecognised date placed: {fragment:?}")]
    DateFormat { fragment: String },
}

/// Failures talking to the chat completions service.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}
