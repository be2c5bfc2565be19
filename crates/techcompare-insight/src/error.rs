use thiserror::Error;

/// Failure of a narrative call. The orchestrator treats every variant as
/// "no summary"; none of them abort a comparison.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("narrative provider misconfigured: {0}")]
    Config(String),

    #[error("narrative request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("narrative response malformed: {0}")]
    InvalidResponse(String),

    #[error("{provider} returned no summary text")]
    EmptySummary { provider: &'static str },

    #[error("narrative API returned status {status}: {body}")]
    Api { status: u16, body: String },
}
