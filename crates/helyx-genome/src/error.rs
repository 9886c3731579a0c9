use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenomeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sequence API error [{status}]: {message}")]
    Api { status: u16, message: String },

    #[error("sequence API response has no `dna` field: {0}")]
    MissingSequence(String),

    #[error("egress blocked: {0}")]
    Egress(String),

    #[error("sequence fetch timed out after {0}s")]
    Timeout(u64),
}
