use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid date `{0}`, expected MM/DD/YYYY")]
    InvalidDate(String),

    #[error("date range ends ({end}) before it starts ({start})")]
    InvalidRange { start: String, end: String },

    #[error("upstream returned {status}")]
    Upstream { status: u16 },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid upstream url: {0}")]
    InvalidUpstream(#[from] url::ParseError),
}
