use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "Environment variables MG_OLD_MAIL_DOMAIN, MG_NEW_MAIL_DOMAIN, and MG_API_KEY are required. \
         Current values:\nMG_OLD_MAIL_DOMAIN: {old_domain}\nMG_NEW_MAIL_DOMAIN: {new_domain}\nMG_API_KEY: {api_key}"
    )]
    MissingConfig {
        old_domain: String,
        new_domain: String,
        api_key: String,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response message: expected {expected:?}, got {actual:?}")]
    UnexpectedMessage { expected: String, actual: String },

    #[error("Rate limited. Try again later.")]
    RateLimited,

    #[error("Server error: {0}")]
    Server(String),
}

pub type Result<T> = std::result::Result<T, Error>;
