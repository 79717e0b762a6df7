use thiserror::Error;

pub type Result<T> = std::result::Result<T, OracleError>;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} error {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unexpected response: {0}")]
    Response(String),

    #[error("Model did not return valid JSON: {0}")]
    InvalidJson(String),

    #[error("AI request failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<OracleError>,
    },

    #[error("{0}")]
    Other(String),
}
