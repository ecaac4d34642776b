use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP GET failed: {0}")]
    HttpGet(String),
    #[error("HTTP POST failed: {0}")]
    HttpPost(String),
    #[error("failed to read response body: {0}")]
    ResponseBody(String),
    #[error("esplora returned an unparseable txid: {0}")]
    InvalidTxid(String),
    #[error("esplora has no fee estimate for target {0}")]
    MissingFeeTarget(u16),
    #[error("backend is configured for {expected}, asked about {got}")]
    NetworkMismatch { expected: String, got: String },
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for sendkit_core::Error {
    fn from(e: Error) -> Self {
        sendkit_core::Error::Backend(Box::new(e))
    }
}
