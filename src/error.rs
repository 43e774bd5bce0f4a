// Error types for talking to the PriceRunner API.
// Fatal problems (config, file I/O) travel as anyhow::Error; these are the
// recoverable ones the pipeline turns into placeholder rows.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    // Connection failures and timeouts both land here
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status code {0}")]
    Status(StatusCode),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Request(e) if e.is_timeout())
    }
}

/// Why a single offer was left out of the report.
#[derive(Error, Debug, PartialEq)]
pub enum OfferSkip {
    #[error("price amount is missing or not numeric")]
    InvalidPrice,

    #[error("offer has no merchant id")]
    MissingMerchantId,

    #[error("merchant {0} is not present in the merchants mapping")]
    UnknownMerchant(String),
}

pub type FetchResult<T> = Result<T, FetchError>;
