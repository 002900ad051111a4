//! Errors raised at the content API boundary

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No {document_type} document with uid {uid:?}")]
    NotFound { document_type: String, uid: String },

    #[error("API at {0} did not advertise a master ref")]
    MissingMasterRef(String),

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl CmsError {
    /// Whether the error means the requested document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CmsError::NotFound { .. })
    }
}
