//! Content client for the headless CMS
//!
//! [`ContentSource`] is the seam between the pages and the content API.
//! [`PrismicClient`] implements it over HTTP; tests substitute mock servers
//! or in-memory sources.

mod client;
mod error;
mod model;

#[cfg(test)]
pub(crate) mod testing;

pub use client::PrismicClient;
pub use error::CmsError;
pub use model::{
    parse_timestamp, ApiDescriptor, ApiRef, ContentSection, Document, ImageField, PostData,
    SearchResponse,
};

use async_trait::async_trait;

/// Read access to published documents
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// First page of documents of `document_type`, `page_size` per page
    async fn query(&self, document_type: &str, page_size: usize)
        -> Result<SearchResponse, CmsError>;

    /// The document of `document_type` with the given uid
    ///
    /// Fails with [`CmsError::NotFound`] when no such document exists.
    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Document, CmsError>;

    /// Fetch the page a pagination cursor points at
    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, CmsError>;
}
