//! Fixtures shared by tests across the crate

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::{CmsError, ContentSource, Document, SearchResponse};

/// API descriptor with a single master ref
pub fn api_json(master_ref: &str) -> Value {
    json!({
        "refs": [{"id": "master", "ref": master_ref, "label": "Master", "isMasterRef": true}],
        "types": {"post": "Post"}
    })
}

/// A post document with one content section
pub fn document_json(uid: &str, title: &str, published: Option<&str>) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "post",
        "first_publication_date": published,
        "last_publication_date": published,
        "data": {
            "title": title,
            "subtitle": format!("About {}", title),
            "author": "Joseph Oliveira",
            "banner": {"url": format!("https://images.prismic.io/{}.png", uid)},
            "content": [{
                "heading": "Introduction",
                "body": [{"type": "paragraph", "text": format!("{} body text", title), "spans": []}]
            }]
        }
    })
}

/// Pagination envelope around `results`
pub fn search_json(results: Vec<Value>, next_page: Option<&str>) -> Value {
    let size = results.len();
    json!({
        "page": 1,
        "results_per_page": size,
        "results_size": size,
        "total_results_size": size,
        "total_pages": 1,
        "next_page": next_page,
        "prev_page": null,
        "results": results
    })
}

pub fn document(uid: &str, title: &str, published: Option<&str>) -> Document {
    serde_json::from_value(document_json(uid, title, published)).unwrap()
}

pub fn page(results: Vec<Document>, next_page: Option<&str>) -> SearchResponse {
    SearchResponse {
        page: 1,
        results_per_page: results.len() as u32,
        total_results_size: results.len() as u32,
        total_pages: 1,
        next_page: next_page.map(str::to_string),
        prev_page: None,
        results,
    }
}

/// In-memory content source
///
/// `first_page` answers `query`, `pages` answers cursor fetches, and
/// `documents` answers uid lookups. When `gate` is set, uid lookups wait for
/// a permit before answering; `fail_lookups` makes them fail with a 503.
#[derive(Default)]
pub struct FakeSource {
    pub first_page: Option<SearchResponse>,
    pub pages: HashMap<String, SearchResponse>,
    pub documents: Vec<Document>,
    pub gate: Option<Arc<Semaphore>>,
    pub fail_lookups: bool,
    pub lookups: AtomicUsize,
}

impl FakeSource {
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn query(
        &self,
        _document_type: &str,
        _page_size: usize,
    ) -> Result<SearchResponse, CmsError> {
        Ok(self
            .first_page
            .clone()
            .unwrap_or_else(|| page(self.documents.clone(), None)))
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Document, CmsError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.fail_lookups {
            return Err(CmsError::Status {
                url: format!("fake://{}", uid),
                status: 503,
            });
        }
        self.documents
            .iter()
            .find(|d| d.uid == uid)
            .cloned()
            .ok_or_else(|| CmsError::NotFound {
                document_type: document_type.to_string(),
                uid: uid.to_string(),
            })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse, CmsError> {
        self.pages.get(cursor).cloned().ok_or_else(|| CmsError::Status {
            url: cursor.to_string(),
            status: 404,
        })
    }
}
