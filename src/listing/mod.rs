//! Listing page state
//!
//! The listing starts from the first page of posts and grows by following the
//! pagination cursor. Pages are appended in arrival order without
//! de-duplication; the cursor only ever moves forward.

use crate::cms::{CmsError, ContentSource, SearchResponse};
use crate::format::{Formatter, PostSummary};

/// State transitions of the listing
#[derive(Debug, Clone, PartialEq)]
pub enum ListingAction {
    /// Append posts after the ones already shown
    AppendPage(Vec<PostSummary>),
    /// Replace the cursor; `None` exhausts the listing
    SetCursor(Option<String>),
}

/// Posts shown so far plus the cursor to the next page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingState {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
}

impl ListingState {
    /// Initial state from the first page of results
    pub fn from_first_page(page: &SearchResponse, formatter: &Formatter) -> Self {
        let mut state = Self::default();
        state.apply_page(page, formatter);
        state
    }

    /// Apply one action
    pub fn apply(&mut self, action: ListingAction) {
        match action {
            ListingAction::AppendPage(posts) => self.posts.extend(posts),
            ListingAction::SetCursor(cursor) => {
                self.next_page = cursor.filter(|c| !c.trim().is_empty());
            }
        }
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Whether the "load more" control is shown
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Fetch the page behind the cursor and append it
    ///
    /// Returns `Ok(false)` when the listing is already exhausted. On error
    /// the state is left unchanged.
    pub async fn load_more(
        &mut self,
        source: &dyn ContentSource,
        formatter: &Formatter,
    ) -> Result<bool, CmsError> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(false);
        };

        tracing::debug!("Loading more posts from {}", cursor);
        let page = source.fetch_page(cursor).await?;
        self.apply_page(&page, formatter);
        Ok(true)
    }

    fn apply_page(&mut self, page: &SearchResponse, formatter: &Formatter) {
        let posts = page.results.iter().map(|d| formatter.summary(d)).collect();
        self.apply(ListingAction::AppendPage(posts));
        self.apply(ListingAction::SetCursor(page.next_page.clone()));
    }
}
