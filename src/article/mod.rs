//! Article resolution
//!
//! Articles are resolved in two phases: the uids enumerated by
//! [`enumerate_paths`] are pre-rendered at build time, and any other uid is
//! resolved lazily by a [`FallbackResolver`] on first request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

use crate::cms::{CmsError, ContentSource};
use crate::format::{Formatter, PostDetail};

/// Outcome of resolving an article on demand
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Article is available
    Ready(Arc<PostDetail>),
    /// Fetch is in flight; show the loading placeholder
    Pending,
    /// No document with this uid
    NotFound,
    /// Fetch failed; the next request starts over
    Failed(String),
}

/// Whether `uid` can name an article route
///
/// Uids are opaque; only values that cannot be a single path segment are
/// rejected.
pub fn is_valid_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && !uid.chars().any(|c| c == '/' || c == '\\' || c.is_control())
}

/// List the uid of every document of `document_type`, following cursors
///
/// At most `max_pages` pages are requested. Uids keep API order; repeats are
/// dropped since each uid maps to a single route.
pub async fn enumerate_paths(
    source: &dyn ContentSource,
    document_type: &str,
    page_size: usize,
    max_pages: usize,
) -> Result<Vec<String>, CmsError> {
    let mut page = source.query(document_type, page_size).await?;
    let mut uids: Vec<String> = Vec::new();
    let mut pages = 1;

    loop {
        for doc in &page.results {
            if !uids.contains(&doc.uid) {
                uids.push(doc.uid.clone());
            }
        }

        let Some(cursor) = page.next_page.as_deref() else {
            break;
        };
        if pages >= max_pages {
            tracing::warn!(
                "Stopped enumerating articles after {} pages; remaining ones render on demand",
                pages
            );
            break;
        }
        page = source.fetch_page(cursor).await?;
        pages += 1;
    }

    Ok(uids)
}

/// Fetch and format one article; `Ok(None)` when it does not exist
pub async fn fetch_article(
    source: &dyn ContentSource,
    formatter: &Formatter,
    document_type: &str,
    uid: &str,
) -> Result<Option<PostDetail>, CmsError> {
    match source.get_by_uid(document_type, uid).await {
        Ok(doc) => Ok(Some(formatter.detail(&doc))),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// How long a settled lookup is remembered when nobody observes it
///
/// Observed Ready and Failed lookups are dropped at once; NotFound ones are
/// answered from memory for this long so unknown uids do not hit the CMS on
/// every request.
pub const SETTLED_TTL: Duration = Duration::from_secs(30);

enum Outcome {
    Ready(Arc<PostDetail>),
    NotFound,
    Failed(String),
}

struct Settled {
    outcome: Outcome,
    at: Instant,
}

type Slot = Arc<OnceCell<Settled>>;

/// Resolves articles that were not pre-rendered
///
/// The first request for a uid starts a background fetch and observes
/// [`Resolution::Pending`]; requests arriving while it runs share that fetch.
pub struct FallbackResolver {
    source: Arc<dyn ContentSource>,
    formatter: Arc<Formatter>,
    document_type: String,
    settled_ttl: Duration,
    entries: Mutex<HashMap<String, Slot>>,
}

impl FallbackResolver {
    pub fn new(
        source: Arc<dyn ContentSource>,
        formatter: Arc<Formatter>,
        document_type: impl Into<String>,
    ) -> Self {
        Self {
            source,
            formatter,
            document_type: document_type.into(),
            settled_ttl: SETTLED_TTL,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Override how long settled lookups are remembered
    pub fn with_settled_ttl(mut self, ttl: Duration) -> Self {
        self.settled_ttl = ttl;
        self
    }

    /// Current state of `uid`, starting a background fetch if needed
    ///
    /// Must be called from within a tokio runtime.
    pub fn resolve(self: &Arc<Self>, uid: &str) -> Resolution {
        if !is_valid_uid(uid) {
            return Resolution::NotFound;
        }

        let (cell, fresh) = self.entry(uid);
        if cell.initialized() {
            return self.observe(uid, &cell);
        }

        if fresh {
            tracing::info!("Rendering article {} on demand", uid);
            let this = Arc::clone(self);
            let uid = uid.to_string();
            tokio::spawn(async move {
                cell.get_or_init(|| this.fetch(&uid)).await;
            });
        }

        Resolution::Pending
    }

    /// Wait until `uid` is resolved, joining an in-flight fetch if any
    pub async fn settle(&self, uid: &str) -> Resolution {
        if !is_valid_uid(uid) {
            return Resolution::NotFound;
        }

        let (cell, _) = self.entry(uid);
        cell.get_or_init(|| self.fetch(uid)).await;
        self.observe(uid, &cell)
    }

    /// The slot of `uid`, and whether it was just created
    ///
    /// Settled slots older than the TTL are pruned first.
    fn entry(&self, uid: &str) -> (Slot, bool) {
        let mut entries = self.lock_entries();
        entries.retain(|_, cell| cell.get().map_or(true, |s| !self.expired(s)));

        match entries.get(uid) {
            Some(cell) => (Arc::clone(cell), false),
            None => {
                let cell = Arc::new(OnceCell::new());
                entries.insert(uid.to_string(), Arc::clone(&cell));
                (cell, true)
            }
        }
    }

    fn observe(&self, uid: &str, cell: &Slot) -> Resolution {
        let Some(settled) = cell.get() else {
            return Resolution::Pending;
        };

        let (resolution, keep) = match &settled.outcome {
            Outcome::Ready(post) => (Resolution::Ready(Arc::clone(post)), false),
            Outcome::NotFound => (Resolution::NotFound, !self.expired(settled)),
            Outcome::Failed(message) => (Resolution::Failed(message.clone()), false),
        };
        if !keep {
            self.forget(uid, cell);
        }
        resolution
    }

    /// Drop `uid` only while it still maps to `cell`
    fn forget(&self, uid: &str, cell: &Slot) {
        let mut entries = self.lock_entries();
        if entries.get(uid).is_some_and(|current| Arc::ptr_eq(current, cell)) {
            entries.remove(uid);
        }
    }

    fn expired(&self, settled: &Settled) -> bool {
        settled.at.elapsed() >= self.settled_ttl
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn fetch(&self, uid: &str) -> Settled {
        let outcome = match fetch_article(
            self.source.as_ref(),
            &self.formatter,
            &self.document_type,
            uid,
        )
        .await
        {
            Ok(Some(post)) => {
                tracing::info!("Article {} is ready", uid);
                Outcome::Ready(Arc::new(post))
            }
            Ok(None) => {
                tracing::info!("Article {} does not exist", uid);
                Outcome::NotFound
            }
            Err(e) => {
                tracing::error!("Failed to fetch article {}: {}", uid, e);
                Outcome::Failed(e.to_string())
            }
        };

        Settled {
            outcome,
            at: Instant::now(),
        }
    }

    #[cfg(test)]
    fn entries_len(&self) -> usize {
        self.lock_entries().len()
    }
}
