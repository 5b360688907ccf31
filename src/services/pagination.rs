//! Incremental ("infinite scroll") list controller.
//!
//! One [`IncrementalList`] per rendered list. It holds the items shown so far and pulls
//! successive pages from a [`PageSource`] until a page brings nothing new.

use std::{collections::HashSet, sync::Arc};

use serde::Serialize;

use crate::{
    error::FetchResult,
    models::{MediaItem, MediaKey},
};

/// Anything that can produce 1-based pages of media items
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches one page; an empty page signals exhaustion
    async fn fetch_page(&self, page: u32) -> FetchResult<Vec<MediaItem>>;

    fn slug(&self) -> &str;

    fn title(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListState {
    Idle,
    Loading,
    Exhausted,
}

/// Permission to deliver one page, issued by [`IncrementalList::begin_load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub page: u32,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// New unique items were appended
    Appended { count: usize },
    /// Nothing new (or the fetch failed); no further fetches will happen
    Exhausted,
    /// The list was loading or exhausted, so nothing was requested
    Skipped,
    /// The response belonged to a category the list has since switched away from
    Stale,
}

/// Serializable view of a list
#[derive(Debug, Clone, Serialize)]
pub struct ListSnapshot {
    pub slug: String,
    pub title: String,
    pub state: ListState,
    pub next_page: u32,
    pub items: Vec<MediaItem>,
}

/// State machine behind one incremental list
///
/// `Idle -> Loading -> Idle | Exhausted`. While `Loading`, further load requests are
/// inert; once `Exhausted`, no fetch is ever issued again for the current category.
pub struct IncrementalList {
    source: Arc<dyn PageSource>,
    items: Vec<MediaItem>,
    seen: HashSet<MediaKey>,
    next_page: u32,
    state: ListState,
    generation: u64,
}

impl IncrementalList {
    /// Seeds the list with the caller's first page; the next fetch asks for page 2
    pub fn new(source: Arc<dyn PageSource>, first_page: Vec<MediaItem>) -> Self {
        let mut list = Self {
            source,
            items: Vec::new(),
            seen: HashSet::new(),
            next_page: 2,
            state: ListState::Idle,
            generation: 0,
        };
        list.seed(first_page);
        list
    }

    fn seed(&mut self, first_page: Vec<MediaItem>) {
        self.items.clear();
        self.seen.clear();
        for item in first_page {
            if self.seen.insert(item.key()) {
                self.items.push(item);
            }
        }
        self.next_page = 2;
        self.state = ListState::Idle;
    }

    /// Replaces the category and resets to `Idle(first_page, next_page = 2)`
    ///
    /// Any ticket issued before the switch is stale from now on.
    pub fn switch_category(&mut self, source: Arc<dyn PageSource>, first_page: Vec<MediaItem>) {
        tracing::debug!(
            from = %self.source.slug(),
            to = %source.slug(),
            "Switching list category"
        );
        self.source = source;
        self.generation += 1;
        self.seed(first_page);
    }

    /// Moves `Idle -> Loading` and returns the page to fetch; `None` in any other state
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if self.state != ListState::Idle {
            return None;
        }
        self.state = ListState::Loading;
        Some(LoadTicket {
            page: self.next_page,
            generation: self.generation,
        })
    }

    /// Applies the result of the fetch started by `ticket`
    ///
    /// Errors are treated like an empty page: the list becomes exhausted and is not retried.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: FetchResult<Vec<MediaItem>>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation || self.state != ListState::Loading {
            tracing::debug!(page = ticket.page, "Discarding stale page response");
            return LoadOutcome::Stale;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    slug = %self.source.slug(),
                    page = ticket.page,
                    "Page fetch failed, marking list exhausted"
                );
                Vec::new()
            }
        };

        let before = self.items.len();
        for item in page {
            if self.seen.insert(item.key()) {
                self.items.push(item);
            }
        }
        let appended = self.items.len() - before;

        if appended == 0 {
            self.state = ListState::Exhausted;
            tracing::debug!(slug = %self.source.slug(), page = ticket.page, "List exhausted");
            LoadOutcome::Exhausted
        } else {
            self.next_page += 1;
            self.state = ListState::Idle;
            LoadOutcome::Appended { count: appended }
        }
    }

    /// Fetches and applies the next page in one step
    pub async fn load_more(&mut self) -> LoadOutcome {
        let Some(ticket) = self.begin_load() else {
            return LoadOutcome::Skipped;
        };
        let source = self.source.clone();
        let result = source.fetch_page(ticket.page).await;
        self.complete_load(ticket, result)
    }

    /// Source the next ticket will be fetched from
    pub fn source(&self) -> Arc<dyn PageSource> {
        self.source.clone()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == ListState::Exhausted
    }

    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            slug: self.source.slug().to_string(),
            title: self.source.title().to_string(),
            state: self.state,
            next_page: self.next_page,
            items: self.items.clone(),
        }
    }
}
