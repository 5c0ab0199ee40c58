//! List screen state: current query, persisted preferences, search debouncing
//! and latest-wins handling of in-flight list requests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::error::CatalogResult;
use super::models::{
    ApiError, FilterSpec, ListParams, MakeId, ModelWithMake, PaginatedResponse, SortSpec,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use super::preferences::{FilterPreferences, PreferenceStore};
use super::service::Catalog;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    pub search: String,
    pub make_id: Option<MakeId>,
    pub sort: SortSpec,
    pub page: u32,
    pub limit: u32,
}

impl ListState {
    /// A saved page size outside `1..=MAX_PAGE_SIZE` falls back to the default.
    pub fn from_preferences(preferences: &FilterPreferences) -> Self {
        let limit = match preferences.page_size {
            size @ 1..=MAX_PAGE_SIZE => size,
            size => {
                tracing::warn!(page_size = size, "ignoring out-of-range saved page size");
                DEFAULT_PAGE_SIZE
            }
        };
        Self {
            search: preferences.search.clone(),
            make_id: preferences.make_id,
            sort: SortSpec::new(preferences.sort_field, preferences.sort_direction),
            page: 1,
            limit,
        }
    }

    pub fn to_preferences(&self) -> FilterPreferences {
        FilterPreferences {
            search: self.search.clone(),
            make_id: self.make_id,
            sort_field: self.sort.field,
            sort_direction: self.sort.direction,
            page_size: self.limit,
        }
    }

    pub fn to_params(&self) -> ListParams {
        let search = Some(self.search.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        let filter = (search.is_some() || self.make_id.is_some()).then(|| FilterSpec {
            search,
            make_id: self.make_id,
        });

        ListParams {
            page: self.page,
            limit: self.limit,
            sort: Some(self.sort),
            filter,
        }
    }
}

impl Default for ListState {
    fn default() -> Self {
        Self::from_preferences(&FilterPreferences::default())
    }
}

/// Monotonic request tags; only the most recently issued one is current.
#[derive(Debug, Default)]
pub struct Generations {
    latest: AtomicU64,
}

impl Generations {
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == generation
    }
}

/// What the list screen shows.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    pub page: Option<PaginatedResponse<ModelWithMake>>,
    /// Stays set until the next successful query.
    pub error: Option<ApiError>,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub generation: u64,
    pub params: ListParams,
}

pub struct ListSession {
    catalog: Catalog,
    state: ListState,
    preferences: Option<PreferenceStore>,
    generations: Generations,
    view: ListView,
}

impl ListSession {
    /// Session with default state and nothing persisted.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            state: ListState::default(),
            preferences: None,
            generations: Generations::default(),
            view: ListView::default(),
        }
    }

    /// Session seeded from, and writing back to, durable preferences.
    pub fn with_preferences(catalog: Catalog, store: PreferenceStore) -> Self {
        let state = ListState::from_preferences(&store.load());
        Self {
            catalog,
            state,
            preferences: Some(store),
            generations: Generations::default(),
            view: ListView::default(),
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn view(&self) -> &ListView {
        &self.view
    }

    /// Returns whether the state changed. Filter and sort edits go back to page 1.
    pub fn set_search(&mut self, search: impl Into<String>) -> bool {
        let search = search.into();
        if self.state.search == search {
            return false;
        }
        self.state.search = search;
        self.reset_page_and_persist();
        true
    }

    pub fn set_make(&mut self, make_id: Option<MakeId>) -> bool {
        if self.state.make_id == make_id {
            return false;
        }
        self.state.make_id = make_id;
        self.reset_page_and_persist();
        true
    }

    pub fn set_sort(&mut self, sort: SortSpec) -> bool {
        if self.state.sort == sort {
            return false;
        }
        self.state.sort = sort;
        self.reset_page_and_persist();
        true
    }

    pub fn set_limit(&mut self, limit: u32) -> bool {
        if self.state.limit == limit {
            return false;
        }
        self.state.limit = limit;
        self.reset_page_and_persist();
        true
    }

    pub fn set_page(&mut self, page: u32) -> bool {
        if self.state.page == page {
            return false;
        }
        self.state.page = page;
        true
    }

    pub fn clear_filters(&mut self) -> bool {
        if self.state.search.is_empty() && self.state.make_id.is_none() {
            return false;
        }
        self.state.search.clear();
        self.state.make_id = None;
        self.reset_page_and_persist();
        true
    }

    /// Tag a query for the current state; any earlier tag becomes stale.
    pub fn begin(&mut self) -> PendingQuery {
        self.view.loading = true;
        PendingQuery {
            generation: self.generations.issue(),
            params: self.state.to_params(),
        }
    }

    /// Accept a finished query unless a newer one was issued meanwhile.
    pub fn complete(
        &mut self,
        generation: u64,
        result: CatalogResult<PaginatedResponse<ModelWithMake>>,
    ) -> bool {
        if !self.generations.is_current(generation) {
            tracing::debug!(generation, "discarding stale list response");
            return false;
        }

        self.view.loading = false;
        match result {
            Ok(page) => {
                self.view.page = Some(page);
                self.view.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "model list query failed");
                self.view.error = Some(ApiError::from(&err));
            }
        }
        true
    }

    pub async fn refresh(&mut self) -> bool {
        let pending = self.begin();
        let result = self.catalog.list_models(&pending.params).await;
        self.complete(pending.generation, result)
    }

    /// Wait for the next settled search text, apply it and re-query.
    ///
    /// Returns `None` once the debouncer has shut down.
    pub async fn apply_debounced_search(&mut self, debouncer: &mut SearchDebouncer) -> Option<bool> {
        let search = debouncer.next().await?;
        if !self.set_search(search) {
            return Some(false);
        }
        Some(self.refresh().await)
    }

    fn reset_page_and_persist(&mut self) {
        self.state.page = 1;
        if let Some(store) = &self.preferences {
            store.save(&self.state.to_preferences());
        }
    }
}

/// Forwards search text only after it has been left alone for the debounce delay.
pub struct SearchDebouncer {
    input: watch::Sender<String>,
    settled: mpsc::Receiver<String>,
    task: JoinHandle<()>,
}

impl SearchDebouncer {
    pub fn spawn(delay: Duration) -> Self {
        let (input, watcher) = watch::channel(String::new());
        let (sender, settled) = mpsc::channel(8);
        let task = tokio::spawn(debounce(watcher, sender, delay));
        Self {
            input,
            settled,
            task,
        }
    }

    pub fn push(&self, text: impl Into<String>) {
        self.input.send_replace(text.into());
    }

    pub async fn next(&mut self) -> Option<String> {
        self.settled.recv().await
    }

    pub fn try_next(&mut self) -> Option<String> {
        self.settled.try_recv().ok()
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce(mut input: watch::Receiver<String>, settled: mpsc::Sender<String>, delay: Duration) {
    while input.changed().await.is_ok() {
        loop {
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(delay) => break,
            }
        }

        let text = input.borrow_and_update().clone();
        if settled.send(text).await.is_err() {
            return;
        }
    }
}
