// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal listing: filter, paginate and annotate the full catalog.
//!
//! The state is a plain value driven by [`reduce`]. [`ListingPipeline`] owns
//! the async side: the initial concurrent fetch, search debouncing,
//! distinct-until-changed filtering, and cancellation on teardown. Every new
//! state is published on a `watch` channel.

use crate::error::AppError;
use crate::models::{annotate, AnnotatedMeal, FavoriteIds, Meal};
use crate::services::catalog::MealCatalog;
use crate::services::favorites::FavoritesStore;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_PAGINATION_RADIUS: usize = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Filtering
// ─────────────────────────────────────────────────────────────────────────────

/// Active filter values; empty strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub search: String,
    pub country: String,
    pub category: String,
}

impl FilterCriteria {
    /// All set predicates must hold.
    ///
    /// Search is a case-insensitive substring match on name or country;
    /// country and category are exact matches.
    pub fn matches(&self, meal: &Meal) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let in_name = meal.name_or_empty().to_lowercase().contains(&needle);
            let in_area = meal.area_or_empty().to_lowercase().contains(&needle);
            if !in_name && !in_area {
                return false;
            }
        }
        if !self.country.is_empty() && meal.area_or_empty() != self.country {
            return false;
        }
        if !self.category.is_empty() && meal.category.as_deref().unwrap_or("") != self.category {
            return false;
        }
        true
    }
}

/// Indices into `catalog` of the meals matching `criteria`, in catalog order.
pub fn filter_indices(catalog: &[Meal], criteria: &FilterCriteria) -> Vec<usize> {
    catalog
        .iter()
        .enumerate()
        .filter(|(_, meal)| criteria.matches(meal))
        .map(|(i, _)| i)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Pagination markers
// ─────────────────────────────────────────────────────────────────────────────

/// Entry of the abbreviated page-number sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(usize),
    /// Elided run of pages. Serialized as `null`.
    Gap,
}

impl Serialize for PageMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageMarker::Page(n) => serializer.serialize_u64(*n as u64),
            PageMarker::Gap => serializer.serialize_none(),
        }
    }
}

/// Page numbers around `current`, always including the first and last page.
///
/// Pages within `radius` of `current` are listed; longer runs on either side
/// collapse to a single [`PageMarker::Gap`]. With 7 of 20 and radius 2:
/// `1, gap, 5, 6, 7, 8, 9, gap, 20`.
pub fn page_numbers(current: usize, total: usize, radius: usize) -> Vec<PageMarker> {
    match total {
        0 => return Vec::new(),
        1 => return vec![PageMarker::Page(1)],
        _ => {}
    }
    let current = current.clamp(1, total);

    let lo = current.saturating_sub(radius).max(2);
    let hi = current.saturating_add(radius).min(total - 1);

    let mut markers = vec![PageMarker::Page(1)];
    if current.saturating_sub(radius) > 2 {
        markers.push(PageMarker::Gap);
    }
    markers.extend((lo..=hi).map(PageMarker::Page));
    if current.saturating_add(radius) < total - 1 {
        markers.push(PageMarker::Gap);
    }
    markers.push(PageMarker::Page(total));
    markers
}

// ─────────────────────────────────────────────────────────────────────────────
// State and reducer
// ─────────────────────────────────────────────────────────────────────────────

/// Progress of the initial (or retried) catalog fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    Loading,
    Ready,
    /// Fetch failed; the view offers a retry.
    Failed { message: String },
}

/// Listing view state.
#[derive(Debug, Clone)]
pub struct ListingState {
    pub status: LoadStatus,
    pub catalog: Arc<Vec<Meal>>,
    pub countries: Arc<Vec<String>>,
    pub categories: Arc<Vec<String>>,
    pub filters: FilterCriteria,
    /// Indices into `catalog` passing `filters`.
    pub filtered: Vec<usize>,
    /// Current page, 1-based.
    pub page: usize,
    pub page_size: usize,
    /// Incremented by every reduction.
    pub revision: u64,
}

impl Default for ListingState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, None)
    }
}

impl ListingState {
    /// Empty, loading state. `preselect_category` becomes the initial category filter.
    pub fn new(page_size: usize, preselect_category: Option<String>) -> Self {
        Self {
            status: LoadStatus::Loading,
            catalog: Arc::new(Vec::new()),
            countries: Arc::new(Vec::new()),
            categories: Arc::new(Vec::new()),
            filters: FilterCriteria {
                category: preselect_category.unwrap_or_default(),
                ..FilterCriteria::default()
            },
            filtered: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            revision: 0,
        }
    }

    /// `ceil(filtered / page_size)`; zero when nothing matches.
    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size)
    }

    /// Meals on the current page.
    pub fn visible(&self) -> impl Iterator<Item = &Meal> {
        let start = (self.page - 1).saturating_mul(self.page_size);
        let end = start.saturating_add(self.page_size).min(self.filtered.len());
        let range = if start < end { &self.filtered[start..end] } else { &[][..] };
        range.iter().map(move |&i| &self.catalog[i])
    }

    /// Move to `page` if it exists; otherwise stay put.
    fn go_to(&mut self, page: usize) {
        if (1..=self.total_pages()).contains(&page) {
            self.page = page;
        }
    }

    fn refilter(&mut self) {
        self.filtered = filter_indices(&self.catalog, &self.filters);
        self.page = 1;
    }
}

/// Inputs to [`reduce`].
#[derive(Debug, Clone)]
pub enum ListingEvent {
    Reloading,
    Loaded {
        meals: Vec<Meal>,
        countries: Vec<String>,
        categories: Vec<String>,
    },
    LoadFailed(String),
    SearchChanged(String),
    CountryChanged(String),
    CategoryChanged(String),
    ClearFilters,
    /// Jump to a 1-based page; ignored outside `1..=total_pages`.
    GoToPage(usize),
    NextPage,
    PrevPage,
}

/// Pure state transition.
///
/// Any filter change recomputes the filtered list and returns to page 1.
pub fn reduce(mut state: ListingState, event: ListingEvent) -> ListingState {
    state.revision += 1;
    match event {
        ListingEvent::Reloading => {
            state.status = LoadStatus::Loading;
        }
        ListingEvent::Loaded {
            meals,
            countries,
            categories,
        } => {
            state.status = LoadStatus::Ready;
            state.catalog = Arc::new(meals);
            state.countries = Arc::new(countries);
            state.categories = Arc::new(categories);
            state.refilter();
        }
        ListingEvent::LoadFailed(message) => {
            state.status = LoadStatus::Failed { message };
        }
        ListingEvent::SearchChanged(search) => {
            state.filters.search = search;
            state.refilter();
        }
        ListingEvent::CountryChanged(country) => {
            state.filters.country = country;
            state.refilter();
        }
        ListingEvent::CategoryChanged(category) => {
            state.filters.category = category;
            state.refilter();
        }
        ListingEvent::ClearFilters => {
            state.filters = FilterCriteria::default();
            state.refilter();
        }
        ListingEvent::GoToPage(page) => state.go_to(page),
        ListingEvent::NextPage => {
            let page = state.page + 1;
            state.go_to(page);
        }
        ListingEvent::PrevPage => {
            let page = state.page.saturating_sub(1);
            state.go_to(page);
        }
    }
    state
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendered view
// ─────────────────────────────────────────────────────────────────────────────

/// What the listing view renders.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub status: LoadStatus,
    pub filters: FilterCriteria,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_results: usize,
    pub page_numbers: Vec<PageMarker>,
    pub meals: Vec<AnnotatedMeal>,
    pub countries: Arc<Vec<String>>,
    pub categories: Arc<Vec<String>>,
    pub revision: u64,
}

/// Render `state`, annotating only the visible page against `favorites`.
pub fn page_view(state: &ListingState, favorites: &FavoriteIds, radius: usize) -> PageView {
    let total_pages = state.total_pages();
    PageView {
        status: state.status.clone(),
        filters: state.filters.clone(),
        page: state.page,
        page_size: state.page_size,
        total_pages,
        total_results: state.filtered.len(),
        page_numbers: page_numbers(state.page, total_pages, radius),
        meals: state.visible().map(|m| annotate(m, favorites)).collect(),
        countries: state.countries.clone(),
        categories: state.categories.clone(),
        revision: state.revision,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ListingPipeline - async driver
// ─────────────────────────────────────────────────────────────────────────────

/// Tuning and startup inputs for a pipeline.
#[derive(Debug, Clone)]
pub struct ListingOptions {
    pub page_size: usize,
    pub search_debounce: Duration,
    pub pagination_radius: usize,
    /// Category handed over from another view, applied before the first render.
    pub preselect_category: Option<String>,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            pagination_radius: DEFAULT_PAGINATION_RADIUS,
            preselect_category: None,
        }
    }
}

/// Raw user input, before debouncing and de-duplication.
#[derive(Debug)]
enum ListingInput {
    Search(String),
    Country(String),
    Category(String),
    Page(ListingEvent),
    ClearFilters,
    Reload,
    Flush(oneshot::Sender<()>),
}

type LoadResult = Result<(Vec<Meal>, Vec<String>, Vec<String>), AppError>;

/// A live listing view.
///
/// Dropping the handle (or calling [`close`](Self::close)) cancels the
/// driver task, any in-flight fetch and the pending debounce timer.
pub struct ListingPipeline {
    inputs: mpsc::UnboundedSender<ListingInput>,
    state: watch::Receiver<ListingState>,
    favorites: FavoritesStore,
    radius: usize,
    cancel: CancellationToken,
}

impl ListingPipeline {
    /// Start the pipeline and its initial catalog fetch.
    ///
    /// The pipeline's token is a child of `parent`, so cancelling `parent`
    /// tears it down as well.
    pub fn open(
        catalog: Arc<dyn MealCatalog>,
        favorites: FavoritesStore,
        options: ListingOptions,
        parent: &CancellationToken,
    ) -> Self {
        let cancel = parent.child_token();
        let initial = ListingState::new(options.page_size, options.preselect_category.clone());
        let (state_tx, state_rx) = watch::channel(initial);
        let (input_tx, input_rx) = mpsc::unbounded_channel();

        tracing::debug!(
            preselect = ?options.preselect_category,
            page_size = options.page_size,
            "Opening listing pipeline"
        );

        let driver = Driver {
            catalog,
            state: state_tx,
            debounce: options.search_debounce,
            last_search: String::new(),
            last_country: String::new(),
            last_category: options.preselect_category.unwrap_or_default(),
            generation: 0,
            cancel: cancel.clone(),
        };
        tokio::spawn(driver.run(input_rx));

        let pipeline = Self {
            inputs: input_tx,
            state: state_rx,
            favorites,
            radius: options.pagination_radius,
            cancel,
        };
        pipeline.send(ListingInput::Reload);
        pipeline
    }

    fn send(&self, input: ListingInput) {
        if self.inputs.send(input).is_err() {
            tracing::debug!("Listing pipeline closed, input dropped");
        }
    }

    /// Free-text search; forwarded after the debounce window if it changed.
    pub fn set_search(&self, text: impl Into<String>) {
        self.send(ListingInput::Search(text.into()));
    }

    pub fn set_country(&self, country: impl Into<String>) {
        self.send(ListingInput::Country(country.into()));
    }

    pub fn set_category(&self, category: impl Into<String>) {
        self.send(ListingInput::Category(category.into()));
    }

    pub fn go_to_page(&self, page: usize) {
        self.send(ListingInput::Page(ListingEvent::GoToPage(page)));
    }

    pub fn next_page(&self) {
        self.send(ListingInput::Page(ListingEvent::NextPage));
    }

    pub fn prev_page(&self) {
        self.send(ListingInput::Page(ListingEvent::PrevPage));
    }

    pub fn clear_filters(&self) {
        self.send(ListingInput::ClearFilters);
    }

    /// Refetch the catalog (the retry action after a failed load).
    pub fn reload(&self) {
        self.send(ListingInput::Reload);
    }

    /// Resolve once every input sent before this call has been applied.
    ///
    /// A search still inside its debounce window stays pending.
    pub async fn flush(&self) -> Result<(), AppError> {
        let (tx, rx) = oneshot::channel();
        self.send(ListingInput::Flush(tx));
        rx.await.map_err(|_| AppError::Cancelled)
    }

    /// Current state snapshot.
    pub fn state(&self) -> ListingState {
        self.state.borrow().clone()
    }

    /// Current rendered page, annotated with the latest favorites.
    pub fn view(&self) -> PageView {
        page_view(&self.state.borrow(), &self.favorites.all(), self.radius)
    }

    /// Receive every state the pipeline publishes.
    pub fn subscribe(&self) -> watch::Receiver<ListingState> {
        self.state.clone()
    }

    /// Wait until the published state satisfies `pred`.
    pub async fn wait_for<F>(&self, mut pred: F) -> Result<ListingState, AppError>
    where
        F: FnMut(&ListingState) -> bool,
    {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|s| pred(s))
            .await
            .map_err(|_| AppError::Cancelled)?;
        Ok(state.clone())
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for ListingPipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Driver {
    catalog: Arc<dyn MealCatalog>,
    state: watch::Sender<ListingState>,
    debounce: Duration,
    /// Last values forwarded to the reducer, for distinct-until-changed.
    last_search: String,
    last_country: String,
    last_category: String,
    /// Load attempt counter; results from superseded attempts are dropped.
    generation: u64,
    cancel: CancellationToken,
}

impl Driver {
    async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<ListingInput>) {
        let (load_tx, mut load_rx) = mpsc::unbounded_channel::<(u64, LoadResult)>();
        let mut pending_search: Option<(String, Instant)> = None;
        let cancel = self.cancel.clone();

        loop {
            let deadline = pending_search.as_ref().map(|(_, at)| *at);
            let debounce_elapsed = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                input = inputs.recv() => match input {
                    Some(ListingInput::Search(text)) => {
                        pending_search = Some((text, Instant::now() + self.debounce));
                    }
                    Some(ListingInput::ClearFilters) => {
                        pending_search = None;
                        self.clear_filters();
                    }
                    Some(ListingInput::Reload) => self.start_load(&load_tx),
                    Some(ListingInput::Flush(done)) => {
                        let _ = done.send(());
                    }
                    Some(input) => self.handle(input),
                    None => break,
                },
                _ = debounce_elapsed => {
                    if let Some((text, _)) = pending_search.take() {
                        self.forward_search(text);
                    }
                }
                Some((generation, result)) = load_rx.recv() => {
                    self.finish_load(generation, result);
                }
            }
        }

        tracing::debug!("Listing pipeline stopped");
    }

    fn apply(&self, event: ListingEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.state.send_modify(|state| {
            let current = std::mem::take(state);
            *state = reduce(current, event);
        });
    }

    fn handle(&mut self, input: ListingInput) {
        match input {
            ListingInput::Country(country) => {
                if country != self.last_country {
                    self.last_country = country.clone();
                    self.apply(ListingEvent::CountryChanged(country));
                }
            }
            ListingInput::Category(category) => {
                if category != self.last_category {
                    self.last_category = category.clone();
                    self.apply(ListingEvent::CategoryChanged(category));
                }
            }
            ListingInput::Page(event) => self.apply(event),
            ListingInput::Search(_)
            | ListingInput::ClearFilters
            | ListingInput::Reload
            | ListingInput::Flush(_) => {}
        }
    }

    fn forward_search(&mut self, text: String) {
        if text != self.last_search {
            self.last_search = text.clone();
            self.apply(ListingEvent::SearchChanged(text));
        }
    }

    fn clear_filters(&mut self) {
        self.last_search.clear();
        self.last_country.clear();
        self.last_category.clear();
        self.apply(ListingEvent::ClearFilters);
    }

    /// Fetch catalog, countries and categories concurrently in a child task.
    fn start_load(&mut self, results: &mpsc::UnboundedSender<(u64, LoadResult)>) {
        self.generation += 1;
        let generation = self.generation;
        self.apply(ListingEvent::Reloading);

        let catalog = self.catalog.clone();
        let results = results.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let fetch = async {
                tokio::try_join!(
                    catalog.all_meals_by_first_letter(),
                    catalog.list_countries(),
                    catalog.list_categories(),
                )
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(generation, "Listing load cancelled");
                }
                result = fetch => {
                    let _ = results.send((generation, result));
                }
            }
        });
    }

    fn finish_load(&mut self, generation: u64, result: LoadResult) {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "Dropping stale load");
            return;
        }
        match result {
            Ok((meals, countries, categories)) => {
                tracing::info!(
                    meals = meals.len(),
                    countries = countries.len(),
                    categories = categories.len(),
                    "Listing data loaded"
                );
                self.apply(ListingEvent::Loaded {
                    meals,
                    countries,
                    categories,
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Listing data failed to load");
                self.apply(ListingEvent::LoadFailed(e.to_string()));
            }
        }
    }
}
