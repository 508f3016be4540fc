//! Paginated, searchable table state bound to a list endpoint.
//!
//! The controller refetches whenever the page, the confirmed search term, the
//! sort direction or the page size changes. Typing only touches the draft
//! term; the search is confirmed explicitly. Every fetch carries a sequence
//! number and a response is applied only if no newer fetch was issued since.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;

use crate::client::{ResourceClient, envelope};
use crate::entity::EntityDescriptor;
use crate::error::AppResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("sort must be asc or desc, got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub per_page: u32,
    pub sort: SortDirection,
    pub search: String,
    pub included: Option<String>,
}

impl PageQuery {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
            sort: SortDirection::default(),
            search: String::new(),
            included: None,
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("perPage", self.per_page.to_string()),
            ("sort", self.sort.to_string()),
            ("search", self.search.clone()),
        ];
        if let Some(included) = &self.included {
            params.push(("included", included.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub rows: Vec<T>,
    pub total_pages: u32,
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            total_pages: 0,
        }
    }
}

/// Point-in-time view of a list screen.
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
    pub query: PageQuery,
    pub draft_search: String,
    pub result: PageResult<T>,
    pub loading: bool,
    pub last_error: Option<String>,
}

struct ListState<T> {
    query: PageQuery,
    draft_search: String,
    result: PageResult<T>,
    issued: u64,
    in_flight: usize,
    last_error: Option<String>,
}

pub struct ListController<T> {
    client: ResourceClient,
    path: String,
    state: Mutex<ListState<T>>,
}

impl<T: DeserializeOwned + Clone> ListController<T> {
    pub fn new(client: ResourceClient, path: impl Into<String>, per_page: u32) -> Self {
        Self {
            client,
            path: path.into(),
            state: Mutex::new(ListState {
                query: PageQuery::new(per_page),
                draft_search: String::new(),
                result: PageResult::default(),
                issued: 0,
                in_flight: 0,
                last_error: None,
            }),
        }
    }

    /// List screen for an entity, scoped to `parent` for nested records.
    pub fn for_entity(
        client: ResourceClient,
        descriptor: &EntityDescriptor,
        per_page: u32,
        parent: Option<&str>,
    ) -> Self {
        let controller = Self::new(client, descriptor.endpoints.list_path(parent), per_page);
        controller.lock().query.included = descriptor.included.map(str::to_string);
        controller
    }

    fn lock(&self) -> MutexGuard<'_, ListState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        let state = self.lock();
        ListSnapshot {
            query: state.query.clone(),
            draft_search: state.draft_search.clone(),
            result: state.result.clone(),
            loading: state.in_flight > 0,
            last_error: state.last_error.clone(),
        }
    }

    pub fn query(&self) -> PageQuery {
        self.lock().query.clone()
    }

    /// Seeds the search term and sort before the first load; nothing is fetched.
    pub fn preset(&self, search: &str, sort: SortDirection) {
        let mut state = self.lock();
        state.draft_search = search.trim().to_string();
        state.query.search = state.draft_search.clone();
        state.query.sort = sort;
    }

    /// Initial fetch when the screen is shown.
    pub async fn load(&self) -> AppResult<()> {
        self.fetch().await
    }

    /// Re-issues the current query.
    pub async fn refresh(&self) -> AppResult<()> {
        self.fetch().await
    }

    /// Updates the draft term only; nothing is fetched.
    pub fn set_draft_search(&self, text: impl Into<String>) {
        self.lock().draft_search = text.into();
    }

    /// Confirms the draft term and returns to the first page.
    pub async fn submit_search(&self) -> AppResult<bool> {
        let changed = {
            let mut state = self.lock();
            let search = state.draft_search.trim().to_string();
            let changed = state.query.search != search || state.query.page != 1;
            state.query.search = search;
            state.query.page = 1;
            changed
        };
        self.fetch_if(changed).await
    }

    /// Empties both search terms and returns to the first page in one step.
    pub async fn clear_search(&self) -> AppResult<bool> {
        let changed = {
            let mut state = self.lock();
            let changed = !state.query.search.is_empty() || state.query.page != 1;
            state.draft_search.clear();
            state.query.search.clear();
            state.query.page = 1;
            changed
        };
        self.fetch_if(changed).await
    }

    /// Moves to `page`; pages outside `1..=total_pages` are ignored.
    pub async fn handle_page_change(&self, page: u32) -> AppResult<bool> {
        let changed = {
            let mut state = self.lock();
            if page < 1 || page > state.result.total_pages || page == state.query.page {
                tracing::debug!(
                    "Ignoring page {} (current {}, total {})",
                    page,
                    state.query.page,
                    state.result.total_pages
                );
                false
            } else {
                state.query.page = page;
                true
            }
        };
        self.fetch_if(changed).await
    }

    pub async fn set_sort(&self, sort: SortDirection) -> AppResult<bool> {
        let changed = {
            let mut state = self.lock();
            let changed = state.query.sort != sort;
            state.query.sort = sort;
            changed
        };
        self.fetch_if(changed).await
    }

    pub async fn set_per_page(&self, per_page: u32) -> AppResult<bool> {
        let per_page = per_page.max(1);
        let changed = {
            let mut state = self.lock();
            let changed = state.query.per_page != per_page;
            if changed {
                state.query.per_page = per_page;
                state.query.page = 1;
            }
            changed
        };
        self.fetch_if(changed).await
    }

    async fn fetch_if(&self, changed: bool) -> AppResult<bool> {
        if changed {
            self.fetch().await?;
        }
        Ok(changed)
    }

    async fn fetch(&self) -> AppResult<()> {
        let (seq, params) = {
            let mut state = self.lock();
            state.issued += 1;
            state.in_flight += 1;
            (state.issued, state.query.params())
        };
        // Declared before `state` below so it runs after that lock is released.
        let _in_flight = InFlight(&self.state);

        let outcome = match self.client.get(&self.path, &params).await {
            Ok(body) => envelope::<Vec<T>>(body),
            Err(e) => Err(e),
        };

        let mut state = self.lock();
        if seq != state.issued {
            tracing::debug!(
                "Discarding response {} for {}, {} is newer",
                seq,
                self.path,
                state.issued
            );
            return outcome.map(|_| ());
        }

        match outcome {
            Ok(page) => {
                state.result = PageResult {
                    rows: page.data.unwrap_or_default(),
                    total_pages: page.meta.map(|m| m.last_page).unwrap_or(1),
                };
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                state.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }
}

/// Counts a fetch as finished when dropped, including when its future is cancelled.
struct InFlight<'a, T>(&'a Mutex<ListState<T>>);

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        let mut state = self.0.lock().unwrap_or_else(|e| e.into_inner());
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}
