use std::fmt;

use crate::{
    dispatch::{SearchError, SearchOutcome},
    resolve::{DetailUnavailable, DetailView},
};

/// Short, user-facing line describing what is going on. Never carries raw error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Searching,
    EmptyQuery,
    NoResults,
    SearchFailed,
    LoadingCharts,
    ChartsFailed,
    Loading(DetailView),
    Unavailable(DetailView),
}

impl Status {
    /// Status left behind by a finished search, if any.
    #[must_use]
    pub fn of_search(result: &Result<SearchOutcome, SearchError>) -> Option<Self> {
        match result {
            Ok(SearchOutcome::Found(_)) => None,
            Ok(SearchOutcome::NoResults) => Some(Self::NoResults),
            Err(SearchError::EmptyQuery) => Some(Self::EmptyQuery),
            Err(SearchError::AllCategoriesFailed) => Some(Self::SearchFailed),
        }
    }
}

impl From<&DetailUnavailable> for Status {
    fn from(e: &DetailUnavailable) -> Self {
        Self::Unavailable(e.view)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Searching => f.write_str("Searching..."),
            Self::EmptyQuery => f.write_str("Type a search term."),
            Self::NoResults => f.write_str("No results found."),
            Self::SearchFailed => f.write_str("Error fetching data."),
            Self::LoadingCharts => f.write_str("Loading top charts..."),
            Self::ChartsFailed => f.write_str("Could not load top charts."),
            Self::Loading(view) => write!(f, "Loading {view}..."),
            Self::Unavailable(view) => write!(f, "Could not load {view}."),
        }
    }
}
