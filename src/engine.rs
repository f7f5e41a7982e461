// ⚙️ Lookup Engine - immutable tables + matcher
//
// Stateless: every call reads the shared dataset and returns fresh values.
// Selection state lives in `session::Session`, one per user.

use crate::contracts::{self, ContractsOutcome};
use crate::data::{Dataset, RegistryRow};
use crate::error::LookupResult;
use crate::matcher::{self, Query, RegistryMatcher, SubstringMatcher};
use crate::profile::{self, BusinessProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a search produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "names", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Query was empty after trimming; nothing searched
    AwaitingInput,

    NoMatch,

    /// Exactly one distinct business name matched
    Resolved(String),

    /// Several distinct names, first-encountered order; caller must pick one
    Ambiguous(Vec<String>),
}

pub struct LookupEngine {
    data: Dataset,
    matcher: Box<dyn RegistryMatcher>,
}

impl LookupEngine {
    pub fn new(data: Dataset) -> Self {
        Self::with_matcher(data, Box::new(SubstringMatcher))
    }

    pub fn with_matcher(data: Dataset, matcher: Box<dyn RegistryMatcher>) -> Self {
        LookupEngine { data, matcher }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    /// Registry rows matching `raw`, in source order. Empty for blank input.
    pub fn matching_rows(&self, raw: &str) -> Vec<&RegistryRow> {
        match Query::parse(raw) {
            Some(query) => matcher::find_rows(self.matcher.as_ref(), &self.data.registry, &query),
            None => Vec::new(),
        }
    }

    pub fn search(&self, raw: &str) -> SearchOutcome {
        let Some(query) = Query::parse(raw) else {
            return SearchOutcome::AwaitingInput;
        };

        let rows = matcher::find_rows(self.matcher.as_ref(), &self.data.registry, &query);
        let mut names = matcher::distinct_names(&rows);
        debug!(query = query.as_str(), rows = rows.len(), names = names.len(), "registry search");

        match names.len() {
            0 => SearchOutcome::NoMatch,
            1 => SearchOutcome::Resolved(names.remove(0)),
            _ => SearchOutcome::Ambiguous(names),
        }
    }

    pub fn profile(&self, business_name: &str) -> LookupResult<BusinessProfile> {
        profile::build_profile(&self.data.registry, business_name)
    }

    pub fn contracts(&self, business_name: &str) -> LookupResult<ContractsOutcome> {
        contracts::aggregate(&self.data.contracts, business_name)
    }
}
