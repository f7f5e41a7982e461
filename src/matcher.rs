// 🔍 Registry Matcher - free-text query → registry rows
//
// Loose substring matching on name OR address, no ranking. The heuristic is
// weak but user-visible, so it sits behind `RegistryMatcher` and is kept
// exactly as published.

use crate::data::RegistryRow;

// ============================================================================
// QUERY
// ============================================================================

/// A search query after trimming and upper-casing. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Normalize raw input; `None` means there is nothing to search for yet
    pub fn parse(raw: &str) -> Option<Query> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Query(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// MATCHER
// ============================================================================

pub trait RegistryMatcher: Send + Sync {
    fn matches(&self, row: &RegistryRow, query: &Query) -> bool;
}

/// Case-insensitive substring on `Business Name` or `Address`.
/// Absent cells never match.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringMatcher;

impl RegistryMatcher for SubstringMatcher {
    fn matches(&self, row: &RegistryRow, query: &Query) -> bool {
        let needle = query.as_str().to_lowercase();
        [row.business_name.as_deref(), row.address.as_deref()]
            .into_iter()
            .flatten()
            .any(|field| contains_ignore_case(field, &needle))
    }
}

/// `needle` must already be lower-case
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

// ============================================================================
// CANDIDATES
// ============================================================================

/// Every registry row the matcher accepts, in source order
pub fn find_rows<'a>(
    matcher: &dyn RegistryMatcher,
    registry: &'a [RegistryRow],
    query: &Query,
) -> Vec<&'a RegistryRow> {
    registry
        .iter()
        .filter(|row| matcher.matches(row, query))
        .collect()
}

/// Distinct business names, first-encountered order. Nameless rows are
/// skipped since they cannot be selected.
pub fn distinct_names(rows: &[&RegistryRow]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in rows.iter().filter_map(|r| r.name()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
