// 🧭 Session - per-user selection state
//
// The only mutable state in the system. A session remembers the candidate
// list of its last search and the business the user settled on. Detail and
// contract views are always recomputed from the exact selected name.
//
// A search that finds nothing (or blank input) clears any earlier selection,
// so a stale profile is never shown under a new query.

use crate::contracts::ContractsOutcome;
use crate::engine::{LookupEngine, SearchOutcome};
use crate::error::{LookupError, LookupResult};
use crate::profile::BusinessProfile;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    AwaitingInput,
    NoMatch,
    Resolved,
    MultipleCandidates,
}

#[derive(Debug, Clone)]
pub struct Session {
    query: String,
    status: SearchStatus,
    candidates: Vec<String>,
    selected: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            query: String::new(),
            status: SearchStatus::AwaitingInput,
            candidates: Vec::new(),
            selected: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Run a search and update the selection state from its outcome
    pub fn search(&mut self, engine: &LookupEngine, raw: &str) -> SearchStatus {
        let outcome = engine.search(raw);
        self.apply_search(raw, outcome)
    }

    /// Update the selection state from a search already run for `raw`
    pub fn apply_search(&mut self, raw: &str, outcome: SearchOutcome) -> SearchStatus {
        self.query = raw.to_string();

        match outcome {
            SearchOutcome::AwaitingInput => {
                self.status = SearchStatus::AwaitingInput;
                self.candidates.clear();
                self.selected = None;
            }
            SearchOutcome::NoMatch => {
                self.status = SearchStatus::NoMatch;
                self.candidates.clear();
                self.selected = None;
            }
            SearchOutcome::Resolved(name) => {
                self.status = SearchStatus::Resolved;
                self.candidates = vec![name.clone()];
                self.selected = Some(name);
            }
            SearchOutcome::Ambiguous(names) => {
                self.status = SearchStatus::MultipleCandidates;
                self.candidates = names;
                self.selected = None;
            }
        }

        debug!(status = ?self.status, candidates = self.candidates.len(), "session search");
        self.status
    }

    /// Resolve the candidate list to one business
    pub fn select(&mut self, name: &str) -> LookupResult<()> {
        if !self.candidates.iter().any(|c| c == name) {
            return Err(LookupError::NotACandidate {
                name: name.to_string(),
            });
        }
        self.selected = Some(name.to_string());
        Ok(())
    }

    /// Everything the presentation layer needs to draw the current state
    pub fn view(&self, engine: &LookupEngine) -> SessionView {
        let mut view = SessionView {
            query: self.query.clone(),
            status: self.status,
            candidates: self.candidates.clone(),
            selected: self.selected.clone(),
            profile: None,
            contracts: None,
            error: None,
        };

        let Some(name) = self.selected.as_deref() else {
            return view;
        };

        match engine.profile(name) {
            Ok(profile) => view.profile = Some(profile),
            Err(e) => {
                view.error = Some(e);
                return view;
            }
        }

        match engine.contracts(name) {
            Ok(contracts) => view.contracts = Some(contracts),
            Err(e) => view.error = Some(e),
        }

        view
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub query: String,
    pub status: SearchStatus,
    pub candidates: Vec<String>,
    pub selected: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<BusinessProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contracts: Option<ContractsOutcome>,

    /// Recoverable failure of this interaction (e.g. an unparsable amount)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<LookupError>,
}

impl SessionView {
    /// Selection exists but the user still has to choose
    pub fn needs_choice(&self) -> bool {
        self.status == SearchStatus::MultipleCandidates && self.selected.is_none()
    }
}

// ============================================================================
// SESSION STORE
// ============================================================================

pub type SessionId = Uuid;

struct SessionEntry {
    session: Session,
    last_seen: DateTime<Utc>,
}

/// Isolated sessions keyed by random ID, evicted after sitting idle
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn create(&self) -> SessionId {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(
            id,
            SessionEntry {
                session: Session::new(),
                last_seen: Utc::now(),
            },
        );
        info!(session = %id, active = sessions.len(), "session started");
        id
    }

    /// Run `f` against one session. `None` when the ID is unknown or expired.
    pub fn with_session<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.with_session_at(id, Utc::now(), f)
    }

    fn with_session_at<R>(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Option<R> {
        self.purge_expired_at(now);

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = now;
        Some(f(&mut entry.session))
    }

    pub fn remove(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = sessions.remove(&id).is_some();
        if removed {
            info!(session = %id, "session ended");
        }
        removed
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen <= self.idle_timeout);

        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, "expired sessions dropped");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::create_test_engine;

    #[test]
    fn test_resolved_search_selects_and_views() {
        let engine = create_test_engine();
        let mut session = Session::new();

        assert_eq!(session.search(&engine, "  hudson "), SearchStatus::Resolved);
        assert_eq!(session.selected(), Some("HUDSON ELECTRIC"));

        let view = session.view(&engine);
        let profile = view.profile.expect("profile should render");
        assert_eq!(profile.business_name, "HUDSON ELECTRIC");
        assert!(view.contracts.unwrap().summary().is_some());
        assert!(view.error.is_none());
    }

    #[test]
    fn test_ambiguous_waits_for_choice() {
        let engine = create_test_engine();
        let mut session = Session::new();

        assert_eq!(session.search(&engine, "acme"), SearchStatus::MultipleCandidates);
        assert_eq!(session.candidates(), ["ACME BUILDERS", "ACME BUILDERS INC"]);
        assert_eq!(session.selected(), None);

        let view = session.view(&engine);
        assert!(view.needs_choice());
        assert!(view.profile.is_none());
        assert!(view.contracts.is_none());
    }

    #[test]
    fn test_selection_uses_exact_name_only() {
        let engine = create_test_engine();
        let mut session = Session::new();
        session.search(&engine, "acme");

        session.select("ACME BUILDERS").unwrap();
        let view = session.view(&engine);

        let profile = view.profile.unwrap();
        assert_eq!(profile.business_name, "ACME BUILDERS");
        // Last "ACME BUILDERS" row wins; "ACME BUILDERS INC" never leaks in
        assert_eq!(profile.address, "12 Main St Ste 2");
        assert_eq!(profile.source_row, 3);
    }

    #[test]
    fn test_select_outside_candidates_is_rejected() {
        let engine = create_test_engine();
        let mut session = Session::new();
        session.search(&engine, "acme");

        let err = session.select("HUDSON ELECTRIC").unwrap_err();
        assert!(matches!(err, LookupError::NotACandidate { .. }));
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn test_no_match_clears_previous_selection() {
        let engine = create_test_engine();
        let mut session = Session::new();
        session.search(&engine, "hudson");
        assert!(session.selected().is_some());

        assert_eq!(session.search(&engine, "zzz"), SearchStatus::NoMatch);
        assert_eq!(session.selected(), None);
        assert!(session.candidates().is_empty());
        assert!(session.view(&engine).profile.is_none());
    }

    #[test]
    fn test_blank_query_awaits_input() {
        let engine = create_test_engine();
        let mut session = Session::new();
        session.search(&engine, "hudson");

        assert_eq!(session.search(&engine, "   "), SearchStatus::AwaitingInput);
        assert!(session.candidates().is_empty());
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn test_parse_error_surfaces_in_view() {
        let engine = create_test_engine();
        let mut session = Session::new();
        session.search(&engine, "erie");

        let view = session.view(&engine);

        assert!(view.profile.is_some(), "profile still renders");
        assert!(view.contracts.is_none());
        assert!(matches!(view.error, Some(LookupError::AmountParse { .. })));
    }

    #[test]
    fn test_view_serializes_status() {
        let engine = create_test_engine();
        let mut session = Session::new();
        session.search(&engine, "nothing here");

        let json = serde_json::to_value(session.view(&engine)).unwrap();
        assert_eq!(json["status"], "no_match");
        assert!(json.get("profile").is_none());
    }

    #[test]
    fn test_apply_search_matches_search() {
        let engine = create_test_engine();
        let mut direct = Session::new();
        let mut applied = Session::new();

        direct.search(&engine, "acme");
        applied.apply_search("acme", engine.search("acme"));

        assert_eq!(direct.view(&engine), applied.view(&engine));
    }

    #[test]
    fn test_snapshot_views_outside_store() {
        let engine = create_test_engine();
        let store = SessionStore::new(Duration::minutes(30));
        let id = store.create();

        let outcome = engine.search("hudson");
        let snapshot = store
            .with_session(id, |s| {
                s.apply_search("hudson", outcome);
                s.clone()
            })
            .unwrap();

        let view = snapshot.view(&engine);
        assert_eq!(view.profile.unwrap().business_name, "HUDSON ELECTRIC");
        assert_eq!(
            store.with_session(id, |s| s.selected().map(str::to_string)).unwrap().as_deref(),
            Some("HUDSON ELECTRIC")
        );
    }

    #[test]
    fn test_sessions_are_isolated() {
        let engine = create_test_engine();
        let store = SessionStore::new(Duration::minutes(30));
        let a = store.create();
        let b = store.create();

        store.with_session(a, |s| s.search(&engine, "hudson")).unwrap();
        store.with_session(b, |s| s.search(&engine, "acme")).unwrap();

        let a_selected = store.with_session(a, |s| s.selected().map(str::to_string)).unwrap();
        let b_selected = store.with_session(b, |s| s.selected().map(str::to_string)).unwrap();

        assert_eq!(a_selected.as_deref(), Some("HUDSON ELECTRIC"));
        assert_eq!(b_selected, None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = SessionStore::new(Duration::minutes(30));
        let id = store.create();
        let later = Utc::now() + Duration::minutes(31);

        assert_eq!(store.purge_expired_at(later), 1);
        assert!(store.with_session(id, |_| ()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_ends_session() {
        let store = SessionStore::new(Duration::minutes(30));
        let id = store.create();

        assert!(store.remove(id));
        assert!(!store.remove(id));
        assert!(store.with_session(id, |_| ()).is_none());
    }
}
