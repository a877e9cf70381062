use std::borrow::Cow;
use std::collections::BTreeMap;

use foundation::ids::IndustryId;

use crate::error::DataError;
use crate::fetch::{FetchRequest, Outbox, ResourceKey, ResourceKind};
use crate::model::{CountyScore, Industry, ScoreSet};

pub const DEFAULT_TOP_N: usize = 10;

/// Load state of one cache slot.
///
/// `Loaded` is write-once: a committed value is never replaced. `Failed`
/// keeps the error for the retry affordance but does not poison the slot; a
/// later request transitions it back through `Loading`.
#[derive(Debug, Default)]
enum Slot<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(DataError),
}

impl<T> Slot<T> {
    fn is_loading(&self) -> bool {
        matches!(self, Slot::Loading)
    }

    fn loaded(&self) -> Option<&T> {
        match self {
            Slot::Loaded(value) => Some(value),
            _ => None,
        }
    }

    fn error(&self) -> Option<&DataError> {
        match self {
            Slot::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// What a request call did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The value is already cached; nothing was queued.
    Cached,
    /// A fetch for this key is already pending; the caller shares it.
    InFlight,
    /// A new fetch was queued.
    Queued,
}

/// Whether a completion committed or was dropped as stale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Commit {
    Committed,
    Stale,
}

/// Catalog and per-industry score sets.
///
/// Owns its caches explicitly (injected into consumers, fresh per test) and
/// provides the at-most-once-fetch guarantee per key: a key in `Loading`
/// never queues a second request, and completions carry the epoch stamped at
/// queue time so commits from a superseded context are dropped.
#[derive(Debug, Default)]
pub struct ScoreDataStore {
    catalog: Slot<Vec<Industry>>,
    sets: BTreeMap<IndustryId, Slot<ScoreSet>>,
    epoch: u64,
    outbox: Outbox,
}

impl ScoreDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Drains queued fetch requests for the I/O driver.
    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        self.outbox.drain()
    }

    /// Abandons all in-flight loads (component teardown).
    ///
    /// Cached values survive; only pending work is invalidated. Completions
    /// stamped with an older epoch will be dropped.
    pub fn invalidate_pending(&mut self) {
        self.epoch += 1;
        if self.catalog.is_loading() {
            self.catalog = Slot::Idle;
        }
        for slot in self.sets.values_mut() {
            if slot.is_loading() {
                *slot = Slot::Idle;
            }
        }
    }

    // --- catalog ---

    pub fn request_catalog(&mut self) -> RequestOutcome {
        match self.catalog {
            Slot::Loaded(_) => RequestOutcome::Cached,
            Slot::Loading => RequestOutcome::InFlight,
            Slot::Idle | Slot::Failed(_) => {
                self.catalog = Slot::Loading;
                self.outbox.push(ResourceKey::Catalog, self.epoch);
                RequestOutcome::Queued
            }
        }
    }

    pub fn complete_catalog(&mut self, epoch: u64, result: Result<&str, DataError>) -> Commit {
        if epoch != self.epoch || !self.catalog.is_loading() {
            return Commit::Stale;
        }
        self.catalog = match result {
            Ok(body) => match serde_json::from_str::<Vec<Industry>>(body) {
                Ok(entries) => Slot::Loaded(entries),
                Err(err) => Slot::Failed(DataError::payload_shape(
                    ResourceKind::Catalog,
                    err.to_string(),
                )),
            },
            Err(err) => Slot::Failed(err),
        };
        Commit::Committed
    }

    pub fn catalog(&self) -> Option<&[Industry]> {
        self.catalog.loaded().map(|v| v.as_slice())
    }

    pub fn catalog_error(&self) -> Option<&DataError> {
        self.catalog.error()
    }

    pub fn is_catalog_loading(&self) -> bool {
        self.catalog.is_loading()
    }

    pub fn known_industry(&self, id: &str) -> bool {
        self.catalog()
            .is_some_and(|entries| entries.iter().any(|e| e.id == id))
    }

    /// Clears a failed catalog slot and re-queues exactly one attempt.
    pub fn retry_catalog(&mut self) -> RequestOutcome {
        if self.catalog.error().is_some() {
            self.catalog = Slot::Idle;
        }
        self.request_catalog()
    }

    // --- per-industry score sets ---

    /// Validates `raw_id` and ensures its score set is cached or loading.
    ///
    /// A syntactically invalid or catalog-unknown id short-circuits with
    /// `Validation` before any resource path is built; no request is queued.
    pub fn request_scores(&mut self, raw_id: &str) -> Result<(IndustryId, RequestOutcome), DataError> {
        let id = IndustryId::parse(raw_id).map_err(|e| DataError::validation(e.to_string()))?;
        if !self.known_industry(id.as_str()) {
            return Err(DataError::validation(format!(
                "unknown industry id: {id}"
            )));
        }

        let slot = self.sets.entry(id.clone()).or_default();
        let outcome = match slot {
            Slot::Loaded(_) => RequestOutcome::Cached,
            Slot::Loading => RequestOutcome::InFlight,
            Slot::Idle | Slot::Failed(_) => {
                *slot = Slot::Loading;
                self.outbox.push(ResourceKey::Scores(id.clone()), self.epoch);
                RequestOutcome::Queued
            }
        };
        Ok((id, outcome))
    }

    pub fn complete_scores(
        &mut self,
        id: &IndustryId,
        epoch: u64,
        result: Result<&str, DataError>,
    ) -> Commit {
        if epoch != self.epoch {
            return Commit::Stale;
        }
        let Some(slot) = self.sets.get_mut(id) else {
            return Commit::Stale;
        };
        if !slot.is_loading() {
            return Commit::Stale;
        }
        *slot = match result {
            Ok(body) => match serde_json::from_str::<ScoreSet>(body) {
                Ok(set) => Slot::Loaded(set),
                Err(err) => Slot::Failed(DataError::payload_shape(
                    ResourceKind::Scores,
                    err.to_string(),
                )),
            },
            Err(err) => Slot::Failed(err),
        };
        Commit::Committed
    }

    pub fn scores(&self, id: &IndustryId) -> Option<&ScoreSet> {
        self.sets.get(id).and_then(|slot| slot.loaded())
    }

    pub fn scores_error(&self, id: &IndustryId) -> Option<&DataError> {
        self.sets.get(id).and_then(|slot| slot.error())
    }

    pub fn is_scores_loading(&self, id: &IndustryId) -> bool {
        self.sets.get(id).is_some_and(|slot| slot.is_loading())
    }

    /// Clears a failed score slot and re-queues exactly one attempt.
    pub fn retry_scores(&mut self, id: &IndustryId) -> RequestOutcome {
        let slot = self.sets.entry(id.clone()).or_default();
        match slot {
            Slot::Loaded(_) => RequestOutcome::Cached,
            Slot::Loading => RequestOutcome::InFlight,
            Slot::Idle | Slot::Failed(_) => {
                *slot = Slot::Loading;
                self.outbox.push(ResourceKey::Scores(id.clone()), self.epoch);
                RequestOutcome::Queued
            }
        }
    }
}

/// Subset of `scores` whose entries belong to `abbr`.
///
/// `None` is the unfiltered whole-country view and passes the input through
/// without copying.
pub fn filter_by_state<'a>(scores: &'a ScoreSet, abbr: Option<&str>) -> Cow<'a, ScoreSet> {
    match abbr {
        None => Cow::Borrowed(scores),
        Some(abbr) => Cow::Owned(
            scores
                .iter()
                .filter(|(_, entry)| entry.state == abbr)
                .map(|(fips, entry)| (fips.clone(), entry.clone()))
                .collect(),
        ),
    }
}

/// Top `n` entries by score.
///
/// Ordering contract:
/// - Descending by score.
/// - Equal scores break ties by FIPS ascending, deterministically.
pub fn top_n(scores: &ScoreSet, n: usize) -> Vec<&CountyScore> {
    let mut entries: Vec<&CountyScore> = scores.values().collect();
    entries.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.fips.cmp(&b.fips))
    });
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::{Commit, RequestOutcome, ScoreDataStore, filter_by_state, top_n};
    use crate::error::DataError;
    use crate::fetch::{ResourceKey, ResourceKind};
    use crate::model::{CountyScore, ScoreSet};
    use pretty_assertions::assert_eq;
    use std::borrow::Cow;

    const CATALOG: &str = r#"[
        {"id": "coffee-shops", "label": "Coffee Shops"},
        {"id": "gyms", "label": "Gyms & Fitness"}
    ]"#;

    const COFFEE_SCORES: &str = r#"{
        "12011": {"fips": "12011", "name": "Broward", "state": "FL", "score": 82},
        "48201": {"fips": "48201", "name": "Harris", "state": "TX", "score": 91}
    }"#;

    fn loaded_store() -> ScoreDataStore {
        let mut store = ScoreDataStore::new();
        assert_eq!(store.request_catalog(), RequestOutcome::Queued);
        let req = store.take_requests().remove(0);
        store.complete_catalog(req.epoch, Ok(CATALOG));
        store
    }

    fn entry(fips: &str, state: &str, score: f64) -> CountyScore {
        CountyScore {
            fips: fips.to_string(),
            name: String::new(),
            state: state.to_string(),
            score,
            establishment_count: 0.0,
            population_per_biz: 0.0,
        }
    }

    #[test]
    fn concurrent_catalog_callers_share_one_fetch() {
        let mut store = ScoreDataStore::new();
        assert_eq!(store.request_catalog(), RequestOutcome::Queued);
        assert!(store.is_catalog_loading());
        assert_eq!(store.request_catalog(), RequestOutcome::InFlight);
        assert_eq!(store.request_catalog(), RequestOutcome::InFlight);
        assert_eq!(store.take_requests().len(), 1);
    }

    #[test]
    fn concurrent_scores_callers_share_one_fetch_and_one_result() {
        let mut store = loaded_store();
        store.take_requests();

        let (id, first) = store.request_scores("coffee-shops").unwrap();
        let (_, second) = store.request_scores("coffee-shops").unwrap();
        assert_eq!(first, RequestOutcome::Queued);
        assert_eq!(second, RequestOutcome::InFlight);
        assert!(store.is_scores_loading(&id));

        let requests = store.take_requests();
        assert_eq!(requests.len(), 1, "exactly one network fetch");
        assert_eq!(requests[0].key, ResourceKey::Scores(id.clone()));

        store.complete_scores(&id, requests[0].epoch, Ok(COFFEE_SCORES));
        let a = store.scores(&id).unwrap() as *const ScoreSet;
        let b = store.scores(&id).unwrap() as *const ScoreSet;
        assert_eq!(a, b, "all callers observe the identical cached object");
    }

    #[test]
    fn invalid_or_unknown_ids_never_queue_requests() {
        let mut store = loaded_store();
        store.take_requests();

        let err = store.request_scores("../etc/passwd").unwrap_err();
        assert!(matches!(err, DataError::Validation { .. }));

        let err = store.request_scores("bogus-id").unwrap_err();
        assert!(matches!(err, DataError::Validation { .. }));

        assert!(store.take_requests().is_empty(), "zero network calls");
    }

    #[test]
    fn failed_scores_slot_is_cleared_not_poisoned() {
        let mut store = loaded_store();
        store.take_requests();

        let (id, _) = store.request_scores("gyms").unwrap();
        let req = store.take_requests().remove(0);
        store.complete_scores(
            &id,
            req.epoch,
            Err(DataError::network(ResourceKind::Scores, "503")),
        );
        assert!(store.scores_error(&id).is_some());
        assert!(store.scores(&id).is_none());

        // Re-requesting after failure queues a fresh fetch.
        let (_, outcome) = store.request_scores("gyms").unwrap();
        assert_eq!(outcome, RequestOutcome::Queued);
        let req = store.take_requests().remove(0);
        store.complete_scores(&id, req.epoch, Ok(r#"{}"#));
        assert!(store.scores(&id).is_some());
        assert!(store.scores_error(&id).is_none());
    }

    #[test]
    fn malformed_scores_payload_is_a_shape_error() {
        let mut store = loaded_store();
        store.take_requests();

        let (id, _) = store.request_scores("gyms").unwrap();
        let req = store.take_requests().remove(0);
        store.complete_scores(&id, req.epoch, Ok(r#"["not", "a", "map"]"#));
        assert!(matches!(
            store.scores_error(&id),
            Some(DataError::PayloadShape { .. })
        ));
    }

    #[test]
    fn stale_epoch_completions_are_dropped() {
        let mut store = loaded_store();
        store.take_requests();

        let (id, _) = store.request_scores("coffee-shops").unwrap();
        let req = store.take_requests().remove(0);

        store.invalidate_pending();
        assert_eq!(store.epoch(), req.epoch + 1);
        let commit = store.complete_scores(&id, req.epoch, Ok(COFFEE_SCORES));
        assert_eq!(commit, Commit::Stale);
        assert!(store.scores(&id).is_none());

        // The slot went back to idle, so a fresh request works.
        let (_, outcome) = store.request_scores("coffee-shops").unwrap();
        assert_eq!(outcome, RequestOutcome::Queued);
    }

    #[test]
    fn retry_clears_failure_and_requeues_once() {
        let mut store = loaded_store();
        store.take_requests();

        let (id, _) = store.request_scores("gyms").unwrap();
        let req = store.take_requests().remove(0);
        store.complete_scores(
            &id,
            req.epoch,
            Err(DataError::network(ResourceKind::Scores, "timeout")),
        );

        assert_eq!(store.retry_scores(&id), RequestOutcome::Queued);
        assert_eq!(store.retry_scores(&id), RequestOutcome::InFlight);
        assert_eq!(store.take_requests().len(), 1);
    }

    #[test]
    fn filter_by_state_passthrough_and_subset() {
        let mut scores = ScoreSet::new();
        scores.insert("12011".to_string(), entry("12011", "FL", 82.0));
        scores.insert("48201".to_string(), entry("48201", "TX", 91.0));

        let unfiltered = filter_by_state(&scores, None);
        assert!(matches!(unfiltered, Cow::Borrowed(_)));
        assert_eq!(unfiltered.len(), 2);

        let texas = filter_by_state(&scores, Some("TX"));
        assert_eq!(texas.len(), 1);
        assert!(texas.contains_key("48201"));

        let top = top_n(&texas, 1);
        assert_eq!(top[0].fips, "48201");
        assert_eq!(top[0].score, 91.0);
    }

    #[test]
    fn top_n_is_descending_with_fips_tie_break() {
        let mut scores = ScoreSet::new();
        scores.insert("30001".to_string(), entry("30001", "MT", 70.0));
        scores.insert("10003".to_string(), entry("10003", "DE", 88.0));
        scores.insert("20005".to_string(), entry("20005", "KS", 88.0));
        scores.insert("40007".to_string(), entry("40007", "OK", 95.0));

        let ordered: Vec<&str> = top_n(&scores, 10).iter().map(|e| e.fips.as_str()).collect();
        assert_eq!(ordered, vec!["40007", "10003", "20005", "30001"]);

        let capped: Vec<&str> = top_n(&scores, 2).iter().map(|e| e.fips.as_str()).collect();
        assert_eq!(capped, vec!["40007", "10003"]);
    }

    #[test]
    fn catalog_failure_allows_re_request() {
        let mut store = ScoreDataStore::new();
        store.request_catalog();
        let req = store.take_requests().remove(0);
        store.complete_catalog(
            req.epoch,
            Err(DataError::network(ResourceKind::Catalog, "offline")),
        );
        assert!(store.catalog().is_none());
        assert!(store.catalog_error().is_some());

        assert_eq!(store.request_catalog(), RequestOutcome::Queued);
        let req = store.take_requests().remove(0);
        store.complete_catalog(req.epoch, Ok(CATALOG));
        assert_eq!(store.catalog().unwrap().len(), 2);
    }
}
