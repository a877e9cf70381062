use crate::error::DataError;
use crate::fetch::{FetchRequest, Outbox, ResourceKey, ResourceKind};
use crate::model::{AllDemographics, CountyDemographics};

/// Load state of the one demographics table.
///
/// Unlike score slots, a failure here stays armed: the table is large and
/// hangs off a low-traffic code path, so it is only re-attempted when the
/// user explicitly asks via `retry`.
#[derive(Debug, Default)]
enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded(AllDemographics),
    Failed(DataError),
}

/// Lazily loads the consolidated demographics table, at most once.
#[derive(Debug, Default)]
pub struct DemographicsStore {
    state: LoadState,
    epoch: u64,
    outbox: Outbox,
}

impl DemographicsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        self.outbox.drain()
    }

    /// Idempotent lazy load.
    ///
    /// Queues a fetch only from the idle state; callers arriving while the
    /// load is in flight share the pending operation, and a recorded failure
    /// is left alone until `retry` clears it.
    pub fn ensure_loaded(&mut self) {
        if matches!(self.state, LoadState::Idle) {
            self.state = LoadState::Loading;
            self.outbox.push(ResourceKey::Demographics, self.epoch);
        }
    }

    pub fn complete(&mut self, epoch: u64, result: Result<&str, DataError>) -> bool {
        if epoch != self.epoch || !matches!(self.state, LoadState::Loading) {
            return false;
        }
        self.state = match result {
            Ok(body) => match serde_json::from_str::<AllDemographics>(body) {
                Ok(table) => LoadState::Loaded(table),
                Err(err) => LoadState::Failed(DataError::payload_shape(
                    ResourceKind::Demographics,
                    err.to_string(),
                )),
            },
            Err(err) => LoadState::Failed(err),
        };
        true
    }

    /// Clears a recorded failure, re-arming exactly one further attempt.
    pub fn retry(&mut self) {
        if matches!(self.state, LoadState::Failed(_)) {
            self.state = LoadState::Idle;
        }
    }

    /// Abandons an in-flight load (component teardown). The cached table
    /// survives.
    pub fn invalidate_pending(&mut self) {
        self.epoch += 1;
        if matches!(self.state, LoadState::Loading) {
            self.state = LoadState::Idle;
        }
    }

    /// Synchronous pure read.
    ///
    /// `None` covers both "table not loaded" and "fips absent"; callers that
    /// care about the difference consult `is_loading` / `error`.
    pub fn lookup(&self, fips: &str) -> Option<&CountyDemographics> {
        match &self.state {
            LoadState::Loaded(table) => table.get(fips),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading)
    }

    pub fn error(&self) -> Option<&DataError> {
        match &self.state {
            LoadState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DemographicsStore;
    use crate::error::DataError;
    use crate::fetch::ResourceKind;

    const TABLE: &str = r#"{
        "12011": {"fips": "12011", "name": "Broward County", "state": "FL", "population": 1944375}
    }"#;

    #[test]
    fn double_ensure_triggers_exactly_one_fetch() {
        let mut store = DemographicsStore::new();
        store.ensure_loaded();
        store.ensure_loaded();
        assert!(store.is_loading());
        let requests = store.take_requests();
        assert_eq!(requests.len(), 1);

        store.complete(requests[0].epoch, Ok(TABLE));
        assert!(store.is_loaded());
        assert!(!store.is_loading());

        // Further calls are no-ops against the permanent cache.
        store.ensure_loaded();
        assert!(store.take_requests().is_empty());

        let a = store.lookup("12011").unwrap() as *const _;
        let b = store.lookup("12011").unwrap() as *const _;
        assert_eq!(a, b, "callers share the identical cached record");
    }

    #[test]
    fn failure_does_not_auto_retry() {
        let mut store = DemographicsStore::new();
        store.ensure_loaded();
        let req = store.take_requests().remove(0);
        store.complete(
            req.epoch,
            Err(DataError::network(ResourceKind::Demographics, "504")),
        );
        assert!(store.error().is_some());

        store.ensure_loaded();
        assert!(
            store.take_requests().is_empty(),
            "failed state must not re-queue on its own"
        );
    }

    #[test]
    fn retry_then_ensure_succeeds_and_clears_error() {
        let mut store = DemographicsStore::new();
        store.ensure_loaded();
        let req = store.take_requests().remove(0);
        store.complete(
            req.epoch,
            Err(DataError::network(ResourceKind::Demographics, "timeout")),
        );

        store.retry();
        assert!(store.error().is_none());

        store.ensure_loaded();
        let req = store.take_requests().remove(0);
        assert!(store.complete(req.epoch, Ok(TABLE)));
        assert!(store.is_loaded());
        assert_eq!(store.lookup("12011").unwrap().population, 1_944_375);
    }

    #[test]
    fn lookup_is_none_when_unloaded_or_absent() {
        let mut store = DemographicsStore::new();
        assert!(store.lookup("12011").is_none());

        store.ensure_loaded();
        let req = store.take_requests().remove(0);
        store.complete(req.epoch, Ok(TABLE));
        assert!(store.lookup("99999").is_none());
    }

    #[test]
    fn stale_completion_is_dropped() {
        let mut store = DemographicsStore::new();
        store.ensure_loaded();
        let req = store.take_requests().remove(0);

        store.invalidate_pending();
        assert_eq!(store.epoch(), req.epoch + 1);
        assert!(!store.complete(req.epoch, Ok(TABLE)));
        assert!(!store.is_loaded());
    }
}
