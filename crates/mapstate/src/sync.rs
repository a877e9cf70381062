use datasets::demographics::DemographicsStore;
use datasets::error::DataError;
use datasets::fetch::{FetchRequest, ResourceKey, ResourceKind};
use datasets::model::ScoreMetric;
use datasets::scores::{Commit, RequestOutcome, ScoreDataStore};
use datasets::selection::SelectionState;
use engine::signal::EngineSignal;
use engine::surface::{EngineConfig, EngineError, MapSurface};
use foundation::ids::IndustryId;
use foundation::time::Millis;

use crate::choropleth::ChoroplethRenderer;
use crate::hover::HoverTooltipController;
use crate::lifecycle::{MapLifecycle, RestyleOutcome, Theme};
use crate::viewport::{FitOutcome, fit_to_state_filter};

/// Wires the stores, the engine lifecycle, and the derived map state into
/// one cooperative unit.
///
/// The host owns exactly one of these per mounted map. It feeds engine
/// signals and clock ticks in, drains fetch requests out to an I/O driver,
/// and routes completions back; everything in between is synchronous and
/// deterministic.
pub struct MapSync<E: MapSurface> {
    scores: ScoreDataStore,
    demographics: DemographicsStore,
    selection: SelectionState,
    lifecycle: MapLifecycle<E>,
    renderer: ChoroplethRenderer,
    hover: HoverTooltipController,
}

impl<E: MapSurface> Default for MapSync<E> {
    fn default() -> Self {
        Self {
            scores: ScoreDataStore::new(),
            demographics: DemographicsStore::new(),
            selection: SelectionState::new(),
            lifecycle: MapLifecycle::new(),
            renderer: ChoroplethRenderer::new(),
            hover: HoverTooltipController::new(),
        }
    }
}

impl<E: MapSurface> MapSync<E> {
    pub fn new() -> Self {
        Self::default()
    }

    // Component accessors; hosts subscribe to events through these.

    pub fn scores(&self) -> &ScoreDataStore {
        &self.scores
    }

    pub fn demographics(&self) -> &DemographicsStore {
        &self.demographics
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    pub fn lifecycle(&self) -> &MapLifecycle<E> {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut MapLifecycle<E> {
        &mut self.lifecycle
    }

    pub fn renderer(&self) -> &ChoroplethRenderer {
        &self.renderer
    }

    pub fn hover(&self) -> &HoverTooltipController {
        &self.hover
    }

    pub fn hover_mut(&mut self) -> &mut HoverTooltipController {
        &mut self.hover
    }

    /// Mounts the map: creates the engine and queues the catalog load.
    pub fn initialize(&mut self, theme: Theme, create: impl FnOnce(&EngineConfig) -> E) {
        self.lifecycle.initialize(theme, create);
        self.scores.request_catalog();
    }

    /// Routes one engine signal.
    pub fn handle_signal(&mut self, signal: EngineSignal) {
        match signal {
            EngineSignal::Loaded => {
                self.lifecycle.handle_loaded();
                self.sync_scene();
            }
            EngineSignal::StyleLoaded => {
                self.lifecycle.handle_style_loaded();
                self.sync_scene();
            }
            EngineSignal::Click { feature, .. } => {
                let fips = ChoroplethRenderer::click_join_key(feature.as_ref());
                self.select_county(fips);
            }
            EngineSignal::PointerMove { point, feature } => {
                self.hover.pointer_move(point, feature);
            }
            EngineSignal::PointerLeave => {
                self.hover.pointer_leave();
                self.selection.set_hovered(None);
            }
        }
    }

    /// Drives deadline-based fallbacks (the restyle timeout).
    pub fn tick(&mut self, now: Millis) {
        if self.lifecycle.tick(now) {
            self.sync_scene();
        }
    }

    /// Runs the per-frame hover derivation, if one is scheduled.
    pub fn run_frame(&mut self) {
        let scores = match self.selection.industry() {
            Some(id) => self.scores.scores(id),
            None => None,
        };
        if let Some(update) = self.hover.run_frame(scores) {
            self.selection.set_hovered(update.hovered_fips);
        }
    }

    /// Selects an industry and ensures its score set is cached or loading.
    ///
    /// Validation failures leave the previous selection untouched.
    pub fn select_industry(&mut self, raw_id: &str) -> Result<RequestOutcome, DataError> {
        let (id, outcome) = self.scores.request_scores(raw_id)?;
        self.selection.set_industry(Some(id));
        if outcome == RequestOutcome::Cached {
            self.repaint();
        }
        Ok(outcome)
    }

    /// Clears the industry selection; no score set means no rendering.
    pub fn clear_industry(&mut self) {
        self.selection.set_industry(None);
        self.repaint();
    }

    /// Selects a county (e.g. from a map click) and lazily loads the
    /// demographics table backing its detail panel.
    pub fn select_county(&mut self, fips: Option<String>) {
        self.selection.set_county(fips);
        if self.selection.county_fips().is_some() {
            self.demographics.ensure_loaded();
        }
    }

    /// Applies a state filter and refits the viewport to it.
    pub fn set_state_filter(&mut self, abbr: Option<String>) -> Result<FitOutcome, EngineError> {
        self.selection.set_state_filter(abbr);
        let filter = self.selection.state_filter().map(str::to_string);
        let Some(engine) = self.lifecycle.engine_mut() else {
            return Ok(FitOutcome::EngineUnavailable);
        };
        fit_to_state_filter(engine, self.renderer.collection(), filter.as_deref())
    }

    /// Switches the encoded metric and repaints the fill.
    pub fn set_metric(&mut self, metric: ScoreMetric) {
        self.selection.set_metric(metric);
        self.repaint();
    }

    /// Theme change; a real style swap detaches the engine-side scene.
    pub fn set_theme(&mut self, theme: Theme, now: Millis) -> Result<RestyleOutcome, EngineError> {
        let outcome = self.lifecycle.set_theme(theme, now)?;
        if outcome == RestyleOutcome::Started {
            self.renderer.detached_by_restyle();
        }
        Ok(outcome)
    }

    /// Drains every store's queued fetches for the I/O driver.
    pub fn drain_requests(&mut self) -> Vec<FetchRequest> {
        let mut requests = self.scores.take_requests();
        requests.extend(self.demographics.take_requests());
        requests.extend(self.renderer.take_requests());
        requests
    }

    /// Routes a fetch completion to the owning store.
    ///
    /// `epoch` must be the one carried by the originating request; stale
    /// completions are dropped without committing.
    pub fn complete(
        &mut self,
        key: &ResourceKey,
        epoch: u64,
        result: Result<&str, DataError>,
    ) -> Commit {
        match key {
            ResourceKey::Catalog => self.scores.complete_catalog(epoch, result),
            ResourceKey::Scores(id) => {
                let commit = self.scores.complete_scores(id, epoch, result);
                if commit == Commit::Committed && self.selection.industry() == Some(id) {
                    self.repaint();
                }
                commit
            }
            ResourceKey::Demographics => {
                if self.demographics.complete(epoch, result) {
                    Commit::Committed
                } else {
                    Commit::Stale
                }
            }
            ResourceKey::Boundaries => {
                let commit = self.renderer.complete_geometry(epoch, result);
                if commit == Commit::Committed {
                    self.sync_scene();
                }
                commit
            }
        }
    }

    /// User-facing retry affordance, by failed resource kind.
    pub fn retry(&mut self, kind: ResourceKind) {
        self.selection.request_retry(kind);
        match kind {
            ResourceKind::Catalog => {
                self.scores.retry_catalog();
            }
            ResourceKind::Scores => {
                if let Some(id) = self.selection.industry().cloned() {
                    self.scores.retry_scores(&id);
                }
            }
            ResourceKind::Demographics => {
                self.demographics.retry();
                self.demographics.ensure_loaded();
            }
            ResourceKind::Boundaries => {
                self.renderer.retry_geometry();
            }
        }
    }

    /// Manual reset for an isolated rendering failure.
    pub fn reset_renderer(&mut self) {
        self.renderer.reset();
        self.sync_scene();
    }

    /// Unmount: destroys the engine and abandons all in-flight work.
    /// Application caches survive for a later mount.
    pub fn teardown(&mut self) {
        self.lifecycle.teardown();
        self.hover.teardown();
        self.renderer.teardown();
        self.scores.invalidate_pending();
        self.demographics.invalidate_pending();
    }

    /// Reconciles engine-side scene state with the caches: geometry load,
    /// attachment, and fill paint, gated on engine readiness.
    fn sync_scene(&mut self) {
        if !self.lifecycle.is_ready() {
            return;
        }
        let metric = self.selection.metric();
        let scores = match self.selection.industry() {
            Some(id) => self.scores.scores(id),
            None => None,
        };
        let Some(engine) = self.lifecycle.engine_mut() else {
            return;
        };
        self.renderer.ensure_geometry(engine, scores, metric);
    }

    fn repaint(&mut self) {
        let metric = self.selection.metric();
        let scores = match self.selection.industry() {
            Some(id) => self.scores.scores(id),
            None => None,
        };
        let Some(engine) = self.lifecycle.engine_mut() else {
            return;
        };
        self.renderer.update_fill(engine, scores, metric);
    }

    /// Convenience for hosts rendering lists next to the map.
    pub fn current_industry(&self) -> Option<&IndustryId> {
        self.selection.industry()
    }
}
