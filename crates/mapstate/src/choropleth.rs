use boundaries::collection::{BoundaryCollection, JOIN_KEY_PROP};
use datasets::error::DataError;
use datasets::fetch::{FetchRequest, Outbox, ResourceKey, ResourceKind};
use datasets::model::{ScoreMetric, ScoreSet};
use datasets::scores::Commit;
use engine::signal::FeatureHit;
use engine::surface::{EngineError, MapSurface};

use crate::symbology;

/// Geometry load sub-state.
///
/// Orthogonal to engine attachment: a restyle destroys the engine-side
/// source and layers but leaves the phase `Loaded`, because the application
/// cache still holds the validated collection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum GeometryPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Loads boundary geometry and keeps the engine's choropleth layers in sync
/// with it.
#[derive(Debug, Default)]
pub struct ChoroplethRenderer {
    phase: GeometryPhase,
    collection: Option<BoundaryCollection>,
    attached: bool,
    load_error: Option<DataError>,
    render_error: Option<EngineError>,
    epoch: u64,
    outbox: Outbox,
}

impl ChoroplethRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GeometryPhase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn collection(&self) -> Option<&BoundaryCollection> {
        self.collection.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn load_error(&self) -> Option<&DataError> {
        self.load_error.as_ref()
    }

    pub fn render_error(&self) -> Option<&EngineError> {
        self.render_error.as_ref()
    }

    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        self.outbox.drain()
    }

    /// Brings geometry toward "attached to the engine".
    ///
    /// Called whenever the engine reports ready (initial load, restyle
    /// completion) and after geometry completions. Reuses the cached
    /// collection when one exists, so a restyle never costs a second network
    /// fetch; otherwise queues at most one load. Load and render errors both
    /// hold the renderer still until an explicit retry/reset.
    pub fn ensure_geometry<E: MapSurface>(
        &mut self,
        engine: &mut E,
        scores: Option<&ScoreSet>,
        metric: ScoreMetric,
    ) {
        if self.attached || self.render_error.is_some() {
            return;
        }
        if self.collection.is_some() {
            self.attach(engine, scores, metric);
            return;
        }
        match self.phase {
            GeometryPhase::Idle => {
                self.phase = GeometryPhase::Loading;
                self.outbox.push(ResourceKey::Boundaries, self.epoch);
            }
            // Loaded without a collection cannot happen; treat it like the
            // other held states rather than panicking.
            GeometryPhase::Loading | GeometryPhase::Error | GeometryPhase::Loaded => {}
        }
    }

    /// Commits a geometry fetch completion, or drops it as stale.
    pub fn complete_geometry(&mut self, epoch: u64, result: Result<&str, DataError>) -> Commit {
        if epoch != self.epoch || self.phase != GeometryPhase::Loading {
            return Commit::Stale;
        }
        match result {
            Ok(body) => match BoundaryCollection::from_geojson_str(body) {
                Ok(collection) => {
                    self.collection = Some(collection);
                    self.phase = GeometryPhase::Loaded;
                    self.load_error = None;
                }
                Err(err) => {
                    self.phase = GeometryPhase::Error;
                    self.load_error = Some(DataError::payload_shape(
                        ResourceKind::Boundaries,
                        err.to_string(),
                    ));
                }
            },
            Err(err) => {
                self.phase = GeometryPhase::Error;
                self.load_error = Some(err);
            }
        }
        Commit::Committed
    }

    /// Clears a load failure and re-queues exactly one attempt.
    pub fn retry_geometry(&mut self) {
        if self.phase == GeometryPhase::Error && self.collection.is_none() {
            self.load_error = None;
            self.phase = GeometryPhase::Loading;
            self.outbox.push(ResourceKey::Boundaries, self.epoch);
        }
    }

    /// Manual reset for an isolated engine failure.
    pub fn reset(&mut self) {
        self.render_error = None;
    }

    /// The style swap destroyed the engine-side source and layers; the
    /// cached collection is untouched.
    pub fn detached_by_restyle(&mut self) {
        self.attached = false;
    }

    /// Re-derives the fill paint for new scores or a new metric.
    pub fn update_fill<E: MapSurface>(
        &mut self,
        engine: &mut E,
        scores: Option<&ScoreSet>,
        metric: ScoreMetric,
    ) {
        if !self.attached {
            return;
        }
        let expression = symbology::fill_color_expression(scores, metric);
        if let Err(err) =
            engine.set_paint_property(symbology::FILL_LAYER_ID, "fill-color", &expression)
        {
            self.render_error = Some(err);
        }
    }

    /// Resolves a clicked feature to its join key, or `None`.
    pub fn click_join_key(feature: Option<&FeatureHit>) -> Option<String> {
        feature?
            .property_str(JOIN_KEY_PROP)
            .map(|key| key.to_string())
    }

    /// Abandons in-flight work at component teardown. The cached collection
    /// survives for the next mount.
    pub fn teardown(&mut self) {
        self.epoch += 1;
        self.attached = false;
        self.render_error = None;
        if self.phase == GeometryPhase::Loading {
            self.phase = GeometryPhase::Idle;
        }
    }

    fn attach<E: MapSurface>(
        &mut self,
        engine: &mut E,
        scores: Option<&ScoreSet>,
        metric: ScoreMetric,
    ) {
        let Some(collection) = self.collection.as_ref() else {
            return;
        };
        // Presence checks make a retried attach after a partial failure
        // converge instead of tripping on its own earlier additions.
        let result = (|| -> Result<(), EngineError> {
            if !engine.has_source(symbology::SOURCE_ID) {
                engine.add_source(symbology::SOURCE_ID, collection.as_source_value())?;
            }
            if !engine.has_layer(symbology::FILL_LAYER_ID) {
                engine.add_layer(&symbology::fill_layer_descriptor())?;
            }
            if !engine.has_layer(symbology::OUTLINE_LAYER_ID) {
                engine.add_layer(&symbology::outline_layer_descriptor())?;
            }
            let expression = symbology::fill_color_expression(scores, metric);
            engine.set_paint_property(symbology::FILL_LAYER_ID, "fill-color", &expression)?;
            Ok(())
        })();
        match result {
            Ok(()) => self.attached = true,
            // Isolated at the rendering boundary; a manual reset re-arms.
            Err(err) => self.render_error = Some(err),
        }
    }
}
