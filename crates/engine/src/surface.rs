use foundation::bounds::LngLatBounds;
use serde_json::Value;

/// A command the engine refused or failed to apply.
///
/// Engine internals are a third-party black box; all the orchestration layer
/// can know is which command failed and the engine's stated reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub command: &'static str,
    pub reason: String,
}

impl EngineError {
    pub fn new(command: &'static str, reason: impl Into<String>) -> Self {
        EngineError {
            command,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "engine {} failed: {}", self.command, self.reason)
    }
}

impl std::error::Error for EngineError {}

/// Creation-time engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub style_url: String,
    pub center: [f64; 2],
    pub zoom: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraTarget {
    pub center: [f64; 2],
    pub zoom: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FitOptions {
    pub padding_px: u32,
    pub max_zoom: f64,
}

/// Narrow capability surface over the third-party rendering engine.
///
/// This is the complete operation set the orchestration layer may use.
/// Sources, layer descriptors, and paint expressions travel as JSON values
/// because that is the engine's declarative style language; the trait stays
/// agnostic of any concrete binding.
pub trait MapSurface {
    fn add_source(&mut self, id: &str, data: &Value) -> Result<(), EngineError>;
    fn remove_source(&mut self, id: &str) -> Result<(), EngineError>;
    fn add_layer(&mut self, descriptor: &Value) -> Result<(), EngineError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError>;
    fn has_source(&self, id: &str) -> bool;
    fn has_layer(&self, id: &str) -> bool;
    fn set_paint_property(
        &mut self,
        layer_id: &str,
        property: &str,
        value: &Value,
    ) -> Result<(), EngineError>;
    /// Swaps the basemap style. Engine-side sources and layers do not
    /// survive the swap; application caches do.
    fn set_style(&mut self, style_url: &str) -> Result<(), EngineError>;
    fn fly_to(&mut self, target: CameraTarget) -> Result<(), EngineError>;
    fn fit_bounds(&mut self, bounds: LngLatBounds, opts: FitOptions) -> Result<(), EngineError>;
    /// Destroys the engine instance. Further commands are invalid.
    fn remove(&mut self);
}
