use std::collections::{BTreeMap, BTreeSet};

use foundation::bounds::LngLatBounds;
use serde_json::Value;

use crate::surface::{CameraTarget, EngineConfig, EngineError, FitOptions, MapSurface};

/// One applied engine command, in application order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    AddSource { id: String },
    RemoveSource { id: String },
    AddLayer { id: String },
    RemoveLayer { id: String },
    SetPaintProperty { layer_id: String, property: String },
    SetStyle { style_url: String },
    FlyTo { center: [f64; 2], zoom: f64 },
    FitBounds { bounds: LngLatBounds, opts: FitOptions },
    Remove,
}

/// Deterministic in-memory engine double.
///
/// Mirrors the observable contract of a real engine: ids must be unique,
/// `set_style` rebuilds the scene empty, commands after `remove` fail. Every
/// applied command is recorded for assertions.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    commands: Vec<RecordedCommand>,
    sources: BTreeSet<String>,
    layers: BTreeSet<String>,
    paint: BTreeMap<(String, String), Value>,
    style_url: String,
    removed: bool,
    fail_next: Option<String>,
}

impl RecordingEngine {
    pub fn new(config: &EngineConfig) -> Self {
        RecordingEngine {
            style_url: config.style_url.clone(),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn style_url(&self) -> &str {
        &self.style_url
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn paint_property(&self, layer_id: &str, property: &str) -> Option<&Value> {
        self.paint
            .get(&(layer_id.to_string(), property.to_string()))
    }

    pub fn count_of(&self, matches: impl Fn(&RecordedCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| matches(c)).count()
    }

    /// Makes the next command fail with `reason`, then clears the injection.
    pub fn fail_next_command(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }

    fn check(&mut self, command: &'static str) -> Result<(), EngineError> {
        if self.removed {
            return Err(EngineError::new(command, "engine instance was removed"));
        }
        if let Some(reason) = self.fail_next.take() {
            return Err(EngineError::new(command, reason));
        }
        Ok(())
    }
}

impl MapSurface for RecordingEngine {
    fn add_source(&mut self, id: &str, _data: &Value) -> Result<(), EngineError> {
        self.check("add_source")?;
        if !self.sources.insert(id.to_string()) {
            return Err(EngineError::new("add_source", format!("duplicate source {id}")));
        }
        self.commands.push(RecordedCommand::AddSource { id: id.to_string() });
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), EngineError> {
        self.check("remove_source")?;
        if !self.sources.remove(id) {
            return Err(EngineError::new("remove_source", format!("unknown source {id}")));
        }
        self.commands.push(RecordedCommand::RemoveSource { id: id.to_string() });
        Ok(())
    }

    fn add_layer(&mut self, descriptor: &Value) -> Result<(), EngineError> {
        self.check("add_layer")?;
        let id = descriptor
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::new("add_layer", "descriptor missing id"))?;
        if !self.layers.insert(id.to_string()) {
            return Err(EngineError::new("add_layer", format!("duplicate layer {id}")));
        }
        self.commands.push(RecordedCommand::AddLayer { id: id.to_string() });
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError> {
        self.check("remove_layer")?;
        if !self.layers.remove(id) {
            return Err(EngineError::new("remove_layer", format!("unknown layer {id}")));
        }
        self.commands.push(RecordedCommand::RemoveLayer { id: id.to_string() });
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        !self.removed && self.sources.contains(id)
    }

    fn has_layer(&self, id: &str) -> bool {
        !self.removed && self.layers.contains(id)
    }

    fn set_paint_property(
        &mut self,
        layer_id: &str,
        property: &str,
        value: &Value,
    ) -> Result<(), EngineError> {
        self.check("set_paint_property")?;
        if !self.layers.contains(layer_id) {
            return Err(EngineError::new(
                "set_paint_property",
                format!("unknown layer {layer_id}"),
            ));
        }
        self.paint
            .insert((layer_id.to_string(), property.to_string()), value.clone());
        self.commands.push(RecordedCommand::SetPaintProperty {
            layer_id: layer_id.to_string(),
            property: property.to_string(),
        });
        Ok(())
    }

    fn set_style(&mut self, style_url: &str) -> Result<(), EngineError> {
        self.check("set_style")?;
        // A style swap discards everything the application added.
        self.sources.clear();
        self.layers.clear();
        self.paint.clear();
        self.style_url = style_url.to_string();
        self.commands.push(RecordedCommand::SetStyle {
            style_url: style_url.to_string(),
        });
        Ok(())
    }

    fn fly_to(&mut self, target: CameraTarget) -> Result<(), EngineError> {
        self.check("fly_to")?;
        self.commands.push(RecordedCommand::FlyTo {
            center: target.center,
            zoom: target.zoom,
        });
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: LngLatBounds, opts: FitOptions) -> Result<(), EngineError> {
        self.check("fit_bounds")?;
        self.commands.push(RecordedCommand::FitBounds { bounds, opts });
        Ok(())
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        self.sources.clear();
        self.layers.clear();
        self.paint.clear();
        self.commands.push(RecordedCommand::Remove);
    }
}
