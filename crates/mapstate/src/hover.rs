use boundaries::collection::{JOIN_KEY_PROP, NAME_PROP, STATE_PROP};
use datasets::model::ScoreSet;
use engine::signal::FeatureHit;
use foundation::states::abbr_for_state_fips;
use runtime::frame::FrameCoalescer;
use runtime::notify::{SubscriberId, Subscribers};

/// Derived tooltip state for the county under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub position: [f64; 2],
    pub name: String,
    pub region: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
struct PointerSample {
    point: [f64; 2],
    feature: Option<FeatureHit>,
}

/// Result of one frame update.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverUpdate {
    pub hovered_fips: Option<String>,
    pub tooltip: Option<Tooltip>,
}

/// Frame-throttled hover-to-tooltip derivation.
///
/// Pointer events only record the latest sample; the derivation runs at most
/// once per frame when the host pumps `run_frame`. Pointer-leave clears
/// immediately without waiting for a frame.
#[derive(Debug, Default)]
pub struct HoverTooltipController {
    pending: FrameCoalescer<PointerSample>,
    tooltip: Option<Tooltip>,
    torn_down: bool,
    changes: Subscribers<Option<Tooltip>>,
}

impl HoverTooltipController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.has_pending()
    }

    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&Option<Tooltip>) + 'static,
    ) -> SubscriberId {
        self.changes.subscribe(handler)
    }

    /// Records a pointer sample, cancelling any not-yet-run frame update.
    pub fn pointer_move(&mut self, point: [f64; 2], feature: Option<FeatureHit>) {
        if self.torn_down {
            return;
        }
        self.pending.schedule(PointerSample { point, feature });
    }

    /// Cancels any pending frame and clears tooltip state immediately.
    pub fn pointer_leave(&mut self) {
        self.pending.cancel();
        self.set_tooltip(None);
    }

    /// Runs the coalesced frame update, if one is scheduled.
    ///
    /// Returns the derivation result so the caller can mirror the hovered
    /// county into the selection store.
    pub fn run_frame(&mut self, scores: Option<&ScoreSet>) -> Option<HoverUpdate> {
        let sample = self.pending.take()?;

        let Some(feature) = sample.feature else {
            self.set_tooltip(None);
            return Some(HoverUpdate {
                hovered_fips: None,
                tooltip: None,
            });
        };

        let Some(fips) = feature.property_str(JOIN_KEY_PROP).map(str::to_string) else {
            self.set_tooltip(None);
            return Some(HoverUpdate {
                hovered_fips: None,
                tooltip: None,
            });
        };

        let entry = scores.and_then(|s| s.get(&fips));
        let name = feature
            .property_str(NAME_PROP)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| entry.map(|e| e.name.clone()))
            .unwrap_or_default();
        let region = entry
            .map(|e| e.state.clone())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                feature
                    .property_str(STATE_PROP)
                    .and_then(abbr_for_state_fips)
                    .map(str::to_string)
            })
            .unwrap_or_default();

        let tooltip = Tooltip {
            position: sample.point,
            name,
            region,
            score: entry.map(|e| e.score),
        };
        self.set_tooltip(Some(tooltip.clone()));
        Some(HoverUpdate {
            hovered_fips: Some(fips),
            tooltip: Some(tooltip),
        })
    }

    /// Unregisters from further pointer input and drops pending state.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.pending.cancel();
        self.set_tooltip(None);
    }

    fn set_tooltip(&mut self, tooltip: Option<Tooltip>) {
        if self.tooltip == tooltip {
            return;
        }
        self.tooltip = tooltip;
        self.changes.emit(&self.tooltip);
    }
}
