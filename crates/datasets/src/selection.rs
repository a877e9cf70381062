use foundation::ids::IndustryId;
use runtime::notify::{SubscriberId, Subscribers};

use crate::fetch::ResourceKind;
use crate::model::ScoreMetric;

/// Default camera over the continental US.
pub const CONTINENTAL_CENTER: [f64; 2] = [-98.5795, 39.8283];
pub const DEFAULT_ZOOM: f64 = 3.5;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub center: [f64; 2],
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            center: CONTINENTAL_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Change notifications emitted by the selection store.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    IndustrySelected(Option<IndustryId>),
    CountySelected(Option<String>),
    HoverChanged(Option<String>),
    StateFilterChanged(Option<String>),
    MetricChanged(ScoreMetric),
    ViewportChanged(Viewport),
    RetryRequested(ResourceKind),
}

/// Single source of truth for what the user is looking at.
///
/// Mutated only through the explicit setters; each setter notifies
/// subscribers only when the value actually changed, so observers never see
/// redundant transitions.
#[derive(Debug, Default)]
pub struct SelectionState {
    industry: Option<IndustryId>,
    county_fips: Option<String>,
    hovered_fips: Option<String>,
    state_filter: Option<String>,
    metric: ScoreMetric,
    viewport: Viewport,
    subscribers: Subscribers<SelectionEvent>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&SelectionEvent) + 'static,
    ) -> SubscriberId {
        self.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn industry(&self) -> Option<&IndustryId> {
        self.industry.as_ref()
    }

    pub fn county_fips(&self) -> Option<&str> {
        self.county_fips.as_deref()
    }

    pub fn hovered_fips(&self) -> Option<&str> {
        self.hovered_fips.as_deref()
    }

    pub fn state_filter(&self) -> Option<&str> {
        self.state_filter.as_deref()
    }

    pub fn metric(&self) -> ScoreMetric {
        self.metric
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_industry(&mut self, industry: Option<IndustryId>) {
        if self.industry == industry {
            return;
        }
        self.industry = industry.clone();
        self.subscribers
            .emit(&SelectionEvent::IndustrySelected(industry));
    }

    pub fn set_county(&mut self, fips: Option<String>) {
        if self.county_fips == fips {
            return;
        }
        self.county_fips = fips.clone();
        self.subscribers.emit(&SelectionEvent::CountySelected(fips));
    }

    pub fn set_hovered(&mut self, fips: Option<String>) {
        if self.hovered_fips == fips {
            return;
        }
        self.hovered_fips = fips.clone();
        self.subscribers.emit(&SelectionEvent::HoverChanged(fips));
    }

    pub fn set_state_filter(&mut self, abbr: Option<String>) {
        if self.state_filter == abbr {
            return;
        }
        self.state_filter = abbr.clone();
        self.subscribers
            .emit(&SelectionEvent::StateFilterChanged(abbr));
    }

    pub fn set_metric(&mut self, metric: ScoreMetric) {
        if self.metric == metric {
            return;
        }
        self.metric = metric;
        self.subscribers.emit(&SelectionEvent::MetricChanged(metric));
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport == viewport {
            return;
        }
        self.viewport = viewport;
        self.subscribers
            .emit(&SelectionEvent::ViewportChanged(viewport));
    }

    /// Relays a user retry affordance to whoever owns the failed resource.
    pub fn request_retry(&mut self, kind: ResourceKind) {
        self.subscribers.emit(&SelectionEvent::RetryRequested(kind));
    }
}
