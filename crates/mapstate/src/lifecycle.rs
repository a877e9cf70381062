use datasets::selection::{CONTINENTAL_CENTER, DEFAULT_ZOOM};
use engine::surface::{EngineConfig, EngineError, MapSurface};
use foundation::time::Millis;
use runtime::deadline::Deadline;
use runtime::notify::{SubscriberId, Subscribers};

/// How long to wait for the engine's style-loaded signal before declaring
/// the restyle done anyway.
pub const RESTYLE_TIMEOUT_MS: u64 = 5_000;

/// Basemap theme, resolved to a concrete style document.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn style_url(&self) -> &'static str {
        match self {
            Theme::Light => "https://basemaps.cartocdn.com/gl/positron-gl-style/style.json",
            Theme::Dark => "https://basemaps.cartocdn.com/gl/dark-matter-gl-style/style.json",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapPhase {
    Uninitialized,
    Initializing,
    Ready,
    Restyling,
    TornDown,
}

/// What a `set_theme` call did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RestyleOutcome {
    /// The resolved style already matches the active one.
    Skipped,
    /// The engine is not ready; nothing was issued.
    NotReady,
    Started,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Initializing,
    Ready,
    RestyleStarted,
    /// `timed_out` marks the bounded-fallback path: the engine's signal
    /// never arrived and the controller proceeded as ready regardless.
    RestyleCompleted {
        timed_out: bool,
    },
    TornDown,
}

/// Owns the one rendering-engine instance and its lifecycle.
///
/// State machine: `Uninitialized -> Initializing -> Ready <-> Restyling ->
/// TornDown`. Teardown is re-entrant-safe and bumps the liveness epoch so
/// continuations captured before it never commit against a newer engine.
pub struct MapLifecycle<E: MapSurface> {
    engine: Option<E>,
    phase: MapPhase,
    active_style_url: Option<String>,
    restyle_deadline: Option<Deadline>,
    epoch: u64,
    events: Subscribers<LifecycleEvent>,
}

impl<E: MapSurface> Default for MapLifecycle<E> {
    fn default() -> Self {
        Self {
            engine: None,
            phase: MapPhase::Uninitialized,
            active_style_url: None,
            restyle_deadline: None,
            epoch: 0,
            events: Subscribers::new(),
        }
    }
}

impl<E: MapSurface> MapLifecycle<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> MapPhase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_ready(&self) -> bool {
        self.phase == MapPhase::Ready
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    pub fn active_style_url(&self) -> Option<&str> {
        self.active_style_url.as_deref()
    }

    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&LifecycleEvent) + 'static,
    ) -> SubscriberId {
        self.events.subscribe(handler)
    }

    /// Creates the engine instance and starts waiting for its loaded signal.
    ///
    /// Valid from `Uninitialized` and from the torn-down-equivalent state; a
    /// second initialization while an engine exists is ignored.
    pub fn initialize(&mut self, theme: Theme, create: impl FnOnce(&EngineConfig) -> E) {
        if !matches!(self.phase, MapPhase::Uninitialized | MapPhase::TornDown) {
            return;
        }
        let config = EngineConfig {
            style_url: theme.style_url().to_string(),
            center: CONTINENTAL_CENTER,
            zoom: DEFAULT_ZOOM,
        };
        self.engine = Some(create(&config));
        self.active_style_url = Some(config.style_url);
        self.phase = MapPhase::Initializing;
        self.events.emit(&LifecycleEvent::Initializing);
    }

    /// The engine finished its initial load.
    pub fn handle_loaded(&mut self) {
        if self.phase == MapPhase::Initializing {
            self.phase = MapPhase::Ready;
            self.events.emit(&LifecycleEvent::Ready);
        }
    }

    /// Requests a theme-driven style swap.
    ///
    /// Idempotent: a theme resolving to the already-active style is skipped
    /// without touching the engine.
    pub fn set_theme(&mut self, theme: Theme, now: Millis) -> Result<RestyleOutcome, EngineError> {
        if self.phase != MapPhase::Ready {
            return Ok(RestyleOutcome::NotReady);
        }
        let url = theme.style_url();
        if self.active_style_url.as_deref() == Some(url) {
            return Ok(RestyleOutcome::Skipped);
        }
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| EngineError::new("set_style", "no engine instance"))?;
        engine.set_style(url)?;
        self.active_style_url = Some(url.to_string());
        self.phase = MapPhase::Restyling;
        self.restyle_deadline = Some(Deadline::after(now, RESTYLE_TIMEOUT_MS));
        self.events.emit(&LifecycleEvent::RestyleStarted);
        Ok(RestyleOutcome::Started)
    }

    /// The engine finished rebuilding after a style swap.
    pub fn handle_style_loaded(&mut self) {
        if self.phase == MapPhase::Restyling {
            self.phase = MapPhase::Ready;
            self.restyle_deadline = None;
            self.events
                .emit(&LifecycleEvent::RestyleCompleted { timed_out: false });
        }
    }

    /// Drives the bounded restyle fallback.
    ///
    /// Returns `true` when the deadline elapsed and the controller declared
    /// the restyle complete without the engine's signal.
    pub fn tick(&mut self, now: Millis) -> bool {
        if self.phase != MapPhase::Restyling {
            return false;
        }
        let elapsed = self
            .restyle_deadline
            .is_some_and(|deadline| deadline.is_elapsed(now));
        if elapsed {
            self.phase = MapPhase::Ready;
            self.restyle_deadline = None;
            self.events
                .emit(&LifecycleEvent::RestyleCompleted { timed_out: true });
        }
        elapsed
    }

    /// Destroys the engine instance and resets to uninitialized-equivalent.
    ///
    /// Re-entrant-safe: repeated calls are no-ops.
    pub fn teardown(&mut self) {
        if self.phase == MapPhase::TornDown {
            return;
        }
        if let Some(mut engine) = self.engine.take() {
            engine.remove();
        }
        self.phase = MapPhase::TornDown;
        self.active_style_url = None;
        self.restyle_deadline = None;
        self.epoch += 1;
        self.events.emit(&LifecycleEvent::TornDown);
    }
}

impl<E: MapSurface> std::fmt::Debug for MapLifecycle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapLifecycle")
            .field("phase", &self.phase)
            .field("active_style_url", &self.active_style_url)
            .field("epoch", &self.epoch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecycleEvent, MapLifecycle, MapPhase, RESTYLE_TIMEOUT_MS, RestyleOutcome, Theme};
    use engine::recording::{RecordedCommand, RecordingEngine};
    use foundation::time::Millis;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ready_lifecycle() -> MapLifecycle<RecordingEngine> {
        let mut lc = MapLifecycle::new();
        lc.initialize(Theme::Light, RecordingEngine::new);
        lc.handle_loaded();
        lc
    }

    #[test]
    fn becomes_ready_only_on_engine_signal() {
        let mut lc: MapLifecycle<RecordingEngine> = MapLifecycle::new();
        lc.initialize(Theme::Light, RecordingEngine::new);
        assert_eq!(lc.phase(), MapPhase::Initializing);
        assert!(!lc.is_ready());

        lc.handle_loaded();
        assert!(lc.is_ready());
        assert_eq!(
            lc.engine().unwrap().style_url(),
            Theme::Light.style_url()
        );
    }

    #[test]
    fn same_theme_restyle_is_skipped() {
        let mut lc = ready_lifecycle();
        let outcome = lc.set_theme(Theme::Light, Millis(0)).unwrap();
        assert_eq!(outcome, RestyleOutcome::Skipped);
        assert_eq!(lc.phase(), MapPhase::Ready);
        assert_eq!(
            lc.engine()
                .unwrap()
                .count_of(|c| matches!(c, RecordedCommand::SetStyle { .. })),
            0
        );
    }

    #[test]
    fn restyle_returns_to_ready_on_style_loaded() {
        let mut lc = ready_lifecycle();
        let outcome = lc.set_theme(Theme::Dark, Millis(100)).unwrap();
        assert_eq!(outcome, RestyleOutcome::Started);
        assert_eq!(lc.phase(), MapPhase::Restyling);

        lc.handle_style_loaded();
        assert!(lc.is_ready());
        assert_eq!(lc.active_style_url(), Some(Theme::Dark.style_url()));
    }

    #[test]
    fn missed_style_signal_falls_back_on_the_deadline() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut lc = ready_lifecycle();
        let sink = Rc::clone(&events);
        lc.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        lc.set_theme(Theme::Dark, Millis(1_000)).unwrap();
        assert!(!lc.tick(Millis(1_000 + RESTYLE_TIMEOUT_MS - 1)));
        assert_eq!(lc.phase(), MapPhase::Restyling);

        assert!(lc.tick(Millis(1_000 + RESTYLE_TIMEOUT_MS)));
        assert!(lc.is_ready());
        assert!(
            events
                .borrow()
                .contains(&LifecycleEvent::RestyleCompleted { timed_out: true })
        );

        // A late engine signal after the fallback is a no-op.
        lc.handle_style_loaded();
        assert!(lc.is_ready());
    }

    #[test]
    fn teardown_destroys_the_engine_and_is_reentrant() {
        let mut lc = ready_lifecycle();
        let epoch_before = lc.epoch();
        lc.teardown();
        assert_eq!(lc.phase(), MapPhase::TornDown);
        assert!(lc.engine().is_none());
        assert_eq!(lc.epoch(), epoch_before + 1);

        lc.teardown();
        assert_eq!(lc.epoch(), epoch_before + 1, "repeated teardown is a no-op");

        // Torn down is uninitialized-equivalent: a fresh mount works.
        lc.initialize(Theme::Dark, RecordingEngine::new);
        lc.handle_loaded();
        assert!(lc.is_ready());
    }

    #[test]
    fn restyle_while_not_ready_is_rejected() {
        let mut lc: MapLifecycle<RecordingEngine> = MapLifecycle::new();
        lc.initialize(Theme::Light, RecordingEngine::new);
        let outcome = lc.set_theme(Theme::Dark, Millis(0)).unwrap();
        assert_eq!(outcome, RestyleOutcome::NotReady);
    }
}
