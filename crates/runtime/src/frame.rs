/// Coalesces bursts of updates to at most one per animation frame.
///
/// `schedule` replaces any not-yet-run payload (the old one is cancelled),
/// and `take` consumes the pending payload at the frame boundary. Hosts call
/// `take` from their frame callback; tests call it directly.
#[derive(Debug)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    scheduled: u64,
    coalesced: u64,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self {
            pending: None,
            scheduled: 0,
            coalesced: 0,
        }
    }
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` for the next frame, replacing any pending one.
    ///
    /// Returns the replaced payload, if there was one.
    pub fn schedule(&mut self, payload: T) -> Option<T> {
        self.scheduled += 1;
        let replaced = self.pending.replace(payload);
        if replaced.is_some() {
            self.coalesced += 1;
        }
        replaced
    }

    /// Cancels the pending payload without running it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Consumes the pending payload at the frame boundary.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Total payloads scheduled since construction.
    pub fn scheduled_count(&self) -> u64 {
        self.scheduled
    }

    /// How many scheduled payloads were replaced before running.
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}
