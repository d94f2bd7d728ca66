/// At-most-one-pending-redraw coalescing, the animation-frame analog: any
/// number of redraw requests between frames collapse into a single repaint.
#[derive(Debug, Default)]
pub struct RepaintScheduler {
    pending: bool,
    requests: u64,
}

impl RepaintScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) {
        self.pending = true;
        self.requests += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consumes the pending flag; the caller repaints iff this returns true.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Total requests seen, for diagnostics.
    pub fn request_count(&self) -> u64 {
        self.requests
    }

    /// Deactivation drops whatever was queued, the cancel-pending-frame analog.
    pub fn cancel(&mut self) {
        self.pending = false;
    }
}
