use std::time::Duration;

/// Frame-loop counters for instrumentation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub presented: u64,
    pub dropped: u64,
    pub city_uploads: u64,
    pub atlas_uploads: u64,
    /// Cities swapped in, synchronously or from the worker.
    pub cities_installed: u64,
    /// Background results discarded as superseded or stale.
    pub generations_discarded: u64,
    /// Wall time spent inside the last `render_frame`.
    pub frame_time: Duration,
}

impl FrameStats {
    pub fn frames(&self) -> u64 {
        self.presented + self.dropped
    }
}
