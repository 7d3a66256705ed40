use std::fmt::Debug;

/// Index of a frame in the buffer pool's arena. Stable for the lifetime of the pool.
pub type FrameId = usize;

pub trait Replacer: Send + Sync + Debug {
    /// Record an access to a frame, making it the most recently used.
    /// Frames not yet tracked start being tracked.
    fn record_access(&mut self, frame_id: FrameId);

    /// Stop tracking a frame.
    fn remove(&mut self, frame_id: FrameId);

    /// The frame that should be evicted next, without removing it.
    fn victim(&self) -> Option<FrameId>;

    /// Get the number of tracked frames.
    fn size(&self) -> usize;
}
