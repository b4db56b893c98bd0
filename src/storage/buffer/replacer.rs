use std::fmt::Debug;

pub type FrameId = u32;

/// Chooses which resident frame to give up when the pool is full.
pub trait Replacer: Send + Sync + Debug {
    /// Note that `frame_id` was just used. Unknown frames become tracked.
    fn record_access(&mut self, frame_id: FrameId);

    /// Select and stop tracking a frame to evict. Returns None if no frame is tracked.
    fn evict(&mut self) -> Option<FrameId>;

    /// Stop tracking `frame_id`.
    fn remove(&mut self, frame_id: FrameId);

    /// Get the number of tracked frames.
    fn size(&self) -> usize;
}
