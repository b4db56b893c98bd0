use super::replacer::{FrameId, Replacer};
use std::collections::VecDeque;

/// Evicts the frame whose last access is oldest.
#[derive(Debug, Default)]
pub struct LruReplacer {
    /// Least recently used at the front
    order: VecDeque<FrameId>,
}

impl LruReplacer {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
        }
    }
}

impl Replacer for LruReplacer {
    fn record_access(&mut self, frame_id: FrameId) {
        self.remove(frame_id);
        self.order.push_back(frame_id);
    }

    fn evict(&mut self) -> Option<FrameId> {
        self.order.pop_front()
    }

    fn remove(&mut self, frame_id: FrameId) {
        if let Some(pos) = self.order.iter().position(|&f| f == frame_id) {
            self.order.remove(pos);
        }
    }

    fn size(&self) -> usize {
        self.order.len()
    }
}
