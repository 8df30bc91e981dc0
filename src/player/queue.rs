use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{common::types::RoomId, track::Track};

/// Per-room FIFO track queues.
///
/// Each room's queue lives behind its own mutex, lazily created on first
/// access, so operations on different rooms never block each other. While a
/// track is playing it stays at the head of its room's queue; `advance`
/// pops it once the stream ends.
#[derive(Default)]
pub struct RoomQueue {
    queues: DashMap<RoomId, Arc<Mutex<VecDeque<Track>>>>,
}

impl RoomQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, room: RoomId) -> Arc<Mutex<VecDeque<Track>>> {
        self.queues.entry(room).or_default().clone()
    }

    /// Append a track; returns the new 1-based queue length.
    pub fn push(&self, room: RoomId, track: Track) -> usize {
        let queue = self.entry(room);
        let mut queue = queue.lock();
        queue.push_back(track);
        queue.len()
    }

    pub fn pop_front(&self, room: RoomId) -> Option<Track> {
        let queue = self.entry(room);
        let mut queue = queue.lock();
        queue.pop_front()
    }

    pub fn peek_front(&self, room: RoomId) -> Option<Track> {
        let queue = self.entry(room);
        let queue = queue.lock();
        queue.front().cloned()
    }

    /// Point-in-time copy of the room's queue, safe to iterate without
    /// holding the room's lock.
    pub fn snapshot(&self, room: RoomId) -> Vec<Track> {
        let queue = self.entry(room);
        let queue = queue.lock();
        queue.iter().cloned().collect()
    }

    pub fn clear(&self, room: RoomId) {
        let queue = self.entry(room);
        queue.lock().clear();
    }

    pub fn len(&self, room: RoomId) -> usize {
        let queue = self.entry(room);
        let guard = queue.lock();
        guard.len()
    }

    pub fn is_empty(&self, room: RoomId) -> bool {
        self.len(room) == 0
    }
}
