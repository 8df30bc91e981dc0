use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    common::types::{RoomId, Shared},
    track::Track,
};

/// Handle to a running reconnect supervisor task. At most one live handle
/// exists per room; arming while one is running is a no-op.
pub struct ReconnectHandle {
    pub task: JoinHandle<()>,
    pub cancel: CancellationToken,
}

impl ReconnectHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Request cooperative cancellation. The supervisor observes the token
    /// at each iteration boundary and inside its backoff sleep.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Mutable per-room playback state.
///
/// All mutations happen under the room's transition lock (the
/// `tokio::sync::Mutex` wrapping this struct), which is also held across
/// transport `start` calls so at most one start is ever in flight per room.
#[derive(Default)]
pub struct RoomState {
    /// Track currently streaming (or being re-established). Mirrors the
    /// head of the room's queue while set.
    pub current: Option<Track>,
    /// True iff the room has, or is re-establishing, a live stream.
    pub active: bool,
    pub reconnect: Option<ReconnectHandle>,
}

impl RoomState {
    /// Reset to empty-idle. Leaves the reconnect handle slot to the
    /// caller: orchestrator paths cancel it, the supervisor clears its own.
    pub fn reset(&mut self) {
        self.active = false;
        self.current = None;
    }
}

/// One lazily-created entry per room; rooms mutate independently and
/// concurrently.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Shared<RoomState>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The room's shared state, created on first access.
    pub fn room(&self, room: RoomId) -> Shared<RoomState> {
        self.rooms
            .entry(room)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(RoomState::default())))
            .clone()
    }
}
