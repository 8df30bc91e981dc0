use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    classifier::{ErrorClassifier, FailureClass, SubstringClassifier},
    queue::RoomQueue,
    reconnect::{self, ReconnectCtx},
    state::{RoomRegistry, RoomState},
};
use crate::{
    common::types::{RoomId, Shared},
    config::ReconnectConfig,
    track::{Track, source_or_na},
    transport::{Notifier, VoiceTransport},
};

/// Reply to an `enqueue` command.
#[derive(Debug)]
pub enum EnqueueOutcome {
    /// The room was idle; the stream is live.
    Started { track: Track },
    /// The room was busy; the track was appended at `position` (1-based).
    Queued { position: usize, track: Track },
    /// The start attempt failed; the reconnect supervisor is armed and the
    /// display text explains what happened.
    StartFailed { class: FailureClass },
}

impl std::fmt::Display for EnqueueOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started { track } => write!(
                f,
                "Now playing: {} ({})\nSource: {}",
                track.title,
                track.format_duration(),
                source_or_na(&track.page_url),
            ),
            Self::Queued { position, track } => {
                write!(f, "Added to queue #{position}: {}", track.title)
            }
            Self::StartFailed { class } => f.write_str(class.user_message()),
        }
    }
}

/// Reply to an `advance`/`skip` command or stream-ended event.
#[derive(Debug)]
pub enum AdvanceOutcome {
    Next { track: Track },
    QueueEnded,
    StartFailed { class: FailureClass },
    NothingPlaying,
}

impl std::fmt::Display for AdvanceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Next { track } => write!(
                f,
                "Next track: {} ({})",
                track.title,
                track.format_duration()
            ),
            Self::QueueEnded => f.write_str("Queue ended. Left voice chat."),
            Self::StartFailed { class } => f.write_str(class.user_message()),
            Self::NothingPlaying => f.write_str("Nothing is currently playing."),
        }
    }
}

/// Per-room playback state machine.
///
/// Owns the room queues and registry; talks to the voice-session layer
/// through the [`VoiceTransport`] seam. Every transport `start` call happens
/// under the room's transition lock, so starts are strictly sequential per
/// room while rooms stay fully independent of each other.
pub struct PlaybackOrchestrator {
    queue: RoomQueue,
    rooms: RoomRegistry,
    transport: Arc<dyn VoiceTransport>,
    notifier: Arc<dyn Notifier>,
    classifier: Arc<dyn ErrorClassifier>,
    reconnect: ReconnectConfig,
}

impl PlaybackOrchestrator {
    pub fn new(
        transport: Arc<dyn VoiceTransport>,
        notifier: Arc<dyn Notifier>,
        reconnect: ReconnectConfig,
    ) -> Self {
        Self {
            queue: RoomQueue::new(),
            rooms: RoomRegistry::new(),
            transport,
            notifier,
            classifier: Arc::new(SubstringClassifier),
            reconnect,
        }
    }

    /// Swap in a transport-specific failure taxonomy.
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Append a track; start the stream when the room is idle.
    ///
    /// The push happens under the room's transition lock, so the reported
    /// position and the start decision cannot race a concurrent enqueue on
    /// the same room.
    pub async fn enqueue(&self, room: RoomId, track: Track) -> EnqueueOutcome {
        let state = self.rooms.room(room);
        let mut guard = state.lock().await;
        let position = self.queue.push(room, track.clone());

        if guard.active {
            debug!(room = %room, position, title = %track.title, "track appended");
            return EnqueueOutcome::Queued { position, track };
        }

        // The head may predate this push when a terminal reconnect failure
        // left queued tracks behind; playback resumes from it either way.
        let head = self.queue.peek_front(room).unwrap_or_else(|| track.clone());
        match self.try_start(room, &state, &mut guard, head).await {
            Ok(track) => EnqueueOutcome::Started { track },
            Err(class) => EnqueueOutcome::StartFailed { class },
        }
    }

    /// Move to the next track after the current stream ended (naturally or
    /// via `skip`). Pops the finished head, then either starts the new head
    /// or tears the room down.
    pub async fn advance(&self, room: RoomId) -> AdvanceOutcome {
        let state = self.rooms.room(room);
        let mut guard = state.lock().await;

        if !guard.active && guard.current.is_none() {
            return AdvanceOutcome::NothingPlaying;
        }

        self.queue.pop_front(room);
        match self.queue.peek_front(room) {
            None => {
                if let Some(handle) = guard.reconnect.take() {
                    handle.cancel();
                }
                guard.reset();
                if let Err(err) = self.transport.leave(room).await {
                    warn!(room = %room, error = %err, "failed to leave voice session");
                }
                info!(room = %room, "queue exhausted, room idle");
                drop(guard);
                self.notify(room, "Queue ended. Left voice chat.").await;
                AdvanceOutcome::QueueEnded
            }
            Some(next) => match self.try_start(room, &state, &mut guard, next).await {
                Ok(track) => {
                    drop(guard);
                    self.notify(
                        room,
                        &format!("Next track: {} ({})", track.title, track.format_duration()),
                    )
                    .await;
                    AdvanceOutcome::Next { track }
                }
                Err(class) => {
                    drop(guard);
                    self.notify(room, class.user_message()).await;
                    AdvanceOutcome::StartFailed { class }
                }
            },
        }
    }

    /// Administrative `advance`; only meaningful while something plays.
    /// Authorization is the command layer's concern.
    pub async fn skip(&self, room: RoomId) -> AdvanceOutcome {
        if !self.is_active(room).await {
            return AdvanceOutcome::NothingPlaying;
        }
        self.advance(room).await
    }

    /// Clear the queue, cancel any reconnect supervisor and leave the voice
    /// session. Succeeds regardless of the leave outcome.
    pub async fn stop(&self, room: RoomId) -> &'static str {
        let state = self.rooms.room(room);
        let mut guard = state.lock().await;

        if let Some(handle) = guard.reconnect.take() {
            handle.cancel();
        }
        self.queue.clear(room);
        guard.reset();
        if let Err(err) = self.transport.leave(room).await {
            warn!(room = %room, error = %err, "failed to leave voice session");
        }
        info!(room = %room, "stopped playback and cleared queue");
        "Stopped playback and cleared queue."
    }

    /// Point-in-time read; eventually consistent with concurrent mutation.
    pub async fn is_active(&self, room: RoomId) -> bool {
        self.rooms.room(room).lock().await.active
    }

    /// Point-in-time read; eventually consistent with concurrent mutation.
    pub async fn current_track(&self, room: RoomId) -> Option<Track> {
        self.rooms.room(room).lock().await.current.clone()
    }

    pub fn peek(&self, room: RoomId) -> Option<Track> {
        self.queue.peek_front(room)
    }

    pub fn queue_snapshot(&self, room: RoomId) -> Vec<Track> {
        self.queue.snapshot(room)
    }

    /// Start `track` on the transport while holding the room's transition
    /// lock. On failure the track stays authoritative as `current` and the
    /// reconnect supervisor takes over.
    async fn try_start(
        &self,
        room: RoomId,
        state: &Shared<RoomState>,
        guard: &mut RoomState,
        track: Track,
    ) -> Result<Track, FailureClass> {
        match self.transport.start(room, &track.stream_url).await {
            Ok(()) => {
                // A supervisor armed for a previous failure is obsolete once
                // a start succeeds; without this it would restart the stream
                // on its next iteration.
                if let Some(handle) = guard.reconnect.take() {
                    handle.cancel();
                }
                guard.active = true;
                guard.current = Some(track.clone());
                info!(room = %room, title = %track.title, "stream started");
                Ok(track)
            }
            Err(err) => {
                let class = self.classifier.classify(&err);
                warn!(room = %room, ?class, error = %err, "failed to start stream");
                guard.active = true;
                guard.current = Some(track);
                reconnect::arm(guard, self.reconnect_ctx(room, state.clone()));
                Err(class)
            }
        }
    }

    fn reconnect_ctx(&self, room: RoomId, state: Shared<RoomState>) -> ReconnectCtx {
        ReconnectCtx {
            room,
            state,
            transport: self.transport.clone(),
            notifier: self.notifier.clone(),
            classifier: self.classifier.clone(),
            backoff: Duration::from_secs(self.reconnect.backoff_secs),
            max_attempts: self.reconnect.max_attempts,
            cancel: CancellationToken::new(),
        }
    }

    async fn notify(&self, room: RoomId, text: &str) {
        if let Err(err) = self.notifier.notify(room, text).await {
            warn!(room = %room, error = %err, "failed to deliver notification");
        }
    }
}
