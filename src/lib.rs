//! Per-room playback orchestration for group voice sessions.
//!
//! One independent pipeline per chat/room: an ordered track queue, a
//! single-flight transition protocol between tracks, and a reconnect
//! supervisor that keeps a room's stream alive across transient signaling
//! failures. The messaging platform, the voice transport and the media
//! resolver plug in through the [`resolver`] and [`transport`] traits.

pub mod common;
pub mod config;
pub mod player;
pub mod resolver;
pub mod track;
pub mod transport;

pub use common::types::RoomId;
pub use config::{Config, ReconnectConfig};
pub use player::{
    AdvanceOutcome, EnqueueOutcome, ErrorClassifier, FailureClass, PlaybackOrchestrator, RoomQueue,
    SubstringClassifier,
};
pub use resolver::{ResolveError, TrackResolver};
pub use track::Track;
pub use transport::{Notifier, NotifyError, TransportError, VoiceTransport};
