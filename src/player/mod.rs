pub mod classifier;
pub mod playback;
pub mod queue;
pub mod reconnect;
pub mod state;

pub use classifier::{ErrorClassifier, FailureClass, SubstringClassifier};
pub use playback::{AdvanceOutcome, EnqueueOutcome, PlaybackOrchestrator};
pub use queue::RoomQueue;
pub use state::{ReconnectHandle, RoomRegistry, RoomState};
