use crate::transport::TransportError;

/// Actionable category for a transport failure.
///
/// Each class carries a distinct recovery policy (see the reconnect
/// supervisor) and a user-facing explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The streaming account cannot reach the room at all (kicked, never
    /// added, room deleted). Requires administrative action; never retried.
    PeerUnreachable,
    /// The account is present but lacks permission to join or start the
    /// voice session. Never retried.
    CallForbidden,
    /// The room has no live voice session yet. The caller can retry
    /// manually once the voice chat is started.
    VoiceChatNotStarted,
    /// The resolved media URL itself is unusable. Never retried.
    InvalidStreamSource,
    /// Anything unrecognized. Retried with backoff.
    Transient,
}

impl FailureClass {
    /// Whether the reconnect supervisor may retry this class.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VoiceChatNotStarted | Self::Transient)
    }

    /// Plain explanatory text shown to users; never a raw transport error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PeerUnreachable => {
                "The streaming account cannot reach this room. Add it to the room and try again."
            }
            Self::CallForbidden => {
                "The streaming account is not allowed to join this room's voice chat."
            }
            Self::VoiceChatNotStarted => {
                "No live voice chat found. Start the group voice chat and try again."
            }
            Self::InvalidStreamSource => "This track cannot be streamed. Try a different query.",
            Self::Transient => {
                "Failed to start playback. Please ensure the group voice chat is started."
            }
        }
    }
}

/// Maps an opaque transport failure to a [`FailureClass`].
///
/// Pluggable so transport-specific failure taxonomies can be swapped in
/// without touching the orchestrator.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, failure: &TransportError) -> FailureClass;
}

/// Default classifier: recognizes known substrings/codes in the failure
/// text, case-insensitively. Unrecognized failures are `Transient`.
#[derive(Debug, Default)]
pub struct SubstringClassifier;

const PEER_UNREACHABLE: &[&str] = &[
    "channel_private",
    "channel private",
    "peer_id_invalid",
    "peer id invalid",
    "chat not found",
    "not a participant",
];

const CALL_FORBIDDEN: &[&str] = &[
    "groupcall_forbidden",
    "call forbidden",
    "chat_admin_required",
    "anonymous_works_only",
];

const VOICE_CHAT_NOT_STARTED: &[&str] = &[
    "groupcall_invalid",
    "no active group call",
    "group call not found",
    "voice chat is not started",
];

const INVALID_STREAM_SOURCE: &[&str] = &[
    "no audio source",
    "unsupported url",
    "invalid stream",
    "could not open stream",
];

impl ErrorClassifier for SubstringClassifier {
    fn classify(&self, failure: &TransportError) -> FailureClass {
        let text = failure.message.to_lowercase();
        let matches = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

        if matches(PEER_UNREACHABLE) {
            FailureClass::PeerUnreachable
        } else if matches(CALL_FORBIDDEN) {
            FailureClass::CallForbidden
        } else if matches(VOICE_CHAT_NOT_STARTED) {
            FailureClass::VoiceChatNotStarted
        } else if matches(INVALID_STREAM_SOURCE) {
            FailureClass::InvalidStreamSource
        } else {
            FailureClass::Transient
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(message: &str) -> FailureClass {
        SubstringClassifier.classify(&TransportError::new(message))
    }

    #[test]
    fn recognizes_known_codes_case_insensitively() {
        assert_eq!(
            classify("Telegram says: [400 CHANNEL_PRIVATE]"),
            FailureClass::PeerUnreachable
        );
        assert_eq!(
            classify("GROUPCALL_FORBIDDEN: join not allowed"),
            FailureClass::CallForbidden
        );
        assert_eq!(
            classify("GROUPCALL_INVALID: no such call"),
            FailureClass::VoiceChatNotStarted
        );
        assert_eq!(
            classify("ffmpeg: could not open stream"),
            FailureClass::InvalidStreamSource
        );
    }

    #[test]
    fn unrecognized_defaults_to_transient() {
        assert_eq!(classify("connection reset by peer"), FailureClass::Transient);
        assert!(FailureClass::Transient.is_retryable());
    }

    #[test]
    fn membership_and_source_failures_are_not_retryable() {
        assert!(!FailureClass::PeerUnreachable.is_retryable());
        assert!(!FailureClass::CallForbidden.is_retryable());
        assert!(!FailureClass::InvalidStreamSource.is_retryable());
    }
}
