use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    classifier::{ErrorClassifier, FailureClass},
    state::{ReconnectHandle, RoomState},
};
use crate::{
    common::types::{RoomId, Shared},
    transport::{Notifier, VoiceTransport},
};

/// Everything a supervisor task needs, captured at arm time.
pub(crate) struct ReconnectCtx {
    pub room: RoomId,
    pub state: Shared<RoomState>,
    pub transport: Arc<dyn VoiceTransport>,
    pub notifier: Arc<dyn Notifier>,
    pub classifier: Arc<dyn ErrorClassifier>,
    pub backoff: Duration,
    /// Zero means unlimited.
    pub max_attempts: u32,
    pub cancel: CancellationToken,
}

/// Launch a supervisor task for the room unless one is already running.
///
/// Must be called while holding the room's transition lock; `guard` is that
/// lock's content. Idempotent: a live, unfinished handle wins.
pub(crate) fn arm(guard: &mut RoomState, ctx: ReconnectCtx) {
    if let Some(handle) = &guard.reconnect {
        if !handle.is_finished() {
            debug!(room = %ctx.room, "reconnect supervisor already armed");
            return;
        }
    }
    info!(room = %ctx.room, "arming reconnect supervisor");
    let cancel = ctx.cancel.clone();
    let task = tokio::spawn(run(ctx));
    guard.reconnect = Some(ReconnectHandle { task, cancel });
}

enum Step {
    Reconnected(String),
    Terminal(FailureClass),
    GiveUp,
    Silent,
    Retry,
}

/// Retry loop for one arm cycle. The attempt counter is local to the cycle;
/// a fresh arm after the handle slot is released starts again at 1.
async fn run(ctx: ReconnectCtx) {
    let mut attempt: u32 = 0;
    loop {
        if ctx.cancel.is_cancelled() {
            return;
        }
        attempt += 1;

        // One attempt per iteration, under the room's transition lock so no
        // other start call can overlap it.
        let step = {
            let mut guard = ctx.state.lock().await;
            if ctx.cancel.is_cancelled() {
                return;
            }
            if !guard.active {
                guard.reconnect = None;
                return;
            }
            let Some(track) = guard.current.clone() else {
                guard.reconnect = None;
                return;
            };

            if ctx.max_attempts > 0 && attempt > ctx.max_attempts {
                guard.reset();
                guard.reconnect = None;
                Step::GiveUp
            } else {
                match ctx.transport.start(ctx.room, &track.stream_url).await {
                    Ok(()) => {
                        guard.reconnect = None;
                        Step::Reconnected(track.title)
                    }
                    Err(err) => {
                        let class = ctx.classifier.classify(&err);
                        warn!(
                            room = %ctx.room,
                            attempt,
                            ?class,
                            error = %err,
                            "reconnect attempt failed"
                        );
                        match class {
                            FailureClass::PeerUnreachable | FailureClass::CallForbidden => {
                                guard.reset();
                                guard.reconnect = None;
                                Step::Terminal(class)
                            }
                            FailureClass::InvalidStreamSource => {
                                guard.reset();
                                guard.reconnect = None;
                                Step::Silent
                            }
                            _ => Step::Retry,
                        }
                    }
                }
            }
        };

        match step {
            Step::Reconnected(title) => {
                info!(room = %ctx.room, attempt, "stream re-established");
                notify(&ctx, &format!("Reconnected: {title}")).await;
                return;
            }
            Step::Terminal(class) => {
                notify(&ctx, class.user_message()).await;
                return;
            }
            Step::GiveUp => {
                warn!(room = %ctx.room, max = ctx.max_attempts, "giving up reconnecting");
                notify(&ctx, "Reconnect failed: too many attempts. Stopping playback.").await;
                return;
            }
            Step::Silent => return,
            Step::Retry => {
                tokio::select! {
                    _ = ctx.cancel.cancelled() => return,
                    _ = tokio::time::sleep(ctx.backoff) => {}
                }
            }
        }
    }
}

async fn notify(ctx: &ReconnectCtx, text: &str) {
    if let Err(err) = ctx.notifier.notify(ctx.room, text).await {
        warn!(room = %ctx.room, error = %err, "failed to deliver reconnect notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::testutil::{MockNotifier, MockTransport, sample_track};
    use crate::transport::TransportError;

    const ROOM: RoomId = RoomId(7);

    fn recovering_state() -> Shared<RoomState> {
        Arc::new(tokio::sync::Mutex::new(RoomState {
            current: Some(sample_track("stuck")),
            active: true,
            reconnect: None,
        }))
    }

    fn ctx(
        state: &Shared<RoomState>,
        transport: &Arc<MockTransport>,
        notifier: &Arc<MockNotifier>,
        max_attempts: u32,
    ) -> ReconnectCtx {
        ReconnectCtx {
            room: ROOM,
            state: state.clone(),
            transport: transport.clone(),
            notifier: notifier.clone(),
            classifier: Arc::new(super::super::classifier::SubstringClassifier),
            backoff: Duration::from_secs(1),
            max_attempts,
            cancel: CancellationToken::new(),
        }
    }

    // The window must comfortably cover several backoff intervals; the
    // clock is paused, so the wait is virtual either way.
    async fn wait_until_released(state: &Shared<RoomState>) {
        for _ in 0..600 {
            {
                let guard = state.lock().await;
                if guard.reconnect.is_none()
                    || guard.reconnect.as_ref().is_some_and(|h| h.is_finished())
                {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("supervisor did not finish");
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts_with_one_notification() {
        let state = recovering_state();
        let transport = MockTransport::failing("connection reset");
        let notifier = MockNotifier::new();

        {
            let mut guard = state.lock().await;
            arm(&mut guard, ctx(&state, &transport, &notifier, 3));
        }
        wait_until_released(&state).await;

        assert_eq!(transport.start_count(), 3);
        let guard = state.lock().await;
        assert!(!guard.active);
        assert!(guard.current.is_none());
        assert_eq!(notifier.count_containing("too many attempts"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn arming_twice_runs_a_single_loop() {
        let state = recovering_state();
        let transport = MockTransport::failing("connection reset");
        let notifier = MockNotifier::new();

        {
            let mut guard = state.lock().await;
            arm(&mut guard, ctx(&state, &transport, &notifier, 2));
            arm(&mut guard, ctx(&state, &transport, &notifier, 2));
        }
        wait_until_released(&state).await;

        // A second concurrent loop would have doubled the attempt count.
        assert_eq!(transport.start_count(), 2);
        assert_eq!(notifier.count_containing("too many attempts"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_keeps_room_active_and_notifies_once() {
        let state = recovering_state();
        let transport = MockTransport::ok();
        let notifier = MockNotifier::new();

        {
            let mut guard = state.lock().await;
            arm(&mut guard, ctx(&state, &transport, &notifier, 0));
        }
        wait_until_released(&state).await;

        let guard = state.lock().await;
        assert!(guard.active);
        assert_eq!(guard.current.as_ref().unwrap().title, "stuck");
        assert_eq!(notifier.count_containing("Reconnected: stuck"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn membership_failure_stops_retrying_with_explanation() {
        let state = recovering_state();
        let transport = MockTransport::failing("[400 CHANNEL_PRIVATE]");
        let notifier = MockNotifier::new();

        {
            let mut guard = state.lock().await;
            arm(&mut guard, ctx(&state, &transport, &notifier, 0));
        }
        wait_until_released(&state).await;

        assert_eq!(transport.start_count(), 1);
        let guard = state.lock().await;
        assert!(!guard.active);
        assert!(guard.current.is_none());
        assert_eq!(notifier.count_containing("Add it to the room"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_source_stops_silently() {
        let state = recovering_state();
        let transport = MockTransport::failing("ffmpeg: could not open stream");
        let notifier = MockNotifier::new();

        {
            let mut guard = state.lock().await;
            arm(&mut guard, ctx(&state, &transport, &notifier, 0));
        }
        wait_until_released(&state).await;

        assert_eq!(transport.start_count(), 1);
        let guard = state.lock().await;
        assert!(!guard.active);
        assert!(guard.current.is_none());
        assert_eq!(notifier.total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_backoff_sleep() {
        let state = recovering_state();
        let transport = MockTransport::failing("connection reset");
        let notifier = MockNotifier::new();

        let supervisor_ctx = ctx(&state, &transport, &notifier, 0);
        let cancel = supervisor_ctx.cancel.clone();
        {
            let mut guard = state.lock().await;
            arm(&mut guard, supervisor_ctx);
        }
        // Let the first attempt fail and the loop enter its backoff sleep.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let before = transport.start_count();
        cancel.cancel();

        let task = {
            let mut guard = state.lock().await;
            guard.reconnect.take().unwrap()
        };
        task.task.await.unwrap();

        assert_eq!(transport.start_count(), before);
        assert_eq!(notifier.total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_then_success_retries_with_backoff() {
        let state = recovering_state();
        let transport = MockTransport::ok();
        transport.script(vec![
            Err(TransportError::new("timeout")),
            Err(TransportError::new("timeout")),
            Ok(()),
        ]);
        let notifier = MockNotifier::new();

        {
            let mut guard = state.lock().await;
            arm(&mut guard, ctx(&state, &transport, &notifier, 0));
        }
        wait_until_released(&state).await;

        assert_eq!(transport.start_count(), 3);
        let guard = state.lock().await;
        assert!(guard.active);
        assert_eq!(notifier.count_containing("Reconnected"), 1);
    }
}
