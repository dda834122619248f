//! The autoplay loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

use super::{EngineSnapshot, PlaybackState, Shared};
use crate::surface::DiagramSurface;
use crate::TRACING_TARGET_ENGINE;

/// Plays the selected flow from the step after the cursor until it ends or
/// `cancel` fires.
pub(super) async fn run<S: DiagramSurface>(shared: Arc<Shared<S>>, cancel: CancellationToken) {
    loop {
        let step = {
            let mut inner = shared.lock();
            if cancel.is_cancelled() {
                return;
            }

            if inner.state == PlaybackState::Paused {
                None
            } else {
                let next = inner.current_step + 1;
                let duration = inner
                    .flows
                    .get(inner.flow_index)
                    .and_then(|flow| flow.step(next))
                    .map(|step| step.duration());

                let Some(duration) = duration else {
                    inner.reset();
                    shared.publish(&inner);
                    tracing::info!(target: TRACING_TARGET_ENGINE, "Autoplay finished");
                    return;
                };

                let token = shared.begin_highlight(&mut inner, next);
                shared.publish(&inner);
                Some((token.generation, duration))
            }
        };

        // paused between steps: hold the cursor until resumed
        let Some((generation, duration)) = step else {
            if !dwell(&shared, &cancel, Duration::ZERO).await {
                return;
            }
            continue;
        };

        if !dwell(&shared, &cancel, duration).await {
            return;
        }

        {
            let mut inner = shared.lock();
            if cancel.is_cancelled() {
                return;
            }
            if shared.end_highlight(&mut inner, generation) {
                shared.publish(&inner);
            }
        }
    }
}

/// Waits out `duration` of unpaused time.
///
/// Time spent paused does not count; resuming continues the remaining dwell.
/// Returns `false` when cancelled.
async fn dwell<S: DiagramSurface>(
    shared: &Shared<S>,
    cancel: &CancellationToken,
    duration: Duration,
) -> bool {
    let mut updates = shared.subscribe();
    let mut remaining = duration;

    loop {
        if cancel.is_cancelled() {
            return false;
        }

        if is_paused(&mut updates) {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                changed = updates.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
                _ = sleep(shared.config.pause_poll) => {}
            }
            continue;
        }

        if remaining.is_zero() {
            return true;
        }

        let started = Instant::now();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            _ = sleep(remaining) => remaining = Duration::ZERO,
            changed = updates.changed() => {
                if changed.is_err() {
                    return false;
                }
                remaining = remaining.saturating_sub(started.elapsed());
            }
        }
    }
}

fn is_paused(updates: &mut watch::Receiver<EngineSnapshot>) -> bool {
    updates.borrow_and_update().state == PlaybackState::Paused
}
