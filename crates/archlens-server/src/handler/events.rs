//! Server-sent status stream.
//!
//! Each subscriber gets its own relay task polling the status store at the
//! configured interval. The relay emits a `status` event per poll while the
//! job is running, then one terminal `complete` or `error` event, and closes
//! the stream. It stops polling as soon as the subscriber goes away.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use archlens_core::store::StatusStore;
use archlens_core::types::{AnalysisArtifact, AnalysisId, AnalysisJob, JobStatus, Phase};
use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_stream::wrappers::ReceiverStream;

use super::request::AnalysisPathParams;
use crate::TRACING_TARGET_STREAM;
use crate::extract::Path;
use crate::service::{ServiceState, StreamConfig};

/// Events buffered per subscriber before the relay waits.
const CHANNEL_CAPACITY: usize = 8;

/// Payload of an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamError {
    /// Human-readable failure description.
    pub message: String,
}

impl StreamError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One event of the status stream.
#[derive(Debug, Clone)]
enum StreamEvent {
    Status(JobStatus),
    Complete(AnalysisArtifact),
    Error(StreamError),
}

impl StreamEvent {
    /// Maps a snapshot onto the event it produces.
    fn from_job(job: AnalysisJob) -> Self {
        match job.status.phase {
            Phase::Complete => match job.result {
                Some(artifact) => Self::Complete(artifact),
                None => Self::Error(StreamError::new("Analysis finished without an artifact")),
            },
            Phase::Error => {
                let message = job.status.error.unwrap_or(job.status.message);
                Self::Error(StreamError::new(message))
            }
            _ => Self::Status(job.status),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }

    fn is_terminal(&self) -> bool {
        !matches!(self, Self::Status(_))
    }

    fn into_event(self) -> Event {
        let name = self.name();
        let data = match &self {
            Self::Status(status) => Event::default().json_data(status),
            Self::Complete(artifact) => Event::default().json_data(artifact),
            Self::Error(error) => Event::default().json_data(error),
        };

        match data {
            Ok(event) => event.event(name),
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_STREAM,
                    event = name,
                    error = %err,
                    "Failed to encode stream event"
                );
                Event::default()
                    .event("error")
                    .data(r#"{"message":"Failed to encode stream event"}"#)
            }
        }
    }
}

type EventSender = mpsc::Sender<Result<Event, Infallible>>;

/// Streams the status of a job as server-sent events.
#[tracing::instrument(skip_all)]
async fn stream_events(
    State(status_store): State<Arc<dyn StatusStore>>,
    State(stream_config): State<StreamConfig>,
    Path(path_params): Path<AnalysisPathParams>,
) -> Sse<KeepAliveStream<ReceiverStream<Result<Event, Infallible>>>> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let analysis_id = path_params.analysis_id;

    tracing::debug!(
        target: TRACING_TARGET_STREAM,
        analysis_id = %analysis_id,
        "Subscriber connected"
    );

    tokio::spawn(relay(
        status_store,
        analysis_id,
        stream_config.poll_interval(),
        tx,
    ));

    Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default())
}

/// Polls the status store and forwards snapshots until a terminal event.
async fn relay(
    status_store: Arc<dyn StatusStore>,
    analysis_id: AnalysisId,
    poll_interval: Duration,
    tx: EventSender,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls = 0_u64;

    loop {
        tokio::select! {
            biased;

            () = tx.closed() => {
                tracing::debug!(
                    target: TRACING_TARGET_STREAM,
                    analysis_id = %analysis_id,
                    polls = polls,
                    "Subscriber disconnected"
                );
                return;
            }

            _ = ticker.tick() => {}
        }

        polls += 1;
        let event = match status_store.get(&analysis_id).await {
            Ok(Some(job)) => StreamEvent::from_job(job),
            Ok(None) => StreamEvent::Error(StreamError::new("Analysis not found or expired")),
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_STREAM,
                    analysis_id = %analysis_id,
                    error = %err,
                    "Status store read failed"
                );
                StreamEvent::Error(StreamError::new("Status store unavailable"))
            }
        };

        let terminal = event.is_terminal();
        if terminal {
            tracing::debug!(
                target: TRACING_TARGET_STREAM,
                analysis_id = %analysis_id,
                event = event.name(),
                polls = polls,
                "Stream finished"
            );
        }

        if tx.send(Ok(event.into_event())).await.is_err() || terminal {
            return;
        }
    }
}

/// Returns a [`Router`] with the status stream route.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/analyses/{analysisId}/events", get(stream_events))
}
