//! Playback state machine over a rendered diagram.

mod autoplay;
mod highlight;
mod state;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use archlens_core::types::{AnalysisArtifact, AnimationStep, Flow};
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use self::highlight::ActiveHighlight;
pub use self::state::{Command, EngineSnapshot, PlaybackState};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::surface::DiagramSurface;
use crate::TRACING_TARGET_ENGINE;

/// Mutable engine state, guarded by a single lock.
struct Inner<S> {
    surface: S,
    flows: Vec<Flow>,
    flow_index: usize,
    state: PlaybackState,
    current_step: usize,
    generation: u64,
    highlight: Option<ActiveHighlight>,
    autoplay: Option<CancellationToken>,
}

impl<S: DiagramSurface> Inner<S> {
    fn step_count(&self) -> usize {
        self.flows.get(self.flow_index).map_or(0, Flow::step_count)
    }

    /// Cancels autoplay and every pending highlight, then returns to idle.
    fn reset(&mut self) {
        if let Some(autoplay) = self.autoplay.take() {
            autoplay.cancel();
        }

        self.clear_highlight();
        self.surface.show_step(0);
        self.current_step = 0;
        self.state = PlaybackState::Idle;
    }

    fn snapshot(&self) -> EngineSnapshot {
        let highlight = self.highlight.as_ref();
        EngineSnapshot {
            state: self.state,
            flow_index: self.flow_index,
            current_step: self.current_step,
            step_count: self.step_count(),
            highlighted_node: highlight.and_then(|active| active.node),
            emphasized_edge: highlight.and_then(|active| active.edge.as_ref().map(|(i, _)| *i)),
            generation: self.generation,
        }
    }
}

/// State shared between the engine handle and its timer tasks.
struct Shared<S> {
    inner: Mutex<Inner<S>>,
    config: EngineConfig,
    snapshots: watch::Sender<EngineSnapshot>,
}

impl<S: DiagramSurface> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner<S>) {
        self.snapshots.send_replace(inner.snapshot());
    }

    fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshots.subscribe()
    }
}

/// Plays flows step by step over a [`DiagramSurface`].
///
/// Commands are synchronous: by the time one returns, every timer it
/// invalidated can no longer change the surface. Timers run as Tokio tasks,
/// so commands that start playback must be issued inside a runtime.
///
/// Dropping the engine cancels all of its timers.
pub struct AnimationEngine<S: DiagramSurface> {
    shared: Arc<Shared<S>>,
}

impl<S: DiagramSurface> AnimationEngine<S> {
    /// Creates an idle engine with the first flow selected.
    ///
    /// Every flow must number its steps `1..=n`; an empty flow list is
    /// accepted but cannot be played.
    pub fn new(surface: S, flows: Vec<Flow>, config: EngineConfig) -> Result<Self> {
        for flow in &flows {
            flow.validate()?;
        }

        let inner = Inner {
            surface,
            flows,
            flow_index: 0,
            state: PlaybackState::Idle,
            current_step: 0,
            generation: 0,
            highlight: None,
            autoplay: None,
        };

        let (snapshots, _) = watch::channel(inner.snapshot());
        let shared = Shared {
            inner: Mutex::new(inner),
            config,
            snapshots,
        };

        Ok(Self {
            shared: Arc::new(shared),
        })
    }

    /// Creates an engine for the flows of an artifact.
    pub fn from_artifact(
        surface: S,
        artifact: &AnalysisArtifact,
        config: EngineConfig,
    ) -> Result<Self> {
        Self::new(surface, artifact.flows.clone(), config)
    }

    /// Returns the current state of the engine.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.shared.lock().snapshot()
    }

    /// Subscribes to snapshots published on every change.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.shared.subscribe()
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.shared.lock().state
    }

    /// Returns the 1-based step in the indicator, `0` when none.
    #[inline]
    pub fn current_step(&self) -> usize {
        self.shared.lock().current_step
    }

    #[inline]
    pub fn flow_count(&self) -> usize {
        self.shared.lock().flows.len()
    }

    /// Returns the selected flow.
    pub fn current_flow(&self) -> Option<Flow> {
        let inner = self.shared.lock();
        inner.flows.get(inner.flow_index).cloned()
    }

    /// Returns the step under the cursor, for the side panel.
    pub fn current_step_detail(&self) -> Option<AnimationStep> {
        let inner = self.shared.lock();
        inner
            .flows
            .get(inner.flow_index)
            .and_then(|flow| flow.step(inner.current_step))
            .cloned()
    }

    /// Runs `f` with the surface.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.shared.lock().surface)
    }

    /// Starts autoplay from the first step of the selected flow.
    ///
    /// Accepted only while idle.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.shared.lock();
        if inner.state != PlaybackState::Idle {
            return Err(invalid(Command::Start, inner.state));
        }
        if inner.step_count() == 0 {
            return Err(EngineError::EmptyFlow);
        }

        inner.reset();
        inner.state = PlaybackState::Playing;

        let cancel = CancellationToken::new();
        inner.autoplay = Some(cancel.clone());
        self.shared.publish(&inner);

        tracing::info!(
            target: TRACING_TARGET_ENGINE,
            flow = inner.flow_index,
            steps = inner.step_count(),
            "Autoplay started",
        );

        tokio::spawn(autoplay::run(Arc::clone(&self.shared), cancel));
        Ok(())
    }

    /// Suspends or resumes autoplay, returning the new state.
    ///
    /// Resuming continues the remaining dwell of the current step.
    pub fn toggle_pause(&self) -> Result<PlaybackState> {
        let mut inner = self.shared.lock();
        inner.state = match inner.state {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
            state => return Err(invalid(Command::TogglePause, state)),
        };

        self.shared.publish(&inner);
        tracing::debug!(
            target: TRACING_TARGET_ENGINE,
            state = %inner.state,
            step = inner.current_step,
            "Playback toggled",
        );

        Ok(inner.state)
    }

    /// Stops playback, clears every highlight and rewinds to step 0.
    ///
    /// Accepted in any state; stopping an idle engine only clears it again.
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        let previous = inner.state;
        inner.reset();
        self.shared.publish(&inner);

        tracing::debug!(
            target: TRACING_TARGET_ENGINE,
            previous = %previous,
            "Playback stopped",
        );
    }

    /// Highlights the next step for the manual dwell, returning its position.
    ///
    /// Accepted while idle or paused; clamps at the last step.
    pub fn step_forward(&self) -> Result<usize> {
        self.step_manually(Command::StepForward)
    }

    /// Highlights the previous step for the manual dwell, returning its position.
    ///
    /// Accepted while idle or paused; clamps at the first step.
    pub fn step_back(&self) -> Result<usize> {
        self.step_manually(Command::StepBack)
    }

    /// Selects another flow, cancelling anything in flight.
    pub fn select_flow(&self, index: usize) -> Result<()> {
        let mut inner = self.shared.lock();
        let count = inner.flows.len();
        if index >= count {
            return Err(EngineError::UnknownFlow { index, count });
        }

        inner.reset();
        inner.flow_index = index;
        self.shared.publish(&inner);

        tracing::debug!(target: TRACING_TARGET_ENGINE, flow = index, "Flow selected");
        Ok(())
    }

    fn step_manually(&self, command: Command) -> Result<usize> {
        let mut inner = self.shared.lock();
        let resume = match inner.state {
            state @ (PlaybackState::Idle | PlaybackState::Paused) => state,
            state => return Err(invalid(command, state)),
        };

        let count = inner.step_count();
        if count == 0 {
            return Err(EngineError::EmptyFlow);
        }

        let target = match command {
            Command::StepBack => inner.current_step.saturating_sub(1),
            _ => inner.current_step + 1,
        }
        .clamp(1, count);

        inner.state = PlaybackState::Stepping;
        let token = self.shared.begin_highlight(&mut inner, target);
        inner.state = resume;
        self.shared.publish(&inner);
        drop(inner);

        let shared = Arc::clone(&self.shared);
        let dwell = shared.config.manual_dwell;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancel.cancelled() => {}
                _ = sleep(dwell) => {
                    let mut inner = shared.lock();
                    if shared.end_highlight(&mut inner, token.generation) {
                        shared.publish(&inner);
                    }
                }
            }
        });

        Ok(target)
    }
}

impl<S: DiagramSurface> Drop for AnimationEngine<S> {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        if let Some(autoplay) = inner.autoplay.take() {
            autoplay.cancel();
        }
        if let Some(active) = inner.highlight.take() {
            active.cancel.cancel();
        }
        inner.generation += 1;
    }
}

impl<S: DiagramSurface> fmt::Debug for AnimationEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationEngine")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

fn invalid(command: Command, state: PlaybackState) -> EngineError {
    EngineError::InvalidTransition { command, state }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use archlens_core::types::ArtifactError;

    use super::*;
    use crate::config::EdgeStrategy;
    use crate::scene::Scene;
    use crate::surface::EdgeStyle;

    const MARKUP: &str = "graph LR
        Client[Client Browser] --> Server[API Server]
        Server --> Database[(Database)]
        Database --> Server
        Server --> Client";

    fn flow(labels: &[&str], durations: &[u64]) -> Flow {
        let steps = labels
            .iter()
            .zip(durations)
            .enumerate()
            .map(|(i, (label, &duration))| {
                AnimationStep::new(i as u32 + 1, *label, "does work", duration)
            })
            .collect();
        Flow::new("Request Lifecycle", "", steps)
    }

    fn engine(flows: Vec<Flow>) -> AnimationEngine<Scene> {
        AnimationEngine::new(Scene::from_markup(MARKUP), flows, EngineConfig::default()).unwrap()
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn autoplay_ends_in_idle() {
        let engine = engine(vec![flow(&["Client", "API Server", "Database"], &[800, 800, 1000])]);
        engine.start().unwrap();

        advance(1).await;
        assert_eq!(engine.current_step(), 1);

        advance(2598).await;
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Playing);
        assert_eq!(snapshot.current_step, 3);
        assert_eq!(snapshot.highlighted_node, Some(2));

        advance(2).await;
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(snapshot.current_step, 0);
        assert!(engine.with_surface(Scene::is_pristine));
        assert_eq!(engine.with_surface(|s| s.revealed_steps().to_vec()), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_clears_everything() {
        let engine = engine(vec![flow(&["Client", "API Server"], &[1000, 1000])]);

        engine.start().unwrap();
        advance(100).await;
        assert!(!engine.with_surface(Scene::is_pristine));

        engine.stop();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(snapshot.current_step, 0);
        assert!(engine.with_surface(Scene::is_pristine));
        assert_eq!(engine.with_surface(Scene::step_indicator), 0);

        engine.stop();
        assert_eq!(engine.state(), PlaybackState::Idle);

        advance(5000).await;
        assert!(engine.with_surface(Scene::is_pristine));
        assert_eq!(engine.current_step(), 0);

        engine.start().unwrap();
        advance(100).await;
        assert_eq!(engine.toggle_pause().unwrap(), PlaybackState::Paused);
        engine.stop();
        assert_eq!(engine.state(), PlaybackState::Idle);
        assert!(engine.with_surface(Scene::is_pristine));

        advance(5000).await;
        assert!(engine.with_surface(Scene::is_pristine));
        assert_eq!(engine.with_surface(|s| s.emphasis_history().len()), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_durations_never_overlap() {
        let engine = engine(vec![flow(
            &["Client", "API Server", "Database", "API Server"],
            &[0, 0, 0, 0],
        )]);

        engine.start().unwrap();
        advance(10).await;

        assert_eq!(engine.state(), PlaybackState::Idle);
        engine.with_surface(|scene| {
            assert_eq!(scene.emphasis_history(), &[0, 1, 2, 1]);
            assert!(scene.peak_emphasized() <= 1);
            assert!(scene.is_pristine());
        });
    }

    #[tokio::test(start_paused = true)]
    async fn manual_steps_clamp_and_expire() {
        let engine = engine(vec![flow(
            &["Client", "API Server", "Database", "API Server"],
            &[100, 100, 100, 100],
        )]);

        assert_eq!(engine.step_back().unwrap(), 1);
        for _ in 0..5 {
            engine.step_forward().unwrap();
        }

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.current_step, 4);
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(snapshot.highlighted_node, Some(1));
        assert_eq!(engine.current_step_detail().map(|s| s.step), Some(4));

        assert_eq!(engine.step_back().unwrap(), 3);
        assert_eq!(engine.step_back().unwrap(), 2);
        assert_eq!(engine.step_back().unwrap(), 1);
        assert_eq!(engine.step_back().unwrap(), 1);
        assert!(engine.with_surface(Scene::peak_emphasized) <= 1);

        advance(4999).await;
        assert_eq!(engine.snapshot().highlighted_node, Some(0));

        advance(2).await;
        assert!(engine.with_surface(Scene::is_pristine));
        assert_eq!(engine.snapshot().highlighted_node, None);
        assert_eq!(engine.current_step(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_keeps_remaining_dwell() {
        let engine = engine(vec![flow(&["Client", "API Server", "Database"], &[1000, 1000, 1000])]);

        engine.start().unwrap();
        advance(1500).await;
        assert_eq!(engine.current_step(), 2);
        assert_eq!(engine.toggle_pause().unwrap(), PlaybackState::Paused);

        advance(10_000).await;
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Paused);
        assert_eq!(snapshot.current_step, 2);
        assert_eq!(snapshot.highlighted_node, Some(1));

        assert_eq!(engine.toggle_pause().unwrap(), PlaybackState::Playing);
        advance(499).await;
        assert_eq!(engine.current_step(), 2);

        advance(2).await;
        assert_eq!(engine.current_step(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_at_dwell_deadline_holds_the_step() {
        let engine = engine(vec![flow(&["Client", "API Server", "Database"], &[800, 800, 1000])]);

        engine.start().unwrap();
        advance(800).await;
        assert_eq!(engine.current_step(), 1);
        assert_eq!(engine.toggle_pause().unwrap(), PlaybackState::Paused);

        advance(10_000).await;
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Paused);
        assert_eq!(snapshot.current_step, 1);
        assert_eq!(snapshot.highlighted_node, Some(0));
        assert_eq!(engine.with_surface(Scene::step_indicator), 1);

        engine.toggle_pause().unwrap();
        advance(1).await;
        assert_eq!(engine.current_step(), 2);
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn stepping_while_paused_stays_paused() {
        let engine = engine(vec![flow(&["Client", "API Server", "Database"], &[1000, 1000, 1000])]);

        engine.start().unwrap();
        advance(100).await;
        engine.toggle_pause().unwrap();

        assert_eq!(engine.step_forward().unwrap(), 2);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Paused);
        assert_eq!(snapshot.highlighted_node, Some(1));

        advance(10_000).await;
        assert_eq!(engine.current_step(), 2);
        assert_eq!(engine.state(), PlaybackState::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn unmatched_label_still_advances() {
        let engine = engine(vec![flow(&["Nowhere", "Database"], &[500, 500])]);

        engine.start().unwrap();
        advance(100).await;
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.current_step, 1);
        assert_eq!(snapshot.highlighted_node, None);
        assert_eq!(snapshot.emphasized_edge, Some(0));
        assert!(engine.with_surface(Scene::emphasized_nodes).is_empty());

        advance(500).await;
        assert_eq!(engine.snapshot().highlighted_node, Some(2));

        advance(500).await;
        assert_eq!(engine.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn flow_switch_cancels_playback() {
        let engine = engine(vec![
            flow(&["Client", "API Server"], &[1000, 1000]),
            flow(&["Database"], &[1000]),
        ]);

        engine.start().unwrap();
        advance(100).await;
        engine.select_flow(1).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(snapshot.flow_index, 1);
        assert_eq!(snapshot.current_step, 0);
        assert_eq!(snapshot.step_count, 1);
        assert!(engine.with_surface(Scene::is_pristine));

        advance(10_000).await;
        assert!(engine.with_surface(Scene::is_pristine));
        assert_eq!(engine.with_surface(|s| s.emphasis_history().to_vec()), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_invalid_commands() {
        let engine = engine(vec![flow(&["Client"], &[1000])]);

        assert_eq!(
            engine.toggle_pause(),
            Err(invalid(Command::TogglePause, PlaybackState::Idle))
        );

        engine.start().unwrap();
        assert_eq!(
            engine.start(),
            Err(invalid(Command::Start, PlaybackState::Playing))
        );
        assert_eq!(
            engine.step_forward(),
            Err(invalid(Command::StepForward, PlaybackState::Playing))
        );
        assert_eq!(
            engine.select_flow(3),
            Err(EngineError::UnknownFlow { index: 3, count: 1 })
        );

        let error = invalid(Command::StepBack, PlaybackState::Playing);
        assert_eq!(error.to_string(), "cannot step back while playing");
    }

    #[tokio::test]
    async fn empty_flows_cannot_play() {
        let engine = engine(Vec::new());
        assert_eq!(engine.start(), Err(EngineError::EmptyFlow));

        let engine = engine_with(Flow::new("Nothing", "", Vec::new()));
        assert_eq!(engine.start(), Err(EngineError::EmptyFlow));
        assert_eq!(engine.step_forward(), Err(EngineError::EmptyFlow));
    }

    fn engine_with(flow: Flow) -> AnimationEngine<Scene> {
        engine(vec![flow])
    }

    #[test]
    fn rejects_malformed_flows() {
        let steps = vec![
            AnimationStep::new(1, "Client", "sends", 100),
            AnimationStep::new(3, "Server", "answers", 100),
        ];
        let result = AnimationEngine::new(
            Scene::default(),
            vec![Flow::new("Gap", "", steps)],
            EngineConfig::default(),
        );

        assert!(matches!(
            result,
            Err(EngineError::InvalidFlow(ArtifactError::StepOutOfSequence { found: 3, .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn edge_dashes_move_then_restore() {
        let engine = engine(vec![flow(&["Client"], &[1000])]);

        engine.start().unwrap();
        advance(100).await;
        let style = engine.with_surface(|s| s.edge(0).cloned()).unwrap();
        assert_eq!(style.stroke, EdgeStyle::emphasized().stroke);
        assert!(style.dash_offset < 0.0);

        advance(1000).await;
        assert_eq!(
            engine.with_surface(|s| s.edge(0).cloned()),
            Some(EdgeStyle::default())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn endpoint_strategy_follows_connections() {
        let markup = "graph LR
            Server[API Server] --> Database[(Database)]
            Client[Client Browser] --> Server";
        let steps = flow(&["Client", "API Server", "Database"], &[100, 100, 100]);

        let config = EngineConfig::default().with_edge_strategy(EdgeStrategy::Endpoint);
        let engine = AnimationEngine::new(Scene::from_markup(markup), vec![steps.clone()], config)
            .unwrap();
        let edges: Vec<_> = (0..3)
            .map(|_| {
                engine.step_forward().unwrap();
                engine.snapshot().emphasized_edge
            })
            .collect();
        assert_eq!(edges, vec![Some(0), Some(1), Some(0)]);

        let positional =
            AnimationEngine::new(Scene::from_markup(markup), vec![steps], EngineConfig::default())
                .unwrap();
        let edges: Vec<_> = (0..3)
            .map(|_| {
                positional.step_forward().unwrap();
                positional.snapshot().emphasized_edge
            })
            .collect();
        assert_eq!(edges, vec![Some(0), Some(1), None]);
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_snapshots() {
        let engine = engine(vec![flow(&["Client"], &[1000])]);
        let mut updates = engine.subscribe();

        engine.start().unwrap();
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().state, PlaybackState::Playing);

        engine.stop();
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().state, PlaybackState::Idle);
    }
}
