use serde::Serialize;

/// Playback state of the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[derive(strum::Display, strum::AsRefStr, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing is playing; the step cursor may rest on a manually chosen step.
    #[default]
    Idle,
    /// Autoplay is advancing through the flow.
    Playing,
    /// Autoplay is suspended mid-dwell.
    Paused,
    /// A manual step is being applied.
    Stepping,
}

/// A playback command, as reported by rejected transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(strum::Display, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    #[strum(to_string = "start")]
    Start,
    #[strum(to_string = "toggle pause")]
    TogglePause,
    #[strum(to_string = "stop")]
    Stop,
    #[strum(to_string = "step forward")]
    StepForward,
    #[strum(to_string = "step back")]
    StepBack,
    #[strum(to_string = "select flow")]
    SelectFlow,
}

/// Point-in-time view of the engine, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    /// Playback state.
    pub state: PlaybackState,
    /// Position of the selected flow.
    pub flow_index: usize,
    /// 1-based step shown in the indicator, `0` when none.
    pub current_step: usize,
    /// Number of steps in the selected flow.
    pub step_count: usize,
    /// Rendered node carrying emphasis.
    pub highlighted_node: Option<usize>,
    /// Rendered edge carrying emphasis.
    pub emphasized_edge: Option<usize>,
    /// Highlight generation; bumped by every clear.
    pub generation: u64,
}

impl EngineSnapshot {
    /// Returns whether autoplay is running or suspended.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
    }
}
