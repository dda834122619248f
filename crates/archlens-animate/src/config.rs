use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::surface::{EdgeStyle, NodeEmphasis};

/// Dwell used for manual stepping, regardless of authored durations.
const DEFAULT_MANUAL_DWELL: Duration = Duration::from_millis(5000);

/// Interval between dash offset updates of the emphasized edge.
const DEFAULT_DASH_TICK: Duration = Duration::from_millis(30);

/// Interval at which a paused autoplay loop re-checks its state.
const DEFAULT_PAUSE_POLL: Duration = Duration::from_millis(100);

/// Dash offset change per tick.
const DEFAULT_DASH_STEP: f32 = 2.0;

/// How the edge paired with a step is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStrategy {
    /// Edge at position `step - 1` in rendering order.
    ///
    /// Assumes edges are rendered in the same order as the authored steps.
    #[default]
    Positional,
    /// Edge from the previous step's node to this step's node, then any edge
    /// into this step's node, then the positional edge.
    Endpoint,
}

/// Timing and styling of playback.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Dwell of a manually selected step.
    pub manual_dwell: Duration,
    /// Interval between dash offset updates.
    pub dash_tick: Duration,
    /// Dash offset change per tick.
    pub dash_step: f32,
    /// Interval at which a paused loop re-checks its state.
    pub pause_poll: Duration,
    /// Edge pairing rule.
    pub edge_strategy: EdgeStrategy,
    /// Emphasis applied to the matched node.
    pub node_emphasis: NodeEmphasis,
    /// Stroke applied to the paired edge.
    pub edge_emphasis: EdgeStyle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            manual_dwell: DEFAULT_MANUAL_DWELL,
            dash_tick: DEFAULT_DASH_TICK,
            dash_step: DEFAULT_DASH_STEP,
            pause_poll: DEFAULT_PAUSE_POLL,
            edge_strategy: EdgeStrategy::default(),
            node_emphasis: NodeEmphasis::default(),
            edge_emphasis: EdgeStyle::emphasized(),
        }
    }
}

impl EngineConfig {
    /// Sets the manual stepping dwell.
    #[must_use]
    pub fn with_manual_dwell(mut self, dwell: Duration) -> Self {
        self.manual_dwell = dwell;
        self
    }

    /// Sets the dash animation interval.
    #[must_use]
    pub fn with_dash_tick(mut self, tick: Duration) -> Self {
        self.dash_tick = tick;
        self
    }

    /// Sets the edge pairing rule.
    #[must_use]
    pub fn with_edge_strategy(mut self, strategy: EdgeStrategy) -> Self {
        self.edge_strategy = strategy;
        self
    }

    /// Sets the node emphasis.
    #[must_use]
    pub fn with_node_emphasis(mut self, emphasis: NodeEmphasis) -> Self {
        self.node_emphasis = emphasis;
        self
    }

    /// Sets the edge emphasis.
    #[must_use]
    pub fn with_edge_emphasis(mut self, style: EdgeStyle) -> Self {
        self.edge_emphasis = style;
        self
    }
}
