//! The seam between the engine and a rendered diagram.

use serde::{Deserialize, Serialize};

/// Glow and scale applied to a highlighted node shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEmphasis {
    /// Scale factor of the node shape.
    pub scale: f32,
    /// Glow color.
    pub glow_color: String,
    /// Glow blur radius in pixels.
    pub glow_radius: f32,
}

impl Default for NodeEmphasis {
    fn default() -> Self {
        Self {
            scale: 1.08,
            glow_color: "#f59e0b".to_owned(),
            glow_radius: 8.0,
        }
    }
}

/// Stroke of a rendered edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    /// Stroke color.
    pub stroke: String,
    /// Stroke width in pixels.
    pub width: f32,
    /// Dash pattern, solid when absent.
    pub dash_array: Option<String>,
    /// Dash offset; animating it makes the dashes move.
    pub dash_offset: f32,
}

impl EdgeStyle {
    /// A solid stroke.
    pub fn solid(stroke: impl Into<String>, width: f32) -> Self {
        Self {
            stroke: stroke.into(),
            width,
            dash_array: None,
            dash_offset: 0.0,
        }
    }

    /// The style applied to the edge of the current step.
    pub fn emphasized() -> Self {
        Self {
            stroke: "#f59e0b".to_owned(),
            width: 3.0,
            dash_array: Some("8 4".to_owned()),
            dash_offset: 0.0,
        }
    }
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self::solid("#333333", 1.5)
    }
}

/// A rendered diagram the engine can highlight.
///
/// Nodes and edges are addressed by their position in rendering order.
pub trait DiagramSurface: Send + 'static {
    /// Returns the rendered node labels in rendering order.
    fn node_labels(&self) -> Vec<String>;

    /// Returns the number of rendered edges.
    fn edge_count(&self) -> usize;

    /// Returns the source and target node positions of an edge, when the
    /// renderer exposes them.
    fn edge_endpoints(&self, _edge: usize) -> Option<(usize, usize)> {
        None
    }

    /// Applies emphasis to a node shape.
    fn emphasize_node(&mut self, node: usize, emphasis: &NodeEmphasis);

    /// Removes emphasis from a node shape.
    fn clear_node(&mut self, node: usize);

    /// Returns the current stroke of an edge.
    fn edge_style(&self, edge: usize) -> Option<EdgeStyle>;

    /// Replaces the stroke of an edge.
    fn set_edge_style(&mut self, edge: usize, style: &EdgeStyle);

    /// Resets every node and edge to its default appearance.
    fn clear_all(&mut self);

    /// Shows the 1-based step in the step indicator and scrolls its panel
    /// entry into view; `0` clears the indicator.
    fn show_step(&mut self, step: usize);
}
