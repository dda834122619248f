//! In-memory diagram surface.

use archlens_core::diagram::DiagramGraph;

use crate::surface::{DiagramSurface, EdgeStyle, NodeEmphasis};

#[derive(Debug, Clone)]
struct SceneNode {
    label: String,
    emphasis: Option<NodeEmphasis>,
}

#[derive(Debug, Clone)]
struct SceneEdge {
    endpoints: Option<(usize, usize)>,
    default_style: EdgeStyle,
    style: EdgeStyle,
}

/// A headless rendering of a diagram.
///
/// Besides the current appearance, the scene remembers which nodes were
/// emphasized over time and the largest number emphasized at once.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    edges: Vec<SceneEdge>,
    indicator: usize,
    revealed: Vec<usize>,
    history: Vec<usize>,
    peak: usize,
    edge_updates: usize,
}

impl Scene {
    /// Builds a scene from a parsed diagram, in rendering order.
    pub fn from_graph(graph: &DiagramGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| SceneNode {
                label: node.label.clone(),
                emphasis: None,
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .map(|edge| SceneEdge {
                endpoints: graph
                    .node_index(&edge.source)
                    .zip(graph.node_index(&edge.target)),
                default_style: EdgeStyle::default(),
                style: EdgeStyle::default(),
            })
            .collect();

        Self {
            nodes,
            edges,
            ..Self::default()
        }
    }

    /// Parses diagram markup and builds a scene from it.
    pub fn from_markup(markup: &str) -> Self {
        Self::from_graph(&DiagramGraph::parse(markup))
    }

    /// Builds a scene of unconnected nodes with the given labels.
    pub fn from_labels<I, L>(labels: I, edge_count: usize) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let nodes = labels
            .into_iter()
            .map(|label| SceneNode {
                label: label.into(),
                emphasis: None,
            })
            .collect();

        let edges = (0..edge_count)
            .map(|_| SceneEdge {
                endpoints: None,
                default_style: EdgeStyle::default(),
                style: EdgeStyle::default(),
            })
            .collect();

        Self {
            nodes,
            edges,
            ..Self::default()
        }
    }

    /// Returns the positions of the currently emphasized nodes.
    pub fn emphasized_nodes(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.emphasis.is_some())
            .map(|(index, _)| index)
            .collect()
    }

    /// Returns the positions of edges not showing their default stroke.
    pub fn emphasized_edges(&self) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.style != edge.default_style)
            .map(|(index, _)| index)
            .collect()
    }

    /// Returns whether nothing is emphasized.
    pub fn is_pristine(&self) -> bool {
        self.emphasized_nodes().is_empty() && self.emphasized_edges().is_empty()
    }

    /// Returns the step shown in the indicator, `0` when cleared.
    #[inline]
    pub fn step_indicator(&self) -> usize {
        self.indicator
    }

    /// Returns every step scrolled into view, in order.
    #[inline]
    pub fn revealed_steps(&self) -> &[usize] {
        &self.revealed
    }

    /// Returns the node positions in the order they were emphasized.
    #[inline]
    pub fn emphasis_history(&self) -> &[usize] {
        &self.history
    }

    /// Returns the largest number of nodes ever emphasized at once.
    #[inline]
    pub fn peak_emphasized(&self) -> usize {
        self.peak
    }

    /// Returns how many times an edge stroke was replaced.
    #[inline]
    pub fn edge_updates(&self) -> usize {
        self.edge_updates
    }

    /// Returns the current stroke of an edge.
    pub fn edge(&self, edge: usize) -> Option<&EdgeStyle> {
        self.edges.get(edge).map(|edge| &edge.style)
    }
}

impl DiagramSurface for Scene {
    fn node_labels(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.label.clone()).collect()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn edge_endpoints(&self, edge: usize) -> Option<(usize, usize)> {
        self.edges.get(edge).and_then(|edge| edge.endpoints)
    }

    fn emphasize_node(&mut self, node: usize, emphasis: &NodeEmphasis) {
        let Some(target) = self.nodes.get_mut(node) else {
            return;
        };

        target.emphasis = Some(emphasis.clone());
        self.history.push(node);
        let emphasized = self.nodes.iter().filter(|n| n.emphasis.is_some()).count();
        self.peak = self.peak.max(emphasized);
    }

    fn clear_node(&mut self, node: usize) {
        if let Some(target) = self.nodes.get_mut(node) {
            target.emphasis = None;
        }
    }

    fn edge_style(&self, edge: usize) -> Option<EdgeStyle> {
        self.edges.get(edge).map(|edge| edge.style.clone())
    }

    fn set_edge_style(&mut self, edge: usize, style: &EdgeStyle) {
        if let Some(target) = self.edges.get_mut(edge) {
            target.style = style.clone();
            self.edge_updates += 1;
        }
    }

    fn clear_all(&mut self) {
        for node in &mut self.nodes {
            node.emphasis = None;
        }
        for edge in &mut self.edges {
            edge.style = edge.default_style.clone();
        }
    }

    fn show_step(&mut self, step: usize) {
        self.indicator = step;
        if step > 0 {
            self.revealed.push(step);
        }
    }
}
