//! Applying and removing the emphasis of a single step.

use std::sync::Arc;

use archlens_core::label::LabelQuery;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::{Inner, Shared};
use crate::config::EdgeStrategy;
use crate::surface::{DiagramSurface, EdgeStyle};
use crate::TRACING_TARGET_HIGHLIGHT;

/// Dash offsets wrap at this magnitude.
const DASH_OFFSET_WRAP: f32 = 1000.0;

/// The emphasis currently applied to the surface.
pub(super) struct ActiveHighlight {
    pub generation: u64,
    pub cancel: CancellationToken,
    pub node: Option<usize>,
    /// Emphasized edge and the stroke it had before.
    pub edge: Option<(usize, EdgeStyle)>,
}

/// Identifies one applied highlight; stale once the generation moves on.
#[derive(Debug, Clone)]
pub(super) struct HighlightToken {
    pub generation: u64,
    pub cancel: CancellationToken,
}

impl<S: DiagramSurface> Inner<S> {
    /// Cancels the active highlight and resets the surface.
    ///
    /// Bumps the generation so no pending timer can touch the surface again.
    pub(super) fn clear_highlight(&mut self) {
        if let Some(active) = self.highlight.take() {
            active.cancel.cancel();
        }

        self.surface.clear_all();
        self.generation += 1;
    }

    fn label_at(&self, position: usize) -> Option<String> {
        self.flows
            .get(self.flow_index)
            .and_then(|flow| flow.step(position))
            .map(|step| step.node.clone())
    }

    fn resolve_node(&self, label: &str) -> Option<usize> {
        let labels = self.surface.node_labels();
        LabelQuery::new(label).find(labels.iter().map(String::as_str))
    }

    fn resolve_edge(
        &self,
        strategy: EdgeStrategy,
        position: usize,
        node: Option<usize>,
    ) -> Option<usize> {
        let count = self.surface.edge_count();
        let positional = position.checked_sub(1).filter(|&index| index < count);

        let EdgeStrategy::Endpoint = strategy else {
            return positional;
        };
        let Some(target) = node else {
            return positional;
        };

        let source = position
            .checked_sub(1)
            .and_then(|previous| self.label_at(previous))
            .and_then(|label| self.resolve_node(&label));

        source
            .and_then(|source| {
                (0..count)
                    .find(|&edge| self.surface.edge_endpoints(edge) == Some((source, target)))
            })
            .or_else(|| {
                (0..count).find(|&edge| {
                    self.surface
                        .edge_endpoints(edge)
                        .is_some_and(|(_, to)| to == target)
                })
            })
            .or(positional)
    }
}

impl<S: DiagramSurface> Shared<S> {
    /// Highlights the step at a 1-based position.
    ///
    /// Clears every prior emphasis before applying the new one, so at most one
    /// step is ever emphasized.
    pub(super) fn begin_highlight(
        self: &Arc<Self>,
        inner: &mut Inner<S>,
        position: usize,
    ) -> HighlightToken {
        inner.current_step = position;
        inner.surface.show_step(position);
        inner.clear_highlight();

        let generation = inner.generation;
        let cancel = CancellationToken::new();

        let node = match inner.label_at(position) {
            Some(label) => {
                let node = inner.resolve_node(&label);
                if node.is_none() {
                    tracing::warn!(
                        target: TRACING_TARGET_HIGHLIGHT,
                        step = position,
                        label = %label,
                        "No rendered node matches step label",
                    );
                }
                node
            }
            None => None,
        };

        if let Some(node) = node {
            inner.surface.emphasize_node(node, &self.config.node_emphasis);
        }

        let edge = inner
            .resolve_edge(self.config.edge_strategy, position, node)
            .and_then(|edge| inner.surface.edge_style(edge).map(|original| (edge, original)));

        match &edge {
            Some((index, _)) => {
                inner.surface.set_edge_style(*index, &self.config.edge_emphasis);
                self.spawn_dash(generation, cancel.clone(), *index);
            }
            None => tracing::debug!(
                target: TRACING_TARGET_HIGHLIGHT,
                step = position,
                "No rendered edge for step",
            ),
        }

        tracing::trace!(
            target: TRACING_TARGET_HIGHLIGHT,
            step = position,
            generation,
            node = ?node,
            edge = ?edge.as_ref().map(|(index, _)| *index),
            "Step highlighted",
        );

        inner.highlight = Some(ActiveHighlight {
            generation,
            cancel: cancel.clone(),
            node,
            edge,
        });

        HighlightToken { generation, cancel }
    }

    /// Removes the highlight of `generation` and restores the edge stroke.
    ///
    /// Returns `false` when a later highlight or a clear already replaced it.
    pub(super) fn end_highlight(&self, inner: &mut Inner<S>, generation: u64) -> bool {
        if inner
            .highlight
            .as_ref()
            .is_none_or(|active| active.generation != generation)
        {
            return false;
        }

        let Some(active) = inner.highlight.take() else {
            return false;
        };

        active.cancel.cancel();
        if let Some(node) = active.node {
            inner.surface.clear_node(node);
        }
        if let Some((edge, original)) = active.edge {
            inner.surface.set_edge_style(edge, &original);
        }

        true
    }

    /// Moves the dashes of the emphasized edge until the highlight ends.
    fn spawn_dash(self: &Arc<Self>, generation: u64, cancel: CancellationToken, edge: usize) {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(shared.config.dash_tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => {}
                }

                if !shared.advance_dash(generation, edge) {
                    return;
                }
            }
        });
    }

    fn advance_dash(&self, generation: u64, edge: usize) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }

        let Some(mut style) = inner.surface.edge_style(edge) else {
            return false;
        };

        style.dash_offset = (style.dash_offset - self.config.dash_step) % DASH_OFFSET_WRAP;
        inner.surface.set_edge_style(edge, &style);
        true
    }
}
