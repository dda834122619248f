//! Tolerant reader for flowchart diagram markup.
//!
//! Rendering is left to the diagram library; this reader only recovers the
//! node labels and edges in the order the renderer lays them out, which is
//! enough to check step labels against the diagram and to drive a headless
//! scene. Unknown statements are skipped instead of rejected.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::label::LabelQuery;
use crate::types::Flow;

/// A node as it appears in the rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramNode {
    /// Identifier used by edges.
    pub id: String,
    /// Rendered label; the identifier when none was given.
    pub label: String,
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramEdge {
    /// Identifier of the source node.
    pub source: String,
    /// Identifier of the target node.
    pub target: String,
    /// Text drawn on the edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Nodes in first-declaration order and edges in authored order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramGraph {
    /// Layout direction from the header (`TD`, `LR`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Rendered nodes.
    pub nodes: Vec<DiagramNode>,
    /// Rendered edges.
    pub edges: Vec<DiagramEdge>,
}

/// Statements that carry no nodes or edges.
const IGNORED_KEYWORDS: &[&str] = &[
    "subgraph",
    "end",
    "style",
    "classdef",
    "class",
    "click",
    "linkstyle",
    "direction",
];

/// Node shape delimiters, longest openers first.
const SHAPES: &[(&str, &[&str])] = &[
    ("(((", &[")))"]),
    ("((", &["))"]),
    ("([", &["])"]),
    ("[[", &["]]"]),
    ("[(", &[")]"]),
    ("{{", &["}}"]),
    ("[/", &["/]", "\\]"]),
    ("[\\", &["\\]", "/]"]),
    ("(", &[")"]),
    ("[", &["]"]),
    ("{", &["}"]),
    (">", &["]"]),
];

impl DiagramGraph {
    /// Reads flowchart markup. Never fails; unreadable statements are skipped.
    pub fn parse(markup: &str) -> Self {
        let mut builder = GraphBuilder::default();

        for raw in markup.lines() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            let keyword = line
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .trim_end_matches(';')
                .to_ascii_lowercase();

            let statements = if keyword == "graph" || keyword == "flowchart" {
                builder.direction = line
                    .split_whitespace()
                    .nth(1)
                    .map(|d| d.trim_end_matches(';').to_owned());
                // `graph LR; A --> B` keeps statements on the header line
                match line.split_once(';') {
                    Some((_, rest)) => rest,
                    None => continue,
                }
            } else if IGNORED_KEYWORDS.contains(&keyword.as_str()) {
                continue;
            } else {
                line
            };

            for statement in statements.split(';') {
                Scanner::new(statement.trim()).statement(&mut builder);
            }
        }

        builder.finish()
    }

    /// Returns the node with the given identifier.
    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Returns the position of a node in rendering order.
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }

    /// Returns the first node whose label the query prefixes.
    pub fn find_node(&self, query: &LabelQuery) -> Option<&DiagramNode> {
        query
            .find(self.nodes.iter().map(|node| node.label.as_str()))
            .map(|index| &self.nodes[index])
    }

    /// Returns the step labels of a flow that match no rendered node.
    pub fn unmatched_labels<'a>(&self, flow: &'a Flow) -> Vec<&'a str> {
        flow.steps
            .iter()
            .filter(|step| self.find_node(&LabelQuery::new(&step.node)).is_none())
            .map(|step| step.node.as_str())
            .collect()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("%%") {
        Some(index) => &line[..index],
        None => line,
    }
}

/// Cleans a raw shape label the way the renderer displays it.
fn clean_label(raw: &str) -> String {
    let unquoted = raw.trim().trim_matches('"').trim_matches('`');
    let without_breaks = unquoted
        .replace("<br/>", " ")
        .replace("<br />", " ")
        .replace("<br>", " ");
    without_breaks.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Default)]
struct GraphBuilder {
    direction: Option<String>,
    nodes: Vec<DiagramNode>,
    index: HashMap<String, usize>,
    edges: Vec<DiagramEdge>,
}

impl GraphBuilder {
    fn declare(&mut self, id: &str, label: Option<String>) {
        match self.index.get(id) {
            Some(&position) => {
                if let Some(label) = label {
                    self.nodes[position].label = label;
                }
            }
            None => {
                self.index.insert(id.to_owned(), self.nodes.len());
                self.nodes.push(DiagramNode {
                    id: id.to_owned(),
                    label: label.unwrap_or_else(|| id.to_owned()),
                });
            }
        }
    }

    fn connect(&mut self, sources: &[String], targets: &[String], label: Option<&str>) {
        for source in sources {
            for target in targets {
                self.edges.push(DiagramEdge {
                    source: source.clone(),
                    target: target.clone(),
                    label: label.map(str::to_owned),
                });
            }
        }
    }

    fn finish(self) -> DiagramGraph {
        DiagramGraph {
            direction: self.direction,
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// `group (link group)*`
    fn statement(&mut self, builder: &mut GraphBuilder) {
        let Some(mut sources) = self.group(builder) else {
            return;
        };

        loop {
            self.skip_whitespace();
            let Some(label) = self.link() else {
                break;
            };
            self.skip_whitespace();
            let Some(targets) = self.group(builder) else {
                break;
            };

            builder.connect(&sources, &targets, label.as_deref());
            sources = targets;
        }
    }

    /// `node ('&' node)*`
    fn group(&mut self, builder: &mut GraphBuilder) -> Option<Vec<String>> {
        let mut ids = vec![self.node(builder)?];
        loop {
            let checkpoint = self.pos;
            self.skip_whitespace();
            if !self.rest().starts_with('&') {
                self.pos = checkpoint;
                break;
            }
            self.pos += 1;
            self.skip_whitespace();
            match self.node(builder) {
                Some(id) => ids.push(id),
                None => break,
            }
        }

        Some(ids)
    }

    /// `id shape? (':::' class)?`
    fn node(&mut self, builder: &mut GraphBuilder) -> Option<String> {
        let id = self.identifier()?;
        let label = self.shape();

        if self.rest().starts_with(":::") {
            self.pos += 3;
            let _ = self.identifier();
        }

        builder.declare(&id, label);
        Some(id)
    }

    fn identifier(&mut self) -> Option<String> {
        let rest = self.rest();
        let mut end = 0;
        let mut chars = rest.char_indices().peekable();

        while let Some((index, c)) = chars.next() {
            let accepted = if c.is_alphanumeric() || c == '_' {
                true
            } else if c == '-' {
                // a hyphen inside an identifier, not the start of a link
                end > 0
                    && chars
                        .peek()
                        .is_some_and(|(_, next)| next.is_alphanumeric() || *next == '_')
            } else {
                false
            };

            if !accepted {
                break;
            }
            end = index + c.len_utf8();
        }

        if end == 0 {
            return None;
        }

        self.pos += end;
        Some(rest[..end].to_owned())
    }

    fn shape(&mut self) -> Option<String> {
        let rest = self.rest();
        let (opener, closers) = SHAPES
            .iter()
            .find(|(opener, _)| rest.starts_with(opener))?;

        let body = &rest[opener.len()..];
        // quoted labels may contain closing delimiters
        let search_from = if body.starts_with('"') {
            body[1..].find('"').map(|q| q + 2).unwrap_or(0)
        } else {
            0
        };

        let (close_at, close_len) = closers
            .iter()
            .filter_map(|closer| {
                body[search_from..]
                    .find(closer)
                    .map(|at| (search_from + at, closer.len()))
            })
            .min_by_key(|(at, _)| *at)?;

        self.pos += opener.len() + close_at + close_len;
        Some(clean_label(&body[..close_at]))
    }

    /// Consumes a link and returns its label, `None` when no link starts here.
    fn link(&mut self) -> Option<Option<String>> {
        let rest = self.rest();
        let arrow_len = rest
            .find(|c: char| !matches!(c, '-' | '=' | '.' | '<' | '>' | '~'))
            .unwrap_or(rest.len());
        let arrow = &rest[..arrow_len];

        if arrow.len() < 2 || !(arrow.contains('-') || arrow.contains('=') || arrow.contains('~'))
        {
            return None;
        }
        self.pos += arrow_len;

        let mut label = None;

        // `-- text -->` style labels
        if matches!(arrow, "--" | "==" | "-.") {
            let body = self.rest();
            if let Some((text_end, closing_len)) = closing_arrow(body) {
                let text = body[..text_end].trim();
                if !text.is_empty() {
                    label = Some(clean_label(text));
                }
                self.pos += text_end + closing_len;
            }
        }

        // `-->|text|` style labels
        self.skip_whitespace();
        if let Some(body) = self.rest().strip_prefix('|')
            && let Some(end) = body.find('|')
        {
            let text = clean_label(&body[..end]);
            if !text.is_empty() {
                label = Some(text);
            }
            self.pos += end + 2;
        }

        Some(label)
    }
}

/// Finds the arrow closing a `-- text -->` label: its offset and length.
fn closing_arrow(body: &str) -> Option<(usize, usize)> {
    let start = ["--", "==", ".-"]
        .iter()
        .filter_map(|marker| body.find(marker))
        .min()?;

    let tail = &body[start..];
    let len = tail
        .find(|c: char| !matches!(c, '-' | '=' | '.' | '>'))
        .unwrap_or(tail.len());
    Some((start, len))
}
