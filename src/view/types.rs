use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::ir::{AstPath, BranchKind, Direction, ViewVariant};
use crate::model::Fqn;

/// Identifier of a computed step and of the edge drawn for it.
///
/// Always starts with `step-`; unique within one computed view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepEdgeId(String);

impl StepEdgeId {
    pub const PREFIX: &'static str = "step-";

    /// Recognizes an existing id. Returns `None` for anything not carrying the
    /// `step-` prefix followed by at least one numeric segment.
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.strip_prefix(Self::PREFIX)?;
        let first = rest.split(['.', ':']).next()?;
        if first.is_empty() || !first.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(value.to_string()))
    }

    pub(crate) fn from_formatted(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric segments after the prefix, in order. Non-numeric segments stop
    /// the scan.
    pub fn segments(&self) -> Vec<u32> {
        self.0[Self::PREFIX.len()..]
            .split(['.', ':'])
            .map_while(|segment| segment.parse().ok())
            .collect()
    }
}

impl fmt::Display for StepEdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StepEdgeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StepEdgeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One level of the enclosing branch context of a step, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchTrailEntry {
    pub branch_id: String,
    pub path_id: String,
    pub kind: BranchKind,
    pub path_index: usize,
    pub index_within_path: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_title: Option<String>,
    pub is_default_path: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStep {
    pub id: StepEdgeId,
    pub source: Fqn,
    pub target: Fqn,
    pub title: Option<String>,
    pub description: Option<String>,
    pub technology: Option<String>,
    pub kind: Option<String>,
    pub notation: Option<String>,
    pub notes: Option<String>,
    pub color: Option<String>,
    pub line: Option<String>,
    pub head: Option<String>,
    pub tail: Option<String>,
    pub is_backward: bool,
    pub navigate_to: Option<String>,
    pub relations: Vec<String>,
    pub branch_trail: Option<Vec<BranchTrailEntry>>,
    pub ast_path: AstPath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedBranchPath {
    pub path_id: String,
    pub path_index: usize,
    pub is_default_path: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub edge_ids: Vec<StepEdgeId>,
}

/// Branch overlay summary for the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedBranchCollection {
    pub branch_id: String,
    pub kind: BranchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_path_id: Option<String>,
    pub paths: Vec<ComputedBranchPath>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub color: String,
    pub shape: String,
    pub opacity: u8,
    pub border: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedNode {
    pub id: Fqn,
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    pub technology: Option<String>,
    pub tags: Vec<String>,
    pub parent: Option<Fqn>,
    pub children: Vec<Fqn>,
    pub in_edges: Vec<StepEdgeId>,
    pub out_edges: Vec<StepEdgeId>,
    /// Number of ancestors that are also nodes of the view.
    pub level: usize,
    /// Height of the in-view subtree; 0 for leaves.
    pub depth: usize,
    pub navigate_to: Option<String>,
    pub style: NodeStyle,
}

impl ComputedNode {
    pub fn is_compound(&self) -> bool {
        !self.children.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeDirection {
    #[serde(rename = "forward")]
    Forward,
    #[serde(rename = "back")]
    Back,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedEdge {
    pub id: StepEdgeId,
    pub source: Fqn,
    pub target: Fqn,
    /// Nearest common container present in the view.
    pub parent: Option<Fqn>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub technology: Option<String>,
    pub kind: Option<String>,
    pub notation: Option<String>,
    pub notes: Option<String>,
    pub relations: Vec<String>,
    pub dir: EdgeDirection,
    pub color: String,
    pub line: String,
    pub head: String,
    pub tail: Option<String>,
    pub navigate_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_trail: Option<Vec<BranchTrailEntry>>,
    pub ast_path: AstPath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedDynamicView {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub auto_layout: Direction,
    pub variant: ViewVariant,
    pub nodes: Vec<ComputedNode>,
    pub edges: Vec<ComputedEdge>,
    /// Present only when branch-aware lowering processed at least one branch
    /// collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_collections: Option<Vec<ComputedBranchCollection>>,
}

impl ComputedDynamicView {
    pub fn node(&self, id: &str) -> Option<&ComputedNode> {
        self.nodes.iter().find(|node| node.id.as_str() == id)
    }

    pub fn edge(&self, id: &str) -> Option<&ComputedEdge> {
        self.edges.iter().find(|edge| edge.id.as_str() == id)
    }

    pub fn edge_ids(&self) -> Vec<&str> {
        self.edges.iter().map(|edge| edge.id.as_str()).collect()
    }
}
