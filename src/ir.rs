use crate::model::Fqn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "TB")]
    TopBottom,
    #[serde(rename = "BT")]
    BottomTop,
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "RL")]
    RightLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewVariant {
    #[default]
    Diagram,
    Sequence,
}

/// Position of an authored construct in the source document.
pub type AstPath = String;

/// One source to target interaction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomicStep {
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
    #[serde(default)]
    pub is_backward: bool,
    pub navigate_to: Option<String>,
    #[serde(default)]
    pub ast_path: AstPath,
}

impl AtomicStep {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: Fqn::new(source),
            target: Fqn::new(target),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

/// Chained interaction `A -> B -> C`, expanded to its members in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSeries {
    pub steps: Vec<AtomicStep>,
    #[serde(default)]
    pub ast_path: AstPath,
}

impl StepSeries {
    pub fn new(steps: Vec<AtomicStep>) -> Self {
        Self {
            steps,
            ast_path: AstPath::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchKind {
    Parallel,
    Alternate,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPath {
    pub path_id: String,
    pub path_name: Option<String>,
    pub path_title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub steps: Vec<DynamicStep>,
    #[serde(default)]
    pub ast_path: AstPath,
}

impl BranchPath {
    pub fn new(path_id: &str, steps: Vec<DynamicStep>) -> Self {
        Self {
            path_id: path_id.to_string(),
            steps,
            ..Self::default()
        }
    }
}

/// Item of a legacy parallel block's shadow list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegacyParallelEntry {
    Step(AtomicStep),
    Series(StepSeries),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCollection {
    pub branch_id: String,
    pub kind: BranchKind,
    pub default_path_id: Option<String>,
    pub label: Option<String>,
    pub paths: Vec<BranchPath>,
    /// Flat step list kept for parallel blocks authored in the two-level
    /// `parallel { ... }` syntax. Only drives identifier generation.
    #[serde(default)]
    pub legacy_shadow: Option<Vec<LegacyParallelEntry>>,
    #[serde(default)]
    pub ast_path: AstPath,
}

impl BranchCollection {
    pub fn new(branch_id: &str, kind: BranchKind, paths: Vec<BranchPath>) -> Self {
        Self {
            branch_id: branch_id.to_string(),
            kind,
            default_path_id: None,
            label: None,
            paths,
            legacy_shadow: None,
            ast_path: AstPath::new(),
        }
    }

    /// Parallel block built from the old flat syntax: every shadow entry
    /// becomes its own single-entry path.
    pub fn legacy_parallel(branch_id: &str, shadow: Vec<LegacyParallelEntry>) -> Self {
        let paths = shadow
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let step = match entry {
                    LegacyParallelEntry::Step(step) => DynamicStep::Step(step.clone()),
                    LegacyParallelEntry::Series(series) => DynamicStep::Series(series.clone()),
                };
                BranchPath::new(&format!("{branch_id}-path-{}", idx + 1), vec![step])
            })
            .collect();
        let mut collection = Self::new(branch_id, BranchKind::Parallel, paths);
        collection.legacy_shadow = Some(shadow);
        collection
    }

    /// Legacy shadow list, only when this is a parallel block carrying a
    /// non-empty one.
    pub fn legacy_entries(&self) -> Option<&[LegacyParallelEntry]> {
        match (self.kind, self.legacy_shadow.as_deref()) {
            (BranchKind::Parallel, Some(entries)) if !entries.is_empty() => Some(entries),
            _ => None,
        }
    }
}

/// A node of the step tree. Also the shape of every entry inside a
/// [`BranchPath`], so paths may nest further branch collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DynamicStep {
    Step(AtomicStep),
    Series(StepSeries),
    Branch(BranchCollection),
}

impl From<AtomicStep> for DynamicStep {
    fn from(step: AtomicStep) -> Self {
        Self::Step(step)
    }
}

impl From<StepSeries> for DynamicStep {
    fn from(series: StepSeries) -> Self {
        Self::Series(series)
    }
}

impl From<BranchCollection> for DynamicStep {
    fn from(branch: BranchCollection) -> Self {
        Self::Branch(branch)
    }
}

/// Element predicate expression as authored: `*`, `a.b`, `a.b.*`, `a.b.**`.
pub type PredicateExpr = String;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRule {
    pub targets: Vec<PredicateExpr>,
    pub color: Option<String>,
    pub shape: Option<String>,
    pub opacity: Option<u8>,
    pub border: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewRule {
    Include(Vec<PredicateExpr>),
    Exclude(Vec<PredicateExpr>),
    Style(StyleRule),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicViewSpec {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rules: Vec<ViewRule>,
    #[serde(default)]
    pub steps: Vec<DynamicStep>,
    #[serde(default)]
    pub auto_layout: Direction,
    #[serde(default)]
    pub variant: ViewVariant,
}

impl DynamicViewSpec {
    pub fn new(id: &str, steps: Vec<DynamicStep>) -> Self {
        Self {
            id: id.to_string(),
            steps,
            ..Self::default()
        }
    }
}
