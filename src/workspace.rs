use serde::Deserialize;
use std::path::Path;

use crate::ir::DynamicViewSpec;
use crate::model::Model;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub id: Option<String>,
    /// Per-project branch-aware switch; sits between a runtime override and
    /// the process default.
    pub dynamic_branches: Option<bool>,
}

/// Parsed and model-resolved input: the project, its model and its dynamic
/// views.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub model: Model,
    #[serde(default)]
    pub views: Vec<DynamicViewSpec>,
}

impl Workspace {
    pub fn view(&self, id: &str) -> Option<&DynamicViewSpec> {
        self.views.iter().find(|view| view.id == id)
    }
}

/// Accepts JSON, falling back to JSON5 for hand-written documents.
pub fn parse_workspace(input: &str) -> anyhow::Result<Workspace> {
    let value = match serde_json::from_str::<serde_json::Value>(input) {
        Ok(value) => value,
        Err(_) => json5::from_str::<serde_json::Value>(input)?,
    };
    Ok(serde_json::from_value(value)?)
}

pub fn load_workspace(path: &Path) -> anyhow::Result<Workspace> {
    let contents = std::fs::read_to_string(path)?;
    parse_workspace(&contents)
        .map_err(|err| anyhow::anyhow!("failed to load workspace {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BranchKind, DynamicStep, ViewRule};

    #[test]
    fn parses_step_tree_shapes() {
        let workspace = parse_workspace(
            r#"{
                "project": { "id": "shop", "dynamicBranches": true },
                "model": {
                    "elements": [
                        { "id": "a", "kind": "system" },
                        { "id": "b", "kind": "system", "title": "Bee" }
                    ],
                    "relationships": [
                        { "id": "r1", "source": "a", "target": "b", "title": "uses" }
                    ]
                },
                "views": [{
                    "id": "flow",
                    "autoLayout": "LR",
                    "rules": [ { "include": ["*"] } ],
                    "steps": [
                        { "step": { "source": "a", "target": "b" } },
                        { "series": { "steps": [
                            { "source": "b", "target": "a" },
                            { "source": "a", "target": "b" }
                        ] } },
                        { "branch": {
                            "branchId": "alt-1",
                            "kind": "alternate",
                            "defaultPathId": "ok",
                            "paths": [
                                { "pathId": "ok", "pathName": "happy", "steps": [
                                    { "step": { "source": "a", "target": "b" } }
                                ] }
                            ]
                        } }
                    ]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(workspace.project.dynamic_branches, Some(true));
        assert_eq!(workspace.model.elements().len(), 2);
        let view = workspace.view("flow").unwrap();
        assert_eq!(view.steps.len(), 3);
        assert!(matches!(view.rules[0], ViewRule::Include(_)));
        match &view.steps[2] {
            DynamicStep::Branch(branch) => {
                assert_eq!(branch.kind, BranchKind::Alternate);
                assert_eq!(branch.paths[0].path_name.as_deref(), Some("happy"));
            }
            other => panic!("expected branch, got {other:?}"),
        }
    }

    #[test]
    fn accepts_json5() {
        let workspace = parse_workspace(
            r#"{
                // trailing commas and comments
                model: { elements: [ { id: 'a' }, ], },
                views: [ { id: 'v', steps: [], }, ],
            }"#,
        )
        .unwrap();
        assert!(workspace.model.contains("a"));
        assert!(workspace.view("v").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_workspace("not a workspace").is_err());
    }
}
