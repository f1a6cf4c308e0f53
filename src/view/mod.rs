mod actors;
mod branch_stack;
mod error;
mod flatten;
mod graph;
mod step_id;
mod steps;
pub(crate) mod types;

pub use actors::{Actors, ElementPredicate, explicit_elements, resolve_actors, step_elements};
pub use branch_stack::{BranchStack, BranchStackEntry};
pub use error::{ComputeError, Endpoint, ViewComputeError};
pub use flatten::{flatten, flatten_all};
pub use step_id::{
    build_legacy_parallel_step_id, build_step_id, is_alternate_continuation_of,
    is_parallel_continuation_of, is_step_edge_id, step_edge_id,
};
pub use types::*;

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::ir::DynamicViewSpec;
use crate::model::Model;
use crate::theme::Theme;

use graph::{build_edges, build_nodes};
use steps::{StepResolver, lower_branch_aware, lower_legacy};

/// Inputs to one view computation beyond the model and the view itself.
#[derive(Debug, Clone, Default)]
pub struct ComputeOptions {
    /// Resolved branch-aware switch; see `config::resolve_dynamic_branches`.
    pub dynamic_branches: bool,
    pub theme: Theme,
}

pub fn compute_dynamic_view(
    model: &Model,
    view: &DynamicViewSpec,
    options: &ComputeOptions,
) -> Result<ComputedDynamicView, ViewComputeError> {
    compute(model, view, options).map_err(|source| ViewComputeError::new(&view.id, source))
}

fn compute(
    model: &Model,
    view: &DynamicViewSpec,
    options: &ComputeOptions,
) -> Result<ComputedDynamicView, ComputeError> {
    let explicit = explicit_elements(model, &view.rules)?;
    let referenced = step_elements(model, &view.steps);
    let actors = resolve_actors(&explicit, &referenced);
    let resolver = StepResolver::new(model, &view.id, &actors);

    let (steps, branch_collections) = if options.dynamic_branches {
        let lowered = lower_branch_aware(&resolver, &view.steps)?;
        let collections = if lowered.branch_collections.is_empty() {
            None
        } else {
            Some(lowered.branch_collections)
        };
        (lowered.steps, collections)
    } else {
        (lower_legacy(&resolver, &view.steps)?, None)
    };
    debug!(
        view = %view.id,
        dynamic_branches = options.dynamic_branches,
        actors = actors.ordered.len(),
        steps = steps.len(),
        "lowered dynamic view steps"
    );

    let mut graph = build_nodes(model, &actors, &view.rules, &options.theme)?;
    let edges = build_edges(&mut graph, steps, &options.theme)?;

    Ok(ComputedDynamicView {
        id: view.id.clone(),
        title: view.title.clone(),
        description: view.description.clone(),
        tags: view.tags.clone(),
        auto_layout: view.auto_layout,
        variant: view.variant,
        nodes: graph.nodes,
        edges,
        branch_collections,
    })
}

/// Last successful computation of every view, keyed by view id.
///
/// A failing recomputation leaves the previous result in place and records
/// the error against the view id.
#[derive(Debug, Default)]
pub struct ComputedViews {
    views: BTreeMap<String, ComputedDynamicView>,
    errors: BTreeMap<String, ViewComputeError>,
}

impl ComputedViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes `views`; views no longer declared are dropped. Returns the
    /// failures of this pass.
    pub fn update(
        &mut self,
        model: &Model,
        views: &[DynamicViewSpec],
        options: &ComputeOptions,
    ) -> Vec<ViewComputeError> {
        self.views
            .retain(|id, _| views.iter().any(|view| &view.id == id));
        self.errors.clear();
        let mut failures = Vec::new();
        for view in views {
            match compute_dynamic_view(model, view, options) {
                Ok(computed) => {
                    self.views.insert(view.id.clone(), computed);
                }
                Err(err) => {
                    warn!(view = %view.id, error = %err.source, "view computation failed");
                    self.errors.insert(view.id.clone(), err.clone());
                    failures.push(err);
                }
            }
        }
        info!(
            computed = self.views.len(),
            failed = failures.len(),
            "dynamic views updated"
        );
        failures
    }

    pub fn get(&self, view_id: &str) -> Option<&ComputedDynamicView> {
        self.views.get(view_id)
    }

    pub fn error(&self, view_id: &str) -> Option<&ViewComputeError> {
        self.errors.get(view_id)
    }

    pub fn views(&self) -> impl Iterator<Item = &ComputedDynamicView> {
        self.views.values()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        AtomicStep, BranchCollection, BranchKind, BranchPath, DynamicStep, LegacyParallelEntry,
        StepSeries, ViewRule,
    };
    use crate::model::{Element, Relationship};
    use std::collections::HashSet;

    fn model() -> Model {
        let mut rel = Relationship::new("r1", "customer", "shop.web");
        rel.title = Some("opens".to_string());
        Model::new(
            vec![
                Element::new("customer", "actor"),
                Element::new("shop", "system"),
                Element::new("shop.web", "app"),
                Element::new("shop.api", "service"),
                Element::new("shop.db", "database"),
                Element::new("bank", "system"),
            ],
            vec![rel],
        )
    }

    fn options(dynamic_branches: bool) -> ComputeOptions {
        ComputeOptions {
            dynamic_branches,
            theme: Theme::standard(),
        }
    }

    fn step(source: &str, target: &str) -> DynamicStep {
        AtomicStep::new(source, target).into()
    }

    fn parallel_pair() -> DynamicStep {
        BranchCollection::legacy_parallel(
            "par-1",
            vec![
                LegacyParallelEntry::Step(AtomicStep::new("shop.web", "shop.api")),
                LegacyParallelEntry::Step(AtomicStep::new("shop.web", "bank")),
            ],
        )
        .into()
    }

    #[test]
    fn linear_steps_in_legacy_mode() {
        let view = DynamicViewSpec::new(
            "linear",
            vec![
                step("customer", "shop.web"),
                step("shop.web", "shop.api"),
                step("shop.api", "shop.db"),
            ],
        );
        let computed = compute_dynamic_view(&model(), &view, &options(false)).unwrap();
        assert_eq!(computed.edge_ids(), vec!["step-01", "step-02", "step-03"]);
        assert!(computed.branch_collections.is_none());
        assert_eq!(computed.edges[0].label.as_deref(), Some("opens"));
    }

    #[test]
    fn parallel_block_followed_by_root_step() {
        let view = DynamicViewSpec::new(
            "parallel",
            vec![parallel_pair(), step("shop.api", "shop.db")],
        );
        for dynamic_branches in [false, true] {
            let computed = compute_dynamic_view(&model(), &view, &options(dynamic_branches)).unwrap();
            let ids = computed.edge_ids();
            let unique: HashSet<&str> = ids.iter().copied().collect();
            assert_eq!(unique.len(), ids.len());
            assert_eq!(
                ids.iter().filter(|id| is_parallel_continuation_of(id, 1)).count(),
                2
            );
            assert!(ids.contains(&"step-02"));
        }
    }

    #[test]
    fn branch_summary_only_in_branch_aware_mode() {
        let view = DynamicViewSpec::new("parallel", vec![parallel_pair()]);
        let legacy = compute_dynamic_view(&model(), &view, &options(false)).unwrap();
        assert!(legacy.branch_collections.is_none());
        let aware = compute_dynamic_view(&model(), &view, &options(true)).unwrap();
        let summary = aware.branch_collections.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].paths.len(), 2);

        let flat = DynamicViewSpec::new("flat", vec![step("customer", "shop.web")]);
        let aware = compute_dynamic_view(&model(), &flat, &options(true)).unwrap();
        assert!(aware.branch_collections.is_none());
    }

    #[test]
    fn branch_without_steps_takes_no_root_index_in_either_mode() {
        let empty_path = BranchCollection::new(
            "e",
            BranchKind::Alternate,
            vec![BranchPath::new("e1", vec![])],
        );
        let no_paths = BranchCollection::new("z", BranchKind::Parallel, vec![]);
        let view = DynamicViewSpec::new(
            "empty-branches",
            vec![
                empty_path.into(),
                step("customer", "shop.web"),
                no_paths.into(),
                step("shop.web", "shop.api"),
            ],
        );
        for dynamic_branches in [false, true] {
            let computed = compute_dynamic_view(&model(), &view, &options(dynamic_branches)).unwrap();
            assert_eq!(computed.edge_ids(), vec!["step-01", "step-02"], "{dynamic_branches}");
            assert!(computed.branch_collections.is_none(), "{dynamic_branches}");
        }
    }

    #[test]
    fn legacy_mode_matches_dedicated_generator() {
        let view = DynamicViewSpec::new(
            "legacy",
            vec![
                step("customer", "shop.web"),
                parallel_pair(),
                StepSeries::new(vec![
                    AtomicStep::new("shop.api", "shop.db"),
                    AtomicStep::new("shop.db", "shop.api"),
                ])
                .into(),
            ],
        );
        let computed = compute_dynamic_view(&model(), &view, &options(false)).unwrap();
        let expected = [
            step_edge_id(1),
            build_legacy_parallel_step_id(2, 1),
            build_legacy_parallel_step_id(2, 2),
            step_edge_id(3),
            step_edge_id(4),
        ];
        let ids: Vec<&StepEdgeId> = computed.edges.iter().map(|edge| &edge.id).collect();
        assert_eq!(ids, expected.iter().collect::<Vec<_>>());
    }

    #[test]
    fn computation_is_deterministic() {
        let nested = BranchCollection::new(
            "alt",
            BranchKind::Alternate,
            vec![
                BranchPath::new("ok", vec![step("shop.api", "shop.db")]),
                BranchPath::new("fail", vec![step("shop.api", "bank"), parallel_pair()]),
            ],
        );
        let view = DynamicViewSpec::new("det", vec![step("customer", "shop.web"), nested.into()]);
        let first = compute_dynamic_view(&model(), &view, &options(true)).unwrap();
        let second = compute_dynamic_view(&model(), &view, &options(true)).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn actor_order_and_compounds() {
        let mut view = DynamicViewSpec::new(
            "actors",
            vec![step("customer", "shop.web"), step("shop.web", "bank")],
        );
        view.rules = vec![ViewRule::Include(vec!["shop".to_string(), "bank".to_string()])];
        let computed = compute_dynamic_view(&model(), &view, &options(false)).unwrap();
        let order: Vec<&str> = computed.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["bank", "customer", "shop", "shop.web"]);
        let shop = computed.node("shop").unwrap();
        assert!(shop.is_compound());
        assert_eq!(shop.out_edges.len(), 1);
        assert_eq!(shop.in_edges.len(), 1);
        assert_eq!(computed.edges[0].parent, None);
    }

    #[test]
    fn unresolved_step_fails_the_whole_view() {
        let view = DynamicViewSpec::new(
            "broken",
            vec![step("customer", "shop.web"), step("shop.web", "ghost")],
        );
        let err = compute_dynamic_view(&model(), &view, &options(true)).unwrap_err();
        assert_eq!(err.view_id, "broken");
        assert!(matches!(
            err.source,
            ComputeError::UnresolvedReference { ref reference, endpoint: Endpoint::Target, .. }
                if reference == "ghost"
        ));
    }

    #[test]
    fn failed_update_keeps_previous_result() {
        let model = model();
        let good = DynamicViewSpec::new("v", vec![step("customer", "shop.web")]);
        let mut cache = ComputedViews::new();
        assert!(cache.update(&model, std::slice::from_ref(&good), &options(false)).is_empty());
        assert_eq!(cache.get("v").unwrap().edges.len(), 1);

        let bad = DynamicViewSpec::new("v", vec![step("customer", "nowhere")]);
        let failures = cache.update(&model, &[bad], &options(false));
        assert_eq!(failures.len(), 1);
        assert_eq!(cache.get("v").unwrap().edges.len(), 1);
        assert!(cache.error("v").is_some());

        cache.update(&model, &[], &options(false));
        assert!(cache.is_empty());
    }
}
