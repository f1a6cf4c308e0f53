#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod model;
pub mod theme;
pub mod view;
pub mod view_dump;
pub mod workspace;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config, resolve_dynamic_branches};
pub use ir::{
    AtomicStep, BranchCollection, BranchKind, BranchPath, DynamicStep, DynamicViewSpec,
    LegacyParallelEntry, StepSeries,
};
pub use model::{Fqn, Model};
pub use theme::Theme;
pub use view::{
    ComputeError, ComputeOptions, ComputedDynamicView, ComputedViews, ViewComputeError,
    compute_dynamic_view,
};
pub use workspace::{Workspace, load_workspace, parse_workspace};

/// Computes every view of `workspace` and serializes the result for the
/// layout engine.
pub fn compute_workspace_json(
    workspace: &Workspace,
    options: &ComputeOptions,
    pretty: bool,
) -> anyhow::Result<String> {
    let mut computed = ComputedViews::new();
    let failures = computed.update(&workspace.model, &workspace.views, options);
    let mut dump = view_dump::ViewDump::new(computed.views(), options.dynamic_branches);
    for failure in &failures {
        dump = dump.with_error(&failure.view_id, failure.source.to_string());
    }
    dump.to_json(pretty)
}
