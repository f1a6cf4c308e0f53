use crate::config::{Config, env_dynamic_branches, load_config, resolve_dynamic_branches};
use crate::ir::DynamicViewSpec;
use crate::view::{ComputeOptions, ComputedViews};
use crate::view_dump::{ViewDump, write_view_dump};
use crate::workspace::{Workspace, parse_workspace};
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(
    name = "dynview",
    version,
    about = "Lower dynamic views into computed node/edge graphs"
)]
pub struct Args {
    /// Workspace file (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Only compute the named view(s)
    #[arg(long = "view")]
    pub views: Vec<String>,

    /// Force branch-aware lowering on
    #[arg(long = "branches", conflicts_with = "no_branches")]
    pub branches: bool,

    /// Force legacy lowering
    #[arg(long = "no-branches")]
    pub no_branches: bool,

    /// Compact JSON output
    #[arg(long = "compact")]
    pub compact: bool,

    /// Log level written to stderr (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

impl Args {
    fn branch_override(&self) -> Option<bool> {
        match (self.branches, self.no_branches) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let workspace = parse_workspace(&input)?;

    let dynamic_branches = resolve_flag(&args, &config, &workspace);
    let views = select_views(&workspace, &args.views)?;
    info!(
        views = views.len(),
        dynamic_branches,
        "computing dynamic views"
    );

    let options = ComputeOptions {
        dynamic_branches,
        theme: config.theme.clone(),
    };
    let mut computed = ComputedViews::new();
    let failures = computed.update(&workspace.model, &views, &options);

    let mut dump = ViewDump::new(computed.views(), dynamic_branches);
    for failure in &failures {
        dump = dump.with_error(&failure.view_id, failure.source.to_string());
    }
    let pretty = config.output.pretty && !args.compact;
    write_view_dump(args.output.as_deref(), &dump, pretty)?;

    if let Some(first) = failures.first() {
        return Err(anyhow::anyhow!(
            "{first} ({} of {} views failed)",
            failures.len(),
            views.len()
        ));
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::WARN);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_flag(args: &Args, config: &Config, workspace: &Workspace) -> bool {
    let project_flag = config
        .project
        .dynamic_branches
        .or(workspace.project.dynamic_branches);
    resolve_dynamic_branches(args.branch_override(), project_flag, env_dynamic_branches())
}

fn select_views(workspace: &Workspace, names: &[String]) -> Result<Vec<DynamicViewSpec>> {
    if names.is_empty() {
        return Ok(workspace.views.clone());
    }
    names
        .iter()
        .map(|name| {
            workspace
                .view(name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("view '{name}' not found in workspace"))
        })
        .collect()
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
