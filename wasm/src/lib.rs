use dynview::config::{env_dynamic_branches, resolve_dynamic_branches};
use dynview::{ComputeOptions, Theme, compute_workspace_json, parse_workspace};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DynamicViewOptions {
    dynamic_branches: Option<bool>,
    theme: Option<String>,
    pretty: Option<bool>,
}

fn build_compute_options(
    options: &DynamicViewOptions,
    project_flag: Option<bool>,
) -> Result<ComputeOptions, String> {
    let theme = match options.theme.as_deref() {
        Some(name) => Theme::by_name(name).ok_or_else(|| format!("unknown theme '{name}'"))?,
        None => Theme::default(),
    };
    Ok(ComputeOptions {
        dynamic_branches: resolve_dynamic_branches(
            options.dynamic_branches,
            project_flag,
            env_dynamic_branches(),
        ),
        theme,
    })
}

fn compute(workspace_json: &str, options: DynamicViewOptions) -> Result<String, String> {
    let workspace = parse_workspace(workspace_json).map_err(|error| error.to_string())?;
    let compute_options = build_compute_options(&options, workspace.project.dynamic_branches)?;
    compute_workspace_json(&workspace, &compute_options, options.pretty.unwrap_or(false))
        .map_err(|error| error.to_string())
}

#[wasm_bindgen]
pub fn compute_dynamic_views(
    workspace_json: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<DynamicViewOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        DynamicViewOptions::default()
    };

    compute(workspace_json, options).map_err(|error| JsValue::from_str(&error))
}
