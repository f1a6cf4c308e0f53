use crate::theme::Theme;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process-level default for branch-aware lowering.
pub const DYNAMIC_BRANCHES_ENV: &str = "DYNVIEW_DYNAMIC_BRANCHES";

static ENV_DYNAMIC_BRANCHES: Lazy<bool> = Lazy::new(|| {
    std::env::var(DYNAMIC_BRANCHES_ENV)
        .ok()
        .and_then(|value| parse_flag(&value))
        .unwrap_or(false)
});

/// Value of `DYNVIEW_DYNAMIC_BRANCHES` as read on first use.
pub fn env_dynamic_branches() -> bool {
    *ENV_DYNAMIC_BRANCHES
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Runtime override, then project flag, then the process default.
pub fn resolve_dynamic_branches(
    runtime_override: Option<bool>,
    project_flag: Option<bool>,
    env_default: bool,
) -> bool {
    runtime_override.or(project_flag).unwrap_or(env_default)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub dynamic_branches: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    pub theme: Theme,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeOverrides {
    element_color: Option<String>,
    element_shape: Option<String>,
    element_opacity: Option<u8>,
    element_border: Option<String>,
    element_size: Option<String>,
    compound_opacity: Option<u8>,
    compound_border: Option<String>,
    relation_color: Option<String>,
    relation_line: Option<String>,
    relation_head: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_overrides: Option<ThemeOverrides>,
    dynamic_branches: Option<bool>,
    pretty: Option<bool>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a config document (JSON or JSON5) over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let value = match serde_json::from_str::<serde_json::Value>(contents) {
        Ok(value) => value,
        Err(_) => json5::from_str::<serde_json::Value>(contents)?,
    };
    let parsed: ConfigFile = serde_json::from_value(value)?;
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::by_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme '{theme_name}'"))?;
    }

    if let Some(vars) = parsed.theme_overrides {
        if let Some(v) = vars.element_color {
            config.theme.element_color = v;
        }
        if let Some(v) = vars.element_shape {
            config.theme.element_shape = v;
        }
        if let Some(v) = vars.element_opacity {
            config.theme.element_opacity = v.min(100);
        }
        if let Some(v) = vars.element_border {
            config.theme.element_border = v;
        }
        if let Some(v) = vars.element_size {
            config.theme.element_size = v;
        }
        if let Some(v) = vars.compound_opacity {
            config.theme.compound_opacity = v.min(100);
        }
        if let Some(v) = vars.compound_border {
            config.theme.compound_border = v;
        }
        if let Some(v) = vars.relation_color {
            config.theme.relation_color = v;
        }
        if let Some(v) = vars.relation_line {
            config.theme.relation_line = v;
        }
        if let Some(v) = vars.relation_head {
            config.theme.relation_head = v;
        }
    }

    config.project.dynamic_branches = parsed.dynamic_branches;
    if let Some(pretty) = parsed.pretty {
        config.output.pretty = pretty;
    }
    Ok(config)
}
