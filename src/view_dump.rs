use crate::view::ComputedDynamicView;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Handoff document for the layout engine: every computed view plus the
/// failures of the pass.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDump<'a> {
    pub dynamic_branches: bool,
    pub views: Vec<&'a ComputedDynamicView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ViewErrorDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewErrorDump {
    pub view_id: String,
    pub message: String,
}

impl<'a> ViewDump<'a> {
    pub fn new(
        views: impl IntoIterator<Item = &'a ComputedDynamicView>,
        dynamic_branches: bool,
    ) -> Self {
        Self {
            dynamic_branches,
            views: views.into_iter().collect(),
            errors: Vec::new(),
        }
    }

    pub fn with_error(mut self, view_id: &str, message: impl Into<String>) -> Self {
        self.errors.push(ViewErrorDump {
            view_id: view_id.to_string(),
            message: message.into(),
        });
        self
    }

    pub fn to_json(&self, pretty: bool) -> anyhow::Result<String> {
        let out = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(out)
    }
}

pub fn write_view_dump(path: Option<&Path>, dump: &ViewDump<'_>, pretty: bool) -> anyhow::Result<()> {
    let json = dump.to_json(pretty)?;
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(json.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(json.as_bytes())?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}
