use serde::{Deserialize, Serialize};

/// Fallback styling for nodes and edges that neither the model nor the
/// view's style rules decide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub element_color: String,
    pub element_shape: String,
    pub element_opacity: u8,
    pub element_border: String,
    pub element_size: String,
    pub compound_opacity: u8,
    pub compound_border: String,
    pub relation_color: String,
    pub relation_line: String,
    pub relation_head: String,
}

impl Theme {
    pub fn standard() -> Self {
        Self {
            element_color: "primary".to_string(),
            element_shape: "rectangle".to_string(),
            element_opacity: 100,
            element_border: "solid".to_string(),
            element_size: "md".to_string(),
            compound_opacity: 15,
            compound_border: "dashed".to_string(),
            relation_color: "gray".to_string(),
            relation_line: "dashed".to_string(),
            relation_head: "normal".to_string(),
        }
    }

    pub fn muted() -> Self {
        Self {
            element_color: "slate".to_string(),
            element_shape: "rectangle".to_string(),
            element_opacity: 100,
            element_border: "none".to_string(),
            element_size: "sm".to_string(),
            compound_opacity: 8,
            compound_border: "dotted".to_string(),
            relation_color: "slate".to_string(),
            relation_line: "solid".to_string(),
            relation_head: "onormal".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "standard" | "default" => Some(Self::standard()),
            "muted" => Some(Self::muted()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::standard()
    }
}
