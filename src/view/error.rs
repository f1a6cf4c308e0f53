use crate::ir::AstPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Source => f.write_str("source"),
            Endpoint::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComputeError {
    /// A step endpoint does not name an element of the model.
    #[error("step {endpoint} '{reference}' does not resolve to a model element (at {ast_path})")]
    UnresolvedReference {
        reference: String,
        endpoint: Endpoint,
        ast_path: AstPath,
    },

    /// A view rule names an element missing from the model.
    #[error("view rule references unknown element '{reference}'")]
    UnknownElement { reference: String },

    #[error("invalid element predicate '{expression}'")]
    InvalidPredicate { expression: String },
}

/// Failure of one view; the whole view is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to compute view '{view_id}': {source}")]
pub struct ViewComputeError {
    pub view_id: String,
    #[source]
    pub source: ComputeError,
}

impl ViewComputeError {
    pub fn new(view_id: impl Into<String>, source: ComputeError) -> Self {
        Self {
            view_id: view_id.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_reference_and_location() {
        let err = ViewComputeError::new(
            "checkout",
            ComputeError::UnresolvedReference {
                reference: "shop.api".to_string(),
                endpoint: Endpoint::Target,
                ast_path: "/views@0/steps@2".to_string(),
            },
        );
        let message = err.to_string();
        assert!(message.contains("checkout"));
        assert!(message.contains("target 'shop.api'"));
        assert!(message.contains("/views@0/steps@2"));
    }
}
