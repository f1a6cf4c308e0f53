use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::ir::{DynamicStep, ViewRule};
use crate::model::{Fqn, Model, sort_parents_first};

use super::error::ComputeError;
use super::flatten::flatten_all;

static PREDICATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<fqn>[A-Za-z_][\w-]*(?:\.[A-Za-z_][\w-]*)*)(?P<suffix>\.\*\*|\.\*)?$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementPredicate {
    /// `*`: every top-level element.
    Wildcard,
    /// `a.b`
    Element(Fqn),
    /// `a.b.*`
    Children(Fqn),
    /// `a.b.**`
    Descendants(Fqn),
}

impl ElementPredicate {
    pub fn parse(expression: &str) -> Result<Self, ComputeError> {
        let expression = expression.trim();
        if expression == "*" {
            return Ok(Self::Wildcard);
        }
        let caps = PREDICATE_RE
            .captures(expression)
            .ok_or_else(|| ComputeError::InvalidPredicate {
                expression: expression.to_string(),
            })?;
        let fqn = Fqn::new(&caps["fqn"]);
        Ok(match caps.name("suffix").map(|m| m.as_str()) {
            Some(".**") => Self::Descendants(fqn),
            Some(".*") => Self::Children(fqn),
            _ => Self::Element(fqn),
        })
    }

    pub fn matches(&self, fqn: &Fqn) -> bool {
        match self {
            Self::Wildcard => fqn.depth() == 0,
            Self::Element(target) => target == fqn,
            Self::Children(parent) => parent.is_parent_of(fqn),
            Self::Descendants(parent) => parent.is_ancestor_of(fqn),
        }
    }

    fn anchor(&self) -> Option<&Fqn> {
        match self {
            Self::Wildcard => None,
            Self::Element(fqn) | Self::Children(fqn) | Self::Descendants(fqn) => Some(fqn),
        }
    }
}

pub fn parse_predicates(expressions: &[String]) -> Result<Vec<ElementPredicate>, ComputeError> {
    expressions
        .iter()
        .map(|expr| ElementPredicate::parse(expr))
        .collect()
}

/// Elements selected by the view's include/exclude rules, in rule order.
pub fn explicit_elements(model: &Model, rules: &[ViewRule]) -> Result<Vec<Fqn>, ComputeError> {
    let mut selected: Vec<Fqn> = Vec::new();
    for rule in rules {
        match rule {
            ViewRule::Include(expressions) => {
                for predicate in parse_predicates(expressions)? {
                    if let Some(anchor) = predicate.anchor() {
                        if !model.contains(anchor.as_str()) {
                            return Err(ComputeError::UnknownElement {
                                reference: anchor.to_string(),
                            });
                        }
                    }
                    for element in model.elements() {
                        if predicate.matches(&element.id) && !selected.contains(&element.id) {
                            selected.push(element.id.clone());
                        }
                    }
                }
            }
            ViewRule::Exclude(expressions) => {
                let predicates = parse_predicates(expressions)?;
                selected.retain(|fqn| !predicates.iter().any(|p| p.matches(fqn)));
            }
            ViewRule::Style(_) => {}
        }
    }
    Ok(selected)
}

/// Step endpoints in first-seen order, limited to elements the model knows.
pub fn step_elements(model: &Model, steps: &[DynamicStep]) -> Vec<Fqn> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for step in flatten_all(steps) {
        for fqn in [&step.source, &step.target] {
            if model.contains(fqn.as_str()) && seen.insert(fqn.clone()) {
                out.push(fqn.clone());
            }
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct Actors {
    /// Column order; ancestors always precede descendants.
    pub ordered: Vec<Fqn>,
    pub compounds: HashSet<Fqn>,
}

pub fn resolve_actors(explicit: &[Fqn], referenced: &[Fqn]) -> Actors {
    let referenced_set: HashSet<&Fqn> = referenced.iter().collect();
    let mut ordered: Vec<Fqn> = explicit
        .iter()
        .filter(|fqn| referenced_set.contains(fqn))
        .cloned()
        .collect();
    for fqn in referenced.iter().chain(explicit) {
        if !ordered.contains(fqn) {
            ordered.push(fqn.clone());
        }
    }
    let ordered = sort_parents_first(ordered, |fqn| fqn);

    let mut compounds = HashSet::new();
    for (idx, fqn) in ordered.iter().enumerate() {
        if ordered[idx + 1..]
            .iter()
            .any(|later| fqn.is_ancestor_of(later))
        {
            compounds.insert(fqn.clone());
        }
    }
    Actors { ordered, compounds }
}
