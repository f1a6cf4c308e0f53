use std::collections::HashMap;

use crate::ir::{StyleRule, ViewRule};
use crate::model::{Fqn, Model, common_ancestor};
use crate::theme::Theme;

use super::actors::{Actors, ElementPredicate, parse_predicates};
use super::error::{ComputeError, Endpoint};
use super::types::{ComputedEdge, ComputedNode, ComputedStep, EdgeDirection, NodeStyle};

/// Nodes of a view with a lookup by element name.
pub(super) struct NodeGraph {
    pub nodes: Vec<ComputedNode>,
    index: HashMap<Fqn, usize>,
}

impl NodeGraph {
    fn get_index(&self, fqn: &Fqn) -> Option<usize> {
        self.index.get(fqn).copied()
    }

    /// Nearest node that is an ancestor of `fqn`.
    fn closest_ancestor(&self, fqn: &Fqn) -> Option<Fqn> {
        fqn.ancestors().find(|ancestor| self.index.contains_key(ancestor))
    }

    /// Walks up from the structural common ancestor of both endpoints until an
    /// element present in the view is found.
    fn edge_parent(&self, source: &Fqn, target: &Fqn) -> Option<Fqn> {
        let mut candidate = common_ancestor(source, target);
        while let Some(fqn) = candidate {
            if self.index.contains_key(&fqn) {
                return Some(fqn);
            }
            candidate = fqn.parent();
        }
        None
    }
}

struct StyleMatcher<'a> {
    predicates: Vec<ElementPredicate>,
    rule: &'a StyleRule,
}

fn style_matchers(rules: &[ViewRule]) -> Result<Vec<StyleMatcher<'_>>, ComputeError> {
    rules
        .iter()
        .filter_map(|rule| match rule {
            ViewRule::Style(style) => Some(style),
            _ => None,
        })
        .map(|rule| {
            Ok(StyleMatcher {
                predicates: parse_predicates(&rule.targets)?,
                rule,
            })
        })
        .collect()
}

fn node_style(
    model: &Model,
    fqn: &Fqn,
    compound: bool,
    matchers: &[StyleMatcher<'_>],
    theme: &Theme,
) -> NodeStyle {
    let mut style = NodeStyle {
        color: theme.element_color.clone(),
        shape: theme.element_shape.clone(),
        opacity: theme.element_opacity,
        border: theme.element_border.clone(),
        size: theme.element_size.clone(),
    };
    if compound {
        style.opacity = theme.compound_opacity;
        style.border = theme.compound_border.clone();
    }
    if let Some(own) = model.element(fqn.as_str()).map(|element| &element.style) {
        apply_style(
            &mut style,
            &own.color,
            &own.shape,
            own.opacity,
            &own.border,
            &own.size,
        );
    }
    for matcher in matchers {
        if matcher.predicates.iter().any(|p| p.matches(fqn)) {
            let rule = matcher.rule;
            apply_style(
                &mut style,
                &rule.color,
                &rule.shape,
                rule.opacity,
                &rule.border,
                &rule.size,
            );
        }
    }
    style
}

fn apply_style(
    style: &mut NodeStyle,
    color: &Option<String>,
    shape: &Option<String>,
    opacity: Option<u8>,
    border: &Option<String>,
    size: &Option<String>,
) {
    if let Some(v) = color {
        style.color = v.clone();
    }
    if let Some(v) = shape {
        style.shape = v.clone();
    }
    if let Some(v) = opacity {
        style.opacity = v.min(100);
    }
    if let Some(v) = border {
        style.border = v.clone();
    }
    if let Some(v) = size {
        style.size = v.clone();
    }
}

pub(super) fn build_nodes(
    model: &Model,
    actors: &Actors,
    rules: &[ViewRule],
    theme: &Theme,
) -> Result<NodeGraph, ComputeError> {
    let matchers = style_matchers(rules)?;
    let index: HashMap<Fqn, usize> = actors
        .ordered
        .iter()
        .enumerate()
        .map(|(idx, fqn)| (fqn.clone(), idx))
        .collect();
    let mut graph = NodeGraph {
        nodes: Vec::with_capacity(actors.ordered.len()),
        index,
    };

    for fqn in &actors.ordered {
        let Some(element) = model.element(fqn.as_str()) else {
            return Err(ComputeError::UnknownElement {
                reference: fqn.to_string(),
            });
        };
        let parent = graph.closest_ancestor(fqn);
        let level = fqn
            .ancestors()
            .filter(|ancestor| graph.index.contains_key(ancestor))
            .count();
        let style = node_style(
            model,
            fqn,
            actors.compounds.contains(fqn),
            &matchers,
            theme,
        );
        graph.nodes.push(ComputedNode {
            id: fqn.clone(),
            kind: element.kind.clone(),
            title: element.display_title(),
            description: element.description.clone(),
            technology: element.technology.clone(),
            tags: element.tags.clone(),
            parent,
            children: Vec::new(),
            in_edges: Vec::new(),
            out_edges: Vec::new(),
            level,
            depth: 0,
            navigate_to: element.navigate_to.clone(),
            style,
        });
    }

    // Parents precede children, so walking backwards settles every child
    // before its parent.
    for idx in (0..graph.nodes.len()).rev() {
        let Some(parent) = graph.nodes[idx].parent.clone() else {
            continue;
        };
        let Some(parent_idx) = graph.get_index(&parent) else {
            continue;
        };
        let child_id = graph.nodes[idx].id.clone();
        let child_depth = graph.nodes[idx].depth;
        let parent_node = &mut graph.nodes[parent_idx];
        parent_node.children.insert(0, child_id);
        parent_node.depth = parent_node.depth.max(child_depth + 1);
    }

    Ok(graph)
}

/// Turns computed steps into edges and records each edge on its endpoints and
/// on every in-view container it crosses below the edge's parent.
pub(super) fn build_edges(
    graph: &mut NodeGraph,
    steps: Vec<ComputedStep>,
    theme: &Theme,
) -> Result<Vec<ComputedEdge>, ComputeError> {
    let mut edges = Vec::with_capacity(steps.len());
    for step in steps {
        let endpoint_index = |fqn: &Fqn, endpoint: Endpoint| {
            graph
                .get_index(fqn)
                .ok_or_else(|| ComputeError::UnresolvedReference {
                    reference: fqn.to_string(),
                    endpoint,
                    ast_path: step.ast_path.clone(),
                })
        };
        let source_idx = endpoint_index(&step.source, Endpoint::Source)?;
        let target_idx = endpoint_index(&step.target, Endpoint::Target)?;
        let parent = graph.edge_parent(&step.source, &step.target);

        graph.nodes[source_idx].out_edges.push(step.id.clone());
        graph.nodes[target_idx].in_edges.push(step.id.clone());
        for ancestor in step.source.ancestors() {
            if parent.as_ref() == Some(&ancestor) {
                break;
            }
            if let Some(idx) = graph.get_index(&ancestor) {
                graph.nodes[idx].out_edges.push(step.id.clone());
            }
        }
        for ancestor in step.target.ancestors() {
            if parent.as_ref() == Some(&ancestor) {
                break;
            }
            if let Some(idx) = graph.get_index(&ancestor) {
                graph.nodes[idx].in_edges.push(step.id.clone());
            }
        }

        edges.push(ComputedEdge {
            id: step.id,
            source: step.source,
            target: step.target,
            parent,
            label: step.title,
            description: step.description,
            technology: step.technology,
            kind: step.kind,
            notation: step.notation,
            notes: step.notes,
            relations: step.relations,
            dir: if step.is_backward {
                EdgeDirection::Back
            } else {
                EdgeDirection::Forward
            },
            color: step.color.unwrap_or_else(|| theme.relation_color.clone()),
            line: step.line.unwrap_or_else(|| theme.relation_line.clone()),
            head: step.head.unwrap_or_else(|| theme.relation_head.clone()),
            tail: step.tail,
            navigate_to: step.navigate_to,
            branch_trail: step.branch_trail,
            ast_path: step.ast_path,
        });
    }
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;
    use crate::view::actors::resolve_actors;
    use crate::view::step_id::step_edge_id;

    fn model() -> Model {
        let mut api = Element::new("cloud.backend.api", "container");
        api.style.color = Some("green".to_string());
        Model::new(
            vec![
                Element::new("user", "actor"),
                Element::new("cloud", "system"),
                Element::new("cloud.backend", "container"),
                api,
                Element::new("cloud.backend.db", "database"),
                Element::new("cloud.frontend", "container"),
                Element::new("cloud.frontend.web", "app"),
            ],
            Vec::new(),
        )
    }

    fn fqns(values: &[&str]) -> Vec<Fqn> {
        values.iter().map(|v| Fqn::new(*v)).collect()
    }

    fn step(id: usize, source: &str, target: &str) -> ComputedStep {
        ComputedStep {
            id: step_edge_id(id),
            source: Fqn::new(source),
            target: Fqn::new(target),
            title: None,
            description: None,
            technology: None,
            kind: None,
            notation: None,
            notes: None,
            color: None,
            line: None,
            head: None,
            tail: None,
            is_backward: false,
            navigate_to: None,
            relations: Vec::new(),
            branch_trail: None,
            ast_path: String::new(),
        }
    }

    fn edge_list(graph: &NodeGraph, id: &str) -> (Vec<String>, Vec<String>) {
        let node = &graph.nodes[graph.get_index(&Fqn::new(id)).unwrap()];
        (
            node.in_edges.iter().map(|e| e.to_string()).collect(),
            node.out_edges.iter().map(|e| e.to_string()).collect(),
        )
    }

    #[test]
    fn hierarchy_and_styles() {
        let model = model();
        let actors = resolve_actors(
            &fqns(&["cloud", "cloud.backend", "cloud.backend.api", "user"]),
            &[],
        );
        let rules = vec![ViewRule::Style(StyleRule {
            targets: vec!["user".to_string()],
            shape: Some("person".to_string()),
            ..StyleRule::default()
        })];
        let graph = build_nodes(&model, &actors, &rules, &Theme::standard()).unwrap();
        let cloud = &graph.nodes[0];
        assert_eq!(cloud.children, fqns(&["cloud.backend"]));
        assert_eq!(cloud.depth, 2);
        assert_eq!(cloud.style.opacity, 15);
        let api = &graph.nodes[2];
        assert_eq!(api.parent, Some(Fqn::new("cloud.backend")));
        assert_eq!(api.level, 2);
        assert_eq!(api.style.color, "green");
        assert_eq!(graph.nodes[3].style.shape, "person");
        assert_eq!(graph.nodes[3].title, "user");
    }

    #[test]
    fn edges_propagate_to_intermediate_containers_only() {
        let model = model();
        let actors = resolve_actors(
            &fqns(&[
                "cloud",
                "cloud.backend",
                "cloud.backend.api",
                "cloud.frontend",
                "cloud.frontend.web",
            ]),
            &[],
        );
        let mut graph = build_nodes(&model, &actors, &[], &Theme::standard()).unwrap();
        let edges = build_edges(
            &mut graph,
            vec![step(1, "cloud.frontend.web", "cloud.backend.api")],
            &Theme::standard(),
        )
        .unwrap();
        assert_eq!(edges[0].parent, Some(Fqn::new("cloud")));
        assert_eq!(edge_list(&graph, "cloud.frontend").1, vec!["step-01"]);
        assert_eq!(edge_list(&graph, "cloud.backend").0, vec!["step-01"]);
        assert_eq!(edge_list(&graph, "cloud.frontend.web").1, vec!["step-01"]);
        assert_eq!(edge_list(&graph, "cloud.backend.api").0, vec!["step-01"]);
        let (cloud_in, cloud_out) = edge_list(&graph, "cloud");
        assert!(cloud_in.is_empty() && cloud_out.is_empty());
    }

    #[test]
    fn edge_parent_skips_containers_missing_from_view() {
        let model = model();
        let actors = resolve_actors(&fqns(&["cloud", "cloud.backend.api", "cloud.backend.db"]), &[]);
        let mut graph = build_nodes(&model, &actors, &[], &Theme::standard()).unwrap();
        let edges = build_edges(
            &mut graph,
            vec![
                step(1, "cloud.backend.api", "cloud.backend.db"),
                step(2, "user", "cloud.backend.api"),
            ],
            &Theme::standard(),
        );
        assert!(edges.is_err());

        let mut graph = build_nodes(&model, &actors, &[], &Theme::standard()).unwrap();
        let edges = build_edges(
            &mut graph,
            vec![step(1, "cloud.backend.api", "cloud.backend.db")],
            &Theme::standard(),
        )
        .unwrap();
        assert_eq!(edges[0].parent, Some(Fqn::new("cloud")));
        assert_eq!(edges[0].line, "dashed");
        let (cloud_in, cloud_out) = edge_list(&graph, "cloud");
        assert!(cloud_in.is_empty() && cloud_out.is_empty());
    }

    #[test]
    fn top_level_edges_have_no_parent_and_reach_every_ancestor() {
        let model = model();
        let actors = resolve_actors(&fqns(&["user", "cloud", "cloud.backend", "cloud.backend.api"]), &[]);
        let mut graph = build_nodes(&model, &actors, &[], &Theme::standard()).unwrap();
        let edges = build_edges(
            &mut graph,
            vec![step(1, "user", "cloud.backend.api")],
            &Theme::standard(),
        )
        .unwrap();
        assert_eq!(edges[0].parent, None);
        assert_eq!(edge_list(&graph, "cloud").0, vec!["step-01"]);
        assert_eq!(edge_list(&graph, "cloud.backend").0, vec!["step-01"]);
    }
}
