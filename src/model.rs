use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

/// Fully qualified element name, e.g. `cloud.backend.api`.
///
/// Structure is encoded in the name itself: every dot-separated prefix names
/// an ancestor element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fqn(String);

impl Fqn {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of ancestors in the name (0 for top-level elements).
    pub fn depth(&self) -> usize {
        self.0.matches('.').count()
    }

    pub fn parent(&self) -> Option<Fqn> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| Fqn(parent.to_string()))
    }

    /// Ancestors from the nearest parent up to the top-level element.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: self.parent(),
        }
    }

    pub fn is_ancestor_of(&self, other: &Fqn) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(self.0.as_str())
            && other.0.as_bytes()[self.0.len()] == b'.'
    }

    pub fn is_same_or_ancestor_of(&self, other: &Fqn) -> bool {
        self == other || self.is_ancestor_of(other)
    }

    pub fn is_parent_of(&self, other: &Fqn) -> bool {
        other.parent().as_ref() == Some(self)
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Fqn {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fqn {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

pub struct Ancestors {
    next: Option<Fqn>,
}

impl Iterator for Ancestors {
    type Item = Fqn;

    fn next(&mut self) -> Option<Fqn> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

/// Nearest element that is a strict ancestor of both `a` and `b`.
///
/// Only the parents of each name are compared, so an element is never its own
/// common ancestor with a descendant: `cloud.api` and `cloud.api.db` meet at
/// `cloud`.
pub fn common_ancestor(a: &Fqn, b: &Fqn) -> Option<Fqn> {
    let a_parent = a.parent()?;
    let b_parent = b.parent()?;
    let mut common = Vec::new();
    for (left, right) in a_parent.0.split('.').zip(b_parent.0.split('.')) {
        if left != right {
            break;
        }
        common.push(left);
    }
    if common.is_empty() {
        None
    } else {
        Some(Fqn(common.join(".")))
    }
}

/// Stable reorder so that every ancestor precedes its descendants.
///
/// Items keep their relative order unless an ancestor appears later than one
/// of its descendants; in that case the ancestor (outermost first) is pulled
/// forward to sit directly before the first descendant.
pub fn sort_parents_first<T, F>(items: Vec<T>, fqn_of: F) -> Vec<T>
where
    F: Fn(&T) -> &Fqn,
{
    let mut remaining: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut result = Vec::with_capacity(remaining.len());
    for idx in 0..remaining.len() {
        let Some(item) = remaining[idx].take() else {
            continue;
        };
        let mut pulled: Vec<(usize, usize)> = Vec::new();
        for (later, candidate) in remaining.iter().enumerate().skip(idx + 1) {
            if let Some(candidate) = candidate {
                let candidate_fqn = fqn_of(candidate);
                if candidate_fqn.is_ancestor_of(fqn_of(&item)) {
                    pulled.push((candidate_fqn.depth(), later));
                }
            }
        }
        pulled.sort();
        for (_, later) in pulled {
            if let Some(ancestor) = remaining[later].take() {
                result.push(ancestor);
            }
        }
        result.push(item);
    }
    result
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    pub color: Option<String>,
    pub shape: Option<String>,
    pub opacity: Option<u8>,
    pub border: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: Fqn,
    #[serde(default)]
    pub kind: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub technology: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub style: ElementStyle,
    pub navigate_to: Option<String>,
}

impl Element {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: Fqn::new(id),
            kind: kind.into(),
            title: None,
            description: None,
            technology: None,
            tags: Vec::new(),
            style: ElementStyle::default(),
            navigate_to: None,
        }
    }

    /// Title shown on the node; falls back to the last name segment.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => self
                .id
                .as_str()
                .rsplit('.')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub source: Fqn,
    pub target: Fqn,
    pub title: Option<String>,
    pub description: Option<String>,
    pub technology: Option<String>,
    pub kind: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub color: Option<String>,
    pub line: Option<String>,
    pub head: Option<String>,
    pub tail: Option<String>,
    pub navigate_to: Option<String>,
}

impl Relationship {
    pub fn new(id: impl Into<String>, source: &str, target: &str) -> Self {
        Self {
            id: id.into(),
            source: Fqn::new(source),
            target: Fqn::new(target),
            title: None,
            description: None,
            technology: None,
            kind: None,
            tags: Vec::new(),
            color: None,
            line: None,
            head: None,
            tail: None,
            navigate_to: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawModel {
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

/// Resolved logical model: elements in declaration order plus relationships.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawModel")]
pub struct Model {
    elements: Vec<Element>,
    relationships: Vec<Relationship>,
    index: HashMap<Fqn, usize>,
}

impl From<RawModel> for Model {
    fn from(raw: RawModel) -> Self {
        Model::new(raw.elements, raw.relationships)
    }
}

impl Model {
    pub fn new(elements: Vec<Element>, relationships: Vec<Relationship>) -> Self {
        let index = elements
            .iter()
            .enumerate()
            .map(|(idx, element)| (element.id.clone(), idx))
            .collect();
        Self {
            elements,
            relationships,
            index,
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn element(&self, fqn: &str) -> Option<&Element> {
        self.index.get(fqn).map(|idx| &self.elements[*idx])
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.index.contains_key(fqn)
    }

    /// Relationships connecting `source` to `target`.
    ///
    /// Direct relationships win; when there are none, relationships between
    /// nested elements of either endpoint are returned instead.
    pub fn relationships_between(&self, source: &Fqn, target: &Fqn) -> Vec<&Relationship> {
        let direct: Vec<&Relationship> = self
            .relationships
            .iter()
            .filter(|rel| &rel.source == source && &rel.target == target)
            .collect();
        if !direct.is_empty() {
            return direct;
        }
        self.relationships
            .iter()
            .filter(|rel| {
                source.is_same_or_ancestor_of(&rel.source)
                    && target.is_same_or_ancestor_of(&rel.target)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fqn(value: &str) -> Fqn {
        Fqn::new(value)
    }

    #[test]
    fn ancestors_walk_upward() {
        let names: Vec<String> = fqn("a.b.c.d").ancestors().map(|f| f.to_string()).collect();
        assert_eq!(names, vec!["a.b.c", "a.b", "a"]);
        assert_eq!(fqn("a").ancestors().count(), 0);
    }

    #[test]
    fn ancestor_check_respects_segment_boundaries() {
        assert!(fqn("cloud").is_ancestor_of(&fqn("cloud.api")));
        assert!(!fqn("cloud").is_ancestor_of(&fqn("cloudy.api")));
        assert!(!fqn("cloud").is_ancestor_of(&fqn("cloud")));
        assert!(fqn("cloud").is_parent_of(&fqn("cloud.api")));
        assert!(!fqn("cloud").is_parent_of(&fqn("cloud.api.db")));
    }

    #[test]
    fn common_ancestor_compares_parents() {
        assert_eq!(
            common_ancestor(&fqn("cloud.api.a"), &fqn("cloud.web.b")),
            Some(fqn("cloud"))
        );
        assert_eq!(
            common_ancestor(&fqn("cloud.api"), &fqn("cloud.api.db")),
            Some(fqn("cloud"))
        );
        assert_eq!(common_ancestor(&fqn("a"), &fqn("b.c")), None);
        assert_eq!(common_ancestor(&fqn("a.x"), &fqn("b.y")), None);
    }

    #[test]
    fn parents_first_pulls_ancestors_forward() {
        let items = vec![fqn("c.x.y"), fqn("a"), fqn("c"), fqn("c.x"), fqn("b")];
        let sorted = sort_parents_first(items, |f| f);
        let names: Vec<&str> = sorted.iter().map(Fqn::as_str).collect();
        assert_eq!(names, vec!["c", "c.x", "c.x.y", "a", "b"]);
    }

    #[test]
    fn relationships_fall_back_to_nested() {
        let model = Model::new(
            vec![
                Element::new("a", "system"),
                Element::new("a.x", "container"),
                Element::new("b", "system"),
            ],
            vec![Relationship::new("r1", "a.x", "b")],
        );
        let found = model.relationships_between(&fqn("a"), &fqn("b"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "r1");
        assert!(model.relationships_between(&fqn("b"), &fqn("a")).is_empty());
    }
}
