use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::ir::{AtomicStep, BranchCollection, DynamicStep};
use crate::model::{Fqn, Model, Relationship};

use super::actors::Actors;
use super::branch_stack::{BranchStack, BranchStackEntry};
use super::error::{ComputeError, Endpoint};
use super::flatten::flatten;
use super::step_id::{build_legacy_parallel_step_id, build_step_id_at, step_edge_id};
use super::types::{BranchTrailEntry, ComputedBranchCollection, ComputedStep, StepEdgeId};

/// Resolves authored steps against the model and the view's actor columns.
pub(super) struct StepResolver<'a> {
    model: &'a Model,
    view_id: &'a str,
    columns: HashMap<&'a Fqn, usize>,
}

impl<'a> StepResolver<'a> {
    pub(super) fn new(model: &'a Model, view_id: &'a str, actors: &'a Actors) -> Self {
        let columns = actors
            .ordered
            .iter()
            .enumerate()
            .map(|(idx, fqn)| (fqn, idx))
            .collect();
        Self {
            model,
            view_id,
            columns,
        }
    }

    fn column(&self, step: &AtomicStep, endpoint: Endpoint) -> Result<usize, ComputeError> {
        let fqn = match endpoint {
            Endpoint::Source => &step.source,
            Endpoint::Target => &step.target,
        };
        self.columns
            .get(fqn)
            .copied()
            .ok_or_else(|| ComputeError::UnresolvedReference {
                reference: fqn.to_string(),
                endpoint,
                ast_path: step.ast_path.clone(),
            })
    }

    pub(super) fn resolve(
        &self,
        step: &AtomicStep,
        id: StepEdgeId,
        branch_trail: Option<Vec<BranchTrailEntry>>,
    ) -> Result<ComputedStep, ComputeError> {
        let source_column = self.column(step, Endpoint::Source)?;
        let target_column = self.column(step, Endpoint::Target)?;

        let relations = self.model.relationships_between(&step.source, &step.target);
        let derived = match relations.as_slice() {
            [single] => Some(*single),
            _ => None,
        };
        let from_relation = |field: fn(&Relationship) -> &Option<String>| {
            derived.and_then(|rel| field(rel).clone())
        };

        let title = step
            .title
            .clone()
            .or_else(|| from_relation(|rel| &rel.title))
            .or_else(|| shared_title(&relations));
        let navigate_to = step
            .navigate_to
            .clone()
            .or_else(|| from_relation(|rel| &rel.navigate_to))
            .filter(|target| target != self.view_id);

        Ok(ComputedStep {
            id,
            source: step.source.clone(),
            target: step.target.clone(),
            title,
            description: step
                .description
                .clone()
                .or_else(|| from_relation(|rel| &rel.description)),
            technology: step
                .technology
                .clone()
                .or_else(|| from_relation(|rel| &rel.technology)),
            kind: step.kind.clone().or_else(|| from_relation(|rel| &rel.kind)),
            notation: step.notation.clone(),
            notes: step.notes.clone(),
            color: step.color.clone().or_else(|| from_relation(|rel| &rel.color)),
            line: step.line.clone().or_else(|| from_relation(|rel| &rel.line)),
            head: step.head.clone().or_else(|| from_relation(|rel| &rel.head)),
            tail: step.tail.clone().or_else(|| from_relation(|rel| &rel.tail)),
            is_backward: step.is_backward || target_column < source_column,
            navigate_to,
            relations: relations.iter().map(|rel| rel.id.clone()).collect(),
            branch_trail,
            ast_path: step.ast_path.clone(),
        })
    }
}

fn shared_title(relations: &[&Relationship]) -> Option<String> {
    let (first, rest) = relations.split_first()?;
    let title = first.title.as_ref()?;
    if rest.iter().all(|rel| rel.title.as_ref() == Some(title)) {
        Some(title.clone())
    } else {
        None
    }
}

/// Flat/two-level scheme: root steps get `step-NN`, every step flattened out
/// of a branch collection gets `step-NN.MM`.
pub(super) fn lower_legacy(
    resolver: &StepResolver<'_>,
    steps: &[DynamicStep],
) -> Result<Vec<ComputedStep>, ComputeError> {
    let mut out = Vec::new();
    let mut root = 0;
    for step in steps {
        match step {
            DynamicStep::Step(atomic) => {
                root += 1;
                out.push(resolver.resolve(atomic, step_edge_id(root), None)?);
            }
            DynamicStep::Series(series) => {
                for atomic in &series.steps {
                    root += 1;
                    out.push(resolver.resolve(atomic, step_edge_id(root), None)?);
                }
            }
            DynamicStep::Branch(_) => {
                let flat = flatten(step);
                if flat.is_empty() {
                    continue;
                }
                root += 1;
                for (idx, atomic) in flat.into_iter().enumerate() {
                    let id = build_legacy_parallel_step_id(root, idx + 1);
                    out.push(resolver.resolve(atomic, id, None)?);
                }
            }
        }
    }
    Ok(out)
}

pub(super) struct BranchAwareOutput {
    pub steps: Vec<ComputedStep>,
    pub branch_collections: Vec<ComputedBranchCollection>,
}

/// Nested scheme: branch collections are walked path by path with a stack of
/// open levels; ids carry one segment per level.
pub(super) fn lower_branch_aware<'a>(
    resolver: &StepResolver<'_>,
    steps: &'a [DynamicStep],
) -> Result<BranchAwareOutput, ComputeError> {
    let mut walker = BranchWalker {
        resolver,
        stack: BranchStack::new(),
        emitted: HashSet::new(),
        steps: Vec::new(),
    };
    walker.walk_root(steps)?;
    let branch_collections = walker.stack.finalize().unwrap_or_default();
    Ok(BranchAwareOutput {
        steps: walker.steps,
        branch_collections,
    })
}

struct BranchWalker<'a, 'r> {
    resolver: &'r StepResolver<'r>,
    stack: BranchStack<'a>,
    emitted: HashSet<StepEdgeId>,
    steps: Vec<ComputedStep>,
}

impl<'a> BranchWalker<'a, '_> {
    fn walk_root(&mut self, steps: &'a [DynamicStep]) -> Result<(), ComputeError> {
        let mut root = 0;
        for step in steps {
            match step {
                DynamicStep::Step(atomic) => {
                    root += 1;
                    self.emit(root, atomic)?;
                }
                DynamicStep::Series(series) => {
                    for atomic in &series.steps {
                        root += 1;
                        self.emit(root, atomic)?;
                    }
                }
                DynamicStep::Branch(branch) => {
                    // same rule as the legacy scheme: nothing to emit, no root index
                    if flatten(step).is_empty() {
                        continue;
                    }
                    root += 1;
                    self.walk_branch(root, branch)?;
                }
            }
        }
        Ok(())
    }

    fn walk_branch(&mut self, root: usize, branch: &'a BranchCollection) -> Result<(), ComputeError> {
        for (idx, path) in branch.paths.iter().enumerate() {
            self.stack.push(BranchStackEntry::new(branch, path, idx + 1));
            let walked = self.walk_path(root, &path.steps);
            self.stack.pop();
            walked?;
        }
        Ok(())
    }

    fn walk_path(&mut self, root: usize, entries: &'a [DynamicStep]) -> Result<(), ComputeError> {
        for entry in entries {
            match entry {
                DynamicStep::Step(atomic) => self.emit(root, atomic)?,
                DynamicStep::Series(series) => {
                    for atomic in &series.steps {
                        self.emit(root, atomic)?;
                    }
                }
                DynamicStep::Branch(branch) => {
                    if !flatten(entry).is_empty() {
                        self.walk_branch(root, branch)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn emit(&mut self, root: usize, step: &AtomicStep) -> Result<(), ComputeError> {
        let (id, position) = self.next_id(root);
        let mut trail = self.stack.build_trail();
        if let Some(innermost) = trail.as_mut().and_then(|levels| levels.last_mut()) {
            innermost.index_within_path = position;
        }
        let computed = self.resolver.resolve(step, id.clone(), trail)?;
        if !self.stack.is_empty() {
            self.stack.register_step(&id);
            self.stack.increment_step_counters();
        }
        self.steps.push(computed);
        Ok(())
    }

    // Sibling branch collections inside one path restart their inner
    // counters, so positions can repeat; advance the last segment until free.
    // Returns the id with the position its last segment ended up on.
    fn next_id(&mut self, root: usize) -> (StepEdgeId, usize) {
        let entries = self.stack.entries();
        let mut position = entries.last().map_or(0, |entry| entry.step_counter) + 1;
        let mut id = build_step_id_at(root, entries, position);
        while self.emitted.contains(&id) {
            let taken = id;
            position += 1;
            id = build_step_id_at(root, entries, position);
            debug!(%taken, replacement = %id, "step id already emitted; advancing");
        }
        self.emitted.insert(id.clone());
        (id, position)
    }
}
