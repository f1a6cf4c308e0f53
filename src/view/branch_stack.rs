use std::collections::HashMap;

use crate::ir::{BranchCollection, BranchPath};

use super::types::{BranchTrailEntry, ComputedBranchCollection, ComputedBranchPath, StepEdgeId};

/// One open branch level during the walk.
#[derive(Debug, Clone)]
pub struct BranchStackEntry<'a> {
    pub branch: &'a BranchCollection,
    pub path: &'a BranchPath,
    /// 1-based position of `path` in its collection.
    pub path_index: usize,
    /// Steps emitted so far inside this path, nested levels included.
    pub step_counter: usize,
}

impl<'a> BranchStackEntry<'a> {
    pub fn new(branch: &'a BranchCollection, path: &'a BranchPath, path_index: usize) -> Self {
        Self {
            branch,
            path,
            path_index,
            step_counter: 0,
        }
    }

    fn is_default_path(&self) -> bool {
        self.branch.default_path_id.as_deref() == Some(self.path.path_id.as_str())
    }
}

#[derive(Debug)]
struct PathAccumulator<'a> {
    path: &'a BranchPath,
    path_index: usize,
    edge_ids: Vec<StepEdgeId>,
}

#[derive(Debug)]
struct BranchAccumulator<'a> {
    branch: &'a BranchCollection,
    paths: Vec<PathAccumulator<'a>>,
    path_lookup: HashMap<&'a str, usize>,
}

impl<'a> BranchAccumulator<'a> {
    fn new(branch: &'a BranchCollection) -> Self {
        Self {
            branch,
            paths: Vec::new(),
            path_lookup: HashMap::new(),
        }
    }

    fn register_path(&mut self, path: &'a BranchPath, path_index: usize) -> usize {
        if let Some(idx) = self.path_lookup.get(path.path_id.as_str()) {
            return *idx;
        }
        let idx = self.paths.len();
        self.paths.push(PathAccumulator {
            path,
            path_index,
            edge_ids: Vec::new(),
        });
        self.path_lookup.insert(path.path_id.as_str(), idx);
        idx
    }

    fn finalize(&self) -> ComputedBranchCollection {
        let mut paths: Vec<ComputedBranchPath> = self
            .paths
            .iter()
            .map(|acc| ComputedBranchPath {
                path_id: acc.path.path_id.clone(),
                path_index: acc.path_index,
                is_default_path: self.branch.default_path_id.as_deref()
                    == Some(acc.path.path_id.as_str()),
                path_name: acc.path.path_name.clone(),
                path_title: acc.path.path_title.clone(),
                description: acc.path.description.clone(),
                tags: acc.path.tags.clone(),
                edge_ids: acc.edge_ids.clone(),
            })
            .collect();
        paths.sort_by_key(|path| path.path_index);
        ComputedBranchCollection {
            branch_id: self.branch.branch_id.clone(),
            kind: self.branch.kind,
            label: self.branch.label.clone(),
            default_path_id: self.branch.default_path_id.clone(),
            paths,
        }
    }
}

/// Tracks open branch levels during a depth-first walk and collects, per
/// branch path, the ids of every step emitted inside it.
#[derive(Debug, Default)]
pub struct BranchStack<'a> {
    stack: Vec<BranchStackEntry<'a>>,
    // (accumulator slot, path slot) for each open level, parallel to `stack`
    slots: Vec<(usize, usize)>,
    branches: Vec<BranchAccumulator<'a>>,
    branch_lookup: HashMap<&'a str, usize>,
}

impl<'a> BranchStack<'a> {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            slots: Vec::new(),
            branches: Vec::new(),
            branch_lookup: HashMap::new(),
        }
    }

    pub fn entries(&self) -> &[BranchStackEntry<'a>] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn push(&mut self, entry: BranchStackEntry<'a>) {
        let branch_slot = match self.branch_lookup.get(entry.branch.branch_id.as_str()) {
            Some(slot) => *slot,
            None => {
                let slot = self.branches.len();
                self.branches.push(BranchAccumulator::new(entry.branch));
                self.branch_lookup
                    .insert(entry.branch.branch_id.as_str(), slot);
                slot
            }
        };
        let path_slot = self.branches[branch_slot].register_path(entry.path, entry.path_index);
        self.slots.push((branch_slot, path_slot));
        self.stack.push(entry);
    }

    /// Closes the innermost level. Collected ids are kept.
    pub fn pop(&mut self) -> Option<BranchStackEntry<'a>> {
        self.slots.pop();
        self.stack.pop()
    }

    /// Records `id` on every open path.
    pub fn register_step(&mut self, id: &StepEdgeId) {
        for (branch_slot, path_slot) in &self.slots {
            self.branches[*branch_slot].paths[*path_slot]
                .edge_ids
                .push(id.clone());
        }
    }

    pub fn increment_step_counters(&mut self) {
        for entry in &mut self.stack {
            entry.step_counter += 1;
        }
    }

    /// Trail for a step emitted at the current position, outermost level
    /// first. `None` outside of any branch.
    pub fn build_trail(&self) -> Option<Vec<BranchTrailEntry>> {
        if self.stack.is_empty() {
            return None;
        }
        let trail = self
            .stack
            .iter()
            .map(|entry| BranchTrailEntry {
                branch_id: entry.branch.branch_id.clone(),
                path_id: entry.path.path_id.clone(),
                kind: entry.branch.kind,
                path_index: entry.path_index,
                index_within_path: entry.step_counter + 1,
                path_name: entry.path.path_name.clone(),
                path_title: entry.path.path_title.clone(),
                is_default_path: entry.is_default_path(),
            })
            .collect();
        Some(trail)
    }

    /// Snapshot of every branch collection seen, paths ordered by index.
    /// Returns `None` while a level is still open.
    pub fn finalize(&self) -> Option<Vec<ComputedBranchCollection>> {
        if !self.stack.is_empty() {
            return None;
        }
        Some(self.branches.iter().map(BranchAccumulator::finalize).collect())
    }
}
