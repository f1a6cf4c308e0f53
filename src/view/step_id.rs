use super::branch_stack::BranchStackEntry;
use super::types::StepEdgeId;

const PARALLEL_SEPARATOR: char = '.';
const ALTERNATE_SEPARATOR: char = ':';

// Segments are zero-padded to two digits; wider values are written as-is
// (`step-01`, `step-01.02.03`, `step-100`).
fn push_segment(out: &mut String, value: usize) {
    out.push_str(&format!("{value:02}"));
}

fn format_segments(root: usize, nested: &[usize]) -> StepEdgeId {
    let mut out = String::with_capacity(StepEdgeId::PREFIX.len() + 3 * (nested.len() + 1));
    out.push_str(StepEdgeId::PREFIX);
    push_segment(&mut out, root);
    for segment in nested {
        out.push(PARALLEL_SEPARATOR);
        push_segment(&mut out, *segment);
    }
    StepEdgeId::from_formatted(out)
}

/// Root-level id: `step-<root>`.
pub fn step_edge_id(root_index: usize) -> StepEdgeId {
    format_segments(root_index, &[])
}

/// Historical two-level form `step-<root>.<nested>`.
pub fn build_legacy_parallel_step_id(root_index: usize, nested_index: usize) -> StepEdgeId {
    format_segments(root_index, &[nested_index])
}

/// Hierarchical id for a step at `root_index` inside the given branch stack.
///
/// One segment per open level (its path index), then the innermost level's
/// 1-based position within its path.
pub fn build_step_id(root_index: usize, branch_stack: &[BranchStackEntry<'_>]) -> StepEdgeId {
    let Some(innermost) = branch_stack.last() else {
        return step_edge_id(root_index);
    };
    build_step_id_at(root_index, branch_stack, innermost.step_counter + 1)
}

/// Same as [`build_step_id`] with an explicit final segment.
pub(crate) fn build_step_id_at(
    root_index: usize,
    branch_stack: &[BranchStackEntry<'_>],
    position: usize,
) -> StepEdgeId {
    if branch_stack.is_empty() {
        return step_edge_id(root_index);
    }
    let mut nested: Vec<usize> = branch_stack.iter().map(|entry| entry.path_index).collect();
    nested.push(position);
    format_segments(root_index, &nested)
}

pub fn is_step_edge_id(value: &str) -> bool {
    StepEdgeId::parse(value).is_some()
}

fn block_prefix(block: usize, separator: char) -> String {
    let mut prefix = String::from(StepEdgeId::PREFIX);
    push_segment(&mut prefix, block);
    prefix.push(separator);
    prefix
}

/// True for ids of steps nested in the parallel block at root position
/// `block`. Pure prefix inspection; branch metadata is not consulted.
pub fn is_parallel_continuation_of(id: &str, block: usize) -> bool {
    id.starts_with(&block_prefix(block, PARALLEL_SEPARATOR))
}

/// True for ids of steps nested in the alternate block at root position
/// `block` (`step-<block>:...`).
pub fn is_alternate_continuation_of(id: &str, block: usize) -> bool {
    id.starts_with(&block_prefix(block, ALTERNATE_SEPARATOR))
}
