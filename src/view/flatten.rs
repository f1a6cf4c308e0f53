use crate::ir::{AtomicStep, DynamicStep, LegacyParallelEntry};

/// Normalizes any step node into the ordered atomic steps it stands for.
pub fn flatten(step: &DynamicStep) -> Vec<&AtomicStep> {
    let mut out = Vec::new();
    flatten_into(step, &mut out);
    out
}

pub fn flatten_all(steps: &[DynamicStep]) -> Vec<&AtomicStep> {
    let mut out = Vec::new();
    for step in steps {
        flatten_into(step, &mut out);
    }
    out
}

fn flatten_into<'a>(step: &'a DynamicStep, out: &mut Vec<&'a AtomicStep>) {
    match step {
        DynamicStep::Branch(branch) => {
            if let Some(shadow) = branch.legacy_entries() {
                flatten_legacy_parallel(shadow, out);
                return;
            }
            for path in &branch.paths {
                for entry in &path.steps {
                    flatten_into(entry, out);
                }
            }
        }
        DynamicStep::Series(series) => out.extend(series.steps.iter()),
        DynamicStep::Step(step) => out.push(step),
    }
}

/// Heads of every lane first, then every lane's continuation, both in lane
/// order.
fn flatten_legacy_parallel<'a>(shadow: &'a [LegacyParallelEntry], out: &mut Vec<&'a AtomicStep>) {
    for entry in shadow {
        match entry {
            LegacyParallelEntry::Step(step) => out.push(step),
            LegacyParallelEntry::Series(series) => out.extend(series.steps.first()),
        }
    }
    for entry in shadow {
        if let LegacyParallelEntry::Series(series) = entry {
            out.extend(series.steps.iter().skip(1));
        }
    }
}
