//! Mapping of analyzer results into the simplified error list.
//!
//! Downstream consumers do not want analyzer internals; they get a flat
//! list of status codes with the 1-based indices of the incriminated
//! sub-shapes in the result's stable numbering.

use serde::{Deserialize, Serialize};

use gfuse_check::{Analyzer, CheckStatus};
use gfuse_primitives::Brep;
use gfuse_topo::{IndexMap, ShapeRef};

/// One defect: a status code and the sub-shapes it incriminates.
///
/// Indices are 1-based positions in the result shape's sub-shape numbering
/// (see [`IndexMap`]); a contextual defect incriminates both the failing
/// sub-shape and the parent it fails within.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeError {
    /// The status code.
    pub status: CheckStatus,
    /// 1-based sub-shape indices, in discovery order, without duplicates.
    pub incriminated: Vec<usize>,
}

fn add(errors: &mut Vec<ShapeError>, status: CheckStatus, index: usize) {
    match errors.iter_mut().find(|e| e.status == status) {
        Some(error) => {
            if !error.incriminated.contains(&index) {
                error.incriminated.push(index);
            }
        }
        None => errors.push(ShapeError {
            status,
            incriminated: vec![index],
        }),
    }
}

/// Collect the analyzer's findings into [`ShapeError`] records.
///
/// Walks the result's sub-shapes in stable numbering order so the output
/// is deterministic for a given shape.
pub fn collect_errors(analyzer: &Analyzer, brep: &Brep) -> Vec<ShapeError> {
    let index = IndexMap::new(&brep.topology, brep.root);
    let mut errors = Vec::new();
    for (i, shape) in index.iter() {
        let Some(result) = analyzer.result(shape) else {
            continue;
        };
        for &status in &result.statuses {
            add(&mut errors, status, i);
        }
        for (parent, statuses) in &result.contextual {
            let parent_index = index.find_index(*parent);
            for &status in statuses {
                add(&mut errors, status, i);
                if let Some(pi) = parent_index {
                    add(&mut errors, status, pi);
                }
            }
        }
    }
    errors
}

/// The flat list of faulty sub-shapes, in discovery order.
///
/// Contains every sub-shape with a recorded status plus the context parents
/// those statuses were recorded against.
pub fn collect_failures(analyzer: &Analyzer, brep: &Brep) -> Vec<ShapeRef> {
    let index = IndexMap::new(&brep.topology, brep.root);
    let mut failures = Vec::new();
    let mut push = |shape: ShapeRef, failures: &mut Vec<ShapeRef>| {
        if !failures.contains(&shape) {
            failures.push(shape);
        }
    };
    for (_, shape) in index.iter() {
        let Some(result) = analyzer.result(shape) else {
            continue;
        };
        if result.is_clean() {
            continue;
        }
        push(shape, &mut failures);
        for (parent, statuses) in &result.contextual {
            if !statuses.is_empty() {
                push(*parent, &mut failures);
            }
        }
    }
    failures
}
