//! Sub-shape exploration and stable sub-shape indexing.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::{ShapeKind, ShapeRef, Topology};

/// Iterator over all unique sub-shapes of one kind reachable from a root.
///
/// Traversal is depth-first in child order; a sub-shape shared by several
/// parents is yielded only on its first visit. The root itself is yielded
/// when it matches the requested kind.
pub struct Explorer {
    found: std::vec::IntoIter<ShapeRef>,
}

impl Explorer {
    /// Collect the sub-shapes of `want` kind under `root`.
    pub fn new(topo: &Topology, root: ShapeRef, want: ShapeKind) -> Self {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        visit(topo, root, &mut seen, &mut |shape| {
            if shape.kind() == want {
                found.push(shape);
            }
        });
        Self {
            found: found.into_iter(),
        }
    }
}

impl Iterator for Explorer {
    type Item = ShapeRef;

    fn next(&mut self) -> Option<ShapeRef> {
        self.found.next()
    }
}

fn visit(
    topo: &Topology,
    shape: ShapeRef,
    seen: &mut HashSet<ShapeRef>,
    f: &mut impl FnMut(ShapeRef),
) {
    if !seen.insert(shape) {
        return;
    }
    f(shape);
    for child in topo.children(shape) {
        visit(topo, child, seen, f);
    }
}

/// Stable 1-based numbering of every unique sub-shape under a root.
///
/// Numbering follows depth-first discovery order (parents before their
/// children), so it is deterministic for a given shape. Error reports use
/// these indices to incriminate sub-shapes.
#[derive(Debug, Clone, Default)]
pub struct IndexMap {
    refs: Vec<ShapeRef>,
    index_of: HashMap<ShapeRef, usize>,
}

impl IndexMap {
    /// Number all sub-shapes under `root`.
    pub fn new(topo: &Topology, root: ShapeRef) -> Self {
        let mut seen = HashSet::new();
        let mut refs = Vec::new();
        visit(topo, root, &mut seen, &mut |shape| refs.push(shape));
        let index_of = refs
            .iter()
            .enumerate()
            .map(|(i, &shape)| (shape, i + 1))
            .collect();
        Self { refs, index_of }
    }

    /// Number of indexed sub-shapes.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Whether no sub-shape was indexed.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Sub-shape at a 1-based index.
    pub fn get(&self, index: usize) -> Option<ShapeRef> {
        if index == 0 {
            return None;
        }
        self.refs.get(index - 1).copied()
    }

    /// 1-based index of a sub-shape, if it is under the root.
    pub fn find_index(&self, shape: ShapeRef) -> Option<usize> {
        self.index_of.get(&shape).copied()
    }

    /// Iterate `(index, shape)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, ShapeRef)> + '_ {
        self.refs.iter().enumerate().map(|(i, &s)| (i + 1, s))
    }
}
