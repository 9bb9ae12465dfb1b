//! Deep copy of shapes between topologies.
//!
//! Copies allocate fresh ids in the destination arena. Geometry is carried
//! by index, so the caller is expected to append the source geometry store
//! to the destination store and pass the resulting index offsets.

use std::collections::HashMap;

use crate::{
    EdgeId, FaceId, Pcurve, ShapeRef, ShellId, SolidId, Topology, VertexId, WireId,
};

/// Index offsets applied to geometry references while copying.
///
/// When a source geometry store is appended to a destination store, every
/// copied surface/curve index is shifted by the destination's size before
/// the append.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOffsets {
    /// Offset added to surface indices.
    pub surfaces: usize,
    /// Offset added to 3D curve indices.
    pub curves3: usize,
    /// Offset added to 2D curve indices.
    pub curves2: usize,
}

impl StoreOffsets {
    /// No offsets (copy within the same geometry store).
    pub fn none() -> Self {
        Self::default()
    }
}

/// Copy `root` and everything under it from `src` into `dst`.
pub fn copy_shape(
    src: &Topology,
    root: ShapeRef,
    dst: &mut Topology,
    offsets: StoreOffsets,
) -> ShapeRef {
    copy_shape_with_map(src, root, dst, offsets).0
}

/// Copy `root` into `dst`, also returning the old→new correspondence map.
pub fn copy_shape_with_map(
    src: &Topology,
    root: ShapeRef,
    dst: &mut Topology,
    offsets: StoreOffsets,
) -> (ShapeRef, HashMap<ShapeRef, ShapeRef>) {
    let mut ctx = CopyContext {
        src,
        dst,
        offsets,
        map: HashMap::new(),
    };
    let copied = ctx.copy(root);
    ctx.attach_pcurves();
    let CopyContext { map, .. } = ctx;
    (copied, map)
}

struct CopyContext<'a> {
    src: &'a Topology,
    dst: &'a mut Topology,
    offsets: StoreOffsets,
    map: HashMap<ShapeRef, ShapeRef>,
}

impl CopyContext<'_> {
    fn copy(&mut self, shape: ShapeRef) -> ShapeRef {
        if let Some(&done) = self.map.get(&shape) {
            return done;
        }
        let copied = match shape {
            ShapeRef::Vertex(id) => ShapeRef::Vertex(self.copy_vertex(id)),
            ShapeRef::Edge(id) => ShapeRef::Edge(self.copy_edge(id)),
            ShapeRef::Wire(id) => ShapeRef::Wire(self.copy_wire(id)),
            ShapeRef::Face(id) => ShapeRef::Face(self.copy_face(id)),
            ShapeRef::Shell(id) => ShapeRef::Shell(self.copy_shell(id)),
            ShapeRef::Solid(id) => ShapeRef::Solid(self.copy_solid(id)),
            ShapeRef::Compound(id) => {
                let members = self.src.compounds[id].members.clone();
                let copied_members: Vec<_> = members.into_iter().map(|m| self.copy(m)).collect();
                ShapeRef::Compound(self.dst.add_compound(copied_members))
            }
        };
        self.map.insert(shape, copied);
        copied
    }

    fn copy_vertex(&mut self, id: VertexId) -> VertexId {
        if let Some(&ShapeRef::Vertex(done)) = self.map.get(&ShapeRef::Vertex(id)) {
            return done;
        }
        let copied = self.dst.vertices.insert(self.src.vertices[id].clone());
        self.map
            .insert(ShapeRef::Vertex(id), ShapeRef::Vertex(copied));
        copied
    }

    fn copy_edge(&mut self, id: EdgeId) -> EdgeId {
        if let Some(&ShapeRef::Edge(done)) = self.map.get(&ShapeRef::Edge(id)) {
            return done;
        }
        let (start, end, curve3, range, tolerance) = {
            let e = &self.src.edges[id];
            (e.start, e.end, e.curve3, e.range, e.tolerance)
        };
        let new_start = self.copy_vertex(start);
        let new_end = self.copy_vertex(end);
        let copied = self.dst.add_edge(new_start, new_end);
        {
            let e = &mut self.dst.edges[copied];
            e.curve3 = curve3.map(|i| i + self.offsets.curves3);
            e.range = range;
            e.tolerance = tolerance;
        }
        self.map.insert(ShapeRef::Edge(id), ShapeRef::Edge(copied));
        copied
    }

    fn copy_wire(&mut self, id: WireId) -> WireId {
        if let Some(&ShapeRef::Wire(done)) = self.map.get(&ShapeRef::Wire(id)) {
            return done;
        }
        let (edges, closed) = {
            let w = &self.src.wires[id];
            (w.edges.clone(), w.closed)
        };
        let copied_edges: Vec<_> = edges
            .into_iter()
            .map(|(e, orientation)| (self.copy_edge(e), orientation))
            .collect();
        let copied = self.dst.add_wire(copied_edges, closed);
        self.map.insert(ShapeRef::Wire(id), ShapeRef::Wire(copied));
        copied
    }

    fn copy_face(&mut self, id: FaceId) -> FaceId {
        if let Some(&ShapeRef::Face(done)) = self.map.get(&ShapeRef::Face(id)) {
            return done;
        }
        let (outer, holes, surface, orientation, tolerance) = {
            let f = &self.src.faces[id];
            (f.outer, f.holes.clone(), f.surface, f.orientation, f.tolerance)
        };
        let new_outer = self.copy_wire(outer);
        let new_holes: Vec<_> = holes.into_iter().map(|h| self.copy_wire(h)).collect();
        let copied = self.dst.add_face(new_outer, surface + self.offsets.surfaces);
        {
            let f = &mut self.dst.faces[copied];
            f.holes = new_holes;
            f.orientation = orientation;
            f.tolerance = tolerance;
        }
        self.map.insert(ShapeRef::Face(id), ShapeRef::Face(copied));
        copied
    }

    fn copy_shell(&mut self, id: ShellId) -> ShellId {
        if let Some(&ShapeRef::Shell(done)) = self.map.get(&ShapeRef::Shell(id)) {
            return done;
        }
        let (faces, closed) = {
            let s = &self.src.shells[id];
            (s.faces.clone(), s.closed)
        };
        let copied_faces: Vec<_> = faces
            .into_iter()
            .map(|(f, orientation)| (self.copy_face(f), orientation))
            .collect();
        let copied = self.dst.add_shell(copied_faces, closed);
        self.map
            .insert(ShapeRef::Shell(id), ShapeRef::Shell(copied));
        copied
    }

    fn copy_solid(&mut self, id: SolidId) -> SolidId {
        if let Some(&ShapeRef::Solid(done)) = self.map.get(&ShapeRef::Solid(id)) {
            return done;
        }
        let (outer, voids) = {
            let s = &self.src.solids[id];
            (s.outer, s.voids.clone())
        };
        let new_outer = self.copy_shell(outer);
        let new_voids: Vec<_> = voids.into_iter().map(|v| self.copy_shell(v)).collect();
        let copied = self.dst.add_solid(new_outer);
        self.dst.solids[copied].voids = new_voids;
        self.map
            .insert(ShapeRef::Solid(id), ShapeRef::Solid(copied));
        copied
    }

    /// Second pass: p-curves reference faces, which may be copied after the
    /// edges that carry them. P-curves whose face was not part of the copied
    /// shape are dropped.
    fn attach_pcurves(&mut self) {
        let edge_pairs: Vec<(EdgeId, EdgeId)> = self
            .map
            .iter()
            .filter_map(|(&old, &new)| match (old, new) {
                (ShapeRef::Edge(o), ShapeRef::Edge(n)) => Some((o, n)),
                _ => None,
            })
            .collect();
        for (old, new) in edge_pairs {
            let mut pcurves = Vec::new();
            for pc in &self.src.edges[old].pcurves {
                if let Some(&ShapeRef::Face(face)) = self.map.get(&ShapeRef::Face(pc.face)) {
                    pcurves.push(Pcurve {
                        face,
                        curve2d: pc.curve2d + self.offsets.curves2,
                    });
                }
            }
            self.dst.edges[new].pcurves = pcurves;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Orientation, ShapeKind};
    use crate::explore::Explorer;
    use gfuse_math::Point3;

    fn square_face(topo: &mut Topology) -> FaceId {
        let a = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = topo.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = topo.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let d = topo.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let edges = [
            topo.add_edge(a, b),
            topo.add_edge(b, c),
            topo.add_edge(c, d),
            topo.add_edge(d, a),
        ];
        let wire = topo.add_wire(
            edges.iter().map(|&e| (e, Orientation::Forward)).collect(),
            true,
        );
        let face = topo.add_face(wire, 3);
        for &e in &edges {
            topo.edges[e].pcurves.push(Pcurve { face, curve2d: 7 });
        }
        face
    }

    #[test]
    fn test_copy_preserves_counts() {
        let mut src = Topology::new();
        let face = square_face(&mut src);
        let mut dst = Topology::new();
        let copied = copy_shape(&src, ShapeRef::Face(face), &mut dst, StoreOffsets::none());
        assert_eq!(dst.vertices.len(), 4);
        assert_eq!(dst.edges.len(), 4);
        assert_eq!(dst.faces.len(), 1);
        assert_eq!(Explorer::new(&dst, copied, ShapeKind::Edge).count(), 4);
    }

    #[test]
    fn test_copy_applies_offsets() {
        let mut src = Topology::new();
        let face = square_face(&mut src);
        let mut dst = Topology::new();
        let offsets = StoreOffsets {
            surfaces: 10,
            curves3: 0,
            curves2: 20,
        };
        let copied = copy_shape(&src, ShapeRef::Face(face), &mut dst, offsets);
        let ShapeRef::Face(new_face) = copied else {
            panic!("expected a face");
        };
        assert_eq!(dst.faces[new_face].surface, 13);
        for e in dst.edges.values() {
            assert_eq!(e.pcurves.len(), 1);
            assert_eq!(e.pcurves[0].curve2d, 27);
            assert_eq!(e.pcurves[0].face, new_face);
        }
    }

    #[test]
    fn test_copy_shares_common_subshapes() {
        let mut src = Topology::new();
        let a = src.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = src.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let ab = src.add_edge(a, b);
        let w1 = src.add_wire(vec![(ab, Orientation::Forward)], false);
        let w2 = src.add_wire(vec![(ab, Orientation::Reversed)], false);
        let compound = src.add_compound(vec![ShapeRef::Wire(w1), ShapeRef::Wire(w2)]);
        let mut dst = Topology::new();
        copy_shape(
            &src,
            ShapeRef::Compound(compound),
            &mut dst,
            StoreOffsets::none(),
        );
        // The shared edge is copied once, not duplicated.
        assert_eq!(dst.edges.len(), 1);
        assert_eq!(dst.vertices.len(), 2);
    }
}
