//! Splitting of planar faces along section curves.
//!
//! The cut is carried in parameter space: the section is extended to a full
//! chord of the face, boundary edges it crosses are split globally (every
//! wire referencing them is updated, so neighbouring faces stay consistent),
//! and the face is replaced by two sub-faces joined along a new cut edge.

use gfuse_geom::{Curve3, CurveKind, Line2, Line3, Surface, SurfaceKind};
use gfuse_math::{Point2, Vec2};
use gfuse_primitives::Brep;
use gfuse_topo::{EdgeId, FaceId, Orientation, Pcurve, VertexId, WireId};

use crate::ssi::SectionCurve;
use crate::trim::Section;

/// Distance from the cut line below which a corner counts as lying on it.
const SIDE_EPS: f64 = 1e-9;

/// Split a planar face along a section curve, returning the resulting
/// faces (the face itself when no split applies).
///
/// Splits are conservative: anything outside the supported configuration
/// (planar face, straight boundary edges, a straight cut crossing exactly
/// two of them away from their ends) leaves the face untouched.
pub fn split_planar_face(brep: &mut Brep, face: FaceId, section: &Section) -> Vec<FaceId> {
    let no_split = vec![face];
    if !brep.topology.faces.contains_key(face) {
        return Vec::new();
    }
    if brep.surface_of(face).kind() != SurfaceKind::Plane {
        return no_split;
    }
    if !brep.topology.faces[face].holes.is_empty() {
        return no_split;
    }
    let SectionCurve::Line(_) = section.curve else {
        // Circular imprints on planar faces are not carved.
        return no_split;
    };

    let outer = brep.topology.faces[face].outer;
    let uses: Vec<(EdgeId, Orientation)> = brep.topology.wires[outer].edges.clone();
    if uses.len() < 3 {
        return no_split;
    }
    for &(edge, _) in &uses {
        match brep.curve3_of(edge) {
            Some(curve) if curve.kind() == CurveKind::Line => {}
            _ => return no_split,
        }
    }

    // Cut line in parameter space.
    let surface = brep.surface_of(face);
    let p0 = surface.project(&section.start());
    let p1 = surface.project(&section.end());
    let dir = p1 - p0;
    if dir.norm() < 1e-9 {
        return no_split;
    }
    let cut_normal = Vec2::new(-dir.y, dir.x).normalize();
    let side_of = |uv: &Point2| cut_normal.dot(&(uv - p0));

    // Corners in traversal order.
    let corners: Vec<Point2> = uses
        .iter()
        .map(|&(edge, orientation)| {
            let (start, _) = brep.topology.edge_endpoints(edge, orientation);
            brep.surface_of(face)
                .project(&brep.topology.vertices[start].point)
        })
        .collect();
    let sides: Vec<f64> = corners.iter().map(|c| side_of(c)).collect();
    if sides.iter().any(|s| s.abs() <= SIDE_EPS) {
        // A corner sits on the cut line; leave the face as it is.
        return no_split;
    }

    // Locate the boundary crossings.
    let n = uses.len();
    let mut crossings = Vec::new();
    for i in 0..n {
        let a = sides[i];
        let b = sides[(i + 1) % n];
        if (a > 0.0) != (b > 0.0) {
            crossings.push((i, a / (a - b)));
        }
    }
    if crossings.len() != 2 {
        return no_split;
    }
    let (edge_a, edge_b) = (uses[crossings[0].0].0, uses[crossings[1].0].0);
    if edge_a == edge_b {
        return no_split;
    }

    // Split the two crossed edges globally.
    for &(index, fraction) in &crossings {
        let (edge, orientation) = uses[index];
        let (t0, t1) = brep.topology.edges[edge].range;
        let t = match orientation {
            Orientation::Forward => t0 + fraction * (t1 - t0),
            Orientation::Reversed => t1 - fraction * (t1 - t0),
        };
        if split_edge(brep, edge, t).is_none() {
            return no_split;
        }
    }

    // Re-read the wire (edge uses were replaced in place) and classify each
    // use by the side its midpoint falls on.
    let uses: Vec<(EdgeId, Orientation)> = brep.topology.wires[outer].edges.clone();
    let mut positive = Vec::new();
    for &(edge, _) in &uses {
        let (t0, t1) = brep.topology.edges[edge].range;
        let mid = brep.edge_point(edge, 0.5 * (t0 + t1));
        positive.push(side_of(&brep.surface_of(face).project(&mid)) > 0.0);
    }

    let Some((run_a, run_b)) = cyclic_runs(&positive) else {
        return no_split;
    };
    let chain_a: Vec<(EdgeId, Orientation)> = run_a.iter().map(|&i| uses[i]).collect();
    let chain_b: Vec<(EdgeId, Orientation)> = run_b.iter().map(|&i| uses[i]).collect();

    let a_start = chain_start(brep, &chain_a);
    let a_end = chain_end(brep, &chain_a);
    let b_start = chain_start(brep, &chain_b);
    let b_end = chain_end(brep, &chain_b);
    if a_end != b_start || b_end != a_start {
        return no_split;
    }

    // The cut edge runs from the end of chain A back to its start.
    let pa = brep.topology.vertices[a_end].point;
    let pb = brep.topology.vertices[a_start].point;
    let cut_edge = brep.topology.add_edge(a_end, a_start);
    let curve = brep
        .geometry
        .add_curve3(Box::new(Line3::from_points(pa, pb)));
    brep.topology.edges[cut_edge].curve3 = Some(curve);

    let surface_index = brep.topology.faces[face].surface;
    let orientation = brep.topology.faces[face].orientation;
    let tolerance = brep.topology.faces[face].tolerance;

    let mut wire_a_edges = chain_a;
    wire_a_edges.push((cut_edge, Orientation::Forward));
    let wire_a = brep.topology.add_wire(wire_a_edges, true);
    let mut wire_b_edges = chain_b;
    wire_b_edges.push((cut_edge, Orientation::Reversed));
    let wire_b = brep.topology.add_wire(wire_b_edges, true);

    let face_a = brep.topology.add_face(wire_a, surface_index);
    let face_b = brep.topology.add_face(wire_b, surface_index);
    for f in [face_a, face_b] {
        brep.topology.faces[f].orientation = orientation;
        brep.topology.faces[f].tolerance = tolerance;
        adopt_pcurves(brep, face, f);
    }

    // The cut edge's parameter image on both sub-faces.
    let uv_a = brep.surface_of(face_a).project(&pa);
    let uv_b = brep.surface_of(face_a).project(&pb);
    let curve2 = brep
        .geometry
        .add_curve2(Box::new(Line2::from_points(uv_a, uv_b)));
    for f in [face_a, face_b] {
        brep.topology.edges[cut_edge].pcurves.push(Pcurve {
            face: f,
            curve2d: curve2,
        });
    }

    replace_face_in_shells(brep, face, &[face_a, face_b]);
    brep.topology.faces.remove(face);
    brep.topology.wires.remove(outer);

    vec![face_a, face_b]
}

/// Split an edge at curve parameter `t`, replacing it in every wire.
///
/// Returns the two children and the new vertex, or `None` when `t` is too
/// close to the edge ends or the edge has no curve to evaluate.
pub fn split_edge(brep: &mut Brep, edge: EdgeId, t: f64) -> Option<(EdgeId, EdgeId, VertexId)> {
    let (t0, t1) = brep.topology.edges[edge].range;
    let margin = (t1 - t0).abs() * 1e-9;
    if t <= t0 + margin || t >= t1 - margin {
        return None;
    }
    let point = brep.curve3_of(edge)?.eval(t);

    let (start, end, curve3, pcurves, tolerance) = {
        let e = &brep.topology.edges[edge];
        (e.start, e.end, e.curve3, e.pcurves.clone(), e.tolerance)
    };
    let vertex = brep.topology.add_vertex(point);
    let first = brep.topology.add_edge(start, vertex);
    {
        let e = &mut brep.topology.edges[first];
        e.curve3 = curve3;
        e.range = (t0, t);
        e.pcurves = pcurves.clone();
        e.tolerance = tolerance;
    }
    let second = brep.topology.add_edge(vertex, end);
    {
        let e = &mut brep.topology.edges[second];
        e.curve3 = curve3;
        e.range = (t, t1);
        e.pcurves = pcurves;
        e.tolerance = tolerance;
    }

    let wire_ids: Vec<WireId> = brep.topology.wires.keys().collect();
    for wire in wire_ids {
        let edges = &mut brep.topology.wires[wire].edges;
        let mut replaced = Vec::with_capacity(edges.len() + 1);
        for &(e, orientation) in edges.iter() {
            if e == edge {
                match orientation {
                    Orientation::Forward => {
                        replaced.push((first, Orientation::Forward));
                        replaced.push((second, Orientation::Forward));
                    }
                    Orientation::Reversed => {
                        replaced.push((second, Orientation::Reversed));
                        replaced.push((first, Orientation::Reversed));
                    }
                }
            } else {
                replaced.push((e, orientation));
            }
        }
        *edges = replaced;
    }
    brep.topology.edges.remove(edge);
    Some((first, second, vertex))
}

/// Split a boolean mask into its two contiguous cyclic runs.
fn cyclic_runs(mask: &[bool]) -> Option<(Vec<usize>, Vec<usize>)> {
    let n = mask.len();
    let start = (0..n).find(|&i| mask[i] && !mask[(i + n - 1) % n])?;
    let mut run_true = Vec::new();
    let mut i = start;
    while mask[i] {
        run_true.push(i);
        i = (i + 1) % n;
        if run_true.len() > n {
            return None;
        }
    }
    let mut run_false = Vec::new();
    while !mask[i] {
        run_false.push(i);
        i = (i + 1) % n;
        if run_false.len() > n {
            return None;
        }
    }
    if run_true.len() + run_false.len() == n {
        Some((run_true, run_false))
    } else {
        None
    }
}

fn chain_start(brep: &Brep, chain: &[(EdgeId, Orientation)]) -> VertexId {
    let &(edge, orientation) = &chain[0];
    brep.topology.edge_endpoints(edge, orientation).0
}

fn chain_end(brep: &Brep, chain: &[(EdgeId, Orientation)]) -> VertexId {
    let &(edge, orientation) = &chain[chain.len() - 1];
    brep.topology.edge_endpoints(edge, orientation).1
}

/// Give every boundary edge of `new_face` a p-curve on it, reusing the
/// images it carried on the face being replaced.
fn adopt_pcurves(brep: &mut Brep, old_face: FaceId, new_face: FaceId) {
    let edge_ids: Vec<EdgeId> = brep
        .topology
        .face_edges(new_face)
        .into_iter()
        .map(|(e, _)| e)
        .collect();
    for edge in edge_ids {
        let inherited: Vec<usize> = brep.topology.edges[edge]
            .pcurves
            .iter()
            .filter(|p| p.face == old_face)
            .map(|p| p.curve2d)
            .collect();
        for curve2d in inherited {
            let already = brep.topology.edges[edge]
                .pcurves
                .iter()
                .any(|p| p.face == new_face && p.curve2d == curve2d);
            if !already {
                brep.topology.edges[edge].pcurves.push(Pcurve {
                    face: new_face,
                    curve2d,
                });
            }
        }
    }
}

fn replace_face_in_shells(brep: &mut Brep, old_face: FaceId, new_faces: &[FaceId]) {
    let shell_ids: Vec<_> = brep.topology.shells.keys().collect();
    for shell in shell_ids {
        let faces = &mut brep.topology.shells[shell].faces;
        let mut replaced = Vec::with_capacity(faces.len() + 1);
        for &(f, orientation) in faces.iter() {
            if f == old_face {
                replaced.extend(new_faces.iter().map(|&nf| (nf, orientation)));
            } else {
                replaced.push((f, orientation));
            }
        }
        *faces = replaced;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::face_aabb;
    use gfuse_primitives::make_box;
    use gfuse_math::{Point3, Vec3};

    fn bottom_face(brep: &Brep) -> FaceId {
        brep.faces()
            .into_iter()
            .find(|&f| face_aabb(brep, f).max.z < 1e-9)
            .unwrap()
    }

    fn cut_through_bottom(x: f64) -> Section {
        Section {
            curve: SectionCurve::Line(Line3::through(Point3::new(x, -5.0, 0.0), Vec3::y())),
            t0: 4.0,
            t1: 8.0,
        }
    }

    #[test]
    fn test_split_bottom_face_in_two() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let face = bottom_face(&brep);
        let result = split_planar_face(&mut brep, face, &cut_through_bottom(1.0));
        assert_eq!(result.len(), 2);
        assert!(!brep.topology.faces.contains_key(face));
        // 6 original faces -> 7, and the solid shell now lists 7 faces.
        assert_eq!(brep.faces().len(), 7);
        for f in result {
            assert!(brep.topology.wire_is_connected(brep.topology.faces[f].outer));
        }
    }

    #[test]
    fn test_split_keeps_edge_sharing_consistent() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let face = bottom_face(&brep);
        split_planar_face(&mut brep, face, &cut_through_bottom(1.0));
        // Every edge of the solid must still be used exactly twice.
        let mut uses: std::collections::HashMap<EdgeId, usize> = std::collections::HashMap::new();
        for f in brep.faces() {
            for (e, _) in brep.topology.face_edges(f) {
                *uses.entry(e).or_insert(0) += 1;
            }
        }
        assert!(uses.values().all(|&n| n == 2), "unbalanced edge uses");
    }

    #[test]
    fn test_cut_outside_face_is_ignored() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let face = bottom_face(&brep);
        let result = split_planar_face(&mut brep, face, &cut_through_bottom(5.0));
        assert_eq!(result, vec![face]);
        assert_eq!(brep.faces().len(), 6);
    }

    #[test]
    fn test_cut_through_corner_is_ignored() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let face = bottom_face(&brep);
        // Passes exactly through the corner vertices at x = 0.
        let result = split_planar_face(&mut brep, face, &cut_through_bottom(0.0));
        assert_eq!(result, vec![face]);
    }

    #[test]
    fn test_split_twice() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let face = bottom_face(&brep);
        let mut current = split_planar_face(&mut brep, face, &cut_through_bottom(1.0));
        let second = Section {
            curve: SectionCurve::Line(Line3::through(Point3::new(-5.0, 1.0, 0.0), Vec3::x())),
            t0: 4.0,
            t1: 8.0,
        };
        let mut next = Vec::new();
        for f in current.drain(..) {
            next.extend(split_planar_face(&mut brep, f, &second));
        }
        // The first sub-face splits cleanly. Splitting it divides the shared
        // cut edge, which puts a corner of the sibling exactly on the second
        // cut line, so the sibling is conservatively left alone.
        assert_eq!(next.len(), 3);
        assert_eq!(brep.faces().len(), 8);
        let mut uses: std::collections::HashMap<EdgeId, usize> = std::collections::HashMap::new();
        for f in brep.faces() {
            for (e, _) in brep.topology.face_edges(f) {
                *uses.entry(e).or_insert(0) += 1;
            }
        }
        assert!(uses.values().all(|&n| n == 2), "unbalanced edge uses");
    }

    #[test]
    fn test_split_edge_children_cover_range() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let edge = brep.edges()[0];
        let (first, second, vertex) = split_edge(&mut brep, edge, 0.25).unwrap();
        assert_eq!(brep.topology.edges[first].range, (0.0, 0.25));
        assert_eq!(brep.topology.edges[second].range, (0.25, 1.0));
        assert_eq!(brep.topology.edges[first].end, vertex);
        assert_eq!(brep.topology.edges[second].start, vertex);
        assert!(!brep.topology.edges.contains_key(edge));
    }
}
