//! Same-domain detection: shapes that are geometrically coincident within
//! a tolerance, and orientation comparison of split shapes against their
//! originals.

use gfuse_geom::{Curve3, Surface};
use gfuse_math::{Point3, Vec3};
use gfuse_primitives::Brep;
use gfuse_topo::{EdgeId, FaceId, Orientation, ShapeRef};

use crate::find_chains;

/// Group candidate shapes into same-domain chains.
///
/// Candidates must be of one kind (vertices, edges, or faces); mixed kinds
/// never match each other. Every candidate appears in exactly one group;
/// shapes with no coincident partner form singleton groups.
pub fn find_sd_shapes(brep: &Brep, candidates: &[ShapeRef], tol: f64) -> Vec<Vec<ShapeRef>> {
    let mut couples = Vec::new();
    for i in 0..candidates.len() {
        // Self-couples keep isolated candidates in the result.
        couples.push((candidates[i], candidates[i]));
        for j in i + 1..candidates.len() {
            if same_domain(brep, candidates[i], candidates[j], tol) {
                couples.push((candidates[i], candidates[j]));
            }
        }
    }
    find_chains(&couples)
}

/// Re-group previously found chains under a tighter tolerance.
///
/// Chains built with a loose tolerance can lump in shapes that only almost
/// coincide; refining splits every group with the smaller `tol`.
pub fn refine_sd_groups(
    brep: &Brep,
    groups: Vec<Vec<ShapeRef>>,
    tol: f64,
) -> Vec<Vec<ShapeRef>> {
    let mut refined = Vec::new();
    for group in groups {
        if group.len() < 2 {
            refined.push(group);
            continue;
        }
        refined.extend(find_sd_shapes(brep, &group, tol));
    }
    refined
}

fn same_domain(brep: &Brep, a: ShapeRef, b: ShapeRef, tol: f64) -> bool {
    match (a, b) {
        (ShapeRef::Vertex(va), ShapeRef::Vertex(vb)) => {
            (brep.point_of(va) - brep.point_of(vb)).norm() < tol
        }
        (ShapeRef::Edge(ea), ShapeRef::Edge(eb)) => edges_same_domain(brep, ea, eb, tol),
        (ShapeRef::Face(fa), ShapeRef::Face(fb)) => faces_same_domain(brep, fa, fb, tol),
        _ => false,
    }
}

fn edge_samples(brep: &Brep, edge: EdgeId, n: usize) -> Vec<Point3> {
    let (t0, t1) = brep.topology.edges[edge].range;
    (0..=n)
        .map(|k| brep.edge_point(edge, t0 + (t1 - t0) * k as f64 / n as f64))
        .collect()
}

fn edges_same_domain(brep: &Brep, a: EdgeId, b: EdgeId, tol: f64) -> bool {
    let sa = edge_samples(brep, a, 4);
    let sb = edge_samples(brep, b, 4);
    let forward = sa
        .iter()
        .zip(sb.iter())
        .all(|(p, q)| (p - q).norm() < tol);
    let backward = sa
        .iter()
        .zip(sb.iter().rev())
        .all(|(p, q)| (p - q).norm() < tol);
    forward || backward
}

fn faces_same_domain(brep: &Brep, a: FaceId, b: FaceId, tol: f64) -> bool {
    if brep.surface_of(a).kind() != brep.surface_of(b).kind() {
        return false;
    }
    on_surface_of(brep, a, b, tol) && on_surface_of(brep, b, a, tol)
}

/// All boundary-edge midpoints of `a` lie on the surface of `b`.
fn on_surface_of(brep: &Brep, a: FaceId, b: FaceId, tol: f64) -> bool {
    let surface = brep.surface_of(b);
    let mut checked = false;
    for (edge, _) in brep.topology.face_edges(a) {
        let (t0, t1) = brep.topology.edges[edge].range;
        let p = brep.edge_point(edge, 0.5 * (t0 + t1));
        let uv = surface.project(&p);
        if (surface.eval(uv) - p).norm() >= tol {
            return false;
        }
        checked = true;
    }
    checked
}

/// Whether a split shape ended up oriented opposite to the shape it was
/// split from.
///
/// Edges compare tangents at a matched sample point; faces compare normals
/// (both honouring the stored orientation). Shapes of other kinds, or
/// split/original pairs that do not geometrically overlap, return `false`.
pub fn is_split_to_reverse(brep: &Brep, split: ShapeRef, original: ShapeRef) -> bool {
    match (split, original) {
        (ShapeRef::Edge(s), ShapeRef::Edge(o)) => edge_split_to_reverse(brep, s, o),
        (ShapeRef::Face(s), ShapeRef::Face(o)) => face_split_to_reverse(brep, s, o),
        _ => false,
    }
}

fn edge_tangent_at(brep: &Brep, edge: EdgeId, p: &Point3) -> Option<Vec3> {
    let curve = brep.curve3_of(edge)?.clone_box();
    let (t0, t1) = brep.topology.edges[edge].range;
    // Nearest sampled parameter to p.
    const SAMPLES: usize = 64;
    let mut best = (f64::MAX, t0);
    for k in 0..=SAMPLES {
        let t = t0 + (t1 - t0) * k as f64 / SAMPLES as f64;
        let d = (curve.eval(t) - p).norm();
        if d < best.0 {
            best = (d, t);
        }
    }
    let h = (t1 - t0) * 1e-6;
    if h == 0.0 {
        return None;
    }
    let tangent = (curve.eval(best.1 + h) - curve.eval(best.1 - h)) / (2.0 * h);
    Some(tangent)
}

fn edge_split_to_reverse(brep: &Brep, split: EdgeId, original: EdgeId) -> bool {
    let (t0, t1) = brep.topology.edges[split].range;
    let p = brep.edge_point(split, 0.5 * (t0 + t1));
    let (Some(ts), Some(to)) = (
        edge_tangent_at(brep, split, &p),
        edge_tangent_at(brep, original, &p),
    ) else {
        return false;
    };
    ts.dot(&to) < 0.0
}

fn face_split_to_reverse(brep: &Brep, split: FaceId, original: FaceId) -> bool {
    let Some((p, _)) = crate::point_in_face(brep, split) else {
        return false;
    };
    let n_split = oriented_normal(brep, split, &p);
    let n_original = oriented_normal(brep, original, &p);
    n_split.dot(&n_original) < 0.0
}

fn oriented_normal(brep: &Brep, face: FaceId, p: &Point3) -> Vec3 {
    let surface = brep.surface_of(face);
    let normal = surface.normal(surface.project(p));
    match brep.topology.faces[face].orientation {
        Orientation::Forward => *normal.as_ref(),
        Orientation::Reversed => -*normal.as_ref(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfuse_geom::Line3;
    use gfuse_primitives::make_box;

    /// A box with one bottom edge duplicated, forward and reversed.
    fn box_with_duplicate_edges() -> (Brep, EdgeId, EdgeId, EdgeId) {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let edge = brep.edges()[0];
        let (start, end) = (brep.topology.edges[edge].start, brep.topology.edges[edge].end);
        let pa = brep.point_of(start);
        let pb = brep.point_of(end);

        let forward = brep.topology.add_edge(start, end);
        let c = brep
            .geometry
            .add_curve3(Box::new(Line3::from_points(pa, pb)));
        brep.topology.edges[forward].curve3 = Some(c);

        let reversed = brep.topology.add_edge(end, start);
        let c = brep
            .geometry
            .add_curve3(Box::new(Line3::from_points(pb, pa)));
        brep.topology.edges[reversed].curve3 = Some(c);

        (brep, edge, forward, reversed)
    }

    #[test]
    fn test_find_sd_edges() {
        let (brep, edge, forward, reversed) = box_with_duplicate_edges();
        let other = brep.edges()[1];
        let candidates = vec![
            ShapeRef::Edge(edge),
            ShapeRef::Edge(forward),
            ShapeRef::Edge(reversed),
            ShapeRef::Edge(other),
        ];
        let mut groups = find_sd_shapes(&brep, &candidates, 1e-7);
        groups.sort_by_key(|g| g.len());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![ShapeRef::Edge(other)]);
        assert_eq!(groups[1].len(), 3);
    }

    #[test]
    fn test_refine_splits_loose_groups() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let edge = brep.edges()[0];
        let (start, end) = (brep.topology.edges[edge].start, brep.topology.edges[edge].end);
        // A near-duplicate, offset by more than the strict tolerance.
        let pa = brep.point_of(start) + gfuse_math::Vec3::new(0.0, 0.0, 1e-4);
        let pb = brep.point_of(end) + gfuse_math::Vec3::new(0.0, 0.0, 1e-4);
        let va = brep.topology.add_vertex(pa);
        let vb = brep.topology.add_vertex(pb);
        let near = brep.topology.add_edge(va, vb);
        let c = brep
            .geometry
            .add_curve3(Box::new(Line3::from_points(pa, pb)));
        brep.topology.edges[near].curve3 = Some(c);

        let candidates = vec![ShapeRef::Edge(edge), ShapeRef::Edge(near)];
        let loose = find_sd_shapes(&brep, &candidates, 1e-3);
        assert_eq!(loose.len(), 1);
        let strict = refine_sd_groups(&brep, loose, 1e-7);
        assert_eq!(strict.len(), 2);
    }

    #[test]
    fn test_split_to_reverse_edges() {
        let (brep, edge, forward, reversed) = box_with_duplicate_edges();
        assert!(!is_split_to_reverse(
            &brep,
            ShapeRef::Edge(forward),
            ShapeRef::Edge(edge)
        ));
        assert!(is_split_to_reverse(
            &brep,
            ShapeRef::Edge(reversed),
            ShapeRef::Edge(edge)
        ));
    }

    #[test]
    fn test_split_to_reverse_faces() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let face = brep.faces()[0];
        assert!(!is_split_to_reverse(
            &brep,
            ShapeRef::Face(face),
            ShapeRef::Face(face)
        ));
        // Clone the face record with a flipped orientation.
        let flipped_record = brep.topology.faces[face].clone();
        let flipped = brep.topology.faces.insert(flipped_record);
        brep.topology.faces[flipped].orientation = Orientation::Reversed;
        assert!(is_split_to_reverse(
            &brep,
            ShapeRef::Face(flipped),
            ShapeRef::Face(face)
        ));
    }
}
