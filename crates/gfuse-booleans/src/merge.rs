//! Same-domain unification of the built shape.
//!
//! After the arguments are copied and split into one result topology,
//! coincident entities are merged bottom-up: vertices, then edges, then
//! faces. Shared walls between glued solids end up represented once, with
//! both shells referencing the surviving face.

use std::collections::HashMap;

use gfuse_geom::{Curve2, Sampled2, Surface};
use gfuse_math::Point3;
use gfuse_primitives::Brep;
use gfuse_topo::{EdgeId, FaceId, Orientation, Pcurve, VertexId, WireId};

/// Run all unification passes; returns the number of merged entities.
pub fn unify(brep: &mut Brep, tol: f64) -> usize {
    unify_vertices(brep, tol) + unify_edges(brep, tol) + unify_faces(brep, tol)
}

/// Merge vertices closer than `tol`; returns the number removed.
pub fn unify_vertices(brep: &mut Brep, tol: f64) -> usize {
    let ids: Vec<VertexId> = brep.topology.vertices.keys().collect();
    let mut survivors: Vec<(VertexId, Point3)> = Vec::new();
    let mut replace: HashMap<VertexId, VertexId> = HashMap::new();
    for id in ids {
        let p = brep.topology.vertices[id].point;
        match survivors.iter().find(|(_, q)| (q - p).norm() < tol) {
            Some(&(survivor, _)) => {
                replace.insert(id, survivor);
            }
            None => survivors.push((id, p)),
        }
    }
    for edge in brep.topology.edges.values_mut() {
        if let Some(&r) = replace.get(&edge.start) {
            edge.start = r;
        }
        if let Some(&r) = replace.get(&edge.end) {
            edge.end = r;
        }
    }
    for &dup in replace.keys() {
        brep.topology.vertices.remove(dup);
    }
    replace.len()
}

struct EdgeProbe {
    start: VertexId,
    end: VertexId,
    closed: bool,
    mid: Point3,
    quarter: Point3,
    quarter_back: Point3,
}

fn probe(brep: &Brep, edge: EdgeId) -> EdgeProbe {
    let e = &brep.topology.edges[edge];
    let (t0, t1) = e.range;
    EdgeProbe {
        start: e.start,
        end: e.end,
        closed: e.is_closed(),
        mid: brep.edge_point(edge, 0.5 * (t0 + t1)),
        quarter: brep.edge_point(edge, t0 + 0.25 * (t1 - t0)),
        quarter_back: brep.edge_point(edge, t1 - 0.25 * (t1 - t0)),
    }
}

/// Merge geometrically coincident edges; returns the number removed.
///
/// Edges qualify when they join the same (already unified) vertices and
/// their interior sample points coincide within `tol`. A merged edge's
/// p-curves are carried over to the survivor, re-sampled when the duplicate
/// was parameterized differently.
pub fn unify_edges(brep: &mut Brep, tol: f64) -> usize {
    let ids: Vec<EdgeId> = brep.topology.edges.keys().collect();
    let mut survivors: Vec<EdgeId> = Vec::new();
    // duplicate -> (survivor, reversed)
    let mut replace: HashMap<EdgeId, (EdgeId, bool)> = HashMap::new();

    for id in ids {
        let p = probe(brep, id);
        let mut matched = None;
        for &survivor in &survivors {
            let q = probe(brep, survivor);
            if p.closed != q.closed {
                continue;
            }
            if p.closed {
                if p.start != q.start {
                    continue;
                }
                if (p.mid - q.mid).norm() < tol && (p.quarter - q.quarter).norm() < tol {
                    matched = Some((survivor, false));
                    break;
                }
                if (p.quarter - q.quarter_back).norm() < tol {
                    matched = Some((survivor, true));
                    break;
                }
            } else if p.start == q.start && p.end == q.end {
                if (p.mid - q.mid).norm() < tol {
                    matched = Some((survivor, false));
                    break;
                }
            } else if p.start == q.end && p.end == q.start && (p.mid - q.mid).norm() < tol {
                matched = Some((survivor, true));
                break;
            }
        }
        match matched {
            Some(found) => {
                replace.insert(id, found);
            }
            None => survivors.push(id),
        }
    }

    for (&dup, &(survivor, flip)) in &replace {
        carry_pcurves(brep, dup, survivor, flip);
        let dup_tol = brep.topology.edges[dup].tolerance;
        let survivor_tol = &mut brep.topology.edges[survivor].tolerance;
        *survivor_tol = survivor_tol.max(dup_tol);
    }

    let wire_ids: Vec<WireId> = brep.topology.wires.keys().collect();
    for wire in wire_ids {
        for entry in brep.topology.wires[wire].edges.iter_mut() {
            if let Some(&(survivor, flip)) = replace.get(&entry.0) {
                entry.0 = survivor;
                if flip {
                    entry.1 = entry.1.reversed();
                }
            }
        }
    }
    for &dup in replace.keys() {
        brep.topology.edges.remove(dup);
    }
    replace.len()
}

/// Move `dup`'s p-curves onto `survivor`, adjusting for parameterization.
fn carry_pcurves(brep: &mut Brep, dup: EdgeId, survivor: EdgeId, flip: bool) {
    let (d0, d1) = brep.topology.edges[dup].range;
    let (r0, r1) = brep.topology.edges[survivor].range;
    let same_range = (d0 - r0).abs() < 1e-9 && (d1 - r1).abs() < 1e-9;
    let dup_pcurves = brep.topology.edges[dup].pcurves.clone();

    for pc in dup_pcurves {
        let exists = brep.topology.edges[survivor]
            .pcurves
            .iter()
            .any(|p| p.face == pc.face);
        if exists {
            continue;
        }
        let curve2d = if !flip && same_range {
            pc.curve2d
        } else {
            // Re-sample the duplicate's image over the survivor's range.
            const SAMPLES: usize = 32;
            let curve = &brep.geometry.curves2[pc.curve2d];
            let mut points = Vec::with_capacity(SAMPLES + 1);
            for k in 0..=SAMPLES {
                let s = k as f64 / SAMPLES as f64;
                let t_dup = if flip {
                    d1 - s * (d1 - d0)
                } else {
                    d0 + s * (d1 - d0)
                };
                points.push(curve.eval(t_dup));
            }
            brep.geometry
                .add_curve2(Box::new(Sampled2::new(points, (r0, r1))))
        };
        brep.topology.edges[survivor].pcurves.push(Pcurve {
            face: pc.face,
            curve2d,
        });
    }
}

/// Merge faces with identical (unified) boundaries on coincident surfaces;
/// returns the number removed.
pub fn unify_faces(brep: &mut Brep, tol: f64) -> usize {
    let face_ids: Vec<FaceId> = brep.topology.faces.keys().collect();
    let mut groups: HashMap<Vec<EdgeId>, Vec<FaceId>> = HashMap::new();
    for face in face_ids {
        let mut signature: Vec<EdgeId> = brep
            .topology
            .face_edges(face)
            .into_iter()
            .map(|(e, _)| e)
            .collect();
        signature.sort();
        groups.entry(signature).or_default().push(face);
    }

    let mut removed = 0;
    for (_, group) in groups {
        if group.len() < 2 {
            continue;
        }
        let survivor = group[0];
        let sample = face_sample_point(brep, survivor);
        let n_survivor = face_normal_at(brep, survivor, &sample);
        for &dup in &group[1..] {
            // The surfaces must actually coincide at a shared sample point.
            let s = brep.surface_of(dup);
            let uv = s.project(&sample);
            if (s.eval(uv) - sample).norm() > tol.max(1e-9) * 10.0 {
                continue;
            }
            let flip = n_survivor.dot(&face_normal_at(brep, dup, &sample)) < 0.0;
            replace_face(brep, dup, survivor, flip);
            removed += 1;
        }
    }
    removed
}

/// A point on the face: midpoint of its first boundary edge.
fn face_sample_point(brep: &Brep, face: FaceId) -> Point3 {
    match brep.topology.face_edges(face).first() {
        Some(&(edge, _)) => {
            let (t0, t1) = brep.topology.edges[edge].range;
            brep.edge_point(edge, 0.5 * (t0 + t1))
        }
        None => Point3::origin(),
    }
}

/// Face normal near `p`, accounting for the face's own orientation.
fn face_normal_at(brep: &Brep, face: FaceId, p: &Point3) -> gfuse_math::Vec3 {
    let surface = brep.surface_of(face);
    let normal = surface.normal(surface.project(p));
    match brep.topology.faces[face].orientation {
        Orientation::Forward => *normal.as_ref(),
        Orientation::Reversed => -*normal.as_ref(),
    }
}

fn replace_face(brep: &mut Brep, dup: FaceId, survivor: FaceId, flip: bool) {
    let shell_ids: Vec<_> = brep.topology.shells.keys().collect();
    for shell in shell_ids {
        for entry in brep.topology.shells[shell].faces.iter_mut() {
            if entry.0 == dup {
                entry.0 = survivor;
                if flip {
                    entry.1 = entry.1.reversed();
                }
            }
        }
    }
    let wires = brep.topology.face_wires(dup);
    brep.topology.faces.remove(dup);
    for wire in wires {
        brep.topology.wires.remove(wire);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfuse_primitives::make_box;
    use gfuse_topo::{copy_shape, ShapeRef, StoreOffsets};

    /// Two identical boxes copied into one topology, under one compound.
    fn duplicated_box() -> Brep {
        let single = make_box(2.0, 2.0, 2.0);
        let mut topo = gfuse_topo::Topology::new();
        let mut geom = gfuse_geom::GeometryStore::new();
        let mut roots = Vec::new();
        for _ in 0..2 {
            let (s, c3, c2) = geom.append(&single.geometry);
            let offsets = StoreOffsets {
                surfaces: s,
                curves3: c3,
                curves2: c2,
            };
            roots.push(copy_shape(&single.topology, single.root, &mut topo, offsets));
        }
        let compound = topo.add_compound(roots);
        Brep::new(topo, geom, ShapeRef::Compound(compound))
    }

    #[test]
    fn test_unify_identical_boxes() {
        let mut brep = duplicated_box();
        assert_eq!(brep.topology.vertices.len(), 16);
        let merged_vertices = unify_vertices(&mut brep, 1e-7);
        assert_eq!(merged_vertices, 8);
        let merged_edges = unify_edges(&mut brep, 1e-7);
        assert_eq!(merged_edges, 12);
        let merged_faces = unify_faces(&mut brep, 1e-7);
        assert_eq!(merged_faces, 6);
        // Both solids now reference the same six faces.
        assert_eq!(brep.topology.faces.len(), 6);
        assert_eq!(brep.topology.solids.len(), 2);
    }

    #[test]
    fn test_unify_disjoint_boxes_is_noop() {
        let single = make_box(2.0, 2.0, 2.0);
        let moved = single.translated(10.0, 0.0, 0.0);
        let mut topo = gfuse_topo::Topology::new();
        let mut geom = gfuse_geom::GeometryStore::new();
        let mut roots = Vec::new();
        for brep in [&single, &moved] {
            let (s, c3, c2) = geom.append(&brep.geometry);
            let offsets = StoreOffsets {
                surfaces: s,
                curves3: c3,
                curves2: c2,
            };
            roots.push(copy_shape(&brep.topology, brep.root, &mut topo, offsets));
        }
        let compound = topo.add_compound(roots);
        let mut brep = Brep::new(topo, geom, ShapeRef::Compound(compound));
        assert_eq!(unify(&mut brep, 1e-7), 0);
        assert_eq!(brep.topology.faces.len(), 12);
    }

    #[test]
    fn test_unify_stacked_boxes_shares_wall() {
        // Box B sits exactly on top of box A; the touching wall merges.
        let a = make_box(2.0, 2.0, 2.0);
        let b = make_box(2.0, 2.0, 2.0).translated(0.0, 0.0, 2.0);
        let mut topo = gfuse_topo::Topology::new();
        let mut geom = gfuse_geom::GeometryStore::new();
        let mut roots = Vec::new();
        for brep in [&a, &b] {
            let (s, c3, c2) = geom.append(&brep.geometry);
            let offsets = StoreOffsets {
                surfaces: s,
                curves3: c3,
                curves2: c2,
            };
            roots.push(copy_shape(&brep.topology, brep.root, &mut topo, offsets));
        }
        let compound = topo.add_compound(roots);
        let mut brep = Brep::new(topo, geom, ShapeRef::Compound(compound));
        unify(&mut brep, 1e-7);
        // 4 shared corner vertices, 4 shared rim edges, 1 shared wall.
        assert_eq!(brep.topology.vertices.len(), 12);
        assert_eq!(brep.topology.faces.len(), 11);
    }
}
