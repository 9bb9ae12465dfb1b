#![warn(missing_docs)]

//! Geometry-kernel helper routines.
//!
//! A grab bag of utilities the diagnostic layer and its users need around
//! the pipeline: representative-point sampling, same-domain detection,
//! p-curve construction and refinement, meshing, and tolerance repair.

use std::collections::HashMap;
use std::f64::consts::TAU;

use gfuse_geom::{Curve2, Curve3, CurveKind, Line2, Sampled2, Surface, SurfaceKind};
use gfuse_math::{
    poly::{point_in_polygon, polygon_area},
    Point2, Point3, Vec3,
};
use gfuse_primitives::Brep;
use gfuse_tessellate::{tessellate, tessellate_face, TriangleMesh};
use gfuse_topo::{EdgeId, FaceId, Orientation, Pcurve, ShapeRef};

mod samedomain;

pub use samedomain::{find_sd_shapes, is_split_to_reverse, refine_sd_groups};

// =============================================================================
// Representative points
// =============================================================================

/// A point strictly inside a face, with its parameter-space preimage.
///
/// The parameter domain actually occupied by the face is scanned on a grid
/// until a sample falls inside the boundary.
pub fn point_in_face(brep: &Brep, face: FaceId) -> Option<(Point3, Point2)> {
    let surface = brep.surface_of(face);
    let polygon = brep.face_uv_polygon(face, 8);
    if polygon.len() < 3 || polygon_area(&polygon).abs() < 1e-12 {
        // Seam-only boundaries cover the whole surface domain.
        let ((umin, umax), (vmin, vmax)) = surface.domain();
        let uv = Point2::new(0.5 * (umin + umax), 0.5 * (vmin + vmax));
        return Some((surface.eval(uv), uv));
    }
    let holes: Vec<Vec<Point2>> = brep.topology.faces[face]
        .holes
        .iter()
        .map(|&hole| brep.wire_uv_polygon(face, hole, 8))
        .collect();
    let (umin, umax, vmin, vmax) = polygon_bounds(&polygon);
    const GRID: usize = 16;
    for j in 1..GRID {
        for i in 1..GRID {
            let uv = Point2::new(
                umin + (umax - umin) * i as f64 / GRID as f64,
                vmin + (vmax - vmin) * j as f64 / GRID as f64,
            );
            if point_in_polygon(&uv, &polygon) && holes.iter().all(|h| !point_in_polygon(&uv, h)) {
                return Some((surface.eval(uv), uv));
            }
        }
    }
    None
}

/// Up to `count` points spread over the inside of a face.
///
/// Degenerate faces yield an empty vector, not an error.
pub fn point_cloud_in_face(brep: &Brep, face: FaceId, count: usize) -> Vec<Point3> {
    if count == 0 {
        return Vec::new();
    }
    let surface = brep.surface_of(face);
    let polygon = brep.face_uv_polygon(face, 8);
    if polygon.len() < 3 || polygon_area(&polygon).abs() < 1e-12 {
        return Vec::new();
    }
    let holes: Vec<Vec<Point2>> = brep.topology.faces[face]
        .holes
        .iter()
        .map(|&hole| brep.wire_uv_polygon(face, hole, 8))
        .collect();
    let (umin, umax, vmin, vmax) = polygon_bounds(&polygon);
    let grid = ((count as f64).sqrt().ceil() as usize + 1).max(2);
    let mut points = Vec::new();
    for j in 1..=grid {
        for i in 1..=grid {
            if points.len() >= count {
                return points;
            }
            let uv = Point2::new(
                umin + (umax - umin) * i as f64 / (grid + 1) as f64,
                vmin + (vmax - vmin) * j as f64 / (grid + 1) as f64,
            );
            if point_in_polygon(&uv, &polygon) && holes.iter().all(|h| !point_in_polygon(&uv, h)) {
                points.push(surface.eval(uv));
            }
        }
    }
    points
}

fn polygon_bounds(polygon: &[Point2]) -> (f64, f64, f64, f64) {
    let mut umin = f64::MAX;
    let mut umax = f64::MIN;
    let mut vmin = f64::MAX;
    let mut vmax = f64::MIN;
    for p in polygon {
        umin = umin.min(p.x);
        umax = umax.max(p.x);
        vmin = vmin.min(p.y);
        vmax = vmax.max(p.y);
    }
    (umin, umax, vmin, vmax)
}

/// Point at the middle of an edge's parameter range.
pub fn point_on_edge(brep: &Brep, edge: EdgeId) -> Point3 {
    let (t0, t1) = brep.topology.edges[edge].range;
    brep.edge_point(edge, 0.5 * (t0 + t1))
}

/// Point on an edge at an explicit parameter.
pub fn point_on_edge_at(brep: &Brep, edge: EdgeId, t: f64) -> Point3 {
    brep.edge_point(edge, t)
}

/// A representative point on a face.
pub fn point_on_face(brep: &Brep, face: FaceId) -> Point3 {
    match point_in_face(brep, face) {
        Some((p, _)) => p,
        None => {
            let surface = brep.surface_of(face);
            let ((umin, umax), (vmin, vmax)) = surface.domain();
            surface.eval(Point2::new(0.5 * (umin + umax), 0.5 * (vmin + vmax)))
        }
    }
}

/// Point on a face at explicit parameters.
pub fn point_on_face_at(brep: &Brep, face: FaceId, u: f64, v: f64) -> Point3 {
    brep.surface_of(face).eval(Point2::new(u, v))
}

/// A representative point on any shape.
pub fn point_on_shape(brep: &Brep, shape: ShapeRef) -> Option<Point3> {
    match shape {
        ShapeRef::Vertex(v) => Some(brep.point_of(v)),
        ShapeRef::Edge(e) => Some(point_on_edge(brep, e)),
        ShapeRef::Wire(w) => {
            let &(edge, _) = brep.topology.wires[w].edges.first()?;
            Some(point_on_edge(brep, edge))
        }
        ShapeRef::Face(f) => Some(point_on_face(brep, f)),
        _ => {
            let faces: Vec<FaceId> = sub_faces(brep, shape);
            match faces.first() {
                Some(&face) => Some(point_on_face(brep, face)),
                None => {
                    let vertices = sub_vertices(brep, shape);
                    vertices.first().map(|&v| brep.point_of(v))
                }
            }
        }
    }
}

fn sub_faces(brep: &Brep, shape: ShapeRef) -> Vec<FaceId> {
    gfuse_topo::Explorer::new(&brep.topology, shape, gfuse_topo::ShapeKind::Face)
        .filter_map(|s| match s {
            ShapeRef::Face(f) => Some(f),
            _ => None,
        })
        .collect()
}

fn sub_vertices(brep: &Brep, shape: ShapeRef) -> Vec<gfuse_topo::VertexId> {
    gfuse_topo::Explorer::new(&brep.topology, shape, gfuse_topo::ShapeKind::Vertex)
        .filter_map(|s| match s {
            ShapeRef::Vertex(v) => Some(v),
            _ => None,
        })
        .collect()
}

/// Nearest point on a shape to `point`, by sampling its boundary.
///
/// Face candidates only count where the projection lands inside the face;
/// edges and vertices are sampled directly. Returns `None` for shapes with
/// no geometry.
pub fn project_point_on_shape(point: &Point3, brep: &Brep, shape: ShapeRef) -> Option<Point3> {
    let mut best: Option<(f64, Point3)> = None;
    let mut consider = |candidate: Point3| {
        let d = (candidate - point).norm();
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, candidate));
        }
    };

    for face in sub_faces(brep, shape) {
        let surface = brep.surface_of(face);
        let uv = surface.project(point);
        let polygon = brep.face_uv_polygon(face, 8);
        if polygon.len() >= 3 && point_in_polygon(&uv, &polygon) {
            consider(surface.eval(uv));
        }
    }
    let edges = gfuse_topo::Explorer::new(&brep.topology, shape, gfuse_topo::ShapeKind::Edge);
    for sub in edges {
        if let ShapeRef::Edge(edge) = sub {
            let (t0, t1) = brep.topology.edges[edge].range;
            const SAMPLES: usize = 32;
            for k in 0..=SAMPLES {
                let t = t0 + (t1 - t0) * k as f64 / SAMPLES as f64;
                consider(brep.edge_point(edge, t));
            }
        }
    }
    for vertex in sub_vertices(brep, shape) {
        consider(brep.point_of(vertex));
    }
    best.map(|(_, p)| p)
}

/// Face normal at the given parameters, honouring the face orientation.
pub fn face_normal(brep: &Brep, face: FaceId, u: f64, v: f64) -> Vec3 {
    let normal = brep.surface_of(face).normal(Point2::new(u, v));
    match brep.topology.faces[face].orientation {
        Orientation::Forward => *normal.as_ref(),
        Orientation::Reversed => -*normal.as_ref(),
    }
}

// =============================================================================
// P-curves
// =============================================================================

/// Number of samples used when building or refining a p-curve.
const PCURVE_SAMPLES: usize = 32;

/// Install the parameter-space image of an edge on a face.
///
/// Straight edges on planes get an exact 2D line; everything else gets a
/// sampled polyline with seam-aware unwrapping in the periodic direction.
/// Returns `false` when the edge already has an image on the face or has
/// no 3D curve to project.
pub fn build_pcurve_for_edge_on_face(brep: &mut Brep, edge: EdgeId, face: FaceId) -> bool {
    if brep.topology.edges[edge].pcurve_on(face).is_some() {
        return false;
    }
    let Some(curve3) = brep.curve3_of(edge) else {
        return false;
    };
    let surface = brep.surface_of(face);
    let (t0, t1) = brep.topology.edges[edge].range;

    let straight = curve3.kind() == CurveKind::Line && surface.kind() == SurfaceKind::Plane;
    let curve2: Box<dyn gfuse_geom::Curve2> = if straight {
        let a = surface.project(&curve3.eval(t0));
        let b = surface.project(&curve3.eval(t1));
        // The p-curve shares the edge's parameter range.
        let dir = (b - a) / (t1 - t0);
        Box::new(Line2::with_dir(Point2::new(a.x - t0 * dir.x, a.y - t0 * dir.y), dir))
    } else {
        let periodic = gfuse_geom::is_u_periodic(surface);
        let mut points = Vec::with_capacity(PCURVE_SAMPLES + 1);
        let mut previous: Option<Point2> = None;
        for k in 0..=PCURVE_SAMPLES {
            let t = t0 + (t1 - t0) * k as f64 / PCURVE_SAMPLES as f64;
            let mut uv = surface.project(&curve3.eval(t));
            if let (true, Some(prev)) = (periodic, previous) {
                // Unwrap across the seam so the image stays continuous.
                while uv.x - prev.x > TAU / 2.0 {
                    uv.x -= TAU;
                }
                while prev.x - uv.x > TAU / 2.0 {
                    uv.x += TAU;
                }
            }
            previous = Some(uv);
            points.push(uv);
        }
        Box::new(Sampled2::new(points, (t0, t1)))
    };

    let index = brep.geometry.add_curve2(curve2);
    brep.topology.edges[edge].pcurves.push(Pcurve {
        face,
        curve2d: index,
    });
    true
}

/// Clamp an edge's image on a periodic face into the `[umin, umax]` window.
///
/// Seam edges on periodic surfaces can come out a full period away from the
/// wanted parameterization; this shifts the image by whole periods.
pub fn refine_pcurve_for_edge_on_face(
    brep: &mut Brep,
    edge: EdgeId,
    face: FaceId,
    umin: f64,
    umax: f64,
) {
    if !gfuse_geom::is_u_periodic(brep.surface_of(face)) {
        return;
    }
    let Some(index) = brep.topology.edges[edge].pcurve_on(face) else {
        return;
    };
    let (t0, t1) = brep.topology.edges[edge].range;
    let curve2 = &brep.geometry.curves2[index];
    let mut points = Vec::with_capacity(PCURVE_SAMPLES + 1);
    let mut mean_u = 0.0;
    for k in 0..=PCURVE_SAMPLES {
        let t = t0 + (t1 - t0) * k as f64 / PCURVE_SAMPLES as f64;
        let uv = curve2.eval(t);
        mean_u += uv.x;
        points.push(uv);
    }
    mean_u /= (PCURVE_SAMPLES + 1) as f64;

    let center = 0.5 * (umin + umax);
    let shift = ((center - mean_u) / TAU).round() * TAU;
    if shift == 0.0 {
        return;
    }
    for p in &mut points {
        p.x += shift;
    }
    let shifted = brep
        .geometry
        .add_curve2(Box::new(Sampled2::new(points, (t0, t1))));
    for pc in brep.topology.edges[edge].pcurves.iter_mut() {
        if pc.face == face && pc.curve2d == index {
            pc.curve2d = shifted;
            break;
        }
    }
}

/// Raise edge tolerances to the maximum curve-on-surface deviation.
///
/// Each edge is compared against its images on every adjacent face; when
/// the sampled deviation exceeds the stored tolerance, the tolerance is
/// raised to it. Returns whether any tolerance changed. This is the repair
/// companion to the exact check mode.
pub fn fix_curve_on_surface_tolerances(brep: &mut Brep) -> bool {
    let mut changed = false;
    let edge_ids: Vec<EdgeId> = brep.edges();
    for edge in edge_ids {
        let Some(curve3) = brep.curve3_of(edge) else {
            continue;
        };
        let (t0, t1) = brep.topology.edges[edge].range;
        let mut max_deviation: f64 = 0.0;
        for pc in &brep.topology.edges[edge].pcurves {
            let Some(face) = brep.topology.faces.get(pc.face) else {
                continue;
            };
            let Some(surface) = brep.geometry.surfaces.get(face.surface) else {
                continue;
            };
            let Some(curve2) = brep.geometry.curves2.get(pc.curve2d) else {
                continue;
            };
            for k in 0..=PCURVE_SAMPLES {
                let t = t0 + (t1 - t0) * k as f64 / PCURVE_SAMPLES as f64;
                let deviation = (surface.eval(curve2.eval(t)) - curve3.eval(t)).norm();
                max_deviation = max_deviation.max(deviation);
            }
        }
        let edge_data = &mut brep.topology.edges[edge];
        if max_deviation > edge_data.tolerance {
            edge_data.tolerance = max_deviation;
            changed = true;
        }
    }
    changed
}

// =============================================================================
// Chains
// =============================================================================

/// Group coincidence couples into connected chains.
///
/// Every shape mentioned in a couple lands in exactly one chain; couples
/// sharing a member merge transitively.
pub fn find_chains(couples: &[(ShapeRef, ShapeRef)]) -> Vec<Vec<ShapeRef>> {
    let mut parent: HashMap<ShapeRef, ShapeRef> = HashMap::new();

    fn find(parent: &mut HashMap<ShapeRef, ShapeRef>, shape: ShapeRef) -> ShapeRef {
        let p = *parent.entry(shape).or_insert(shape);
        if p == shape {
            return shape;
        }
        let root = find(parent, p);
        parent.insert(shape, root);
        root
    }

    for &(a, b) in couples {
        let ra = find(&mut parent, a);
        let rb = find(&mut parent, b);
        if ra != rb {
            parent.insert(ra, rb);
        }
    }

    let members: Vec<ShapeRef> = parent.keys().copied().collect();
    let mut chains: HashMap<ShapeRef, Vec<ShapeRef>> = HashMap::new();
    for shape in members {
        let root = find(&mut parent, shape);
        chains.entry(root).or_default().push(shape);
    }
    chains.into_values().collect()
}

// =============================================================================
// Meshing
// =============================================================================

/// Default linear deflection coefficient used for triangulation.
pub fn default_deflection() -> f64 {
    0.001
}

/// Options for [`mesh_shape`].
#[derive(Debug, Clone, Copy)]
pub struct MeshOptions {
    /// Linear deflection coefficient.
    pub deflection: f64,
    /// Generate the mesh even when one is considered present. Meshes are
    /// not cached on shapes here, so `false` always yields `None`.
    pub forced: bool,
    /// Angular deflection in radians.
    pub angle_deflection: f64,
    /// Interpret `deflection` relative to the shape's largest dimension.
    pub relative: bool,
    /// Verify that every face produced triangles.
    pub post_check: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            deflection: default_deflection(),
            forced: true,
            angle_deflection: 0.5,
            relative: true,
            post_check: false,
        }
    }
}

/// Generate a triangulation for the shape.
///
/// Returns `None` when the shape has no faces or edges to mesh, when
/// `forced` is off, or when the post check finds a face that produced no
/// triangles.
pub fn mesh_shape(brep: &Brep, options: &MeshOptions) -> Option<TriangleMesh> {
    let faces = brep.faces();
    if faces.is_empty() && brep.edges().is_empty() {
        return None;
    }
    if !options.forced {
        return None;
    }
    if faces.is_empty() {
        // Edges alone carry no surface to triangulate.
        return None;
    }

    let deflection = if options.relative {
        options.deflection * max_dimension(brep).max(1e-9)
    } else {
        options.deflection
    };
    let segments = segment_count(brep, deflection, options.angle_deflection);

    if options.post_check {
        let mut scratch = TriangleMesh::default();
        for &face in &faces {
            if tessellate_face(brep, face, segments, &mut scratch) == 0 {
                return None;
            }
        }
        return Some(scratch);
    }

    let mesh = tessellate(brep, segments);
    if mesh.is_empty() {
        return None;
    }
    Some(mesh)
}

fn max_dimension(brep: &Brep) -> f64 {
    let mut min = [f64::MAX; 3];
    let mut max = [f64::MIN; 3];
    for vertex in brep.vertices() {
        let p = brep.point_of(vertex);
        for (i, c) in [p.x, p.y, p.z].into_iter().enumerate() {
            min[i] = min[i].min(c);
            max[i] = max[i].max(c);
        }
    }
    (0..3).map(|i| max[i] - min[i]).fold(0.0, f64::max)
}

/// Segment count satisfying both the angular and the sagitta bound.
fn segment_count(brep: &Brep, deflection: f64, angle_deflection: f64) -> u32 {
    let angular = (TAU / angle_deflection.clamp(0.05, TAU)).ceil() as u32;
    let size = max_dimension(brep).max(1e-9);
    let ratio = (1.0 - 2.0 * (deflection / size).clamp(1e-9, 0.499)).clamp(-1.0, 1.0);
    let sagitta = (std::f64::consts::PI / ratio.acos()).ceil() as u32;
    angular.max(sagitta).clamp(8, 128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gfuse_primitives::{make_box, make_cylinder, make_sphere};
    use gfuse_geom::Surface;

    fn bottom_face(brep: &Brep) -> FaceId {
        brep.faces()
            .into_iter()
            .find(|&f| {
                let p = point_on_face_at(brep, f, 0.1, 0.1);
                p.z.abs() < 1e-9 && brep.surface_of(f).kind() == SurfaceKind::Plane
            })
            .unwrap()
    }

    #[test]
    fn test_point_in_face_lands_inside() {
        let brep = make_box(2.0, 2.0, 2.0);
        let face = bottom_face(&brep);
        let (p, uv) = point_in_face(&brep, face).unwrap();
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
        let back = brep.surface_of(face).eval(uv);
        assert_relative_eq!((back - p).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_point_in_face_on_sphere() {
        let brep = make_sphere(2.0);
        let face = brep.faces()[0];
        let (p, _) = point_in_face(&brep, face).unwrap();
        assert_relative_eq!((p - Point3::origin()).norm(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_point_cloud_in_face() {
        let brep = make_box(4.0, 4.0, 1.0);
        let face = bottom_face(&brep);
        let cloud = point_cloud_in_face(&brep, face, 10);
        assert_eq!(cloud.len(), 10);
        for p in cloud {
            assert!(p.x > 0.0 && p.x < 4.0);
            assert!(p.y > 0.0 && p.y < 4.0);
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_project_point_on_shape() {
        let brep = make_box(2.0, 2.0, 2.0);
        let projected =
            project_point_on_shape(&Point3::new(1.0, 1.0, 5.0), &brep, brep.root).unwrap();
        assert_relative_eq!(projected.z, 2.0, epsilon = 1e-9);
        assert_relative_eq!(projected.x, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_face_normal_respects_orientation() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let face = bottom_face(&brep);
        let n = face_normal(&brep, face, 0.5, 0.5);
        assert_relative_eq!(n.z, -1.0, epsilon = 1e-9);
        brep.topology.faces[face].orientation = Orientation::Reversed;
        let flipped = face_normal(&brep, face, 0.5, 0.5);
        assert_relative_eq!(flipped.z, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_build_pcurve_restores_removed_image() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let face = bottom_face(&brep);
        let (edge, _) = brep.topology.face_edges(face)[0];
        brep.topology.edges[edge]
            .pcurves
            .retain(|p| p.face != face);
        assert!(brep.topology.edges[edge].pcurve_on(face).is_none());

        assert!(build_pcurve_for_edge_on_face(&mut brep, edge, face));
        let index = brep.topology.edges[edge].pcurve_on(face).unwrap();
        let curve3 = brep.curve3_of(edge).unwrap().clone_box();
        let surface_index = brep.topology.faces[face].surface;
        let (t0, t1) = brep.topology.edges[edge].range;
        for k in 0..=8 {
            let t = t0 + (t1 - t0) * k as f64 / 8.0;
            let uv = brep.geometry.curves2[index].eval(t);
            let deviation = (brep.geometry.surfaces[surface_index].eval(uv) - curve3.eval(t)).norm();
            assert!(deviation < 1e-9, "deviation {deviation}");
        }
        // A second build is a no-op.
        assert!(!build_pcurve_for_edge_on_face(&mut brep, edge, face));
    }

    #[test]
    fn test_refine_pcurve_shifts_period() {
        let mut brep = make_cylinder(1.0, 2.0);
        let lateral = brep
            .faces()
            .into_iter()
            .find(|&f| brep.surface_of(f).kind() == SurfaceKind::Cylinder)
            .unwrap();
        let seam = brep
            .edges()
            .into_iter()
            .find(|&e| {
                !brep.topology.edges[e].is_closed()
            })
            .unwrap();
        // The first seam image sits at u = 2π; pull it into [-π, π].
        refine_pcurve_for_edge_on_face(&mut brep, seam, lateral, -std::f64::consts::PI, std::f64::consts::PI);
        let index = brep.topology.edges[seam].pcurve_on(lateral).unwrap();
        let u = brep.geometry.curves2[index].eval(0.5).x;
        assert_relative_eq!(u, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fix_tolerances_absorbs_drift() {
        let mut brep = make_box(2.0, 2.0, 2.0);
        let face = bottom_face(&brep);
        let (edge, _) = brep.topology.face_edges(face)[0];
        // Corrupt the image: shift it sideways by 1e-3.
        let index = brep.topology.edges[edge].pcurve_on(face).unwrap();
        let (t0, t1) = brep.topology.edges[edge].range;
        let mut points = Vec::new();
        for k in 0..=8 {
            let t = t0 + (t1 - t0) * k as f64 / 8.0;
            let mut uv = brep.geometry.curves2[index].eval(t);
            uv.x += 1e-3;
            points.push(uv);
        }
        let shifted = brep
            .geometry
            .add_curve2(Box::new(Sampled2::new(points, (t0, t1))));
        for pc in brep.topology.edges[edge].pcurves.iter_mut() {
            if pc.face == face {
                pc.curve2d = shifted;
            }
        }

        assert!(fix_curve_on_surface_tolerances(&mut brep));
        let tolerance = brep.topology.edges[edge].tolerance;
        assert!(tolerance >= 1e-3 - 1e-9, "tolerance {tolerance}");
        // A second pass has nothing left to raise.
        assert!(!fix_curve_on_surface_tolerances(&mut brep));
    }

    #[test]
    fn test_find_chains_merges_transitively() {
        let brep = make_box(1.0, 1.0, 1.0);
        let e = brep.edges();
        let couples = [
            (ShapeRef::Edge(e[0]), ShapeRef::Edge(e[1])),
            (ShapeRef::Edge(e[1]), ShapeRef::Edge(e[2])),
            (ShapeRef::Edge(e[3]), ShapeRef::Edge(e[4])),
        ];
        let mut chains = find_chains(&couples);
        chains.sort_by_key(|c| c.len());
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].len(), 2);
        assert_eq!(chains[1].len(), 3);
    }

    #[test]
    fn test_mesh_shape_box() {
        let brep = make_box(2.0, 2.0, 2.0);
        let mesh = mesh_shape(&brep, &MeshOptions::default()).unwrap();
        assert!(mesh.num_triangles() > 0);
        assert_relative_eq!(mesh.volume(), 8.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mesh_shape_post_check() {
        let brep = make_cylinder(1.0, 2.0);
        let options = MeshOptions {
            post_check: true,
            ..MeshOptions::default()
        };
        assert!(mesh_shape(&brep, &options).is_some());
    }

    #[test]
    fn test_mesh_shape_unforced_returns_none() {
        let brep = make_box(1.0, 1.0, 1.0);
        let options = MeshOptions {
            forced: false,
            ..MeshOptions::default()
        };
        assert!(mesh_shape(&brep, &options).is_none());
    }

    #[test]
    fn test_mesh_shape_empty_shape() {
        let mut topo = gfuse_topo::Topology::new();
        let v = topo.add_vertex(Point3::origin());
        let brep = Brep::new(
            topo,
            gfuse_geom::GeometryStore::new(),
            ShapeRef::Vertex(v),
        );
        assert!(mesh_shape(&brep, &MeshOptions::default()).is_none());
    }
}
