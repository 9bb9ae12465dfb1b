//! Axis-aligned bounding boxes and the broadphase face-pair filter.

use gfuse_math::Point3;
use gfuse_primitives::Brep;
use gfuse_topo::FaceId;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Box from explicit corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Inverted box that grows from the first included point.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    /// Grow to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Whether two boxes interfere.
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Inflate uniformly by `tol`.
    pub fn expand(&mut self, tol: f64) {
        self.min.x -= tol;
        self.min.y -= tol;
        self.min.z -= tol;
        self.max.x += tol;
        self.max.y += tol;
        self.max.z += tol;
    }
}

/// Number of samples taken along each edge curve when bounding a face.
const EDGE_SAMPLES: usize = 8;

/// Bounding box of a face from its boundary vertices and sampled edge
/// curves (curved edges can bulge past their endpoints).
pub fn face_aabb(brep: &Brep, face: FaceId) -> Aabb3 {
    let mut aabb = Aabb3::empty();
    for (edge_id, _) in brep.topology.face_edges(face) {
        let edge = &brep.topology.edges[edge_id];
        aabb.include_point(&brep.topology.vertices[edge.start].point);
        aabb.include_point(&brep.topology.vertices[edge.end].point);
        let (t0, t1) = edge.range;
        for k in 0..=EDGE_SAMPLES {
            let t = t0 + (t1 - t0) * k as f64 / EDGE_SAMPLES as f64;
            aabb.include_point(&brep.edge_point(edge_id, t));
        }
    }
    aabb
}

/// Bounding box of a whole model.
pub fn shape_aabb(brep: &Brep) -> Aabb3 {
    let mut aabb = Aabb3::empty();
    for face in brep.faces() {
        let face_box = face_aabb(brep, face);
        aabb.include_point(&face_box.min);
        aabb.include_point(&face_box.max);
    }
    // Models without faces still have vertices to bound.
    for v in brep.vertices() {
        aabb.include_point(&brep.point_of(v));
    }
    aabb
}

/// Face pairs whose bounding boxes (inflated by `tol`) interfere.
pub fn candidate_face_pairs(a: &Brep, b: &Brep, tol: f64) -> Vec<(FaceId, FaceId)> {
    let faces_b: Vec<(FaceId, Aabb3)> = b
        .faces()
        .into_iter()
        .map(|f| {
            let mut aabb = face_aabb(b, f);
            aabb.expand(tol);
            (f, aabb)
        })
        .collect();

    let mut pairs = Vec::new();
    for face_a in a.faces() {
        let mut aabb_a = face_aabb(a, face_a);
        aabb_a.expand(tol);
        for (face_b, aabb_b) in &faces_b {
            if aabb_a.overlaps(aabb_b) {
                pairs.push((face_a, *face_b));
            }
        }
    }
    pairs
}
