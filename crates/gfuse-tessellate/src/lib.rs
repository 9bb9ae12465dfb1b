#![warn(missing_docs)]

//! Triangle mesh generation from BRep models.
//!
//! Planar faces are fan-triangulated from their boundary polygon; curved
//! faces are sampled on a parametric grid over their boundary's (u, v)
//! bounds. The mesh is the substrate for volume estimates, containment
//! queries, and the `mesh_shape` helper.

use gfuse_geom::{Surface, SurfaceKind};
use gfuse_math::{poly::polygon_area, Point2, Point3};
use gfuse_primitives::Brep;
use gfuse_topo::{FaceId, Orientation};

/// An indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Flat vertex positions `[x0, y0, z0, x1, ...]`.
    pub vertices: Vec<f32>,
    /// Triangle indices, three per triangle.
    pub indices: Vec<u32>,
    /// Flat per-vertex normals, parallel to `vertices`.
    pub normals: Vec<f32>,
}

impl TriangleMesh {
    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> ([f64; 3], [f64; 3]) {
        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];
        for chunk in self.vertices.chunks(3) {
            for i in 0..3 {
                min[i] = min[i].min(chunk[i] as f64);
                max[i] = max[i].max(chunk[i] as f64);
            }
        }
        (min, max)
    }

    /// Signed volume via summed tetrahedra (positive for outward winding).
    pub fn volume(&self) -> f64 {
        let mut vol = 0.0;
        for tri in self.indices.chunks(3) {
            let v0 = self.vertex(tri[0]);
            let v1 = self.vertex(tri[1]);
            let v2 = self.vertex(tri[2]);
            vol += v0[0] * (v1[1] * v2[2] - v2[1] * v1[2])
                - v1[0] * (v0[1] * v2[2] - v2[1] * v0[2])
                + v2[0] * (v0[1] * v1[2] - v1[1] * v0[2]);
        }
        vol / 6.0
    }

    fn vertex(&self, index: u32) -> [f64; 3] {
        let i = index as usize * 3;
        [
            self.vertices[i] as f64,
            self.vertices[i + 1] as f64,
            self.vertices[i + 2] as f64,
        ]
    }
}

/// Tessellate every face of a model into one mesh.
///
/// `segments` controls sampling density along boundary edges and curved
/// parametric directions.
pub fn tessellate(brep: &Brep, segments: u32) -> TriangleMesh {
    let mut mesh = TriangleMesh::default();
    for face in brep.faces() {
        tessellate_face(brep, face, segments, &mut mesh);
    }
    mesh
}

/// Tessellate a single face, appending to `mesh`.
///
/// Returns the number of triangles contributed.
pub fn tessellate_face(brep: &Brep, face: FaceId, segments: u32, mesh: &mut TriangleMesh) -> usize {
    let segments = segments.max(1) as usize;
    let before = mesh.num_triangles();
    let surface = brep.surface_of(face);
    let reversed = brep.topology.faces[face].orientation == Orientation::Reversed;
    match surface.kind() {
        SurfaceKind::Plane => {
            let mut polygon = brep.face_uv_polygon(face, segments);
            if polygon.len() < 3 {
                return 0;
            }
            // Fan triangulation expects counter-clockwise boundary.
            if polygon_area(&polygon) < 0.0 {
                polygon.reverse();
            }
            let base = (mesh.vertices.len() / 3) as u32;
            let normal = surface.normal(polygon[0]);
            let n = if reversed {
                -normal.as_ref()
            } else {
                *normal.as_ref()
            };
            for uv in &polygon {
                push_vertex(mesh, &surface.eval(*uv), &[n.x, n.y, n.z]);
            }
            for i in 1..polygon.len() - 1 {
                let (a, b, c) = if reversed {
                    (base, base + i as u32 + 1, base + i as u32)
                } else {
                    (base, base + i as u32, base + i as u32 + 1)
                };
                mesh.indices.extend([a, b, c]);
            }
        }
        SurfaceKind::Cylinder | SurfaceKind::Sphere => {
            let polygon = brep.face_uv_polygon(face, segments);
            if polygon.is_empty() {
                return 0;
            }
            let (umin, umax, vmin, vmax) = uv_bounds(&polygon);
            let nu = segments;
            let nv = if surface.kind() == SurfaceKind::Sphere {
                segments
            } else {
                1
            };
            let base = (mesh.vertices.len() / 3) as u32;
            for j in 0..=nv {
                let v = vmin + (vmax - vmin) * j as f64 / nv as f64;
                for i in 0..=nu {
                    let u = umin + (umax - umin) * i as f64 / nu as f64;
                    let uv = Point2::new(u, v);
                    let normal = surface.normal(uv);
                    let n = if reversed {
                        -normal.as_ref()
                    } else {
                        *normal.as_ref()
                    };
                    push_vertex(mesh, &surface.eval(uv), &[n.x, n.y, n.z]);
                }
            }
            let stride = (nu + 1) as u32;
            for j in 0..nv as u32 {
                for i in 0..nu as u32 {
                    let p00 = base + j * stride + i;
                    let p10 = p00 + 1;
                    let p01 = p00 + stride;
                    let p11 = p01 + 1;
                    if reversed {
                        mesh.indices.extend([p00, p11, p10]);
                        mesh.indices.extend([p00, p01, p11]);
                    } else {
                        mesh.indices.extend([p00, p10, p11]);
                        mesh.indices.extend([p00, p11, p01]);
                    }
                }
            }
        }
    }
    mesh.num_triangles() - before
}

fn uv_bounds(polygon: &[Point2]) -> (f64, f64, f64, f64) {
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

fn push_vertex(mesh: &mut TriangleMesh, p: &Point3, n: &[f64; 3]) {
    mesh.vertices
        .extend([p.x as f32, p.y as f32, p.z as f32]);
    mesh.normals
        .extend([n[0] as f32, n[1] as f32, n[2] as f32]);
}

/// Ray-parity containment test against a closed mesh.
pub fn point_in_mesh(point: &Point3, mesh: &TriangleMesh) -> bool {
    // Slightly tilted ray to dodge edge-on hits on axis-aligned geometry.
    let dir = [1.0, 1e-4, 2e-4];
    let mut crossings = 0;
    for tri in mesh.indices.chunks(3) {
        let a = mesh.vertex(tri[0]);
        let b = mesh.vertex(tri[1]);
        let c = mesh.vertex(tri[2]);
        if ray_hits_triangle(&[point.x, point.y, point.z], &dir, &a, &b, &c) {
            crossings += 1;
        }
    }
    crossings % 2 == 1
}

/// Möller–Trumbore ray/triangle intersection (positive ray side only).
fn ray_hits_triangle(
    origin: &[f64; 3],
    dir: &[f64; 3],
    a: &[f64; 3],
    b: &[f64; 3],
    c: &[f64; 3],
) -> bool {
    let e1 = sub(b, a);
    let e2 = sub(c, a);
    let p = cross(dir, &e2);
    let det = dot(&e1, &p);
    if det.abs() < 1e-12 {
        return false;
    }
    let inv = 1.0 / det;
    let s = sub(origin, a);
    let u = dot(&s, &p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let q = cross(&s, &e1);
    let v = dot(dir, &q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return false;
    }
    dot(&e2, &q) * inv > 1e-12
}

fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gfuse_primitives::{make_box, make_cylinder, make_sphere};

    #[test]
    fn test_box_volume() {
        let mesh = tessellate(&make_box(2.0, 3.0, 4.0), 4);
        assert_relative_eq!(mesh.volume(), 24.0, epsilon = 1e-6);
    }

    #[test]
    fn test_box_bounds() {
        let mesh = tessellate(&make_box(2.0, 3.0, 4.0), 2);
        let (min, max) = mesh.bounds();
        assert_relative_eq!(min[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(max[2], 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cylinder_volume_approaches_analytic() {
        let mesh = tessellate(&make_cylinder(2.0, 5.0), 64);
        let analytic = std::f64::consts::PI * 4.0 * 5.0;
        let error = (mesh.volume() - analytic).abs() / analytic;
        assert!(error < 0.02, "relative error {error} too large");
    }

    #[test]
    fn test_sphere_volume_approaches_analytic() {
        let mesh = tessellate(&make_sphere(2.0), 48);
        let analytic = 4.0 / 3.0 * std::f64::consts::PI * 8.0;
        let error = (mesh.volume() - analytic).abs() / analytic;
        assert!(error < 0.02, "relative error {error} too large");
    }

    #[test]
    fn test_point_in_mesh_box() {
        let mesh = tessellate(&make_box(10.0, 10.0, 10.0), 2);
        assert!(point_in_mesh(&Point3::new(5.0, 5.0, 5.0), &mesh));
        assert!(!point_in_mesh(&Point3::new(15.0, 5.0, 5.0), &mesh));
        assert!(!point_in_mesh(&Point3::new(-1.0, 5.0, 5.0), &mesh));
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = TriangleMesh::default();
        assert!(mesh.is_empty());
        assert_eq!(mesh.num_triangles(), 0);
    }
}
