#![warn(missing_docs)]

//! BRep model container and primitive solid construction.
//!
//! A [`Brep`] couples a [`Topology`] with its [`GeometryStore`] and a root
//! shape. The constructors here build watertight primitives (box, cylinder,
//! sphere) with 3D curves and p-curves installed on every edge; they are the
//! standard inputs for the Boolean pipeline and the checker test suites.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use gfuse_geom::{
    Circle2, Circle3, Curve2, Curve3, CylinderSurface, GeometryStore, Line2, Line3, Plane,
    SphereSurface, Surface,
};
use gfuse_math::{Point2, Point3, Transform, Vec2, Vec3};
use gfuse_topo::{
    EdgeId, Explorer, FaceId, Orientation, Pcurve, ShapeKind, ShapeRef, SolidId, Topology,
    VertexId, WireId,
};

/// A BRep model: topology, geometry, and the root shape tying them together.
#[derive(Debug, Clone)]
pub struct Brep {
    /// Topological structure.
    pub topology: Topology,
    /// Geometric data referenced by the topology.
    pub geometry: GeometryStore,
    /// The root shape of the model.
    pub root: ShapeRef,
}

impl Brep {
    /// Assemble a model from its parts.
    pub fn new(topology: Topology, geometry: GeometryStore, root: ShapeRef) -> Self {
        Self {
            topology,
            geometry,
            root,
        }
    }

    /// Surface supporting a face.
    pub fn surface_of(&self, face: FaceId) -> &dyn Surface {
        self.geometry.surfaces[self.topology.faces[face].surface].as_ref()
    }

    /// 3D curve supporting an edge, if one is attached.
    pub fn curve3_of(&self, edge: EdgeId) -> Option<&dyn Curve3> {
        self.topology.edges[edge]
            .curve3
            .map(|i| self.geometry.curves3[i].as_ref())
    }

    /// 2D curve at a store index.
    pub fn curve2(&self, index: usize) -> &dyn Curve2 {
        self.geometry.curves2[index].as_ref()
    }

    /// Position of a vertex.
    pub fn point_of(&self, vertex: VertexId) -> Point3 {
        self.topology.vertices[vertex].point
    }

    /// Point on an edge at curve parameter `t`.
    ///
    /// Falls back to linear interpolation of the endpoints when the edge
    /// carries no curve.
    pub fn edge_point(&self, edge: EdgeId, t: f64) -> Point3 {
        if let Some(curve) = self.curve3_of(edge) {
            return curve.eval(t);
        }
        let e = &self.topology.edges[edge];
        let a = self.topology.vertices[e.start].point;
        let b = self.topology.vertices[e.end].point;
        let (t0, t1) = e.range;
        let span = t1 - t0;
        let s = if span.abs() < f64::EPSILON {
            0.0
        } else {
            (t - t0) / span
        };
        a + s * (b - a)
    }

    /// All faces under the root, in exploration order.
    pub fn faces(&self) -> Vec<FaceId> {
        Explorer::new(&self.topology, self.root, ShapeKind::Face)
            .filter_map(|s| match s {
                ShapeRef::Face(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    /// All edges under the root, in exploration order.
    pub fn edges(&self) -> Vec<EdgeId> {
        Explorer::new(&self.topology, self.root, ShapeKind::Edge)
            .filter_map(|s| match s {
                ShapeRef::Edge(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    /// All vertices under the root, in exploration order.
    pub fn vertices(&self) -> Vec<VertexId> {
        Explorer::new(&self.topology, self.root, ShapeKind::Vertex)
            .filter_map(|s| match s {
                ShapeRef::Vertex(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    /// All solids under the root, in exploration order.
    pub fn solids(&self) -> Vec<SolidId> {
        Explorer::new(&self.topology, self.root, ShapeKind::Solid)
            .filter_map(|s| match s {
                ShapeRef::Solid(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Sample a wire of a face into a parameter-space polygon.
    ///
    /// Each oriented edge use contributes `samples_per_edge` points from its
    /// p-curve on the face (the end point is left to the following edge).
    /// When an edge is used twice in the same wire (seams), its p-curves are
    /// consumed in attachment order, one per use.
    pub fn wire_uv_polygon(
        &self,
        face: FaceId,
        wire: WireId,
        samples_per_edge: usize,
    ) -> Vec<Point2> {
        let mut occurrence: HashMap<EdgeId, usize> = HashMap::new();
        let mut polygon = Vec::new();
        for &(edge_id, orientation) in &self.topology.wires[wire].edges {
            let edge = &self.topology.edges[edge_id];
            let on_face: Vec<usize> = edge
                .pcurves
                .iter()
                .filter(|p| p.face == face)
                .map(|p| p.curve2d)
                .collect();
            if on_face.is_empty() {
                continue;
            }
            let occ = occurrence.entry(edge_id).or_insert(0);
            let curve2 = self.curve2(on_face[(*occ).min(on_face.len() - 1)]);
            *occ += 1;
            let (t0, t1) = edge.range;
            for k in 0..samples_per_edge {
                let s = k as f64 / samples_per_edge as f64;
                let s = match orientation {
                    Orientation::Forward => s,
                    Orientation::Reversed => 1.0 - s,
                };
                polygon.push(curve2.eval(t0 + s * (t1 - t0)));
            }
        }
        polygon
    }

    /// Parameter-space polygon of a face's outer wire.
    pub fn face_uv_polygon(&self, face: FaceId, samples_per_edge: usize) -> Vec<Point2> {
        self.wire_uv_polygon(face, self.topology.faces[face].outer, samples_per_edge)
    }

    /// A transformed copy of this model.
    pub fn transformed(&self, t: &Transform) -> Brep {
        let mut topology = self.topology.clone();
        for vertex in topology.vertices.values_mut() {
            vertex.point = t.apply_point(&vertex.point);
        }
        let mut geometry = GeometryStore::new();
        for surface in &self.geometry.surfaces {
            geometry.surfaces.push(surface.transform(t));
        }
        for curve in &self.geometry.curves3 {
            geometry.curves3.push(curve.transform(t));
        }
        // P-curves live in parameter space and follow their surface.
        geometry.curves2 = self.geometry.curves2.clone();
        Brep::new(topology, geometry, self.root)
    }

    /// A translated copy of this model.
    pub fn translated(&self, dx: f64, dy: f64, dz: f64) -> Brep {
        self.transformed(&Transform::translation(dx, dy, dz))
    }
}

/// Build a box with one corner at the origin and dimensions `(sx, sy, sz)`.
///
/// 6 planar faces with outward normals, 12 shared edges, 8 vertices.
pub fn make_box(sx: f64, sy: f64, sz: f64) -> Brep {
    let mut topo = Topology::new();
    let mut geom = GeometryStore::new();

    let v0 = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
    let v1 = topo.add_vertex(Point3::new(sx, 0.0, 0.0));
    let v2 = topo.add_vertex(Point3::new(sx, sy, 0.0));
    let v3 = topo.add_vertex(Point3::new(0.0, sy, 0.0));
    let v4 = topo.add_vertex(Point3::new(0.0, 0.0, sz));
    let v5 = topo.add_vertex(Point3::new(sx, 0.0, sz));
    let v6 = topo.add_vertex(Point3::new(sx, sy, sz));
    let v7 = topo.add_vertex(Point3::new(0.0, sy, sz));

    // For each face: 4 vertices in CCW order viewed from outside, plus the
    // plane frame chosen so x_dir × y_dir is the outward normal.
    let face_defs: [([VertexId; 4], Point3, Vec3, Vec3); 6] = [
        (
            [v0, v3, v2, v1],
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ),
        (
            [v4, v5, v6, v7],
            Point3::new(0.0, 0.0, sz),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ),
        (
            [v0, v1, v5, v4],
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
        ),
        (
            [v2, v3, v7, v6],
            Point3::new(0.0, sy, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ),
        (
            [v0, v4, v7, v3],
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
        ),
        (
            [v1, v2, v6, v5],
            Point3::new(sx, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ),
    ];

    let mut edge_map: HashMap<(VertexId, VertexId), EdgeId> = HashMap::new();
    let mut faces = Vec::new();

    for (verts, origin, x_dir, y_dir) in face_defs.iter() {
        let plane = Plane::new(*origin, *x_dir, *y_dir);
        let surface = geom.add_surface(Box::new(plane.clone()));

        let mut wire_edges = Vec::new();
        for j in 0..4 {
            let a = verts[j];
            let b = verts[(j + 1) % 4];
            let (edge, orientation) = if let Some(&e) = edge_map.get(&(a, b)) {
                (e, Orientation::Forward)
            } else if let Some(&e) = edge_map.get(&(b, a)) {
                (e, Orientation::Reversed)
            } else {
                let e = topo.add_edge(a, b);
                let pa = topo.vertices[a].point;
                let pb = topo.vertices[b].point;
                let curve = geom.add_curve3(Box::new(Line3::from_points(pa, pb)));
                topo.edges[e].curve3 = Some(curve);
                edge_map.insert((a, b), e);
                (e, Orientation::Forward)
            };
            wire_edges.push((edge, orientation));
        }

        let wire = topo.add_wire(wire_edges.clone(), true);
        let face = topo.add_face(wire, surface);

        for &(edge, _) in &wire_edges {
            let start = topo.edges[edge].start;
            let end = topo.edges[edge].end;
            let a2 = plane.project(&topo.vertices[start].point);
            let b2 = plane.project(&topo.vertices[end].point);
            let curve2 = geom.add_curve2(Box::new(Line2::from_points(a2, b2)));
            topo.edges[edge].pcurves.push(Pcurve { face, curve2d: curve2 });
        }

        faces.push(face);
    }

    let shell = topo.add_shell(
        faces.iter().map(|&f| (f, Orientation::Forward)).collect(),
        true,
    );
    let solid = topo.add_solid(shell);
    Brep::new(topo, geom, ShapeRef::Solid(solid))
}

/// Build a cylinder of the given radius and height, axis along Z.
///
/// One cylindrical lateral face bounded by the two cap circles and a seam
/// edge, plus two planar cap faces.
pub fn make_cylinder(radius: f64, height: f64) -> Brep {
    let mut topo = Topology::new();
    let mut geom = GeometryStore::new();

    let v_bot = topo.add_vertex(Point3::new(radius, 0.0, 0.0));
    let v_top = topo.add_vertex(Point3::new(radius, 0.0, height));

    let lateral_surface = geom.add_surface(Box::new(CylinderSurface::new(radius)));
    let bottom_plane = Plane::new(
        Point3::origin(),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
    );
    let bottom_surface = geom.add_surface(Box::new(bottom_plane));
    let top_plane = Plane::new(
        Point3::new(0.0, 0.0, height),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    );
    let top_surface = geom.add_surface(Box::new(top_plane));

    // Closed circular edges at the caps and the straight seam.
    let e_bot = topo.add_edge(v_bot, v_bot);
    let c_bot = geom.add_curve3(Box::new(Circle3::new(Point3::origin(), radius)));
    topo.edges[e_bot].curve3 = Some(c_bot);
    topo.edges[e_bot].range = (0.0, TAU);

    let e_top = topo.add_edge(v_top, v_top);
    let c_top = geom.add_curve3(Box::new(Circle3::new(Point3::new(0.0, 0.0, height), radius)));
    topo.edges[e_top].curve3 = Some(c_top);
    topo.edges[e_top].range = (0.0, TAU);

    let e_seam = topo.add_edge(v_bot, v_top);
    let c_seam = geom.add_curve3(Box::new(Line3::from_points(
        Point3::new(radius, 0.0, 0.0),
        Point3::new(radius, 0.0, height),
    )));
    topo.edges[e_seam].curve3 = Some(c_seam);

    // Lateral face: bottom circle, seam up, top circle (reversed), seam down.
    let lateral_wire = topo.add_wire(
        vec![
            (e_bot, Orientation::Forward),
            (e_seam, Orientation::Forward),
            (e_top, Orientation::Reversed),
            (e_seam, Orientation::Reversed),
        ],
        true,
    );
    let lateral_face = topo.add_face(lateral_wire, lateral_surface);

    let bottom_wire = topo.add_wire(vec![(e_bot, Orientation::Reversed)], true);
    let bottom_face = topo.add_face(bottom_wire, bottom_surface);

    let top_wire = topo.add_wire(vec![(e_top, Orientation::Forward)], true);
    let top_face = topo.add_face(top_wire, top_surface);

    // P-curves on the lateral face. The seam carries two images, attached
    // u = 2π side first so wire traversal consumes them in boundary order.
    let pc = geom.add_curve2(Box::new(Line2::with_dir(
        Point2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
    )));
    topo.edges[e_bot].pcurves.push(Pcurve {
        face: lateral_face,
        curve2d: pc,
    });
    let pc = geom.add_curve2(Box::new(Line2::with_dir(
        Point2::new(0.0, height),
        Vec2::new(1.0, 0.0),
    )));
    topo.edges[e_top].pcurves.push(Pcurve {
        face: lateral_face,
        curve2d: pc,
    });
    let pc = geom.add_curve2(Box::new(Line2::with_dir(
        Point2::new(TAU, 0.0),
        Vec2::new(0.0, height),
    )));
    topo.edges[e_seam].pcurves.push(Pcurve {
        face: lateral_face,
        curve2d: pc,
    });
    let pc = geom.add_curve2(Box::new(Line2::with_dir(
        Point2::new(0.0, 0.0),
        Vec2::new(0.0, height),
    )));
    topo.edges[e_seam].pcurves.push(Pcurve {
        face: lateral_face,
        curve2d: pc,
    });

    // P-curves on the caps: exact circles in the cap plane frames.
    // The bottom frame has a mirrored v axis, hence the flipped y direction.
    let pc = geom.add_curve2(Box::new(Circle2::with_frame(
        Point2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, -1.0),
        radius,
    )));
    topo.edges[e_bot].pcurves.push(Pcurve {
        face: bottom_face,
        curve2d: pc,
    });
    let pc = geom.add_curve2(Box::new(Circle2::new(Point2::new(0.0, 0.0), radius)));
    topo.edges[e_top].pcurves.push(Pcurve {
        face: top_face,
        curve2d: pc,
    });

    let shell = topo.add_shell(
        vec![
            (lateral_face, Orientation::Forward),
            (bottom_face, Orientation::Forward),
            (top_face, Orientation::Forward),
        ],
        true,
    );
    let solid = topo.add_solid(shell);
    Brep::new(topo, geom, ShapeRef::Solid(solid))
}

/// Build a sphere of the given radius, centered at the origin.
///
/// A single spherical face whose boundary runs up the seam meridian and
/// back down the other side, with vertices at the poles.
pub fn make_sphere(radius: f64) -> Brep {
    let mut topo = Topology::new();
    let mut geom = GeometryStore::new();

    let v_south = topo.add_vertex(Point3::new(0.0, 0.0, -radius));
    let v_north = topo.add_vertex(Point3::new(0.0, 0.0, radius));

    let surface = geom.add_surface(Box::new(SphereSurface::new(radius)));

    // Seam meridian in the XZ plane, parameterized by latitude.
    let e_seam = topo.add_edge(v_south, v_north);
    let meridian = geom.add_curve3(Box::new(Circle3::with_frame(
        Point3::origin(),
        Vec3::x(),
        Vec3::z(),
        radius,
    )));
    topo.edges[e_seam].curve3 = Some(meridian);
    topo.edges[e_seam].range = (-PI / 2.0, PI / 2.0);

    let wire = topo.add_wire(
        vec![
            (e_seam, Orientation::Forward),
            (e_seam, Orientation::Reversed),
        ],
        true,
    );
    let face = topo.add_face(wire, surface);

    // Seam images at u = 2π and u = 0, consumed in traversal order.
    let pc = geom.add_curve2(Box::new(Line2::with_dir(
        Point2::new(TAU, 0.0),
        Vec2::new(0.0, 1.0),
    )));
    topo.edges[e_seam].pcurves.push(Pcurve {
        face,
        curve2d: pc,
    });
    let pc = geom.add_curve2(Box::new(Line2::with_dir(
        Point2::new(0.0, 0.0),
        Vec2::new(0.0, 1.0),
    )));
    topo.edges[e_seam].pcurves.push(Pcurve {
        face,
        curve2d: pc,
    });

    let shell = topo.add_shell(vec![(face, Orientation::Forward)], true);
    let solid = topo.add_solid(shell);
    Brep::new(topo, geom, ShapeRef::Solid(solid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gfuse_math::poly::{point_in_polygon, polygon_area};

    #[test]
    fn test_box_topology_counts() {
        let brep = make_box(10.0, 20.0, 30.0);
        assert_eq!(brep.topology.vertices.len(), 8);
        assert_eq!(brep.topology.edges.len(), 12);
        assert_eq!(brep.topology.faces.len(), 6);
        assert_eq!(brep.topology.shells.len(), 1);
        assert_eq!(brep.topology.solids.len(), 1);
    }

    #[test]
    fn test_box_edges_shared_twice() {
        let brep = make_box(1.0, 1.0, 1.0);
        let mut uses: HashMap<EdgeId, usize> = HashMap::new();
        for face in brep.faces() {
            for (edge, _) in brep.topology.face_edges(face) {
                *uses.entry(edge).or_insert(0) += 1;
            }
        }
        assert_eq!(uses.len(), 12);
        assert!(uses.values().all(|&n| n == 2));
    }

    #[test]
    fn test_box_pcurves_installed() {
        let brep = make_box(2.0, 3.0, 4.0);
        for edge in brep.edges() {
            assert_eq!(brep.topology.edges[edge].pcurves.len(), 2);
        }
    }

    #[test]
    fn test_box_wires_connected() {
        let brep = make_box(1.0, 2.0, 3.0);
        for face in brep.faces() {
            for wire in brep.topology.face_wires(face) {
                assert!(brep.topology.wire_is_connected(wire));
            }
        }
    }

    #[test]
    fn test_box_face_polygon_area() {
        let brep = make_box(2.0, 3.0, 4.0);
        for face in brep.faces() {
            let polygon = brep.face_uv_polygon(face, 1);
            assert_eq!(polygon.len(), 4);
            // CCW in face parameter space, area matching the side.
            assert!(polygon_area(&polygon) > 0.0);
        }
    }

    #[test]
    fn test_cylinder_topology_counts() {
        let brep = make_cylinder(5.0, 10.0);
        assert_eq!(brep.topology.vertices.len(), 2);
        assert_eq!(brep.topology.edges.len(), 3);
        assert_eq!(brep.topology.faces.len(), 3);
    }

    #[test]
    fn test_cylinder_lateral_polygon_is_rectangle() {
        let brep = make_cylinder(2.0, 6.0);
        let lateral = brep
            .faces()
            .into_iter()
            .find(|&f| brep.surface_of(f).kind() == gfuse_geom::SurfaceKind::Cylinder)
            .unwrap();
        let polygon = brep.face_uv_polygon(lateral, 8);
        assert!(point_in_polygon(&Point2::new(PI, 3.0), &polygon));
        assert!(!point_in_polygon(&Point2::new(PI, 7.0), &polygon));
    }

    #[test]
    fn test_sphere_seam_polygon_covers_domain() {
        let brep = make_sphere(3.0);
        let face = brep.faces()[0];
        let polygon = brep.face_uv_polygon(face, 8);
        assert!(point_in_polygon(&Point2::new(PI, 0.0), &polygon));
    }

    #[test]
    fn test_pcurves_track_curves() {
        // surface.eval(pcurve.eval(t)) must match curve3.eval(t) on every
        // edge of every primitive.
        for brep in [make_box(2.0, 2.0, 2.0), make_cylinder(2.0, 5.0), make_sphere(2.0)] {
            for face in brep.faces() {
                let surface = brep.surface_of(face);
                for (edge_id, _) in brep.topology.face_edges(face) {
                    let edge = &brep.topology.edges[edge_id];
                    let curve = brep.curve3_of(edge_id).unwrap();
                    for pc in edge.pcurves.iter().filter(|p| p.face == face) {
                        let curve2 = brep.curve2(pc.curve2d);
                        let (t0, t1) = edge.range;
                        for k in 0..=4 {
                            let t = t0 + (t1 - t0) * k as f64 / 4.0;
                            let from_surface = surface.eval(curve2.eval(t));
                            let from_curve = curve.eval(t);
                            assert_relative_eq!(
                                (from_surface - from_curve).norm(),
                                0.0,
                                epsilon = 1e-9
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_translated_box() {
        let brep = make_box(1.0, 1.0, 1.0).translated(5.0, 0.0, 0.0);
        let xs: Vec<f64> = brep
            .vertices()
            .iter()
            .map(|&v| brep.point_of(v).x)
            .collect();
        assert!(xs.iter().all(|&x| x >= 5.0 - 1e-12));
    }

    #[test]
    fn test_transform_moves_surfaces_with_vertices() {
        let brep = make_cylinder(1.0, 2.0).translated(3.0, 0.0, 0.0);
        let lateral = brep
            .faces()
            .into_iter()
            .find(|&f| brep.surface_of(f).kind() == gfuse_geom::SurfaceKind::Cylinder)
            .unwrap();
        let p = brep.surface_of(lateral).eval(Point2::new(0.0, 0.0));
        assert_relative_eq!(p.x, 4.0, epsilon = 1e-12);
    }
}
