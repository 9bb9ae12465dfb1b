#![warn(missing_docs)]

//! Analytic surface and curve types for the gfuse crates.
//!
//! Trait-based abstractions for parametric surfaces, 3D curves, and the 2D
//! parameter-space curves (p-curves) that tie edges to faces. Concrete
//! implementations cover the analytic types the pipeline works with:
//! planes, cylinders, spheres, lines, and circles.

use std::any::Any;
use std::f64::consts::{PI, TAU};

use gfuse_math::{Dir3, Point2, Point3, Transform, Vec2, Vec3};

// =============================================================================
// Surfaces
// =============================================================================

/// The kind of a surface (for match-based dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Infinite plane.
    Plane,
    /// Cylindrical surface (infinite extent along its axis).
    Cylinder,
    /// Spherical surface.
    Sphere,
}

/// A parametric surface in 3D space.
pub trait Surface: Send + Sync + std::fmt::Debug {
    /// Evaluate the surface at parameter `(u, v)`.
    fn eval(&self, uv: Point2) -> Point3;

    /// Surface normal at parameter `(u, v)`.
    fn normal(&self, uv: Point2) -> Dir3;

    /// Inverse evaluation: parameters of the closest surface point.
    fn project(&self, p: &Point3) -> Point2;

    /// Parameter domain as `((u_min, u_max), (v_min, v_max))`.
    fn domain(&self) -> ((f64, f64), (f64, f64));

    /// The kind of this surface.
    fn kind(&self) -> SurfaceKind;

    /// Clone this surface into a boxed trait object.
    fn clone_box(&self) -> Box<dyn Surface>;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Apply an affine transform, returning a new surface.
    fn transform(&self, t: &Transform) -> Box<dyn Surface>;
}

impl Clone for Box<dyn Surface> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Whether the surface is periodic in its u parameter (seam at u = 0/2π).
pub fn is_u_periodic(surface: &dyn Surface) -> bool {
    matches!(surface.kind(), SurfaceKind::Cylinder | SurfaceKind::Sphere)
}

/// An infinite plane defined by an origin point and a coordinate frame.
///
/// Parameterization: `P(u, v) = origin + u * x_dir + v * y_dir`.
#[derive(Debug, Clone)]
pub struct Plane {
    /// Origin point on the plane.
    pub origin: Point3,
    /// Unit vector along the u direction.
    pub x_dir: Dir3,
    /// Unit vector along the v direction.
    pub y_dir: Dir3,
    /// Unit normal (`x_dir × y_dir`).
    pub normal_dir: Dir3,
}

impl Plane {
    /// Create a plane from origin and two direction vectors (need not be
    /// normalized).
    pub fn new(origin: Point3, x_dir: Vec3, y_dir: Vec3) -> Self {
        let x = Dir3::new_normalize(x_dir);
        let y = Dir3::new_normalize(y_dir);
        let n = Dir3::new_normalize(x_dir.cross(&y_dir));
        Self {
            origin,
            x_dir: x,
            y_dir: y,
            normal_dir: n,
        }
    }

    /// Create a plane from origin and normal; u/v directions are chosen
    /// arbitrarily.
    pub fn from_normal(origin: Point3, normal: Vec3) -> Self {
        let n = Dir3::new_normalize(normal);
        let arbitrary = if n.as_ref().x.abs() < 0.9 {
            Vec3::x()
        } else {
            Vec3::y()
        };
        let x = Dir3::new_normalize(arbitrary.cross(n.as_ref()));
        let y = Dir3::new_normalize(n.as_ref().cross(x.as_ref()));
        Self {
            origin,
            x_dir: x,
            y_dir: y,
            normal_dir: n,
        }
    }

    /// Signed distance from a point to this plane.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.normal_dir.as_ref())
    }
}

impl Surface for Plane {
    fn eval(&self, uv: Point2) -> Point3 {
        self.origin + uv.x * self.x_dir.as_ref() + uv.y * self.y_dir.as_ref()
    }

    fn normal(&self, _uv: Point2) -> Dir3 {
        self.normal_dir
    }

    fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(self.x_dir.as_ref()), d.dot(self.y_dir.as_ref()))
    }

    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        ((-1e10, 1e10), (-1e10, 1e10))
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Plane
    }

    fn clone_box(&self) -> Box<dyn Surface> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn transform(&self, t: &Transform) -> Box<dyn Surface> {
        Box::new(Plane::new(
            t.apply_point(&self.origin),
            t.apply_vec(self.x_dir.as_ref()),
            t.apply_vec(self.y_dir.as_ref()),
        ))
    }
}

/// A cylindrical surface defined by a base point, axis, and radius.
///
/// Parameterization:
/// `P(u, v) = center + radius * (cos(u) * ref_dir + sin(u) * y_dir) + v * axis`
/// with `u ∈ [0, 2π)` and `v` the height along the axis.
#[derive(Debug, Clone)]
pub struct CylinderSurface {
    /// Base point on the cylinder axis.
    pub center: Point3,
    /// Unit direction along the axis.
    pub axis: Dir3,
    /// Reference direction for u = 0 (perpendicular to the axis).
    pub ref_dir: Dir3,
    /// Radius of the cylinder.
    pub radius: f64,
}

impl CylinderSurface {
    /// Cylinder with axis along Z through the origin.
    pub fn new(radius: f64) -> Self {
        Self {
            center: Point3::origin(),
            axis: Dir3::new_normalize(Vec3::z()),
            ref_dir: Dir3::new_normalize(Vec3::x()),
            radius,
        }
    }

    /// Cylinder with a custom base point and axis.
    pub fn with_axis(center: Point3, axis: Vec3, radius: f64) -> Self {
        let a = Dir3::new_normalize(axis);
        let arbitrary = if a.as_ref().x.abs() < 0.9 {
            Vec3::x()
        } else {
            Vec3::y()
        };
        let ref_dir = Dir3::new_normalize(arbitrary - arbitrary.dot(a.as_ref()) * a.as_ref());
        Self {
            center,
            axis: a,
            ref_dir,
            radius,
        }
    }

    fn y_dir(&self) -> Vec3 {
        self.axis.as_ref().cross(self.ref_dir.as_ref())
    }
}

impl Surface for CylinderSurface {
    fn eval(&self, uv: Point2) -> Point3 {
        let (sin_u, cos_u) = uv.x.sin_cos();
        self.center
            + self.radius * (cos_u * self.ref_dir.as_ref() + sin_u * self.y_dir())
            + uv.y * self.axis.as_ref()
    }

    fn normal(&self, uv: Point2) -> Dir3 {
        let (sin_u, cos_u) = uv.x.sin_cos();
        Dir3::new_normalize(cos_u * self.ref_dir.as_ref() + sin_u * self.y_dir())
    }

    fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.center;
        let v = d.dot(self.axis.as_ref());
        let radial = d - v * self.axis.as_ref();
        let mut u = radial
            .dot(&self.y_dir())
            .atan2(radial.dot(self.ref_dir.as_ref()));
        if u < 0.0 {
            u += TAU;
        }
        Point2::new(u, v)
    }

    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        ((0.0, TAU), (-1e10, 1e10))
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Cylinder
    }

    fn clone_box(&self) -> Box<dyn Surface> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn transform(&self, t: &Transform) -> Box<dyn Surface> {
        let new_ref = t.apply_vec(self.ref_dir.as_ref());
        let scale = new_ref.norm();
        Box::new(CylinderSurface {
            center: t.apply_point(&self.center),
            axis: Dir3::new_normalize(t.apply_vec(self.axis.as_ref())),
            ref_dir: Dir3::new_normalize(new_ref),
            radius: self.radius * scale,
        })
    }
}

/// A spherical surface centered at a point.
///
/// Parameterization:
/// `P(u, v) = center + radius * (cos(v)cos(u), cos(v)sin(u), sin(v))`
/// with `u ∈ [0, 2π)` the longitude and `v ∈ [-π/2, π/2]` the latitude.
#[derive(Debug, Clone)]
pub struct SphereSurface {
    /// Center of the sphere.
    pub center: Point3,
    /// Radius of the sphere.
    pub radius: f64,
}

impl SphereSurface {
    /// Sphere centered at the origin.
    pub fn new(radius: f64) -> Self {
        Self {
            center: Point3::origin(),
            radius,
        }
    }

    /// Sphere centered at `center`.
    pub fn with_center(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Surface for SphereSurface {
    fn eval(&self, uv: Point2) -> Point3 {
        let (sin_u, cos_u) = uv.x.sin_cos();
        let (sin_v, cos_v) = uv.y.sin_cos();
        self.center + self.radius * Vec3::new(cos_v * cos_u, cos_v * sin_u, sin_v)
    }

    fn normal(&self, uv: Point2) -> Dir3 {
        let (sin_u, cos_u) = uv.x.sin_cos();
        let (sin_v, cos_v) = uv.y.sin_cos();
        Dir3::new_normalize(Vec3::new(cos_v * cos_u, cos_v * sin_u, sin_v))
    }

    fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.center;
        let norm = d.norm();
        if norm < f64::EPSILON {
            return Point2::new(0.0, 0.0);
        }
        let mut u = d.y.atan2(d.x);
        if u < 0.0 {
            u += TAU;
        }
        let v = (d.z / norm).clamp(-1.0, 1.0).asin();
        Point2::new(u, v)
    }

    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        ((0.0, TAU), (-PI / 2.0, PI / 2.0))
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Sphere
    }

    fn clone_box(&self) -> Box<dyn Surface> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn transform(&self, t: &Transform) -> Box<dyn Surface> {
        Box::new(SphereSurface {
            center: t.apply_point(&self.center),
            radius: self.radius,
        })
    }
}

// =============================================================================
// 3D curves
// =============================================================================

/// The kind of a 3D curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    /// Straight line.
    Line,
    /// Circle.
    Circle,
}

/// A parametric curve in 3D space.
pub trait Curve3: Send + Sync + std::fmt::Debug {
    /// Evaluate the curve at parameter `t`.
    fn eval(&self, t: f64) -> Point3;

    /// Natural parameter domain of the curve.
    fn domain(&self) -> (f64, f64);

    /// The kind of this curve.
    fn kind(&self) -> CurveKind;

    /// Clone this curve into a boxed trait object.
    fn clone_box(&self) -> Box<dyn Curve3>;

    /// Apply an affine transform, returning a new curve.
    fn transform(&self, t: &Transform) -> Box<dyn Curve3>;
}

impl Clone for Box<dyn Curve3> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A straight line `P(t) = origin + t * dir`.
#[derive(Debug, Clone)]
pub struct Line3 {
    /// Point at t = 0.
    pub origin: Point3,
    /// Direction vector (per unit of parameter).
    pub dir: Vec3,
}

impl Line3 {
    /// Line through two points, parameterized so `t ∈ [0, 1]` spans them.
    pub fn from_points(a: Point3, b: Point3) -> Self {
        Self {
            origin: a,
            dir: b - a,
        }
    }

    /// Line through `origin` with unit direction, parameterized by distance.
    pub fn through(origin: Point3, dir: Vec3) -> Self {
        let norm = dir.norm();
        let dir = if norm > f64::EPSILON { dir / norm } else { dir };
        Self { origin, dir }
    }

    /// Parameter of the closest point on the line to `p`.
    pub fn project_param(&self, p: &Point3) -> f64 {
        let len2 = self.dir.norm_squared();
        if len2 < f64::EPSILON {
            return 0.0;
        }
        (p - self.origin).dot(&self.dir) / len2
    }
}

impl Curve3 for Line3 {
    fn eval(&self, t: f64) -> Point3 {
        self.origin + t * self.dir
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn kind(&self) -> CurveKind {
        CurveKind::Line
    }

    fn clone_box(&self) -> Box<dyn Curve3> {
        Box::new(self.clone())
    }

    fn transform(&self, t: &Transform) -> Box<dyn Curve3> {
        Box::new(Line3 {
            origin: t.apply_point(&self.origin),
            dir: t.apply_vec(&self.dir),
        })
    }
}

/// A circle `P(t) = center + radius * (cos(t) * x_dir + sin(t) * y_dir)`.
#[derive(Debug, Clone)]
pub struct Circle3 {
    /// Center of the circle.
    pub center: Point3,
    /// Unit vector at t = 0.
    pub x_dir: Dir3,
    /// Unit vector at t = π/2.
    pub y_dir: Dir3,
    /// Radius.
    pub radius: f64,
}

impl Circle3 {
    /// Circle in the XY plane around `center`.
    pub fn new(center: Point3, radius: f64) -> Self {
        Self {
            center,
            x_dir: Dir3::new_normalize(Vec3::x()),
            y_dir: Dir3::new_normalize(Vec3::y()),
            radius,
        }
    }

    /// Circle in an arbitrary frame.
    pub fn with_frame(center: Point3, x_dir: Vec3, y_dir: Vec3, radius: f64) -> Self {
        Self {
            center,
            x_dir: Dir3::new_normalize(x_dir),
            y_dir: Dir3::new_normalize(y_dir),
            radius,
        }
    }
}

impl Curve3 for Circle3 {
    fn eval(&self, t: f64) -> Point3 {
        let (sin_t, cos_t) = t.sin_cos();
        self.center + self.radius * (cos_t * self.x_dir.as_ref() + sin_t * self.y_dir.as_ref())
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn kind(&self) -> CurveKind {
        CurveKind::Circle
    }

    fn clone_box(&self) -> Box<dyn Curve3> {
        Box::new(self.clone())
    }

    fn transform(&self, t: &Transform) -> Box<dyn Curve3> {
        let new_x = t.apply_vec(self.x_dir.as_ref());
        let scale = new_x.norm();
        Box::new(Circle3 {
            center: t.apply_point(&self.center),
            x_dir: Dir3::new_normalize(new_x),
            y_dir: Dir3::new_normalize(t.apply_vec(self.y_dir.as_ref())),
            radius: self.radius * scale,
        })
    }
}

// =============================================================================
// 2D parameter-space curves (p-curves)
// =============================================================================

/// A curve in the (u, v) parameter space of a surface.
///
/// A p-curve shares the parameter range of the edge it represents, so
/// `surface.eval(pcurve.eval(t))` must track `curve3.eval(t)` within the
/// edge tolerance.
pub trait Curve2: Send + Sync + std::fmt::Debug {
    /// Evaluate the curve at parameter `t`.
    fn eval(&self, t: f64) -> Point2;

    /// Natural parameter domain of the curve.
    fn domain(&self) -> (f64, f64);

    /// Clone this curve into a boxed trait object.
    fn clone_box(&self) -> Box<dyn Curve2>;
}

impl Clone for Box<dyn Curve2> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A straight 2D line `P(t) = origin + t * dir`.
#[derive(Debug, Clone)]
pub struct Line2 {
    /// Point at t = 0.
    pub origin: Point2,
    /// Direction (per unit of parameter).
    pub dir: Vec2,
}

impl Line2 {
    /// Line through two parameter points, `t ∈ [0, 1]` spanning them.
    pub fn from_points(a: Point2, b: Point2) -> Self {
        Self {
            origin: a,
            dir: b - a,
        }
    }

    /// Line with an explicit origin and direction.
    pub fn with_dir(origin: Point2, dir: Vec2) -> Self {
        Self { origin, dir }
    }
}

impl Curve2 for Line2 {
    fn eval(&self, t: f64) -> Point2 {
        self.origin + t * self.dir
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn clone_box(&self) -> Box<dyn Curve2> {
        Box::new(self.clone())
    }
}

/// A circle in parameter space
/// `P(t) = center + radius * (cos(t) * x_dir + sin(t) * y_dir)`.
///
/// Needed for circular edges on planar faces (e.g. cylinder caps), where the
/// projected edge image is an exact circle rather than a line.
#[derive(Debug, Clone)]
pub struct Circle2 {
    /// Center of the circle in parameter space.
    pub center: Point2,
    /// Direction at t = 0.
    pub x_dir: Vec2,
    /// Direction at t = π/2.
    pub y_dir: Vec2,
    /// Radius.
    pub radius: f64,
}

impl Circle2 {
    /// Circle with the standard (u, v) frame.
    pub fn new(center: Point2, radius: f64) -> Self {
        Self {
            center,
            x_dir: Vec2::new(1.0, 0.0),
            y_dir: Vec2::new(0.0, 1.0),
            radius,
        }
    }

    /// Circle with an explicit frame (allows mirrored parameterizations).
    pub fn with_frame(center: Point2, x_dir: Vec2, y_dir: Vec2, radius: f64) -> Self {
        Self {
            center,
            x_dir,
            y_dir,
            radius,
        }
    }
}

impl Curve2 for Circle2 {
    fn eval(&self, t: f64) -> Point2 {
        let (sin_t, cos_t) = t.sin_cos();
        self.center + self.radius * (cos_t * self.x_dir + sin_t * self.y_dir)
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn clone_box(&self) -> Box<dyn Curve2> {
        Box::new(self.clone())
    }
}

/// A sampled 2D polyline over an explicit parameter range.
#[derive(Debug, Clone)]
pub struct Sampled2 {
    /// Sample points, evenly spaced in parameter.
    pub points: Vec<Point2>,
    /// Parameter range covered by the samples.
    pub range: (f64, f64),
}

impl Sampled2 {
    /// Polyline through `points` over the parameter `range`.
    pub fn new(points: Vec<Point2>, range: (f64, f64)) -> Self {
        Self { points, range }
    }
}

impl Curve2 for Sampled2 {
    fn eval(&self, t: f64) -> Point2 {
        if self.points.is_empty() {
            return Point2::new(0.0, 0.0);
        }
        if self.points.len() == 1 {
            return self.points[0];
        }
        let (t0, t1) = self.range;
        let span = t1 - t0;
        let s = if span.abs() < f64::EPSILON {
            0.0
        } else {
            ((t - t0) / span).clamp(0.0, 1.0)
        };
        let scaled = s * (self.points.len() - 1) as f64;
        let idx = (scaled.floor() as usize).min(self.points.len() - 2);
        let frac = scaled - idx as f64;
        let a = self.points[idx];
        let b = self.points[idx + 1];
        Point2::new(a.x + frac * (b.x - a.x), a.y + frac * (b.y - a.y))
    }

    fn domain(&self) -> (f64, f64) {
        self.range
    }

    fn clone_box(&self) -> Box<dyn Curve2> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Geometry store
// =============================================================================

/// Container for the geometric data referenced by a topology.
///
/// Topological entities reference entries by index; indices are stable
/// because entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct GeometryStore {
    /// Surfaces referenced by faces.
    pub surfaces: Vec<Box<dyn Surface>>,
    /// 3D curves referenced by edges.
    pub curves3: Vec<Box<dyn Curve3>>,
    /// 2D parameter-space curves referenced by edge p-curves.
    pub curves2: Vec<Box<dyn Curve2>>,
}

impl GeometryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface, returning its index.
    pub fn add_surface(&mut self, surface: Box<dyn Surface>) -> usize {
        self.surfaces.push(surface);
        self.surfaces.len() - 1
    }

    /// Add a 3D curve, returning its index.
    pub fn add_curve3(&mut self, curve: Box<dyn Curve3>) -> usize {
        self.curves3.push(curve);
        self.curves3.len() - 1
    }

    /// Add a 2D curve, returning its index.
    pub fn add_curve2(&mut self, curve: Box<dyn Curve2>) -> usize {
        self.curves2.push(curve);
        self.curves2.len() - 1
    }

    /// Append a whole store, returning the `(surfaces, curves3, curves2)`
    /// index offsets that entries of `other` received.
    pub fn append(&mut self, other: &GeometryStore) -> (usize, usize, usize) {
        let offsets = (self.surfaces.len(), self.curves3.len(), self.curves2.len());
        self.surfaces.extend(other.surfaces.iter().cloned());
        self.curves3.extend(other.curves3.iter().cloned());
        self.curves2.extend(other.curves2.iter().cloned());
        offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plane_eval_project_roundtrip() {
        let plane = Plane::new(Point3::new(1.0, 2.0, 3.0), Vec3::x(), Vec3::y());
        let uv = Point2::new(0.25, -1.5);
        let p = plane.eval(uv);
        let back = plane.project(&p);
        assert_relative_eq!(back.x, uv.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, uv.y, epsilon = 1e-12);
    }

    #[test]
    fn test_plane_signed_distance() {
        let plane = Plane::new(Point3::origin(), Vec3::x(), Vec3::y());
        assert_relative_eq!(
            plane.signed_distance(&Point3::new(3.0, 4.0, 2.5)),
            2.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_cylinder_eval_project_roundtrip() {
        let cyl = CylinderSurface::new(2.0);
        let uv = Point2::new(1.3, 4.0);
        let p = cyl.eval(uv);
        let back = cyl.project(&p);
        assert_relative_eq!(back.x, uv.x, epsilon = 1e-10);
        assert_relative_eq!(back.y, uv.y, epsilon = 1e-10);
    }

    #[test]
    fn test_cylinder_normal_is_radial() {
        let cyl = CylinderSurface::new(2.0);
        let n = cyl.normal(Point2::new(0.0, 5.0));
        assert_relative_eq!(n.as_ref().x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(n.as_ref().z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_eval_on_radius() {
        let sphere = SphereSurface::new(3.0);
        let p = sphere.eval(Point2::new(0.7, 0.4));
        assert_relative_eq!((p - Point3::origin()).norm(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_project_poles() {
        let sphere = SphereSurface::new(1.0);
        let north = sphere.project(&Point3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(north.y, PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_line3_from_points_unit_range() {
        let line = Line3::from_points(Point3::origin(), Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(line.eval(0.5).x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(line.project_param(&Point3::new(1.0, 5.0, 0.0)), 0.5);
    }

    #[test]
    fn test_circle3_eval() {
        let circle = Circle3::new(Point3::origin(), 2.0);
        let p = circle.eval(PI / 2.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sampled2_interpolates() {
        let poly = Sampled2::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
            ],
            (0.0, 2.0),
        );
        let mid = poly.eval(1.0);
        assert_relative_eq!(mid.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(mid.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_store_append_offsets() {
        let mut a = GeometryStore::new();
        a.add_surface(Box::new(Plane::new(Point3::origin(), Vec3::x(), Vec3::y())));
        let mut b = GeometryStore::new();
        b.add_surface(Box::new(SphereSurface::new(1.0)));
        b.add_curve3(Box::new(Line3::from_points(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        )));
        let (surf_off, curve3_off, curve2_off) = a.append(&b);
        assert_eq!((surf_off, curve3_off, curve2_off), (1, 0, 0));
        assert_eq!(a.surfaces.len(), 2);
        assert_eq!(a.curves3.len(), 1);
    }

    #[test]
    fn test_u_periodicity() {
        assert!(!is_u_periodic(&Plane::new(
            Point3::origin(),
            Vec3::x(),
            Vec3::y()
        )));
        assert!(is_u_periodic(&CylinderSurface::new(1.0)));
        assert!(is_u_periodic(&SphereSurface::new(1.0)));
    }
}
