//! Surface–surface intersection for the analytic surface pairs the
//! intersection stage supports.

use gfuse_geom::{
    Circle3, Curve3, CylinderSurface, Line3, Plane, SphereSurface, Surface, SurfaceKind,
};
use gfuse_math::{Point3, Tolerance};

/// A section curve produced by intersecting two surfaces.
#[derive(Debug, Clone)]
pub enum SectionCurve {
    /// Straight section, parameterized by distance along the line.
    Line(Line3),
    /// Circular section, parameterized by angle.
    Circle(Circle3),
}

impl SectionCurve {
    /// Evaluate the curve at parameter `t`.
    pub fn eval(&self, t: f64) -> Point3 {
        match self {
            SectionCurve::Line(line) => line.eval(t),
            SectionCurve::Circle(circle) => circle.eval(t),
        }
    }

    /// Natural parameter domain (lines are unbounded).
    pub fn domain(&self) -> Option<(f64, f64)> {
        match self {
            SectionCurve::Line(_) => None,
            SectionCurve::Circle(_) => Some((0.0, std::f64::consts::TAU)),
        }
    }
}

/// Result of intersecting a pair of surfaces.
#[derive(Debug, Clone)]
pub enum Intersection {
    /// The surfaces do not intersect (or coincide; coincident overlap is
    /// resolved by same-domain merging, not by sections).
    Empty,
    /// One or more section curves.
    Curves(Vec<SectionCurve>),
    /// The pair is outside the supported analytic combinations.
    Unsupported,
}

/// Intersect two surfaces.
pub fn intersect_surfaces(a: &dyn Surface, b: &dyn Surface) -> Intersection {
    match (a.kind(), b.kind()) {
        (SurfaceKind::Plane, SurfaceKind::Plane) => {
            let pa = downcast_plane(a);
            let pb = downcast_plane(b);
            match (pa, pb) {
                (Some(pa), Some(pb)) => plane_plane(pa, pb),
                _ => Intersection::Unsupported,
            }
        }
        (SurfaceKind::Plane, SurfaceKind::Sphere) => plane_sphere(a, b),
        (SurfaceKind::Sphere, SurfaceKind::Plane) => plane_sphere(b, a),
        (SurfaceKind::Plane, SurfaceKind::Cylinder) => plane_cylinder(a, b),
        (SurfaceKind::Cylinder, SurfaceKind::Plane) => plane_cylinder(b, a),
        _ => Intersection::Unsupported,
    }
}

fn downcast_plane(s: &dyn Surface) -> Option<&Plane> {
    s.as_any().downcast_ref::<Plane>()
}

fn plane_plane(a: &Plane, b: &Plane) -> Intersection {
    let na = a.normal_dir.as_ref();
    let nb = b.normal_dir.as_ref();
    let dir = na.cross(nb);
    if dir.norm() < Tolerance::ANGULAR.max(1e-12) {
        // Parallel (possibly coincident) planes produce no section curve.
        return Intersection::Empty;
    }
    // Solve for a point on both planes: p = c1 * na + c2 * nb.
    let h1 = na.dot(&(a.origin - Point3::origin()));
    let h2 = nb.dot(&(b.origin - Point3::origin()));
    let nanb = na.dot(nb);
    let denom = 1.0 - nanb * nanb;
    let c1 = (h1 - h2 * nanb) / denom;
    let c2 = (h2 - h1 * nanb) / denom;
    let point = Point3::origin() + c1 * na + c2 * nb;
    Intersection::Curves(vec![SectionCurve::Line(Line3::through(point, dir))])
}

fn plane_sphere(plane: &dyn Surface, sphere: &dyn Surface) -> Intersection {
    let (Some(plane), Some(sphere)) = (
        downcast_plane(plane),
        sphere.as_any().downcast_ref::<SphereSurface>(),
    ) else {
        return Intersection::Unsupported;
    };
    let dist = plane.signed_distance(&sphere.center);
    if dist.abs() >= sphere.radius - Tolerance::CONFUSION {
        // Missing or merely tangent: no usable section.
        return Intersection::Empty;
    }
    let radius = (sphere.radius * sphere.radius - dist * dist).sqrt();
    let center = sphere.center - dist * plane.normal_dir.as_ref();
    Intersection::Curves(vec![SectionCurve::Circle(Circle3::with_frame(
        center,
        *plane.x_dir.as_ref(),
        *plane.y_dir.as_ref(),
        radius,
    ))])
}

fn plane_cylinder(plane: &dyn Surface, cylinder: &dyn Surface) -> Intersection {
    let (Some(plane), Some(cylinder)) = (
        downcast_plane(plane),
        cylinder.as_any().downcast_ref::<CylinderSurface>(),
    ) else {
        return Intersection::Unsupported;
    };
    let n = plane.normal_dir.as_ref();
    let axis = cylinder.axis.as_ref();
    let axis_dot = n.dot(axis).abs();

    if axis_dot > 1.0 - 1e-9 {
        // Axis normal to the plane: circular section.
        let dist = plane.signed_distance(&cylinder.center);
        let center = cylinder.center - dist * n;
        let y_dir = axis.cross(cylinder.ref_dir.as_ref());
        return Intersection::Curves(vec![SectionCurve::Circle(Circle3::with_frame(
            center,
            *cylinder.ref_dir.as_ref(),
            y_dir,
            cylinder.radius,
        ))]);
    }

    if axis_dot < 1e-9 {
        // Axis parallel to the plane: zero, one, or two straight rulings.
        // Signed distance along u is d0 + r*cos(u - phi).
        let d0 = plane.signed_distance(&cylinder.center);
        let a = cylinder.radius * n.dot(cylinder.ref_dir.as_ref());
        let b = cylinder.radius * n.dot(&axis.cross(cylinder.ref_dir.as_ref()));
        let amplitude = (a * a + b * b).sqrt();
        if amplitude < Tolerance::CONFUSION || d0.abs() >= amplitude - Tolerance::CONFUSION {
            return Intersection::Empty;
        }
        let phi = b.atan2(a);
        let delta = (-d0 / amplitude).clamp(-1.0, 1.0).acos();
        let mut curves = Vec::new();
        for u in [phi + delta, phi - delta] {
            let origin = cylinder.center
                + cylinder.radius
                    * (u.cos() * cylinder.ref_dir.as_ref()
                        + u.sin() * axis.cross(cylinder.ref_dir.as_ref()));
            curves.push(SectionCurve::Line(Line3::through(origin, *axis)));
        }
        return Intersection::Curves(curves);
    }

    // Oblique plane/cylinder sections are elliptic; not supported.
    Intersection::Unsupported
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfuse_math::Vec3;

    #[test]
    fn test_plane_plane_line() {
        let a = Plane::new(Point3::origin(), Vec3::x(), Vec3::y());
        let b = Plane::new(Point3::new(0.0, 0.0, 0.0), Vec3::y(), Vec3::z());
        let Intersection::Curves(curves) = plane_plane(&a, &b) else {
            panic!("expected curves");
        };
        assert_eq!(curves.len(), 1);
        // Both planes contain the Y axis.
        let p = curves[0].eval(2.0);
        assert!(p.x.abs() < 1e-9 && p.z.abs() < 1e-9);
    }

    #[test]
    fn test_parallel_planes_empty() {
        let a = Plane::new(Point3::origin(), Vec3::x(), Vec3::y());
        let b = Plane::new(Point3::new(0.0, 0.0, 2.0), Vec3::x(), Vec3::y());
        assert!(matches!(plane_plane(&a, &b), Intersection::Empty));
    }

    #[test]
    fn test_plane_sphere_circle() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 1.0), Vec3::x(), Vec3::y());
        let sphere = SphereSurface::new(2.0);
        let result = intersect_surfaces(&plane, &sphere);
        let Intersection::Curves(curves) = result else {
            panic!("expected curves");
        };
        let SectionCurve::Circle(circle) = &curves[0] else {
            panic!("expected a circle");
        };
        assert!((circle.radius - 3.0_f64.sqrt()).abs() < 1e-9);
        assert!((circle.center.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_plane_missing_sphere_empty() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 5.0), Vec3::x(), Vec3::y());
        let sphere = SphereSurface::new(2.0);
        assert!(matches!(
            intersect_surfaces(&plane, &sphere),
            Intersection::Empty
        ));
    }

    #[test]
    fn test_plane_cylinder_two_rulings() {
        // Vertical cylinder cut by a vertical plane through x = 0.5.
        let plane = Plane::new(Point3::new(0.5, 0.0, 0.0), Vec3::y(), Vec3::z());
        let cylinder = CylinderSurface::new(1.0);
        let Intersection::Curves(curves) = intersect_surfaces(&plane, &cylinder) else {
            panic!("expected curves");
        };
        assert_eq!(curves.len(), 2);
        for curve in &curves {
            let p = curve.eval(0.0);
            assert!((p.x - 0.5).abs() < 1e-9, "ruling not on plane: {p:?}");
            assert!((p.x * p.x + p.y * p.y - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_plane_cylinder_cap_circle() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 2.0), Vec3::x(), Vec3::y());
        let cylinder = CylinderSurface::new(1.5);
        let Intersection::Curves(curves) = intersect_surfaces(&plane, &cylinder) else {
            panic!("expected curves");
        };
        let SectionCurve::Circle(circle) = &curves[0] else {
            panic!("expected a circle");
        };
        assert!((circle.radius - 1.5).abs() < 1e-9);
        assert!((circle.center.z - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_pair() {
        let a = SphereSurface::new(1.0);
        let b = SphereSurface::new(1.0);
        assert!(matches!(
            intersect_surfaces(&a, &b),
            Intersection::Unsupported
        ));
    }
}
