//! Trimming of section curves to face domains.
//!
//! A section curve is clipped to the part of the supporting surface that a
//! face actually occupies, by sampling the curve and testing the samples
//! against the face's parameter-space boundary.

use gfuse_geom::Surface;
use gfuse_math::{
    poly::{point_in_polygon, polygon_area},
    Point2,
};
use gfuse_primitives::Brep;
use gfuse_topo::FaceId;

use crate::bbox::{face_aabb, Aabb3};
use crate::ssi::SectionCurve;

/// A section curve restricted to a parameter interval.
#[derive(Debug, Clone)]
pub struct Section {
    /// The supporting curve.
    pub curve: SectionCurve,
    /// Interval start.
    pub t0: f64,
    /// Interval end.
    pub t1: f64,
}

impl Section {
    /// Point at the start of the interval.
    pub fn start(&self) -> gfuse_math::Point3 {
        self.curve.eval(self.t0)
    }

    /// Point at the end of the interval.
    pub fn end(&self) -> gfuse_math::Point3 {
        self.curve.eval(self.t1)
    }

    /// Point at the middle of the interval.
    pub fn midpoint(&self) -> gfuse_math::Point3 {
        self.curve.eval(0.5 * (self.t0 + self.t1))
    }
}

/// Boundary polygons of a face in parameter space: outer, then holes.
fn face_polygons(brep: &Brep, face: FaceId, samples_per_edge: usize) -> Vec<Vec<Point2>> {
    let mut polygons = vec![brep.face_uv_polygon(face, samples_per_edge)];
    for &hole in &brep.topology.faces[face].holes {
        polygons.push(brep.wire_uv_polygon(face, hole, samples_per_edge));
    }
    polygons
}

/// Whether a parameter point lies inside the face boundary.
///
/// Faces whose outer boundary degenerates in parameter space (a seam-only
/// boundary sampled too coarsely) are treated as covering their whole
/// surface domain.
pub fn point_in_face_uv(brep: &Brep, face: FaceId, uv: &Point2) -> bool {
    let polygons = face_polygons(brep, face, 8);
    let outer = &polygons[0];
    if outer.len() < 3 || polygon_area(outer).abs() < 1e-12 {
        let ((umin, umax), (vmin, vmax)) = brep.surface_of(face).domain();
        return uv.x >= umin && uv.x <= umax && uv.y >= vmin && uv.y <= vmax;
    }
    if !point_in_polygon(uv, outer) {
        return false;
    }
    polygons[1..].iter().all(|hole| !point_in_polygon(uv, hole))
}

/// Parameter window of a line clipped against an axis-aligned box.
fn clip_line_to_aabb(line: &gfuse_geom::Line3, aabb: &Aabb3) -> Option<(f64, f64)> {
    let mut t0 = f64::MIN;
    let mut t1 = f64::MAX;
    let origin = [line.origin.x, line.origin.y, line.origin.z];
    let dir = [line.dir.x, line.dir.y, line.dir.z];
    let min = [aabb.min.x, aabb.min.y, aabb.min.z];
    let max = [aabb.max.x, aabb.max.y, aabb.max.z];
    for axis in 0..3 {
        if dir[axis].abs() < 1e-12 {
            if origin[axis] < min[axis] || origin[axis] > max[axis] {
                return None;
            }
            continue;
        }
        let a = (min[axis] - origin[axis]) / dir[axis];
        let b = (max[axis] - origin[axis]) / dir[axis];
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        t0 = t0.max(lo);
        t1 = t1.min(hi);
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Minimum parameter span a trimmed interval must have to be kept.
const MIN_SPAN: f64 = 1e-6;

/// Restrict a section curve to the intervals lying inside a face.
pub fn trim_curve_to_face(
    brep: &Brep,
    face: FaceId,
    curve: &SectionCurve,
    samples: usize,
    tol: f64,
) -> Vec<Section> {
    let window = match curve {
        SectionCurve::Line(line) => {
            let mut aabb = face_aabb(brep, face);
            aabb.expand(tol.max(1e-9) * 10.0);
            match clip_line_to_aabb(line, &aabb) {
                Some(window) => window,
                None => return Vec::new(),
            }
        }
        SectionCurve::Circle(_) => (0.0, std::f64::consts::TAU),
    };
    trim_curve_in_window(brep, face, curve, window, samples)
}

/// Restrict a section curve to the intervals of `window` lying inside a
/// face. Used to refine an interval already trimmed to the partner face.
pub fn trim_curve_in_window(
    brep: &Brep,
    face: FaceId,
    curve: &SectionCurve,
    window: (f64, f64),
    samples: usize,
) -> Vec<Section> {
    let (w0, w1) = window;
    if w1 - w0 < MIN_SPAN {
        return Vec::new();
    }

    let surface = brep.surface_of(face);
    let samples = samples.max(2);
    let step = (w1 - w0) / samples as f64;
    let mut sections = Vec::new();
    let mut run_start: Option<f64> = None;
    for k in 0..=samples {
        let t = w0 + step * k as f64;
        let uv = surface.project(&curve.eval(t));
        let inside = point_in_face_uv(brep, face, &uv);
        match (inside, run_start) {
            (true, None) => run_start = Some(t),
            (false, Some(start)) => {
                let end = t - step;
                if end - start > MIN_SPAN {
                    sections.push(Section {
                        curve: curve.clone(),
                        t0: start,
                        t1: end,
                    });
                }
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        if w1 - start > MIN_SPAN {
            sections.push(Section {
                curve: curve.clone(),
                t0: start,
                t1: w1,
            });
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfuse_geom::Line3;
    use gfuse_math::{Point3, Vec3};
    use gfuse_primitives::make_box;

    #[test]
    fn test_clip_line_to_aabb() {
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
        let line = Line3::through(Point3::new(-1.0, 1.0, 1.0), Vec3::x());
        let (t0, t1) = clip_line_to_aabb(&line, &aabb).unwrap();
        assert!((t0 - 1.0).abs() < 1e-9);
        assert!((t1 - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_line_misses() {
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
        let line = Line3::through(Point3::new(-1.0, 5.0, 1.0), Vec3::x());
        assert!(clip_line_to_aabb(&line, &aabb).is_none());
    }

    #[test]
    fn test_trim_line_through_box_face() {
        // The bottom face of a 2x2x2 box, cut by a line along y at x = 1.
        let brep = make_box(2.0, 2.0, 2.0);
        let bottom = brep
            .faces()
            .into_iter()
            .find(|&f| {
                let aabb = face_aabb(&brep, f);
                aabb.max.z < 1e-9
            })
            .unwrap();
        let line = SectionCurve::Line(Line3::through(
            Point3::new(1.0, -5.0, 0.0),
            Vec3::y(),
        ));
        let sections = trim_curve_to_face(&brep, bottom, &line, 64, 1e-7);
        assert_eq!(sections.len(), 1);
        let section = &sections[0];
        let len = (section.end() - section.start()).norm();
        assert!(
            (len - 2.0).abs() < 0.2,
            "expected span close to the face width, got {len}"
        );
        assert!(point_in_face_uv(
            &brep,
            bottom,
            &brep.surface_of(bottom).project(&section.midpoint())
        ));
    }

    #[test]
    fn test_trim_line_outside_face() {
        let brep = make_box(2.0, 2.0, 2.0);
        let bottom = brep
            .faces()
            .into_iter()
            .find(|&f| face_aabb(&brep, f).max.z < 1e-9)
            .unwrap();
        let line = SectionCurve::Line(Line3::through(
            Point3::new(10.0, -5.0, 0.0),
            Vec3::y(),
        ));
        assert!(trim_curve_to_face(&brep, bottom, &line, 64, 1e-7).is_empty());
    }
}
