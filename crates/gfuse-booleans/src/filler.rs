//! Stage 1 of the pipeline: pairwise intersection of the arguments.
//!
//! The pave filler walks every argument pair, filters candidate face pairs
//! by bounding box, intersects their surfaces, and trims the section curves
//! to the part of both faces' domains they actually cross. The collected
//! [`IntersectionData`] is what the build stage consumes.

use rayon::prelude::*;

use gfuse_math::Tolerance;
use gfuse_primitives::Brep;
use gfuse_topo::{FaceId, ShapeRef};

use crate::bbox::{candidate_face_pairs, shape_aabb};
use crate::report::Report;
use crate::ssi::{intersect_surfaces, Intersection};
use crate::trim::{trim_curve_in_window, trim_curve_to_face, Section};

/// Gluing mode: when not `Off`, the arguments are declared interference-free
/// (except for coincident walls) and the intersection search is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Glue {
    /// Normal operation: intersections are computed.
    #[default]
    Off,
    /// Arguments may only touch through coincident sub-shapes.
    Shift,
    /// Arguments are topologically sewn already.
    Full,
}

/// Section curves attached to one face of one argument.
#[derive(Debug, Clone)]
pub struct FaceSections {
    /// Index of the argument the face belongs to.
    pub argument: usize,
    /// The face to be split.
    pub face: FaceId,
    /// Trimmed section intervals crossing the face.
    pub sections: Vec<Section>,
}

/// Result of the intersection stage.
#[derive(Debug, Clone, Default)]
pub struct IntersectionData {
    entries: Vec<FaceSections>,
}

impl IntersectionData {
    /// Whether no face acquired any section.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All per-face section lists.
    pub fn entries(&self) -> &[FaceSections] {
        &self.entries
    }

    /// Section lists belonging to one argument.
    pub fn for_argument(&self, argument: usize) -> impl Iterator<Item = &FaceSections> {
        self.entries
            .iter()
            .filter(move |e| e.argument == argument)
    }

    /// Total number of trimmed sections.
    pub fn total_sections(&self) -> usize {
        self.entries.iter().map(|e| e.sections.len()).sum()
    }

    fn push(&mut self, argument: usize, face: FaceId, sections: &[Section]) {
        if sections.is_empty() {
            return;
        }
        match self
            .entries
            .iter_mut()
            .find(|e| e.argument == argument && e.face == face)
        {
            Some(entry) => entry.sections.extend(sections.iter().cloned()),
            None => self.entries.push(FaceSections {
                argument,
                face,
                sections: sections.to_vec(),
            }),
        }
    }
}

enum PairOutcome {
    Empty,
    Unsupported(FaceId, FaceId),
    Sections(FaceId, FaceId, Vec<Section>),
}

/// Stage 1: pairwise pave filling over the argument shapes.
#[derive(Debug, Default)]
pub struct PaveFiller {
    arguments: Vec<Brep>,
    run_parallel: bool,
    fuzzy: f64,
    non_destructive: bool,
    glue: Glue,
    report: Report,
    data: Option<IntersectionData>,
}

impl PaveFiller {
    /// Filler with no arguments and default options.
    pub fn new() -> Self {
        Self {
            fuzzy: Tolerance::CONFUSION,
            ..Self::default()
        }
    }

    /// Set the shapes to intersect.
    pub fn set_arguments(&mut self, arguments: Vec<Brep>) {
        self.arguments = arguments;
    }

    /// The argument shapes.
    pub fn arguments(&self) -> &[Brep] {
        &self.arguments
    }

    /// Toggle parallel execution of the face-pair loop.
    pub fn set_run_parallel(&mut self, flag: bool) {
        self.run_parallel = flag;
    }

    /// Whether the face-pair loop runs in parallel.
    pub fn run_parallel(&self) -> bool {
        self.run_parallel
    }

    /// Set the fuzzy tolerance added to pairwise comparisons.
    ///
    /// Negative values are clamped to zero (the default coincidence
    /// tolerance still applies).
    pub fn set_fuzzy_value(&mut self, fuzzy: f64) {
        self.fuzzy = fuzzy.max(0.0);
    }

    /// The fuzzy tolerance.
    pub fn fuzzy_value(&self) -> f64 {
        self.fuzzy
    }

    /// When set, the arguments are never modified (tolerance absorption is
    /// skipped).
    pub fn set_non_destructive(&mut self, flag: bool) {
        self.non_destructive = flag;
    }

    /// Whether the arguments are protected from modification.
    pub fn non_destructive(&self) -> bool {
        self.non_destructive
    }

    /// Set the gluing mode.
    pub fn set_glue(&mut self, glue: Glue) {
        self.glue = glue;
    }

    /// The gluing mode.
    pub fn glue(&self) -> Glue {
        self.glue
    }

    /// The stage report.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Whether the stage failed.
    pub fn has_errors(&self) -> bool {
        self.report.has_fails()
    }

    /// The intersection result, once `perform` has run successfully.
    pub fn data(&self) -> Option<&IntersectionData> {
        self.data.as_ref()
    }

    /// Run the intersection stage.
    pub fn perform(&mut self) {
        self.report = Report::new();
        self.data = None;

        if self.arguments.is_empty() {
            self.report
                .add_fail("no arguments for the intersection stage", Vec::new());
            return;
        }

        let tol = self.fuzzy.max(Tolerance::CONFUSION);
        let mut data = IntersectionData::default();
        let mut touched: Vec<(usize, FaceId)> = Vec::new();

        if self.glue == Glue::Off {
            for i in 0..self.arguments.len() {
                for j in i + 1..self.arguments.len() {
                    let a = &self.arguments[i];
                    let b = &self.arguments[j];
                    let mut box_a = shape_aabb(a);
                    box_a.expand(tol);
                    let box_b = shape_aabb(b);
                    if !box_a.overlaps(&box_b) {
                        continue;
                    }

                    let pairs = candidate_face_pairs(a, b, tol);
                    let process = |&(fa, fb): &(FaceId, FaceId)| -> PairOutcome {
                        match intersect_surfaces(a.surface_of(fa), b.surface_of(fb)) {
                            Intersection::Empty => PairOutcome::Empty,
                            Intersection::Unsupported => PairOutcome::Unsupported(fa, fb),
                            Intersection::Curves(curves) => {
                                let mut sections = Vec::new();
                                for curve in &curves {
                                    for run in trim_curve_to_face(a, fa, curve, 128, tol) {
                                        sections.extend(trim_curve_in_window(
                                            b,
                                            fb,
                                            curve,
                                            (run.t0, run.t1),
                                            64,
                                        ));
                                    }
                                }
                                PairOutcome::Sections(fa, fb, sections)
                            }
                        }
                    };
                    let outcomes: Vec<PairOutcome> = if self.run_parallel {
                        pairs.par_iter().map(process).collect()
                    } else {
                        pairs.iter().map(process).collect()
                    };

                    for outcome in outcomes {
                        match outcome {
                            PairOutcome::Empty => {}
                            PairOutcome::Unsupported(fa, fb) => {
                                self.report.add_warning(
                                    "intersection of this surface pair is not supported",
                                    vec![ShapeRef::Face(fa), ShapeRef::Face(fb)],
                                );
                            }
                            PairOutcome::Sections(fa, fb, sections) => {
                                if !sections.is_empty() {
                                    data.push(i, fa, &sections);
                                    data.push(j, fb, &sections);
                                    touched.push((i, fa));
                                    touched.push((j, fb));
                                }
                            }
                        }
                    }
                }
            }
        }

        // Absorb the fuzzy value into the tolerances of the sub-shapes that
        // actually interact, unless the arguments are protected.
        if !self.non_destructive && self.fuzzy > Tolerance::CONFUSION {
            let fuzzy = self.fuzzy;
            for (argument, face) in touched {
                let brep = &mut self.arguments[argument];
                let f = &mut brep.topology.faces[face];
                f.tolerance = f.tolerance.max(fuzzy);
                for (edge, _) in brep.topology.face_edges(face) {
                    let e = &mut brep.topology.edges[edge];
                    e.tolerance = e.tolerance.max(fuzzy);
                }
            }
        }

        self.data = Some(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfuse_primitives::make_box;

    #[test]
    fn test_no_arguments_is_an_error() {
        let mut filler = PaveFiller::new();
        filler.perform();
        assert!(filler.has_errors());
        assert!(filler.data().is_none());
    }

    #[test]
    fn test_disjoint_boxes_have_no_sections() {
        let mut filler = PaveFiller::new();
        filler.set_arguments(vec![
            make_box(1.0, 1.0, 1.0),
            make_box(1.0, 1.0, 1.0).translated(5.0, 0.0, 0.0),
        ]);
        filler.perform();
        assert!(!filler.has_errors());
        assert!(filler.data().unwrap().is_empty());
    }

    #[test]
    fn test_overlapping_boxes_have_sections() {
        let mut filler = PaveFiller::new();
        filler.set_arguments(vec![
            make_box(2.0, 2.0, 2.0),
            make_box(2.0, 2.0, 2.0).translated(1.0, 1.0, 1.0),
        ]);
        filler.perform();
        assert!(!filler.has_errors());
        let data = filler.data().unwrap();
        assert!(!data.is_empty());
        assert!(data.total_sections() > 0);
        // Both arguments acquired sections.
        assert!(data.for_argument(0).count() > 0);
        assert!(data.for_argument(1).count() > 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let args = vec![
            make_box(2.0, 2.0, 2.0),
            make_box(2.0, 2.0, 2.0).translated(1.0, 1.0, 1.0),
        ];
        let mut sequential = PaveFiller::new();
        sequential.set_arguments(args.clone());
        sequential.perform();
        let mut parallel = PaveFiller::new();
        parallel.set_arguments(args);
        parallel.set_run_parallel(true);
        parallel.perform();
        assert_eq!(
            sequential.data().unwrap().total_sections(),
            parallel.data().unwrap().total_sections()
        );
    }

    #[test]
    fn test_glue_skips_intersection() {
        let mut filler = PaveFiller::new();
        filler.set_glue(Glue::Full);
        filler.set_arguments(vec![
            make_box(2.0, 2.0, 2.0),
            make_box(2.0, 2.0, 2.0).translated(1.0, 1.0, 1.0),
        ]);
        filler.perform();
        assert!(!filler.has_errors());
        assert!(filler.data().unwrap().is_empty());
    }

    #[test]
    fn test_negative_fuzzy_is_clamped() {
        let mut filler = PaveFiller::new();
        filler.set_fuzzy_value(-0.5);
        assert_eq!(filler.fuzzy_value(), 0.0);
    }
}
