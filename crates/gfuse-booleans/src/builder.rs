//! Stage 2 of the pipeline: building the General Fuse result.
//!
//! The builder copies every argument into a fresh result topology, splits
//! argument faces along the section curves the filler collected, merges
//! same-domain sub-shapes, and exposes the result as a compound of the
//! rebuilt solids.

use rayon::prelude::*;

use gfuse_math::Tolerance;
use gfuse_primitives::Brep;
use gfuse_tessellate::tessellate;
use gfuse_topo::{copy_shape_with_map, ShapeRef, StoreOffsets, Topology};

use gfuse_geom::GeometryStore;

use crate::filler::PaveFiller;
use crate::merge;
use crate::report::Report;
use crate::split::split_planar_face;
use crate::trim::Section;

/// Pipeline tracing, compiled in only with the `debug-fuse` feature.
#[allow(unused_macros)]
#[cfg(feature = "debug-fuse")]
macro_rules! debug_fuse {
    ($($arg:tt)*) => {
        eprintln!($($arg)*)
    };
}

/// No-op version when the `debug-fuse` feature is disabled.
#[allow(unused_macros)]
#[cfg(not(feature = "debug-fuse"))]
macro_rules! debug_fuse {
    ($($arg:tt)*) => {};
}

/// Mapping from argument faces to the result faces they became.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

/// One source-face-to-result-face record.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Index of the source argument.
    pub argument: usize,
    /// The face in the argument's own topology.
    pub source: ShapeRef,
    /// The face it became in the result topology.
    pub result: ShapeRef,
}

impl History {
    /// All records.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Result shapes a given argument face was modified into.
    pub fn modified(&self, argument: usize, source: ShapeRef) -> Vec<ShapeRef> {
        self.entries
            .iter()
            .filter(|e| e.argument == argument && e.source == source)
            .map(|e| e.result)
            .collect()
    }
}

/// Stage 2: the General Fuse result builder.
#[derive(Debug)]
pub struct FuseBuilder {
    run_parallel: bool,
    check_inverted: bool,
    fill_history: bool,
    report: Report,
    result: Option<Brep>,
    history: Option<History>,
}

impl Default for FuseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FuseBuilder {
    /// Builder with default options (inverted-solid checking on).
    pub fn new() -> Self {
        Self {
            run_parallel: false,
            check_inverted: true,
            fill_history: false,
            report: Report::new(),
            result: None,
            history: None,
        }
    }

    /// Toggle parallel execution of the post-build checks.
    pub fn set_run_parallel(&mut self, flag: bool) {
        self.run_parallel = flag;
    }

    /// Toggle the inverted-solid warning.
    pub fn set_check_inverted(&mut self, flag: bool) {
        self.check_inverted = flag;
    }

    /// Toggle recording of the face modification history.
    pub fn set_fill_history(&mut self, flag: bool) {
        self.fill_history = flag;
    }

    /// The stage report.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Whether the stage failed.
    pub fn has_errors(&self) -> bool {
        self.report.has_fails()
    }

    /// The built shape, if the stage succeeded.
    pub fn shape(&self) -> Option<&Brep> {
        self.result.as_ref()
    }

    /// Take ownership of the built shape.
    pub fn take_shape(&mut self) -> Option<Brep> {
        self.result.take()
    }

    /// The face modification history, when `fill_history` was on.
    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    /// Build the fused shape from a performed pave filler.
    pub fn perform_with_filler(&mut self, filler: &PaveFiller) {
        self.report = Report::new();
        self.result = None;
        self.history = None;

        let Some(data) = filler.data() else {
            self.report.add_fail(
                "intersection data missing; run the pave filler first",
                Vec::new(),
            );
            return;
        };
        let arguments = filler.arguments();
        if arguments.is_empty() {
            self.report.add_fail("no arguments to build from", Vec::new());
            return;
        }

        // Copy every argument into the result, remembering where its faces
        // with pending sections ended up.
        let mut topology = Topology::new();
        let mut geometry = GeometryStore::new();
        let mut roots = Vec::new();
        let mut pending: Vec<(usize, ShapeRef, gfuse_topo::FaceId, Vec<Section>)> = Vec::new();
        for (argument, brep) in arguments.iter().enumerate() {
            let (surfaces, curves3, curves2) = geometry.append(&brep.geometry);
            let offsets = StoreOffsets {
                surfaces,
                curves3,
                curves2,
            };
            let (root, map) = copy_shape_with_map(&brep.topology, brep.root, &mut topology, offsets);
            roots.push(root);
            for entry in data.for_argument(argument) {
                if let Some(&ShapeRef::Face(face)) = map.get(&ShapeRef::Face(entry.face)) {
                    pending.push((
                        argument,
                        ShapeRef::Face(entry.face),
                        face,
                        entry.sections.clone(),
                    ));
                }
            }
        }
        let compound = topology.add_compound(roots.clone());
        let mut result = Brep::new(topology, geometry, ShapeRef::Compound(compound));
        debug_fuse!(
            "builder: {} arguments, {} faces with sections",
            arguments.len(),
            pending.len()
        );

        // Split faces along their sections.
        let mut history = History::default();
        for (argument, source, face, sections) in pending {
            let mut current = vec![face];
            for section in &sections {
                let mut next = Vec::new();
                for f in current {
                    if result.topology.faces.contains_key(f) {
                        next.extend(split_planar_face(&mut result, f, section));
                    }
                }
                current = next;
            }
            let was_split = current.len() != 1 || current[0] != face;
            if self.fill_history && was_split {
                for f in &current {
                    history.entries.push(HistoryEntry {
                        argument,
                        source,
                        result: ShapeRef::Face(*f),
                    });
                }
            }
        }

        // Same-domain merging across the whole result.
        let tol = filler.fuzzy_value().max(Tolerance::CONFUSION);
        let _merged = merge::unify(&mut result, tol);
        debug_fuse!("builder: merged {} same-domain sub-shapes", _merged);

        if result.faces().is_empty() {
            self.report.add_fail("the built shape is empty", Vec::new());
            return;
        }

        if self.check_inverted {
            let solids: Vec<ShapeRef> = roots
                .iter()
                .copied()
                .filter(|r| matches!(r, ShapeRef::Solid(_)))
                .collect();
            let volume_of = |root: &ShapeRef| -> (ShapeRef, f64) {
                let view = Brep::new(result.topology.clone(), result.geometry.clone(), *root);
                (*root, tessellate(&view, 16).volume())
            };
            let volumes: Vec<(ShapeRef, f64)> = if self.run_parallel {
                solids.par_iter().map(volume_of).collect()
            } else {
                solids.iter().map(volume_of).collect()
            };
            for (root, volume) in volumes {
                if volume < 0.0 {
                    self.report
                        .add_warning("inverted solid in the result", vec![root]);
                }
            }
        }

        if self.fill_history {
            self.history = Some(history);
        }
        self.result = Some(result);
    }
}
