//! The fuse-and-check diagnostic pipeline.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use gfuse_booleans::{FuseBuilder, Glue, Gravity, PaveFiller, Report};
use gfuse_check::{Analyzer, CheckOptions};
use gfuse_math::Tolerance;
use gfuse_primitives::Brep;
use gfuse_topo::{copy_shape, ShapeRef, StoreOffsets, Topology};

use crate::dump::contextual_dump;
use crate::error::PipelineError;
use crate::errors::{collect_errors, collect_failures, ShapeError};

/// Verdict of a completed scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The fused shape passed the check.
    Valid,
    /// The fused shape has faults; `dump` holds the rendered fault list
    /// (or the one-line summary in short-output mode).
    Faulty {
        /// Rendered fault report.
        dump: String,
    },
}

/// Runs the Boolean pipeline over a set of shapes and checks the result.
///
/// Three stages: pave filling (pairwise intersection), General Fuse build,
/// and shape check. Stage alerts are relayed to the log; check findings are
/// mapped into [`ShapeError`] records for downstream consumption.
///
/// The gluing, fuzzy-tolerance, and non-destructive options are fixed for
/// this operation (glue off, default coincidence tolerance, arguments owned
/// by the scan).
#[derive(Debug)]
pub struct FailureScan {
    shapes: Vec<Brep>,
    check_geometry: bool,
    use_timer: bool,
    short_output: bool,
    run_parallel: bool,
    exact_check: bool,
    // Fixed options, not settable for this operation.
    non_destructive: bool,
    fuzzy: f64,
    glue: Glue,
    result: Option<Brep>,
    failures: Vec<ShapeRef>,
    errors: Vec<ShapeError>,
}

impl Default for FailureScan {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureScan {
    /// Scan with no shapes and default toggles.
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            check_geometry: true,
            use_timer: false,
            short_output: false,
            run_parallel: false,
            exact_check: false,
            non_destructive: false,
            fuzzy: Tolerance::CONFUSION,
            glue: Glue::Off,
            result: None,
            failures: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Set the shapes to process.
    ///
    /// A single input shape must be a compound and is unpacked into its
    /// members; an empty list is rejected.
    pub fn set_shapes(&mut self, shapes: Vec<Brep>) -> Result<(), PipelineError> {
        if shapes.is_empty() {
            return Err(PipelineError::NoArguments);
        }
        if shapes.len() == 1 {
            let only = &shapes[0];
            let ShapeRef::Compound(compound) = only.root else {
                return Err(PipelineError::SingleShapeNotCompound);
            };
            let members = only.topology.compounds[compound].members.clone();
            self.shapes = members
                .into_iter()
                .map(|member| {
                    let mut topology = Topology::new();
                    let root =
                        copy_shape(&only.topology, member, &mut topology, StoreOffsets::none());
                    Brep::new(topology, only.geometry.clone(), root)
                })
                .collect();
            return Ok(());
        }
        self.shapes = shapes;
        Ok(())
    }

    /// The shapes to process.
    pub fn shapes(&self) -> &[Brep] {
        &self.shapes
    }

    /// Check geometry in addition to topology (default on).
    pub fn set_check_geometry(&mut self, flag: bool) {
        self.check_geometry = flag;
    }

    /// Whether the geometry is checked, too.
    pub fn check_geometry(&self) -> bool {
        self.check_geometry
    }

    /// Log per-stage wall times (default off).
    pub fn set_use_timer(&mut self, flag: bool) {
        self.use_timer = flag;
    }

    /// Whether stage wall times are logged.
    pub fn use_timer(&self) -> bool {
        self.use_timer
    }

    /// Replace the fault dump with a one-line summary (default off).
    pub fn set_short_output(&mut self, flag: bool) {
        self.short_output = flag;
    }

    /// Whether the fault report is the one-line summary.
    pub fn short_output(&self) -> bool {
        self.short_output
    }

    /// Run the stages with rayon parallelism (default off).
    pub fn set_run_parallel(&mut self, flag: bool) {
        self.run_parallel = flag;
    }

    /// Whether the stages run in parallel.
    pub fn run_parallel(&self) -> bool {
        self.run_parallel
    }

    /// Strict deviation checking in the analyzer (default off).
    pub fn set_exact_check(&mut self, flag: bool) {
        self.exact_check = flag;
    }

    /// Whether the exact check is performed.
    pub fn exact_check(&self) -> bool {
        self.exact_check
    }

    /// The fused result shape, possibly faulty (present after a completed
    /// scan, even a faulty one).
    pub fn result(&self) -> Option<&Brep> {
        self.result.as_ref()
    }

    /// Whether the last scan recorded faulty sub-shapes.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// The faulty sub-shapes of the result, in discovery order.
    pub fn failures(&self) -> &[ShapeRef] {
        &self.failures
    }

    /// The simplified error records of the last scan.
    pub fn shape_errors(&self) -> &[ShapeError] {
        &self.errors
    }

    /// Run intersect → build → check.
    pub fn perform(&mut self) -> Result<Outcome, PipelineError> {
        self.result = None;
        self.failures.clear();
        self.errors.clear();

        if self.shapes.is_empty() {
            return Err(PipelineError::NoArguments);
        }

        // Stage 1: pave filling.
        let mut filler = PaveFiller::new();
        filler.set_arguments(self.shapes.clone());
        filler.set_run_parallel(self.run_parallel);
        filler.set_non_destructive(self.non_destructive);
        filler.set_fuzzy_value(self.fuzzy);
        filler.set_glue(self.glue);
        let started = Instant::now();
        filler.perform();
        relay_alerts(filler.report());
        if filler.has_errors() {
            return Err(PipelineError::Intersect);
        }
        if self.use_timer {
            log::info!("pave filler: {:7.2} s", started.elapsed().as_secs_f64());
        }

        // Stage 2: General Fuse build.
        let mut builder = FuseBuilder::new();
        builder.set_run_parallel(self.run_parallel);
        builder.set_check_inverted(true);
        builder.set_fill_history(false);
        let started = Instant::now();
        builder.perform_with_filler(&filler);
        relay_alerts(builder.report());
        if builder.has_errors() {
            return Err(PipelineError::Build);
        }
        let Some(result) = builder.take_shape() else {
            return Err(PipelineError::NullResult);
        };
        if self.use_timer {
            log::info!("builder: {:7.2} s", started.elapsed().as_secs_f64());
        }

        // Stage 3: shape check.
        if result.faces().is_empty() && result.edges().is_empty() {
            return Err(PipelineError::NotCheckable);
        }
        let options = CheckOptions {
            check_geometry: self.check_geometry,
            run_parallel: self.run_parallel,
            exact: self.exact_check,
        };
        let started = Instant::now();
        let analyzer = catch_unwind(AssertUnwindSafe(|| Analyzer::new(&result, options)))
            .map_err(|payload| PipelineError::Check(panic_message(payload)))?;
        if self.use_timer {
            log::info!("checkshape: {:7.2} s", started.elapsed().as_secs_f64());
        }

        let outcome = if analyzer.is_valid() {
            Outcome::Valid
        } else {
            self.errors = collect_errors(&analyzer, &result);
            self.failures = collect_failures(&analyzer, &result);
            let dump = if self.short_output {
                "This shape has faulty shapes\n".to_string()
            } else {
                contextual_dump(&analyzer, &result)
            };
            Outcome::Faulty { dump }
        };
        self.result = Some(result);
        Ok(outcome)
    }
}

/// Relay stage alerts to the log, warnings before errors, one line per
/// distinct message key.
fn relay_alerts(report: &Report) {
    let mut seen = HashSet::new();
    for alert in report.alerts(Gravity::Warning) {
        if seen.insert(alert.message) {
            log::warn!("{}", alert.message);
        }
    }
    seen.clear();
    for alert in report.alerts(Gravity::Fail) {
        if seen.insert(alert.message) {
            log::error!("{}", alert.message);
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown failure".to_string()
    }
}
