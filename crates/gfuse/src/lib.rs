#![warn(missing_docs)]

//! Boolean-operation failure triage for BRep models.
//!
//! [`FailureScan`] runs a General Fuse over a set of input shapes and
//! validates the result's topological and geometric consistency:
//! 1. pave filling — pairwise intersection of the arguments;
//! 2. General Fuse build — splitting, re-assembly, same-domain merging;
//! 3. shape check — validity analysis of the fused result.
//!
//! Check findings come back as structured [`ShapeError`] records (which
//! sub-shape, which status code) plus a rendered fault dump, with stage
//! alerts relayed through the `log` facade.
//!
//! # Example
//!
//! ```
//! use gfuse::{make_box, FailureScan, Outcome};
//!
//! let a = make_box(2.0, 2.0, 2.0);
//! let b = make_box(2.0, 2.0, 2.0).translated(1.0, 1.0, 1.0);
//! let mut scan = FailureScan::new();
//! scan.set_shapes(vec![a, b]).unwrap();
//! match scan.perform().unwrap() {
//!     Outcome::Valid => {}
//!     Outcome::Faulty { dump } => println!("{dump}"),
//! }
//! ```

mod dump;
mod error;
mod errors;
mod scan;

pub use dump::contextual_dump;
pub use error::PipelineError;
pub use errors::{collect_errors, collect_failures, ShapeError};
pub use scan::{FailureScan, Outcome};

// The pipeline's building blocks, for callers driving stages themselves.
pub use gfuse_booleans::{FuseBuilder, Glue, PaveFiller, Report};
pub use gfuse_check::{Analyzer, CheckOptions, CheckStatus};
pub use gfuse_primitives::{make_box, make_cylinder, make_sphere, Brep};

/// Kernel helper routines (point sampling, same-domain detection, p-curve
/// refinement, meshing, tolerance repair).
pub use gfuse_tools as tools;
