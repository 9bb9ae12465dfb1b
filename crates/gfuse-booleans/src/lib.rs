#![warn(missing_docs)]

//! General Fuse pipeline for the gfuse crates.
//!
//! The Boolean operation runs in two separately driven stages:
//! 1. **Pave filling** ([`PaveFiller`]) — pairwise intersection of the
//!    argument shapes: AABB broadphase over face pairs, surface–surface
//!    intersection, trimming of the section curves to both face domains.
//! 2. **Building** ([`FuseBuilder`]) — splitting of argument faces along
//!    the collected sections, re-assembly of all arguments into one result
//!    compound, and same-domain merging of coincident sub-shapes.
//!
//! Each stage carries a [`Report`] of warnings and failures; the diagnostic
//! layer above relays them and decides how to proceed.

pub mod bbox;
mod builder;
mod filler;
pub mod merge;
mod report;
pub mod split;
pub mod ssi;
pub mod trim;

pub use builder::{FuseBuilder, History, HistoryEntry};
pub use filler::{FaceSections, Glue, IntersectionData, PaveFiller};
pub use report::{Alert, Gravity, Report};
