//! Pipeline error type.

use thiserror::Error;

/// Errors aborting the fuse-and-check pipeline.
///
/// Each variant keeps the numeric code the stage scripts historically used
/// (intersection stage 1xx, build stage 2xx, check stage 3xx), available
/// through [`PipelineError::code`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// No input shapes were supplied.
    #[error("no shapes to process")]
    NoArguments,
    /// A single input shape must be a compound holding the real arguments.
    #[error("a single input shape must be a compound")]
    SingleShapeNotCompound,
    /// The intersection stage reported a failure.
    #[error("error in the intersection stage")]
    Intersect,
    /// The build stage was driven without intersection data.
    #[error("intersection data missing; run the pave filler first")]
    MissingIntersectionData,
    /// The build stage reported a failure.
    #[error("error in the build stage")]
    Build,
    /// The build stage produced a null shape.
    #[error("the built result is a null shape")]
    NullResult,
    /// The result has nothing the checker can analyze.
    #[error("the result shape cannot be checked")]
    NotCheckable,
    /// The shape check aborted.
    #[error("the shape check failed: {0}")]
    Check(String),
}

impl PipelineError {
    /// Stable numeric code of the failed step.
    pub fn code(&self) -> u32 {
        match self {
            PipelineError::NoArguments | PipelineError::SingleShapeNotCompound => 101,
            PipelineError::Intersect => 103,
            PipelineError::MissingIntersectionData => 201,
            PipelineError::Build => 203,
            PipelineError::NullResult => 204,
            PipelineError::NotCheckable => 301,
            PipelineError::Check(_) => 302,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_codes() {
        assert_eq!(PipelineError::NoArguments.code(), 101);
        assert_eq!(PipelineError::Intersect.code(), 103);
        assert_eq!(PipelineError::MissingIntersectionData.code(), 201);
        assert_eq!(PipelineError::Build.code(), 203);
        assert_eq!(PipelineError::NullResult.code(), 204);
        assert_eq!(PipelineError::NotCheckable.code(), 301);
        assert_eq!(PipelineError::Check("boom".into()).code(), 302);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            PipelineError::NoArguments.to_string(),
            "no shapes to process"
        );
        assert_eq!(
            PipelineError::Check("bad curve".into()).to_string(),
            "the shape check failed: bad curve"
        );
    }
}
