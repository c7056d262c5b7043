//! Typed errors for the roast generation pipeline.

use thiserror::Error;

/// Failures that may reach the caller of [`crate::RoastService::generate_roast`].
///
/// Upstream metadata/review fetch problems and parse failures never appear
/// here: they degrade to generic context or default stats inside the
/// pipeline.
#[derive(Debug, Error)]
pub enum RoastError {
    /// The submitted anime name failed validation
    #[error("invalid anime name: {0}")]
    Validation(String),

    /// The generator timed out on the final allowed attempt
    #[error("generation timed out after {attempts} attempt(s)")]
    GenerationTimeout { attempts: u32 },

    /// All generation attempts were exhausted without usable text
    #[error("generation failed after {attempts} attempt(s)")]
    GenerationFailed { attempts: u32 },

    /// The generator reported quota exhaustion; retrying now would make it worse
    #[error("generator rate limit exhausted, try again later")]
    RateLimited,

    /// A collaborator failed in a way graceful degradation could not absorb
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Result type alias for pipeline operations.
pub type RoastResult<T> = std::result::Result<T, RoastError>;
