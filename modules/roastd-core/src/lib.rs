//! Roast generation pipeline: review analysis, prompt assembly, response
//! post-processing, and the orchestration around the text generator.

pub mod aggregate;
pub mod cache;
pub mod clean;
pub mod config;
pub mod context;
pub mod criticism;
pub mod error;
pub mod orchestrator;
pub mod parse;
pub mod prompt;
pub mod sanitize;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod types;
pub mod validate;

pub use error::{RoastError, RoastResult};
pub use orchestrator::RoastService;
pub use types::{AnimeMetadata, Review, ReviewContext, RoastOutcome, RoastStats};
