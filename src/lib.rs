pub mod config;
pub mod dedup;
pub mod discover;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod segment;

pub use config::{ConfigError, SourceConfig};
pub use fetch::{FetchFailure, PageFetcher};
pub use pipeline::{run, RunOutput};
pub use record::{ExtractionFailure, FailureStage, GuestEntry};
