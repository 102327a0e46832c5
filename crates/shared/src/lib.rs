// Public modules
pub mod board;
pub mod config;
pub mod dates;
pub mod details;
pub mod errors;
pub mod listings;
pub mod models;
pub mod notifier;
pub mod params;
pub mod pipeline;
pub mod runner;
pub mod scorer;

// Re-export commonly used types
pub use board::{JobBoard, JobsAcUk};
pub use config::{load_profile, load_sources, Config, RunConfig};
pub use details::DetailOutcome;
pub use errors::{LlmError, ScrapeError};
pub use models::{JobPosting, Source};
pub use notifier::{compose_email, Email, Mailer, SesMailer, StdoutMailer};
pub use params::{resolve_profile, resolve_run_config, ParameterStore, SsmParameterStore};
pub use pipeline::{Digest, Pipeline};
pub use scorer::{extract_rating, OpenAiScorer, RelevanceScorer, ScoringProfile};
