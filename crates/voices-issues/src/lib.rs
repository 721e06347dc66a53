//! Key issues: the weekly cross-spectrum topic summary and the job that
//! generates it.

pub mod error;
pub mod extract;
pub mod generator;
pub mod job;
pub mod model;
pub mod prompt;
pub mod store;

pub use error::IssuesError;
pub use extract::{first_json_object, parse_model_output, top_level_objects};
pub use generator::{AnthropicClient, TextGenerator, ANTHROPIC_VERSION, MAX_TOKENS};
pub use job::{GenerationOutcome, KeyIssuesJob, MIN_ARTICLES};
pub use model::{KeyIssues, Perspective, Perspectives, Topic};
pub use prompt::{build_prompt, format_content};
pub use store::{IssueStore, MemoryIssueStore, PgIssueStore, ISSUES_KEY, ISSUES_TTL};
