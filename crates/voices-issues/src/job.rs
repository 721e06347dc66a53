//! The key-issues generation job: aggregate, prompt, recover, store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use voices_content::{Clock, ContentAggregator, LeanGroups};
use voices_core::Commentator;

use crate::error::IssuesError;
use crate::extract::parse_model_output;
use crate::generator::TextGenerator;
use crate::model::KeyIssues;
use crate::prompt::build_prompt;
use crate::store::{IssueStore, ISSUES_TTL};

/// Fewer recent articles than this and generation is skipped.
pub const MIN_ARTICLES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Generated {
        topics_generated: usize,
        generated_at: DateTime<Utc>,
    },
    NotEnoughContent {
        articles_found: usize,
    },
}

pub struct KeyIssuesJob {
    aggregator: ContentAggregator,
    generator: Option<Arc<dyn TextGenerator>>,
    store: Arc<dyn IssueStore>,
    clock: Arc<dyn Clock>,
}

impl KeyIssuesJob {
    /// `generator` is `None` when no text-generation credential is
    /// configured; runs with enough content then fail with
    /// [`IssuesError::MissingCredential`].
    #[must_use]
    pub fn new(
        aggregator: ContentAggregator,
        generator: Option<Arc<dyn TextGenerator>>,
        store: Arc<dyn IssueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            aggregator,
            generator,
            store,
            clock,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn IssueStore> {
        &self.store
    }

    /// Aggregate recent content for `commentators` and generate from it.
    ///
    /// # Errors
    ///
    /// See [`KeyIssuesJob::generate_from_groups`].
    pub async fn run(&self, commentators: &[Commentator]) -> Result<GenerationOutcome, IssuesError> {
        tracing::info!(commentators = commentators.len(), "aggregating content for key issues");
        let groups = self.aggregator.aggregate(commentators, self.clock.now()).await;
        self.generate_from_groups(&groups).await
    }

    /// # Errors
    ///
    /// [`IssuesError::MissingCredential`] without a generator, the
    /// generator's own errors, [`IssuesError::MalformedOutput`] for output
    /// with no recoverable document, and store failures.
    pub async fn generate_from_groups(
        &self,
        groups: &LeanGroups,
    ) -> Result<GenerationOutcome, IssuesError> {
        let articles_found = groups.total_articles();
        if articles_found < MIN_ARTICLES {
            tracing::info!(articles_found, "not enough recent content for key issues");
            return Ok(GenerationOutcome::NotEnoughContent { articles_found });
        }

        let generator = self
            .generator
            .as_ref()
            .ok_or(IssuesError::MissingCredential("ANTHROPIC_API_KEY"))?;

        let output = generator.generate(&build_prompt(groups)).await?;
        let topics = parse_model_output(&output)?;

        let generated_at = self.clock.now();
        let issues = KeyIssues {
            generated_at: Some(generated_at),
            topics,
            message: None,
        };
        self.store.put(&issues, ISSUES_TTL).await?;

        tracing::info!(
            articles_found,
            topics = issues.topics.len(),
            "key issues generated"
        );
        Ok(GenerationOutcome::Generated {
            topics_generated: issues.topics.len(),
            generated_at,
        })
    }
}
