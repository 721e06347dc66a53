//! Background job scheduler.
//!
//! Runs the key-issues generation job in-process on the configured cron
//! schedule.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use voices_core::Commentator;
use voices_issues::{GenerationOutcome, KeyIssuesJob};

/// Builds and starts the scheduler with the key-issues job registered.
///
/// The returned handle must be kept alive for the lifetime of the process.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    cron: &str,
    job: Arc<KeyIssuesJob>,
    commentators: Arc<Vec<Commentator>>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_key_issues_job(&scheduler, cron, job, commentators).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_key_issues_job(
    scheduler: &JobScheduler,
    cron: &str,
    job: Arc<KeyIssuesJob>,
    commentators: Arc<Vec<Commentator>>,
) -> Result<(), JobSchedulerError> {
    let scheduled = Job::new_async(cron, move |_uuid, _lock| {
        let job = Arc::clone(&job);
        let commentators = Arc::clone(&commentators);

        Box::pin(async move {
            tracing::info!("scheduler: starting key-issues generation");
            match job.run(&commentators).await {
                Ok(GenerationOutcome::Generated {
                    topics_generated, ..
                }) => {
                    tracing::info!(topics_generated, "scheduler: key issues generated");
                }
                Ok(GenerationOutcome::NotEnoughContent { articles_found }) => {
                    tracing::info!(articles_found, "scheduler: not enough recent content");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: key-issues generation failed");
                }
            }
        })
    })?;

    scheduler.add(scheduled).await?;
    tracing::info!(cron, "scheduler: key-issues job registered");
    Ok(())
}
