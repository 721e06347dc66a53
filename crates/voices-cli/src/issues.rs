//! `issues` command handlers.

use std::sync::Arc;

use voices_content::{Clock, SystemClock};
use voices_core::AppConfig;
use voices_issues::GenerationOutcome;

use crate::context;

/// Run the generation job once against the snapshot.
///
/// # Errors
///
/// Returns an error if the snapshot or store cannot be loaded, or the job
/// fails (missing credential, API error, unusable model output).
pub(crate) async fn run_generate(config: &AppConfig) -> anyhow::Result<()> {
    let commentators = context::load_snapshot(config)?;
    let job = context::issues_job(config).await?;

    match job.run(&commentators).await? {
        GenerationOutcome::Generated {
            topics_generated,
            generated_at,
        } => {
            println!("generated {topics_generated} topics at {generated_at}");
            if config.database_url.is_none() {
                if let Some(issues) = job.store().get().await? {
                    println!("{}", serde_json::to_string_pretty(&issues)?);
                }
            }
        }
        GenerationOutcome::NotEnoughContent { articles_found } => {
            println!("not enough recent content ({articles_found} articles); nothing generated");
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the store cannot be reached.
pub(crate) async fn run_show(config: &AppConfig) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = context::issue_store(config, clock).await?;
    match store.get().await? {
        Some(issues) => println!("{}", serde_json::to_string_pretty(&issues)?),
        None => println!("no key issues stored"),
    }
    Ok(())
}
