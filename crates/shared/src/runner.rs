use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::board::JobBoard;
use crate::config::RunConfig;
use crate::notifier::{digest_email, Mailer};
use crate::pipeline::{Digest, Pipeline};
use crate::scorer::RelevanceScorer;

/// Process every configured source in turn and email each digest.
///
/// A fetch failure aborts the run at that source; sources already mailed
/// stay mailed.
pub async fn run(
    config: &RunConfig,
    today: NaiveDate,
    board: &dyn JobBoard,
    scorer: &dyn RelevanceScorer,
    mailer: &dyn Mailer,
    concurrency: usize,
) -> Result<Vec<Digest>> {
    let target_date = config.target_date(today);
    let report_date = config.report_date(today);
    let pipeline = Pipeline::new(board, scorer).with_concurrency(concurrency);

    let mut digests = Vec::with_capacity(config.job_postings.len());
    for source in &config.job_postings {
        info!("Processing {} for {}", source.name, target_date);

        let digest = pipeline
            .run_source(source, target_date, report_date)
            .await
            .with_context(|| format!("Failed to process {}", source.name))?;

        if digest.scoring_failures > 0 {
            warn!(
                "{}: {} postings could not be scored",
                source.name, digest.scoring_failures
            );
        }

        let email = digest_email(&config.email_source, &config.email_destination, &digest);
        mailer.send(&email).await?;
        digests.push(digest);
    }

    Ok(digests)
}
