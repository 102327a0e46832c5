use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::board::JobBoard;
use crate::details::DetailOutcome;
use crate::errors::ScrapeError;
use crate::models::{JobPosting, Source};
use crate::scorer::{extract_rating, RelevanceScorer};

/// Postings for one source, ready for the notifier.
#[derive(Debug, Clone)]
pub struct Digest {
    pub source_name: String,
    pub target_date: NaiveDate,
    pub important: Vec<JobPosting>,
    pub other: Vec<JobPosting>,
    /// Postings whose LLM call failed; they appear in `other` as errored.
    pub scoring_failures: usize,
}

pub struct Pipeline<'a> {
    board: &'a dyn JobBoard,
    scorer: &'a dyn RelevanceScorer,
    concurrency: usize,
}

impl<'a> Pipeline<'a> {
    pub fn new(board: &'a dyn JobBoard, scorer: &'a dyn RelevanceScorer) -> Self {
        Self {
            board,
            scorer,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch, score, classify and sort the postings of one source.
    ///
    /// Only postings placed on `target_date` are fetched in detail and scored.
    pub async fn collect(
        &self,
        source: &Source,
        target_date: NaiveDate,
    ) -> Result<Vec<JobPosting>, ScrapeError> {
        let listings = self.board.fetch_listings(&source.url, target_date).await?;
        let (todays, earlier): (Vec<_>, Vec<_>) = listings
            .into_iter()
            .partition(|posting| posting.placed_on == target_date);

        info!(
            "{}: {} postings on {}, {} from other days",
            source.name,
            todays.len(),
            target_date,
            earlier.len()
        );

        // A fetch failure ends the stream; queued postings are never started.
        let mut postings: Vec<JobPosting> = stream::iter(todays)
            .map(|posting| self.enrich(posting))
            .buffered(self.concurrency)
            .try_collect()
            .await?;
        postings.extend(earlier);

        for posting in &mut postings {
            posting.classify();
        }
        sort_by_rating(&mut postings);

        Ok(postings)
    }

    /// Run a source end to end and split it into notification buckets.
    pub async fn run_source(
        &self,
        source: &Source,
        target_date: NaiveDate,
        report_date: NaiveDate,
    ) -> Result<Digest, ScrapeError> {
        let postings = self.collect(source, target_date).await?;
        let scoring_failures = postings.iter().filter(|p| p.scoring_error.is_some()).count();
        let (important, other) = partition(postings, target_date, report_date);

        Ok(Digest {
            source_name: source.name.clone(),
            target_date,
            important,
            other,
            scoring_failures,
        })
    }

    async fn enrich(&self, mut posting: JobPosting) -> Result<JobPosting, ScrapeError> {
        let description = match self.board.fetch_details(&posting.link).await? {
            DetailOutcome::Description(text) => text,
            DetailOutcome::Missing => {
                warn!("No description for {}", posting.link);
                posting.errored = true;
                return Ok(posting);
            }
        };

        match self.scorer.assess(&description).await {
            Ok(reply) => {
                posting.rating_score = extract_rating(&reply);
                if posting.rating_score.is_none() {
                    warn!("No rating in reply for {}", posting.link);
                }
                posting.rating_explanation = Some(reply);
            }
            Err(e) => {
                warn!("Scoring failed for {}: {}", posting.link, e);
                posting.errored = true;
                posting.scoring_error = Some(e.to_string());
            }
        }
        posting.description = Some(description);

        Ok(posting)
    }
}

/// Stable sort, highest rating first; unrated postings count as 0.
pub fn sort_by_rating(postings: &mut [JobPosting]) {
    postings.sort_by(|a, b| b.sort_key().total_cmp(&a.sort_key()));
}

/// Split classified postings into the (important, other) email buckets.
pub fn partition(
    postings: Vec<JobPosting>,
    target_date: NaiveDate,
    report_date: NaiveDate,
) -> (Vec<JobPosting>, Vec<JobPosting>) {
    let mut important = Vec::new();
    let mut other = Vec::new();

    for posting in postings {
        if posting.important {
            if posting.placed_on == report_date {
                important.push(posting);
            }
        } else if posting.placed_on == target_date || posting.errored {
            other.push(posting);
        }
    }

    (important, other)
}
