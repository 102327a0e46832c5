use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Postings rated above this are flagged as important.
pub const IMPORTANT_THRESHOLD: f64 = 6.0;

/// A single job listing scraped from a search-results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub name: String,
    pub link: String,
    pub placed_on: NaiveDate,
    pub description: Option<String>,
    #[serde(default)]
    pub errored: bool,
    pub rating_score: Option<f64>,
    pub rating_explanation: Option<String>,
    #[serde(default)]
    pub important: bool,
    /// Set when the LLM call for this posting failed.
    pub scoring_error: Option<String>,
}

impl JobPosting {
    pub fn new(name: impl Into<String>, link: impl Into<String>, placed_on: NaiveDate) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
            placed_on,
            description: None,
            errored: false,
            rating_score: None,
            rating_explanation: None,
            important: false,
            scoring_error: None,
        }
    }

    /// Rating used for ordering; unrated postings count as 0.
    pub fn sort_key(&self) -> f64 {
        self.rating_score.unwrap_or(0.0)
    }

    pub fn classify(&mut self) {
        self.important = self
            .rating_score
            .map(|score| score > IMPORTANT_THRESHOLD)
            .unwrap_or(false);
    }
}

/// One search page to scrape, labelled for the email subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
}
