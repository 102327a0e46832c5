use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::details::{self, DetailOutcome};
use crate::errors::ScrapeError;
use crate::listings;
use crate::models::JobPosting;

pub const JOBS_AC_UK_BASE: &str = "https://www.jobs.ac.uk";
pub const JOBS_AC_UK_JOB_PREFIX: &str = "https://www.jobs.ac.uk/job/";

/// The two page reads the pipeline needs from a job board.
#[async_trait]
pub trait JobBoard: Send + Sync {
    /// Candidates on one search-results page, dated relative to `reference`.
    async fn fetch_listings(
        &self,
        url: &str,
        reference: NaiveDate,
    ) -> Result<Vec<JobPosting>, ScrapeError>;

    async fn fetch_details(&self, link: &str) -> Result<DetailOutcome, ScrapeError>;
}

/// Scraper for jobs.ac.uk search and job pages.
pub struct JobsAcUk {
    client: Client,
    base: Url,
    job_prefix: String,
}

impl JobsAcUk {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; JobDigest/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Self::with_client(client)
    }

    pub fn with_client(client: Client) -> Result<Self> {
        let base = Url::parse(JOBS_AC_UK_BASE).context("Invalid job board base URL")?;

        Ok(Self {
            client,
            base,
            job_prefix: JOBS_AC_UK_JOB_PREFIX.to_string(),
        })
    }

    async fn get_page(&self, url: &str) -> Result<String, ScrapeError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ScrapeError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl JobBoard for JobsAcUk {
    async fn fetch_listings(
        &self,
        url: &str,
        reference: NaiveDate,
    ) -> Result<Vec<JobPosting>, ScrapeError> {
        let html = self.get_page(url).await?;
        Ok(listings::parse_listings(
            &html,
            &self.base,
            &self.job_prefix,
            reference,
        ))
    }

    async fn fetch_details(&self, link: &str) -> Result<DetailOutcome, ScrapeError> {
        let html = self.get_page(link).await?;
        Ok(details::parse_description(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/search/", addr)
    }

    fn local_board() -> JobsAcUk {
        let client = Client::builder().no_proxy().build().unwrap();
        JobsAcUk::with_client(client).unwrap()
    }

    #[tokio::test]
    async fn test_listing_not_found_carries_status() {
        let url = serve_once("404 Not Found", "").await;
        let board = local_board();
        let reference = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        let err = board.fetch_listings(&url, reference).await.unwrap_err();

        match err {
            ScrapeError::Fetch { url: failed, status } => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detail_server_error_carries_status() {
        let url = serve_once("503 Service Unavailable", "busy").await;
        let board = local_board();

        let err = board.fetch_details(&url).await.unwrap_err();

        assert!(matches!(err, ScrapeError::Fetch { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_detail_page_is_parsed() {
        let url = serve_once(
            "200 OK",
            "<html><body><div id=\"job-description\"><p>Run our CI pipelines.</p></div></body></html>",
        )
        .await;
        let board = local_board();

        match board.fetch_details(&url).await.unwrap() {
            DetailOutcome::Description(text) => assert!(text.contains("Run our CI pipelines.")),
            DetailOutcome::Missing => panic!("description should be found"),
        }
    }
}
