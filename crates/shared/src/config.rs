use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::models::Source;
use crate::scorer::ScoringProfile;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Settings read from the environment (and any `.env` file).
#[derive(Debug, Clone)]
pub struct Config {
    pub concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let concurrency = match env::var("JOB_DIGEST_CONCURRENCY") {
            Ok(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("JOB_DIGEST_CONCURRENCY must be a number, got {:?}", raw))?,
            Err(_) => DEFAULT_CONCURRENCY,
        };

        Ok(Self { concurrency })
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/job-digest/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("job-digest").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

/// Parameters for one run, fixed for its duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub email_source: String,
    pub email_destination: String,
    pub api_key: String,
    pub job_postings: Vec<Source>,
    #[serde(default)]
    pub shift_by_days: i64,
    /// Overrides the date important postings must be placed on.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl RunConfig {
    pub fn target_date(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.shift_by_days)
    }

    pub fn report_date(&self, today: NaiveDate) -> NaiveDate {
        self.date.unwrap_or_else(|| self.target_date(today))
    }
}

/// Read the `[{name, url}]` list of search pages.
pub fn load_sources(path: &Path) -> Result<Vec<Source>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sources file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse sources JSON from {}", path.display()))
}

pub fn load_profile(path: &Path) -> Result<ScoringProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scoring profile: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse scoring profile from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run_config(shift: i64, date: Option<NaiveDate>) -> RunConfig {
        RunConfig {
            email_source: "a@example.com".to_string(),
            email_destination: "b@example.com".to_string(),
            api_key: "sk".to_string(),
            job_postings: vec![],
            shift_by_days: shift,
            date,
        }
    }

    #[test]
    fn test_target_date_applies_shift() {
        let config = run_config(2, None);
        assert_eq!(config.target_date(ymd(2024, 3, 1)), ymd(2024, 2, 28));
    }

    #[test]
    fn test_report_date_defaults_to_target() {
        let config = run_config(1, None);
        assert_eq!(config.report_date(ymd(2024, 3, 5)), ymd(2024, 3, 4));
    }

    #[test]
    fn test_report_date_override() {
        let config = run_config(1, Some(ymd(2024, 1, 1)));
        assert_eq!(config.report_date(ymd(2024, 3, 5)), ymd(2024, 1, 1));
        assert_eq!(config.target_date(ymd(2024, 3, 5)), ymd(2024, 3, 4));
    }

    #[test]
    fn test_deserialize_with_optional_fields() {
        let json = r#"{
            "email_source": "a@example.com",
            "email_destination": "b@example.com",
            "api_key": "sk",
            "job_postings": [{"name": "Remote", "url": "https://www.jobs.ac.uk/search/?remote=1"}],
            "date": "2024-03-05"
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.shift_by_days, 0);
        assert_eq!(config.date, Some(ymd(2024, 3, 5)));
        assert_eq!(config.job_postings[0].name, "Remote");
    }

    #[test]
    fn test_load_sources_from_file() {
        let path = std::env::temp_dir().join(format!("job-digest-sources-{}.json", std::process::id()));
        std::fs::write(&path, r#"[{"name": "London", "url": "https://www.jobs.ac.uk/search/"}]"#).unwrap();

        let sources = load_sources(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "London");
    }

    #[test]
    fn test_load_sources_missing_file() {
        let err = load_sources(Path::new("/nonexistent/sources.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read sources file"));
    }
}
