use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::config::RunConfig;
use crate::scorer::ScoringProfile;

pub const RUN_PARAMETERS: &str = "gpt_jobs_parameters";
pub const PROMPTING_PARAMETERS: &str = "gpt_jobs_prompting";

const REQUIRED_EVENT_KEYS: [&str; 4] = ["email_source", "email_destination", "api_key", "job_postings"];

/// Named JSON documents held outside the program.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// `Ok(None)` when the parameter does not exist; any other failure is an error.
    async fn get_json(&self, name: &str) -> Result<Option<Value>>;
}

/// AWS Systems Manager Parameter Store.
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_json(&self, name: &str) -> Result<Option<Value>> {
        let output = match self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e)
                if e.as_service_error()
                    .is_some_and(|err| err.is_parameter_not_found()) =>
            {
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read parameter {}", name));
            }
        };

        let raw = output
            .parameter()
            .and_then(|p| p.value())
            .with_context(|| format!("Parameter {} has no value", name))?;

        let value = serde_json::from_str(raw)
            .with_context(|| format!("Parameter {} is not valid JSON", name))?;
        Ok(Some(value))
    }
}

/// Use the event as-is when it carries every required key, otherwise fall
/// back to the stored run parameters.
pub async fn resolve_run_config(event: Option<Value>, store: &dyn ParameterStore) -> Result<RunConfig> {
    if let Some(event) = event.filter(is_complete_event) {
        return serde_json::from_value(event).context("Invalid run configuration in event");
    }

    info!("Event incomplete, loading {}", RUN_PARAMETERS);
    let stored = store
        .get_json(RUN_PARAMETERS)
        .await?
        .with_context(|| format!("Parameter {} does not exist", RUN_PARAMETERS))?;
    serde_json::from_value(stored)
        .with_context(|| format!("Invalid run configuration in {}", RUN_PARAMETERS))
}

/// Stored scoring profile, or the built-in one when the parameter does not exist.
pub async fn resolve_profile(store: &dyn ParameterStore) -> Result<ScoringProfile> {
    match store.get_json(PROMPTING_PARAMETERS).await? {
        Some(value) => serde_json::from_value(value)
            .with_context(|| format!("Invalid scoring profile in {}", PROMPTING_PARAMETERS)),
        None => {
            info!("{} not found, using built-in scoring profile", PROMPTING_PARAMETERS);
            Ok(ScoringProfile::default())
        }
    }
}

fn is_complete_event(event: &Value) -> bool {
    REQUIRED_EVENT_KEYS
        .iter()
        .all(|key| event.get(key).is_some())
}
