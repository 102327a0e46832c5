use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::LlmError;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const MODEL: &str = "gpt-3.5-turbo";
pub const TEMPERATURE: f32 = 0.4;
const MAX_DESCRIPTION_BYTES: usize = 12_000;

static RATING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)/10").expect("valid rating regex"));

/// Produces a free-text relevance assessment for a job description.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn assess(&self, description: &str) -> Result<String, LlmError>;
}

/// A worked example shown to the model before the real posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub posting_text: String,
    pub response: String,
}

/// The candidate profile and rubric the model scores against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    pub system_prompt: String,
    #[serde(default)]
    pub few_shot_prompting: Vec<FewShotExample>,
}

impl ScoringProfile {
    pub fn conversation(&self, description: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2 + self.few_shot_prompting.len() * 2);
        messages.push(Message::new("system", &self.system_prompt));
        for example in &self.few_shot_prompting {
            messages.push(Message::new("user", &example.posting_text));
            messages.push(Message::new("assistant", &example.response));
        }
        messages.push(Message::new("user", description));
        messages
    }
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            few_shot_prompting: vec![
                FewShotExample {
                    posting_text: UNDER_QUALIFIED_POSTING.to_string(),
                    response: UNDER_QUALIFIED_RESPONSE.to_string(),
                },
                FewShotExample {
                    posting_text: QUALIFIED_POSTING.to_string(),
                    response: QUALIFIED_RESPONSE.to_string(),
                },
            ],
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. You give brief answers ranking the relevance of job postings for a person with the following description:
I have a master's degree in physics, with a project involving computational neuroscience. Since graduating,
I have ~18 months of experience as a DevOps engineer, working with Python, Bash, AWS, terraform, kubernetes, git, postgreSQL.
I do not hold a PhD, and don't have experience lecturing or doing experimental lab work.
I am looking for jobs that involve programming, especially cloud hosting or CI/CD, bonus points for roles with an ethical value.
Senior roles, roles requiring a PhD, and roles in the humanities are a poor fit.
Any role that is mostly software development should score at least 4/10.
You give a brief description of the benefits of the job and an overall score out of 10 based on value and relevancy of the person's experience.";

const UNDER_QUALIFIED_POSTING: &str = "Senior Lecturer in Medieval History. The successful candidate will hold a PhD in History, \
have a strong record of peer-reviewed publication and at least five years of undergraduate teaching experience.";

const UNDER_QUALIFIED_RESPONSE: &str = "This is a senior academic teaching post in the humanities that requires a PhD and \
lecturing experience, none of which match the candidate's background. Overall score: 1/10";

const QUALIFIED_POSTING: &str = "Research Software Engineer. Join our research computing team building data pipelines \
in Python, maintaining CI/CD workflows and deploying services to AWS. Experience with Linux and git is essential; \
a background in a quantitative science is desirable.";

const QUALIFIED_RESPONSE: &str = "A solid match: the role is programming-focused with cloud deployment and CI/CD work, \
and values a quantitative science background. It is research-support rather than product engineering, so growth \
in DevOps may be limited. Overall score: 6/10";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completions backed scorer.
pub struct OpenAiScorer {
    client: Client,
    api_key: String,
    profile: ScoringProfile,
}

impl OpenAiScorer {
    pub fn new(api_key: String, profile: ScoringProfile) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            profile,
        })
    }
}

#[async_trait]
impl RelevanceScorer for OpenAiScorer {
    async fn assess(&self, description: &str) -> Result<String, LlmError> {
        let messages = self.profile.conversation(truncate(description, MAX_DESCRIPTION_BYTES));
        let request = ChatRequest {
            model: MODEL,
            temperature: TEMPERATURE,
            messages: &messages,
        };

        debug!("Requesting rating ({} messages)", messages.len());
        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat = response.json::<ChatResponse>().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

/// Mean of every `n/10` in the reply, or `None` if the model gave no score.
pub fn extract_rating(reply: &str) -> Option<f64> {
    let scores: Vec<f64> = RATING
        .captures_iter(reply)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .map(f64::from)
        .collect();

    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

// Cut on a char boundary so multi-byte text never panics.
fn truncate(content: &str, max: usize) -> &str {
    if content.len() <= max {
        return content;
    }
    let mut end = max;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_rating_averages_all_scores() {
        let rating = extract_rating("Great fit. 7/10 overall, 8/10 for skills");
        assert_eq!(rating, Some(7.5));
    }

    #[test]
    fn test_extract_rating_is_order_independent() {
        assert_eq!(
            extract_rating("8/10 for skills, 7/10 overall"),
            extract_rating("7/10 overall, 8/10 for skills")
        );
    }

    #[test]
    fn test_extract_rating_single() {
        assert_eq!(extract_rating("Overall score: 3/10"), Some(3.0));
    }

    #[test]
    fn test_extract_rating_none_when_absent() {
        assert_eq!(extract_rating("I cannot rate this posting."), None);
        assert_eq!(extract_rating(""), None);
    }

    #[test]
    fn test_extract_rating_ignores_other_fractions() {
        assert_eq!(extract_rating("Works 3/5 days on site. Score 9/10"), Some(9.0));
    }

    #[test]
    fn test_conversation_layout() {
        let profile = ScoringProfile {
            system_prompt: "rate jobs".to_string(),
            few_shot_prompting: vec![FewShotExample {
                posting_text: "example posting".to_string(),
                response: "example answer 2/10".to_string(),
            }],
        };

        let messages = profile.conversation("target posting");
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[0].content, "rate jobs");
        assert_eq!(messages[2].content, "example answer 2/10");
        assert_eq!(messages[3].content, "target posting");
    }

    #[test]
    fn test_default_profile_has_two_examples() {
        let profile = ScoringProfile::default();
        assert_eq!(profile.few_shot_prompting.len(), 2);
        assert!(profile.system_prompt.contains("4/10"));
        assert_eq!(profile.conversation("x").len(), 6);
    }

    #[test]
    fn test_profile_parses_parameter_store_shape() {
        let json = r#"{
            "system_prompt": "be brief",
            "few_shot_prompting": [{"posting_text": "a", "response": "b 5/10"}]
        }"#;
        let profile: ScoringProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.few_shot_prompting[0].response, "b 5/10");
    }

    #[test]
    fn test_truncate_respects_utf8() {
        let text = "héllo";
        assert_eq!(truncate(text, 2), "h");
        assert_eq!(truncate(text, 100), "héllo");
    }
}
