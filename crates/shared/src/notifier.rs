use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use chrono::NaiveDate;
use tracing::info;

use crate::models::JobPosting;
use crate::pipeline::Digest;

const DIVIDER: &str = "-------------------";

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Build the plain-text digest email for one source.
pub fn compose_email(
    from: &str,
    to: &str,
    important: &[JobPosting],
    other: &[JobPosting],
    date: NaiveDate,
    source_name: &str,
) -> Email {
    let mut body = String::new();

    for job in important {
        body.push_str(&format!("\n{}\n", job.name));
        body.push_str(&format!("{}\n", job.link));
        body.push_str(&format!(
            "{}\n",
            job.rating_explanation.as_deref().unwrap_or_default()
        ));
    }

    body.push_str(&format!("\n{}\n", DIVIDER));

    for job in other {
        body.push_str(&format!("\n{}\n", job.name));
        body.push_str(&format!("{} {}/10\n", job.link, format_rating(job.rating_score)));
    }

    Email {
        from: from.to_string(),
        to: to.to_string(),
        subject: format!("Postings for {} - {}", source_name, date.format("%Y-%m-%d")),
        body,
    }
}

pub fn digest_email(from: &str, to: &str, digest: &Digest) -> Email {
    compose_email(
        from,
        to,
        &digest.important,
        &digest.other,
        digest.target_date,
        &digest.source_name,
    )
}

/// "7.5", "8.0" or "null".
fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(score) if score.fract() == 0.0 => format!("{:.1}", score),
        Some(score) => score.to_string(),
        None => "null".to_string(),
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;
}

/// Sends through Amazon SES.
pub struct SesMailer {
    client: aws_sdk_sesv2::Client,
}

impl SesMailer {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_sesv2::Client::new(config),
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        let message = ses_message(email)?;

        self.client
            .send_email()
            .from_email_address(&email.from)
            .destination(Destination::builder().to_addresses(&email.to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .with_context(|| format!("Failed to send email to {}", email.to))?;

        info!("Sent \"{}\" to {}", email.subject, email.to);
        Ok(())
    }
}

/// Plain-text SES message for an email.
fn ses_message(email: &Email) -> Result<Message> {
    let subject = Content::builder()
        .data(&email.subject)
        .build()
        .context("Failed to build email subject")?;
    let text = Content::builder()
        .data(&email.body)
        .build()
        .context("Failed to build email body")?;

    Ok(Message::builder()
        .subject(subject)
        .body(Body::builder().text(text).build())
        .build())
}

/// Prints the email instead of sending it.
pub struct StdoutMailer;

#[async_trait]
impl Mailer for StdoutMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        println!("From: {}", email.from);
        println!("To: {}", email.to);
        println!("Subject: {}", email.subject);
        println!("{}", email.body);
        Ok(())
    }
}
