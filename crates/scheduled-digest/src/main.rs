use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use serde_json::Value;
use shared::{
    resolve_profile, resolve_run_config, Config, JobsAcUk, OpenAiScorer, SesMailer,
    SsmParameterStore,
};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scheduled-digest")]
#[command(about = "Scheduled job digest run; missing settings are read from SSM Parameter Store")]
struct Args {
    /// Event JSON file ("-" for stdin). Without one, everything comes from the parameter store
    event: Option<PathBuf>,
}

fn read_event(path: Option<&PathBuf>) -> Result<Option<Value>> {
    let raw = match path {
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file: {}", path.display()))?,
        None if !io::stdin().is_terminal() => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
        None => return Ok(None),
    };

    if raw.trim().is_empty() {
        return Ok(None);
    }
    let event = serde_json::from_str(&raw).context("Event is not valid JSON")?;
    Ok(Some(event))
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shared=info,scheduled_digest=info")),
        )
        .init();

    let args = Args::parse();
    let event = read_event(args.event.as_ref())?;

    let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = SsmParameterStore::new(&aws);

    let config = resolve_run_config(event, &store).await?;
    let profile = resolve_profile(&store).await?;

    let board = JobsAcUk::new()?;
    let scorer = OpenAiScorer::new(config.api_key.clone(), profile)?;
    let mailer = SesMailer::new(&aws);

    let today = Local::now().date_naive();
    let digests = shared::runner::run(
        &config,
        today,
        &board,
        &scorer,
        &mailer,
        env_config.concurrency,
    )
    .await?;

    let important: usize = digests.iter().map(|d| d.important.len()).sum();
    println!(
        "✓ Sent {} digests ({} important postings)",
        digests.len(),
        important
    );

    Ok(())
}
