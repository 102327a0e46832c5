use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use shared::{
    load_profile, load_sources, Config, JobsAcUk, Mailer, OpenAiScorer, RunConfig, ScoringProfile,
    SesMailer, StdoutMailer,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "job-digest")]
#[command(about = "Rate today's job postings with an LLM and email a ranked digest")]
struct Args {
    /// Sender address
    email_source: String,

    /// Recipient address
    email_destination: String,

    /// OpenAI API key
    api_key: String,

    /// Look at postings placed this many days ago
    #[arg(allow_negative_numbers = true)]
    shift_by_days: i64,

    /// JSON file listing the search pages: [{"name": ..., "url": ...}]
    postings: PathBuf,

    /// Only report important postings placed on this date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// JSON scoring profile: {"system_prompt": ..., "few_shot_prompting": [...]}
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Postings fetched and scored at once per source
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Print the emails instead of sending them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shared=info,job_digest=info")),
        )
        .init();

    let args = Args::parse();

    let config = RunConfig {
        email_source: args.email_source,
        email_destination: args.email_destination,
        api_key: args.api_key,
        job_postings: load_sources(&args.postings)?,
        shift_by_days: args.shift_by_days,
        date: args.date,
    };

    let profile = match &args.profile {
        Some(path) => load_profile(path)?,
        None => ScoringProfile::default(),
    };

    let today = Local::now().date_naive();
    println!(
        "📚 Checking {} sources for postings placed on {}",
        config.job_postings.len(),
        config.target_date(today)
    );

    let board = JobsAcUk::new()?;
    let scorer = OpenAiScorer::new(config.api_key.clone(), profile)?;
    let mailer: Box<dyn Mailer> = if args.dry_run {
        Box::new(StdoutMailer)
    } else {
        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Box::new(SesMailer::new(&aws))
    };

    let digests = shared::runner::run(
        &config,
        today,
        &board,
        &scorer,
        mailer.as_ref(),
        args.concurrency.unwrap_or(env_config.concurrency),
    )
    .await?;

    for digest in &digests {
        println!(
            "✓ {}: {} important, {} other",
            digest.source_name,
            digest.important.len(),
            digest.other.len()
        );
        if digest.scoring_failures > 0 {
            println!("  ⚠ {} postings could not be scored", digest.scoring_failures);
        }
    }

    Ok(())
}
