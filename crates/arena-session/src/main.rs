//! Arena session CLI
//!
//! ```bash
//! # Score one message against one cluster
//! arena-session score --cluster pain-point "Vi har problem med fakturorna"
//!
//! # Replay a recorded interview with deterministic follow-up questions
//! arena-session replay interview.json --seed 7
//!
//! # Interactive interview on stdin, answered with the analyzer's follow-ups
//! arena-session chat
//!
//! # Custom thresholds
//! ARENA_MEAN_FLOOR=80 arena-session --config session.toml replay interview.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arena_engine::{ArenaLogicEngine, ClusterId};
use arena_session::{
    replay, FollowUpDialogue, SessionConfig, SessionDriver, SessionSnapshot, Transcript,
};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session config TOML (overrides ARENA_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the analysis of one message as JSON
    Score {
        /// Cluster id, e.g. pain-point or org-reality
        #[arg(long)]
        cluster: String,
        message: String,
    },
    /// Replay a transcript and print one report per turn
    Replay {
        transcript: PathBuf,
        /// Seed for deterministic follow-up questions
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run an interview on stdin, one message per line
    Chat {
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::from_env(),
    };

    match args.command {
        Command::Score { cluster, message } => {
            let cluster: ClusterId = cluster.parse()?;
            let engine = build_engine(&config)?;
            let analysis = engine.analyze(cluster, &message)?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Command::Replay { transcript, seed } => {
            if seed.is_some() {
                config.engine.question_seed = seed;
            }
            let transcript = Transcript::load(&transcript)?;
            let engine = Arc::new(build_engine(&config)?);
            info!(session = %transcript.session_id, turns = transcript.turns.len(), "Replaying transcript");

            let summary = replay(engine, &transcript, &config).await?;
            for report in &summary.reports {
                println!("{}", serde_json::to_string(report)?);
            }
            info!(
                turns = summary.reports.len(),
                complete = summary.snapshot.complete,
                current = %summary.snapshot.current_cluster,
                "Replay finished"
            );
        }
        Command::Chat { seed } => {
            if seed.is_some() {
                config.engine.question_seed = seed;
            }
            let engine = Arc::new(build_engine(&config)?);
            let mut snapshot = SessionSnapshot::new("chat", &engine);
            let driver = SessionDriver::new(engine, Arc::new(FollowUpDialogue), &config);

            println!("{}", ClusterId::PainPoint.opening_question());
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let report = driver.turn(&mut snapshot, line).await?;
                println!(
                    "[{} {}%] {}",
                    report.next_cluster, report.outcome.overall_confidence, report.response.message
                );
                if driver.engine().is_session_complete(&snapshot.clusters) {
                    println!("Alla kluster är tillräckligt belysta.");
                    break;
                }
            }
        }
    }

    Ok(())
}

fn build_engine(config: &SessionConfig) -> Result<ArenaLogicEngine> {
    ArenaLogicEngine::with_config(config.engine.clone()).context("Failed to initialise engine")
}
