//! One-shot command line front-end for cipher algorithm detection.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use cipherscan_core::{
    BatchStats, Endpoints, InferenceClient, Prediction, ProgressEvent, batch, format,
};

/// Cipher algorithm detection - predict the encryption algorithm behind
/// ciphertext or encrypted files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Proxy base URL for the text path
    #[arg(long)]
    api_url: Option<String>,

    /// Inference service base URL for file uploads
    #[arg(long)]
    ml_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a ciphertext string (routed through the proxy)
    Text {
        /// Ciphertext to analyze; reads stdin when omitted
        ciphertext: Option<String>,
    },
    /// Analyze encrypted files one at a time, in the given order
    Files {
        /// Files to upload
        paths: Vec<PathBuf>,
    },
    /// Check that the inference service is reachable
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    // CLI flags win over env vars, env vars over defaults
    let mut endpoints = Endpoints::from_env();
    if let Some(api_base) = args.api_url {
        endpoints.api_base = api_base;
    }
    if let Some(ml_base) = args.ml_url {
        endpoints.ml_base = ml_base;
    }
    let client = InferenceClient::new(endpoints);

    match args.command {
        Command::Text { ciphertext } => run_text(&client, ciphertext).await,
        Command::Files { paths } => run_files(&client, paths).await,
        Command::Health => run_health(&client).await,
    }
}

async fn run_text(
    client: &InferenceClient,
    ciphertext: Option<String>,
) -> anyhow::Result<ExitCode> {
    let text = match ciphertext {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    if text.trim().is_empty() {
        anyhow::bail!("no ciphertext given");
    }

    let prediction = client.predict_text(&text).await?;
    print_prediction(&prediction);
    Ok(ExitCode::SUCCESS)
}

fn print_prediction(prediction: &Prediction) {
    println!(
        "{} {}",
        "Predicted algorithm:".bold(),
        prediction.algorithm.green().bold()
    );
    println!("confidence: {}", format::confidence(prediction.confidence));

    if !prediction.top.is_empty() {
        println!();
        println!("{}", "Top candidates".bold());
        for candidate in &prediction.top {
            println!(
                "  {:<24} {}",
                candidate.label,
                format::percent(candidate.prob).cyan()
            );
        }
    }
}

async fn run_files(client: &InferenceClient, paths: Vec<PathBuf>) -> anyhow::Result<ExitCode> {
    if paths.is_empty() {
        anyhow::bail!("no files given");
    }
    for path in &paths {
        if !path.exists() {
            anyhow::bail!("file not found: {}", path.display());
        }
    }

    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner} [{pos}/{len}] {msg}",
    )?);

    let cancel = CancellationToken::new();
    let cancel_on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_on_ctrl_c.cancel();
        }
    });

    let bar_for_events = bar.clone();
    let stats = batch::analyze_files(
        &paths,
        client,
        move |event| match event {
            ProgressEvent::Analyzing { filename, .. } => {
                bar_for_events.set_message(filename);
            }
            ProgressEvent::Result { analysis, .. } => {
                bar_for_events.println(format!(
                    "{} {} - {} ({})",
                    "ok".green().bold(),
                    analysis.filename,
                    analysis.algorithm,
                    format::percent(analysis.confidence),
                ));
                bar_for_events.inc(1);
            }
            ProgressEvent::Failed {
                filename, message, ..
            } => {
                bar_for_events.println(format!(
                    "{} error analyzing {filename}: {message}",
                    "!!".red().bold(),
                ));
                bar_for_events.inc(1);
            }
        },
        cancel,
    )
    .await;

    bar.finish_and_clear();
    print_stats(&stats);
    Ok(if stats.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_stats(stats: &BatchStats) {
    let mut parts = vec![format!("{} analyzed", stats.analyzed)];
    if stats.failed > 0 {
        parts.push(format!("{} failed", stats.failed));
    }
    if stats.skipped > 0 {
        parts.push(format!("{} skipped", stats.skipped));
    }
    println!("{} files: {}", stats.total, parts.join(", "));
}

async fn run_health(client: &InferenceClient) -> anyhow::Result<ExitCode> {
    match client.health().await {
        Ok(status) => {
            println!("{status:#}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{} {err}", "unreachable:".red().bold());
            Ok(ExitCode::FAILURE)
        }
    }
}
