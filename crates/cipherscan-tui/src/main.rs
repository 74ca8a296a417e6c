use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ratatui::Terminal;
use ratatui::crossterm::event;
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cipherscan_core::{Endpoints, InferenceClient, batch};

mod action;
mod app;
mod backend;
mod input;
mod model;
mod theme;
mod tui_event;
mod view;

use app::{App, Request};
use model::file::FileState;

/// CipherScan TUI - batch cipher algorithm detection with a terminal interface.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Encrypted files to analyze
    paths: Vec<PathBuf>,

    /// Proxy base URL for the text path
    #[arg(long)]
    api_url: Option<String>,

    /// Inference service base URL for file uploads
    #[arg(long)]
    ml_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Validate any file paths provided on the command line
    for path in &args.paths {
        if !path.exists() {
            anyhow::bail!("file not found: {}", path.display());
        }
    }

    // Resolve config from CLI flags > env vars > defaults
    let mut endpoints = Endpoints::from_env();
    if let Some(api_base) = args.api_url {
        endpoints.api_base = api_base;
    }
    if let Some(ml_base) = args.ml_url {
        endpoints.ml_base = ml_base;
    }
    let client = InferenceClient::new(endpoints);

    // Build queue entries for display
    let files: Vec<FileState> = args
        .paths
        .iter()
        .map(|path| {
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            FileState::new(batch::display_name(path), size)
        })
        .collect();

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Install panic hook that restores terminal before printing panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Drain any stray input events (e.g. Enter keypress from launching the command)
    while event::poll(Duration::from_millis(50)).unwrap_or(false) {
        let _ = event::read();
    }

    let mut app = App::new(files);

    // Launch batch analysis (only if files were provided)
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    if !args.paths.is_empty() {
        app.batch_running = true;
        let cancel_clone = cancel.clone();
        let paths = args.paths.clone();
        let client_clone = client.clone();
        let tx_clone = tx.clone();
        tokio::spawn(async move {
            backend::run_batch(paths, client_clone, tx_clone, cancel_clone).await;
        });
    }

    // Also handle Ctrl+C at the OS level for clean shutdown
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_for_signal.cancel();
        }
    });

    // Main event loop
    let tick_rate = Duration::from_millis(100);

    loop {
        // Draw
        terminal.draw(|f| app.view(f))?;

        // Poll for events with timeout for tick
        let timeout = tick_rate;

        tokio::select! {
            // Backend events (non-blocking drain)
            maybe_event = rx.recv() => {
                if let Some(backend_event) = maybe_event {
                    app.handle_backend_event(backend_event);
                    // Drain any additional queued backend events
                    while let Ok(evt) = rx.try_recv() {
                        app.handle_backend_event(evt);
                    }
                }
            }
            // Terminal input events
            _ = async {
                if event::poll(timeout).unwrap_or(false)
                    && let Ok(evt) = event::read()
                {
                    let action = input::map_event(&evt);
                    app.update(action);
                }
            } => {}
        }

        // Launch any backend work the user requested
        if let Some(request) = app.pending.take() {
            dispatch(request, &args.paths, &client, &tx, &cancel, &mut app);
        }

        // Process tick
        app.update(action::Action::Tick);

        if app.should_quit {
            cancel.cancel();
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}

/// Spawn the backend task for a user request.
fn dispatch(
    request: Request,
    paths: &[PathBuf],
    client: &InferenceClient,
    tx: &mpsc::UnboundedSender<tui_event::BackendEvent>,
    cancel: &CancellationToken,
    app: &mut App,
) {
    match request {
        Request::RerunFile(index) => {
            let Some(path) = paths.get(index) else {
                return;
            };
            let total = paths.len();
            let path = path.clone();
            let client = client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                backend::run_single(index, total, path, client, tx).await;
            });
        }
        Request::RerunBatch => {
            app.batch_running = true;
            app.batch_complete = false;
            let paths = paths.to_vec();
            let client = client.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                backend::run_batch(paths, client, tx, cancel).await;
            });
        }
    }
}
