use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cipherscan_core::{InferenceClient, ProgressEvent, batch};

use crate::tui_event::BackendEvent;

/// Run the sequential batch, forwarding progress events to the TUI.
///
/// Files are uploaded one at a time in queue order; a failure is reported and
/// the batch continues with the next file.
pub async fn run_batch(
    paths: Vec<PathBuf>,
    client: InferenceClient,
    tx: mpsc::UnboundedSender<BackendEvent>,
    cancel: CancellationToken,
) {
    let tx_progress = tx.clone();
    let progress = move |event: ProgressEvent| {
        let _ = tx_progress.send(BackendEvent::Progress { event });
    };

    batch::analyze_files(&paths, &client, progress, cancel).await;

    let _ = tx.send(BackendEvent::BatchComplete);
}

/// Re-run a single file out of band.
///
/// Emits the same event sequence as one step of the batch, targeting the
/// file's own queue slot. An Analyzing event is always followed by exactly
/// one Result or Failed event, so the loading indicator is released on every
/// exit path.
pub async fn run_single(
    index: usize,
    total: usize,
    path: PathBuf,
    client: InferenceClient,
    tx: mpsc::UnboundedSender<BackendEvent>,
) {
    let filename = batch::display_name(&path);
    let _ = tx.send(BackendEvent::Progress {
        event: ProgressEvent::Analyzing {
            index,
            total,
            filename: filename.clone(),
        },
    });

    let event = match batch::analyze_one(&client, &path).await {
        Ok(analysis) => ProgressEvent::Result {
            index,
            total,
            analysis,
        },
        Err(err) => ProgressEvent::Failed {
            index,
            total,
            filename,
            message: err.to_string(),
        },
    };
    let _ = tx.send(BackendEvent::Progress { event });
}
