//! Strictly sequential batch analysis.
//!
//! Files are analyzed one at a time in selection order; the next upload does
//! not begin until the previous one has fully completed, success or failure.
//! Exactly one file is ever in flight, which keeps the front-ends' loading
//! indicator unambiguous and avoids hitting the inference service with
//! concurrent uploads.

use std::path::{Path, PathBuf};

use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{BatchStats, CoreError, FileAnalysis, InferenceClient, ProgressEvent};

/// Analyze a single file: read its bytes and upload them for prediction.
///
/// Also the entry point for out-of-band re-runs of one file. Each call
/// targets its own result slot in the caller's state, so a re-run composes
/// with a batch that is not currently running.
pub async fn analyze_one(
    client: &InferenceClient,
    path: &Path,
) -> Result<FileAnalysis, CoreError> {
    let filename = display_name(path);
    let bytes = tokio::fs::read(path).await?;
    debug!("analyzing {filename} ({} bytes)", bytes.len());
    Ok(client.predict_file(&filename, bytes).await?)
}

/// Analyze `paths` one at a time, in selection order.
///
/// Progress is reported through the callback. A failed file emits
/// [`ProgressEvent::Failed`] and the loop continues with the next one.
/// Cancellation is checked between files only; an issued upload is never
/// aborted. Files that were never started count as `skipped`.
pub async fn analyze_files(
    paths: &[PathBuf],
    client: &InferenceClient,
    progress: impl Fn(ProgressEvent),
    cancel: CancellationToken,
) -> BatchStats {
    let total = paths.len();
    let mut stats = BatchStats {
        total,
        ..BatchStats::default()
    };

    for (index, path) in paths.iter().enumerate() {
        if cancel.is_cancelled() {
            stats.skipped = total - index;
            break;
        }

        let filename = display_name(path);
        progress(ProgressEvent::Analyzing {
            index,
            total,
            filename: filename.clone(),
        });

        match analyze_one(client, path).await {
            Ok(analysis) => {
                stats.analyzed += 1;
                progress(ProgressEvent::Result {
                    index,
                    total,
                    analysis,
                });
            }
            Err(err) => {
                stats.failed += 1;
                progress(ProgressEvent::Failed {
                    index,
                    total,
                    filename,
                    message: err.to_string(),
                });
            }
        }
    }

    stats
}

/// File name shown to the user and sent to the service.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::{Multipart, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};

    use crate::Endpoints;

    /// Stub inference service that records arrival order and how many
    /// uploads were ever in flight at once.
    #[derive(Default)]
    struct Upstream {
        order: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    async fn predict_file(
        State(upstream): State<Arc<Upstream>>,
        mut multipart: Multipart,
    ) -> axum::response::Response {
        let field = multipart.next_field().await.unwrap().unwrap();
        assert_eq!(field.name(), Some("file"));
        let filename = field.file_name().unwrap().to_string();
        let _ = field.bytes().await.unwrap();

        let now = upstream.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        upstream.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        upstream.in_flight.fetch_sub(1, Ordering::SeqCst);
        upstream.order.lock().unwrap().push(filename.clone());

        if filename.starts_with("bad") {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "File analysis failed: bad input",
            )
                .into_response();
        }
        Json(serde_json::json!({
            "filename": filename,
            "algorithm": "AES",
            "confidence": 0.8,
            "ciphertext_preview": "4d2f"
        }))
        .into_response()
    }

    async fn spawn_upstream() -> (String, Arc<Upstream>) {
        let upstream = Arc::new(Upstream::default());
        let app = Router::new()
            .route("/predict-file", post(predict_file))
            .with_state(upstream.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), upstream)
    }

    fn client_for(ml_base: String) -> InferenceClient {
        InferenceClient::new(Endpoints {
            ml_base,
            ..Endpoints::default()
        })
    }

    fn write_files(dir: &tempfile::TempDir, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                std::fs::write(&path, b"\xde\xad\xbe\xef").unwrap();
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn batch_runs_sequentially_in_selection_order() {
        let (base, upstream) = spawn_upstream().await;
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(&dir, &["c.enc", "a.enc", "b.enc"]);
        let client = client_for(base);

        let events = Mutex::new(Vec::new());
        let stats = analyze_files(
            &paths,
            &client,
            |e| events.lock().unwrap().push(e),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(
            stats,
            BatchStats {
                total: 3,
                analyzed: 3,
                failed: 0,
                skipped: 0
            }
        );
        // Selection order, not alphabetical
        assert_eq!(
            *upstream.order.lock().unwrap(),
            vec!["c.enc", "a.enc", "b.enc"]
        );
        assert_eq!(upstream.max_in_flight.load(Ordering::SeqCst), 1);

        // Events alternate Analyzing/Result per file
        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 6);
        assert!(matches!(
            &events[0],
            ProgressEvent::Analyzing { index: 0, filename, .. } if filename == "c.enc"
        ));
        assert!(matches!(&events[1], ProgressEvent::Result { index: 0, .. }));
    }

    #[tokio::test]
    async fn failure_does_not_stop_the_batch() {
        let (base, upstream) = spawn_upstream().await;
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(&dir, &["a.enc", "bad.enc", "z.enc"]);
        let client = client_for(base);

        let events = Mutex::new(Vec::new());
        let stats = analyze_files(
            &paths,
            &client,
            |e| events.lock().unwrap().push(e),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(stats.analyzed, 2);
        assert_eq!(stats.failed, 1);
        // The file after the failure was still uploaded
        assert_eq!(
            *upstream.order.lock().unwrap(),
            vec!["a.enc", "bad.enc", "z.enc"]
        );

        let events = events.into_inner().unwrap();
        let failed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Failed { filename, message, .. } => {
                    Some((filename.clone(), message.clone()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "bad.enc");
        assert!(failed[0].1.contains("File analysis failed"));
    }

    #[tokio::test]
    async fn unreadable_file_fails_and_batch_continues() {
        let (base, upstream) = spawn_upstream().await;
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_files(&dir, &["a.enc"]);
        paths.insert(0, dir.path().join("missing.enc"));
        let client = client_for(base);

        let events = Mutex::new(Vec::new());
        let stats = analyze_files(
            &paths,
            &client,
            |e| events.lock().unwrap().push(e),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.analyzed, 1);
        // The missing file never reached the service
        assert_eq!(*upstream.order.lock().unwrap(), vec!["a.enc"]);
    }

    #[tokio::test]
    async fn cancellation_skips_files_not_yet_started() {
        let (base, upstream) = spawn_upstream().await;
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(&dir, &["a.enc", "b.enc", "c.enc"]);
        let client = client_for(base);

        let cancel = CancellationToken::new();
        let cancel_after_first = cancel.clone();
        let stats = analyze_files(
            &paths,
            &client,
            move |e| {
                if matches!(e, ProgressEvent::Result { index: 0, .. }) {
                    cancel_after_first.cancel();
                }
            },
            cancel,
        )
        .await;

        assert_eq!(stats.analyzed, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(*upstream.order.lock().unwrap(), vec!["a.enc"]);
    }

    #[test]
    fn display_name_uses_final_component() {
        assert_eq!(display_name(Path::new("/tmp/data/x.enc")), "x.enc");
        assert_eq!(display_name(Path::new("plain.bin")), "plain.bin");
    }
}
