//! Shared model and batch analysis engine for cipher prediction.

use thiserror::Error;

pub mod batch;
pub mod format;

// Re-export for convenience
pub use cipherscan_client::{
    ClientError, Endpoints, FileAnalysis, InferenceClient, Prediction, PredictionRequest,
    TopCandidate,
};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("prediction error: {0}")]
    Client(#[from] cipherscan_client::ClientError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Progress events emitted while a batch is analyzed.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Upload of the file at `index` has started; it is the only one in flight.
    Analyzing {
        index: usize,
        total: usize,
        filename: String,
    },
    /// The file was analyzed successfully.
    Result {
        index: usize,
        total: usize,
        analysis: FileAnalysis,
    },
    /// The file failed; the batch moves on to the next one.
    Failed {
        index: usize,
        total: usize,
        filename: String,
        message: String,
    },
}

/// Summary counters for a complete batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub analyzed: usize,
    pub failed: usize,
    /// Files never started because the run was cancelled between files.
    pub skipped: usize,
}
