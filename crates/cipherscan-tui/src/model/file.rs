use cipherscan_core::FileAnalysis;

/// Processing phase of a file in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePhase {
    Queued,
    Analyzing,
    Done,
    Failed,
}

impl FilePhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Analyzing => "Analyzing...",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// State of a single file in the queue.
#[derive(Debug, Clone)]
pub struct FileState {
    pub filename: String,
    /// Size on disk, for display only.
    pub size: u64,
    pub phase: FilePhase,
    pub result: Option<FileAnalysis>,
    pub error: Option<String>,
}

impl FileState {
    pub fn new(filename: String, size: u64) -> Self {
        Self {
            filename,
            size,
            phase: FilePhase::Queued,
            result: None,
            error: None,
        }
    }

    /// Record (or replace) the analysis for this file.
    ///
    /// Each file owns exactly one slot; a re-run overwrites it, and with
    /// unordered triggers the last completion to land wins.
    pub fn record_result(&mut self, analysis: FileAnalysis) {
        self.phase = FilePhase::Done;
        self.error = None;
        self.result = Some(analysis);
    }

    pub fn record_failure(&mut self, message: String) {
        self.phase = FilePhase::Failed;
        self.error = Some(message);
    }

    pub fn confidence(&self) -> f64 {
        self.result.as_ref().map(|r| r.confidence).unwrap_or(0.0)
    }

    pub fn algorithm_label(&self) -> &str {
        match &self.result {
            Some(r) if !r.algorithm.is_empty() => &r.algorithm,
            _ => "—",
        }
    }
}

/// Sort order for the queue table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Original,
    Confidence,
    Name,
}

impl SortOrder {
    pub fn next(self) -> Self {
        match self {
            Self::Original => Self::Confidence,
            Self::Confidence => Self::Name,
            Self::Name => Self::Original,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Original => "order",
            Self::Confidence => "confidence",
            Self::Name => "name",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(algorithm: &str, confidence: f64) -> FileAnalysis {
        FileAnalysis {
            filename: "a.enc".to_string(),
            algorithm: algorithm.to_string(),
            confidence,
            ciphertext_preview: String::new(),
        }
    }

    #[test]
    fn rerun_overwrites_previous_result() {
        let mut file = FileState::new("a.enc".to_string(), 16);
        file.record_result(analysis("DES", 0.4));
        file.record_result(analysis("AES", 0.9));
        assert_eq!(file.phase, FilePhase::Done);
        assert_eq!(file.result.as_ref().unwrap().algorithm, "AES");
    }

    #[test]
    fn success_after_failure_clears_error() {
        let mut file = FileState::new("a.enc".to_string(), 16);
        file.record_failure("network error".to_string());
        assert_eq!(file.phase, FilePhase::Failed);
        file.record_result(analysis("RC4", 0.7));
        assert_eq!(file.phase, FilePhase::Done);
        assert!(file.error.is_none());
    }

    #[test]
    fn failure_keeps_stale_result_visible() {
        // A failed re-run does not discard the earlier good analysis.
        let mut file = FileState::new("a.enc".to_string(), 16);
        file.record_result(analysis("AES", 0.9));
        file.record_failure("timeout".to_string());
        assert_eq!(file.phase, FilePhase::Failed);
        assert!(file.result.is_some());
        assert_eq!(file.error.as_deref(), Some("timeout"));
    }
}
