use cipherscan_core::ProgressEvent;

use crate::action::Action;
use crate::model::file::{FilePhase, FileState, SortOrder};
use crate::theme::Theme;
use crate::tui_event::BackendEvent;

/// Which screen is currently displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Queue,
    Detail(usize), // index into files vec
}

/// Backend work requested by the user, drained by the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    RerunFile(usize),
    RerunBatch,
}

/// Main application state.
///
/// Single owner: only the main loop mutates this, applying keyboard actions
/// and backend completion events in arrival order.
pub struct App {
    pub screen: Screen,
    pub files: Vec<FileState>,
    /// Filename currently in flight, `None` when idle. At most one file is
    /// ever analyzing during a batch; unordered re-run triggers may race on
    /// this marker and the last completion to land wins.
    pub loading: Option<String>,
    /// Last failure notice, shown in the footer until the next action.
    pub notice: Option<String>,
    pub queue_cursor: usize,
    pub sort_order: SortOrder,
    /// Maps visual row index → file index (recomputed on sort/tick).
    pub queue_sorted: Vec<usize>,
    pub tick: usize,
    pub theme: Theme,
    pub should_quit: bool,
    pub batch_running: bool,
    pub batch_complete: bool,
    pub show_help: bool,
    pub detail_scroll: u16,
    /// Height of the visible table area (set on resize, used for page up/down).
    pub visible_rows: usize,
    pub pending: Option<Request>,
}

impl App {
    pub fn new(files: Vec<FileState>) -> Self {
        let queue_sorted: Vec<usize> = (0..files.len()).collect();

        Self {
            screen: Screen::Queue,
            files,
            loading: None,
            notice: None,
            queue_cursor: 0,
            sort_order: SortOrder::Original,
            queue_sorted,
            tick: 0,
            theme: Theme::hacker(),
            should_quit: false,
            batch_running: false,
            batch_complete: false,
            show_help: false,
            detail_scroll: 0,
            visible_rows: 20,
            pending: None,
        }
    }

    pub fn analyzed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.phase == FilePhase::Done)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.phase == FilePhase::Failed)
            .count()
    }

    /// Recompute `queue_sorted` based on the current `sort_order`.
    pub fn recompute_sorted_indices(&mut self) {
        let mut indices: Vec<usize> = (0..self.files.len()).collect();
        match self.sort_order {
            SortOrder::Original => {} // already in order
            SortOrder::Confidence => {
                indices.sort_by(|&a, &b| {
                    self.files[b]
                        .confidence()
                        .total_cmp(&self.files[a].confidence())
                        .then_with(|| a.cmp(&b))
                });
            }
            SortOrder::Name => {
                indices.sort_by(|&a, &b| self.files[a].filename.cmp(&self.files[b].filename));
            }
        }
        self.queue_sorted = indices;
    }

    /// Process a user action and update state. Returns true if the app should quit.
    pub fn update(&mut self, action: Action) -> bool {
        // When help overlay is shown, only allow a few actions through
        if self.show_help {
            match action {
                Action::Quit => {
                    self.should_quit = true;
                    return true;
                }
                Action::ToggleHelp | Action::NavigateBack => {
                    self.show_help = false;
                }
                Action::Tick => {
                    self.tick = self.tick.wrapping_add(1);
                }
                Action::Resize(_w, h) => {
                    self.visible_rows = (h as usize).saturating_sub(6);
                }
                _ => {} // swallow everything else
            }
            return false;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
                return true;
            }
            Action::ToggleHelp => {
                self.show_help = true;
            }
            Action::NavigateBack => {
                self.screen = Screen::Queue;
                self.notice = None;
            }
            Action::DrillIn => {
                if self.screen == Screen::Queue && self.queue_cursor < self.queue_sorted.len() {
                    let file_idx = self.queue_sorted[self.queue_cursor];
                    self.detail_scroll = 0;
                    self.screen = Screen::Detail(file_idx);
                }
            }
            Action::MoveDown => match &self.screen {
                Screen::Queue => {
                    if self.queue_cursor + 1 < self.files.len() {
                        self.queue_cursor += 1;
                    }
                }
                Screen::Detail(_) => {
                    self.detail_scroll = self.detail_scroll.saturating_add(1);
                }
            },
            Action::MoveUp => match &self.screen {
                Screen::Queue => {
                    self.queue_cursor = self.queue_cursor.saturating_sub(1);
                }
                Screen::Detail(_) => {
                    self.detail_scroll = self.detail_scroll.saturating_sub(1);
                }
            },
            Action::PageDown => {
                let page = self.visible_rows.max(1);
                match &self.screen {
                    Screen::Queue => {
                        self.queue_cursor =
                            (self.queue_cursor + page).min(self.files.len().saturating_sub(1));
                    }
                    Screen::Detail(_) => {
                        self.detail_scroll = self.detail_scroll.saturating_add(page as u16);
                    }
                }
            }
            Action::PageUp => {
                let page = self.visible_rows.max(1);
                match &self.screen {
                    Screen::Queue => {
                        self.queue_cursor = self.queue_cursor.saturating_sub(page);
                    }
                    Screen::Detail(_) => {
                        self.detail_scroll = self.detail_scroll.saturating_sub(page as u16);
                    }
                }
            }
            Action::GoTop => match &self.screen {
                Screen::Queue => self.queue_cursor = 0,
                Screen::Detail(_) => self.detail_scroll = 0,
            },
            Action::GoBottom => match &self.screen {
                Screen::Queue => {
                    self.queue_cursor = self.files.len().saturating_sub(1);
                }
                Screen::Detail(_) => {
                    self.detail_scroll = u16::MAX; // clamped by Paragraph rendering
                }
            },
            Action::CycleSort => {
                if self.screen == Screen::Queue {
                    self.sort_order = self.sort_order.next();
                    self.recompute_sorted_indices();
                }
            }
            Action::Rerun => {
                // One file, out of band. Allowed whenever the batch is not
                // running; each call targets its own slot.
                let target = match &self.screen {
                    Screen::Queue => self.queue_sorted.get(self.queue_cursor).copied(),
                    Screen::Detail(idx) => Some(*idx),
                };
                if let Some(index) = target
                    && !self.batch_running
                {
                    self.notice = None;
                    self.pending = Some(Request::RerunFile(index));
                }
            }
            Action::RerunAll => {
                if !self.batch_running && !self.files.is_empty() {
                    self.notice = None;
                    self.pending = Some(Request::RerunBatch);
                }
            }
            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
                if self.screen == Screen::Queue {
                    self.recompute_sorted_indices();
                }
            }
            Action::Resize(_w, h) => {
                // Rough estimate: total height minus header/footer/borders
                self.visible_rows = (h as usize).saturating_sub(6);
            }
            Action::None => {}
        }
        false
    }

    /// Process a backend event and update model state.
    pub fn handle_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Progress { event } => self.handle_progress(event),
            BackendEvent::BatchComplete => {
                self.batch_running = false;
                self.batch_complete = true;
            }
        }
    }

    fn handle_progress(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Analyzing {
                index, filename, ..
            } => {
                self.loading = Some(filename);
                if let Some(file) = self.files.get_mut(index) {
                    file.phase = FilePhase::Analyzing;
                }
            }
            ProgressEvent::Result {
                index, analysis, ..
            } => {
                // The loading marker is released on every completion path
                self.loading = None;
                if let Some(file) = self.files.get_mut(index) {
                    file.record_result(analysis);
                }
            }
            ProgressEvent::Failed {
                index,
                filename,
                message,
                ..
            } => {
                self.loading = None;
                self.notice = Some(format!("Error analyzing {filename}: {message}"));
                if let Some(file) = self.files.get_mut(index) {
                    file.record_failure(message);
                }
            }
        }
    }

    /// Render the current screen.
    pub fn view(&self, f: &mut ratatui::Frame) {
        match &self.screen {
            Screen::Queue => crate::view::queue::render(f, self),
            Screen::Detail(idx) => crate::view::detail::render(f, self, *idx),
        }

        if self.show_help {
            crate::view::help::render(f, &self.theme);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipherscan_core::FileAnalysis;

    fn app_with(names: &[&str]) -> App {
        App::new(
            names
                .iter()
                .map(|n| FileState::new(n.to_string(), 16))
                .collect(),
        )
    }

    fn analyzing(index: usize, filename: &str) -> BackendEvent {
        BackendEvent::Progress {
            event: ProgressEvent::Analyzing {
                index,
                total: 3,
                filename: filename.to_string(),
            },
        }
    }

    fn result(index: usize, filename: &str, confidence: f64) -> BackendEvent {
        BackendEvent::Progress {
            event: ProgressEvent::Result {
                index,
                total: 3,
                analysis: FileAnalysis {
                    filename: filename.to_string(),
                    algorithm: "AES".to_string(),
                    confidence,
                    ciphertext_preview: String::new(),
                },
            },
        }
    }

    fn failed(index: usize, filename: &str) -> BackendEvent {
        BackendEvent::Progress {
            event: ProgressEvent::Failed {
                index,
                total: 3,
                filename: filename.to_string(),
                message: "network error".to_string(),
            },
        }
    }

    #[test]
    fn loading_marker_names_at_most_one_file() {
        let mut app = app_with(&["a.enc", "b.enc", "c.enc"]);

        app.handle_backend_event(analyzing(0, "a.enc"));
        assert_eq!(app.loading.as_deref(), Some("a.enc"));
        app.handle_backend_event(result(0, "a.enc", 0.9));
        assert_eq!(app.loading, None);

        app.handle_backend_event(analyzing(1, "b.enc"));
        assert_eq!(app.loading.as_deref(), Some("b.enc"));
    }

    #[test]
    fn loading_marker_released_on_failure_too() {
        let mut app = app_with(&["a.enc", "b.enc", "c.enc"]);

        app.handle_backend_event(analyzing(1, "b.enc"));
        app.handle_backend_event(failed(1, "b.enc"));
        assert_eq!(app.loading, None);
        assert_eq!(app.files[1].phase, FilePhase::Failed);
        // The failure is surfaced as a notice naming the file
        assert!(app.notice.as_deref().unwrap().contains("b.enc"));
    }

    #[test]
    fn failure_does_not_touch_other_slots() {
        let mut app = app_with(&["a.enc", "b.enc", "c.enc"]);
        app.handle_backend_event(analyzing(0, "a.enc"));
        app.handle_backend_event(result(0, "a.enc", 0.9));
        app.handle_backend_event(analyzing(1, "b.enc"));
        app.handle_backend_event(failed(1, "b.enc"));

        assert_eq!(app.files[0].phase, FilePhase::Done);
        assert_eq!(app.files[2].phase, FilePhase::Queued);
    }

    #[test]
    fn rerun_is_blocked_while_batch_runs() {
        let mut app = app_with(&["a.enc", "b.enc", "c.enc"]);
        app.batch_running = true;
        app.update(Action::Rerun);
        assert_eq!(app.pending, None);

        app.batch_running = false;
        app.update(Action::Rerun);
        assert_eq!(app.pending, Some(Request::RerunFile(0)));
    }

    #[test]
    fn rerun_targets_selected_row_through_sort() {
        let mut app = app_with(&["b.enc", "a.enc", "c.enc"]);
        app.sort_order = SortOrder::Name;
        app.recompute_sorted_indices();
        // First visual row is a.enc, which is file index 1
        app.update(Action::Rerun);
        assert_eq!(app.pending, Some(Request::RerunFile(1)));
    }

    #[test]
    fn confidence_sort_is_descending() {
        let mut app = app_with(&["a.enc", "b.enc", "c.enc"]);
        app.handle_backend_event(result(0, "a.enc", 0.2));
        app.handle_backend_event(result(1, "b.enc", 0.9));
        app.handle_backend_event(result(2, "c.enc", 0.5));
        app.sort_order = SortOrder::Confidence;
        app.recompute_sorted_indices();
        assert_eq!(app.queue_sorted, vec![1, 2, 0]);
    }
}
