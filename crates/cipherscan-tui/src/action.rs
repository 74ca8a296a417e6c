/// Actions that the TUI can process, mapped from keyboard input or internal events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NavigateBack,
    DrillIn,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    GoTop,
    GoBottom,
    CycleSort,
    ToggleHelp,
    /// Re-run analysis of the selected file.
    Rerun,
    /// Re-run the whole batch.
    RerunAll,
    Tick,
    Resize(u16, u16),
    None,
}
