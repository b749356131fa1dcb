/// Everything the UI can be asked to do, decoupled from the key that asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    ConfirmQuit,
    CancelQuit,
    Submit,
    Clear,
    InputChar(char),
    Backspace,
    /// Ctrl+U: wipe the query field.
    ClearInput,
    ToggleFocus,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    GoTop,
    GoBottom,
    Tick,
    Resize(u16, u16),
}
