use ratatui::crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};

use crate::action::Action;
use crate::app::InputMode;

/// Map a crossterm terminal event to a TUI action, respecting input mode.
pub fn map_event(event: &Event, input_mode: &InputMode) -> Action {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            // Ctrl+C always quits regardless of mode
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Action::Quit;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
                return Action::Clear;
            }

            match input_mode {
                InputMode::Editing => map_key_editing(key),
                InputMode::Browsing => map_key_browsing(key),
                InputMode::ConfirmQuit => map_key_confirm_quit(key),
            }
        }
        Event::Mouse(mouse) => map_mouse(mouse),
        Event::Resize(w, h) => Action::Resize(*w, *h),
        _ => Action::None,
    }
}

fn map_mouse(mouse: &MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::ScrollDown => Action::MoveDown,
        MouseEventKind::ScrollUp => Action::MoveUp,
        _ => Action::None,
    }
}

fn map_key_editing(key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::ClearInput,
        KeyCode::Char(c) => Action::InputChar(c),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Enter => Action::Submit,
        KeyCode::Tab => Action::ToggleFocus,
        KeyCode::Esc => Action::Quit,
        KeyCode::Up => Action::MoveUp,
        KeyCode::Down => Action::MoveDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        _ => Action::None,
    }
}

fn map_key_browsing(key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
        KeyCode::Char('g') | KeyCode::Home => Action::GoTop,
        KeyCode::Char('G') | KeyCode::End => Action::GoBottom,
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::PageDown,
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Tab => Action::ToggleFocus,
        _ => Action::None,
    }
}

fn map_key_confirm_quit(key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('y') | KeyCode::Enter => Action::ConfirmQuit,
        KeyCode::Esc | KeyCode::Char('n') => Action::CancelQuit,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn ctrl_c_quits_in_every_mode() {
        for mode in [InputMode::Editing, InputMode::Browsing, InputMode::ConfirmQuit] {
            assert_eq!(
                map_event(&key(KeyCode::Char('c'), KeyModifiers::CONTROL), &mode),
                Action::Quit
            );
        }
    }

    #[test]
    fn letters_type_while_editing_but_navigate_while_browsing() {
        let j = key(KeyCode::Char('j'), KeyModifiers::NONE);
        assert_eq!(map_event(&j, &InputMode::Editing), Action::InputChar('j'));
        assert_eq!(map_event(&j, &InputMode::Browsing), Action::MoveDown);
    }

    #[test]
    fn ctrl_l_clears_from_any_focus() {
        let ctrl_l = key(KeyCode::Char('l'), KeyModifiers::CONTROL);
        assert_eq!(map_event(&ctrl_l, &InputMode::Editing), Action::Clear);
        assert_eq!(map_event(&ctrl_l, &InputMode::Browsing), Action::Clear);
    }

    #[test]
    fn enter_submits_or_confirms() {
        let enter = key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(map_event(&enter, &InputMode::Editing), Action::Submit);
        assert_eq!(map_event(&enter, &InputMode::ConfirmQuit), Action::ConfirmQuit);
        assert_eq!(map_event(&enter, &InputMode::Browsing), Action::None);
    }
}
