use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::controller::UiEvent;

/// Which panel receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Map,
    Form,
    List,
}

/// Terminal-level action resolved from a key press
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Forward to the controller
    Ui(UiEvent),
    /// Click the map at the crosshair
    ClickCenter,
    Pan { lat: f64, lng: f64 },
    Zoom(i8),
    NextField,
    PrevField,
    ToggleKind,
    Input(char),
    Backspace,
    SelectNext,
    SelectPrev,
    /// Open the selected list entry on the map
    OpenSelected,
    FocusNext,
    AskReset,
    ConfirmReset,
    DismissAlert,
    Quit,
}

/// Key bindings per focused panel. Returns `None` for unbound keys.
pub fn resolve(focus: Focus, on_kind_row: bool, key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    match focus {
        Focus::Form => match key.code {
            KeyCode::Enter => Some(Action::Ui(UiEvent::Submit)),
            KeyCode::Esc => Some(Action::Ui(UiEvent::Cancel)),
            KeyCode::Tab | KeyCode::Down => Some(Action::NextField),
            KeyCode::BackTab | KeyCode::Up => Some(Action::PrevField),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if on_kind_row => {
                Some(Action::ToggleKind)
            }
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Char(c) => Some(Action::Input(c)),
            _ => None,
        },
        Focus::Map => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Pan { lat: 1.0, lng: 0.0 }),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Pan { lat: -1.0, lng: 0.0 }),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::Pan { lat: 0.0, lng: -1.0 }),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::Pan { lat: 0.0, lng: 1.0 }),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Zoom(1)),
            KeyCode::Char('-') => Some(Action::Zoom(-1)),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Action::ClickCenter),
            _ => shared(key),
        },
        Focus::List => match key.code {
            KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrev),
            KeyCode::Enter => Some(Action::OpenSelected),
            _ => shared(key),
        },
    }
}

fn shared(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Tab => Some(Action::FocusNext),
        KeyCode::Char('R') => Some(Action::AskReset),
        KeyCode::Char('y') => Some(Action::ConfirmReset),
        KeyCode::Esc => Some(Action::DismissAlert),
        KeyCode::Char('q') => Some(Action::Quit),
        _ => None,
    }
}
