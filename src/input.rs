use crate::filter::RunsTab;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissNotice,
    MoveUp,
    MoveDown,
    NextPage,
    PreviousPage,
    NextTab,
    SelectTab(RunsTab),
    BeginEdit,
    RemoveLastToken,
    ClearTokens,
    AddTagFilter,
    AddJobFilter,
    Refresh,
    InputChar(char),
    InputBackspace,
    SubmitEdit,
    CancelEdit,
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub editing: bool,
    pub has_notice: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    if ctx.editing {
        return match key.code {
            KeyCode::Enter => Action::SubmitEdit,
            KeyCode::Esc => Action::CancelEdit,
            KeyCode::Backspace => Action::InputBackspace,
            KeyCode::Char(c) => Action::InputChar(c),
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_notice {
                Action::DismissNotice
            } else {
                Action::Quit
            }
        }
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Right | KeyCode::Char('n') => Action::NextPage,
        KeyCode::Left | KeyCode::Char('p') => Action::PreviousPage,
        KeyCode::Tab => Action::NextTab,
        KeyCode::Char(c @ '1'..='4') => {
            Action::SelectTab(RunsTab::TABS[(c as u8 - b'1') as usize])
        }
        KeyCode::Char('/') => Action::BeginEdit,
        KeyCode::Backspace => Action::RemoveLastToken,
        KeyCode::Char('c') => Action::ClearTokens,
        KeyCode::Char('t') => Action::AddTagFilter,
        KeyCode::Char('J') => Action::AddJobFilter,
        KeyCode::Char('r') => Action::Refresh,
        _ => Action::None,
    }
}
