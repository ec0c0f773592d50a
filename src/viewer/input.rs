//! Input processing layer: key and mouse mapping, numeric prefix accumulator.
//!
//! Pure logic, no I/O. All functions are deterministic and testable.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use super::state::{Layout, SidebarRow, item_at};
use crate::catalog::PatternEntry;

const MAX_COUNT: u32 = 9_999;

/// Accumulated numeric prefix for vim/less-style commands (`10j`).
pub(super) struct InputAccumulator {
    count: Option<u32>,
}

impl InputAccumulator {
    pub(super) fn new() -> Self {
        Self { count: None }
    }

    fn push_digit(&mut self, d: u32) {
        let new = self.count.unwrap_or(0).saturating_mul(10).saturating_add(d);
        if new <= MAX_COUNT {
            self.count = Some(new);
        }
    }

    pub(super) fn peek(&self) -> Option<u32> {
        self.count
    }

    fn take(&mut self) -> u32 {
        self.count.take().unwrap_or(1)
    }

    pub(super) fn reset(&mut self) {
        self.count = None;
    }
}

/// Actions produced by key input processing.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Action {
    Quit,
    ScrollDown(u32),
    ScrollUp(u32),
    SelectNext(u32),
    SelectPrev(u32),
    OpenSelected,
    Close,
    /// A digit was accumulated.
    Digit,
}

pub(super) fn map_key_event(key: KeyEvent, acc: &mut InputAccumulator) -> Option<Action> {
    let KeyEvent { code, modifiers, .. } = key;

    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),

        (KeyCode::Esc, _) => {
            acc.reset();
            Some(Action::Close)
        }

        (KeyCode::Char(c @ '0'..='9'), KeyModifiers::NONE) => {
            acc.push_digit(c as u32 - '0' as u32);
            Some(Action::Digit)
        }

        (KeyCode::Char('j'), _) => Some(Action::ScrollDown(acc.take())),
        (KeyCode::Char('k'), _) => Some(Action::ScrollUp(acc.take())),
        (KeyCode::Down, _) | (KeyCode::Tab, _) => Some(Action::SelectNext(acc.take())),
        (KeyCode::Up, _) | (KeyCode::BackTab, _) => Some(Action::SelectPrev(acc.take())),
        (KeyCode::Enter, _) => {
            acc.reset();
            Some(Action::OpenSelected)
        }

        _ => None,
    }
}

/// What the pointer did, in sidebar terms.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum PointerAction {
    /// Over an item (the same one or a new one).
    Over { entry: &'static PatternEntry, col: u16, row: u16 },
    /// Somewhere that is not an item.
    Off,
    Click(&'static PatternEntry),
    ScrollDown,
    ScrollUp,
}

pub(super) fn map_mouse_event(
    ev: MouseEvent,
    rows: &[SidebarRow],
    layout: &Layout,
) -> Option<PointerAction> {
    let (col, row) = (ev.column, ev.row);
    let hit = item_at(rows, layout, col, row);
    match ev.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(match hit {
            Some(entry) => PointerAction::Over { entry, col, row },
            None => PointerAction::Off,
        }),
        MouseEventKind::Down(MouseButton::Left) => hit.map(PointerAction::Click),
        MouseEventKind::ScrollDown => Some(PointerAction::ScrollDown),
        MouseEventKind::ScrollUp => Some(PointerAction::ScrollUp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::state::{compute_layout, sidebar_rows};
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn simple_key(code: KeyCode) -> KeyEvent {
        key(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_5j_scroll_down() {
        let mut acc = InputAccumulator::new();
        assert_eq!(map_key_event(simple_key(KeyCode::Char('5')), &mut acc), Some(Action::Digit));
        assert_eq!(acc.peek(), Some(5));
        assert_eq!(
            map_key_event(simple_key(KeyCode::Char('j')), &mut acc),
            Some(Action::ScrollDown(5))
        );
        // Count is consumed.
        assert_eq!(
            map_key_event(simple_key(KeyCode::Char('k')), &mut acc),
            Some(Action::ScrollUp(1))
        );
    }

    #[test]
    fn test_quit_keys() {
        let mut acc = InputAccumulator::new();
        assert_eq!(map_key_event(simple_key(KeyCode::Char('q')), &mut acc), Some(Action::Quit));
        assert_eq!(
            map_key_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL), &mut acc),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_esc_closes_and_resets() {
        let mut acc = InputAccumulator::new();
        map_key_event(simple_key(KeyCode::Char('3')), &mut acc);
        assert_eq!(map_key_event(simple_key(KeyCode::Esc), &mut acc), Some(Action::Close));
        assert_eq!(
            map_key_event(simple_key(KeyCode::Down), &mut acc),
            Some(Action::SelectNext(1))
        );
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let mut acc = InputAccumulator::new();
        assert!(map_key_event(simple_key(KeyCode::Char('x')), &mut acc).is_none());
    }

    #[test]
    fn test_mouse_over_item_and_off() {
        let rows = sidebar_rows();
        let layout = compute_layout(100, 40, 26);
        let over = map_mouse_event(mouse(MouseEventKind::Moved, 4, 3), &rows, &layout);
        assert!(matches!(over, Some(PointerAction::Over { entry, col: 4, row: 3 }) if entry.id == "singleton"));

        let off = map_mouse_event(mouse(MouseEventKind::Moved, 60, 3), &rows, &layout);
        assert_eq!(off, Some(PointerAction::Off));
    }

    #[test]
    fn test_click_outside_items_is_ignored() {
        let rows = sidebar_rows();
        let layout = compute_layout(100, 40, 26);
        let header = map_mouse_event(mouse(MouseEventKind::Down(MouseButton::Left), 4, 2), &rows, &layout);
        assert!(header.is_none());
        let item = map_mouse_event(mouse(MouseEventKind::Down(MouseButton::Left), 4, 4), &rows, &layout);
        assert!(matches!(item, Some(PointerAction::Click(e)) if e.id == "prototype"));
    }
}
