//! Viewer state: layout, sidebar rows, hit testing, document pane.

use crate::catalog::{CATALOG, Category, PatternEntry};
use crate::convert::Line;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Layout {
    pub term_cols: u16,
    pub sidebar_cols: u16,
    pub doc_col: u16,  // first column of the document pane (sidebar + separator)
    pub doc_cols: u16, // document pane width
    pub body_rows: u16, // everything above the status bar
    pub status_row: u16,
}

pub(super) fn compute_layout(term_cols: u16, term_rows: u16, sidebar_cols: u16) -> Layout {
    let sidebar_cols = sidebar_cols.min(term_cols);
    let doc_col = sidebar_cols.saturating_add(1).min(term_cols);
    let doc_cols = term_cols.saturating_sub(doc_col);
    let body_rows = term_rows.saturating_sub(1);
    let status_row = term_rows.saturating_sub(1);
    Layout {
        term_cols,
        sidebar_cols,
        doc_col,
        doc_cols,
        body_rows,
        status_row,
    }
}

// ---------------------------------------------------------------------------
// Sidebar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SidebarRow {
    Title,
    Blank,
    Category(Category),
    Item(&'static PatternEntry),
}

/// Title, then each category header followed by its patterns.
pub(super) fn sidebar_rows() -> Vec<SidebarRow> {
    let mut rows = vec![SidebarRow::Title, SidebarRow::Blank];
    for category in Category::ALL {
        rows.push(SidebarRow::Category(category));
        rows.extend(
            CATALOG
                .iter()
                .filter(|e| e.category == category)
                .map(SidebarRow::Item),
        );
        rows.push(SidebarRow::Blank);
    }
    rows
}

/// Which pattern, if any, is under cell `(col, row)`.
pub(super) fn item_at(
    rows: &[SidebarRow],
    layout: &Layout,
    col: u16,
    row: u16,
) -> Option<&'static PatternEntry> {
    if col >= layout.sidebar_cols || row >= layout.body_rows {
        return None;
    }
    match rows.get(row as usize) {
        Some(SidebarRow::Item(e)) => Some(e),
        _ => None,
    }
}

/// Row index of the item at `index` among items only.
pub(super) fn item_row(rows: &[SidebarRow], index: usize) -> Option<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, r)| matches!(r, SidebarRow::Item(_)))
        .nth(index)
        .map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

pub(super) struct OpenDocument {
    pub entry: &'static PatternEntry,
    pub lines: Vec<Line>,
    pub warm: bool,
}

pub(super) struct ViewState {
    /// Keyboard selection, index into items (not rows).
    pub selected: usize,
    pub scroll: usize,
    pub open: Option<OpenDocument>,
    pub flash: Option<String>,
}

impl ViewState {
    pub(super) fn new() -> Self {
        Self {
            selected: 0,
            scroll: 0,
            open: None,
            flash: None,
        }
    }

    pub(super) fn max_scroll(&self, layout: &Layout) -> usize {
        let len = self.open.as_ref().map(|d| d.lines.len()).unwrap_or(0);
        len.saturating_sub(layout.body_rows as usize)
    }

    pub(super) fn scroll_by(&mut self, delta: isize, layout: &Layout) {
        let max = self.max_scroll(layout);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }

    pub(super) fn select_by(&mut self, delta: isize) {
        let last = CATALOG.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }
}
