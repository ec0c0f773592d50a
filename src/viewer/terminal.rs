//! Terminal I/O layer: raw mode, mouse capture, sidebar/document/panel drawing.

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor, event,
    style::{self, Stylize},
    terminal,
};
use std::io::{self, Write, stdout};

use super::state::{Layout, SidebarRow, ViewState};
use crate::catalog::PatternId;
use crate::clock::Clock;
use crate::convert::LineKind;
use crate::placement::PlacementRect;
use crate::prefetch::{PrefetchCoordinator, PrefetchState};
use crate::preview::{PreviewData, Visibility};

// ---------------------------------------------------------------------------
// RawGuard: restores the terminal on Drop
// ---------------------------------------------------------------------------

pub(super) struct RawGuard {
    cleaned: bool,
}

impl RawGuard {
    pub(super) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        stdout().execute(terminal::EnterAlternateScreen)?;
        stdout().execute(event::EnableMouseCapture)?;
        stdout().execute(cursor::Hide)?;
        Ok(Self { cleaned: false })
    }

    pub(super) fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        let mut out = stdout();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(event::DisableMouseCapture);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Pad or cut `s` to exactly `width` columns.
fn fit(s: &str, width: usize) -> String {
    let mut out: String = s.chars().take(width).collect();
    let n = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - n));
    out
}

pub(super) fn clear_screen() -> io::Result<()> {
    let mut out = stdout();
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    out.flush()
}

// ---------------------------------------------------------------------------
// Sidebar
// ---------------------------------------------------------------------------

pub(super) fn draw_sidebar<C: Clock>(
    layout: &Layout,
    rows: &[SidebarRow],
    selected_row: Option<usize>,
    hovered: Option<&PatternId>,
    prefetch: &PrefetchCoordinator<C>,
) -> io::Result<()> {
    let mut out = stdout();
    let width = layout.sidebar_cols as usize;
    for screen_row in 0..layout.body_rows {
        out.queue(cursor::MoveTo(0, screen_row))?;
        let text = match rows.get(screen_row as usize) {
            Some(SidebarRow::Title) => fit(" Design Patterns", width).bold(),
            Some(SidebarRow::Category(c)) => fit(&format!(" {c}"), width).dark_cyan().bold(),
            Some(SidebarRow::Item(entry)) => {
                let id = entry.pattern_id();
                let mark = match prefetch.state(&id) {
                    PrefetchState::Prefetched => '•',
                    PrefetchState::Prefetching => '~',
                    PrefetchState::Pending(_) | PrefetchState::Idle => ' ',
                };
                let cell = fit(&format!(" {mark} {}", entry.label), width);
                let is_hovered = hovered == Some(&id);
                let is_selected = selected_row == Some(screen_row as usize);
                match (is_selected, is_hovered) {
                    (true, _) => cell.reverse(),
                    (false, true) => cell.underlined().yellow(),
                    (false, false) => cell.stylize(),
                }
            }
            Some(SidebarRow::Blank) | None => fit("", width).stylize(),
        };
        write!(out, "{text}")?;
        if layout.doc_col > layout.sidebar_cols {
            write!(out, "{}", "│".dark_grey())?;
        }
    }
    out.flush()
}

// ---------------------------------------------------------------------------
// Document pane
// ---------------------------------------------------------------------------

pub(super) fn draw_document(layout: &Layout, state: &ViewState) -> io::Result<()> {
    let mut out = stdout();
    let width = layout.doc_cols as usize;
    if width == 0 {
        return Ok(());
    }
    let lines = state.open.as_ref().map(|d| d.lines.as_slice()).unwrap_or(&[]);
    for screen_row in 0..layout.body_rows {
        out.queue(cursor::MoveTo(layout.doc_col, screen_row))?;
        let line = lines.get(state.scroll + screen_row as usize);
        let cell = match line {
            Some(l) => {
                let text = fit(&format!(" {}", l.text), width);
                match l.kind {
                    LineKind::Heading => text.bold().cyan(),
                    LineKind::Code => text.green(),
                    LineKind::Body | LineKind::Blank => text.stylize(),
                }
            }
            None if state.open.is_none() && screen_row == 1 => {
                fit(" Hover a pattern to preview it, click to open.", width).dark_grey()
            }
            None => fit("", width).stylize(),
        };
        write!(out, "{cell}")?;
    }
    out.flush()
}

// ---------------------------------------------------------------------------
// Preview panel
// ---------------------------------------------------------------------------

/// Body lines of the preview panel, already cut to `inner` columns.
pub(super) fn panel_lines(data: &PreviewData, inner: usize) -> Vec<(LineKind, String)> {
    let mut lines = vec![
        (LineKind::Heading, fit(&data.name, inner)),
        (LineKind::Body, fit(&data.category.to_string(), inner)),
        (LineKind::Blank, fit("", inner)),
    ];
    if inner > 0 {
        for l in textwrap::wrap(&data.description, inner) {
            lines.push((LineKind::Body, fit(&l, inner)));
        }
    }
    if !data.code_preview.is_empty() {
        lines.push((LineKind::Blank, fit("", inner)));
        for l in data.code_preview.lines() {
            lines.push((LineKind::Code, fit(l, inner)));
        }
    }
    lines
}

/// Clip `rect` to the body area in cells: `(left, top, width, height)`.
fn panel_cells(layout: &Layout, rect: PlacementRect) -> (u16, u16, u16, u16) {
    let cell = |v: i32| u16::try_from(v.max(0)).unwrap_or(u16::MAX);
    let left = cell(rect.left);
    let top = cell(rect.top);
    let width = cell(rect.width).min(layout.term_cols.saturating_sub(left));
    let height = cell(rect.height).min(layout.body_rows.saturating_sub(top));
    (left, top, width, height)
}

pub(super) fn draw_preview_panel(
    layout: &Layout,
    rect: PlacementRect,
    data: &PreviewData,
) -> io::Result<()> {
    let (left, top, width, height) = panel_cells(layout, rect);
    if width < 4 || height < 3 {
        return Ok(());
    }
    let inner = (width - 4) as usize;
    let body_rows = (height - 2) as usize;
    let horizontal = "─".repeat((width - 2) as usize);

    let mut out = stdout();
    out.queue(cursor::MoveTo(left, top))?;
    write!(out, "{}", format!("┌{horizontal}┐").dark_yellow())?;

    let body = panel_lines(data, inner);
    for i in 0..body_rows {
        out.queue(cursor::MoveTo(left, top + 1 + i as u16))?;
        let cell = match body.get(i) {
            Some((LineKind::Heading, t)) => t.clone().bold(),
            Some((LineKind::Code, t)) => t.clone().green(),
            Some((_, t)) if i == 1 => t.clone().dark_grey(),
            Some((_, t)) => t.clone().stylize(),
            None => fit("", inner).stylize(),
        };
        write!(out, "{} {cell} {}", "│".dark_yellow(), "│".dark_yellow())?;
    }

    out.queue(cursor::MoveTo(left, top + height - 1))?;
    write!(out, "{}", format!("└{horizontal}┘").dark_yellow())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

// ---------------------------------------------------------------------------
// Status bar
// ---------------------------------------------------------------------------

pub(super) fn status_text<C: Clock>(
    state: &ViewState,
    hovered: Option<&PatternId>,
    visibility: Visibility,
    prefetch: &PrefetchCoordinator<C>,
    total: usize,
    acc_peek: Option<u32>,
) -> String {
    let focus = match hovered {
        Some(id) => {
            let warm = match prefetch.state(id) {
                PrefetchState::Idle => "cold",
                PrefetchState::Pending(_) => "pending",
                PrefetchState::Prefetching => "prefetching",
                PrefetchState::Prefetched => "prefetched",
            };
            let panel = match visibility {
                Visibility::Loading => " loading",
                Visibility::Hidden | Visibility::Visible => "",
            };
            format!("{id} [{warm}]{panel}")
        }
        None => match &state.open {
            Some(doc) if doc.warm => format!("{} [opened warm]", doc.entry.name),
            Some(doc) => format!("{} [opened cold]", doc.entry.name),
            None => "-".to_string(),
        },
    };
    let middle = match (&state.flash, acc_peek) {
        (Some(msg), _) => msg.clone(),
        (None, Some(n)) => format!(":{n}_"),
        (None, None) => "[hover:preview click/Enter:open j/k:scroll Esc:close q:quit]".to_string(),
    };
    format!(
        " {focus} | prefetched {}/{total} | {middle}",
        prefetch.prefetched_count()
    )
}

pub(super) fn draw_status_bar(layout: &Layout, text: &str) -> io::Result<()> {
    let mut out = stdout();
    out.queue(cursor::MoveTo(0, layout.status_row))?;
    let padded = fit(text, layout.term_cols as usize);
    write!(out, "{}", padded.on_dark_grey().white())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

pub(super) fn check_tty() -> anyhow::Result<()> {
    use std::io::IsTerminal;
    // Only stdout matters. crossterm's `use-dev-tty` reads input from /dev/tty,
    // so stdin being a pipe is fine.
    if !io::stdout().is_terminal() {
        anyhow::bail!(
            "patternpeek viewer requires an interactive terminal.\n\
             \n\
             To list the catalog instead, use: patternpeek list"
        );
    }
    Ok(())
}
