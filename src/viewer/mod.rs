//! Interactive catalog browser.
//!
//! Layout:
//!   col 0..sidebar_cols : pattern list, grouped by category
//!   col sidebar_cols    : separator
//!   col doc_col..       : the opened pattern document
//!   row term_rows-1     : status bar
//!
//! Hovering a list entry with the mouse drives a `HoverSession`: the preview
//! panel appears next to the pointer once its data has loaded, and the full
//! document is warmed in the background after the debounce delay. Each load
//! runs on its own `LoadWorker` thread; results are collected by `session.pump()` on
//! every turn of the event loop, so all hover state stays on this thread.
//!
//! Polling:
//!   The loop sleeps in `event::poll(timeout)`. The timeout is the shortest of
//!   the time left in the current frame (when a redraw is owed), the next
//!   debounce deadline, and one frame while any load is still out.

mod input;
mod state;
mod terminal;

use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal as crossterm_terminal,
};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::catalog::{CATALOG, PatternEntry};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::content::DocumentSource;
use crate::convert::{Line, document_to_lines};
use crate::loader::{Executor, LoadWorker, ResourceLoadError, ResourceLoader};
use crate::placement::Size;
use crate::prefetch::PrefetchCoordinator;
use crate::preview::{HoverPreviewController, Visibility};
use crate::session::HoverSession;

use input::{Action, InputAccumulator, PointerAction, map_key_event, map_mouse_event};
use state::{Layout, OpenDocument, SidebarRow, ViewState, compute_layout, item_row, sidebar_rows};

const SCROLL_STEP_LINES: isize = 3;
const IDLE_TIMEOUT: Duration = Duration::from_secs(86400);

fn viewport(layout: &Layout) -> Size {
    Size::new(layout.term_cols as i32, layout.body_rows as i32)
}

/// Run the terminal viewer until the user quits.
pub fn run(config: Config, source: Arc<dyn DocumentSource>) -> anyhow::Result<()> {
    terminal::check_tty()?;

    let (term_cols, term_rows) = crossterm_terminal::size()
        .map_err(|e| anyhow::anyhow!("failed to get terminal size: {e}"))?;
    let mut layout = compute_layout(term_cols, term_rows, config.viewer.sidebar_cols);
    let rows = sidebar_rows();
    let frame_budget = config.viewer.frame_budget;

    let loader: Arc<dyn ResourceLoader> = source.clone();
    let worker = LoadWorker::new(loader);
    let mut session = HoverSession::new(
        PrefetchCoordinator::new(SystemClock, config.debounce),
        HoverPreviewController::new(config.viewer.panel, viewport(&layout)),
        worker,
    );
    info!(
        "viewer: {}x{} terminal, debounce={}ms",
        term_cols,
        term_rows,
        config.debounce.as_millis()
    );

    let mut guard = terminal::RawGuard::enter()?;
    terminal::clear_screen()?;

    let mut state = ViewState::new();
    let mut acc = InputAccumulator::new();
    let mut dirty = true;
    let mut last_render: Option<Instant> = None;

    loop {
        let before = progress(&session);
        if session.pump() || progress(&session) != before {
            dirty = true;
        }

        if dirty && last_render.is_none_or(|t| t.elapsed() >= frame_budget) {
            redraw(&layout, &rows, &state, &session, acc.peek())?;
            dirty = false;
            last_render = Some(Instant::now());
        }

        let mut timeout = IDLE_TIMEOUT;
        if dirty {
            let since = last_render.map(|t| t.elapsed()).unwrap_or(frame_budget);
            timeout = timeout.min(frame_budget.saturating_sub(since));
        }
        if session.is_loading() {
            timeout = timeout.min(frame_budget);
        }
        if let Some(deadline) = session.next_wakeup() {
            timeout = timeout.min(deadline.saturating_duration_since(Instant::now()));
        }

        if !event::poll(timeout)? {
            continue;
        }
        let ev = event::read()?;
        match ev {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                debug!("event: {key_event:?}");
                state.flash = None;
                dirty = true;
                match map_key_event(key_event, &mut acc) {
                    Some(Action::Quit) => break,
                    Some(Action::Digit) => {}
                    Some(Action::ScrollDown(n)) => {
                        state.scroll_by(n as isize * SCROLL_STEP_LINES, &layout);
                    }
                    Some(Action::ScrollUp(n)) => {
                        state.scroll_by(-(n as isize) * SCROLL_STEP_LINES, &layout);
                    }
                    Some(Action::SelectNext(n)) => state.select_by(n as isize),
                    Some(Action::SelectPrev(n)) => state.select_by(-(n as isize)),
                    Some(Action::OpenSelected) => {
                        let entry = &CATALOG[state.selected];
                        open(&mut state, source.as_ref(), entry, &layout);
                    }
                    Some(Action::Close) => {
                        state.open = None;
                        state.scroll = 0;
                    }
                    None => {}
                }
            }
            Event::Mouse(mouse_event) => match map_mouse_event(mouse_event, &rows, &layout) {
                Some(PointerAction::Over { entry, col, row }) => {
                    let (x, y) = (col as i32, row as i32);
                    if session.preview().hovered().map(|id| id.as_str()) == Some(entry.id) {
                        session.pointer_move(x, y);
                    } else {
                        session.pointer_enter(&entry.pattern_id(), x, y);
                    }
                    dirty = true;
                }
                Some(PointerAction::Off) => {
                    if session.preview().hovered().is_some() {
                        session.pointer_leave();
                        dirty = true;
                    }
                }
                Some(PointerAction::Click(entry)) => {
                    if let Some(i) = CATALOG.iter().position(|e| e.id == entry.id) {
                        state.selected = i;
                    }
                    open(&mut state, source.as_ref(), entry, &layout);
                    dirty = true;
                }
                Some(PointerAction::ScrollDown) => {
                    state.scroll_by(SCROLL_STEP_LINES, &layout);
                    dirty = true;
                }
                Some(PointerAction::ScrollUp) => {
                    state.scroll_by(-SCROLL_STEP_LINES, &layout);
                    dirty = true;
                }
                None => {}
            },
            Event::Resize(new_cols, new_rows) => {
                debug!("event: resize {new_cols}x{new_rows}");
                layout = compute_layout(new_cols, new_rows, config.viewer.sidebar_cols);
                session.resize(layout.term_cols as i32, layout.body_rows as i32);
                if let Some(entry) = state.open.as_ref().map(|d| d.entry) {
                    match layout_document(source.as_ref(), entry, &layout) {
                        Ok(lines) => {
                            if let Some(doc) = state.open.as_mut() {
                                doc.lines = lines;
                            }
                        }
                        Err(e) => warn!("viewer: relayout of {} failed: {e}", entry.id),
                    }
                }
                state.scroll = state.scroll.min(state.max_scroll(&layout));
                terminal::clear_screen()?;
                dirty = true;
            }
            _ => {}
        }
    }

    guard.cleanup();
    info!(
        "viewer: exit, {} pattern(s) prefetched",
        session.prefetch().prefetched_count()
    );
    Ok(())
}

/// Anything besides the preview panel that a finished load can change.
fn progress<C: Clock, E: Executor>(session: &HoverSession<C, E>) -> (usize, usize, Option<Instant>) {
    let prefetch = session.prefetch();
    (prefetch.prefetched_count(), prefetch.in_flight(), prefetch.next_deadline())
}

fn layout_document(
    source: &dyn DocumentSource,
    entry: &'static PatternEntry,
    layout: &Layout,
) -> Result<Vec<Line>, ResourceLoadError> {
    let doc = source.document(&entry.pattern_id())?;
    Ok(document_to_lines(&doc, (layout.doc_cols as usize).saturating_sub(2)))
}

fn open(state: &mut ViewState, source: &dyn DocumentSource, entry: &'static PatternEntry, layout: &Layout) {
    let warm = source.is_warm(&entry.pattern_id());
    let start = Instant::now();
    match layout_document(source, entry, layout) {
        Ok(lines) => {
            let ms = start.elapsed().as_secs_f64() * 1000.0;
            info!("viewer: opened {} (warm={warm}) in {ms:.1}ms", entry.id);
            state.flash = Some(if warm {
                format!("{} (prefetched)", entry.name)
            } else {
                format!("{} (loaded in {ms:.1}ms)", entry.name)
            });
            state.open = Some(OpenDocument { entry, lines, warm });
            state.scroll = 0;
        }
        Err(e) => {
            warn!("viewer: open {} failed: {e}", entry.id);
            state.flash = Some(format!("cannot open {}: {e}", entry.name));
        }
    }
}

fn redraw<C: Clock, E: Executor>(
    layout: &Layout,
    rows: &[SidebarRow],
    state: &ViewState,
    session: &HoverSession<C, E>,
    acc_peek: Option<u32>,
) -> anyhow::Result<()> {
    let preview = session.preview();
    let hovered = preview.hovered();
    terminal::draw_sidebar(
        layout,
        rows,
        item_row(rows, state.selected),
        hovered,
        session.prefetch(),
    )?;
    terminal::draw_document(layout, state)?;
    if preview.visibility() == Visibility::Visible
        && let (Some(rect), Some(data)) = (preview.placement(), preview.preview())
    {
        terminal::draw_preview_panel(layout, rect, data)?;
    }
    let status = terminal::status_text(
        state,
        hovered,
        preview.visibility(),
        session.prefetch(),
        CATALOG.len(),
        acc_peek,
    );
    terminal::draw_status_bar(layout, &status)?;
    Ok(())
}
