use std::io::{Stdout, stdout};
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::text::{Line, Span, Text};

use crate::diff::Kind;
use crate::theme::Theme;
use crate::wrap::Row;

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Raw-mode, alternate-screen terminal. Restored on drop and on panic.
pub struct Ui {
    pub terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl Ui {
    pub fn new() -> Result<Self> {
        install_panic_hook();
        enable_raw_mode().context("enable raw mode")?;
        if let Err(err) = execute!(stdout(), EnterAlternateScreen) {
            disable_raw_mode().ok();
            return Err(err).context("enter alt screen");
        }
        let backend = CrosstermBackend::new(stdout());
        let terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(err) => {
                restore_terminal();
                return Err(err).context("create terminal");
            }
        };
        ACTIVE.store(true, Ordering::SeqCst);
        Ok(Self {
            terminal,
            restored: false,
        })
    }

    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        ACTIVE.store(false, Ordering::SeqCst);
        disable_raw_mode().ok();
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen).ok();
        self.terminal.show_cursor().ok();
        Ok(())
    }
}

impl Drop for Ui {
    fn drop(&mut self) {
        self.restore().ok();
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            previous(info);
        }));
    });
}

/// Leave raw mode and the alternate screen if a [`Ui`] currently owns them.
pub fn restore_if_active() {
    if ACTIVE.swap(false, Ordering::SeqCst) {
        restore_terminal();
    }
}

fn restore_terminal() {
    disable_raw_mode().ok();
    execute!(stdout(), LeaveAlternateScreen, crossterm::cursor::Show).ok();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    Top,
    Bottom,
}

pub fn scroll_for_key(key: &KeyEvent) -> Option<Scroll> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let scroll = match key.code {
        KeyCode::Up => Scroll::LineUp,
        KeyCode::Down => Scroll::LineDown,
        KeyCode::PageUp => Scroll::PageUp,
        KeyCode::PageDown => Scroll::PageDown,
        KeyCode::Home => Scroll::Top,
        KeyCode::End => Scroll::Bottom,
        KeyCode::Char('b') if ctrl => Scroll::PageUp,
        KeyCode::Char('f') if ctrl => Scroll::PageDown,
        KeyCode::Char('u') if ctrl => Scroll::HalfPageUp,
        KeyCode::Char('d') if ctrl => Scroll::HalfPageDown,
        KeyCode::Char('k') if !ctrl => Scroll::LineUp,
        KeyCode::Char('j') if !ctrl => Scroll::LineDown,
        KeyCode::Char('g') if !ctrl => Scroll::Top,
        KeyCode::Char('G') if !ctrl => Scroll::Bottom,
        _ => return None,
    };
    Some(scroll)
}

pub fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// A vertically scrolling window over a list of rendered rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
    pub offset: usize,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            offset: 0,
        }
    }

    fn max_offset(&self, content: usize) -> usize {
        content.saturating_sub(self.height as usize)
    }

    pub fn set_offset(&mut self, offset: usize, content: usize) {
        self.offset = offset.min(self.max_offset(content));
    }

    pub fn scroll(&mut self, scroll: Scroll, content: usize) {
        let page = (self.height as usize).max(1);
        let half = (page / 2).max(1);
        let target = match scroll {
            Scroll::LineUp => self.offset.saturating_sub(1),
            Scroll::LineDown => self.offset + 1,
            Scroll::PageUp => self.offset.saturating_sub(page),
            Scroll::PageDown => self.offset + page,
            Scroll::HalfPageUp => self.offset.saturating_sub(half),
            Scroll::HalfPageDown => self.offset + half,
            Scroll::Top => 0,
            Scroll::Bottom => usize::MAX,
        };
        self.set_offset(target, content);
    }

    pub fn visible<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let start = self.offset.min(rows.len());
        let end = (start + self.height as usize).min(rows.len());
        &rows[start..end]
    }
}

/// Which column a pane shows; decides markers and colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Old,
    New,
    Plain,
}

pub fn pane_text(rows: &[Row], side: Side, theme: &Theme) -> Text<'static> {
    let lines = rows
        .iter()
        .map(|row| {
            let (marker, marker_style) = marker(row, side, theme);
            let content_style = match (side, row.kind) {
                (Side::Old, Kind::Removed) => theme.removed_line,
                (Side::New, Kind::Added | Kind::Changed) => theme.added_line,
                (Side::Plain, _) => ratatui::style::Style::default(),
                _ => theme.unchanged_line,
            };
            Line::from(vec![
                Span::styled(row.gutter(), theme.line_number),
                Span::styled(marker, marker_style),
                Span::styled(row.text.clone(), content_style),
            ])
        })
        .collect::<Vec<_>>();
    Text::from(lines)
}

fn marker(row: &Row, side: Side, theme: &Theme) -> (&'static str, ratatui::style::Style) {
    let plain = ratatui::style::Style::default();
    if row.number.is_none() || side == Side::Plain {
        return (" │ ", plain);
    }
    if row.continuation {
        return ("   ", plain);
    }
    match (side, row.kind) {
        (Side::Old, Kind::Removed) => (" - ", theme.removed_line),
        (Side::New, Kind::Added) => (" + ", theme.added_line),
        (Side::New, Kind::Changed) => (" ~ ", theme.added_line),
        _ => (" │ ", plain),
    }
}
