//! Two-pane before/after review of an edited secret value.
//!
//! The screen is an explicit state machine: [`transition`] maps a state and an
//! [`Event`] to the next state without touching the terminal, and [`draw`]
//! renders a state. [`ReviewSession::run`] drives both from crossterm events
//! until the operator confirms or cancels.

use anyhow::{Context, Result};
use crossterm::event::{Event as TermEvent, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph};

use crate::diff::{self, Summary};
use crate::theme::Theme;
use crate::ui::{Scroll, Side, Ui, Viewport, is_ctrl_c, pane_text, scroll_for_key};
use crate::wrap::{Row, number_rows};

const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 3;
/// Columns reserved per pane for borders and padding.
const PANE_MARGIN: u16 = 4;
/// Columns reserved inside a pane for the gutter and marker.
const GUTTER_MARGIN: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Ready,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Resize { width: u16, height: u16 },
    Confirm,
    Cancel,
    Scroll(Scroll),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
    secret_name: String,
    left: Vec<diff::Line>,
    right: Vec<diff::Line>,
    summary: Summary,
    phase: Phase,
    left_view: Viewport,
    right_view: Viewport,
    left_rows: Vec<Row>,
    right_rows: Vec<Row>,
}

impl ReviewSession {
    pub fn new(secret_name: impl Into<String>, old: &str, new: &str) -> Self {
        let (left, right) = diff::compare(old, new);
        let summary = Summary::of(&left, &right);
        Self {
            secret_name: secret_name.into(),
            left,
            right,
            summary,
            phase: Phase::Initializing,
            left_view: Viewport::default(),
            right_view: Viewport::default(),
            left_rows: Vec::new(),
            right_rows: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn confirmed(&self) -> bool {
        self.phase == Phase::Confirmed
    }

    pub fn cancelled(&self) -> bool {
        self.phase == Phase::Cancelled
    }

    pub fn decision(&self) -> Option<Decision> {
        match self.phase {
            Phase::Confirmed => Some(Decision::Confirmed),
            Phase::Cancelled => Some(Decision::Cancelled),
            Phase::Initializing | Phase::Ready => None,
        }
    }

    /// Block on terminal input until the operator confirms or cancels.
    /// Returns the finished session.
    pub fn run(mut self, ui: &mut Ui, theme: &Theme) -> Result<Self> {
        let size = ui.terminal.size().context("read terminal size")?;
        self = transition(
            self,
            Event::Resize {
                width: size.width,
                height: size.height,
            },
        );

        loop {
            if let Some(decision) = self.decision() {
                tracing::debug!(?decision, "review finished");
                return Ok(self);
            }

            ui.terminal
                .draw(|f| draw(f, &self, theme))
                .context("draw review")?;

            let event = match crossterm::event::read().context("read event")? {
                TermEvent::Key(key) if key.kind == KeyEventKind::Press => event_for_key(&key),
                TermEvent::Resize(width, height) => Some(Event::Resize { width, height }),
                _ => None,
            };
            if let Some(event) = event {
                self = transition(self, event);
            }
        }
    }

    fn relayout(&mut self, width: u16, height: u16) {
        let pane_width = (width / 2).saturating_sub(PANE_MARGIN);
        let pane_height = height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT);
        let wrap_width = pane_width.saturating_sub(GUTTER_MARGIN) as usize;

        self.left_rows = rows_for(&self.left, wrap_width);
        self.right_rows = rows_for(&self.right, wrap_width);

        let offset = self.left_view.offset;
        self.left_view = Viewport::new(pane_width, pane_height);
        self.right_view = Viewport::new(pane_width, pane_height);
        self.left_view.set_offset(offset, self.left_rows.len());
        self.sync_right();
    }

    fn sync_right(&mut self) {
        self.right_view
            .set_offset(self.left_view.offset, self.right_rows.len());
    }
}

fn rows_for(lines: &[diff::Line], width: usize) -> Vec<Row> {
    number_rows(
        lines.iter().map(|l| (l.number, l.text.as_str(), l.kind)),
        width,
    )
}

/// Apply one input to a review state.
pub fn transition(mut state: ReviewSession, event: Event) -> ReviewSession {
    match (state.phase, event) {
        (Phase::Confirmed | Phase::Cancelled, _) => {}
        (_, Event::Resize { width, height }) => {
            state.relayout(width, height);
            state.phase = Phase::Ready;
        }
        (Phase::Initializing, _) => {}
        (Phase::Ready, Event::Confirm) => state.phase = Phase::Confirmed,
        (Phase::Ready, Event::Cancel) => state.phase = Phase::Cancelled,
        (Phase::Ready, Event::Scroll(scroll)) => {
            let content = state.left_rows.len();
            state.left_view.scroll(scroll, content);
            state.sync_right();
        }
    }
    state
}

pub fn event_for_key(key: &KeyEvent) -> Option<Event> {
    if is_ctrl_c(key) {
        return Some(Event::Cancel);
    }
    match key.code {
        KeyCode::Char('y' | 'Y') | KeyCode::Enter => Some(Event::Confirm),
        KeyCode::Char('n' | 'N' | 'q') | KeyCode::Esc => Some(Event::Cancel),
        _ => scroll_for_key(key).map(Event::Scroll),
    }
}

pub fn draw(f: &mut Frame, s: &ReviewSession, theme: &Theme) {
    if s.phase == Phase::Initializing {
        f.render_widget(Paragraph::new("\n  Initializing..."), f.area());
        return;
    }

    let [content, footer, help] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(f.area());
    let [left, right] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .areas(content);

    draw_pane(
        f,
        left,
        "Previous Version",
        s.left_view.visible(&s.left_rows),
        Side::Old,
        theme,
    );
    draw_pane(
        f,
        right,
        "New Version",
        s.right_view.visible(&s.right_rows),
        Side::New,
        theme,
    );

    let summary = Line::from(vec![
        Span::styled(format!(" Secret: {}", s.secret_name), theme.footer),
        Span::styled("  •  ", theme.footer),
        Span::styled(format!("-{}", s.summary.removed), theme.removed_title),
        Span::raw(" "),
        Span::styled(format!("+{}", s.summary.added), theme.added_title),
        Span::raw(" "),
        Span::styled(format!("~{}", s.summary.changed), theme.added_title),
    ]);
    f.render_widget(Paragraph::new(summary), footer);
    f.render_widget(
        Paragraph::new(" ↑↓ Scroll • Y/Enter Confirm • N/ESC Cancel").style(theme.footer),
        help,
    );
}

fn draw_pane(
    f: &mut Frame,
    area: ratatui::layout::Rect,
    title: &str,
    rows: &[Row],
    side: Side,
    theme: &Theme,
) {
    let [title_area, box_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .areas(area);

    let (title_style, border_style) = match side {
        Side::Old => (theme.removed_title, theme.removed_border),
        _ => (theme.added_title, theme.added_border),
    };
    f.render_widget(
        Paragraph::new(Span::styled(format!(" {title}"), title_style)),
        title_area,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .padding(Padding::horizontal(1));
    f.render_widget(Paragraph::new(pane_text(rows, side, theme)).block(block), box_area);
}

/// Collects a confirm/cancel decision for a proposed change.
pub trait Reviewer {
    fn review(&mut self, secret_name: &str, old: &str, new: &str) -> Result<Decision>;
}

/// Shows the review screen on the current terminal.
pub struct TerminalReviewer {
    theme: Theme,
}

impl TerminalReviewer {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl Reviewer for TerminalReviewer {
    fn review(&mut self, secret_name: &str, old: &str, new: &str) -> Result<Decision> {
        let session = ReviewSession::new(secret_name, old, new);
        let mut ui = Ui::new()?;
        let res = session.run(&mut ui, &self.theme);
        ui.restore().ok();
        let finished = res.context("diff viewer error")?;
        Ok(if finished.confirmed() {
            Decision::Confirmed
        } else {
            Decision::Cancelled
        })
    }
}
