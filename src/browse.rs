//! Read-only, single-pane browser over a secret's versions.

use anyhow::{Context, Result};
use crossterm::event::{Event as TermEvent, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph};

use crate::store::Version;
use crate::theme::Theme;
use crate::ui::{Scroll, Side, Ui, Viewport, is_ctrl_c, pane_text, scroll_for_key};
use crate::wrap::{Row, number_text};

const FOOTER_HEIGHT: u16 = 3;
/// Box border plus horizontal padding.
const BOX_MARGIN: u16 = 4;
const BOX_VERTICAL_MARGIN: u16 = 2;
const GUTTER_MARGIN: u16 = 8;
const MIN_WRAP_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Ready,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Resize { width: u16, height: u16 },
    Previous,
    Next,
    Scroll(Scroll),
    Quit,
}

#[derive(Debug, Clone)]
pub struct BrowseSession {
    secret_name: String,
    versions: Vec<Version>,
    cursor: usize,
    phase: Phase,
    view: Viewport,
    rows: Vec<Row>,
}

impl BrowseSession {
    /// `versions` are shown in the order given; index 0 is labelled latest.
    pub fn new(secret_name: impl Into<String>, versions: Vec<Version>) -> Self {
        Self {
            secret_name: secret_name.into(),
            versions,
            cursor: 0,
            phase: Phase::Initializing,
            view: Viewport::default(),
            rows: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&Version> {
        self.versions.get(self.cursor)
    }

    pub fn is_latest(&self) -> bool {
        self.cursor == 0
    }

    pub fn run(mut self, ui: &mut Ui, theme: &Theme) -> Result<()> {
        let size = ui.terminal.size().context("read terminal size")?;
        self = transition(
            self,
            Event::Resize {
                width: size.width,
                height: size.height,
            },
        );

        while self.phase != Phase::Quit {
            ui.terminal
                .draw(|f| draw(f, &self, theme))
                .context("draw versions")?;

            let event = match crossterm::event::read().context("read event")? {
                TermEvent::Key(key) if key.kind == KeyEventKind::Press => event_for_key(&key),
                TermEvent::Resize(width, height) => Some(Event::Resize { width, height }),
                _ => None,
            };
            if let Some(event) = event {
                self = transition(self, event);
            }
        }
        Ok(())
    }

    fn rewrap(&mut self) {
        let wrap_width =
            (self.view.width.saturating_sub(GUTTER_MARGIN) as usize).max(MIN_WRAP_WIDTH);
        self.rows = self
            .selected()
            .map(|v| number_text(&v.value, wrap_width))
            .unwrap_or_default();
    }

    fn select(&mut self, cursor: usize) {
        if cursor == self.cursor {
            return;
        }
        self.cursor = cursor;
        self.rewrap();
        self.view.offset = 0;
        tracing::debug!(cursor, "selected version");
    }
}

pub fn transition(mut state: BrowseSession, event: Event) -> BrowseSession {
    match (state.phase, event) {
        (Phase::Quit, _) => {}
        (_, Event::Quit) => state.phase = Phase::Quit,
        (_, Event::Resize { width, height }) => {
            let offset = state.view.offset;
            state.view = Viewport::new(
                width.saturating_sub(BOX_MARGIN),
                height.saturating_sub(FOOTER_HEIGHT + BOX_VERTICAL_MARGIN),
            );
            state.rewrap();
            state.view.set_offset(offset, state.rows.len());
            state.phase = Phase::Ready;
        }
        (Phase::Initializing, _) => {}
        (Phase::Ready, Event::Previous) => {
            let cursor = state.cursor.saturating_sub(1);
            state.select(cursor);
        }
        (Phase::Ready, Event::Next) => {
            let last = state.versions.len().saturating_sub(1);
            let cursor = (state.cursor + 1).min(last);
            state.select(cursor);
        }
        (Phase::Ready, Event::Scroll(scroll)) => {
            let content = state.rows.len();
            state.view.scroll(scroll, content);
        }
    }
    state
}

pub fn event_for_key(key: &KeyEvent) -> Option<Event> {
    if is_ctrl_c(key) {
        return Some(Event::Quit);
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Event::Quit),
        KeyCode::Left | KeyCode::Char('h') => Some(Event::Previous),
        KeyCode::Right | KeyCode::Char('l') => Some(Event::Next),
        _ => scroll_for_key(key).map(Event::Scroll),
    }
}

pub fn draw(f: &mut Frame, s: &BrowseSession, theme: &Theme) {
    let Some(version) = s.selected() else {
        f.render_widget(Paragraph::new("No versions available."), f.area());
        return;
    };
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

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border)
        .padding(Padding::horizontal(1));
    f.render_widget(
        Paragraph::new(pane_text(s.view.visible(&s.rows), Side::Plain, theme)).block(block),
        content,
    );

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(s.secret_name.clone(), theme.secret_name),
        Span::styled(" • ", theme.footer),
        Span::styled(version.short_id().to_string(), theme.version),
        Span::styled(
            format!(" ({}/{})", s.cursor() + 1, s.versions.len()),
            theme.footer,
        ),
    ];
    if s.is_latest() {
        spans.push(Span::styled(" [latest]", theme.latest_badge));
    }
    if !version.enabled {
        spans.push(Span::styled(" [disabled]", theme.warning));
    }
    if let Some(created) = version.created_at {
        spans.push(Span::styled(
            format!(" • created {}", created.format("%Y-%m-%d %H:%M")),
            theme.footer,
        ));
    }
    if let Some(updated) = version.updated_at.filter(|u| Some(*u) != version.created_at) {
        spans.push(Span::styled(
            format!(" • updated {}", updated.format("%Y-%m-%d %H:%M")),
            theme.footer,
        ));
    }
    if let Some(expires) = version.expires_at {
        spans.push(Span::styled(
            format!(" • expires {}", expires.format("%Y-%m-%d")),
            theme.warning,
        ));
    }
    if !version.tags.is_empty() {
        let tags = version
            .tags
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        spans.push(Span::styled(format!(" • {tags}"), theme.footer));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), footer);
    f.render_widget(
        Paragraph::new(" ← → Navigate • ↑↓ Scroll • ESC/Q Quit").style(theme.footer),
        help,
    );
}
