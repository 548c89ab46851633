//! Frame layout and the shared chrome around each screen.

pub mod drill_down;
pub mod form;
pub mod login;
pub mod records;

use chrono::Local;
use merit_core::view::ViewMode;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::{App, Focus, Overlay, Screen, StatusKind};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Login => login::draw(f, rows[1], app),
    Screen::Main => draw_main(f, rows[1], app),
  }
  draw_status(f, rows[2], app);

  match &app.overlay {
    Some(Overlay::DrillDown { key, records, scroll }) => {
      drill_down::draw(f, centered_rect(80, 70, area), key, records, *scroll);
    }
    Some(Overlay::ConfirmReset) => draw_confirm_reset(f, centered_rect(50, 20, area)),
    None => {}
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let title = match app.screen {
    Screen::Login => " merit  [Enter] log in  [Esc] quit".to_string(),
    Screen::Main => match app.mode {
      ViewMode::Summary => " merit  summary  [v] detail  [q] quit".to_string(),
      ViewMode::Detail => " merit  detail  [v] summary  [q] quit".to_string(),
    },
  };
  let left = Span::styled(
    title,
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{date} "),
    Style::default().fg(Color::DarkGray),
  );

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_main(f: &mut Frame, area: Rect, app: &App) {
  // Form on top, then the search line, then the table.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(form::HEIGHT),
      Constraint::Length(1),
      Constraint::Min(0),
    ])
    .split(area);

  form::draw(f, rows[0], app);
  draw_search(f, rows[1], app);
  records::draw(f, rows[2], app);
}

fn draw_search(f: &mut Frame, area: Rect, app: &App) {
  let active = app.focus == Focus::Search;
  if !active && app.search.is_empty() {
    f.render_widget(
      Paragraph::new(" / search").style(Style::default().fg(Color::DarkGray)),
      area,
    );
    return;
  }
  let text = if active {
    format!(" /{}_", app.search)
  } else {
    format!(" /{}", app.search)
  };
  f.render_widget(
    Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
    area,
  );
}

fn draw_confirm_reset(f: &mut Frame, area: Rect) {
  let block = Block::default()
    .title(" Reset all records ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Red));
  let inner = block.inner(area);
  f.render_widget(Clear, area);
  f.render_widget(block, area);

  let lines = vec![
    Line::from("A backup is written first. Every record is then deleted."),
    Line::from(""),
    Line::from(vec![
      Span::styled("[y]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
      Span::raw(" confirm   any other key cancels"),
    ]),
  ];
  f.render_widget(Paragraph::new(lines), inner);
}

/// A rectangle of `percent_x` by `percent_y` centred in `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
  let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
    .flex(Flex::Center)
    .areas(area);
  let [col] = Layout::horizontal([Constraint::Percentage(percent_x)])
    .flex(Flex::Center)
    .areas(row);
  col
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match (app.screen, app.focus) {
    (Screen::Login, _) => ("LOGIN", "Enter log in  Ctrl-N new password  Esc quit"),
    (Screen::Main, _) if app.overlay.is_some() => ("MODAL", "Esc close"),
    (Screen::Main, Focus::Table) => (
      "NORMAL",
      "↑↓/jk move  a add  v view  / search  Enter history  r refresh  X reset  L logout  q quit",
    ),
    (Screen::Main, Focus::Form) => (
      "ENTRY",
      "Tab next  F1 merit  F2 demerit  F3 offset  Ctrl-U clear  Esc back",
    ),
    (Screen::Main, Focus::Search) => ("SEARCH", "Type to filter  Enter keep  Esc clear"),
  };

  let (text, color) = match &app.status {
    Some(status) => {
      let color = match status.kind {
        StatusKind::Info => Color::Green,
        StatusKind::Warning => Color::Yellow,
        StatusKind::Error => Color::Red,
      };
      (status.text.clone(), color)
    }
    None => (hints.to_string(), Color::DarkGray),
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let text_span = Span::styled(format!("  {text}"), Style::default().fg(color));

  let line = Line::from(vec![mode_span, text_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
