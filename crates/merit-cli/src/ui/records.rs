//! The summary or detail table.

use merit_core::{
  record::{PointRecord, PointType, Signed, TIMESTAMP_FORMAT},
  view::{StudentSummary, View},
};
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::Span,
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use crate::app::{App, Focus};

/// Render the current view into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let (label, count) = match &app.view {
    View::Summary(rows) => ("Students", rows.len()),
    View::Detail(rows) => ("Records", rows.len()),
  };
  let title = if app.search.trim().is_empty() {
    format!(" {label} ({count}) ")
  } else {
    format!(" {label} ({count}) matching \"{}\" ", app.search.trim())
  };

  let border = if app.focus == Focus::Table { Color::Cyan } else { Color::DarkGray };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  if app.view.is_empty() {
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      Paragraph::new("No records.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let table = match &app.view {
    View::Summary(rows) => summary_table(rows),
    View::Detail(rows) => detail_table(rows),
  }
  .block(block)
  .row_highlight_style(
    Style::default()
      .bg(Color::Blue)
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );

  let mut state = TableState::default();
  state.select(Some(app.cursor));
  f.render_stateful_widget(table, area, &mut state);
}

fn header(cells: &[&'static str]) -> Row<'static> {
  Row::new(cells.iter().copied()).style(
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  )
}

fn net_style(net: i64) -> Style {
  match net.signum() {
    1 => Style::default().fg(Color::Green),
    -1 => Style::default().fg(Color::Red),
    _ => Style::default(),
  }
}

fn summary_table(rows: &[StudentSummary]) -> Table<'static> {
  let body = rows.iter().map(|s| {
    Row::new(vec![
      Cell::from(s.key.student_id.clone()),
      Cell::from(s.key.name.clone()),
      Cell::from(s.merit_total.to_string()),
      Cell::from(s.demerit_total.to_string()),
      Cell::from(s.offset_total.to_string()),
      Cell::from(Span::styled(Signed(s.net_total).to_string(), net_style(s.net_total))),
      Cell::from(s.last_activity.format(TIMESTAMP_FORMAT).to_string()),
      Cell::from(s.record_count.to_string()),
    ])
  });

  Table::new(body, [
    Constraint::Length(12),
    Constraint::Min(12),
    Constraint::Length(7),
    Constraint::Length(8),
    Constraint::Length(7),
    Constraint::Length(6),
    Constraint::Length(17),
    Constraint::Length(7),
  ])
  .header(header(&[
    "Student ID",
    "Name",
    "Merit",
    "Demerit",
    "Offset",
    "Net",
    "Last activity",
    "Records",
  ]))
}

fn detail_table(rows: &[PointRecord]) -> Table<'static> {
  let body = rows.iter().map(|r| {
    let type_color = match r.point_type {
      PointType::Merit => Color::Green,
      PointType::Demerit => Color::Red,
      PointType::Offset => Color::Blue,
    };
    Row::new(vec![
      Cell::from(r.timestamp.format(TIMESTAMP_FORMAT).to_string()),
      Cell::from(r.student_id.clone()),
      Cell::from(r.name.clone()),
      Cell::from(Span::styled(r.point_type.label(), Style::default().fg(type_color))),
      Cell::from(Signed(r.points).to_string()),
      Cell::from(r.reason.clone()),
    ])
  });

  Table::new(body, [
    Constraint::Length(17),
    Constraint::Length(12),
    Constraint::Length(12),
    Constraint::Length(8),
    Constraint::Length(7),
    Constraint::Min(10),
  ])
  .header(header(&["Time", "Student ID", "Name", "Type", "Points", "Reason"]))
}
