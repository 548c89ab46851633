//! Data-entry form above the table.

use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, FORM_LABELS, Focus};

/// Rows taken by the form, borders included.
pub const HEIGHT: u16 = 4;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let focused = app.focus == Focus::Form;
  let border = if focused { Color::Cyan } else { Color::DarkGray };

  let block = Block::default()
    .title(" New entry ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let [fields_area, keys_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(inner);

  let mut spans = Vec::new();
  for (i, (label, value)) in FORM_LABELS.iter().zip(&app.form.fields).enumerate() {
    let active = focused && i == app.form.active;
    let label_style = if active {
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };
    spans.push(Span::styled(format!("{label}: "), label_style));
    spans.push(Span::raw(value.clone()));
    if active {
      spans.push(Span::styled("_", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::raw("   "));
  }
  f.render_widget(Paragraph::new(Line::from(spans)), fields_area);

  let keys = Line::from(vec![
    Span::styled("F1", Style::default().fg(Color::Green)),
    Span::raw(" merit  "),
    Span::styled("F2", Style::default().fg(Color::Red)),
    Span::raw(" demerit  "),
    Span::styled("F3", Style::default().fg(Color::Blue)),
    Span::raw(" offset"),
  ]);
  f.render_widget(
    Paragraph::new(keys).style(Style::default().fg(Color::DarkGray)),
    keys_area,
  );
}
