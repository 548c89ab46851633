//! Per-student history popup.

use merit_core::record::{PointRecord, PointType, Signed, StudentKey, TIMESTAMP_FORMAT};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};

/// Render the full history of `key`, newest first, scrolled by `scroll` lines.
pub fn draw(f: &mut Frame, area: Rect, key: &StudentKey, records: &[PointRecord], scroll: usize) {
  let net: i64 = records.iter().map(|r| r.points).sum();

  let block = Block::default()
    .title(format!(" {key}  net {} ", Signed(net)))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(area);
  f.render_widget(Clear, area);
  f.render_widget(block, area);

  if records.is_empty() {
    f.render_widget(
      Paragraph::new("No records.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let lines: Vec<Line> = records
    .iter()
    .map(|r| {
      let color = match r.point_type {
        PointType::Merit => Color::Green,
        PointType::Demerit => Color::Red,
        PointType::Offset => Color::Blue,
      };
      Line::from(vec![
        Span::styled(
          format!("{}  ", r.timestamp.format(TIMESTAMP_FORMAT)),
          Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
          format!("{:<8}", r.point_type.label()),
          Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{:>5}  ", Signed(r.points).to_string())),
        Span::raw(r.reason.clone()),
      ])
    })
    .collect();

  let offset = u16::try_from(scroll).unwrap_or(u16::MAX);
  f.render_widget(Paragraph::new(lines).scroll((offset, 0)), inner);
}
