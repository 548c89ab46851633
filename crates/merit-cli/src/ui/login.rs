//! Login prompt.

use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};

use super::centered_rect;
use crate::app::{App, LoginMode};

/// Render the password box centred in `area`. Input is always masked.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let title = match app.login_mode {
    LoginMode::Password => " Log in ",
    LoginMode::NewPassword => " New password ",
  };
  let popup = centered_rect(50, 40, area);

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(popup);
  f.render_widget(Clear, popup);
  f.render_widget(block, popup);

  let [prompt_area, _, hint_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Min(0),
  ])
  .areas(inner);

  let masked = "*".repeat(app.login_input.chars().count());
  let prompt = Line::from(vec![
    Span::styled(
      "Password: ",
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ),
    Span::raw(masked),
    Span::styled("_", Style::default().fg(Color::DarkGray)),
  ]);
  f.render_widget(Paragraph::new(prompt), prompt_area);

  let hint = match app.login_mode {
    LoginMode::Password => "Enter to log in. Ctrl-N sets a new password.",
    LoginMode::NewPassword => "At least 3 characters. Enter saves, Esc cancels.",
  };
  f.render_widget(
    Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
    hint_area,
  );
}
