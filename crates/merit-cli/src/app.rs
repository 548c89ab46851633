//! Application state machine and event dispatcher.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use merit_core::{
  record::{PointRecord, PointType, StudentKey},
  view::{View, ViewMode},
};

use crate::context::{AppContext, ContextError};

// ─── Screens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Login,
  Main,
}

/// What the login prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
  Password,
  NewPassword,
}

/// Keyboard focus on the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Table,
  Form,
  Search,
}

/// A modal drawn over the main screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
  DrillDown {
    key:     StudentKey,
    records: Vec<PointRecord>,
    scroll:  usize,
  },
  ConfirmReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
  Info,
  Warning,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
  pub kind: StatusKind,
  pub text: String,
}

// ─── Form ─────────────────────────────────────────────────────────────────────

pub const FORM_LABELS: [&str; 4] = ["Student ID", "Name", "Points", "Reason"];

/// The four data-entry inputs, in tab order.
#[derive(Debug, Clone, Default)]
pub struct Form {
  pub fields: [String; 4],
  pub active: usize,
}

impl Form {
  fn next(&mut self) { self.active = (self.active + 1) % self.fields.len(); }

  fn prev(&mut self) {
    self.active = (self.active + self.fields.len() - 1) % self.fields.len();
  }

  fn clear(&mut self) { *self = Self::default(); }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub ctx:         AppContext,
  pub screen:      Screen,
  pub login_mode:  LoginMode,
  /// Masked text typed at the login prompt.
  pub login_input: String,
  pub focus:       Focus,
  pub form:        Form,
  pub mode:        ViewMode,
  pub search:      String,
  /// The table currently on screen.
  pub view:        View,
  /// Selected row within `view`.
  pub cursor:      usize,
  pub overlay:     Option<Overlay>,
  /// One-line message shown in the status bar.
  pub status:      Option<Status>,
}

impl App {
  /// Start at the login prompt.
  pub fn new(ctx: AppContext) -> Self {
    Self {
      ctx,
      screen: Screen::Login,
      login_mode: LoginMode::Password,
      login_input: String::new(),
      focus: Focus::Table,
      form: Form::default(),
      mode: ViewMode::Summary,
      search: String::new(),
      view: View::Summary(Vec::new()),
      cursor: 0,
      overlay: None,
      status: None,
    }
  }

  fn info(&mut self, text: impl Into<String>) {
    self.status = Some(Status { kind: StatusKind::Info, text: text.into() });
  }

  fn warn(&mut self, text: impl Into<String>) {
    self.status = Some(Status { kind: StatusKind::Warning, text: text.into() });
  }

  fn error(&mut self, text: impl Into<String>) {
    self.status = Some(Status { kind: StatusKind::Error, text: text.into() });
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Recompute the current view from the store with the current search.
  pub async fn refresh(&mut self) {
    match self.ctx.view(self.mode, &self.search).await {
      Ok(view) => {
        self.view = view;
        self.cursor = self.cursor.min(self.view.len().saturating_sub(1));
      }
      Err(e) => {
        tracing::error!(error = %e, "loading view failed");
        self.error(format!("Failed to load records: {e}"));
      }
    }
  }

  async fn submit(&mut self, point_type: PointType) {
    let [student_id, name, points, reason] = &self.form.fields;
    match self.ctx.add_record(student_id, name, points, reason, point_type).await {
      Ok(record) => {
        self.info(format!(
          "Added {} {} point(s) for {}",
          record.magnitude(),
          point_type,
          record.name,
        ));
        self.form.clear();
        self.refresh().await;
      }
      Err(e) if e.is_validation() => self.warn(format!("Invalid input: {e}")),
      Err(e) => {
        tracing::error!(error = %e, "saving record failed");
        self.error(format!("Failed to save record: {e}"));
      }
    }
  }

  async fn open_drill_down(&mut self) {
    let View::Summary(rows) = &self.view else {
      return;
    };
    let Some(key) = rows.get(self.cursor).map(|row| row.key.clone()) else {
      return;
    };
    match self.ctx.drill_down(&key).await {
      Ok(records) => self.overlay = Some(Overlay::DrillDown { key, records, scroll: 0 }),
      Err(e) => self.error(format!("Failed to load history: {e}")),
    }
  }

  async fn reset(&mut self) {
    match self.ctx.reset().await {
      Ok(outcome) => {
        self.info(format!(
          "Reset complete: {} record(s) removed, backup at {}",
          outcome.deleted,
          outcome.backup_path.display(),
        ));
        self.cursor = 0;
        self.refresh().await;
      }
      Err(e) => self.error(format!("Reset aborted: {e}")),
    }
  }

  fn logout(&mut self) {
    self.ctx.logout();
    self.screen = Screen::Login;
    self.login_mode = LoginMode::Password;
    self.login_input.clear();
    self.focus = Focus::Table;
    self.form.clear();
    self.mode = ViewMode::Summary;
    self.search.clear();
    self.view = View::Summary(Vec::new());
    self.cursor = 0;
    self.overlay = None;
    self.info("Logged out");
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }
    // Messages last until the next keystroke.
    self.status = None;

    match self.screen {
      Screen::Login => Ok(self.handle_login_key(key).await),
      Screen::Main if !self.ctx.is_logged_in() => {
        self.logout();
        Ok(true)
      }
      Screen::Main => {
        if self.overlay.is_some() {
          self.handle_overlay_key(key).await;
          return Ok(true);
        }
        match self.focus {
          Focus::Table => Ok(self.handle_table_key(key).await),
          Focus::Form => {
            self.handle_form_key(key).await;
            Ok(true)
          }
          Focus::Search => {
            self.handle_search_key(key).await;
            Ok(true)
          }
        }
      }
    }
  }

  async fn handle_login_key(&mut self, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match (self.login_mode, key.code) {
      (LoginMode::Password, KeyCode::Esc) => return false,
      (LoginMode::Password, KeyCode::Char('n')) if ctrl => {
        self.login_mode = LoginMode::NewPassword;
        self.login_input.clear();
      }
      (LoginMode::NewPassword, KeyCode::Esc) => {
        self.login_mode = LoginMode::Password;
        self.login_input.clear();
      }
      (LoginMode::Password, KeyCode::Enter) => {
        let candidate = std::mem::take(&mut self.login_input);
        if self.ctx.login(&candidate) {
          self.screen = Screen::Main;
          self.refresh().await;
        } else {
          self.error("Wrong password");
        }
      }
      (LoginMode::NewPassword, KeyCode::Enter) => {
        let new_secret = std::mem::take(&mut self.login_input);
        match self.ctx.change_secret(&new_secret) {
          Ok(()) => self.info("Password changed"),
          Err(e @ ContextError::PasswordLocked) => self.warn(e.to_string()),
          Err(e) if e.is_validation() => self.warn(e.to_string()),
          Err(e) => self.error(format!("Failed to save password: {e}")),
        }
        self.login_mode = LoginMode::Password;
      }
      (_, KeyCode::Backspace) => {
        self.login_input.pop();
      }
      (_, KeyCode::Char(c)) if !ctrl => self.login_input.push(c),
      _ => {}
    }
    true
  }

  async fn handle_overlay_key(&mut self, key: KeyEvent) {
    match self.overlay.as_mut() {
      Some(Overlay::ConfirmReset) => {
        self.overlay = None;
        if matches!(key.code, KeyCode::Char('y' | 'Y')) {
          self.reset().await;
        } else {
          self.info("Reset cancelled");
        }
      }
      Some(Overlay::DrillDown { records, scroll, .. }) => match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.overlay = None,
        KeyCode::Down | KeyCode::Char('j') => {
          if *scroll + 1 < records.len() {
            *scroll += 1;
          }
        }
        KeyCode::Up | KeyCode::Char('k') => *scroll = scroll.saturating_sub(1),
        _ => {}
      },
      None => {}
    }
  }

  async fn handle_table_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.view.len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),

      KeyCode::Char('a') | KeyCode::Char('i') | KeyCode::Tab => self.focus = Focus::Form,
      KeyCode::Char('/') => self.focus = Focus::Search,
      KeyCode::Char('v') => {
        self.mode = self.mode.toggle();
        self.cursor = 0;
        self.refresh().await;
      }
      KeyCode::Char('r') => self.refresh().await,
      KeyCode::Enter => self.open_drill_down().await,
      KeyCode::Char('X') => self.overlay = Some(Overlay::ConfirmReset),
      KeyCode::Char('L') => self.logout(),
      _ => {}
    }
    true
  }

  async fn handle_form_key(&mut self, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc => self.focus = Focus::Table,
      KeyCode::Tab | KeyCode::Enter => self.form.next(),
      KeyCode::BackTab => self.form.prev(),
      KeyCode::F(1) => self.submit(PointType::Merit).await,
      KeyCode::F(2) => self.submit(PointType::Demerit).await,
      KeyCode::F(3) => self.submit(PointType::Offset).await,
      KeyCode::Char('u') if ctrl => {
        self.form.clear();
        self.info("Form cleared");
      }
      KeyCode::Backspace => {
        self.form.fields[self.form.active].pop();
      }
      KeyCode::Char(c) if !ctrl => self.form.fields[self.form.active].push(c),
      _ => {}
    }
  }

  /// Every keystroke re-filters from the full record set.
  async fn handle_search_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.focus = Focus::Table;
        self.search.clear();
      }
      KeyCode::Enter => {
        self.focus = Focus::Table;
        return;
      }
      KeyCode::Backspace => {
        self.search.pop();
      }
      KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.search.push(c),
      _ => return,
    }
    self.cursor = 0;
    self.refresh().await;
  }
}
