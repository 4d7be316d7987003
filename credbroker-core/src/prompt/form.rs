//! # Credential Form
//!
//! State and rendering for the modal credential form: instruction lines,
//! a user name field, a masked password field and Cancel/OK buttons.
//! The form only interprets input; deciding what an action means for the
//! prompt's lifecycle is left to the modal loop.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use zeroize::Zeroizing;

use crate::credential::Credential;

const USER_NAME_LABEL: &str = "User name: ";
const PASSWORD_LABEL: &str = "Password:  ";
const CANCEL_LABEL: &str = "[ Cancel ]";
const OK_LABEL: &str = "[ OK ]";
const FOOTER_HINT: &str = "Tab to move, Enter to accept, Esc to cancel";
const MIN_FORM_WIDTH: u16 = 48;
const MAX_FORM_WIDTH: u16 = 80;

/// The focusable parts of the form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  UserName,
  Password,
  Cancel,
  Ok,
}

impl Field {
  const fn next(self) -> Self {
    match self {
      Self::UserName => Self::Password,
      Self::Password => Self::Cancel,
      Self::Cancel => Self::Ok,
      Self::Ok => Self::UserName,
    }
  }

  const fn previous(self) -> Self {
    match self {
      Self::UserName => Self::Ok,
      Self::Password => Self::UserName,
      Self::Cancel => Self::Password,
      Self::Ok => Self::Cancel,
    }
  }

  const fn is_input(self) -> bool {
    matches!(self, Self::UserName | Self::Password)
  }
}

/// What an input event meant to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
  /// Nothing the prompt needs to react to
  Continue,
  /// The user touched the user name or password field
  Interacted,
  /// OK was activated
  Confirm,
  /// Cancel was activated or the form was dismissed
  Cancel,
}

#[derive(Debug, Default, Clone, Copy)]
struct HitAreas {
  user_name: Rect,
  password: Rect,
  cancel: Rect,
  ok: Rect,
}

impl HitAreas {
  fn field_at(&self, position: Position) -> Option<Field> {
    [
      (self.user_name, Field::UserName),
      (self.password, Field::Password),
      (self.cancel, Field::Cancel),
      (self.ok, Field::Ok),
    ]
    .into_iter()
    .find(|(area, _)| area.contains(position))
    .map(|(_, field)| field)
  }
}

/// Editable state of the credential form.
#[derive(Debug)]
pub struct CredentialForm {
  title: String,
  instructions: Vec<String>,
  user_name: String,
  password: Zeroizing<String>,
  focus: Field,
  hit_areas: HitAreas,
}

impl CredentialForm {
  /// Create a form. Focus starts on the password field.
  pub fn new(title: impl Into<String>, instructions: Vec<String>, initial_user_name: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      instructions,
      user_name: initial_user_name.into(),
      password: Zeroizing::new(String::new()),
      focus: Field::Password,
      hit_areas: HitAreas::default(),
    }
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn instructions(&self) -> &[String] {
    &self.instructions
  }

  pub fn user_name(&self) -> &str {
    &self.user_name
  }

  pub const fn focus(&self) -> Field {
    self.focus
  }

  /// Number of characters typed into the password field
  pub fn password_len(&self) -> usize {
    self.password.chars().count()
  }

  /// Interpret one terminal event
  pub fn handle_event(&mut self, event: &Event) -> FormAction {
    match event {
      Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(*key),
      Event::Mouse(mouse) => self.handle_mouse(*mouse),
      _ => FormAction::Continue,
    }
  }

  fn handle_key(&mut self, key: KeyEvent) -> FormAction {
    let focus = self.focus;
    match (key.code, key.modifiers) {
      (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => return FormAction::Cancel,
      (KeyCode::Enter, _) => {
        return match focus {
          Field::UserName => {
            self.focus = Field::Password;
            FormAction::Interacted
          }
          Field::Password | Field::Ok => FormAction::Confirm,
          Field::Cancel => FormAction::Cancel,
        };
      }
      (KeyCode::Tab | KeyCode::Down, _) => self.focus = focus.next(),
      (KeyCode::BackTab | KeyCode::Up, _) => self.focus = focus.previous(),
      (KeyCode::Left | KeyCode::Right, _) if !focus.is_input() => {
        self.focus = if focus == Field::Ok { Field::Cancel } else { Field::Ok };
      }
      (KeyCode::Backspace, _) => {
        if let Some(text) = self.focused_text_mut() {
          text.pop();
        }
      }
      (KeyCode::Char(c), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
        if let Some(text) = self.focused_text_mut() {
          text.push(c);
        }
      }
      _ => {}
    }

    if focus.is_input() {
      FormAction::Interacted
    } else {
      FormAction::Continue
    }
  }

  fn handle_mouse(&mut self, mouse: MouseEvent) -> FormAction {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
      return FormAction::Continue;
    }

    let position = Position::new(mouse.column, mouse.row);
    match self.hit_areas.field_at(position) {
      Some(field @ (Field::UserName | Field::Password)) => {
        self.focus = field;
        FormAction::Interacted
      }
      Some(Field::Cancel) => FormAction::Cancel,
      Some(Field::Ok) => FormAction::Confirm,
      None => FormAction::Continue,
    }
  }

  fn focused_text_mut(&mut self) -> Option<&mut String> {
    match self.focus {
      Field::UserName => Some(&mut self.user_name),
      Field::Password => Some(&mut self.password),
      Field::Cancel | Field::Ok => None,
    }
  }

  /// Draw the form centred in the frame
  pub fn render(&mut self, frame: &mut Frame) {
    let area = form_area(frame.area(), self.instructions.len());
    let block = Block::default()
      .borders(Borders::ALL)
      .title(Span::styled(
        format!(" {} ", self.title),
        Style::default().add_modifier(Modifier::BOLD),
      ));
    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let instruction_rows = u16::try_from(self.instructions.len()).unwrap_or(u16::MAX);
    let rows = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(instruction_rows),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
      ])
      .split(inner);

    let instructions: Vec<Line> = self.instructions.iter().map(|line| Line::raw(line.as_str())).collect();
    frame.render_widget(Paragraph::new(instructions), rows[0]);

    let masked = "*".repeat(self.password_len());
    self.hit_areas.user_name = self.render_field(frame, rows[2], USER_NAME_LABEL, &self.user_name, Field::UserName);
    self.hit_areas.password = self.render_field(frame, rows[3], PASSWORD_LABEL, &masked, Field::Password);
    self.render_buttons(frame, rows[5]);

    let footer = Paragraph::new(Line::styled(FOOTER_HINT, Style::default().fg(Color::DarkGray)));
    frame.render_widget(footer, rows[6]);

    match self.focus {
      Field::UserName => place_cursor(frame, self.hit_areas.user_name, self.user_name.chars().count()),
      Field::Password => place_cursor(frame, self.hit_areas.password, self.password_len()),
      Field::Cancel | Field::Ok => {}
    }
  }

  /// Draws `label value` on `row`, returning the area of the value.
  fn render_field(&self, frame: &mut Frame, row: Rect, label: &str, value: &str, field: Field) -> Rect {
    let label_width = u16::try_from(label.len()).unwrap_or(row.width).min(row.width);
    let value_area = Rect {
      x: row.x + label_width,
      width: row.width - label_width,
      ..row
    };

    let value_style = if self.focus == field {
      Style::default().add_modifier(Modifier::UNDERLINED).fg(Color::Cyan)
    } else {
      Style::default().add_modifier(Modifier::UNDERLINED)
    };
    let line = Line::from(vec![Span::raw(label), Span::styled(value, value_style)]);
    frame.render_widget(Paragraph::new(line), row);

    value_area
  }

  fn render_buttons(&mut self, frame: &mut Frame, row: Rect) {
    let cancel_width = CANCEL_LABEL.len() as u16;
    let ok_width = OK_LABEL.len() as u16;
    let total = cancel_width + 1 + ok_width;
    let start = row.x + row.width.saturating_sub(total) / 2;

    self.hit_areas.cancel = Rect::new(start, row.y, cancel_width.min(row.width), 1).intersection(row);
    self.hit_areas.ok = Rect::new(start + cancel_width + 1, row.y, ok_width, 1).intersection(row);

    let button_style = |field: Field| {
      if self.focus == field {
        Style::default().add_modifier(Modifier::BOLD).bg(Color::Blue).fg(Color::White)
      } else {
        Style::default()
      }
    };
    frame.render_widget(
      Paragraph::new(Span::styled(CANCEL_LABEL, button_style(Field::Cancel))),
      self.hit_areas.cancel,
    );
    frame.render_widget(
      Paragraph::new(Span::styled(OK_LABEL, button_style(Field::Ok))),
      self.hit_areas.ok,
    );
  }

  /// The entered user name and password
  pub fn into_credential(self) -> Credential {
    Credential::new(self.user_name, self.password.as_str())
  }
}

fn form_area(screen: Rect, instruction_count: usize) -> Rect {
  // Borders, instructions, spacer, two fields, spacer, buttons, footer.
  let height = u16::try_from(instruction_count)
    .unwrap_or(u16::MAX)
    .saturating_add(8)
    .min(screen.height);
  let width = screen.width.clamp(MIN_FORM_WIDTH.min(screen.width), MAX_FORM_WIDTH);

  Rect {
    x: screen.x + (screen.width - width) / 2,
    y: screen.y + (screen.height - height) / 2,
    width,
    height,
  }
}

fn place_cursor(frame: &mut Frame, field: Rect, chars: usize) {
  if field.width == 0 {
    return;
  }
  let offset = u16::try_from(chars).unwrap_or(u16::MAX).min(field.width - 1);
  frame.set_cursor_position(Position::new(field.x + offset, field.y));
}

#[cfg(test)]
mod tests {
  use crossterm::event::KeyEventState;
  use ratatui::Terminal;
  use ratatui::backend::TestBackend;

  use super::*;

  fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
  }

  fn click(position: Position) -> Event {
    Event::Mouse(MouseEvent {
      kind: MouseEventKind::Down(MouseButton::Left),
      column: position.x,
      row: position.y,
      modifiers: KeyModifiers::NONE,
    })
  }

  fn rendered(form: &mut CredentialForm) -> Vec<String> {
    let mut terminal = Terminal::new(TestBackend::new(70, 16)).unwrap();
    terminal.draw(|frame| form.render(frame)).unwrap();
    let buffer = terminal.backend().buffer();
    (0..buffer.area.height)
      .map(|y| {
        (0..buffer.area.width)
          .map(|x| buffer[(x, y)].symbol())
          .collect::<String>()
      })
      .collect()
  }

  #[test]
  fn test_initial_state() {
    let form = CredentialForm::new("Title", vec!["Line one".to_string()], "alice");
    assert_eq!(form.focus(), Field::Password);
    assert_eq!(form.user_name(), "alice");
    assert_eq!(form.password_len(), 0);
    assert_eq!(form.instructions(), ["Line one".to_string()]);
  }

  #[test]
  fn test_typing_into_password_is_an_interaction() {
    let mut form = CredentialForm::new("Title", vec![], "alice");
    for c in "pw!".chars() {
      assert_eq!(form.handle_event(&key(KeyCode::Char(c))), FormAction::Interacted);
    }
    assert_eq!(form.handle_event(&key(KeyCode::Backspace)), FormAction::Interacted);

    assert_eq!(form.into_credential(), Credential::new("alice", "pw"));
  }

  #[test]
  fn test_enter_on_user_name_moves_to_password() {
    let mut form = CredentialForm::new("Title", vec![], "");
    form.handle_event(&key(KeyCode::BackTab));
    assert_eq!(form.focus(), Field::UserName);

    form.handle_event(&key(KeyCode::Char('b')));
    assert_eq!(form.handle_event(&key(KeyCode::Enter)), FormAction::Interacted);
    assert_eq!(form.focus(), Field::Password);
    assert_eq!(form.handle_event(&key(KeyCode::Enter)), FormAction::Confirm);
    assert_eq!(form.user_name(), "b");
  }

  #[test]
  fn test_buttons_do_not_count_as_field_interaction() {
    let mut form = CredentialForm::new("Title", vec![], "alice");
    form.handle_event(&key(KeyCode::Tab));
    assert_eq!(form.focus(), Field::Cancel);

    assert_eq!(form.handle_event(&key(KeyCode::Right)), FormAction::Continue);
    assert_eq!(form.focus(), Field::Ok);
    assert_eq!(form.handle_event(&key(KeyCode::Char('x'))), FormAction::Continue);
    assert_eq!(form.handle_event(&key(KeyCode::Enter)), FormAction::Confirm);

    form.handle_event(&key(KeyCode::Left));
    assert_eq!(form.handle_event(&key(KeyCode::Enter)), FormAction::Cancel);
  }

  #[test]
  fn test_escape_and_ctrl_c_cancel() {
    let mut form = CredentialForm::new("Title", vec![], "alice");
    assert_eq!(form.handle_event(&key(KeyCode::Esc)), FormAction::Cancel);

    let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert_eq!(form.handle_event(&ctrl_c), FormAction::Cancel);
    assert_eq!(form.password_len(), 0);
  }

  #[test]
  fn test_key_release_is_ignored() {
    let mut form = CredentialForm::new("Title", vec![], "alice");
    let release = Event::Key(KeyEvent {
      code: KeyCode::Char('a'),
      modifiers: KeyModifiers::NONE,
      kind: KeyEventKind::Release,
      state: KeyEventState::NONE,
    });

    assert_eq!(form.handle_event(&release), FormAction::Continue);
    assert_eq!(form.password_len(), 0);
  }

  #[test]
  fn test_render_shows_instructions_in_order_and_masks_password() {
    let mut form = CredentialForm::new(
      "credbroker - Domain Credentials",
      vec!["First instruction".to_string(), "Second instruction".to_string()],
      "alice",
    );
    for c in "hunter2".chars() {
      form.handle_event(&key(KeyCode::Char(c)));
    }

    let lines = rendered(&mut form);
    let find = |needle: &str| lines.iter().position(|line| line.contains(needle));

    let first = find("First instruction").unwrap();
    let second = find("Second instruction").unwrap();
    let user = find("User name: alice").unwrap();
    let password = find("Password:  *******").unwrap();
    let buttons = find("[ Cancel ] [ OK ]").unwrap();

    assert!(first < second && second < user && user < password && password < buttons);
    assert!(find("credbroker - Domain Credentials").is_some());
    assert!(lines.iter().all(|line| !line.contains("hunter2")));
  }

  #[test]
  fn test_clicks_use_rendered_areas() {
    let mut form = CredentialForm::new("Title", vec![], "alice");
    rendered(&mut form);

    let user_name = form.hit_areas.user_name;
    assert_eq!(
      form.handle_event(&click(Position::new(user_name.x, user_name.y))),
      FormAction::Interacted
    );
    assert_eq!(form.focus(), Field::UserName);

    let ok = form.hit_areas.ok;
    assert_eq!(form.handle_event(&click(Position::new(ok.x, ok.y))), FormAction::Confirm);

    let cancel = form.hit_areas.cancel;
    assert_eq!(
      form.handle_event(&click(Position::new(cancel.x + 1, cancel.y))),
      FormAction::Cancel
    );
    assert_eq!(form.handle_event(&click(Position::new(0, 0))), FormAction::Continue);
  }
}
