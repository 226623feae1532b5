//! Prompts.

use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tokio_util::sync::CancellationToken;

use crate::console::Console;
use crate::error::Error;
use crate::error::Result;
use crate::geo::Region;
use crate::geo::ScreenPoint;
use crate::input::line::ReadId;
use crate::input::registry::noop;
use crate::input::sync_handler;
use crate::input::KeyChord;
use crate::ui::element::draw_in;
use crate::ui::element::erase_region;
use crate::ui::pending::AbortOnDrop;
use crate::ui::pending::Session;
use crate::ui::Element;
use crate::ui::PendingResult;
use crate::ui::StatusItem;

/// A yes/no question on one line.
///
/// Y and N answer it, Enter picks the default answer, and Esc dismisses it
/// without an answer. The default is shown in upper case: `Proceed? [Y/n]`.
#[derive(Clone)]
pub struct YesNo {
  inner: Arc<YesNoInner>,
}

struct YesNoInner {
  console: Console,
  at: ScreenPoint,
  question: String,
  default: bool,
  session: Mutex<Option<Session<bool>>>,
}

impl YesNo {
  /// Creates a new `YesNo` asking `question` at `at`.
  pub fn new(
    console: &Console,
    at: ScreenPoint,
    question: impl Into<String>,
    default: bool,
  ) -> Self {
    Self {
      inner: Arc::new(YesNoInner {
        console: console.clone(),
        at,
        question: question.into(),
        default,
        session: Mutex::new(None),
      }),
    }
  }

  fn session(&self) -> MutexGuard<'_, Option<Session<bool>>> {
    self
      .inner
      .session
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn text(&self) -> String {
    let choices = if self.inner.default { "[Y/n]" } else { "[y/N]" };
    format!("{} {}", self.inner.question, choices)
  }

  /// Returns whether the question is currently shown.
  pub fn is_shown(&self) -> bool {
    self.session().is_some()
  }

  /// Asks the question and waits for an answer.
  ///
  /// Returns `None` if it was dismissed or `cancel` fired.
  pub async fn show(
    &self,
    cancel: &CancellationToken,
  ) -> Result<Option<bool>> {
    let pending = self.open(cancel)?;
    let guard = AbortOnDrop::new(|| {
      self.abort();
    });
    let outcome = pending.await;
    guard.disarm();
    outcome
  }

  /// Draws the question and installs its keys, returning the answer to await.
  ///
  /// # Errors
  ///
  /// Returns [`Error::AlreadyShown`] if the question is already shown.
  pub fn open(
    &self,
    cancel: &CancellationToken,
  ) -> Result<PendingResult<bool>> {
    let mut slot = self.session();
    if slot.is_some() {
      return Err(Error::AlreadyShown);
    }

    self.redraw()?;
    let abort = {
      let this = self.clone();
      move || {
        this.abort();
      }
    };
    let (session, pending) =
      Session::begin(&self.inner.console, self.page(), cancel, abort)?;
    *slot = Some(session);
    Ok(pending)
  }

  /// Answers the question. Returns `false` if it was not shown.
  pub fn answer(&self, yes: bool) -> bool {
    self.finish(Ok(Some(yes)))
  }

  /// Dismisses the question without an answer. Returns `false` if it was not
  /// shown.
  pub fn abort(&self) -> bool {
    self.finish(Ok(None))
  }

  fn finish(&self, outcome: Result<Option<bool>>) -> bool {
    let session = self.session().take();
    match session {
      Some(s) => {
        tracing::debug!(question = %self.inner.question, ?outcome, "answered");
        s.finish(&self.inner.console, outcome)
      }
      None => false,
    }
  }

  fn page(&self) -> Vec<StatusItem> {
    let answer = |yes: bool| {
      let this = self.clone();
      sync_handler(move |_| {
        this.answer(yes);
      })
    };
    let this = self.clone();
    let default = answer(self.inner.default);
    vec![
      StatusItem::new("Yes", vec![KeyChord::char('y')], answer(true)),
      StatusItem::new("No", vec![KeyChord::char('n')], answer(false)),
      StatusItem::new("Default", vec![KeyChord::ENTER], default).hidden(),
      StatusItem::new(
        "Cancel",
        vec![KeyChord::ESC],
        sync_handler(move |_| {
          this.abort();
        }),
      ),
    ]
  }
}

impl Element for YesNo {
  fn console(&self) -> &Console {
    &self.inner.console
  }

  fn bounds(&self) -> Region {
    Region::line(self.inner.at, self.text().chars().count() as u16)
  }

  fn redraw(&self) -> io::Result<()> {
    let text = self.text();
    draw_in(&self.inner.console, self.bounds(), |s| s.print(&text))
  }
}

/// A labeled line of text input.
///
/// While the prompt is shown, keys without Ctrl go to the line being typed
/// (see [`Console::read_line()`]): Enter submits it and Esc dismisses the
/// prompt. At most `width` characters can be typed.
#[derive(Clone)]
pub struct TextPrompt {
  inner: Arc<TextPromptInner>,
}

struct TextPromptInner {
  console: Console,
  at: ScreenPoint,
  label: String,
  width: u16,
  reading: Mutex<Option<Reading>>,
}

/// One open prompt: its session, the line it reads, and where the cursor was
/// before.
struct Reading {
  session: Session<String>,
  line: ReadId,
  cursor: ScreenPoint,
}

impl TextPrompt {
  /// Creates a new `TextPrompt` at `at`, with room for `width` characters of
  /// input after `label`.
  pub fn new(
    console: &Console,
    at: ScreenPoint,
    label: impl Into<String>,
    width: u16,
  ) -> Self {
    Self {
      inner: Arc::new(TextPromptInner {
        console: console.clone(),
        at,
        label: label.into(),
        width,
        reading: Mutex::new(None),
      }),
    }
  }

  fn reading(&self) -> MutexGuard<'_, Option<Reading>> {
    self
      .inner
      .reading
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn input_at(&self) -> ScreenPoint {
    self.inner.at.right(self.inner.label.chars().count() as u16 + 1)
  }

  /// Returns whether the prompt is currently shown.
  pub fn is_shown(&self) -> bool {
    self.reading().is_some()
  }

  /// Shows the prompt and reads a line.
  ///
  /// Returns `None` if Esc was pressed or `cancel` fired.
  pub async fn show(
    &self,
    cancel: &CancellationToken,
  ) -> Result<Option<String>> {
    let pending = self.open(cancel)?;
    let guard = AbortOnDrop::new(|| {
      self.abort();
    });
    let outcome = pending.await;
    guard.disarm();
    outcome
  }

  /// Draws the prompt with an empty field and starts reading a line,
  /// returning the line to await.
  ///
  /// # Errors
  ///
  /// Returns [`Error::AlreadyShown`] if the prompt is already shown, or
  /// [`Error::LineInputBusy`] if another line is being read on the console.
  /// Either way the status bar is left alone.
  pub fn open(
    &self,
    cancel: &CancellationToken,
  ) -> Result<PendingResult<String>> {
    let mut slot = self.reading();
    if slot.is_some() {
      return Err(Error::AlreadyShown);
    }

    let console = &self.inner.console;
    let (line, done) = console.begin_line(Some(self.inner.width as usize))?;
    let abort = {
      let this = self.clone();
      move || {
        this.abort();
      }
    };
    let (session, pending) =
      match Session::begin(console, self.page(), cancel, abort) {
        Ok(s) => s,
        Err(e) => {
          console.end_line(line);
          return Err(e);
        }
      };
    let cursor = console.screen().cursor();
    *slot = Some(Reading {
      session,
      line,
      cursor,
    });
    drop(slot);

    if let Err(e) = self.draw_field() {
      self.abort();
      return Err(e.into());
    }

    let this = self.clone();
    tokio::spawn(async move {
      let typed = done.await.unwrap_or(None);
      this.line_done(line, typed);
    });
    Ok(pending)
  }

  /// Dismisses the prompt without a line. Returns `false` if it was not
  /// shown.
  pub fn abort(&self) -> bool {
    let reading = self.reading().take();
    match reading {
      Some(r) => self.close(r, None),
      None => false,
    }
  }

  fn line_done(&self, line: ReadId, typed: Option<String>) {
    let reading = {
      let mut slot = self.reading();
      match slot.take() {
        Some(r) if r.line == line => r,
        other => {
          *slot = other;
          return;
        }
      }
    };
    self.close(reading, typed);
  }

  fn close(&self, reading: Reading, typed: Option<String>) -> bool {
    let console = &self.inner.console;
    console.end_line(reading.line);
    tracing::debug!(
      label = %self.inner.label,
      submitted = typed.is_some(),
      "prompt closed"
    );
    if let Err(e) = self.park_cursor(reading.cursor) {
      tracing::warn!(error = %e, "failed to restore cursor");
    }
    reading.session.finish(console, Ok(typed))
  }

  fn draw_field(&self) -> io::Result<()> {
    let bounds = self.bounds();
    let mut screen = self.inner.console.screen();
    erase_region(&mut **screen, bounds)?;
    screen.print_at(self.inner.at, &self.inner.label)?;
    screen.move_to(self.input_at())?;
    screen.set_cursor_visible(true)?;
    screen.flush()
  }

  fn park_cursor(&self, cursor: ScreenPoint) -> io::Result<()> {
    let mut screen = self.inner.console.screen();
    screen.set_cursor_visible(false)?;
    screen.move_to(cursor)?;
    screen.flush()
  }

  fn page(&self) -> Vec<StatusItem> {
    vec![
      StatusItem::new("Submit", vec![KeyChord::ENTER], noop()),
      StatusItem::new("Cancel", vec![KeyChord::ESC], noop()),
    ]
  }
}

impl Element for TextPrompt {
  fn console(&self) -> &Console {
    &self.inner.console
  }

  fn bounds(&self) -> Region {
    let label = self.inner.label.chars().count() as u16 + 1;
    Region::line(self.inner.at, label.saturating_add(self.inner.width))
  }

  fn redraw(&self) -> io::Result<()> {
    let label = &self.inner.label;
    draw_in(&self.inner.console, self.bounds(), |s| s.print(label))
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use pretty_assertions::assert_eq;

  use super::*;
  use crate::term::headless::MemScreen;
  use crate::ui::StatusBar;
  use crate::Config;

  fn console() -> (MemScreen, Console) {
    let screen = MemScreen::new(30, 4);
    let console = Console::new(screen.clone(), Config::default()).unwrap();
    (screen, console)
  }

  #[tokio::test]
  async fn yes_no_answers() {
    let (screen, console) = console();
    let q = YesNo::new(&console, ScreenPoint::new(1, 0), "Proceed?", true);

    let answer = q.open(&CancellationToken::new()).unwrap();
    assert_eq!(screen.row_text(0), format!("{:30}", " Proceed? [Y/n]"));
    assert_eq!(
      screen.row_text(3),
      format!("{:30}", " Y Yes │ N No │ Esc Cancel")
    );
    assert!(console.dispatch(KeyChord::char('n')).await);
    assert_eq!(answer.await.unwrap(), Some(false));

    let answer = q.open(&CancellationToken::new()).unwrap();
    assert!(console.dispatch(KeyChord::ENTER).await);
    assert_eq!(answer.await.unwrap(), Some(true));

    let answer = q.open(&CancellationToken::new()).unwrap();
    assert!(console.dispatch(KeyChord::ESC).await);
    assert_eq!(answer.await.unwrap(), None);
    assert!(!q.abort());
    assert!(console.registry().is_empty());
  }

  #[tokio::test]
  async fn yes_no_default_no() {
    let (screen, console) = console();
    let q = YesNo::new(&console, ScreenPoint::zero(), "Delete?", false);
    let answer = q.open(&CancellationToken::new()).unwrap();
    assert_eq!(screen.text_at(ScreenPoint::zero(), 13), "Delete? [y/N]");
    assert!(matches!(
      q.open(&CancellationToken::new()),
      Err(Error::AlreadyShown)
    ));
    console.dispatch(KeyChord::ENTER).await;
    assert_eq!(answer.await.unwrap(), Some(false));
  }

  #[tokio::test]
  async fn yes_no_cancel_token() {
    let (_, console) = console();
    let q = YesNo::new(&console, ScreenPoint::zero(), "Sure?", true);
    let cancel = CancellationToken::new();
    let answer = q.open(&cancel).unwrap();
    cancel.cancel();
    let answer = tokio::time::timeout(Duration::from_secs(5), answer)
      .await
      .expect("prompt never canceled");
    assert_eq!(answer.unwrap(), None);
    assert!(!q.is_shown());
  }

  fn with_help(console: &Console) -> StatusBar {
    let bar = console.status_bar();
    let help = StatusItem::new("Help", vec![KeyChord::char('h')], noop());
    bar.show_items(vec![help]).unwrap();
    bar
  }

  async fn type_line(console: &Console, text: &str) {
    for c in text.chars() {
      console.dispatch(KeyChord::char(c)).await;
    }
    console.dispatch(KeyChord::ENTER).await;
  }

  #[tokio::test]
  async fn text_prompt_reads_a_line() {
    let (screen, console) = console();
    let bar = with_help(&console);

    let reader = {
      let console = console.clone();
      tokio::spawn(async move {
        TextPrompt::new(&console, ScreenPoint::new(0, 1), "Name:", 10)
          .show(&CancellationToken::new())
          .await
      })
    };
    while !console.is_reading_line() {
      tokio::task::yield_now().await;
    }
    assert_eq!(
      screen.row_text(3),
      format!("{:30}", " Enter Submit │ Esc Cancel")
    );

    for c in "Ada".chars() {
      console.dispatch(KeyChord::char(c)).await;
    }
    assert_eq!(screen.text_at(ScreenPoint::new(0, 1), 9), "Name: Ada");
    console.dispatch(KeyChord::ENTER).await;

    let line = reader.await.unwrap().unwrap();
    assert_eq!(line.as_deref(), Some("Ada"));
    assert_eq!(bar.items()[0].name(), "Help");
    assert!(console.registry().contains(KeyChord::char('h')));
    assert!(!console.is_reading_line());
  }

  #[tokio::test]
  async fn text_prompt_starts_with_an_empty_field() {
    let (screen, console) = console();
    let prompt = TextPrompt::new(&console, ScreenPoint::new(0, 1), "Name:", 10);
    let field = ScreenPoint::new(0, 1);

    let line = prompt.open(&CancellationToken::new()).unwrap();
    type_line(&console, "Ada").await;
    assert_eq!(line.await.unwrap().as_deref(), Some("Ada"));

    let line = prompt.open(&CancellationToken::new()).unwrap();
    assert_eq!(screen.text_at(field, 16), format!("{:16}", "Name:"));
    type_line(&console, "Bo").await;
    assert_eq!(line.await.unwrap().as_deref(), Some("Bo"));
    assert_eq!(screen.text_at(field, 10), "Name: Bo  ");
  }

  #[tokio::test]
  async fn text_prompt_input_fits_its_width() {
    let (screen, console) = console();
    let prompt = TextPrompt::new(&console, ScreenPoint::new(0, 1), "Name:", 3);

    let line = prompt.open(&CancellationToken::new()).unwrap();
    type_line(&console, "abcdef").await;
    assert_eq!(line.await.unwrap().as_deref(), Some("abc"));
    assert_eq!(screen.text_at(ScreenPoint::new(0, 1), 12), "Name: abc   ");
  }

  #[tokio::test]
  async fn text_prompt_escape_and_abort() {
    let (_, console) = console();
    let bar = with_help(&console);
    let prompt = TextPrompt::new(&console, ScreenPoint::zero(), "Say:", 8);
    assert!(!prompt.abort());

    let line = prompt.open(&CancellationToken::new()).unwrap();
    assert!(prompt.is_shown());
    console.dispatch(KeyChord::char('x')).await;
    console.dispatch(KeyChord::ESC).await;
    assert_eq!(line.await.unwrap(), None);
    assert!(!prompt.is_shown());

    let line = prompt.open(&CancellationToken::new()).unwrap();
    assert!(prompt.abort());
    assert!(!prompt.abort());
    assert_eq!(line.await.unwrap(), None);
    assert!(!console.is_reading_line());
    assert_eq!(bar.items()[0].name(), "Help");
  }

  #[tokio::test]
  async fn text_prompt_open_errors_keep_the_status_bar() {
    let (_, console) = console();
    let bar = with_help(&console);
    let prompt = TextPrompt::new(&console, ScreenPoint::zero(), "Say:", 8);

    let busy = console.begin_line(None).unwrap();
    assert!(matches!(
      prompt.open(&CancellationToken::new()),
      Err(Error::LineInputBusy)
    ));
    assert!(!prompt.is_shown());
    assert_eq!(bar.items()[0].name(), "Help");
    assert!(console.end_line(busy.0));

    let line = prompt.open(&CancellationToken::new()).unwrap();
    assert!(matches!(
      prompt.open(&CancellationToken::new()),
      Err(Error::AlreadyShown)
    ));
    assert!(console.is_reading_line());
    assert!(prompt.abort());
    assert_eq!(line.await.unwrap(), None);
    assert_eq!(bar.items()[0].name(), "Help");
  }

  #[tokio::test]
  async fn text_prompt_cancel_token() {
    let (_, console) = console();
    let prompt = TextPrompt::new(&console, ScreenPoint::zero(), "Say:", 8);
    let cancel = CancellationToken::new();
    let line = prompt.open(&cancel).unwrap();
    cancel.cancel();
    let line = tokio::time::timeout(Duration::from_secs(5), line)
      .await
      .expect("prompt never canceled");
    assert_eq!(line.unwrap(), None);
    assert!(!prompt.is_shown());
    assert!(!console.is_reading_line());
  }

  #[tokio::test]
  async fn dropped_text_prompt_releases_line_input() {
    let (_, console) = console();
    let bar = with_help(&console);
    let prompt = TextPrompt::new(&console, ScreenPoint::zero(), "Say:", 8);

    let token = CancellationToken::new();
    let show = prompt.show(&token);
    let timed_out = tokio::time::timeout(Duration::from_millis(20), show)
      .await
      .is_err();
    assert!(timed_out);
    assert!(!prompt.is_shown());
    assert!(!console.is_reading_line());
    assert_eq!(bar.items()[0].name(), "Help");
  }
}
