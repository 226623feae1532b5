//! A tour of the `conkit` widgets.
//!
//! Run it in a terminal of at least 40x14. Ctrl+C quits from anywhere; set
//! `CONKIT_DEBUG_LOG` to a file path to see what the key listener is doing.

use std::time::Duration;

use anyhow::Context as _;
use tokio_util::sync::CancellationToken;

use conkit::error::BoxError;
use conkit::geo::Region;
use conkit::geo::ScreenPoint;
use conkit::input::sync_handler;
use conkit::input::KeyChord;
use conkit::logging;
use conkit::term::curses::Curses;
use conkit::term::curses::CursesKeys;
use conkit::term::Screen;
use conkit::ui::Element;
use conkit::ui::KeyValueView;
use conkit::ui::Menu;
use conkit::ui::MenuEntry;
use conkit::ui::MenuOptions;
use conkit::ui::Pager;
use conkit::ui::ProgressBar;
use conkit::ui::SelectMode;
use conkit::ui::TextPrompt;
use conkit::ui::YesNo;
use conkit::Config;
use conkit::Console;

#[derive(Copy, Clone, Debug)]
enum Demo {
  Name,
  Features,
  Read,
  Copy,
  Quit,
}

/// The fixed parts of the screen.
struct Layout {
  menu: Region,
  info: KeyValueView,
  progress: ProgressBar,
  prompt: ScreenPoint,
  whole: Region,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = Config::from_env().context("invalid configuration")?;
  let _log = logging::init(&config);

  let screen = Curses::fullscreen().context("could not set up the terminal")?;
  let (cols, rows) = screen.size()?;
  anyhow::ensure!(
    cols >= 40 && rows >= 14,
    "terminal is {}x{}, need at least 40x14",
    cols,
    rows
  );

  let console = Console::new(screen, config)?;
  let mut listener = console.listener(CursesKeys);
  listener.start()?;

  let quit = CancellationToken::new();
  console.registry().register(KeyChord::ctrl('c'), {
    let quit = quit.clone();
    sync_handler(move |_| quit.cancel())
  });

  tracing::info!(cols, rows, "demo started");
  let result = run(&console, cols, rows, &quit).await;
  listener.stop();
  result
}

async fn run(
  console: &Console,
  cols: u16,
  rows: u16,
  quit: &CancellationToken,
) -> anyhow::Result<()> {
  let half = cols / 2;
  let layout = Layout {
    menu: Region::new(ScreenPoint::new(1, 2), half - 2, 7),
    info: KeyValueView::new(
      console,
      Region::new(ScreenPoint::new(half, 2), cols - half, 4),
      10,
    ),
    progress: ProgressBar::new(
      console,
      Region::line(ScreenPoint::new(half, 7), cols - half - 1),
      "Copy",
      40,
    ),
    prompt: ScreenPoint::new(1, rows - 3),
    whole: Region::new(ScreenPoint::zero(), cols, rows - 1),
  };

  layout.info.set("Terminal", format!("{}x{}", cols, rows))?;
  layout.info.set("Name", "(unset)")?;
  draw_all(console, &layout)?;

  while !quit.is_cancelled() {
    let menu = Menu::new(
      console,
      layout.menu,
      vec![
        MenuEntry::header("Widgets"),
        MenuEntry::new("Enter a name", Demo::Name),
        MenuEntry::new("Pick features", Demo::Features),
        MenuEntry::new("Read the manual", Demo::Read),
        MenuEntry::new("Copy some files", Demo::Copy),
        MenuEntry::new("Quit", Demo::Quit),
      ],
      MenuOptions::default(),
    )?;
    let pick = menu.show_one(quit).await?;
    tracing::debug!(?pick, "picked");

    match pick {
      Some(Demo::Name) => {
        let prompt = TextPrompt::new(console, layout.prompt, "Name:", 24);
        if let Some(name) = prompt.show(quit).await? {
          layout.info.set("Name", name)?;
        }
        prompt.erase()?;
      }
      Some(Demo::Features) => features(console, &layout, quit).await?,
      Some(Demo::Read) => {
        let pager = Pager::new(console, layout.whole, &manual());
        pager.show(quit).await?;
        pager.erase()?;
        draw_all(console, &layout)?;
      }
      Some(Demo::Copy) => copy(&layout, quit).await?,
      Some(Demo::Quit) | None => {
        let q = YesNo::new(console, layout.prompt, "Really quit?", false);
        let answer = q.show(quit).await?;
        q.erase()?;
        if answer != Some(false) {
          break;
        }
      }
    }
  }
  Ok(())
}

fn draw_all(console: &Console, layout: &Layout) -> anyhow::Result<()> {
  {
    let mut screen = console.screen();
    screen.print_at(ScreenPoint::new(1, 0), "conkit widget tour")?;
    screen.flush()?;
  }
  layout.info.redraw()?;
  layout.progress.redraw()?;
  console.status_bar().redraw()?;
  Ok(())
}

async fn features(
  console: &Console,
  layout: &Layout,
  quit: &CancellationToken,
) -> anyhow::Result<()> {
  let log = |name: &&str| -> Result<(), BoxError> {
    tracing::info!(feature = *name, "feature enabled");
    Ok(())
  };
  let menu = Menu::new(
    console,
    layout.menu,
    vec![
      MenuEntry::header("Features"),
      MenuEntry::new("Colors", "colors").selected().with_action(log),
      MenuEntry::new("Mouse", "mouse").disabled(),
      MenuEntry::new("Sound", "sound").with_action(log),
      MenuEntry::new("Vi keys", "vi").with_action(log),
    ],
    MenuOptions {
      mode: SelectMode::Multi,
      ..MenuOptions::default()
    },
  )?;
  if let Some(picked) = menu.show(quit).await? {
    layout.info.set("Features", picked.join(", "))?;
  }
  menu.erase()?;
  Ok(())
}

async fn copy(
  layout: &Layout,
  quit: &CancellationToken,
) -> anyhow::Result<()> {
  layout.progress.set(0)?;
  let (_, max) = layout.progress.value();
  for _ in 0..max {
    tokio::select! {
      _ = quit.cancelled() => break,
      _ = tokio::time::sleep(Duration::from_millis(50)) => {
        layout.progress.advance(1)?;
      }
    }
  }
  let (done, max) = layout.progress.value();
  layout.info.set("Copied", format!("{} of {} files", done, max))?;
  Ok(())
}

fn manual() -> String {
  let mut text = String::from(
    "CONKIT(1)\n\
     \n\
     Every widget owns a fixed region of the screen and redraws only that\n\
     region. Interactive widgets install their keys on the status bar while\n\
     they are shown, and put the previous keys back when they close.\n\
     \n\
     Keys in this pager:\n  \
       Up/Down      scroll a line\n  \
       PgUp/PgDn    scroll a page\n  \
       Home/End     jump to either end\n  \
       Q/Esc        close\n\
     \n",
  );
  for i in 1..=60 {
    text.push_str(&format!("{:>3}. filler line to scroll through\n", i));
  }
  text
}
