use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context as _, Result};
use crossterm::event::{Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, terminal};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use fete_core::session::RenderSession;

use super::core::{reduce, Action, Effect, Model, Msg};
use super::view;
use crate::save;
use crate::store::EventStore;

struct TerminalGuard {
    stdout: Stdout,
}

impl TerminalGuard {
    fn enter() -> Result<(Self, Terminal<CrosstermBackend<Stdout>>)> {
        enable_raw_mode().context("enable raw mode")?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableBracketedPaste,
            terminal::Clear(terminal::ClearType::All)
        )
        .context("enter alt screen")?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("create terminal")?;

        Ok((
            Self {
                stdout: io::stdout(),
            },
            terminal,
        ))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, DisableBracketedPaste, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

pub async fn run(session: RenderSession, store: &dyn EventStore) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));

    let (_guard, mut terminal) = TerminalGuard::enter()?;

    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Msg>();
    spawn_input_pump(msg_tx.clone(), shutdown.clone());
    spawn_tick_pump(msg_tx.clone(), shutdown.clone());

    let mut model = Model::new(session);
    let size = terminal.size().context("terminal size")?;
    (model, _) = reduce(
        model,
        Msg::Resize {
            width: size.width,
            height: size.height,
        },
    );
    (model, _) = reduce(
        model,
        Msg::Tick {
            now_ms: unix_epoch_ms(),
        },
    );

    let (next, effects) = reduce(model, Msg::Init);
    let (mut model, quit) = apply_effects(next, effects, store).await?;
    if quit {
        shutdown.store(true, Ordering::Relaxed);
        return Ok(());
    }

    terminal.draw(|f| view::draw(f, &model)).context("draw")?;

    while let Some(msg) = msg_rx.recv().await {
        let (next, effects) = reduce(model, msg);
        let (next, quit) = apply_effects(next, effects, store).await?;
        model = next;
        terminal.draw(|f| view::draw(f, &model)).context("draw")?;
        if quit {
            break;
        }
    }

    shutdown.store(true, Ordering::Relaxed);
    Ok(())
}

fn spawn_input_pump(tx: mpsc::UnboundedSender<Msg>, shutdown: Arc<AtomicBool>) {
    tokio::task::spawn_blocking(move || {
        while !shutdown.load(Ordering::Relaxed) {
            let ready = match crossterm::event::poll(Duration::from_millis(50)) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if !ready {
                continue;
            }

            let evt = match crossterm::event::read() {
                Ok(evt) => evt,
                Err(_) => continue,
            };

            let msg = match evt {
                CEvent::Key(key) => map_key(key).map(Msg::Action),
                CEvent::Resize(w, h) => Some(Msg::Resize {
                    width: w,
                    height: h,
                }),
                _ => None,
            };

            if let Some(msg) = msg {
                if tx.send(msg).is_err() {
                    break;
                }
            }
        }
    });
}

fn spawn_tick_pump(tx: mpsc::UnboundedSender<Msg>, shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(200));
        loop {
            interval.tick().await;
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            let _ = tx.send(Msg::Tick {
                now_ms: unix_epoch_ms(),
            });
        }
    });
}

fn unix_epoch_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_millis().min(u64::MAX as u128) as u64
}

fn map_key(key: KeyEvent) -> Option<Action> {
    if !matches!(key.kind, KeyEventKind::Press) {
        return None;
    }

    if matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    match key.code {
        KeyCode::Tab => Some(Action::Tab),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Up => Some(Action::MoveUp),
        KeyCode::Down => Some(Action::MoveDown),
        KeyCode::Home => Some(Action::GoTop),
        KeyCode::End => Some(Action::GoBottom),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Enter => Some(Action::Enter),
        KeyCode::Char(c) => {
            if key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
            {
                None
            } else {
                Some(Action::Char(c))
            }
        }
        _ => None,
    }
}

async fn apply_effects(
    mut model: Model,
    effects: Vec<Effect>,
    store: &dyn EventStore,
) -> Result<(Model, bool)> {
    let mut quit = false;
    let mut queue: VecDeque<Effect> = effects.into();

    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::Quit => {
                quit = true;
            }
            Effect::Save(payload) => {
                let result = save::submit(store, &payload).await;
                if let Err(err) = &result {
                    tracing::warn!(error = %err, "save from tui failed");
                }
                let (next, more) = reduce(model, Msg::SaveFinished(result));
                model = next;
                queue.extend(more);
            }
        }
    }

    Ok((model, quit))
}
