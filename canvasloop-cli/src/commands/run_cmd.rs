use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use canvasloop_core::{DisplayList, Host, Stage};

use crate::config::LoadedConfig;
use crate::logger;
use crate::state::{LogBuffer, ViewState};
use crate::terminal_host::TerminalHost;
use crate::ui;

const LOG_SCROLL_STEP: usize = 5;

/// What a terminal event means to the front end itself, on top of being
/// forwarded to the stage as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Quit,
    ToggleLoop,
    ToggleHelp,
    LogUp,
    LogDown,
    LogTop,
    LogBottom,
    None,
}

fn control_for(event: &Event) -> Control {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        ..
    }) = event
    else {
        return Control::None;
    };
    match code {
        KeyCode::Esc => Control::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Control::Quit,
        KeyCode::F(2) => Control::ToggleLoop,
        KeyCode::F(1) => Control::ToggleHelp,
        KeyCode::PageUp => Control::LogUp,
        KeyCode::PageDown => Control::LogDown,
        KeyCode::Home => Control::LogTop,
        KeyCode::End => Control::LogBottom,
        _ => Control::None,
    }
}

pub async fn run(loaded: LoadedConfig) -> anyhow::Result<()> {
    let LoadedConfig { config, source } = loaded;
    let log = Arc::new(Mutex::new(LogBuffer::new(config.terminal.log_lines)));
    logger::install(log.clone(), logger::level_from_env())?;
    log::info!("config: {source}");

    let (cols, rows) = crossterm::terminal::size()?;
    let host = TerminalHost::new(cols, rows);
    let stage = Stage::new(DisplayList::new(), Host::from_shared(host.clone()), config.stage)?;

    let mut terminal = ratatui::init();
    crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;
    let result = event_loop(
        &mut terminal,
        &host,
        &stage,
        &log,
        Duration::from_millis(config.terminal.repaint_ms),
    )
    .await;
    let restored = crossterm::execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    stage.detach();
    result?;
    restored?;
    Ok(())
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    host: &TerminalHost,
    stage: &Stage<DisplayList>,
    log: &Mutex<LogBuffer>,
    repaint_every: Duration,
) -> anyhow::Result<()> {
    // crossterm's blocking reader lives on its own thread; the loop itself
    // stays on this one with the single-threaded stage.
    let (tx, mut rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || loop {
        match crossterm::event::read() {
            Ok(event) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            Err(err) => {
                log::error!("terminal input failed: {err}");
                break;
            }
        }
    });

    let mut repaint = tokio::time::interval(repaint_every);
    repaint.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut view = ViewState::default();
    stage.start();

    while !view.should_quit {
        tokio::select! {
            _ = repaint.tick() => {
                host.repaint();
                terminal.draw(|frame| ui::render(frame, stage, &view, log))?;
            }
            event = rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                apply_control(control_for(&event), stage, &mut view, log);
                host.dispatch(&event);
            }
        }
    }
    Ok(())
}

fn apply_control(
    control: Control,
    stage: &Stage<DisplayList>,
    view: &mut ViewState,
    log: &Mutex<LogBuffer>,
) {
    match control {
        Control::Quit => view.should_quit = true,
        Control::ToggleLoop => {
            if stage.is_running() {
                stage.stop();
            } else {
                stage.start();
            }
        }
        Control::ToggleHelp => view.show_help = !view.show_help,
        Control::LogUp => with_log(log, |buffer| buffer.scroll_up(LOG_SCROLL_STEP)),
        Control::LogDown => with_log(log, |buffer| buffer.scroll_down(LOG_SCROLL_STEP)),
        Control::LogTop => with_log(log, |buffer| buffer.scroll_to_top()),
        Control::LogBottom => with_log(log, |buffer| buffer.scroll_to_bottom()),
        Control::None => {}
    }
}

fn with_log(log: &Mutex<LogBuffer>, f: impl FnOnce(&mut LogBuffer)) {
    if let Ok(mut buffer) = log.lock() {
        f(&mut buffer);
    }
}
