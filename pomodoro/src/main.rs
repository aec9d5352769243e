use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pomodoro_ipc::SOCKET_PATH;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info};

mod app;
mod config;
mod engine;
mod ipc;
mod logging;
mod scheduler;
mod ui;

use app::{App, AppMode, Button};
use ipc::server::Request;
use ui::UiLayout;

/// Upper bound on how long the loop waits for input when no tick is due.
const MAX_POLL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let config = config::load_config()?;
    let log_path = logging::init(&config)?;
    info!("Starting pomodoro, logging to {:?}", log_path);

    // The IPC server lives on its own runtime; the timer stays on this thread.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to start IPC runtime")?;
    let (request_tx, request_rx) = ipc::server::channel();
    runtime.spawn(async move {
        if let Err(e) = ipc::server::start(SOCKET_PATH, request_tx).await {
            error!("IPC server error: {:?}", e);
        }
    });

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, App::new(config), request_rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    runtime.shutdown_background();
    let _ = std::fs::remove_file(SOCKET_PATH);

    if let Err(err) = res {
        error!("Exiting after error: {:?}", err);
        eprintln!("Error: {:?}", err);
    }
    info!("pomodoro stopped");

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    mut requests: mpsc::Receiver<Request>,
) -> Result<()> {
    let mut layout = UiLayout::default();

    loop {
        app.fire_due_ticks(Instant::now());

        while let Ok(request) = requests.try_recv() {
            let response = app.handle_command(request.command, Instant::now());
            // The client may have hung up already.
            let _ = request.reply.send(response);
        }

        terminal.draw(|f| layout = ui::draw(f, &app))?;

        let timeout = poll_timeout(app.next_deadline(), Instant::now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(&mut app, key.code, Instant::now())
                }
                Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                    app.click(mouse.column, mouse.row, &layout, Instant::now())
                }
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn poll_timeout(next_deadline: Option<Instant>, now: Instant) -> Duration {
    next_deadline
        .map(|deadline| deadline.saturating_duration_since(now).min(MAX_POLL))
        .unwrap_or(MAX_POLL)
}

fn handle_key(app: &mut App, code: KeyCode, now: Instant) {
    match app.mode {
        AppMode::ShowHelp => match code {
            KeyCode::Char('?') | KeyCode::Esc => app.toggle_help(),
            KeyCode::Char('q') => app.should_quit = true,
            _ => {}
        },
        AppMode::Normal => match code {
            KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
            KeyCode::Char('s') => app.press(Button::Start, now),
            KeyCode::Char('p') => app.press(Button::Pause, now),
            KeyCode::Char('c') => app.press(Button::Resume, now),
            KeyCode::Char('r') => app.press(Button::Reset, now),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => app.focus_prev(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => app.focus_next(),
            KeyCode::Enter | KeyCode::Char(' ') => app.activate_focused(now),
            KeyCode::Char('?') => app.toggle_help(),
            _ => {}
        },
    }
}
