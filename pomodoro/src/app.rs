use crate::config::Config;
use crate::engine::{dispatch, format_clock, format_cycle, Effect, Host, TickToken, TimerEngine};
use crate::scheduler::TickScheduler;
use crate::ui::UiLayout;
use pomodoro_ipc::{Command, Response, TimerStatus};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Default, Clone, PartialEq, Debug)]
pub enum AppMode {
    #[default]
    Normal,
    ShowHelp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Start,
    Pause,
    Reset,
    Resume,
}

impl Button {
    /// Left to right, as drawn.
    pub const ALL: [Button; 4] = [Button::Start, Button::Pause, Button::Reset, Button::Resume];

    pub fn label(&self) -> &'static str {
        match self {
            Button::Start => "Start",
            Button::Pause => "Pause",
            Button::Reset => "Reset",
            Button::Resume => "Resume",
        }
    }

    fn command(&self) -> Command {
        match self {
            Button::Start => Command::Start,
            Button::Pause => Command::Pause,
            Button::Reset => Command::Reset,
            Button::Resume => Command::Resume,
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|b| b == self).unwrap_or(0)
    }
}

/// Everything the window shows that the engine controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pub time_text: String,
    pub cycle_text: String,
    pub pause_enabled: bool,
    pub resume_enabled: bool,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            time_text: format_clock(0),
            cycle_text: format_cycle(0),
            pause_enabled: false,
            resume_enabled: false,
        }
    }
}

/// The engine's view of the host while one batch of effects is applied.
struct Surface<'a> {
    scheduler: &'a mut TickScheduler,
    display: &'a mut Display,
    now: Instant,
}

impl Host for Surface<'_> {
    fn schedule_callback(&mut self, delay: Duration, token: TickToken) {
        self.scheduler.schedule(self.now, delay, token);
    }

    fn render_display(&mut self, time_text: &str, cycle_text: &str) {
        self.display.time_text = time_text.to_string();
        self.display.cycle_text = cycle_text.to_string();
    }

    fn set_controls_enabled(&mut self, pause_enabled: bool, resume_enabled: bool) {
        self.display.pause_enabled = pause_enabled;
        self.display.resume_enabled = resume_enabled;
    }
}

pub struct App {
    engine: TimerEngine,
    scheduler: TickScheduler,
    pub display: Display,
    pub focused: Button,
    pub mode: AppMode,
    pub config: Config,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            engine: TimerEngine::new(),
            scheduler: TickScheduler::new(),
            display: Display::default(),
            focused: Button::Start,
            mode: AppMode::Normal,
            config,
            should_quit: false,
        }
    }

    fn apply(&mut self, effects: Vec<Effect>, now: Instant) {
        let mut surface = Surface {
            scheduler: &mut self.scheduler,
            display: &mut self.display,
            now,
        };
        dispatch(effects, &mut surface);
    }

    pub fn handle_command(&mut self, command: Command, now: Instant) -> Response {
        let effects = match command {
            Command::Start => self.engine.start(),
            Command::Pause => self.engine.pause(),
            Command::Resume => self.engine.resume(),
            Command::Reset => self.engine.reset(),
            Command::Status => return Response::Status(self.status()),
        };
        debug!(?command, effects = effects.len(), "command handled");
        self.apply(effects, now);
        Response::Ok
    }

    /// Run every tick whose deadline has passed. Ticks scheduled while doing
    /// so wait for the next call, which gives the screen a chance to redraw.
    pub fn fire_due_ticks(&mut self, now: Instant) -> usize {
        let due = self.scheduler.pop_due(now);
        for token in &due {
            let effects = self.engine.tick(*token);
            self.apply(effects, now);
        }
        due.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn status(&self) -> TimerStatus {
        let state = self.engine.state();
        TimerStatus {
            phase: state.phase,
            remaining_seconds: state.remaining_seconds,
            cycle_count: state.cycle_count,
            running: state.running,
            paused: state.paused,
            time_text: self.display.time_text.clone(),
            cycle_text: self.display.cycle_text.clone(),
        }
    }

    pub fn is_enabled(&self, button: Button) -> bool {
        match button {
            Button::Start | Button::Reset => true,
            Button::Pause => self.display.pause_enabled,
            Button::Resume => self.display.resume_enabled,
        }
    }

    /// Disabled buttons swallow the press, like a greyed-out widget.
    pub fn press(&mut self, button: Button, now: Instant) {
        if !self.is_enabled(button) {
            debug!(button = button.label(), "ignoring press on disabled button");
            return;
        }
        info!(button = button.label(), "button pressed");
        self.handle_command(button.command(), now);
    }

    pub fn activate_focused(&mut self, now: Instant) {
        self.press(self.focused, now);
    }

    pub fn focus_next(&mut self) {
        let next = (self.focused.index() + 1) % Button::ALL.len();
        self.focused = Button::ALL[next];
    }

    pub fn focus_prev(&mut self) {
        let len = Button::ALL.len();
        let prev = (self.focused.index() + len - 1) % len;
        self.focused = Button::ALL[prev];
    }

    pub fn toggle_help(&mut self) {
        self.mode = match self.mode {
            AppMode::ShowHelp => AppMode::Normal,
            AppMode::Normal => AppMode::ShowHelp,
        };
    }

    pub fn click(&mut self, column: u16, row: u16, layout: &UiLayout, now: Instant) {
        if contains(layout.close, column, row) {
            self.should_quit = true;
            return;
        }
        let hit = layout
            .buttons
            .iter()
            .find(|(_, rect)| contains(*rect, column, row))
            .map(|(button, _)| *button);
        if let Some(button) = hit {
            self.focused = button;
            self.press(button, now);
        }
    }
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}
