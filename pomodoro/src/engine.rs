//! Pomodoro countdown state machine.
//!
//! The engine never touches the screen or a clock. Every command returns the
//! effects the host has to carry out: redraw the labels, toggle the pause and
//! resume controls, or call [`TimerEngine::tick`] again after a delay.

use pomodoro_ipc::Phase;
use std::time::Duration;
use tracing::{debug, info};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Identifies one scheduled tick. Only the most recently issued token is live;
/// anything older fires as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_seconds: u32,
    pub cycle_count: u32,
    pub running: bool,
    pub paused: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            remaining_seconds: 0,
            cycle_count: 0,
            running: false,
            paused: false,
        }
    }
}

/// What the engine needs from whoever displays it.
pub trait Host {
    /// Call `tick(token)` once, `delay` from now.
    fn schedule_callback(&mut self, delay: Duration, token: TickToken);
    fn render_display(&mut self, time_text: &str, cycle_text: &str);
    fn set_controls_enabled(&mut self, pause_enabled: bool, resume_enabled: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ScheduleTick { delay: Duration, token: TickToken },
    Render { time_text: String, cycle_text: String },
    Controls { pause_enabled: bool, resume_enabled: bool },
}

impl Effect {
    pub fn apply<H: Host + ?Sized>(self, host: &mut H) {
        match self {
            Effect::ScheduleTick { delay, token } => host.schedule_callback(delay, token),
            Effect::Render {
                time_text,
                cycle_text,
            } => host.render_display(&time_text, &cycle_text),
            Effect::Controls {
                pause_enabled,
                resume_enabled,
            } => host.set_controls_enabled(pause_enabled, resume_enabled),
        }
    }
}

/// Apply effects in the order the engine produced them.
pub fn dispatch<H: Host + ?Sized>(effects: Vec<Effect>, host: &mut H) {
    for effect in effects {
        effect.apply(host);
    }
}

pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn format_cycle(cycle_count: u32) -> String {
    format!("Cycle: {}", cycle_count)
}

#[derive(Debug, Default)]
pub struct TimerEngine {
    state: TimerState,
    generation: u64,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Begin a new work interval. Does nothing while a timer is running.
    ///
    /// The first second is counted here rather than by a scheduled tick, so
    /// `25:00` shows at once and the last tick lands a full interval later.
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.begin_work(&mut effects) {
            self.count_down(&mut effects);
        }
        effects
    }

    pub fn pause(&mut self) -> Vec<Effect> {
        if !self.state.running || self.state.paused {
            return Vec::new();
        }
        self.state.paused = true;
        // The tick already queued with the host fires as a no-op.
        self.generation += 1;
        info!(remaining = self.state.remaining_seconds, "timer paused");
        vec![self.controls()]
    }

    pub fn resume(&mut self) -> Vec<Effect> {
        if !self.state.paused {
            return Vec::new();
        }
        self.state.paused = false;
        let mut effects = Vec::new();
        if self.state.running {
            info!(remaining = self.state.remaining_seconds, "timer resumed");
            effects.push(self.schedule(Duration::ZERO));
        }
        effects.push(self.controls());
        effects
    }

    pub fn reset(&mut self) -> Vec<Effect> {
        self.state = TimerState::default();
        self.generation += 1;
        info!("timer reset");
        vec![
            Effect::Render {
                time_text: format_clock(0),
                cycle_text: format_cycle(0),
            },
            self.controls(),
        ]
    }

    /// Advance the countdown by one second.
    ///
    /// A stale token, a stopped timer or a paused timer all make this a no-op,
    /// so callbacks the host queued before a pause or reset are harmless.
    pub fn tick(&mut self, token: TickToken) -> Vec<Effect> {
        if token.0 != self.generation || !self.state.running || self.state.paused {
            debug!(?token, "ignoring stale tick");
            return Vec::new();
        }

        let mut effects = Vec::new();
        if self.state.remaining_seconds == 0 {
            self.complete_phase(&mut effects);
        } else {
            self.count_down(&mut effects);
        }
        effects
    }

    fn count_down(&mut self, effects: &mut Vec<Effect>) {
        effects.push(Effect::Render {
            time_text: format_clock(self.state.remaining_seconds),
            cycle_text: format_cycle(self.state.cycle_count),
        });
        self.state.remaining_seconds -= 1;
        effects.push(self.schedule(TICK_INTERVAL));
    }

    /// Returns false when a timer was already running.
    fn begin_work(&mut self, effects: &mut Vec<Effect>) -> bool {
        if self.state.running {
            return false;
        }
        self.state.running = true;
        self.state.paused = false;
        self.state.cycle_count += 1;
        self.state.phase = Phase::Working;
        self.state.remaining_seconds = Phase::Working.duration_secs();
        info!(cycle = self.state.cycle_count, "work interval started");
        effects.push(self.controls());
        true
    }

    // The break is shown once and work restarts straight away, so breaks are
    // never counted down.
    // TODO: count the break down before calling begin_work again.
    fn complete_phase(&mut self, effects: &mut Vec<Effect>) {
        let next = if self.state.cycle_count % 4 == 0 {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        };
        self.state.phase = next;
        self.state.remaining_seconds = next.duration_secs();
        info!(cycle = self.state.cycle_count, phase = next.label(), "work interval complete");
        effects.push(Effect::Render {
            time_text: next.label().to_string(),
            cycle_text: format_cycle(self.state.cycle_count),
        });

        self.state.running = false;
        if self.begin_work(effects) {
            // Counting starts on the host's next pass so the break label gets drawn.
            effects.push(self.schedule(Duration::ZERO));
        }
    }

    fn schedule(&mut self, delay: Duration) -> Effect {
        self.generation += 1;
        Effect::ScheduleTick {
            delay,
            token: TickToken(self.generation),
        }
    }

    fn controls(&self) -> Effect {
        Effect::Controls {
            pause_enabled: self.state.running && !self.state.paused,
            resume_enabled: self.state.paused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled(effects: &[Effect]) -> Option<TickToken> {
        effects.iter().rev().find_map(|effect| match effect {
            Effect::ScheduleTick { token, .. } => Some(*token),
            _ => None,
        })
    }

    fn rendered(effects: &[Effect]) -> Vec<(String, String)> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Render {
                    time_text,
                    cycle_text,
                } => Some((time_text.clone(), cycle_text.clone())),
                _ => None,
            })
            .collect()
    }

    /// Feed `n` live ticks, returning every effect produced and the next token.
    fn run_ticks(
        engine: &mut TimerEngine,
        mut token: TickToken,
        n: usize,
    ) -> (Vec<Effect>, TickToken) {
        let mut all = Vec::new();
        for _ in 0..n {
            let effects = engine.tick(token);
            token = scheduled(&effects).expect("a running timer always schedules");
            all.extend(effects);
        }
        (all, token)
    }

    #[derive(Default)]
    struct RecordingHost {
        scheduled: Vec<(Duration, TickToken)>,
        displays: Vec<(String, String)>,
        controls: Option<(bool, bool)>,
    }

    impl Host for RecordingHost {
        fn schedule_callback(&mut self, delay: Duration, token: TickToken) {
            self.scheduled.push((delay, token));
        }

        fn render_display(&mut self, time_text: &str, cycle_text: &str) {
            self.displays.push((time_text.to_string(), cycle_text.to_string()));
        }

        fn set_controls_enabled(&mut self, pause_enabled: bool, resume_enabled: bool) {
            self.controls = Some((pause_enabled, resume_enabled));
        }
    }

    #[test]
    fn starts_idle() {
        let engine = TimerEngine::new();
        assert_eq!(engine.state(), &TimerState::default());
        assert_eq!(engine.state().phase, Phase::Idle);
    }

    #[test]
    fn start_begins_first_work_interval() {
        let mut engine = TimerEngine::new();
        let effects = engine.start();

        let state = engine.state();
        assert_eq!(state.phase, Phase::Working);
        assert_eq!(state.remaining_seconds, 1499);
        assert_eq!(state.cycle_count, 1);
        assert!(state.running);
        assert!(!state.paused);
        assert_eq!(
            rendered(&effects),
            vec![("25:00".to_string(), "Cycle: 1".to_string())]
        );
        assert!(effects.contains(&Effect::ScheduleTick {
            delay: TICK_INTERVAL,
            token: scheduled(&effects).unwrap(),
        }));
        assert!(effects.contains(&Effect::Controls {
            pause_enabled: true,
            resume_enabled: false,
        }));
    }

    #[test]
    fn start_while_running_is_ignored() {
        let mut engine = TimerEngine::new();
        let token = scheduled(&engine.start()).unwrap();
        run_ticks(&mut engine, token, 10);

        assert!(engine.start().is_empty());
        assert_eq!(engine.state().cycle_count, 1);
        assert_eq!(engine.state().remaining_seconds, 1489);
    }

    #[test]
    fn tick_shows_time_before_counting_down() {
        let mut engine = TimerEngine::new();
        let token = scheduled(&engine.start()).unwrap();

        let effects = engine.tick(token);
        assert_eq!(
            rendered(&effects),
            vec![("24:59".to_string(), "Cycle: 1".to_string())]
        );
        assert_eq!(engine.state().remaining_seconds, 1498);
        assert!(effects.contains(&Effect::ScheduleTick {
            delay: TICK_INTERVAL,
            token: scheduled(&effects).unwrap(),
        }));
    }

    #[test]
    fn full_work_interval_completes_once_into_short_break() {
        let mut engine = TimerEngine::new();
        let token = scheduled(&engine.start()).unwrap();

        // 1499 ticks show 24:59 down to 00:01 and leave nothing on the clock.
        let (effects, token) = run_ticks(&mut engine, token, 1499);
        let displays = rendered(&effects);
        assert_eq!(displays.last().unwrap().0, "00:01");
        assert!(displays.iter().all(|(time, _)| !time.ends_with("Break")));
        assert_eq!(engine.state().remaining_seconds, 0);
        assert_eq!(engine.state().phase, Phase::Working);

        // The 1500th finds zero and completes instead of counting.
        let effects = engine.tick(token);
        let displays = rendered(&effects);
        assert_eq!(
            displays,
            vec![("Short Break".to_string(), "Cycle: 1".to_string())]
        );
        assert!(displays.iter().all(|(time, _)| time != "00:00"));

        let state = engine.state();
        assert_eq!(state.phase, Phase::Working);
        assert_eq!(state.remaining_seconds, 1500);
        assert_eq!(state.cycle_count, 2);
        assert!(state.running);
    }

    #[test]
    fn every_fourth_cycle_earns_a_long_break() {
        let mut engine = TimerEngine::new();
        let mut token = scheduled(&engine.start()).unwrap();
        let mut labels = Vec::new();

        for round in 0..5 {
            // After a break, counting restarts with a zero-delay tick.
            let ticks = if round == 0 { 1500 } else { 1501 };
            let (effects, next) = run_ticks(&mut engine, token, ticks);
            token = next;
            labels.extend(
                rendered(&effects)
                    .into_iter()
                    .filter(|(time, _)| time.ends_with("Break")),
            );
        }

        let expected: Vec<(String, String)> = [
            ("Short Break", 1),
            ("Short Break", 2),
            ("Short Break", 3),
            ("Long Break", 4),
            ("Short Break", 5),
        ]
        .iter()
        .map(|(label, cycle)| (label.to_string(), format_cycle(*cycle)))
        .collect();
        assert_eq!(labels, expected);
        assert_eq!(engine.state().cycle_count, 6);
    }

    #[test]
    fn stale_ticks_after_pause_change_nothing() {
        let mut engine = TimerEngine::new();
        let token = scheduled(&engine.start()).unwrap();
        let (_, pending) = run_ticks(&mut engine, token, 99);
        assert_eq!(engine.state().remaining_seconds, 1400);

        let effects = engine.pause();
        assert_eq!(
            effects,
            vec![Effect::Controls {
                pause_enabled: false,
                resume_enabled: true,
            }]
        );
        for _ in 0..50 {
            assert!(engine.tick(pending).is_empty());
        }
        assert_eq!(engine.state().remaining_seconds, 1400);
        assert!(engine.state().paused);

        let resumed = scheduled(&engine.resume()).unwrap();
        // The pre-pause token stays dead after resuming.
        assert!(engine.tick(pending).is_empty());
        let effects = engine.tick(resumed);
        assert_eq!(rendered(&effects)[0].0, format_clock(1400));
        assert_eq!(engine.state().remaining_seconds, 1399);
    }

    #[test]
    fn pause_and_resume_outside_a_run_are_no_ops() {
        let mut engine = TimerEngine::new();
        assert!(engine.pause().is_empty());
        assert!(!engine.state().paused);
        assert!(engine.resume().is_empty());
        assert_eq!(engine.state(), &TimerState::default());

        let token = scheduled(&engine.start()).unwrap();
        engine.tick(token);
        assert!(engine.resume().is_empty());
        engine.pause();
        assert!(engine.pause().is_empty());
    }

    #[test]
    fn reset_returns_to_idle_from_anywhere() {
        let mut engine = TimerEngine::new();
        let token = scheduled(&engine.start()).unwrap();
        let (_, pending) = run_ticks(&mut engine, token, 3000);
        engine.pause();

        let effects = engine.reset();
        assert_eq!(engine.state(), &TimerState::default());
        assert_eq!(
            effects,
            vec![
                Effect::Render {
                    time_text: "00:00".to_string(),
                    cycle_text: "Cycle: 0".to_string(),
                },
                Effect::Controls {
                    pause_enabled: false,
                    resume_enabled: false,
                },
            ]
        );
        assert!(engine.tick(pending).is_empty());

        engine.reset();
        assert_eq!(engine.state(), &TimerState::default());
    }

    #[test]
    fn start_after_reset_counts_from_one() {
        let mut engine = TimerEngine::new();
        let token = scheduled(&engine.start()).unwrap();
        run_ticks(&mut engine, token, 1600);
        engine.reset();

        engine.start();
        assert_eq!(engine.state().cycle_count, 1);
        assert_eq!(engine.state().remaining_seconds, 1499);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(5), "00:05");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_cycle(3), "Cycle: 3");
    }

    #[test]
    fn effects_reach_the_host_in_order() {
        let mut engine = TimerEngine::new();
        let mut host = RecordingHost::default();

        dispatch(engine.start(), &mut host);
        let (delay, token) = host.scheduled[0];
        assert_eq!(delay, TICK_INTERVAL);
        assert_eq!(host.controls, Some((true, false)));
        assert_eq!(host.displays, vec![("25:00".to_string(), "Cycle: 1".to_string())]);

        dispatch(engine.tick(token), &mut host);
        assert_eq!(host.displays[1], ("24:59".to_string(), "Cycle: 1".to_string()));
        assert_eq!(host.scheduled[1].0, TICK_INTERVAL);

        dispatch(engine.reset(), &mut host);
        assert_eq!(host.displays.last().unwrap().0, "00:00");
        assert_eq!(host.controls, Some((false, false)));
    }

    #[test]
    fn invariants_hold_under_arbitrary_commands() {
        let mut engine = TimerEngine::new();
        let mut pending: Vec<TickToken> = Vec::new();
        let mut last_cycle = 0;
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;

        for _ in 0..20_000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;

            let mut was_reset = false;
            let effects = match seed % 10 {
                0 => engine.start(),
                1 => engine.pause(),
                2 => engine.resume(),
                3 if seed % 7 == 0 => {
                    was_reset = true;
                    engine.reset()
                }
                _ => match pending.pop() {
                    Some(token) => engine.tick(token),
                    None => Vec::new(),
                },
            };
            pending.extend(scheduled(&effects));

            let state = engine.state();
            assert!(state.remaining_seconds <= Phase::LongBreak.duration_secs());
            assert!(!state.paused || state.running);
            if was_reset {
                assert_eq!(state, &TimerState::default());
            } else {
                assert!(state.cycle_count >= last_cycle);
            }
            if state.phase == Phase::Idle {
                assert_eq!(state, &TimerState::default());
            }
            last_cycle = state.cycle_count;
        }
    }
}
