//! Inter-process communication between pomodoro and pomodoroctl
//!
//! Requests and responses are single lines of JSON over a Unix domain socket.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that pomodoroctl can send to pomodoro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Reset,
    Status,
}

/// Responses from pomodoro back to pomodoroctl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Ok,
    Status(TimerStatus),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub phase: Phase,
    pub remaining_seconds: u32,
    pub cycle_count: u32,
    pub running: bool,
    pub paused: bool,
    /// What the window currently shows in its time label
    pub time_text: String,
    pub cycle_text: String,
}

/// The kind of interval currently active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Working,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Working => "Working",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }

    /// Fixed length of the phase in seconds.
    pub fn duration_secs(&self) -> u32 {
        match self {
            Phase::Idle => 0,
            Phase::Working => 25 * 60,
            Phase::ShortBreak => 5 * 60,
            Phase::LongBreak => 30 * 60,
        }
    }
}

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection refused - is pomodoro running?")]
    ConnectionRefused,
}

pub const SOCKET_PATH: &str = "/tmp/pomodoro.sock";

/// Serialize a message as one newline-terminated JSON line.
pub fn encode_line<T: Serialize>(message: &T) -> Result<Vec<u8>, IpcError> {
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse one JSON line, ignoring the trailing newline.
pub fn decode_line<'a, T: Deserialize<'a>>(line: &'a str) -> Result<T, IpcError> {
    Ok(serde_json::from_str(line.trim_end())?)
}
