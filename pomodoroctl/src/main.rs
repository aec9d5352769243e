use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use pomodoro_ipc::{decode_line, encode_line, Command, IpcError, Response, TimerStatus, SOCKET_PATH};
use std::io::ErrorKind;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

#[derive(Parser)]
#[command(name = "pomodoroctl")]
#[command(about = "Control a running Pomodoro timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Start a work interval
    Start,
    /// Pause the countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Stop and zero the timer and cycle count
    Reset,
    /// Get timer status
    Status,
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Start => Command::Start,
            Commands::Pause => Command::Pause,
            Commands::Resume => Command::Resume,
            Commands::Reset => Command::Reset,
            Commands::Status => Command::Status,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let response = send_command(cli.command.into()).await?;
    print!("{}", render_response(response)?);

    Ok(())
}

/// Text to print for a reply; an error reply becomes the process error.
fn render_response(response: Response) -> Result<String> {
    match response {
        Response::Ok => Ok("OK\n".to_string()),
        Response::Status(status) => Ok(describe(&status)),
        Response::Error(e) => bail!("{}", e),
    }
}

fn describe(status: &TimerStatus) -> String {
    let state = if status.paused {
        "paused"
    } else if status.running {
        "running"
    } else {
        "stopped"
    };
    format!(
        "Phase: {}\nState: {}\nRemaining: {}s\nDisplay: {} / {}\n",
        status.phase.label(),
        state,
        status.remaining_seconds,
        status.time_text,
        status.cycle_text
    )
}

async fn send_command(cmd: Command) -> Result<Response, IpcError> {
    let stream = UnixStream::connect(SOCKET_PATH).await.map_err(|e| match e.kind() {
        ErrorKind::ConnectionRefused | ErrorKind::NotFound => IpcError::ConnectionRefused,
        _ => IpcError::Io(e),
    })?;
    let (reader, mut writer) = stream.into_split();

    // Send command
    writer.write_all(&encode_line(&cmd)?).await?;

    // Read response
    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line).await?;
    decode_line(&line)
}
