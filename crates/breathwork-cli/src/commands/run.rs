use std::io::BufRead;
use std::time::Duration;

use breathwork_core::clock::now_ms;
use breathwork_core::{Command, Config, Event, Session};
use clap::Args;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::bell::TerminalBell;

#[derive(Args)]
pub struct RunArgs {
    /// Pattern to start with (defaults to breathing.default_pattern)
    #[arg(long, short)]
    pattern: Option<String>,
    /// Wrap the session in a countdown, then exit. Without a value uses
    /// countdown.default_minutes
    #[arg(long, short, num_args = 0..=1)]
    minutes: Option<Option<i64>>,
    /// Start with audio cues off
    #[arg(long)]
    no_audio: bool,
    /// Print one JSON event per line instead of text
    #[arg(long)]
    json: bool,
    /// Ignore the stage lock on pattern and audio controls
    #[arg(long)]
    unlocked: bool,
}

/// A line typed while the session runs.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Command(Command),
    Quit,
    Help,
    Blank,
}

/// Parse one stdin line. A bare `timer` uses `default_minutes`.
fn parse_line(line: &str, default_minutes: u32) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Input::Blank);
    };
    let arg = words.next();
    let input = match (head.to_ascii_lowercase().as_str(), arg) {
        ("toggle" | "space", None) => Input::Command(Command::Toggle),
        ("start", None) => Input::Command(Command::Start),
        ("stop", None) => Input::Command(Command::Stop),
        ("audio" | "a", None) => Input::Command(Command::ToggleAudio),
        ("pattern" | "p", Some(id)) => Input::Command(Command::SelectPattern { id: id.to_string() }),
        ("timer" | "t", None) => Input::Command(Command::StartCountdown {
            minutes: i64::from(default_minutes),
        }),
        ("timer" | "t", Some(minutes)) => {
            let minutes = minutes
                .parse::<i64>()
                .map_err(|_| format!("'{minutes}' is not a number of minutes"))?;
            Input::Command(Command::StartCountdown { minutes })
        }
        ("cancel" | "c", None) => Input::Command(Command::CancelCountdown),
        ("status" | "s", None) => Input::Command(Command::Snapshot),
        ("quit" | "q" | "exit", None) => Input::Quit,
        ("help" | "h" | "?", None) => Input::Help,
        _ => return Err(format!("unrecognised input: '{}'", line.trim())),
    };
    Ok(input)
}

const HELP: &str =
    "commands: toggle | start | stop | pattern ID | audio | timer [MIN] | cancel | status | quit";

/// Forward stdin lines from a plain thread. The thread may still be blocked
/// in a read when the session loop ends; the process exits regardless.
fn spawn_stdin_reader() -> std::io::Result<mpsc::UnboundedReceiver<std::io::Result<String>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Renders events to stdout. Text mode prints countdown progress only when
/// the displayed time changes.
struct Printer {
    json: bool,
    last_remaining: Option<String>,
}

impl Printer {
    fn emit(&mut self, events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
        for event in events {
            if self.json {
                println!("{}", serde_json::to_string(event)?);
                continue;
            }
            if let Event::CountdownProgress { remaining, .. } = event {
                if self.last_remaining.as_ref() == Some(remaining) {
                    continue;
                }
                self.last_remaining = Some(remaining.clone());
            }
            println!("{}", event.describe());
        }
        Ok(())
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(id) = &args.pattern {
        config.pattern_table()?.lookup(id)?;
        config.breathing.default_pattern = id.clone();
    }
    if args.no_audio {
        config.audio.enabled = false;
    }
    if args.unlocked {
        config.stage.lock_controls = false;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(config, args));
    runtime.shutdown_background();
    result
}

async fn drive(config: Config, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(&config, TerminalBell::default(), now_ms())?;
    let mut printer = Printer {
        json: args.json,
        last_remaining: None,
    };

    let default_minutes = config.countdown.default_minutes;
    let opening = match args.minutes {
        Some(minutes) => {
            let minutes = minutes.unwrap_or_else(|| i64::from(default_minutes));
            session.handle(Command::StartCountdown { minutes }, now_ms())?
        }
        None => session.handle(Command::Start, now_ms())?,
    };
    printer.emit(&opening)?;
    let exit_on_completion = args.minutes.is_some();

    let mut ticker = tokio::time::interval(Duration::from_millis(config.driver.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = spawn_stdin_reader()?;
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(tick_ms = config.driver.tick_interval_ms, "session loop started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let events = session.tick(now_ms());
                printer.emit(&events)?;
                let completed = events
                    .iter()
                    .any(|e| matches!(e, Event::CountdownCompleted { .. }));
                if exit_on_completion && completed {
                    break;
                }
            }
            line = lines.recv(), if stdin_open => {
                let Some(line) = line else {
                    stdin_open = false;
                    continue;
                };
                let line = line?;
                match parse_line(&line, default_minutes) {
                    Ok(Input::Command(command)) => match session.handle(command, now_ms()) {
                        Ok(events) => printer.emit(&events)?,
                        Err(e) => eprintln!("{e}"),
                    },
                    Ok(Input::Quit) => break,
                    Ok(Input::Help) => eprintln!("{HELP}"),
                    Ok(Input::Blank) => {}
                    Err(e) => {
                        warn!(input = %line, "ignored input");
                        eprintln!("{e}\n{HELP}");
                    }
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    let closing = session.shutdown(now_ms());
    printer.emit(&closing)?;
    Ok(())
}
