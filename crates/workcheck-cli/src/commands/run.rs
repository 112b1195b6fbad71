use std::io::{self, BufRead};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use clap::Args;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use workcheck_core::log::format_elapsed;
use workcheck_core::{CheckinEngine, Config, Event, MemoryLog, TimeWindow, WindowPicker};

use super::WindowArgs;
use crate::console::{ConsoleLog, DesktopNotifier};
use crate::display;

/// How long to sleep when no timer is armed.
const IDLE_POLL: Duration = Duration::from_secs(60);

const HELP: &str = "commands: ok | break | window HH:MM HH:MM | status | log | quit";

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub window: WindowArgs,
    /// Print the weekday row and clock every second
    #[arg(long)]
    pub clock: bool,
    /// Fixed random seed (overrides random.seed)
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    Acknowledge,
    Break,
    Window(TimeWindow),
    Status,
    Log,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<SessionCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "ok" | "ack" | "here" => SessionCommand::Acknowledge,
        "break" => SessionCommand::Break,
        "status" => SessionCommand::Status,
        "log" => SessionCommand::Log,
        "quit" | "exit" | "stop" => SessionCommand::Quit,
        "window" => {
            let (Some(start), Some(end), None) = (words.next(), words.next(), words.next()) else {
                return Err("usage: window HH:MM HH:MM".to_string());
            };
            let window = TimeWindow::parse(start, end).map_err(|e| e.to_string())?;
            SessionCommand::Window(window)
        }
        other => return Err(format!("unknown command: {other}. {HELP}")),
    };
    Ok(Some(command))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let window = args.window.resolve(config.window)?;
    let history = match config.log.capacity {
        Some(capacity) => MemoryLog::bounded(capacity),
        None => MemoryLog::new(),
    };
    let engine = CheckinEngine::new(
        config.policy(),
        window,
        WindowPicker::with_seed(args.seed.or(config.random.seed)),
        Box::new(ConsoleLog::new(history.clone())),
        Box::new(DesktopNotifier::new(config.notifications.enabled)),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let result = runtime.block_on(session(engine, history, args.clock));
    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_background();
    result
}

async fn session(
    mut engine: CheckinEngine,
    history: MemoryLog,
    clock: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || {
        eprintln!("{HELP}");
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_command(&line) {
                Ok(Some(command)) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => eprintln!("{message}"),
            }
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let events = engine.start(now());
    render(&engine, &events);
    loop {
        let sleep_for = engine
            .next_deadline()
            .map(|deadline| (deadline - now()).to_std().unwrap_or(Duration::ZERO))
            .unwrap_or(IDLE_POLL);

        tokio::select! {
            _ = tokio::time::sleep(sleep_for) => {
                let events = engine.advance(now());
                render(&engine, &events);
            }
            command = rx.recv() => {
                // Closed stdin ends the session like `quit`.
                let Some(command) = command else { break };
                if command == SessionCommand::Quit {
                    break;
                }
                handle(&mut engine, &history, command)?;
            }
            _ = ticker.tick(), if clock => {
                println!("{}", display::clock_line(now()));
                if let Some(missed) = engine.prompt().and_then(|p| p.missed_secs) {
                    println!("You missed time: {}", format_elapsed(missed));
                }
            }
        }
    }

    tracing::info!(session_count = engine.session_count(), "session ended");
    Ok(())
}

fn handle(
    engine: &mut CheckinEngine,
    history: &MemoryLog,
    command: SessionCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        SessionCommand::Acknowledge => {
            if engine.acknowledge(now()).is_empty() {
                eprintln!("no popup to confirm");
            }
        }
        SessionCommand::Break => {
            engine.toggle_break(now());
        }
        SessionCommand::Window(window) => {
            let events = engine.reconfigure(window, now());
            render(engine, &events);
        }
        SessionCommand::Status => {
            println!("{}", serde_json::to_string_pretty(&engine.snapshot(now()))?);
            if let Some(prompt) = engine.prompt() {
                for line in display::prompt_lines(&prompt) {
                    println!("{line}");
                }
            }
        }
        SessionCommand::Log => {
            for entry in history.entries() {
                println!("{entry}");
            }
        }
        SessionCommand::Quit => {}
    }
    Ok(())
}

/// Show the confirmation surface whenever it appears or changes phase.
fn render(engine: &CheckinEngine, events: &[Event]) {
    let changed = events.iter().any(|event| {
        matches!(
            event,
            Event::PopupShown { .. } | Event::GracePeriodElapsed { .. }
        )
    });
    if !changed {
        return;
    }
    if let Some(prompt) = engine.prompt() {
        for line in display::prompt_lines(&prompt) {
            println!("{line}");
        }
    }
}
