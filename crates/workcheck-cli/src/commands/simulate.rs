use chrono::{Duration, NaiveDateTime};
use clap::Args;
use workcheck_core::{CheckinEngine, Config, Event, MemoryLog, NullNotifier, WindowPicker};

use super::{parse_instant, WindowArgs};

/// Longest simulated span and acknowledgement delay: one year.
const MAX_SIMULATED_SECS: u64 = 366 * 86_400;

#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub window: WindowArgs,
    /// Simulated start instant (YYYY-MM-DDTHH:MM[:SS] or HH:MM[:SS]); defaults to now
    #[arg(long)]
    pub at: Option<String>,
    /// Fixed random seed (overrides random.seed)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Seconds after each popup to acknowledge it, in popup order.
    /// Popups without a matching value are never acknowledged.
    #[arg(
        long = "ack-after",
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(..=MAX_SIMULATED_SECS)
    )]
    pub ack_after: Vec<u64>,
    /// Simulated duration in seconds
    #[arg(
        long,
        default_value = "3600",
        value_parser = clap::value_parser!(u64).range(..=MAX_SIMULATED_SECS)
    )]
    pub duration: u64,
    /// Print the check-in log to stderr after the run
    #[arg(long)]
    pub log: bool,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let window = args.window.resolve(config.window)?;
    let start = parse_instant(args.at.as_deref())?;
    let horizon = seconds_after(start, args.duration)
        .ok_or_else(|| format!("--duration {} runs past the end of the calendar", args.duration))?;
    let log = MemoryLog::new();

    let mut engine = CheckinEngine::new(
        config.policy(),
        window,
        WindowPicker::with_seed(args.seed.or(config.random.seed)),
        Box::new(log.clone()),
        Box::new(NullNotifier),
    );

    let mut script = Script::new(args.ack_after);
    emit(&mut script, engine.start(start))?;

    while let Some(now) = next_step(&engine, &script, horizon) {
        emit(&mut script, engine.advance(now))?;
        if script.pending == Some(now) {
            script.pending = None;
            emit(&mut script, engine.acknowledge(now))?;
        }
    }

    println!("{}", serde_json::to_string(&engine.snapshot(horizon))?);

    if args.log {
        for entry in log.entries().iter().rev() {
            eprintln!("{entry}");
        }
    }
    Ok(())
}

/// Scripted user: acknowledges popups after fixed delays.
struct Script {
    delays: std::vec::IntoIter<u64>,
    pending: Option<NaiveDateTime>,
}

impl Script {
    fn new(delays: Vec<u64>) -> Self {
        Self {
            delays: delays.into_iter(),
            pending: None,
        }
    }

    fn observe(&mut self, event: &Event) {
        if let Event::PopupShown { at, .. } = event {
            self.pending = self.delays.next().and_then(|secs| seconds_after(*at, secs));
        }
    }
}

fn seconds_after(at: NaiveDateTime, secs: u64) -> Option<NaiveDateTime> {
    let secs = i64::try_from(secs).ok()?;
    at.checked_add_signed(Duration::try_seconds(secs)?)
}

/// Earliest instant at which either the engine or the script acts.
fn next_step(
    engine: &CheckinEngine,
    script: &Script,
    horizon: NaiveDateTime,
) -> Option<NaiveDateTime> {
    let next = match (engine.next_deadline(), script.pending) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b)?,
    };
    (next <= horizon).then_some(next)
}

fn emit(script: &mut Script, events: Vec<Event>) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        script.observe(&event);
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
