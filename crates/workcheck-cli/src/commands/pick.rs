use chrono::NaiveDateTime;
use clap::Args;
use serde::Serialize;
use workcheck_core::{Config, TimeWindow, WindowPicker};

use super::{parse_instant, WindowArgs};

#[derive(Args)]
pub struct PickArgs {
    #[command(flatten)]
    pub window: WindowArgs,
    /// Reference instant (YYYY-MM-DDTHH:MM[:SS] or HH:MM[:SS]); defaults to now
    #[arg(long)]
    pub at: Option<String>,
    /// Fixed random seed (overrides random.seed)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Number of instants to draw
    #[arg(long, default_value = "1")]
    pub samples: usize,
}

#[derive(Serialize)]
struct PickReport {
    window: TimeWindow,
    now: NaiveDateTime,
    /// Empty when the window has no room left on that day.
    picks: Vec<NaiveDateTime>,
}

pub fn run(args: PickArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let window = args.window.resolve(config.window)?;
    let now = parse_instant(args.at.as_deref())?;
    let mut picker = WindowPicker::with_seed(args.seed.or(config.random.seed));

    let picks = (0..args.samples)
        .map_while(|_| picker.pick_instant(&window, now))
        .collect();

    let report = PickReport { window, now, picks };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
