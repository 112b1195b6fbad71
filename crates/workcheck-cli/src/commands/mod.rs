pub mod config;
pub mod pick;
pub mod run;
pub mod simulate;

use chrono::{Local, NaiveDateTime};
use clap::Args;
use workcheck_core::{TimeOfDay, TimeWindow};

/// Window bounds shared by every command that schedules.
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Window start as HH:MM (defaults to the configured window)
    #[arg(long)]
    pub start: Option<String>,
    /// Window end as HH:MM (defaults to the configured window)
    #[arg(long)]
    pub end: Option<String>,
}

impl WindowArgs {
    /// Override the configured window with whichever bounds were given.
    pub fn resolve(&self, configured: TimeWindow) -> Result<TimeWindow, Box<dyn std::error::Error>> {
        let start = match &self.start {
            Some(s) => s.parse::<TimeOfDay>()?,
            None => configured.start,
        };
        let end = match &self.end {
            Some(s) => s.parse::<TimeOfDay>()?,
            None => configured.end,
        };
        Ok(TimeWindow::new(start, end))
    }
}

/// Parse `--at` as `YYYY-MM-DDTHH:MM[:SS]` or `HH:MM[:SS]` (today), or take
/// the local wall clock.
pub fn parse_instant(at: Option<&str>) -> Result<NaiveDateTime, Box<dyn std::error::Error>> {
    let Some(at) = at else {
        return Ok(Local::now().naive_local());
    };
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(instant) = NaiveDateTime::parse_from_str(at, format) {
            return Ok(instant);
        }
    }
    for format in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = chrono::NaiveTime::parse_from_str(at, format) {
            return Ok(Local::now().date_naive().and_time(time));
        }
    }
    Err(format!("invalid instant: {at} (expected YYYY-MM-DDTHH:MM[:SS] or HH:MM[:SS])").into())
}
