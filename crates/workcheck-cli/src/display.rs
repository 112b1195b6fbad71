//! Plain-text rendering for the interactive session.

use chrono::{Datelike, NaiveDateTime, Weekday};
use workcheck_core::log::{format_clock, format_elapsed};
use workcheck_core::ConfirmationPrompt;

const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// `Sun [Mon] Tue ...` with today's weekday bracketed.
pub fn weekday_row(now: NaiveDateTime) -> String {
    let today = now.weekday();
    WEEK.iter()
        .map(|day| {
            if *day == today {
                format!("[{day}]")
            } else {
                day.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn clock_line(now: NaiveDateTime) -> String {
    format!("{}  {}", weekday_row(now), format_clock(now))
}

/// Countdown wording for the grace period, e.g. `1min` or `45s`.
fn grace_label(secs: u64) -> String {
    if secs % 60 == 0 {
        format!("{}min", secs / 60)
    } else {
        format!("{secs}s")
    }
}

pub fn prompt_lines(prompt: &ConfirmationPrompt) -> Vec<String> {
    let status = match prompt.missed_secs {
        None => format!("You have {} to click", grace_label(prompt.grace_period_secs)),
        Some(missed) => format!("You missed time: {}", format_elapsed(missed)),
    };
    vec![
        format!("== {} ==", ConfirmationPrompt::TITLE),
        prompt.message(),
        status,
        "Type `ok` to confirm.".to_string(),
    ]
}
