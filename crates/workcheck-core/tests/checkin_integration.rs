//! Integration tests for full check-in sessions.
//!
//! Every scenario runs on a simulated clock: time only moves when a test
//! passes a later instant to `advance`, so nothing here sleeps.

use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use workcheck_core::{
    AckOutcome, CheckinEngine, CheckinPolicy, Event, LogCategory, MemoryLog,
    NotificationPermission, Notifier, NotifyError, PopupState, RandomSource, TimeWindow,
    WindowPicker,
};

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 9)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// Records every notification it is asked to send.
#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    permission: Option<NotificationPermission>,
}

impl Notifier for RecordingNotifier {
    fn request_permission(&mut self) -> NotificationPermission {
        self.permission.unwrap_or(NotificationPermission::Granted)
    }

    fn send(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// Always lands in the middle of the remaining window, so every cycle
/// leaves room for the next one.
struct Halfway;

impl RandomSource for Halfway {
    fn below(&mut self, span: u64) -> u64 {
        span / 2
    }
}

struct Session {
    engine: CheckinEngine,
    log: MemoryLog,
    notifier: RecordingNotifier,
}

fn session(window: &str, seed: u64) -> Session {
    session_with(
        window,
        WindowPicker::seeded(seed),
        CheckinPolicy::default(),
        RecordingNotifier::default(),
    )
}

fn session_with(
    window: &str,
    picker: WindowPicker,
    policy: CheckinPolicy,
    notifier: RecordingNotifier,
) -> Session {
    let (start, end) = window.split_once('-').unwrap();
    let log = MemoryLog::new();
    let engine = CheckinEngine::new(
        policy,
        TimeWindow::parse(start, end).unwrap(),
        picker,
        Box::new(log.clone()),
        Box::new(notifier.clone()),
    );
    Session {
        engine,
        log,
        notifier,
    }
}

/// Advance second by second from `from` to `to` inclusive, collecting events.
fn step_through(engine: &mut CheckinEngine, from: NaiveDateTime, to: NaiveDateTime) -> Vec<Event> {
    let mut events = Vec::new();
    let mut now = from;
    while now <= to {
        events.extend(engine.advance(now));
        now += Duration::seconds(1);
    }
    events
}

fn fire_pending(s: &mut Session) -> NaiveDateTime {
    let trigger = s.engine.pending_trigger().expect("trigger armed");
    let events = s.engine.advance(trigger);
    assert!(
        events.iter().any(|e| matches!(e, Event::PopupShown { .. })),
        "expected popup at {trigger}, got {events:?}"
    );
    trigger
}

#[test]
fn ack_inside_grace_is_prompt() {
    let mut s = session("14:45-14:55", 11);
    s.engine.start(at(14, 50, 0));
    let fired = fire_pending(&mut s);

    step_through(&mut s.engine, fired, fired + Duration::seconds(30));
    assert_eq!(s.engine.state(), PopupState::AwaitingAck);

    let events = s.engine.acknowledge(fired + Duration::seconds(30));
    match &events[0] {
        Event::PopupAcknowledged {
            outcome,
            missed_secs,
            session_count,
            ..
        } => {
            assert_eq!(*outcome, AckOutcome::Prompt);
            assert_eq!(*missed_secs, 0);
            assert_eq!(*session_count, 1);
        }
        other => panic!("Expected PopupAcknowledged, got {other:?}"),
    }
    assert_eq!(
        s.log.latest_in(LogCategory::PopupPrompt),
        Some("I'm Here".to_string())
    );
}

#[test]
fn ack_after_grace_reports_overdue_seconds() {
    let mut s = session("14:45-14:55", 12);
    s.engine.start(at(14, 45, 0));
    let fired = fire_pending(&mut s);

    let events = step_through(&mut s.engine, fired, fired + Duration::seconds(95));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::GracePeriodElapsed { .. })));
    assert_eq!(s.engine.state(), PopupState::Overdue);

    let events = s.engine.acknowledge(fired + Duration::seconds(95));
    let Event::PopupAcknowledged {
        outcome,
        missed_secs,
        ..
    } = events[0]
    else {
        panic!("Expected PopupAcknowledged, got {:?}", events[0]);
    };
    assert_eq!(outcome, AckOutcome::Late);
    assert!((34..=36).contains(&missed_secs), "missed {missed_secs}");
    assert_eq!(
        s.log.latest_in(LogCategory::PopupLate),
        Some(format!("Popup clicked after 00:{missed_secs:02}"))
    );
}

#[test]
fn coarse_advance_catches_up_missed_ticks() {
    let mut s = session("14:45-14:55", 13);
    s.engine.start(at(14, 45, 0));
    let fired = fire_pending(&mut s);

    // One late wake-up instead of one per second.
    s.engine.advance(fired + Duration::seconds(95));
    assert_eq!(s.engine.missed_secs(), 35);
}

#[test]
fn ack_right_as_grace_ends_is_late_with_zero() {
    let mut s = session("14:45-14:55", 14);
    s.engine.start(at(14, 45, 0));
    let fired = fire_pending(&mut s);
    s.engine.advance(fired + Duration::seconds(60));
    assert_eq!(s.engine.state(), PopupState::Overdue);

    let events = s.engine.acknowledge(fired + Duration::seconds(60));
    assert!(matches!(
        events[0],
        Event::PopupAcknowledged {
            outcome: AckOutcome::Late,
            missed_secs: 0,
            ..
        }
    ));
}

#[test]
fn two_cycles_then_no_more_scheduling() {
    let mut s = session_with(
        "14:45-14:55",
        WindowPicker::new(Box::new(Halfway)),
        CheckinPolicy::default(),
        RecordingNotifier::default(),
    );
    s.engine.start(at(14, 45, 0));

    for cycle in 1..=2 {
        let fired = fire_pending(&mut s);
        let events = s.engine.acknowledge(fired + Duration::seconds(5));
        let rescheduled = events
            .iter()
            .any(|e| matches!(e, Event::PopupScheduled { .. }));
        assert_eq!(rescheduled, cycle < 2, "cycle {cycle}");
    }

    assert_eq!(s.engine.session_count(), 2);
    assert!(s.engine.pending_trigger().is_none());
    assert!(s.engine.is_quiescent());

    let scheduled_lines = s
        .log
        .entries()
        .iter()
        .filter(|e| e.message.starts_with("Random popup scheduled at"))
        .count();
    assert_eq!(scheduled_lines, 2);

    // Nothing left to fire no matter how far time moves.
    assert!(s.engine.advance(at(23, 59, 59)).is_empty());
    assert_eq!(s.engine.session_count(), 2);
}

#[test]
fn redundant_ack_is_noop() {
    let mut s = session("14:45-14:55", 16);
    s.engine.start(at(14, 45, 0));
    let before = s.log.len();
    assert!(s.engine.acknowledge(at(14, 46, 0)).is_empty());
    assert_eq!(s.log.len(), before);

    let fired = fire_pending(&mut s);
    assert_eq!(s.engine.acknowledge(fired).len(), 2);
    let after_first = s.log.len();
    assert!(s.engine.acknowledge(fired + Duration::seconds(1)).is_empty());
    assert_eq!(s.log.len(), after_first);
}

#[test]
fn elapsed_window_logs_not_checked_in() {
    let mut s = session("09:00-10:00", 17);
    let events = s.engine.start(at(11, 0, 0));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::WindowInactive { .. })));
    assert!(s.engine.is_quiescent());
    assert_eq!(
        s.log.latest_in(LogCategory::Action),
        Some("You are not checked in".to_string())
    );
}

#[test]
fn reconfigure_cancels_everything() {
    let mut s = session("14:45-14:55", 18);
    s.engine.start(at(14, 45, 0));
    let fired = fire_pending(&mut s);
    s.engine.advance(fired + Duration::seconds(70));
    assert_eq!(s.engine.state(), PopupState::Overdue);

    // Move the window into the past: reset leaves nothing armed.
    let events = s
        .engine
        .reconfigure(TimeWindow::parse("08:00", "09:00").unwrap(), fired + Duration::seconds(71));
    assert!(matches!(events[0], Event::SessionReset { .. }));
    assert!(matches!(events[1], Event::WindowInactive { .. }));
    assert_eq!(s.engine.session_count(), 0);
    assert_eq!(s.engine.state(), PopupState::Idle);
    assert_eq!(s.engine.missed_secs(), 0);
    assert!(s.engine.prompt().is_none());
    assert!(s.engine.is_quiescent());
    assert!(s.engine.advance(at(23, 59, 59)).is_empty());
}

#[test]
fn reconfigure_restores_popup_budget() {
    let mut s = session("14:45-14:55", 19);
    s.engine.start(at(14, 45, 0));
    for _ in 0..2 {
        let fired = fire_pending(&mut s);
        s.engine.acknowledge(fired);
    }
    assert!(s.engine.pending_trigger().is_none());

    s.engine
        .reconfigure(TimeWindow::parse("15:00", "16:00").unwrap(), at(14, 56, 0));
    let trigger = s.engine.pending_trigger().expect("new session schedules");
    assert!(trigger >= at(15, 0, 0) && trigger < at(16, 0, 0));
}

#[test]
fn late_wakeup_records_actual_fire_time() {
    let mut s = session("14:45-14:55", 20);
    s.engine.start(at(14, 45, 0));
    let trigger = s.engine.pending_trigger().unwrap();
    let woke = trigger + Duration::seconds(3);

    let events = s.engine.advance(woke);
    let Event::PopupShown {
        scheduled_for, at, ..
    } = events[0]
    else {
        panic!("Expected PopupShown, got {:?}", events[0]);
    };
    assert_eq!(scheduled_for, trigger);
    assert_eq!(at, woke);
    assert_eq!(s.engine.prompt().unwrap().fired_at, woke);
}

#[test]
fn notification_sent_only_with_permission() {
    let mut granted = session("14:45-14:55", 21);
    granted.engine.start(at(14, 45, 0));
    fire_pending(&mut granted);
    assert_eq!(
        granted.notifier.sent.lock().unwrap().as_slice(),
        &[("Work Check In".to_string(), "A random popup appeared!".to_string())]
    );

    let denied = RecordingNotifier {
        permission: Some(NotificationPermission::Denied),
        ..Default::default()
    };
    let mut s = session_with(
        "14:45-14:55",
        WindowPicker::seeded(21),
        CheckinPolicy::default(),
        denied,
    );
    s.engine.start(at(14, 45, 0));
    fire_pending(&mut s);
    assert!(s.notifier.sent.lock().unwrap().is_empty());
    assert!(s.engine.prompt().is_some());
    assert_eq!(
        s.log.latest_in(LogCategory::Popup).unwrap(),
        format!("Popup shown at {}", s.engine.prompt().unwrap().fired_at.format("%H:%M:%S"))
    );
}

#[test]
fn custom_policy_changes_grace_and_cap() {
    let policy = CheckinPolicy {
        grace_period_secs: 10,
        popups_per_session: 3,
    };
    let mut s = session_with(
        "14:45-14:55",
        WindowPicker::new(Box::new(Halfway)),
        policy,
        RecordingNotifier::default(),
    );
    s.engine.start(at(14, 45, 0));

    let fired = fire_pending(&mut s);
    s.engine.advance(fired + Duration::seconds(15));
    assert_eq!(s.engine.missed_secs(), 5);
    s.engine.acknowledge(fired + Duration::seconds(15));

    for _ in 0..2 {
        let fired = fire_pending(&mut s);
        s.engine.acknowledge(fired);
    }
    assert_eq!(s.engine.session_count(), 3);
    assert!(s.engine.pending_trigger().is_none());
}

#[test]
fn break_toggle_does_not_gate_popups() {
    let mut s = session("14:45-14:55", 23);
    s.engine.start(at(14, 45, 0));
    s.engine.toggle_break(at(14, 45, 1));
    assert!(s.engine.on_break());
    fire_pending(&mut s);
    assert!(s.engine.prompt().is_some());
}
