use std::{io::Cursor, sync::Arc};

use chrono::NaiveDate;
use reveille::{
    clock::ManualClock, config::Config, player::BellPlayer, shell::Shell, Scheduler,
};

fn run(script: &str) -> (Scheduler, String) {
    let now = NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap();
    let scheduler = Scheduler::with_clock(
        &Config::default(),
        Box::new(BellPlayer),
        Arc::new(ManualClock::new(now)),
    );
    let mut out = Vec::new();
    Shell::new(&scheduler, "%H:%M")
        .run(Cursor::new(script.to_string()), &mut out)
        .unwrap();
    (scheduler, String::from_utf8(out).unwrap())
}

#[test]
fn a_session_manages_alarms() {
    let (scheduler, out) = run(
        "add 07:30 \"Wake up\" 0,1\n\
         add 18:00 End of day alarm.wav\n\
         list\n\
         toggle alarm_0\n\
         remove alarm_9\n\
         remove alarm_1\n\
         stop_sound\n\
         add 7 oops\n\
         quit\n\
         list\n",
    );
    assert!(out.contains("Alarm added successfully with ID: alarm_0"));
    assert!(out.contains("Alarm added successfully with ID: alarm_1"));
    assert!(out.contains("Time: 07:30"));
    assert!(out.contains("Repeat Days: Monday, Tuesday"));
    assert!(out.contains("Sound File: alarm.wav"));
    assert!(out.contains("Description: End of day"));
    assert!(out.contains("Alarm alarm_0 toggled successfully."));
    assert!(out.contains("Alarm alarm_9 not found."));
    assert!(out.contains("Alarm alarm_1 removed successfully."));
    assert!(out.contains("No sound is currently playing."));
    assert!(out.contains("Error: invalid time format `7`"));
    // nothing after quit runs
    assert_eq!(out.matches("Current Alarms:").count(), 1);

    let views = scheduler.list();
    assert_eq!(views.len(), 1);
    assert!(!views[0].is_active);
}

#[test]
fn start_and_stop_from_the_prompt() {
    let (scheduler, out) = run("start\nstart\nstop\nhelp\n");
    assert_eq!(out.matches("Alarm clock started.").count(), 2);
    assert!(out.contains("Alarm clock stopped."));
    assert!(out.contains("Available Commands:"));
    assert!(!scheduler.is_running());
}

#[test]
fn mistakes_are_reported_and_the_prompt_continues() {
    let (_, out) = run("snooze\nremove\nadd 07:30 \"unclosed\nlist\n");
    assert!(out.contains("Unknown command `snooze`"));
    assert!(out.contains("Usage: remove <alarm_id>"));
    assert!(out.contains("check the quotes"));
    assert!(out.contains("No alarms set."));
}
