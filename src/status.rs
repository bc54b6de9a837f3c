use std::{collections::HashMap, fmt, path::PathBuf};

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::alarm::{Alarm, AlarmId};

pub const STOPPED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmStatus {
    Playing,
    /// manually stopped at this time, won't ring again until the suppression runs out
    Stopped(NaiveDateTime),
    Active,
    Inactive,
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "Currently Playing"),
            Self::Stopped(at) => write!(f, "Stopped at {}", at.format(STOPPED_FORMAT)),
            Self::Active => write!(f, "Active"),
            Self::Inactive => write!(f, "Inactive"),
        }
    }
}

fn same_minute(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.date() == b.date() && a.hour() == b.hour() && a.minute() == b.minute()
}

/// playback and suppression state the scheduler keeps per alarm
#[derive(Debug, Default, Clone)]
pub struct StatusTracker {
    current: Option<AlarmId>,
    suppressed: HashMap<AlarmId, NaiveDateTime>,
}

impl StatusTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self, alarm: &Alarm) -> AlarmStatus {
        if self.current == Some(alarm.id) {
            AlarmStatus::Playing
        } else if let Some(at) = self.suppressed.get(&alarm.id) {
            AlarmStatus::Stopped(*at)
        } else if alarm.is_active {
            AlarmStatus::Active
        } else {
            AlarmStatus::Inactive
        }
    }

    #[must_use]
    pub const fn current(&self) -> Option<AlarmId> {
        self.current
    }

    pub fn set_current(&mut self, id: AlarmId) {
        self.current = Some(id);
    }

    pub fn take_current(&mut self) -> Option<AlarmId> {
        self.current.take()
    }

    /// clears the playing alarm, unless something else already replaced or cleared it
    pub fn finish(&mut self, id: AlarmId) {
        if self.current == Some(id) {
            self.current = None;
        }
    }

    pub fn suppress(&mut self, id: AlarmId, at: NaiveDateTime) {
        self.suppressed.insert(id, at);
    }

    #[must_use]
    pub fn suppressed_at(&self, id: AlarmId) -> Option<NaiveDateTime> {
        self.suppressed.get(&id).copied()
    }

    #[must_use]
    pub fn is_suppressed(&self, id: AlarmId) -> bool {
        self.suppressed.contains_key(&id)
    }

    /// drops suppressions older than `window`, returning the ids that were released.
    /// a suppression always lasts until the minute it was made in is over
    pub fn prune(&mut self, now: NaiveDateTime, window: TimeDelta) -> Vec<AlarmId> {
        let expired: Vec<_> = self
            .suppressed
            .iter()
            .filter(|(_, at)| now - **at >= window && !same_minute(now, **at))
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            self.suppressed.remove(id);
        }
        expired
    }

    /// removes everything known about `id`, returns true if it was playing
    pub fn forget(&mut self, id: AlarmId) -> bool {
        self.suppressed.remove(&id);
        if self.current == Some(id) {
            self.current = None;
            true
        } else {
            false
        }
    }
}

/// what a listing shows for one alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmView {
    pub id: AlarmId,
    pub time: NaiveTime,
    pub description: String,
    pub is_active: bool,
    pub repeat_days: Vec<&'static str>,
    pub sound_file: Option<PathBuf>,
    pub status: AlarmStatus,
}

impl AlarmView {
    #[must_use]
    pub fn new(alarm: &Alarm, status: AlarmStatus) -> Self {
        Self {
            id: alarm.id,
            time: alarm.time,
            description: alarm.description.clone(),
            is_active: alarm.is_active,
            repeat_days: alarm.repeat_days.names(),
            sound_file: alarm.sound_file.clone(),
            status,
        }
    }

    /// multi line description used by the shell's `list`
    #[must_use]
    pub fn render(&self, time_format: &str) -> String {
        let days = if self.repeat_days.is_empty() {
            "None".to_string()
        } else {
            self.repeat_days.join(", ")
        };
        let sound = self
            .sound_file
            .as_ref()
            .map_or_else(|| "Default".to_string(), |path| path.display().to_string());
        format!(
            "ID: {}\nTime: {}\nDescription: {}\nActive: {}\nRepeat Days: {days}\nSound File: {sound}\nStatus: {}",
            self.id,
            self.time.format(time_format),
            self.description,
            self.is_active,
            self.status,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::alarm::DaySet;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn alarm(id: u64) -> Alarm {
        Alarm::new(
            AlarmId(id),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            "standup".to_string(),
            DaySet::WEEKDAYS,
            None,
            at(8, 0, 0),
        )
    }

    #[test]
    fn playing_beats_stopped_beats_active() {
        let mut tracker = StatusTracker::new();
        let mut alarm = alarm(1);
        assert_eq!(tracker.status(&alarm), AlarmStatus::Active);
        alarm.is_active = false;
        assert_eq!(tracker.status(&alarm), AlarmStatus::Inactive);
        tracker.suppress(alarm.id, at(9, 0, 12));
        assert_eq!(tracker.status(&alarm), AlarmStatus::Stopped(at(9, 0, 12)));
        tracker.set_current(alarm.id);
        assert_eq!(tracker.status(&alarm), AlarmStatus::Playing);
    }

    #[test]
    fn status_text() {
        assert_eq!(AlarmStatus::Playing.to_string(), "Currently Playing");
        assert_eq!(
            AlarmStatus::Stopped(at(9, 0, 12)).to_string(),
            "Stopped at 2024-05-06 09:00:12"
        );
        assert_eq!(AlarmStatus::Active.to_string(), "Active");
        assert_eq!(AlarmStatus::Inactive.to_string(), "Inactive");
    }

    #[test]
    fn finish_only_clears_its_own_alarm() {
        let mut tracker = StatusTracker::new();
        tracker.set_current(AlarmId(2));
        tracker.finish(AlarmId(1));
        assert_eq!(tracker.current(), Some(AlarmId(2)));
        tracker.finish(AlarmId(2));
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn prune_releases_old_suppressions() {
        let mut tracker = StatusTracker::new();
        tracker.suppress(AlarmId(1), at(9, 0, 5));
        tracker.suppress(AlarmId(2), at(9, 0, 40));
        let released = tracker.prune(at(9, 1, 5), TimeDelta::seconds(60));
        assert_eq!(released, vec![AlarmId(1)]);
        assert!(!tracker.is_suppressed(AlarmId(1)));
        assert!(tracker.is_suppressed(AlarmId(2)));
    }

    #[test]
    fn short_window_still_covers_the_rest_of_the_minute() {
        let mut tracker = StatusTracker::new();
        tracker.suppress(AlarmId(1), at(9, 0, 5));
        assert!(tracker.prune(at(9, 0, 30), TimeDelta::seconds(10)).is_empty());
        assert!(tracker.is_suppressed(AlarmId(1)));
        assert!(tracker.prune(at(9, 0, 59), TimeDelta::seconds(10)).is_empty());
        assert_eq!(tracker.prune(at(9, 1, 0), TimeDelta::seconds(10)), vec![AlarmId(1)]);
    }

    #[test]
    fn forget_reports_whether_it_was_playing() {
        let mut tracker = StatusTracker::new();
        tracker.suppress(AlarmId(1), at(9, 0, 5));
        assert!(!tracker.forget(AlarmId(1)));
        assert_eq!(tracker.suppressed_at(AlarmId(1)), None);
        tracker.set_current(AlarmId(3));
        assert!(tracker.forget(AlarmId(3)));
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn view_renders_defaults() {
        let mut alarm = alarm(7);
        alarm.repeat_days = DaySet::empty();
        let view = AlarmView::new(&alarm, AlarmStatus::Active);
        let text = view.render("%I:%M %p");
        assert!(text.contains("ID: alarm_7"));
        assert!(text.contains("Time: 09:00 AM"));
        assert!(text.contains("Repeat Days: None"));
        assert!(text.contains("Sound File: Default"));
        assert!(text.contains("Status: Active"));
    }
}
