use std::{fmt, num::ParseIntError, path::PathBuf, str::FromStr};

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::{error::AlarmError, player::SoundSource};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// accepted layouts for alarm times, tried in order
const TIME_FORMATS: [&str; 3] = ["%H:%M", "%I:%M %p", "%I:%M%p"];

/// identifies an alarm within a store, displayed as `alarm_<n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmId(pub u64);

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alarm_{}", self.0)
    }
}

impl FromStr for AlarmId {
    type Err = ParseIntError;

    /// accepts both `alarm_3` and a bare `3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        s.strip_prefix("alarm_").unwrap_or(s).parse().map(Self)
    }
}

/// set of weekdays an alarm repeats on, bit `n` is day `n` (0 = Monday)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DaySet(u8);

impl DaySet {
    pub const WEEKDAYS: Self = Self(0b001_1111);
    pub const WEEKENDS: Self = Self(0b110_0000);
    pub const EVERY_DAY: Self = Self(0b111_1111);

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// builds a set from day numbers, rejecting anything outside `0..=6`
    ///
    /// # Errors
    /// [`AlarmError::InvalidWeekday`] for the first day number out of range
    pub fn from_indices(days: &[u8]) -> Result<Self, AlarmError> {
        days.iter().try_fold(Self::empty(), |set, &day| {
            if day > 6 {
                Err(AlarmError::InvalidWeekday(day))
            } else {
                Ok(Self(set.0 | 1 << day))
            }
        })
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        WEEK.into_iter().filter(move |day| self.contains(*day))
    }

    #[must_use]
    pub fn indices(self) -> Vec<u8> {
        self.iter()
            .map(|day| day.num_days_from_monday() as u8)
            .collect()
    }

    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(day_name).collect()
    }
}

#[must_use]
pub const fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// parses an alarm time, anything below a minute is dropped
///
/// # Errors
/// [`AlarmError::InvalidTimeFormat`] if none of the supported layouts match
pub fn parse_time(time_str: &str) -> Result<NaiveTime, AlarmError> {
    let trimmed = time_str.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .and_then(|time| NaiveTime::from_hms_opt(time.hour(), time.minute(), 0))
        .ok_or_else(|| AlarmError::InvalidTimeFormat(time_str.to_string()))
}

/// represents an alarm
/// contains the time that the alarm should go off at,
/// the days it repeats on and an optional sound file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub id: AlarmId,
    pub time: NaiveTime,
    /// the day of the next occurrence when the alarm was made,
    /// only one shot alarms look at it
    pub date: NaiveDate,
    pub description: String,
    pub is_active: bool,
    pub repeat_days: DaySet,
    /// no file means the synthesized tone
    pub sound_file: Option<PathBuf>,
}

impl Alarm {
    #[must_use]
    pub fn new(
        id: AlarmId,
        time: NaiveTime,
        description: String,
        repeat_days: DaySet,
        sound_file: Option<PathBuf>,
        now: NaiveDateTime,
    ) -> Self {
        // if the time already passed today the next occurrence is tomorrow
        let date = if time > now.time() {
            now.date()
        } else {
            now.date()
                .checked_add_days(Days::new(1))
                .unwrap_or_else(|| now.date())
        };
        Self {
            id,
            time,
            date,
            description,
            is_active: true,
            repeat_days,
            sound_file,
        }
    }

    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        !self.repeat_days.is_empty()
    }

    #[must_use]
    pub fn sound_source(&self) -> SoundSource {
        self.sound_file
            .clone()
            .map_or(SoundSource::Tone, SoundSource::File)
    }

    /// true if `now` lands on the same hour and minute as the alarm
    #[must_use]
    pub fn matches_minute(&self, now: NaiveDateTime) -> bool {
        now.hour() == self.time.hour() && now.minute() == self.time.minute()
    }

    #[must_use]
    pub fn weekday_matches(&self, now: NaiveDateTime) -> bool {
        self.repeat_days.contains(now.weekday())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parses_24h_and_12h_times() {
        assert_eq!(parse_time("07:30").unwrap(), NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(parse_time(" 23:05 ").unwrap(), NaiveTime::from_hms_opt(23, 5, 0).unwrap());
        assert_eq!(parse_time("07:30 PM").unwrap(), NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        assert_eq!(parse_time("12:15am").unwrap(), NaiveTime::from_hms_opt(0, 15, 0).unwrap());
    }

    #[test]
    fn rejects_bad_times() {
        for bad in ["", "7", "25:00", "12:60", "noon", "13:00 PM"] {
            assert_eq!(
                parse_time(bad),
                Err(AlarmError::InvalidTimeFormat(bad.to_string())),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn alarm_ids_parse_with_or_without_prefix() {
        assert_eq!("alarm_4".parse::<AlarmId>().unwrap(), AlarmId(4));
        assert_eq!("4".parse::<AlarmId>().unwrap(), AlarmId(4));
        assert!("alarm_x".parse::<AlarmId>().is_err());
        assert_eq!(AlarmId(12).to_string(), "alarm_12");
    }

    #[test]
    fn day_set_keeps_days_in_week_order() {
        let days = DaySet::from_indices(&[4, 0, 2, 0]).unwrap();
        assert_eq!(days.indices(), vec![0, 2, 4]);
        assert_eq!(days.names(), vec!["Monday", "Wednesday", "Friday"]);
        assert!(days.contains(Weekday::Wed));
        assert!(!days.contains(Weekday::Tue));
        assert_eq!(DaySet::from_indices(&[1, 7]), Err(AlarmError::InvalidWeekday(7)));
        assert_eq!(DaySet::WEEKDAYS.indices(), vec![0, 1, 2, 3, 4]);
        assert_eq!(DaySet::WEEKENDS.names(), vec!["Saturday", "Sunday"]);
    }

    #[test]
    fn next_occurrence_rolls_to_tomorrow_once_passed() {
        let time = NaiveTime::from_hms_opt(7, 30, 0).unwrap();
        let later = Alarm::new(AlarmId(0), time, String::new(), DaySet::empty(), None, at(2024, 5, 6, 6, 0));
        assert_eq!(later.date, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
        let passed = Alarm::new(AlarmId(0), time, String::new(), DaySet::empty(), None, at(2024, 5, 6, 8, 0));
        assert_eq!(passed.date, NaiveDate::from_ymd_opt(2024, 5, 7).unwrap());
    }

    #[test]
    fn missing_sound_file_means_tone() {
        let time = NaiveTime::from_hms_opt(7, 30, 0).unwrap();
        let mut alarm = Alarm::new(AlarmId(0), time, String::new(), DaySet::empty(), None, at(2024, 5, 6, 6, 0));
        assert_eq!(alarm.sound_source(), SoundSource::Tone);
        alarm.sound_file = Some("wake.mp3".into());
        assert_eq!(alarm.sound_source(), SoundSource::File("wake.mp3".into()));
    }
}
