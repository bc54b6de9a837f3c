use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::{
    alarm::{parse_time, Alarm, AlarmId, DaySet},
    error::AlarmError,
};

/// owns the alarms, kept in the order they were added
#[derive(Debug, Default, Clone)]
pub struct AlarmStore {
    alarms: Vec<Alarm>,
    // ids are never handed out twice, even after a removal
    next_id: u64,
}

impl AlarmStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// parses `time_str` and adds a new active alarm
    ///
    /// # Errors
    /// [`AlarmError::InvalidTimeFormat`] for an unparsable time and
    /// [`AlarmError::InvalidWeekday`] for a repeat day outside `0..=6`
    pub fn add(
        &mut self,
        time_str: &str,
        description: impl Into<String>,
        repeat_days: &[u8],
        sound_file: Option<PathBuf>,
        now: NaiveDateTime,
    ) -> Result<AlarmId, AlarmError> {
        let time = parse_time(time_str)?;
        let repeat_days = DaySet::from_indices(repeat_days)?;
        let id = AlarmId(self.next_id);
        self.next_id += 1;
        self.alarms.push(Alarm::new(
            id,
            time,
            description.into(),
            repeat_days,
            sound_file,
            now,
        ));
        Ok(id)
    }

    /// returns false if there was no such alarm
    pub fn remove(&mut self, id: AlarmId) -> bool {
        self.alarms
            .iter()
            .position(|alarm| alarm.id == id)
            .map(|index| self.alarms.remove(index))
            .is_some()
    }

    /// flips whether the alarm is active, false if there was no such alarm
    pub fn toggle(&mut self, id: AlarmId) -> bool {
        self.get_mut(id)
            .map(|alarm| alarm.is_active = !alarm.is_active)
            .is_some()
    }

    #[must_use]
    pub fn get(&self, id: AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|alarm| alarm.id == id)
    }

    pub fn get_mut(&mut self, id: AlarmId) -> Option<&mut Alarm> {
        self.alarms.iter_mut().find(|alarm| alarm.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}
