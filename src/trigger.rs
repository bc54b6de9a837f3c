use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::alarm::Alarm;

/// how alarms without repeat days are matched
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OneShotPolicy {
    /// only rings on the date of its next occurrence
    #[default]
    Dated,
    /// rings every day at its time until removed
    Daily,
}

/// decides whether an alarm fires at a given instant
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvaluator {
    pub one_shot: OneShotPolicy,
}

impl TriggerEvaluator {
    #[must_use]
    pub const fn new(one_shot: OneShotPolicy) -> Self {
        Self { one_shot }
    }

    #[must_use]
    pub fn should_trigger(&self, alarm: &Alarm, now: NaiveDateTime) -> bool {
        if !alarm.is_active || !alarm.matches_minute(now) {
            return false;
        }
        if alarm.is_recurring() {
            return alarm.weekday_matches(now);
        }
        match self.one_shot {
            OneShotPolicy::Dated => now.date() == alarm.date,
            OneShotPolicy::Daily => true,
        }
    }
}
