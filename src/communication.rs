use crate::{
    alarm::AlarmId,
    player::{PlaybackOutcome, SoundSource},
};

/// sent by the scheduler to anyone listening through [`crate::Scheduler::subscribe`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageType,
    pub alarm_id: AlarmId,
}

impl Message {
    #[must_use]
    pub const fn new(kind: MessageType, alarm_id: AlarmId) -> Self {
        Self { kind, alarm_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    AlarmTriggered {
        description: String,
        sound: SoundSource,
    },
    // playback returned, either on its own or because it was stopped
    AlarmStopped(PlaybackOutcome),
}
