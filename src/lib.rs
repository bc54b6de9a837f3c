#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms, missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

pub mod alarm;
pub mod clock;
pub mod communication;
pub mod config;
pub mod error;
pub mod player;
pub mod scheduler;
pub mod shell;
pub mod status;
pub mod store;
pub mod trigger;

pub use alarm::{Alarm, AlarmId, DaySet};
pub use error::{AlarmError, ConfigError};
pub use player::{PlaybackOutcome, SoundPlayer, SoundSource};
pub use scheduler::Scheduler;
pub use status::{AlarmStatus, AlarmView};
