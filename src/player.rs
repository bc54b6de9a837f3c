//! playback of alarm sounds
//!
//! the scheduler calls [`SoundPlayer::play`] synchronously, so every player has
//! to keep an eye on the [`InterruptSignal`] while audio is going and give up
//! quickly once it is raised. playback problems are never returned as errors,
//! they ring the terminal bell and come back as [`PlaybackOutcome::Failed`].

use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use log::{debug, warn};
use rodio::{buffer::SamplesBuffer, Decoder, OutputStreamBuilder, Sink};

pub const TONE_SAMPLE_RATE: u32 = 44_100;
pub const TONE_DURATION: Duration = Duration::from_millis(100);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    File(PathBuf),
    /// short synthesized beep used when an alarm has no sound file
    Tone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Interrupted,
    Failed(String),
}

/// shared flag used to cut playback short
#[derive(Debug, Clone, Default)]
pub struct InterruptSignal(Arc<AtomicBool>);

impl InterruptSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub trait SoundPlayer: Send {
    /// plays `source` until it ends or `interrupt` is raised
    fn play(&mut self, source: &SoundSource, interrupt: &InterruptSignal) -> PlaybackOutcome;
}

impl<P: SoundPlayer + ?Sized> SoundPlayer for Box<P> {
    fn play(&mut self, source: &SoundSource, interrupt: &InterruptSignal) -> PlaybackOutcome {
        (**self).play(source, interrupt)
    }
}

/// blocks until `finished` reports true or the interrupt is raised,
/// checking both every `poll_interval`
pub fn wait_for_playback(
    interrupt: &InterruptSignal,
    poll_interval: Duration,
    mut finished: impl FnMut() -> bool,
) -> PlaybackOutcome {
    loop {
        if interrupt.is_triggered() {
            return PlaybackOutcome::Interrupted;
        }
        if finished() {
            return PlaybackOutcome::Completed;
        }
        thread::sleep(poll_interval);
    }
}

/// mono samples of the fallback tone, a single ramp from silence to full scale
#[must_use]
pub fn tone_samples() -> Vec<f32> {
    let count = (f64::from(TONE_SAMPLE_RATE) * TONE_DURATION.as_secs_f64()) as usize;
    (0..count).map(|i| i as f32 / count as f32).collect()
}

/// last resort notification when no audio can be played
pub fn ring_bell() {
    let mut stdout = io::stdout();
    // nothing left to fall back to if the terminal is gone too
    let _ = stdout.write_all(b"\x07").and_then(|()| stdout.flush());
}

fn fail(reason: String) -> PlaybackOutcome {
    warn!("couldn't play alarm sound: {reason}");
    ring_bell();
    PlaybackOutcome::Failed(reason)
}

/// plays sounds on the default audio output through rodio
#[derive(Debug, Clone)]
pub struct RodioPlayer {
    poll_interval: Duration,
    /// 0 to 100
    volume: f32,
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, 100.0)
    }
}

impl RodioPlayer {
    #[must_use]
    pub fn new(poll_interval: Duration, volume: f32) -> Self {
        Self {
            poll_interval,
            volume: volume.clamp(0.0, 100.0),
        }
    }

    fn try_play(
        &self,
        source: &SoundSource,
        interrupt: &InterruptSignal,
    ) -> Result<PlaybackOutcome, String> {
        // open the file first so a bad path doesn't need a working audio device to be reported
        let decoder = match source {
            SoundSource::File(path) => {
                let file = File::open(path)
                    .map_err(|e| format!("couldn't open sound file {}: {e}", path.display()))?;
                Some(
                    Decoder::new(BufReader::new(file))
                        .map_err(|e| format!("couldn't decode {}: {e}", path.display()))?,
                )
            }
            SoundSource::Tone => None,
        };

        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| format!("couldn't open audio output: {e}"))?;
        // a stream is opened per alarm, rodio would print to stderr on every drop
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        sink.set_volume(self.volume / 100.0);
        match decoder {
            Some(decoder) => sink.append(decoder),
            None => sink.append(SamplesBuffer::new(1, TONE_SAMPLE_RATE, tone_samples())),
        }
        sink.play();

        let outcome = wait_for_playback(interrupt, self.poll_interval, || sink.empty());
        if outcome == PlaybackOutcome::Interrupted {
            sink.stop();
        }
        Ok(outcome)
    }
}

impl SoundPlayer for RodioPlayer {
    fn play(&mut self, source: &SoundSource, interrupt: &InterruptSignal) -> PlaybackOutcome {
        debug!("playing {source:?}");
        self.try_play(source, interrupt).unwrap_or_else(fail)
    }
}

/// rings the terminal bell instead of playing audio, for machines without a sound device
#[derive(Debug, Default, Clone, Copy)]
pub struct BellPlayer;

impl SoundPlayer for BellPlayer {
    fn play(&mut self, source: &SoundSource, interrupt: &InterruptSignal) -> PlaybackOutcome {
        if interrupt.is_triggered() {
            return PlaybackOutcome::Interrupted;
        }
        debug!("ringing bell for {source:?}");
        ring_bell();
        PlaybackOutcome::Completed
    }
}
