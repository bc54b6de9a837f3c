//! the background loop that rings alarms
//!
//! # Concurrency
//! - one thread runs the tick loop, everything else comes in through
//!   [`Scheduler`]'s methods on whatever thread the caller is on
//! - the alarms and [`StatusTracker`] live behind one mutex which is taken for
//!   each read or update and never held while a sound plays
//! - alarms due in the same tick ring one after another in the order they were
//!   added, the next one only starts once the previous playback returned.
//!   every alarm of a tick is checked against the time taken at the start of
//!   that tick, so an alarm waiting behind a long sound still rings
//! - an alarm that finishes playing while its minute is still going rings again
//!   on the next tick until it is stopped

use std::{
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, error, info, warn};

use crate::{
    alarm::AlarmId,
    clock::{Clock, SystemClock},
    communication::{Message, MessageType},
    config::Config,
    error::AlarmError,
    player::{InterruptSignal, PlaybackOutcome, SoundPlayer},
    status::{AlarmStatus, AlarmView, StatusTracker},
    store::AlarmStore,
    trigger::TriggerEvaluator,
};

enum Control {
    Shutdown,
}

#[derive(Debug, Default)]
struct State {
    store: AlarmStore,
    tracker: StatusTracker,
}

/// everything the loop thread shares with the caller's side
struct Engine {
    state: Mutex<State>,
    player: Mutex<Box<dyn SoundPlayer>>,
    interrupt: InterruptSignal,
    clock: Arc<dyn Clock>,
    evaluator: TriggerEvaluator,
    suppression: TimeDelta,
    running: AtomicBool,
    subscribers: Mutex<Vec<Sender<Message>>>,
}

struct Worker {
    control: Sender<Control>,
    handle: JoinHandle<()>,
}

/// owns the alarms and the thread that rings them
pub struct Scheduler {
    engine: Arc<Engine>,
    tick_interval: Duration,
    worker: Mutex<Option<Worker>>,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // a panic on another thread must not take the alarms down with it
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Engine {
    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    fn notify(&self, message: &Message) {
        lock(&self.subscribers).retain(|subscriber| subscriber.send(message.clone()).is_ok());
    }

    /// checks every alarm once, `halt` is asked before each alarm rings
    fn tick(&self, halt: &dyn Fn() -> bool) {
        let now = self.clock.now();
        let due: Vec<AlarmId> = {
            let mut state = self.state();
            let State { store, tracker } = &mut *state;
            for id in tracker.prune(now, self.suppression) {
                debug!("suppression of {id} ran out");
            }
            store
                .iter()
                .filter(|alarm| !tracker.is_suppressed(alarm.id))
                .filter(|alarm| self.evaluator.should_trigger(alarm, now))
                .map(|alarm| alarm.id)
                .collect()
        };
        for id in due {
            self.fire(id, halt);
        }
    }

    fn fire(&self, id: AlarmId, halt: &dyn Fn() -> bool) {
        // an earlier alarm in this tick may have played long enough for this one
        // to be removed, disabled or stopped in the meantime
        let (description, source) = {
            let mut state = self.state();
            if halt() {
                return;
            }
            let State { store, tracker } = &mut *state;
            match store.get(id) {
                Some(alarm) if alarm.is_active && !tracker.is_suppressed(id) => {
                    self.interrupt.reset();
                    tracker.set_current(id);
                    (alarm.description.clone(), alarm.sound_source())
                }
                _ => return,
            }
        };

        info!("ALARM {id}: {description}");
        self.notify(&Message::new(
            MessageType::AlarmTriggered {
                description,
                sound: source.clone(),
            },
            id,
        ));
        let outcome = {
            let mut player = lock(&self.player);
            panic::catch_unwind(AssertUnwindSafe(|| player.play(&source, &self.interrupt)))
                .unwrap_or_else(|_| {
                    PlaybackOutcome::Failed("sound player panicked".to_string())
                })
        };
        match &outcome {
            PlaybackOutcome::Completed => debug!("{id} finished playing"),
            PlaybackOutcome::Interrupted => info!("{id} was stopped"),
            PlaybackOutcome::Failed(reason) => warn!("{id} couldn't play: {reason}"),
        }

        self.state().tracker.finish(id);
        self.notify(&Message::new(MessageType::AlarmStopped(outcome), id));
    }

    /// interrupts whatever is playing, remembering when it was stopped
    fn silence_current(&self, state: &mut State) -> Option<AlarmId> {
        let id = state.tracker.take_current()?;
        self.interrupt.trigger();
        let now = self.clock.now();
        state.tracker.suppress(id, now);
        info!("{id} stopped manually at {now}");
        Some(id)
    }

    fn run(&self, control: &Receiver<Control>, tick_interval: Duration) {
        let halt = || !self.running.load(Ordering::SeqCst);
        while !halt() {
            self.tick(&halt);
            match control.recv_timeout(tick_interval) {
                Ok(Control::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }
}

impl Scheduler {
    #[must_use]
    pub fn new(config: &Config, player: Box<dyn SoundPlayer>) -> Self {
        Self::with_clock(config, player, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(config: &Config, player: Box<dyn SoundPlayer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine: Arc::new(Engine {
                state: Mutex::default(),
                player: Mutex::new(player),
                interrupt: InterruptSignal::new(),
                clock,
                evaluator: TriggerEvaluator::new(config.one_shot),
                suppression: config.suppression_window(),
                running: AtomicBool::new(false),
                subscribers: Mutex::default(),
            }),
            tick_interval: config.tick_interval(),
            worker: Mutex::new(None),
        }
    }

    /// # Errors
    /// if the time can't be parsed or a repeat day is outside `0..=6`
    pub fn add(
        &self,
        time_str: &str,
        description: impl Into<String>,
        repeat_days: &[u8],
        sound_file: Option<PathBuf>,
    ) -> Result<AlarmId, AlarmError> {
        let now = self.engine.clock.now();
        let id = self
            .engine
            .state()
            .store
            .add(time_str, description, repeat_days, sound_file, now)?;
        info!("added {id} at {time_str}");
        Ok(id)
    }

    /// removes the alarm and anything the scheduler remembers about it,
    /// cutting off its sound if it is playing
    pub fn remove(&self, id: AlarmId) -> bool {
        let mut state = self.engine.state();
        if !state.store.remove(id) {
            return false;
        }
        if state.tracker.forget(id) {
            self.engine.interrupt.trigger();
        }
        info!("removed {id}");
        true
    }

    /// turns the alarm on or off, turning it off while it rings stops the sound
    pub fn toggle(&self, id: AlarmId) -> bool {
        let mut state = self.engine.state();
        if !state.store.toggle(id) {
            return false;
        }
        let active = state.store.get(id).is_some_and(|alarm| alarm.is_active);
        if !active && state.tracker.current() == Some(id) {
            state.tracker.take_current();
            self.engine.interrupt.trigger();
        }
        info!("{id} is now {}", if active { "active" } else { "inactive" });
        true
    }

    #[must_use]
    pub fn list(&self) -> Vec<AlarmView> {
        let state = self.engine.state();
        state
            .store
            .iter()
            .map(|alarm| AlarmView::new(alarm, state.tracker.status(alarm)))
            .collect()
    }

    #[must_use]
    pub fn status(&self, id: AlarmId) -> Option<AlarmStatus> {
        let state = self.engine.state();
        state.store.get(id).map(|alarm| state.tracker.status(alarm))
    }

    #[must_use]
    pub fn current_alarm(&self) -> Option<AlarmId> {
        self.engine.state().tracker.current()
    }

    #[must_use]
    pub fn suppressed_at(&self, id: AlarmId) -> Option<NaiveDateTime> {
        self.engine.state().tracker.suppressed_at(id)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.worker).is_some()
    }

    /// gets a message every time an alarm starts or stops ringing
    pub fn subscribe(&self) -> Receiver<Message> {
        let (sender, receiver) = mpsc::channel();
        lock(&self.engine.subscribers).push(sender);
        receiver
    }

    /// runs a single check of every alarm on the calling thread.
    /// returns false without checking anything while the loop thread is running
    pub fn tick(&self) -> bool {
        // held for the whole check so `start` can't spawn the loop underneath it
        let worker = lock(&self.worker);
        if worker.is_some() {
            debug!("manual tick skipped, the loop is running");
            return false;
        }
        self.engine.tick(&|| false);
        true
    }

    /// starts the loop thread, does nothing if it is already running
    pub fn start(&self) {
        let mut worker = lock(&self.worker);
        if worker.is_some() {
            return;
        }
        self.engine.running.store(true, Ordering::SeqCst);
        let (control, receiver) = mpsc::channel();
        let engine = Arc::clone(&self.engine);
        let tick_interval = self.tick_interval;
        let handle = thread::spawn(move || engine.run(&receiver, tick_interval));
        *worker = Some(Worker { control, handle });
        info!("alarm clock started");
    }

    /// stops the loop and any sound it is playing, waits for the thread to exit
    pub fn stop(&self) {
        let Some(worker) = lock(&self.worker).take() else {
            return;
        };
        {
            let mut state = self.engine.state();
            self.engine.running.store(false, Ordering::SeqCst);
            self.engine.silence_current(&mut state);
        }
        // the loop may have already quit and dropped its end
        let _ = worker.control.send(Control::Shutdown);
        if worker.handle.join().is_err() {
            error!("alarm loop panicked");
        }
        info!("alarm clock stopped");
    }

    /// stops the sound that is playing without stopping the loop,
    /// false if nothing was playing
    pub fn stop_sound(&self) -> bool {
        let mut state = self.engine.state();
        self.engine.silence_current(&mut state).is_some()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tick_interval", &self.tick_interval)
            .field("running", &self.is_running())
            .field("alarms", &self.engine.state().store.len())
            .finish_non_exhaustive()
    }
}
