use crate::config::AlarmConfig;
use crate::fade::FadeOutcome;
use crate::instrument::InstrumentProfile;
use crate::melody::{MelodyGenerator, MelodyPlayer};
use crate::output::{LevelSink, PlayingTrack, SynthLevel, SynthSink, TrackPlayer};
use crate::signal::StopSignal;
use crate::trigger::{Trigger, TriggerOutcome};
use chrono::{DateTime, Local};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlaybackMode {
    FileLoop(PathBuf),
    GeneratedMelody(usize),
}

impl Display for PlaybackMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackMode::FileLoop(path) => write!(f, "looping {}", path.display()),
            PlaybackMode::GeneratedMelody(index) => {
                write!(f, "melody on {}", InstrumentProfile::from_index(*index).instrument)
            }
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SessionState {
    Scheduled,
    Firing,
    Stopped,
}

/// Where a firing session sends its sound.
#[derive(Clone)]
pub struct Outputs {
    pub synth: Arc<dyn SynthSink>,
    pub tracks: Arc<dyn TrackPlayer>,
}

enum Engine {
    Track(Arc<dyn PlayingTrack>),
    Melody(MelodyPlayer),
}

struct Playback {
    engine: Engine,
    fade: JoinHandle<FadeOutcome>,
}

impl Playback {
    fn tear_down(self) {
        match self.engine {
            Engine::Track(track) => track.release(),
            Engine::Melody(mut player) => {
                player.stop();
                player.join();
            }
        }
        match self.fade.join() {
            Ok(outcome) => info!("Fade ended: {outcome:?}"),
            Err(_) => error!("Fade thread panicked"),
        }
    }
}

struct Inner {
    state: SessionState,
    playback: Option<Playback>,
}

struct SessionCore {
    inner: Mutex<Inner>,
    stop: Arc<StopSignal>,
    mode: PlaybackMode,
    outputs: Outputs,
    config: AlarmConfig,
}

impl SessionCore {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn fire(&self) {
        let mut inner = self.lock();
        if inner.state != SessionState::Scheduled || self.stop.is_raised() {
            return;
        }
        inner.state = SessionState::Firing;
        info!("Alarm firing: {}", self.mode);
        inner.playback = self.start_playback();
    }

    fn start_playback(&self) -> Option<Playback> {
        let fade = self.config.fade;
        let stop = self.stop.clone();
        match &self.mode {
            PlaybackMode::FileLoop(path) => match self.outputs.tracks.play_looped(path) {
                Ok(track) => {
                    let track: Arc<dyn PlayingTrack> = Arc::from(track);
                    track.set_level(0.0);
                    let fading = track.clone();
                    let fade = std::thread::spawn(move || fade.run(&*fading, &stop));
                    Some(Playback {
                        engine: Engine::Track(track),
                        fade,
                    })
                }
                Err(e) => {
                    error!("Could not play {}: {e:#}", path.display());
                    None
                }
            },
            PlaybackMode::GeneratedMelody(index) => {
                let level = SynthLevel::new(self.outputs.synth.clone());
                level.set_level(0.0);
                let generator = MelodyGenerator::new(
                    InstrumentProfile::from_index(*index),
                    self.config.key_shifts.clone(),
                    self.config.rng(),
                );
                let player = MelodyPlayer::start(generator, self.outputs.synth.clone(), self.stop.clone());
                let fade = std::thread::spawn(move || fade.run(&level, &stop));
                Some(Playback {
                    engine: Engine::Melody(player),
                    fade,
                })
            }
        }
    }
}

/// An alarm bound to one point in time. Dropping the session destroys it.
pub struct AlarmSession {
    core: Arc<SessionCore>,
    trigger: Mutex<Option<Trigger>>,
    scheduled_for: DateTime<Local>,
}

impl AlarmSession {
    pub fn create(timestamp: DateTime<Local>, mode: PlaybackMode, outputs: Outputs, config: AlarmConfig) -> Self {
        Self::create_at(timestamp, Local::now(), mode, outputs, config)
    }

    pub fn after(delay: Duration, mode: PlaybackMode, outputs: Outputs, config: AlarmConfig) -> Self {
        let now = Local::now();
        let delay = chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::weeks(5200));
        let timestamp = now.checked_add_signed(delay).unwrap_or(now);
        Self::create_at(timestamp, now, mode, outputs, config)
    }

    fn create_at(
        timestamp: DateTime<Local>,
        now: DateTime<Local>,
        mode: PlaybackMode,
        outputs: Outputs,
        config: AlarmConfig,
    ) -> Self {
        let delay = timestamp - now;
        let seconds = delay.num_milliseconds() as f64 / 1000.0;
        let armed = delay > chrono::Duration::zero();
        let core = Arc::new(SessionCore {
            inner: Mutex::new(Inner {
                state: if armed { SessionState::Scheduled } else { SessionState::Stopped },
                playback: None,
            }),
            stop: Arc::new(StopSignal::new()),
            mode,
            outputs,
            config,
        });

        let trigger = match delay.to_std() {
            Ok(delay) if armed => {
                info!("Scheduling an alarm at {timestamp}, which is in {seconds:.1} seconds.");
                let firing = core.clone();
                Some(Trigger::arm(delay, move || firing.fire()))
            }
            _ => {
                warn!(
                    "Scheduling an alarm at {timestamp}, which is {:.1} seconds earlier than current time {now}. This alarm is not set.",
                    -seconds
                );
                None
            }
        };

        AlarmSession {
            core,
            trigger: Mutex::new(trigger),
            scheduled_for: timestamp,
        }
    }

    pub fn scheduled_for(&self) -> DateTime<Local> {
        self.scheduled_for
    }

    pub fn mode(&self) -> &PlaybackMode {
        &self.core.mode
    }

    pub fn state(&self) -> SessionState {
        self.core.lock().state
    }

    pub fn is_armed(&self) -> bool {
        self.state() == SessionState::Scheduled
    }

    /// Stops playback, cancels the trigger if it has not fired and waits for
    /// it. Safe to call any number of times; returns how the trigger ended,
    /// or `None` for a session that was never armed.
    pub fn destroy(&self) -> Option<TriggerOutcome> {
        let first = self.core.stop.raise();
        let playback = {
            let mut inner = self.core.lock();
            inner.state = SessionState::Stopped;
            inner.playback.take()
        };
        if let Some(playback) = playback {
            playback.tear_down();
        }
        let outcome = self
            .trigger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_mut()
            .map(|trigger| trigger.cancel());
        if let Some(notice) = self.destroyed_notice(first, outcome) {
            info!("{notice}");
        }
        outcome
    }

    /// Only the first destroy of an armed session is worth reporting.
    fn destroyed_notice(&self, first: bool, outcome: Option<TriggerOutcome>) -> Option<String> {
        match (first, outcome) {
            (true, Some(outcome)) => Some(format!("Alarm at {} destroyed ({outcome:?})", self.scheduled_for)),
            _ => None,
        }
    }
}

impl Drop for AlarmSession {
    fn drop(&mut self) {
        self.destroy();
    }
}
