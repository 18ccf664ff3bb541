use crate::error::AlarmError;
use crate::instrument::InstrumentProfile;
use crate::notes::{note_name, note_off, note_on, program_change, MidiByte};
use crate::output::SynthSink;
use crate::rhythm::{BeatPosition, NoteLength, RhythmPicker};
use crate::signal::StopSignal;
use crate::transition::NoteTransitionTable;
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use tracing::{debug, error};

pub const KEY_SHIFTS: RangeInclusive<MidiByte> = -10..=5;

const STRONG_ACCENT: RangeInclusive<MidiByte> = 85..=95;
const SEMI_STRONG_ACCENT: RangeInclusive<MidiByte> = 75..=85;
const OFF_BEAT_ACCENT: RangeInclusive<MidiByte> = 55..=65;
const DEFAULT_ACCENT: RangeInclusive<MidiByte> = 65..=75;

pub fn accent_velocity_range(position: BeatPosition) -> RangeInclusive<MidiByte> {
    match position.bar_slot() {
        0 => STRONG_ACCENT,
        4 => SEMI_STRONG_ACCENT,
        _ if position.is_off_beat() => OFF_BEAT_ACCENT,
        _ => DEFAULT_ACCENT,
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GeneratedNote {
    pub pitch: MidiByte,
    pub velocity: MidiByte,
    pub length: NoteLength,
}

/// Walks the transition table, one note per call. The key shift is drawn
/// once at construction and added to every pitch it returns.
pub struct MelodyGenerator<R> {
    table: NoteTransitionTable,
    rhythm: RhythmPicker,
    profile: InstrumentProfile,
    rng: R,
    previous: Option<MidiByte>,
    position: BeatPosition,
    key_shift: MidiByte,
}

impl<R: Rng> MelodyGenerator<R> {
    pub fn new(profile: InstrumentProfile, key_shifts: RangeInclusive<MidiByte>, mut rng: R) -> Self {
        let key_shift = rng.gen_range(key_shifts);
        MelodyGenerator {
            table: NoteTransitionTable::new(),
            rhythm: RhythmPicker::new(),
            profile,
            rng,
            previous: None,
            position: BeatPosition::default(),
            key_shift,
        }
    }

    pub fn with_table(mut self, table: NoteTransitionTable) -> Self {
        self.table = table;
        self
    }

    pub fn key_shift(&self) -> MidiByte {
        self.key_shift
    }

    pub fn position(&self) -> BeatPosition {
        self.position
    }

    pub fn profile(&self) -> InstrumentProfile {
        self.profile
    }

    /// Unshifted pitch of the last note, if any.
    pub fn previous_pitch(&self) -> Option<MidiByte> {
        self.previous
    }

    pub fn next_note(&mut self) -> Result<GeneratedNote, AlarmError> {
        let velocity = self.rng.gen_range(accent_velocity_range(self.position));
        let length = self.rhythm.pick(self.position, &mut self.rng);
        self.position.advance(length);
        let pitch = self.table.next(self.previous, &mut self.rng)?;
        self.previous = Some(pitch);
        Ok(GeneratedNote {
            pitch: pitch + self.key_shift,
            velocity,
            length,
        })
    }
}

/// The single synthesizer voice a melody plays on. The sounding pitch is
/// guarded by one lock, so a note-on never lands after `silence()` and every
/// note-off precedes the following note-on.
pub struct MelodyVoice {
    synth: Arc<dyn SynthSink>,
    sounding: Mutex<Option<MidiByte>>,
    stop: Arc<StopSignal>,
}

impl MelodyVoice {
    pub fn new(synth: Arc<dyn SynthSink>, stop: Arc<StopSignal>) -> Self {
        MelodyVoice {
            synth,
            sounding: Mutex::new(None),
            stop,
        }
    }

    fn sounding(&self) -> MutexGuard<'_, Option<MidiByte>> {
        self.sounding.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn sounding_pitch(&self) -> Option<MidiByte> {
        *self.sounding()
    }

    /// Returns `false`, sending nothing, once the voice has been stopped.
    pub fn play(&self, note: &GeneratedNote) -> bool {
        let mut sounding = self.sounding();
        if self.stop.is_raised() {
            return false;
        }
        if let Some(previous) = sounding.take() {
            self.synth.send(note_off(previous));
        }
        self.synth.send(note_on(note.pitch, note.velocity));
        *sounding = Some(note.pitch);
        true
    }

    pub fn silence(&self) {
        let mut sounding = self.sounding();
        self.stop.raise();
        if let Some(pitch) = sounding.take() {
            self.synth.send(note_off(pitch));
        }
    }

    fn perform<R: Rng>(&self, generator: &mut MelodyGenerator<R>) {
        let sleeper = self.stop.sleeper();
        let beat_length = generator.profile().beat_length;
        while !self.stop.is_raised() {
            let note = match generator.next_note() {
                Ok(note) => note,
                Err(e) => {
                    error!("Melody stopped: {e}");
                    self.silence();
                    break;
                }
            };
            debug!("{} v{} x{}", note_name(note.pitch), note.velocity, note.length.beats());
            if !self.play(&note) || !sleeper.sleep(note.length.duration(beat_length)) {
                break;
            }
        }
    }
}

/// Plays a generator on its own thread until stopped. Not restartable.
pub struct MelodyPlayer {
    voice: Arc<MelodyVoice>,
    thread: Option<JoinHandle<()>>,
}

impl MelodyPlayer {
    pub fn start<R: Rng + Send + 'static>(
        mut generator: MelodyGenerator<R>,
        synth: Arc<dyn SynthSink>,
        stop: Arc<StopSignal>,
    ) -> Self {
        let profile = generator.profile();
        debug!(
            "Melody on {} (program {}), key shift {:+}",
            profile.instrument,
            profile.program,
            generator.key_shift()
        );
        synth.send(program_change(profile.program));
        let voice = Arc::new(MelodyVoice::new(synth, stop));
        let performer = voice.clone();
        let thread = std::thread::spawn(move || performer.perform(&mut generator));
        MelodyPlayer {
            voice,
            thread: Some(thread),
        }
    }

    /// Mutes the sounding note right away; the loop exits at its next checkpoint.
    pub fn stop(&self) {
        self.voice.silence();
    }

    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Melody thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().map_or(false, |thread| !thread.is_finished())
    }
}

impl Drop for MelodyPlayer {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}
