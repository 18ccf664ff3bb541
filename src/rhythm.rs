use bare_metal_modulo::{MNum, ModNumC};
use rand::prelude::SliceRandom;
use rand::Rng;
use std::time::Duration;

pub const HALF_BEATS_PER_BAR: usize = 8;

const TWO_BEAT_COPIES: usize = 1;
const ONE_BEAT_COPIES: usize = 10;
const HALF_BEAT_COPIES: usize = 4;
const RESOLVING_HALF_BEAT_COPIES: usize = 20;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NoteLength {
    HalfBeat,
    Beat,
    TwoBeats,
}

impl NoteLength {
    pub fn half_beats(&self) -> usize {
        match self {
            NoteLength::HalfBeat => 1,
            NoteLength::Beat => 2,
            NoteLength::TwoBeats => 4,
        }
    }

    pub fn beats(&self) -> f64 {
        self.half_beats() as f64 / 2.0
    }

    pub fn duration(&self, beat_length: Duration) -> Duration {
        beat_length.mul_f64(self.beats())
    }
}

/// Half-beats consumed since the melody started. Never resets.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BeatPosition(usize);

impl BeatPosition {
    pub fn new(half_beats: usize) -> Self {
        BeatPosition(half_beats)
    }

    pub fn half_beats(&self) -> usize {
        self.0
    }

    pub fn bar_slot(&self) -> usize {
        ModNumC::<usize, HALF_BEATS_PER_BAR>::new(self.0).a()
    }

    pub fn is_off_beat(&self) -> bool {
        ModNumC::<usize, 2>::new(self.0).a() == 1
    }

    pub fn advance(&mut self, length: NoteLength) {
        self.0 += length.half_beats();
    }
}

#[derive(Clone, Debug)]
pub struct RhythmPicker {
    on_beat: Vec<NoteLength>,
    off_beat: Vec<NoteLength>,
}

impl Default for RhythmPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl RhythmPicker {
    pub fn new() -> Self {
        let mut on_beat = vec![NoteLength::TwoBeats; TWO_BEAT_COPIES];
        on_beat.extend(std::iter::repeat(NoteLength::Beat).take(ONE_BEAT_COPIES));
        on_beat.extend(std::iter::repeat(NoteLength::HalfBeat).take(HALF_BEAT_COPIES));
        let mut off_beat = on_beat.clone();
        off_beat.extend(std::iter::repeat(NoteLength::HalfBeat).take(RESOLVING_HALF_BEAT_COPIES));
        RhythmPicker { on_beat, off_beat }
    }

    /// Off-beat positions draw from a pool padded with half beats, so the
    /// melody tends to land back on the beat.
    pub fn candidates(&self, position: BeatPosition) -> &[NoteLength] {
        if position.is_off_beat() {
            &self.off_beat
        } else {
            &self.on_beat
        }
    }

    pub fn pick<R: Rng + ?Sized>(&self, position: BeatPosition, rng: &mut R) -> NoteLength {
        *self
            .candidates(position)
            .choose(rng)
            .unwrap_or(&NoteLength::Beat)
    }
}
