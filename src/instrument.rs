use enum_iterator::{all, cardinality, Sequence};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::warn;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Sequence)]
pub enum Instrument {
    #[default]
    Piano,
    MusicBox,
    Vibraphone,
    Marimba,
    Flute,
    Strings,
}

impl Instrument {
    /// Unrecognized indices fall back to the default instrument.
    pub fn from_index(index: usize) -> Self {
        all::<Instrument>().nth(index).unwrap_or_else(|| {
            warn!(
                "Unknown instrument index {index} (expected 0..{}); using {}",
                cardinality::<Instrument>(),
                Instrument::default()
            );
            Instrument::default()
        })
    }

    pub fn profile(&self) -> InstrumentProfile {
        let (program, beat_seconds) = match self {
            Instrument::Piano => (0, 0.35),
            Instrument::MusicBox => (10, 0.3),
            Instrument::Vibraphone => (11, 0.4),
            Instrument::Marimba => (12, 0.25),
            Instrument::Flute => (73, 0.45),
            Instrument::Strings => (48, 0.6),
        };
        InstrumentProfile {
            instrument: *self,
            program,
            beat_length: Duration::from_secs_f64(beat_seconds),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Piano => "Acoustic Grand Piano",
            Instrument::MusicBox => "Music Box",
            Instrument::Vibraphone => "Vibraphone",
            Instrument::Marimba => "Marimba",
            Instrument::Flute => "Flute",
            Instrument::Strings => "String Ensemble",
        }
    }
}

impl Display for Instrument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InstrumentProfile {
    pub instrument: Instrument,
    pub program: u8,
    pub beat_length: Duration,
}

impl InstrumentProfile {
    pub fn from_index(index: usize) -> Self {
        Instrument::from_index(index).profile()
    }
}

impl Default for InstrumentProfile {
    fn default() -> Self {
        Instrument::default().profile()
    }
}
