use crate::notes::channel_volume;
use crossbeam_queue::SegQueue;
use crossbeam_utils::atomic::AtomicCell;
use midi_msg::MidiMsg;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Receives the generated note stream.
pub trait SynthSink: Send + Sync {
    fn send(&self, msg: MidiMsg);
}

/// Receives the output level, `0.0..=1.0`.
pub trait LevelSink: Send + Sync {
    fn set_level(&self, level: f64);
}

/// A looping audio track that is already playing.
pub trait PlayingTrack: LevelSink {
    fn release(&self);
}

/// Starts file-loop playback. Decoding and mixing are up to the implementor.
pub trait TrackPlayer: Send + Sync {
    fn play_looped(&self, path: &Path) -> anyhow::Result<Box<dyn PlayingTrack>>;
}

impl SynthSink for SegQueue<MidiMsg> {
    fn send(&self, msg: MidiMsg) {
        self.push(msg);
    }
}

impl LevelSink for AtomicCell<f64> {
    fn set_level(&self, level: f64) {
        self.store(level);
    }
}

/// Forwards the level to a synthesizer as channel volume.
pub struct SynthLevel {
    synth: Arc<dyn SynthSink>,
}

impl SynthLevel {
    pub fn new(synth: Arc<dyn SynthSink>) -> Self {
        SynthLevel { synth }
    }
}

impl LevelSink for SynthLevel {
    fn set_level(&self, level: f64) {
        self.synth.send(channel_volume(level));
    }
}

#[derive(Default)]
pub struct ConsoleSynth;

impl SynthSink for ConsoleSynth {
    fn send(&self, msg: MidiMsg) {
        info!("synth: {msg:?}");
    }
}

#[derive(Default)]
pub struct ConsoleTrackPlayer;

struct ConsoleTrack {
    name: String,
}

impl TrackPlayer for ConsoleTrackPlayer {
    fn play_looped(&self, path: &Path) -> anyhow::Result<Box<dyn PlayingTrack>> {
        let name = path.display().to_string();
        info!("Looping {name}");
        Ok(Box::new(ConsoleTrack { name }))
    }
}

impl LevelSink for ConsoleTrack {
    fn set_level(&self, level: f64) {
        debug!("{}: volume {level:.2}", self.name);
    }
}

impl PlayingTrack for ConsoleTrack {
    fn release(&self) {
        info!("Stopped looping {}", self.name);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use midi_msg::ChannelVoiceMsg;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    pub enum TrackEvent {
        Started(PathBuf),
        Level(f64),
        Released,
    }

    /// Records everything the session asks of the file-loop collaborator.
    #[derive(Default)]
    pub struct RecordingTrackPlayer {
        pub events: Arc<Mutex<Vec<TrackEvent>>>,
    }

    impl RecordingTrackPlayer {
        pub fn events(&self) -> Vec<TrackEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    struct RecordingTrack {
        events: Arc<Mutex<Vec<TrackEvent>>>,
    }

    impl TrackPlayer for RecordingTrackPlayer {
        fn play_looped(&self, path: &Path) -> anyhow::Result<Box<dyn PlayingTrack>> {
            self.events.lock().unwrap().push(TrackEvent::Started(path.to_path_buf()));
            Ok(Box::new(RecordingTrack {
                events: self.events.clone(),
            }))
        }
    }

    impl LevelSink for RecordingTrack {
        fn set_level(&self, level: f64) {
            self.events.lock().unwrap().push(TrackEvent::Level(level));
        }
    }

    impl PlayingTrack for RecordingTrack {
        fn release(&self) {
            self.events.lock().unwrap().push(TrackEvent::Released);
        }
    }

    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub enum NoteEvent {
        On(u8),
        Off(u8),
    }

    pub fn note_events(msgs: &[MidiMsg]) -> Vec<NoteEvent> {
        msgs.iter()
            .filter_map(|msg| match msg {
                MidiMsg::ChannelVoice { msg: ChannelVoiceMsg::NoteOn { note, .. }, .. } => Some(NoteEvent::On(*note)),
                MidiMsg::ChannelVoice { msg: ChannelVoiceMsg::NoteOff { note, .. }, .. } => Some(NoteEvent::Off(*note)),
                _ => None,
            })
            .collect()
    }

    pub fn assert_single_voice(events: &[NoteEvent]) {
        let mut sounding = None;
        for event in events {
            match *event {
                NoteEvent::On(note) => {
                    assert_eq!(sounding, None, "note-on over a sounding note");
                    sounding = Some(note);
                }
                NoteEvent::Off(note) => {
                    assert_eq!(sounding, Some(note));
                    sounding = None;
                }
            }
        }
        assert_eq!(sounding, None, "note left hanging");
    }

    pub fn drain(queue: &SegQueue<MidiMsg>) -> Vec<MidiMsg> {
        let mut msgs = vec![];
        while let Some(msg) = queue.pop() {
            msgs.push(msg);
        }
        msgs
    }
}

#[cfg(test)]
mod tests {
    use super::testing::drain;
    use super::*;
    use crate::notes::{note_on, C4};

    #[test]
    fn test_queue_synth_keeps_order() {
        let queue = Arc::new(SegQueue::<MidiMsg>::new());
        let synth: Arc<dyn SynthSink> = queue.clone();
        synth.send(note_on(C4, 80));
        SynthLevel::new(synth.clone()).set_level(0.5);
        assert_eq!(drain(&queue), vec![note_on(C4, 80), channel_volume(0.5)]);
    }

    #[test]
    fn test_atomic_level() {
        let level = Arc::new(AtomicCell::new(0.0_f64));
        let sink: Arc<dyn LevelSink> = level.clone();
        sink.set_level(0.25);
        assert_eq!(level.load(), 0.25);
    }
}
