use crate::error::AlarmError;
use crate::output::{LevelSink, PlayingTrack, SynthSink, TrackPlayer};
use crate::signal::StopSignal;
use midi_msg::MidiMsg;
use midir::{MidiOutput, MidiOutputConnection};
use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info};

pub const CLIENT_NAME: &str = "reveille";

pub fn midi_output_names() -> anyhow::Result<Vec<String>> {
    let midi_out = MidiOutput::new(CLIENT_NAME)?;
    Ok(midi_out
        .ports()
        .iter()
        .map(|port| midi_out.port_name(port).unwrap_or_else(|e| e.to_string()))
        .collect())
}

/// Sends the note stream to a MIDI output port, e.g. a software synthesizer.
pub struct MidiOutSynth {
    conn: Mutex<MidiOutputConnection>,
}

impl MidiOutSynth {
    pub fn connect(port_index: usize) -> anyhow::Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        let ports = midi_out.ports();
        let port = ports.get(port_index).ok_or(AlarmError::NoMidiOutput)?;
        let name = midi_out.port_name(port)?;
        let conn = midi_out
            .connect(port, "reveille-out")
            .map_err(|e| AlarmError::Device(e.to_string()))?;
        info!("Connected to MIDI output {name}");
        Ok(MidiOutSynth {
            conn: Mutex::new(conn),
        })
    }
}

impl SynthSink for MidiOutSynth {
    fn send(&self, msg: MidiMsg) {
        debug!("midi out: {msg:?}");
        let mut conn = self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = conn.send(&msg.to_midi()) {
            error!("MIDI send failed: {e}");
        }
    }
}

/// Loops audio files on the default output device.
#[derive(Default)]
pub struct RodioTrackPlayer;

struct RodioTrack {
    sink: Arc<Sink>,
    released: Arc<StopSignal>,
}

impl TrackPlayer for RodioTrackPlayer {
    fn play_looped(&self, path: &Path) -> anyhow::Result<Box<dyn PlayingTrack>> {
        let source = Decoder::new(BufReader::new(File::open(path)?))?;
        let (sink, queue) = Sink::new_idle();
        sink.append(source.repeat_infinite());
        let sink = Arc::new(sink);
        let released = Arc::new(StopSignal::new());

        // The output stream must stay on the thread that opened it.
        let holding = released.clone();
        std::thread::spawn(move || match OutputStream::try_default() {
            Ok((_stream, handle)) => {
                if let Err(e) = handle.play_raw(queue) {
                    error!("Could not start audio output: {e}");
                    return;
                }
                let sleeper = holding.sleeper();
                while sleeper.sleep(Duration::from_secs(3600)) {}
            }
            Err(e) => error!("No audio output device: {e}"),
        });

        info!("Looping {}", path.display());
        Ok(Box::new(RodioTrack { sink, released }))
    }
}

impl LevelSink for RodioTrack {
    fn set_level(&self, level: f64) {
        self.sink.set_volume(level.clamp(0.0, 1.0) as f32);
    }
}

impl PlayingTrack for RodioTrack {
    fn release(&self) {
        self.sink.stop();
        self.released.raise();
    }
}
