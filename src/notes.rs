use midi_msg::{Channel, ChannelVoiceMsg, ControlChange, MidiMsg};
use std::cmp::{max, min};

pub type MidiByte = i16;

pub const MAX_MIDI_VALUE: MidiByte = i8::MAX as MidiByte;
pub const MAX_CONTROL_VALUE: u16 = 16383;
pub const ALARM_CHANNEL: Channel = Channel::Ch1;

pub const B3: MidiByte = 59;
pub const C4: MidiByte = 60;
pub const D4: MidiByte = 62;
pub const EB4: MidiByte = 63;
pub const E4: MidiByte = 64;
pub const F4: MidiByte = 65;
pub const FS4: MidiByte = 66;
pub const G4: MidiByte = 67;
pub const GS4: MidiByte = 68;
pub const A4: MidiByte = 69;
pub const BB4: MidiByte = 70;
pub const B4: MidiByte = 71;
pub const C5: MidiByte = 72;
pub const CS5: MidiByte = 73;
pub const D5: MidiByte = 74;
pub const DS5: MidiByte = 75;
pub const E5: MidiByte = 76;

pub const ALARM_PITCHES: [MidiByte; 17] = [
    B3, C4, D4, EB4, E4, F4, FS4, G4, GS4, A4, BB4, B4, C5, CS5, D5, DS5, E5,
];

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "G#", "A", "Bb", "B",
];

pub fn note_name(pitch: MidiByte) -> String {
    format!("{}{}", NOTE_NAMES[pitch.rem_euclid(12) as usize], pitch.div_euclid(12) - 1)
}

fn midi_byte(value: MidiByte) -> u8 {
    max(0, min(MAX_MIDI_VALUE, value)) as u8
}

pub fn note_on(pitch: MidiByte, velocity: MidiByte) -> MidiMsg {
    MidiMsg::ChannelVoice {
        channel: ALARM_CHANNEL,
        msg: ChannelVoiceMsg::NoteOn {
            note: midi_byte(pitch),
            velocity: midi_byte(velocity),
        },
    }
}

pub fn note_off(pitch: MidiByte) -> MidiMsg {
    MidiMsg::ChannelVoice {
        channel: ALARM_CHANNEL,
        msg: ChannelVoiceMsg::NoteOff {
            note: midi_byte(pitch),
            velocity: 0,
        },
    }
}

pub fn program_change(program: u8) -> MidiMsg {
    MidiMsg::ChannelVoice {
        channel: ALARM_CHANNEL,
        msg: ChannelVoiceMsg::ProgramChange { program },
    }
}

/// Channel volume for a level in `0.0..=1.0`; out-of-range levels are clamped.
pub fn channel_volume(level: f64) -> MidiMsg {
    let level = level.clamp(0.0, 1.0);
    MidiMsg::ChannelVoice {
        channel: ALARM_CHANNEL,
        msg: ChannelVoiceMsg::ControlChange {
            control: ControlChange::Volume((level * MAX_CONTROL_VALUE as f64).round() as u16),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(C4), "C4");
        assert_eq!(note_name(B3), "B3");
        assert_eq!(note_name(FS4), "F#4");
        assert_eq!(note_name(E5), "E5");
    }

    #[test]
    fn test_pitches_sorted_and_in_range() {
        for pair in ALARM_PITCHES.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(ALARM_PITCHES[0], 59);
        assert_eq!(*ALARM_PITCHES.last().unwrap(), 76);
    }

    #[test]
    fn test_note_messages() {
        match note_on(C4 - 10, 90) {
            MidiMsg::ChannelVoice { channel, msg: ChannelVoiceMsg::NoteOn { note, velocity } } => {
                assert_eq!(channel, ALARM_CHANNEL);
                assert_eq!(note, 50);
                assert_eq!(velocity, 90);
            }
            other => panic!("unexpected {other:?}"),
        }
        match note_off(E5 + 5) {
            MidiMsg::ChannelVoice { msg: ChannelVoiceMsg::NoteOff { note, velocity }, .. } => {
                assert_eq!(note, 81);
                assert_eq!(velocity, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_channel_volume_clamps() {
        let full = channel_volume(1.5);
        let silent = channel_volume(-0.5);
        assert_eq!(full, channel_volume(1.0));
        assert_eq!(silent, channel_volume(0.0));
        match full {
            MidiMsg::ChannelVoice { msg: ChannelVoiceMsg::ControlChange { control: ControlChange::Volume(v) }, .. } => {
                assert_eq!(v, MAX_CONTROL_VALUE)
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
