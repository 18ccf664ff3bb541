use chrono::{DateTime, Local, NaiveTime, TimeZone};
use clap::Parser;
use crossbeam_utils::atomic::AtomicCell;
use reveille::{AlarmConfig, AlarmSession, ConsoleSynth, ConsoleTrackPlayer, Outputs, PlaybackMode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// An alarm clock that loops a tune or improvises one.
#[derive(Parser, Debug)]
#[command(name = "reveille")]
struct Args {
    /// Seconds from now until the alarm sounds
    #[arg(short, long, allow_hyphen_values = true)]
    delay: Option<String>,

    /// Time of day for the alarm, HH:MM or HH:MM:SS (next occurrence)
    #[arg(short, long, conflicts_with = "delay")]
    at: Option<String>,

    /// Audio file to loop; without one a melody is generated
    #[arg(short, long)]
    tune: Option<PathBuf>,

    /// Instrument for the generated melody
    #[arg(short, long, default_value_t = 0, conflicts_with = "tune")]
    instrument: usize,

    /// Seed for a reproducible melody
    #[arg(long)]
    seed: Option<u64>,

    /// MIDI output port index
    #[arg(long, default_value_t = 0)]
    midi_port: usize,

    /// List MIDI output ports and exit
    #[arg(long)]
    list_ports: bool,
}

#[derive(Debug, Error)]
enum UsageError {
    #[error("Illegal delay value. Expecting a positive float value, got {0}")]
    BadDelay(String),
    #[error("Illegal delay value. Expecting a positive float value, got {0}")]
    NegativeDelay(String),
    #[error("Tune file {} does not exist.", .0.display())]
    MissingTune(PathBuf),
    #[error("Illegal alarm time {0}. Expecting HH:MM or HH:MM:SS")]
    BadTime(String),
    #[error("No alarm time given. Use --delay <seconds> or --at <HH:MM>")]
    NoTime,
}

impl UsageError {
    fn exit_code(&self) -> i32 {
        match self {
            UsageError::BadDelay(_) | UsageError::BadTime(_) => 3,
            UsageError::NegativeDelay(_) => 4,
            UsageError::MissingTune(_) => 5,
            UsageError::NoTime => 6,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if args.list_ports {
        return list_ports();
    }

    let (timestamp, mode) = match alarm_request(&args, Local::now()) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    };

    let config = AlarmConfig {
        seed: args.seed,
        ..AlarmConfig::default()
    };
    let session = AlarmSession::create(timestamp, mode, outputs(&args), config);

    let running = Arc::new(AtomicCell::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false))?;
    while running.load() {
        std::thread::sleep(POLL_INTERVAL);
    }

    info!("Interrupted");
    session.destroy();
    Ok(())
}

fn alarm_request(args: &Args, now: DateTime<Local>) -> Result<(DateTime<Local>, PlaybackMode), UsageError> {
    let timestamp = match (&args.delay, &args.at) {
        (Some(delay), _) => {
            let seconds = parse_delay(delay)?;
            Duration::try_from_secs_f64(seconds)
                .ok()
                .and_then(|wait| chrono::Duration::from_std(wait).ok())
                .and_then(|wait| now.checked_add_signed(wait))
                .ok_or_else(|| UsageError::BadDelay(delay.to_owned()))?
        }
        (None, Some(at)) => next_occurrence(at, now)?,
        (None, None) => return Err(UsageError::NoTime),
    };
    let mode = match &args.tune {
        Some(tune) if tune.is_file() => PlaybackMode::FileLoop(tune.clone()),
        Some(tune) => return Err(UsageError::MissingTune(tune.clone())),
        None => PlaybackMode::GeneratedMelody(args.instrument),
    };
    Ok((timestamp, mode))
}

fn parse_delay(delay: &str) -> Result<f64, UsageError> {
    let seconds: f64 = delay
        .trim()
        .parse()
        .map_err(|_| UsageError::BadDelay(delay.to_owned()))?;
    if !seconds.is_finite() {
        Err(UsageError::BadDelay(delay.to_owned()))
    } else if seconds < 0.0 {
        Err(UsageError::NegativeDelay(delay.to_owned()))
    } else {
        Ok(seconds)
    }
}

fn next_occurrence(at: &str, now: DateTime<Local>) -> Result<DateTime<Local>, UsageError> {
    let time = NaiveTime::parse_from_str(at, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(at, "%H:%M"))
        .map_err(|_| UsageError::BadTime(at.to_owned()))?;
    let today = Local
        .from_local_datetime(&now.date_naive().and_time(time))
        .earliest()
        .ok_or_else(|| UsageError::BadTime(at.to_owned()))?;
    Ok(if today > now { today } else { today + chrono::Duration::days(1) })
}

#[cfg(not(feature = "device"))]
fn outputs(_args: &Args) -> Outputs {
    warn!("Built without the `device` feature; logging playback instead of sounding it");
    Outputs {
        synth: Arc::new(ConsoleSynth),
        tracks: Arc::new(ConsoleTrackPlayer),
    }
}

#[cfg(feature = "device")]
fn outputs(args: &Args) -> Outputs {
    use reveille::device::{MidiOutSynth, RodioTrackPlayer};
    let synth: Arc<dyn reveille::SynthSink> = match MidiOutSynth::connect(args.midi_port) {
        Ok(synth) => Arc::new(synth),
        Err(e) => {
            warn!("No MIDI output ({e:#}); logging the melody instead");
            Arc::new(ConsoleSynth)
        }
    };
    Outputs {
        synth,
        tracks: Arc::new(RodioTrackPlayer),
    }
}

#[cfg(not(feature = "device"))]
fn list_ports() -> anyhow::Result<()> {
    println!("Built without the `device` feature; no MIDI ports available");
    Ok(())
}

#[cfg(feature = "device")]
fn list_ports() -> anyhow::Result<()> {
    for (i, name) in reveille::device::midi_output_names()?.iter().enumerate() {
        println!("{i}) {name}");
    }
    Ok(())
}
