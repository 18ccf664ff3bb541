use clap::Parser;
use reveille::{note_name, AlarmConfig, InstrumentProfile, MelodyGenerator};

/// Prints the opening notes of a generated alarm melody without playing it.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(short, long, default_value_t = 0)]
    instrument: usize,

    #[arg(short = 'n', long, default_value_t = 16)]
    count: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AlarmConfig::default().with_seed(args.seed);
    let profile = InstrumentProfile::from_index(args.instrument);
    let mut generator = MelodyGenerator::new(profile, config.key_shifts.clone(), config.rng());
    println!(
        "{} (program {}), key shift {}",
        profile.instrument,
        profile.program,
        generator.key_shift()
    );
    for _ in 0..args.count {
        let position = generator.position().half_beats();
        let note = generator.next_note()?;
        println!(
            "{:>4} {:<4} vel {:>3} {} beats",
            position,
            note_name(note.pitch),
            note.velocity,
            note.length.beats()
        );
    }
    Ok(())
}
