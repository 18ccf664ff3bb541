use crate::fade::FadeController;
use crate::melody::KEY_SHIFTS;
use crate::notes::MidiByte;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::ops::RangeInclusive;

#[derive(Clone, Debug, PartialEq)]
pub struct AlarmConfig {
    pub key_shifts: RangeInclusive<MidiByte>,
    pub fade: FadeController,
    /// Fixes every random draw of a session, for reproducible melodies.
    pub seed: Option<u64>,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        AlarmConfig {
            key_shifts: KEY_SHIFTS,
            fade: FadeController::default(),
            seed: None,
        }
    }
}

impl AlarmConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_fade(mut self, fade: FadeController) -> Self {
        self.fade = fade;
        self
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_defaults() {
        let config = AlarmConfig::default();
        assert_eq!(config.key_shifts, -10..=5);
        assert_eq!(config.fade.num_steps(), 10);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_seeded_rng_repeats() {
        let config = AlarmConfig::default().with_seed(99);
        let draw = |mut rng: StdRng| (0..8).map(|_| rng.gen::<u32>()).collect::<Vec<_>>();
        assert_eq!(draw(config.rng()), draw(config.rng()));
    }
}
