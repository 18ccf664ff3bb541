use crate::output::LevelSink;
use crate::signal::StopSignal;
use std::time::Duration;
use tracing::{debug, warn};

/// Ten steps of 0.1, one every `FADE_INTERVAL`, reach full level in 2.0 s.
pub const FADE_STEP: f64 = 0.1;
pub const MIN_FADE_STEP: f64 = 0.001;
pub const FADE_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FadeOutcome {
    Completed,
    Interrupted { level: f64 },
}

/// Ramps a level from silence to full, one step per interval.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FadeController {
    step: f64,
    interval: Duration,
}

impl Default for FadeController {
    fn default() -> Self {
        FadeController::new(FADE_STEP, FADE_INTERVAL)
    }
}

impl FadeController {
    /// Steps above 1.0 become a single jump to full level, steps below
    /// `MIN_FADE_STEP` become `MIN_FADE_STEP`, and a non-numeric step
    /// falls back to `FADE_STEP`.
    pub fn new(step: f64, interval: Duration) -> Self {
        let clamped = if step.is_nan() {
            FADE_STEP
        } else {
            step.clamp(MIN_FADE_STEP, 1.0)
        };
        if clamped != step {
            warn!("Fade step {step} out of range; using {clamped}");
        }
        FadeController { step: clamped, interval }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn num_steps(&self) -> usize {
        (1.0 / self.step - 1e-9).ceil() as usize
    }

    pub fn ramp_duration(&self) -> Duration {
        self.interval.saturating_mul(self.num_steps() as u32)
    }

    /// Level after `step` steps, computed from the count so rounding never
    /// pushes it past full.
    pub fn level_at(&self, step: usize) -> f64 {
        (step as f64 * self.step).min(1.0)
    }

    pub fn levels(&self) -> impl Iterator<Item = f64> + '_ {
        (1..=self.num_steps()).map(|step| self.level_at(step))
    }

    /// Checks `stop` before each step; an interruption leaves the last level in place.
    pub fn run<L: LevelSink + ?Sized>(&self, sink: &L, stop: &StopSignal) -> FadeOutcome {
        let sleeper = stop.sleeper();
        let mut level = 0.0;
        for next in self.levels() {
            if stop.is_raised() {
                debug!("Fade interrupted at {level:.2}");
                return FadeOutcome::Interrupted { level };
            }
            level = next;
            sink.set_level(level);
            sleeper.sleep(self.interval);
        }
        debug!("Fade complete");
        FadeOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_utils::atomic::AtomicCell;
    use float_cmp::{ApproxEq, F64Margin};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct LevelLog {
        levels: Mutex<Vec<f64>>,
    }

    impl LevelSink for LevelLog {
        fn set_level(&self, level: f64) {
            self.levels.lock().unwrap().push(level);
        }
    }

    #[test]
    fn test_default_ramp() {
        let fade = FadeController::default();
        assert_eq!(fade.num_steps(), 10);
        assert_eq!(fade.ramp_duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_reaches_full_in_ten_steps() {
        let fade = FadeController::new(FADE_STEP, Duration::from_millis(1));
        let log = LevelLog::default();
        assert_eq!(fade.run(&log, &StopSignal::new()), FadeOutcome::Completed);
        let levels = log.levels.lock().unwrap().clone();
        assert_eq!(levels.len(), 10);
        assert!(levels.last().unwrap().approx_eq(1.0, F64Margin::default()));
        for pair in levels.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(levels.iter().all(|level| (0.0..=1.0).contains(level)));
    }

    #[test]
    fn test_uneven_step_is_clamped() {
        let fade = FadeController::new(0.3, Duration::ZERO);
        assert_eq!(fade.num_steps(), 4);
        assert_eq!(fade.levels().last(), Some(1.0));
        assert!(fade.levels().all(|level| level <= 1.0));
        let fine = FadeController::new(0.05, Duration::ZERO);
        assert_eq!(fine.num_steps(), 20);
    }

    #[test]
    fn test_out_of_range_step_is_clamped() {
        let jump = FadeController::new(2.5, Duration::ZERO);
        assert_eq!(jump.step(), 1.0);
        assert_eq!(jump.levels().collect::<Vec<_>>(), vec![1.0]);
        assert_eq!(FadeController::new(0.0, Duration::ZERO).step(), MIN_FADE_STEP);
        assert_eq!(FadeController::new(-0.2, Duration::ZERO).num_steps(), 1000);
        assert_eq!(FadeController::new(f64::NAN, Duration::ZERO).step(), FADE_STEP);
        let slow = FadeController::new(MIN_FADE_STEP, Duration::MAX);
        assert_eq!(slow.ramp_duration(), Duration::MAX);
    }

    #[test]
    fn test_stopped_before_start() {
        let fade = FadeController::new(FADE_STEP, Duration::from_millis(1));
        let level = AtomicCell::new(0.0_f64);
        let stop = StopSignal::new();
        stop.raise();
        assert_eq!(fade.run(&level, &stop), FadeOutcome::Interrupted { level: 0.0 });
        assert_eq!(level.load(), 0.0);
    }

    #[test]
    fn test_interrupt_keeps_last_level() {
        let fade = FadeController::new(FADE_STEP, Duration::from_secs(10));
        let log = Arc::new(LevelLog::default());
        let stop = Arc::new(StopSignal::new());
        let (fade_log, fade_stop) = (log.clone(), stop.clone());
        let handle = std::thread::spawn(move || fade.run(&*fade_log, &fade_stop));
        while log.levels.lock().unwrap().is_empty() {
            std::thread::sleep(Duration::from_millis(1));
        }
        stop.raise();
        match handle.join().unwrap() {
            FadeOutcome::Interrupted { level } => {
                assert!(level.approx_eq(FADE_STEP, F64Margin::default()))
            }
            FadeOutcome::Completed => panic!("fade ignored the stop signal"),
        }
        assert_eq!(log.levels.lock().unwrap().len(), 1);
    }
}
