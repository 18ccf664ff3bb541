use crossbeam_utils::atomic::AtomicCell;
use crossbeam_utils::sync::{Parker, Unparker};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A cooperative stop flag. Loops check `is_raised()` at the top of each
/// iteration and sleep through a `Sleeper`, which wakes as soon as the
/// signal is raised.
#[derive(Default)]
pub struct StopSignal {
    raised: AtomicCell<bool>,
    sleepers: Mutex<Vec<Unparker>>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load()
    }

    /// Returns `true` only for the call that actually raised the signal.
    pub fn raise(&self) -> bool {
        let first = !self.raised.swap(true);
        if let Ok(sleepers) = self.sleepers.lock() {
            for sleeper in sleepers.iter() {
                sleeper.unpark();
            }
        }
        first
    }

    pub fn sleeper(&self) -> Sleeper<'_> {
        let parker = Parker::new();
        if let Ok(mut sleepers) = self.sleepers.lock() {
            sleepers.push(parker.unparker().clone());
        }
        Sleeper { signal: self, parker }
    }
}

pub struct Sleeper<'a> {
    signal: &'a StopSignal,
    parker: Parker,
}

impl Sleeper<'_> {
    /// Sleeps for `duration` unless the signal is raised first. Returns
    /// `true` if the full duration elapsed with the signal still lowered.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.signal.is_raised() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            self.parker.park_timeout(deadline - now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_sleep_runs_to_completion() {
        let signal = StopSignal::new();
        let start = Instant::now();
        assert!(signal.sleeper().sleep(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_raise_is_idempotent() {
        let signal = StopSignal::new();
        assert!(!signal.is_raised());
        assert!(signal.raise());
        assert!(!signal.raise());
        assert!(signal.is_raised());
        assert!(!signal.sleeper().sleep(Duration::from_secs(5)));
    }

    #[test]
    fn test_raise_wakes_sleeper() {
        let signal = Arc::new(StopSignal::new());
        let sleeping = signal.clone();
        let start = Instant::now();
        let handle = std::thread::spawn(move || sleeping.sleeper().sleep(Duration::from_secs(30)));
        std::thread::sleep(Duration::from_millis(20));
        signal.raise();
        assert!(!handle.join().unwrap());
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
