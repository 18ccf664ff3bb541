use crate::signal::StopSignal;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TriggerOutcome {
    Fired,
    Cancelled,
}

/// Runs an action once on its own thread after a delay, unless cancelled first.
pub struct Trigger {
    cancel: Arc<StopSignal>,
    thread: Option<JoinHandle<TriggerOutcome>>,
    outcome: Option<TriggerOutcome>,
}

impl Trigger {
    pub fn arm<F: FnOnce() + Send + 'static>(delay: Duration, action: F) -> Self {
        let cancel = Arc::new(StopSignal::new());
        let waiting = cancel.clone();
        let thread = std::thread::spawn(move || {
            if waiting.sleeper().sleep(delay) {
                debug!("Trigger fired after {:.1}s", delay.as_secs_f64());
                action();
                TriggerOutcome::Fired
            } else {
                TriggerOutcome::Cancelled
            }
        });
        Trigger {
            cancel,
            thread: Some(thread),
            outcome: None,
        }
    }

    /// Cancels the trigger if it has not fired yet and waits for its thread.
    /// Repeated calls return the first outcome.
    pub fn cancel(&mut self) -> TriggerOutcome {
        self.cancel.raise();
        if let Some(thread) = self.thread.take() {
            let outcome = thread.join().unwrap_or_else(|_| {
                error!("Trigger thread panicked");
                TriggerOutcome::Fired
            });
            self.outcome = Some(outcome);
        }
        self.outcome.unwrap_or(TriggerOutcome::Cancelled)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |thread| thread.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_utils::atomic::AtomicCell;
    use std::time::Instant;

    #[test]
    fn test_cancel_before_firing() {
        let fired = Arc::new(AtomicCell::new(false));
        let flag = fired.clone();
        let mut trigger = Trigger::arm(Duration::from_secs(30), move || flag.store(true));
        let start = Instant::now();
        assert_eq!(trigger.cancel(), TriggerOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!fired.load());
        assert_eq!(trigger.cancel(), TriggerOutcome::Cancelled);
    }

    #[test]
    fn test_fires_after_delay() {
        let fired = Arc::new(AtomicCell::new(false));
        let flag = fired.clone();
        let mut trigger = Trigger::arm(Duration::from_millis(10), move || flag.store(true));
        while !trigger.is_finished() {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(fired.load());
        assert_eq!(trigger.cancel(), TriggerOutcome::Fired);
        assert_eq!(trigger.cancel(), TriggerOutcome::Fired);
    }
}
