use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Session-scoped cancellation flag.
///
/// Cloned into the interrupt handler, the delivery callback, and the
/// controlling loop. Once triggered it stays triggered.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_clear() {
        assert!(!StopSignal::new().is_triggered());
    }

    #[test]
    fn clones_share_state() {
        let signal = StopSignal::new();
        let handler = signal.clone();

        thread::spawn(move || handler.trigger()).join().unwrap();

        assert!(signal.is_triggered());
    }

    #[test]
    fn trigger_is_sticky() {
        let signal = StopSignal::new();
        signal.trigger();
        signal.trigger();
        assert!(signal.is_triggered());
    }
}
