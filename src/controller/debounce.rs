//! Quiet-period debounce.
//!
//! Every `push` replaces the pending value and restarts the timer; the
//! value is released once `delay_ms` passes without another push. Time is
//! supplied by the caller so the same logic drives a `setTimeout` on wasm
//! and a synthetic clock in tests.

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: f64,
    pending: Option<(T, f64)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(0.0),
            pending: None,
        }
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Record a value at `now_ms`; returns the new deadline.
    pub fn push(&mut self, value: T, now_ms: f64) -> f64 {
        let deadline = now_ms + self.delay_ms;
        self.pending = Some((value, deadline));
        deadline
    }

    pub fn deadline(&self) -> Option<f64> {
        self.pending.as_ref().map(|(_, d)| *d)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its quiet period has elapsed.
    pub fn poll(&mut self, now_ms: f64) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now_ms >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Take the pending value regardless of time.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_quiet_period() {
        let mut d = Debouncer::new(300.0);
        d.push("a", 0.0);
        assert_eq!(d.poll(299.0), None);
        assert_eq!(d.poll(300.0), Some("a"));
        assert!(!d.is_pending());
    }

    #[test]
    fn test_keystrokes_reset_timer() {
        let mut d = Debouncer::new(300.0);
        d.push("6", 0.0);
        d.push("60", 200.0);
        d.push("600", 400.0);
        assert_eq!(d.poll(650.0), None);
        assert_eq!(d.poll(700.0), Some("600"));
    }

    #[test]
    fn test_cancel_and_flush() {
        let mut d = Debouncer::new(50.0);
        d.push(1, 0.0);
        d.cancel();
        assert_eq!(d.poll(100.0), None);
        d.push(2, 0.0);
        assert_eq!(d.flush(), Some(2));
    }
}
