//! Leading + trailing throttle as an explicit state machine.
//!
//! The first call of a burst is invoked immediately. Calls that arrive before the window since
//! the last invocation has elapsed are coalesced into a single trailing invocation at the end of
//! that window. The throttle stores no arguments: the caller reads its latest input when the
//! invocation actually runs.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Run now; a new window starts.
    InvokeNow,
    /// A trailing invocation is now armed for the given deadline.
    Schedule(Instant),
    /// Folded into the already armed trailing invocation.
    Coalesced,
}

#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    last_invoke: Option<Instant>,
    trailing_at: Option<Instant>,
    pending: bool,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_invoke: None,
            trailing_at: None,
            pending: false,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Deadline of the armed trailing invocation, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.trailing_at
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn call(&mut self, now: Instant) -> ThrottleDecision {
        if self.trailing_at.is_some() {
            self.pending = true;
            return ThrottleDecision::Coalesced;
        }

        match self.last_invoke {
            Some(last) if now < last + self.window => {
                let at = last + self.window;
                self.pending = true;
                self.trailing_at = Some(at);
                ThrottleDecision::Schedule(at)
            }
            _ => {
                self.last_invoke = Some(now);
                ThrottleDecision::InvokeNow
            }
        }
    }

    /// Called when the trailing deadline elapses. Returns whether to invoke.
    pub fn fire(&mut self, now: Instant) -> bool {
        self.trailing_at = None;
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.last_invoke = Some(now);
        true
    }

    /// Drops an armed trailing invocation.
    pub fn cancel(&mut self) {
        self.trailing_at = None;
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_call_invokes_immediately() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(WINDOW);
        assert_eq!(throttle.call(t0), ThrottleDecision::InvokeNow);
        assert_eq!(throttle.deadline(), None);
    }

    #[test]
    fn burst_coalesces_into_one_trailing_call() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(WINDOW);

        let mut invocations = 0;
        for step in 0..10 {
            match throttle.call(t0 + ms(step * 20)) {
                ThrottleDecision::InvokeNow => invocations += 1,
                ThrottleDecision::Schedule(at) => assert_eq!(at, t0 + WINDOW),
                ThrottleDecision::Coalesced => {}
            }
        }
        assert_eq!(invocations, 1);
        assert!(throttle.is_pending());

        let deadline = throttle.deadline().expect("trailing armed");
        assert!(throttle.fire(deadline));
        assert_eq!(throttle.deadline(), None);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn call_after_quiet_window_is_leading_again() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(WINDOW);
        assert_eq!(throttle.call(t0), ThrottleDecision::InvokeNow);
        assert_eq!(throttle.call(t0 + ms(300)), ThrottleDecision::InvokeNow);
        assert_eq!(throttle.call(t0 + ms(900)), ThrottleDecision::InvokeNow);
    }

    #[test]
    fn trailing_invocation_starts_a_new_window() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(WINDOW);
        throttle.call(t0);
        throttle.call(t0 + ms(10));
        assert!(throttle.fire(t0 + WINDOW));

        assert_eq!(
            throttle.call(t0 + ms(310)),
            ThrottleDecision::Schedule(t0 + ms(600))
        );
    }

    #[test]
    fn cancel_drops_the_trailing_call() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(WINDOW);
        throttle.call(t0);
        throttle.call(t0 + ms(10));
        throttle.cancel();
        assert_eq!(throttle.deadline(), None);
        assert!(!throttle.fire(t0 + WINDOW));
    }
}
