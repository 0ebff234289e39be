/// Handle identifying one arming of a [`BreakTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct Armed {
    token: TimerToken,
    deadline_ms: u64,
}

/// Cancellable one-shot deadline that marks the end of a letter.
///
/// At most one arming is outstanding: arming again replaces it. Time is
/// driven by the caller through [`BreakTimer::poll`].
#[derive(Debug)]
pub struct BreakTimer {
    delay_ms: u64,
    next_id: u64,
    armed: Option<Armed>,
}

impl BreakTimer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            next_id: 0,
            armed: None,
        }
    }

    /// Arm the timer to fire `delay_ms` after `now_ms`
    pub fn arm(&mut self, now_ms: u64) -> TimerToken {
        let token = TimerToken(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.armed = Some(Armed {
            token,
            deadline_ms: now_ms.saturating_add(self.delay_ms),
        });
        token
    }

    /// Disarm the given arming. Stale, fired or already canceled tokens are
    /// ignored. Returns true if something was disarmed.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        match self.armed {
            Some(armed) if armed.token == token => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }

    /// Disarm whatever is armed
    pub fn cancel_all(&mut self) -> bool {
        self.armed.take().is_some()
    }

    /// Fire the timer if its deadline has passed. Each arming fires once.
    pub fn poll(&mut self, now_ms: u64) -> Option<TimerToken> {
        match self.armed {
            Some(armed) if now_ms >= armed.deadline_ms => {
                self.armed = None;
                Some(armed.token)
            }
            _ => None,
        }
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.armed.map(|a| a.deadline_ms)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let mut timer = BreakTimer::new(500);
        let token = timer.arm(100);
        assert_eq!(timer.deadline_ms(), Some(600));
        assert_eq!(timer.poll(599), None);
        assert_eq!(timer.poll(600), Some(token));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_fires_at_most_once() {
        let mut timer = BreakTimer::new(500);
        timer.arm(0);
        assert!(timer.poll(1000).is_some());
        assert_eq!(timer.poll(2000), None);
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut timer = BreakTimer::new(500);
        let token = timer.arm(0);
        assert!(timer.cancel(token));
        assert_eq!(timer.poll(10_000), None);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut timer = BreakTimer::new(500);
        let token = timer.arm(0);
        assert!(timer.cancel(token));
        assert!(!timer.cancel(token));

        let fired = timer.arm(0);
        assert_eq!(timer.poll(500), Some(fired));
        assert!(!timer.cancel(fired));
    }

    #[test]
    fn test_rearm_replaces_previous() {
        let mut timer = BreakTimer::new(500);
        let first = timer.arm(0);
        let second = timer.arm(300);
        assert_ne!(first, second);

        // The stale token cannot cancel the newer arming
        assert!(!timer.cancel(first));
        assert_eq!(timer.poll(500), None);
        assert_eq!(timer.poll(800), Some(second));
    }
}
