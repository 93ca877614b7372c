use std::time::{Duration, Instant};
use tracing::trace;

/// How often classification requests may be admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitPolicy {
    /// Periodic scanning: at most one request per `interval`
    ContinuousScan { interval: Duration },
    /// User-triggered requests: no time floor; re-entrancy is guarded elsewhere
    OnDemand,
}

/// Gate that converts an unbounded request rate into a bounded one.
///
/// `try_admit` records the admission time only when it admits, so rejected
/// calls have no side effects beyond the rejection counter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    last_admitted: Option<Instant>,
    admitted: u64,
    rejected: u64,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            last_admitted: None,
            admitted: 0,
            rejected: 0,
        }
    }

    pub fn continuous(interval: Duration) -> Self {
        Self::new(RateLimitPolicy::ContinuousScan { interval })
    }

    pub fn on_demand() -> Self {
        Self::new(RateLimitPolicy::OnDemand)
    }

    /// Admit iff strictly more than the interval has passed since the last admission
    pub fn try_admit(&mut self, now: Instant) -> bool {
        let admit = match (self.policy, self.last_admitted) {
            (RateLimitPolicy::OnDemand, _) => true,
            (RateLimitPolicy::ContinuousScan { .. }, None) => true,
            (RateLimitPolicy::ContinuousScan { interval }, Some(last)) => {
                now.saturating_duration_since(last) > interval
            }
        };

        if admit {
            self.last_admitted = Some(now);
            self.admitted += 1;
        } else {
            self.rejected += 1;
            trace!("Rate limiter rejected request ({} so far)", self.rejected);
        }

        admit
    }

    /// Forget the last admission, e.g. when a new scanning session starts
    pub fn reset(&mut self) {
        self.last_admitted = None;
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub fn last_admitted(&self) -> Option<Instant> {
        self.last_admitted
    }

    pub fn admitted_count(&self) -> u64 {
        self.admitted
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(200);

    #[test]
    fn test_first_request_is_admitted() {
        let mut limiter = RateLimiter::continuous(INTERVAL);
        assert!(limiter.try_admit(Instant::now()));
        assert_eq!(limiter.admitted_count(), 1);
    }

    #[test]
    fn test_request_within_interval_is_rejected() {
        let mut limiter = RateLimiter::continuous(INTERVAL);
        let t = Instant::now();

        assert!(limiter.try_admit(t));
        assert!(!limiter.try_admit(t + Duration::from_millis(50)));
        assert_eq!(limiter.rejected_count(), 1);
        // Rejection does not move the window
        assert_eq!(limiter.last_admitted(), Some(t));
    }

    #[test]
    fn test_exact_interval_is_rejected() {
        let mut limiter = RateLimiter::continuous(INTERVAL);
        let t = Instant::now();

        assert!(limiter.try_admit(t));
        assert!(!limiter.try_admit(t + INTERVAL));
    }

    #[test]
    fn test_request_after_interval_is_admitted() {
        let mut limiter = RateLimiter::continuous(INTERVAL);
        let t = Instant::now();

        assert!(limiter.try_admit(t));
        let later = t + INTERVAL + Duration::from_millis(1);
        assert!(limiter.try_admit(later));
        assert_eq!(limiter.last_admitted(), Some(later));
    }

    #[test]
    fn test_on_demand_always_admits() {
        let mut limiter = RateLimiter::on_demand();
        let t = Instant::now();

        assert!(limiter.try_admit(t));
        assert!(limiter.try_admit(t));
        assert_eq!(limiter.admitted_count(), 2);
    }

    #[test]
    fn test_reset_reopens_gate() {
        let mut limiter = RateLimiter::continuous(INTERVAL);
        let t = Instant::now();

        assert!(limiter.try_admit(t));
        limiter.reset();
        assert!(limiter.try_admit(t + Duration::from_millis(1)));
    }
}
