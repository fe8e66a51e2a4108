#![forbid(unsafe_code)]

//! Cooperative time limits for verification work.

use crate::Error;
use std::time::{Duration, Instant};

/// A point in time after which work should stop with [`Error::Timeout`].
///
/// Long-running loops call [`Deadline::check`] at convenient points.
/// `Deadline::none()` never expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    limit: Option<(Instant, Duration)>,
}

impl Deadline {
    pub fn none() -> Self {
        Self::default()
    }

    /// Expire `limit` from now. A limit too large to represent never expires.
    pub fn after(limit: Duration) -> Self {
        Self {
            limit: Instant::now().checked_add(limit).map(|at| (at, limit)),
        }
    }

    /// Time left, or `None` when there is no limit.
    pub fn remaining(&self) -> Option<Duration> {
        self.limit
            .map(|(at, _)| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.limit.is_some_and(|(at, _)| Instant::now() >= at)
    }

    /// The error reported once the deadline has passed.
    pub fn timeout_error(&self) -> Error {
        Error::Timeout(self.limit.map_or(Duration::ZERO, |(_, limit)| limit))
    }

    pub fn check(&self) -> Result<(), Error> {
        if self.is_expired() {
            Err(self.timeout_error())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_expires() {
        let d = Deadline::none();
        assert!(!d.is_expired());
        assert!(d.check().is_ok());
        assert_eq!(d.remaining(), None);
    }

    #[test]
    fn test_expired_reports_limit() {
        let d = Deadline::after(Duration::ZERO);
        assert!(d.is_expired());
        assert_eq!(d.remaining(), Some(Duration::ZERO));
        assert!(matches!(d.check(), Err(Error::Timeout(l)) if l == Duration::ZERO));

        let d = Deadline::after(Duration::from_secs(3600));
        assert!(d.check().is_ok());
        assert!(d.remaining().is_some_and(|r| r > Duration::from_secs(3500)));
    }

    #[test]
    fn test_unrepresentable_limit_is_unbounded() {
        assert_eq!(Deadline::after(Duration::MAX), Deadline::none());
    }
}
