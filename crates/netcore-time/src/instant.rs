use crate::Duration;

/// Monotonic instant. `ZERO` is a sentinel meaning "never": anything measured
/// `elapsed()` against it reads back as `Duration::MAX`, so a freshly
/// constructed `Repeater` fires on its very first check.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Instant(Option<std::time::Instant>);

impl Instant {
    pub const ZERO: Self = Self(None);

    #[inline]
    pub fn now() -> Self {
        Self(Some(std::time::Instant::now()))
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        match self.0 {
            Some(t) => t.elapsed().into(),
            None => Duration::MAX,
        }
    }

    #[inline]
    pub fn saturating_sub(&self, other: Instant) -> Duration {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.saturating_duration_since(b).into(),
            (Some(_), None) => Duration::MAX,
            _ => Duration::ZERO,
        }
    }
}

impl std::ops::Sub for Instant {
    type Output = Duration;
    fn sub(self, rhs: Instant) -> Duration {
        self.saturating_sub(rhs)
    }
}
