use std::time::Duration;

use netcore_io::TimerFd;

/// `None` means the timer repeats forever; `Some(0)` means it has already
/// fired its last tick and is due for teardown.
pub type RemainingTicks = Option<u64>;

/// A timerfd-backed countdown timer. `on_tick` fires once per readiness
/// event (never once per coalesced expiration, matching the timerfd
/// semantics this is built on); `on_stop` fires once, when the finite tick
/// count reaches zero.
pub struct Timer {
    fd: TimerFd,
    remaining: RemainingTicks,
    on_tick: Box<dyn FnMut() + Send>,
    on_stop: Box<dyn FnMut() + Send>,
}

impl Timer {
    pub fn new(
        initial: Duration,
        interval: Duration,
        loop_count: RemainingTicks,
        on_tick: impl FnMut() + Send + 'static,
        on_stop: impl FnMut() + Send + 'static,
    ) -> std::io::Result<Self> {
        let fd = TimerFd::new()?;
        fd.set(initial, interval)?;
        Ok(Self { fd, remaining: loop_count, on_tick: Box::new(on_tick), on_stop: Box::new(on_stop) })
    }

    pub fn raw_fd(&self) -> std::os::fd::RawFd {
        self.fd.raw_fd()
    }

    /// Called when the owning worker observes readiness on this timer's fd.
    /// Returns `true` once the timer has exhausted its loop count and
    /// should be torn down by the caller (unregistered from the fd
    /// registry, dropped).
    pub fn fire(&mut self) -> std::io::Result<bool> {
        let expirations = self.fd.drain()?;
        if expirations == 0 {
            return Ok(false);
        }
        (self.on_tick)();
        match &mut self.remaining {
            None => Ok(false),
            Some(0) => {
                (self.on_stop)();
                Ok(true)
            }
            Some(n) => {
                *n -= 1;
                if *n == 0 {
                    (self.on_stop)();
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    /// Rearms the timerfd with an all-zero spec so the next tick never
    /// arrives.
    pub fn stop(&self) -> std::io::Result<()> {
        self.fd.disarm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn fires_on_tick_once_per_readiness_event_and_stops_after_loop_count() {
        let ticks = Arc::new(AtomicU64::new(0));
        let stops = Arc::new(AtomicU64::new(0));
        let ticks2 = ticks.clone();
        let stops2 = stops.clone();

        let mut timer = Timer::new(
            Duration::from_millis(5),
            Duration::from_millis(5),
            Some(3),
            move || {
                ticks2.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                stops2.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

        let mut done = false;
        for _ in 0..20 {
            std::thread::sleep(Duration::from_millis(10));
            if timer.fire().unwrap() {
                done = true;
                break;
            }
        }
        assert!(done);
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn perpetual_timer_never_reports_done() {
        let mut timer =
            Timer::new(Duration::from_millis(5), Duration::from_millis(5), None, || {}, || {})
                .unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(!timer.fire().unwrap());
    }
}
