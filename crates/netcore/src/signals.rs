use std::panic::PanicHookInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM, SIGTSTP, SIGUSR1, SIGUSR2};
use signal_hook::flag as signal_flag;

/// Shared shutdown flag: zero while running, set to the triggering signal
/// number once SIGINT/SIGTERM/SIGQUIT fires. The acceptor loop polls this
/// once per iteration; on trip it pokes every worker's exit-eventfd.
#[derive(Clone)]
pub struct StopFlag(Arc<AtomicUsize>);

impl StopFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed) != 0
    }
}

/// Registers SIGINT/SIGTERM/SIGQUIT to set the returned `StopFlag`,
/// installs a panic hook that does the same (so a panicked worker thread
/// still triggers a clean shutdown of its siblings), ignores SIGPIPE so a
/// `write()` on a peer-reset socket surfaces as `EPIPE` instead of killing
/// the process, and installs default log-and-continue hooks for
/// SIGUSR1/SIGUSR2/SIGTSTP that a host application can override via
/// `on_user_signal`.
pub fn install() -> std::io::Result<StopFlag> {
    let stop_flag = Arc::new(AtomicUsize::new(0));
    signal_flag::register_usize(SIGTERM, Arc::clone(&stop_flag), SIGTERM as usize)?;
    signal_flag::register_usize(SIGINT, Arc::clone(&stop_flag), SIGINT as usize)?;
    signal_flag::register_usize(SIGQUIT, Arc::clone(&stop_flag), SIGQUIT as usize)?;

    let panic_flag = Arc::clone(&stop_flag);
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        panic_flag.store(SIGINT as usize, Ordering::Relaxed);
        original_hook(info);
    }));

    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }

    for sig in [SIGUSR1, SIGUSR2, SIGTSTP] {
        unsafe {
            signal_hook::low_level::register(sig, move || {
                tracing::info!(signal = sig, "received user signal, continuing");
            })?;
        }
    }

    Ok(StopFlag(stop_flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_flag_is_not_set() {
        let flag = StopFlag(Arc::new(AtomicUsize::new(0)));
        assert!(!flag.is_set());
        flag.0.store(SIGINT as usize, Ordering::Relaxed);
        assert!(flag.is_set());
    }
}
