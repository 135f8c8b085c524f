//! Background poll timer
//!
//! One thread per timer. The first tick runs immediately, later ticks every
//! `interval`. The timer holds its target weakly and exits once the target
//! is gone, when stopped, or when a tick asks it to.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use tracing::debug;

/// Work performed on each tick.
pub trait PollTarget: Send + Sync {
    /// Run one tick. `first` is true for the undelayed initial tick.
    fn poll_tick(&self, first: bool) -> ControlFlow<()>;
}

/// Handle to a running poll thread.
///
/// Stopping never joins: a tick may be in flight on the timer thread, and
/// stop can be requested from that very thread.
#[derive(Debug)]
pub struct PollTimer {
    name: String,
    shutdown_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    tick_count: Arc<AtomicU64>,
    wake: mpsc::Sender<()>,
}

impl PollTimer {
    /// Spawn the timer thread.
    pub fn start<T>(name: &str, interval: Duration, target: Weak<T>) -> std::io::Result<Self>
    where
        T: PollTarget + 'static,
    {
        let shutdown_signal = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let tick_count = Arc::new(AtomicU64::new(0));
        let (wake, wake_rx) = mpsc::channel::<()>();

        let loop_state = TimerLoop {
            name: name.to_string(),
            interval,
            target,
            shutdown_signal: Arc::clone(&shutdown_signal),
            finished: Arc::clone(&finished),
            tick_count: Arc::clone(&tick_count),
            wake: wake_rx,
        };

        thread::Builder::new()
            .name(format!("poll-{}", name))
            .spawn(move || loop_state.run())?;

        debug!(device = %name, ?interval, "Poll timer started");

        Ok(Self {
            name: name.to_string(),
            shutdown_signal,
            finished,
            tick_count,
            wake,
        })
    }

    /// Request the timer to stop. Idempotent. A tick already past its
    /// shutdown check may still run; targets re-check their own state.
    pub fn stop(&self) {
        if !self.shutdown_signal.swap(true, Ordering::SeqCst) {
            let _ = self.wake.send(());
            debug!(device = %self.name, "Poll timer stopped");
        }
    }

    /// Whether the thread is still scheduling ticks.
    pub fn is_running(&self) -> bool {
        !self.shutdown_signal.load(Ordering::SeqCst) && !self.finished.load(Ordering::SeqCst)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::SeqCst)
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct TimerLoop<T> {
    name: String,
    interval: Duration,
    target: Weak<T>,
    shutdown_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    tick_count: Arc<AtomicU64>,
    wake: mpsc::Receiver<()>,
}

impl<T: PollTarget> TimerLoop<T> {
    fn run(self) {
        let mut first = true;
        loop {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                break;
            }
            let Some(target) = self.target.upgrade() else {
                debug!(device = %self.name, "Poll target dropped");
                break;
            };

            self.tick_count.fetch_add(1, Ordering::SeqCst);
            let flow = target.poll_tick(first);
            drop(target);
            first = false;

            if flow.is_break() {
                break;
            }

            match self.wake.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.finished.store(true, Ordering::SeqCst);
        debug!(device = %self.name, ticks = self.tick_count.load(Ordering::SeqCst), "Poll timer exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    struct Counter {
        ticks: AtomicU64,
        firsts: AtomicU64,
        stop_after: u64,
    }

    impl Counter {
        fn new(stop_after: u64) -> Arc<Self> {
            Arc::new(Self {
                ticks: AtomicU64::new(0),
                firsts: AtomicU64::new(0),
                stop_after,
            })
        }
    }

    impl PollTarget for Counter {
        fn poll_tick(&self, first: bool) -> ControlFlow<()> {
            if first {
                self.firsts.fetch_add(1, Ordering::SeqCst);
            }
            let n = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.stop_after {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }

    fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_first_tick_is_immediate() {
        let counter = Counter::new(u64::MAX);
        let timer = PollTimer::start("t", Duration::from_secs(60), Arc::downgrade(&counter)).unwrap();

        assert!(wait_until(Duration::from_secs(2), || counter.ticks.load(Ordering::SeqCst) == 1));
        assert_eq!(counter.firsts.load(Ordering::SeqCst), 1);
        assert!(timer.is_running());
        timer.stop();
    }

    #[test]
    fn test_stop_prevents_further_ticks() {
        let counter = Counter::new(u64::MAX);
        let timer = PollTimer::start("t", Duration::from_millis(10), Arc::downgrade(&counter)).unwrap();
        assert!(wait_until(Duration::from_secs(2), || counter.ticks.load(Ordering::SeqCst) >= 2));

        timer.stop();
        timer.stop();
        assert!(!timer.is_running());

        thread::sleep(Duration::from_millis(50));
        let after_stop = counter.ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(counter.ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_break_ends_timer() {
        let counter = Counter::new(1);
        let timer = PollTimer::start("t", Duration::from_millis(10), Arc::downgrade(&counter)).unwrap();
        assert!(wait_until(Duration::from_secs(2), || !timer.is_running()));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 1);
        assert_eq!(timer.tick_count(), 1);
    }

    #[test]
    fn test_dropped_target_ends_timer() {
        let counter = Counter::new(u64::MAX);
        let timer = PollTimer::start("t", Duration::from_millis(10), Arc::downgrade(&counter)).unwrap();
        drop(counter);
        assert!(wait_until(Duration::from_secs(2), || !timer.is_running()));
    }
}
