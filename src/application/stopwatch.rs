// Stopwatch - drives a FlightTimer from a tokio interval
use crate::domain::flight_timer::{FlightTimer, TimerState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
/// How long an HTTP stopwatch session may live before it is reaped.
pub const DEFAULT_MAX_SESSION: Duration = Duration::from_secs(4 * 60 * 60);

/// A running flight timer plus the task feeding it ticks.
///
/// Ticks and the stop action take the same lock, so once `stop` returns no
/// tick can land. Dropping the stopwatch cancels the tick task, which is how
/// an abandoned flow releases it.
pub struct Stopwatch {
    timer: Arc<Mutex<FlightTimer>>,
    elapsed: watch::Receiver<u64>,
    ticker: JoinHandle<()>,
}

impl Stopwatch {
    pub fn start(period: Duration) -> Self {
        let mut timer = FlightTimer::default();
        timer.start();
        let timer = Arc::new(Mutex::new(timer));

        let (tx, elapsed) = watch::channel(0);
        let ticker = tokio::spawn(run_ticks(timer.clone(), tx, period));

        Self {
            timer,
            elapsed,
            ticker,
        }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.lock().elapsed_seconds()
    }

    pub fn state(&self) -> TimerState {
        self.lock().state()
    }

    /// Elapsed-seconds updates; the channel closes once the timer stops.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed.clone()
    }

    /// Freeze the timer and cancel pending ticks. Safe to call repeatedly.
    pub fn stop(&self) -> u64 {
        let elapsed = self.lock().stop();
        self.ticker.abort();
        elapsed
    }

    fn lock(&self) -> MutexGuard<'_, FlightTimer> {
        lock_timer(&self.timer)
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

fn lock_timer(timer: &Mutex<FlightTimer>) -> MutexGuard<'_, FlightTimer> {
    // A panic mid-tick leaves the counter intact
    timer.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_ticks(timer: Arc<Mutex<FlightTimer>>, tx: watch::Sender<u64>, period: Duration) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let elapsed = {
            let mut timer = lock_timer(&timer);
            if !timer.tick() {
                break;
            }
            timer.elapsed_seconds()
        };
        tx.send_replace(elapsed);
    }
}
