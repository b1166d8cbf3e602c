// Application state for HTTP handlers
use crate::application::drone_service::DroneRegistry;
use crate::application::flight_service::FlightRecordAssembler;
use crate::application::location_service::LocationAggregator;
use crate::application::sharing_service::SharedAccessResolver;
use crate::application::stopwatch::Stopwatch;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub locations: LocationAggregator,
    pub sharing: SharedAccessResolver,
    pub drones: DroneRegistry,
    pub flights: FlightRecordAssembler,
    pub stopwatches: Arc<StopwatchSessions>,
}

struct Session {
    stopwatch: Stopwatch,
    started: Instant,
}

/// Stopwatches started over HTTP, keyed by session id.
///
/// Sessions older than `max_lifetime` are dropped the next time a session
/// starts, so abandoned ones do not pile up.
pub struct StopwatchSessions {
    sessions: Mutex<HashMap<u64, Session>>,
    next_id: AtomicU64,
    tick: Duration,
    max_lifetime: Duration,
}

impl StopwatchSessions {
    pub fn new(tick: Duration, max_lifetime: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            tick,
            max_lifetime,
        }
    }

    pub fn start(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.lock();

        let before = sessions.len();
        sessions.retain(|_, session| session.started.elapsed() < self.max_lifetime);
        if sessions.len() < before {
            tracing::info!("Reaped {} expired stopwatch sessions", before - sessions.len());
        }

        sessions.insert(
            id,
            Session {
                stopwatch: Stopwatch::start(self.tick),
                started: Instant::now(),
            },
        );
        tracing::debug!("Started stopwatch {} ({} active)", id, sessions.len());
        id
    }

    /// Runs `f` against a live session, if there is one.
    pub fn with<R>(&self, id: u64, f: impl FnOnce(&Stopwatch) -> R) -> Option<R> {
        self.lock().get(&id).map(|session| f(&session.stopwatch))
    }

    /// Stops the session but keeps it readable.
    pub fn stop(&self, id: u64) -> Option<u64> {
        self.with(id, Stopwatch::stop)
    }

    /// Stops the session and forgets it, handing back the flight time.
    pub fn finish(&self, id: u64) -> Option<u64> {
        let session = self.lock().remove(&id)?;
        Some(session.stopwatch.stop())
    }

    /// Drops the session without reading it.
    pub fn discard(&self, id: u64) -> bool {
        self.lock().remove(&id).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
