//! LeaderboardSync - keeps a local leaderboard snapshot fresh by polling.
//!
//! The snapshot is replaced wholesale on every successful fetch and kept as
//! is on failure. Each start/stop bumps an epoch; a response is applied only
//! if the epoch it was issued under is still current, so a late reply can
//! never resurrect data on a stopped or restarted instance.

use crate::leaderboard::api::LeaderboardApi;
use crate::leaderboard::error::ClientError;
use crate::types::LeaderboardSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// Status text shown when a fetch fails.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to load leaderboard";

/// Where the sync currently is in its fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing fetched yet
    Idle,
    /// A fetch is outstanding
    Loading,
    /// The last completed fetch succeeded
    Ready,
    /// The last completed fetch failed; any older snapshot is still kept
    Error(String),
}

/// Observable state of a [`LeaderboardSync`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub phase: SyncPhase,
    /// Last good snapshot, survives failed fetches
    pub snapshot: Option<Arc<LeaderboardSnapshot>>,
}

impl SyncState {
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            SyncPhase::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SyncPhase::Loading
    }

    /// Phase to fall back to when an outstanding fetch is abandoned.
    fn settled_phase(&self) -> SyncPhase {
        if self.snapshot.is_some() {
            SyncPhase::Ready
        } else {
            SyncPhase::Idle
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            phase: SyncPhase::Idle,
            snapshot: None,
        }
    }
}

#[derive(Debug, Default)]
struct Control {
    poller: Option<JoinHandle<()>>,
    stopped: bool,
}

struct SyncInner {
    api: Arc<dyn LeaderboardApi>,
    poll_interval: Duration,
    state: watch::Sender<SyncState>,
    /// Only changed inside a `state` modification so checks and writes line up
    epoch: AtomicU64,
    control: Mutex<Control>,
}

impl Drop for SyncInner {
    fn drop(&mut self) {
        let control = self.control.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(poller) = control.poller.take() {
            poller.abort();
        }
    }
}

/// Polling leaderboard cache. Cheap to clone; clones share one schedule.
#[derive(Clone)]
pub struct LeaderboardSync {
    inner: Arc<SyncInner>,
}

impl LeaderboardSync {
    pub fn new(api: Arc<dyn LeaderboardApi>, poll_interval: Duration) -> Self {
        let (state, _) = watch::channel(SyncState::default());

        Self {
            inner: Arc::new(SyncInner {
                api,
                poll_interval,
                state,
                epoch: AtomicU64::new(0),
                control: Mutex::new(Control::default()),
            }),
        }
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> SyncState {
        self.inner.state.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<Arc<LeaderboardSnapshot>> {
        self.inner.state.borrow().snapshot.clone()
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    pub fn is_running(&self) -> bool {
        self.control().poller.is_some()
    }

    /// Fetch now and then every poll interval. A second call while running
    /// does nothing. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut control = self.control();
        if control.poller.is_some() {
            debug!("Leaderboard sync already running");
            return;
        }

        let epoch = self.advance_epoch();
        control.stopped = false;

        let weak = Arc::downgrade(&self.inner);
        control.poller = Some(tokio::spawn(poll_loop(weak, epoch, self.inner.poll_interval)));

        info!(
            "Leaderboard sync started, polling every {} ms",
            self.inner.poll_interval.as_millis()
        );
    }

    /// Cancel the schedule. Responses to requests already sent are dropped.
    pub fn stop(&self) {
        let mut control = self.control();
        control.stopped = true;

        if let Some(poller) = control.poller.take() {
            poller.abort();
            info!("Leaderboard sync stopped");
        }
        self.advance_epoch();
    }

    /// Fetch outside the regular cadence. Returns `None` once stopped.
    ///
    /// The request is bound to the epoch current at call time, so a `stop`
    /// issued before the task first runs still cancels it.
    pub fn refresh_now(&self) -> Option<JoinHandle<()>> {
        let epoch = self.live_epoch()?;

        let inner = self.inner.clone();
        Some(tokio::spawn(async move {
            // failures are already reflected in the published state
            let _ = inner.fetch(epoch).await;
        }))
    }

    /// Manual retry after an error, same as [`refresh_now`](Self::refresh_now).
    pub fn retry(&self) -> Option<JoinHandle<()>> {
        self.refresh_now()
    }

    /// Run one fetch under the current epoch and apply its result.
    /// Does nothing once stopped.
    pub async fn fetch(&self) -> Result<(), ClientError> {
        match self.live_epoch() {
            Some(epoch) => self.inner.fetch(epoch).await,
            None => Ok(()),
        }
    }

    fn control(&self) -> MutexGuard<'_, Control> {
        self.inner.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current epoch, or `None` when stopped. Read under the control lock so
    /// it cannot interleave with `start`/`stop`.
    fn live_epoch(&self) -> Option<u64> {
        let control = self.control();
        if control.stopped {
            debug!("Ignoring fetch on a stopped leaderboard sync");
            return None;
        }
        Some(self.inner.epoch.load(Ordering::SeqCst))
    }

    /// Supersede every outstanding request and drop a dangling `Loading`.
    fn advance_epoch(&self) -> u64 {
        let mut epoch = 0;
        self.inner.state.send_if_modified(|state| {
            epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            if state.phase == SyncPhase::Loading {
                state.phase = state.settled_phase();
                true
            } else {
                false
            }
        });
        epoch
    }
}

impl SyncInner {
    #[instrument(skip(self))]
    async fn fetch(&self, epoch: u64) -> Result<(), ClientError> {
        if !self.apply_if_current(epoch, |state| {
            state.phase = SyncPhase::Loading;
        }) {
            return Ok(());
        }

        let result = self.api.fetch_top().await;

        match result {
            Ok(entries) => {
                let count = entries.len();
                let applied = self.apply_if_current(epoch, |state| {
                    state.snapshot = Some(Arc::new(LeaderboardSnapshot::new(entries)));
                    state.phase = SyncPhase::Ready;
                });
                if applied {
                    debug!("Leaderboard snapshot replaced with {} entries", count);
                }
                Ok(())
            }
            Err(err) => {
                let applied = self.apply_if_current(epoch, |state| {
                    state.phase = SyncPhase::Error(FETCH_FAILED_MESSAGE.to_string());
                });
                if applied {
                    warn!("Error fetching leaderboard: {}", err);
                }
                Err(err)
            }
        }
    }

    /// Mutate the state only if `epoch` is still the live one.
    fn apply_if_current<F>(&self, epoch: u64, update: F) -> bool
    where
        F: FnOnce(&mut SyncState),
    {
        let applied = self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            update(state);
            true
        });

        if !applied {
            debug!("Discarding leaderboard update from superseded epoch {}", epoch);
        }
        applied
    }
}

async fn poll_loop(sync: Weak<SyncInner>, epoch: u64, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // first tick completes immediately
        ticker.tick().await;

        let Some(inner) = sync.upgrade() else {
            break;
        };
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            break;
        }
        let _ = inner.fetch(epoch).await;
    }
}
