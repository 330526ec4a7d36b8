//! Polling driver.
//!
//! A [`DispatchSession`] owns the fleet state snapshot and is the only thing
//! allowed to run cycles against it. Manual requests go through
//! [`DispatchSession::submit`]; a background [`Poller`] calls
//! [`DispatchSession::poll_once`] on a fixed interval to keep routes live.
//! Polling backs off entirely while a manual request is outstanding, and at
//! most one cycle runs at a time. A dustbin already waiting on a manual
//! request cannot be requested again until that request finishes.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::model::{CollectionPoint, FleetState};
use crate::traits::{RouteSolver, StateStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing to keep live yet.
    NoRoutes,
    ManualRequestPending,
    CycleInFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Refreshed(FleetState),
    Skipped(SkipReason),
}

struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Holds a dustbin id in the in-flight set until dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    dustbin_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn claim(in_flight: &'a Mutex<HashSet<String>>, dustbin_id: &str) -> Option<Self> {
        if !in_flight.lock().insert(dustbin_id.to_string()) {
            return None;
        }
        Some(Self {
            in_flight,
            dustbin_id: dustbin_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.dustbin_id);
    }
}

pub struct DispatchSession<S, St> {
    dispatcher: Dispatcher<S>,
    store: St,
    cycle: Mutex<()>,
    pending_manual: AtomicUsize,
    in_flight: Mutex<HashSet<String>>,
}

impl<S, St> DispatchSession<S, St>
where
    S: RouteSolver + Sync,
    St: StateStore,
{
    pub fn new(dispatcher: Dispatcher<S>, store: St) -> Self {
        Self {
            dispatcher,
            store,
            cycle: Mutex::new(()),
            pending_manual: AtomicUsize::new(0),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }

    pub fn state(&self) -> Result<FleetState, DispatchError> {
        Ok(self.store.load()?)
    }

    pub fn manual_pending(&self) -> bool {
        self.pending_manual.load(Ordering::SeqCst) > 0
    }

    /// Runs an Assign cycle for `point` and stores the result.
    ///
    /// Waits for any in-flight cycle to finish first. On failure the stored
    /// state is left as it was. A second request for a dustbin whose request
    /// is still in flight is refused with [`DispatchError::DuplicateRequest`].
    pub fn submit(&self, point: &CollectionPoint) -> Result<FleetState, DispatchError> {
        let Some(_claim) = InFlightGuard::claim(&self.in_flight, &point.id) else {
            info!(dustbin = %point.id, "collection already requested");
            return Err(DispatchError::DuplicateRequest {
                dustbin_id: point.id.clone(),
            });
        };
        let _pending = PendingGuard::enter(&self.pending_manual);
        let _cycle = self.cycle.lock();

        let state = self.store.load()?;
        let next = self.dispatcher.dispatch(Some(point), &state)?;
        self.store.save(&next)?;
        Ok(next)
    }

    /// Runs a Refresh cycle unless polling is gated off.
    pub fn poll_once(&self) -> Result<PollOutcome, DispatchError> {
        if self.manual_pending() {
            return Ok(PollOutcome::Skipped(SkipReason::ManualRequestPending));
        }
        let Some(_cycle) = self.cycle.try_lock() else {
            return Ok(PollOutcome::Skipped(SkipReason::CycleInFlight));
        };

        let state = self.store.load()?;
        if state.routes.is_empty() {
            return Ok(PollOutcome::Skipped(SkipReason::NoRoutes));
        }

        let next = self.dispatcher.dispatch(None, &state)?;
        self.store.save(&next)?;
        Ok(PollOutcome::Refreshed(next))
    }
}

/// Background thread calling [`DispatchSession::poll_once`] on an interval.
pub struct Poller {
    stop: Sender<()>,
    handle: JoinHandle<u32>,
}

impl Poller {
    pub fn spawn<S, St>(session: Arc<DispatchSession<S, St>>, config: PollerConfig) -> Self
    where
        S: RouteSolver + Send + Sync + 'static,
        St: StateStore + Send + Sync + 'static,
    {
        let (stop, stop_rx) = mpsc::channel::<()>();
        let PollerConfig {
            interval,
            max_ticks,
        } = config;

        let handle = thread::spawn(move || {
            info!(interval_ms = interval.as_millis() as u64, ?max_ticks, "poller started");
            let mut ticks = 0u32;
            while max_ticks.is_none_or(|max| ticks < max) {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        ticks += 1;
                        match session.poll_once() {
                            Ok(PollOutcome::Refreshed(state)) => {
                                debug!(routes = state.routes.len(), "routes refreshed");
                            }
                            Ok(PollOutcome::Skipped(reason)) => {
                                debug!(?reason, "poll skipped");
                            }
                            Err(err) => warn!(error = %err, "poll cycle failed"),
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            info!(ticks, "poller stopped");
            ticks
        });

        Self { stop, handle }
    }

    /// Stops polling and waits for the thread to exit. Returns the number of
    /// ticks that ran.
    pub fn stop(self) -> u32 {
        let _ = self.stop.send(());
        self.join()
    }

    /// Waits for the poller to finish its tick budget. Returns the number of
    /// ticks that ran.
    pub fn join(self) -> u32 {
        match self.handle.join() {
            Ok(ticks) => ticks,
            Err(_) => {
                warn!("poller thread panicked");
                0
            }
        }
    }
}
