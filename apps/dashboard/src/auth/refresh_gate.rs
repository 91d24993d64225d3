//! Single-flight coordination for token refresh.
//!
//! At most one refresh runs at a time. Requests that hit a 401 while it runs
//! park a `oneshot` receiver in the wait-list; settling the refresh drains the
//! whole list with one shared outcome.
//!
//! Every settle advances `generation`. A request remembers the generation it
//! was dispatched under, so a 401 that arrives after the burst's refresh has
//! already settled adopts that outcome instead of starting a second refresh.

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::errors::RefreshError;

pub type RefreshOutcome = Result<(), RefreshError>;

pub struct RefreshGate {
    state: Mutex<GateState>,
}

struct GateState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    generation: u64,
    last_outcome: RefreshOutcome,
}

/// What a request that received a 401 must do next.
pub enum Admission<'a> {
    /// No refresh is running: the caller performs it and settles through the guard.
    Leader(LeaderGuard<'a>),
    /// A refresh is running: wait for its outcome.
    Follower(oneshot::Receiver<RefreshOutcome>),
    /// A refresh settled after the request was dispatched.
    Settled(RefreshOutcome),
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                in_flight: false,
                waiters: Vec::new(),
                generation: 0,
                last_outcome: Ok(()),
            }),
        }
    }

    /// Generation to record before dispatching a request.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().in_flight
    }

    pub fn queue_depth(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Decides the role of a request whose dispatch saw `observed_generation`.
    pub fn admit(&self, observed_generation: u64) -> Admission<'_> {
        let mut state = self.state.lock();

        if state.generation != observed_generation {
            return Admission::Settled(state.last_outcome.clone());
        }

        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            debug!(queued = state.waiters.len(), "Request queued behind in-flight refresh");
            return Admission::Follower(rx);
        }

        state.in_flight = true;
        Admission::Leader(LeaderGuard {
            gate: self,
            settled: false,
        })
    }

    /// Marks newly issued credentials (login, OAuth callback) as current.
    ///
    /// Requests dispatched before this point replay with the new token on 401.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.last_outcome = Ok(());
    }

    fn finish(&self, outcome: RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.state.lock();
            state.in_flight = false;
            state.generation += 1;
            state.last_outcome = outcome.clone();
            std::mem::take(&mut state.waiters)
        };

        let drained = waiters.len();
        for waiter in waiters {
            // A dropped receiver means the caller gave up; nothing to deliver.
            let _ = waiter.send(outcome.clone());
        }
        drained
    }
}

/// Held by the request performing the refresh.
///
/// Dropping it without calling [`LeaderGuard::settle`] fails the wait-list with
/// [`RefreshError::Abandoned`], so a cancelled leader never strands its followers.
pub struct LeaderGuard<'a> {
    gate: &'a RefreshGate,
    settled: bool,
}

impl LeaderGuard<'_> {
    /// Publishes the outcome to every queued request. Returns how many were waiting.
    pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
        self.settled = true;
        self.gate.finish(outcome)
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.gate.finish(Err(RefreshError::Abandoned));
        }
    }
}
