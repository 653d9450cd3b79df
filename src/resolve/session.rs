//! Poll sessions
//!
//! A session owns one background task that polls a single remote resource
//! until it reaches a terminal state or is cancelled. Each session has its own
//! timer, cancellation token and state channel; nothing is shared between
//! sessions.
//!
//! The next tick is only armed after the previous request resolves, so a
//! session never has more than one request in flight and a slow response
//! delays the schedule instead of queueing a catch-up poll.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ResolveError;

/// Result of one poll
#[derive(Debug, Clone, PartialEq)]
pub enum Step<S, T> {
    /// Not there yet; keep polling
    Pending(S),
    /// Terminal success
    Done(T),
}

/// A remote resource that can be polled to completion
#[async_trait]
pub trait Poller: Send + Sync + 'static {
    type Snapshot: Clone + fmt::Debug + Send + Sync + 'static;
    type Output: Clone + fmt::Debug + Send + Sync + 'static;

    /// Short name used in logs ("torrent", "delayed")
    fn kind(&self) -> &'static str;

    /// Remote id being polled
    fn id(&self) -> &str;

    async fn poll(&self) -> Result<Step<Self::Snapshot, Self::Output>, ResolveError>;
}

/// Observable state of a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState<S, T> {
    /// Still polling; holds the latest snapshot once the first poll returns
    Polling(Option<S>),
    Finished(T),
    Failed(ResolveError),
    Cancelled,
}

impl<S, T> SessionState<S, T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Polling(_))
    }

    /// Latest intermediate snapshot, if still polling
    pub fn snapshot(&self) -> Option<&S> {
        match self {
            SessionState::Polling(snapshot) => snapshot.as_ref(),
            _ => None,
        }
    }
}

/// Session state for a given poller
pub type StateFor<P> = SessionState<<P as Poller>::Snapshot, <P as Poller>::Output>;

/// Handle to a running poll session. Dropping it cancels the session.
pub struct PollSession<P: Poller> {
    id: String,
    state: Arc<watch::Sender<StateFor<P>>>,
    receiver: watch::Receiver<StateFor<P>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl<P: Poller> PollSession<P> {
    /// Start polling immediately, then every `interval` after each response.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(poller: P, interval: Duration) -> Self {
        let id = poller.id().to_string();
        let (sender, receiver) = watch::channel(SessionState::Polling(None));
        let state = Arc::new(sender);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(poller, interval, Arc::clone(&state), cancel.clone()));

        Self {
            id,
            state,
            receiver,
            cancel,
            task,
        }
    }

    /// Remote id this session is polling
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current state (latest snapshot or terminal result)
    pub fn state(&self) -> StateFor<P> {
        self.state.borrow().clone()
    }

    /// Independent receiver for observers
    pub fn subscribe(&self) -> watch::Receiver<StateFor<P>> {
        self.state.subscribe()
    }

    /// Wait for the next state change and return it
    pub async fn changed(&mut self) -> StateFor<P> {
        if self.receiver.changed().await.is_err() {
            return SessionState::Cancelled;
        }
        self.receiver.borrow_and_update().clone()
    }

    /// Wait until the session reaches a terminal state
    pub async fn wait(&mut self) -> StateFor<P> {
        match self.receiver.wait_for(|s| s.is_terminal()).await {
            Ok(state) => (*state).clone(),
            Err(_) => SessionState::Cancelled,
        }
    }

    /// Stop polling. Pending timers are dropped and a response that is
    /// still in flight is discarded when it arrives. A session that already
    /// finished keeps its result.
    pub fn cancel(&self) {
        self.cancel.cancel();
        let cancelled = self.state.send_if_modified(|current| {
            if current.is_terminal() {
                return false;
            }
            *current = SessionState::Cancelled;
            true
        });
        if cancelled {
            info!(id = %self.id, "poll session cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl<P: Poller> Drop for PollSession<P> {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

impl<P: Poller> fmt::Debug for PollSession<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollSession")
            .field("id", &self.id)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

async fn run<P: Poller>(
    poller: P,
    interval: Duration,
    state: Arc<watch::Sender<StateFor<P>>>,
    cancel: CancellationToken,
) {
    let kind = poller.kind();
    let id = poller.id().to_string();
    debug!(kind, %id, ?interval, "starting poll session");

    loop {
        let step = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            step = poller.poll() => step,
        };

        let next = match step {
            Ok(Step::Pending(snapshot)) => {
                debug!(kind, %id, ?snapshot, "still pending");
                SessionState::Polling(Some(snapshot))
            }
            Ok(Step::Done(output)) => {
                info!(kind, %id, "poll session finished");
                SessionState::Finished(output)
            }
            Err(err) => {
                warn!(kind, %id, error = %err, "poll session failed");
                SessionState::Failed(err)
            }
        };

        let terminal = next.is_terminal();
        if !publish(&state, &cancel, next) || terminal {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!(kind, %id, "poll session stopped");
}

/// Apply a new state unless the session was cancelled meanwhile
fn publish<S, T>(
    state: &watch::Sender<SessionState<S, T>>,
    cancel: &CancellationToken,
    next: SessionState<S, T>,
) -> bool {
    state.send_if_modified(|current| {
        if cancel.is_cancelled() || current.is_terminal() {
            return false;
        }
        *current = next;
        true
    })
}
