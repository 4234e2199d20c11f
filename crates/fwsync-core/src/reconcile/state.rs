// ── Reconciliation state machine ──

use std::fmt;

use tracing::debug;

use crate::error::CoreError;
use crate::model::{DeviceId, Domain};

/// Progress of an Apply (local → appliance) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ApplyState {
    Start,
    /// Desired state read from the repository.
    Loaded,
    /// Existing remote ids known.
    IdsFetched,
    /// Existing remote entries disabled and removed.
    Cleared,
    /// Desired entries created or re-labelled.
    Added,
    /// Desired entries toggled on (and deployed where the domain deploys).
    Enabled,
    /// Singleton values written.
    Written,
    /// Trailing settings applied after the main sequence.
    Finalized,
    Done,
}

/// Progress of a Sync (appliance → local) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SyncState {
    Start,
    Fetched,
    Normalized,
    Replaced,
    Done,
}

/// The transition a failed run was attempting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Apply(ApplyState),
    Sync(SyncState),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply(s) => write!(f, "apply→{s}"),
            Self::Sync(s) => write!(f, "sync→{s}"),
        }
    }
}

impl From<ApplyState> for Phase {
    fn from(s: ApplyState) -> Self {
        Self::Apply(s)
    }
}

impl From<SyncState> for Phase {
    fn from(s: SyncState) -> Self {
        Self::Sync(s)
    }
}

/// Tracks one run through its states.
///
/// Every remote or repository call goes through [`Machine::step`]; a
/// failure stops the run and is reported against the state it was
/// trying to reach. Nothing is rolled back.
pub(crate) struct Machine<'a, S> {
    domain: Domain,
    device: &'a DeviceId,
    state: S,
}

impl<'a, S> Machine<'a, S>
where
    S: Copy + fmt::Display + Into<Phase>,
{
    pub(crate) fn new(domain: Domain, device: &'a DeviceId, start: S) -> Self {
        Self {
            domain,
            device,
            state: start,
        }
    }

    /// Await `work` and move to `next` if it succeeds.
    pub(crate) async fn step<T, E>(
        &mut self,
        next: S,
        work: impl Future<Output = Result<T, E>>,
    ) -> Result<T, CoreError>
    where
        E: Into<CoreError>,
    {
        let result = work.await;
        self.advance(next, result)
    }

    /// Record a synchronous transition.
    pub(crate) fn advance<T, E>(&mut self, next: S, result: Result<T, E>) -> Result<T, CoreError>
    where
        E: Into<CoreError>,
    {
        match result {
            Ok(value) => {
                debug!(
                    device = %self.device,
                    domain = %self.domain,
                    from = %self.state,
                    to = %next,
                    "transition"
                );
                self.state = next;
                Ok(value)
            }
            Err(e) => Err(CoreError::Reconcile {
                domain: self.domain,
                phase: next.into(),
                source: Box::new(e.into()),
            }),
        }
    }

    pub(crate) fn finish(self) {
        debug!(device = %self.device, domain = %self.domain, last = %self.state, "reconciled");
    }
}
