use super::{Interactions, Invocation, InvocationLedger};
use crate::logging;
use crate::{MockError, Result};
use crossbeam::channel::{bounded, Receiver};
use parking_lot::Mutex;
use std::sync::Arc;

/// Default capacity of the live feed of a monitor session.
pub const DEFAULT_MONITOR_BUFFER: usize = 1024;

enum MonitorState {
    Idle,
    Running {
        fence: u64,
        live: Receiver<Arc<Invocation>>,
    },
}

/// Scoped window over a ledger, bounded by `start` and `stop`.
pub struct Monitor {
    ledger: Arc<InvocationLedger>,
    buffer: usize,
    state: Mutex<MonitorState>,
}

impl Monitor {
    pub fn new(ledger: Arc<InvocationLedger>, buffer: usize) -> Self {
        Self {
            ledger,
            buffer: buffer.max(1),
            state: Mutex::new(MonitorState::Idle),
        }
    }

    /// Open a session at the current ledger length.
    pub fn start(&self) -> Result<u64> {
        let mut state = self.state.lock();
        if matches!(*state, MonitorState::Running { .. }) {
            return Err(MockError::MonitorAlreadyRunning);
        }
        let (feed, live) = bounded(self.buffer);
        let fence = self.ledger.attach_feed(feed);
        *state = MonitorState::Running { fence, live };
        logging::log_monitor_started(fence);
        Ok(fence)
    }

    /// Close the session and return every entry recorded since its fence.
    pub fn stop(&self) -> Result<MonitorResult> {
        let mut state = self.state.lock();
        let fence = match std::mem::replace(&mut *state, MonitorState::Idle) {
            MonitorState::Running { fence, .. } => fence,
            MonitorState::Idle => return Err(MockError::MonitorNotRunning),
        };
        self.ledger.detach_feed();
        let entries = self.ledger.since(fence);
        logging::log_monitor_stopped(fence, entries.len());
        Ok(MonitorResult { fence, entries })
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), MonitorState::Running { .. })
    }

    /// Drain the entries forwarded to the live feed since the last call.
    ///
    /// The feed is capped; entries recorded while it was full are only
    /// visible in the result of [`Monitor::stop`].
    pub fn recent(&self) -> Vec<Arc<Invocation>> {
        match &*self.state.lock() {
            MonitorState::Running { live, .. } => live.try_iter().collect(),
            MonitorState::Idle => Vec::new(),
        }
    }
}

/// Entries captured by a finished monitor session.
#[derive(Debug, Clone)]
pub struct MonitorResult {
    fence: u64,
    entries: Vec<Arc<Invocation>>,
}

impl MonitorResult {
    /// Ledger length when the session started.
    pub fn fence(&self) -> u64 {
        self.fence
    }

    pub fn entries(&self) -> &[Arc<Invocation>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Interactions for MonitorResult {
    fn interactions(&self) -> Vec<Arc<Invocation>> {
        self.entries.clone()
    }
}
