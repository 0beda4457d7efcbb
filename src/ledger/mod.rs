//! Globally ordered record of every interaction with a mock.

pub mod monitor;
mod slots;

pub use monitor::{Monitor, MonitorResult};

use crate::logging;
use crate::member::{InteractionKind, MemberId};
use crate::setup::ParameterMatcher;
use crate::value::Value;
use crossbeam::channel::Sender;
use parking_lot::RwLock;
use slots::AppendLog;
use std::sync::Arc;

/// One recorded interaction.
#[derive(Debug, Clone)]
pub struct Invocation {
    index: u64,
    member: MemberId,
    kind: InteractionKind,
    args: Arc<[Value]>,
}

impl Invocation {
    pub fn new(index: u64, member: MemberId, kind: InteractionKind, args: Vec<Value>) -> Self {
        Self {
            index,
            member,
            kind,
            args: Arc::from(args),
        }
    }

    /// Position in the ledger's total order.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn member(&self) -> &MemberId {
        &self.member
    }

    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "index": self.index,
            "member": self.member.name(),
            "kind": self.kind.as_str(),
            "args": self.args.iter().map(Value::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Query surface shared by the ledger and monitor results.
pub trait Interactions {
    /// Index-ordered snapshot of the recorded interactions.
    fn interactions(&self) -> Vec<Arc<Invocation>>;

    /// Interactions of `kind` on `member` whose arguments satisfy `matcher`.
    fn matching(
        &self,
        member: &MemberId,
        kind: InteractionKind,
        matcher: &ParameterMatcher,
    ) -> Vec<Arc<Invocation>> {
        self.interactions()
            .into_iter()
            .filter(|inv| {
                inv.member() == member && inv.kind() == kind && matcher.matches(inv.args())
            })
            .collect()
    }

    fn count_matching(
        &self,
        member: &MemberId,
        kind: InteractionKind,
        matcher: &ParameterMatcher,
    ) -> usize {
        self.matching(member, kind, matcher).len()
    }

    /// Every interaction with `member`, regardless of kind or arguments.
    fn for_member(&self, member: &MemberId) -> Vec<Arc<Invocation>> {
        self.interactions()
            .into_iter()
            .filter(|inv| inv.member() == member)
            .collect()
    }

    fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Array(self.interactions().iter().map(|inv| inv.to_json()).collect())
    }
}

/// Append-only, index-ordered interaction history.
///
/// Each recording reserves its index from one atomic counter and writes its
/// own slot, so storage order equals index order and indices have no gaps.
/// Readers copy the filled prefix without blocking recorders.
pub struct InvocationLedger {
    entries: AppendLog<Arc<Invocation>>,
    /// Live monitor feed. Recorders hold the read side while they record, so
    /// installing a feed waits for in-flight recordings and yields an exact fence.
    feed: RwLock<Option<Sender<Arc<Invocation>>>>,
}

impl Default for InvocationLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InvocationLedger {
    pub fn new() -> Self {
        Self {
            entries: AppendLog::new(),
            feed: RwLock::new(None),
        }
    }

    pub fn record(
        &self,
        member: MemberId,
        kind: InteractionKind,
        args: Vec<Value>,
    ) -> Arc<Invocation> {
        let feed = self.feed.read();
        let index = self.entries.reserve();
        let invocation = Arc::new(Invocation::new(index, member, kind, args));
        self.entries.fill(index, Arc::clone(&invocation));
        if let Some(feed) = feed.as_ref() {
            // A full monitor buffer drops the entry instead of blocking the caller.
            let _ = feed.try_send(Arc::clone(&invocation));
        }
        drop(feed);
        logging::log_recorded(&invocation);
        invocation
    }

    /// Number of completed recordings.
    pub fn len(&self) -> usize {
        usize::try_from(self.entries.filled()).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index the next recording will receive.
    pub fn next_index(&self) -> u64 {
        self.entries.reserved()
    }

    /// Entries recorded at or after ledger index `index`.
    pub fn since(&self, index: u64) -> Vec<Arc<Invocation>> {
        self.entries.snapshot_from(index)
    }

    pub fn get(&self, index: u64) -> Option<Arc<Invocation>> {
        self.entries.get(index).cloned()
    }

    /// Install the monitor feed and return the fence, atomically with respect to recording.
    pub(crate) fn attach_feed(&self, feed: Sender<Arc<Invocation>>) -> u64 {
        let mut slot = self.feed.write();
        *slot = Some(feed);
        self.entries.reserved()
    }

    pub(crate) fn detach_feed(&self) {
        self.feed.write().take();
    }
}

impl Interactions for InvocationLedger {
    fn interactions(&self) -> Vec<Arc<Invocation>> {
        self.entries.snapshot_from(0)
    }
}
