//! Predicate gating for setup callbacks.
//!
//! The raw invocation count belongs to the setup: it advances once per
//! dispatch and every callback's `when` predicate sees the same value. Each
//! gate keeps its own `matching_count` of calls that passed `when`, which
//! feeds the repeat limit and advances even when the gate stays closed.
//!
//! Predicates must be pure. The limit predicate is re-evaluated when another
//! caller wins the compare-exchange on the matching counter.

use crate::ledger::Invocation;
use crate::member::{InteractionKind, MemberId};
use crate::value::Value;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type CountPredicate = Arc<dyn Fn(usize) -> bool + Send + Sync>;

pub struct CallbackGate {
    when: Option<CountPredicate>,
    limit: Option<CountPredicate>,
    matching_count: AtomicUsize,
}

impl CallbackGate {
    /// A gate that opens on every call.
    pub fn always() -> Self {
        Self {
            when: None,
            limit: None,
            matching_count: AtomicUsize::new(0),
        }
    }

    /// Only consider calls whose zero-based raw invocation count satisfies `predicate`.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(usize) -> bool + Send + Sync + 'static,
    {
        self.when = Some(Arc::new(predicate));
        self
    }

    /// Fire for the first `times` candidates, then stay silent.
    pub fn for_times(mut self, times: usize) -> Self {
        self.limit = Some(Arc::new(move |matching| matching < times));
        self
    }

    /// Deactivate after `times` fired candidates.
    pub fn only(mut self, times: usize) -> Self {
        self.limit = Some(Arc::new(move |matching| times > matching));
        self
    }

    /// Run both stages for the call with raw count `invocation_count`.
    /// Returns the zero-based fired-count when the gate opens.
    pub fn try_pass(&self, invocation_count: usize) -> Option<usize> {
        if !self.when.as_ref().map_or(true, |when| when(invocation_count)) {
            return None;
        }

        let (matching, open) = advance(&self.matching_count, |count| {
            self.limit.as_ref().map_or(true, |limit| limit(count))
        });
        open.then_some(matching)
    }

    pub fn matching_count(&self) -> usize {
        self.matching_count.load(Ordering::Acquire)
    }
}

impl Default for CallbackGate {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for CallbackGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackGate")
            .field("matching_count", &self.matching_count())
            .finish()
    }
}

/// Evaluate `predicate` against the current counter value and commit the
/// increment with a compare-exchange, retrying when another caller won.
fn advance(counter: &AtomicUsize, predicate: impl Fn(usize) -> bool) -> (usize, bool) {
    let mut current = counter.load(Ordering::Acquire);
    loop {
        let open = predicate(current);
        match counter.compare_exchange_weak(
            current,
            current + 1,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return (current, open),
            Err(actual) => current = actual,
        }
    }
}

/// What a callback sees when it fires.
pub struct CallbackContext<'a> {
    pub invocation: &'a Invocation,
    /// Zero-based raw count of the dispatch on the owning setup.
    pub invocation_count: usize,
    /// Zero-based number of times this callback fired before.
    pub fired_count: usize,
}

impl CallbackContext<'_> {
    pub fn args(&self) -> &[Value] {
        self.invocation.args()
    }

    pub fn arg(&self, position: usize) -> Option<&Value> {
        self.invocation.args().get(position)
    }

    pub fn member(&self) -> &MemberId {
        self.invocation.member()
    }

    pub fn kind(&self) -> InteractionKind {
        self.invocation.kind()
    }
}

type CallbackFn = Arc<dyn Fn(&CallbackContext<'_>) + Send + Sync>;

/// A callback wrapped in its own gate.
pub struct GatedCallback {
    gate: CallbackGate,
    callback: CallbackFn,
    parallel: bool,
    on: Option<InteractionKind>,
}

impl GatedCallback {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&CallbackContext<'_>) + Send + Sync + 'static,
    {
        Self {
            gate: CallbackGate::always(),
            callback: Arc::new(callback),
            parallel: false,
            on: None,
        }
    }

    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(usize) -> bool + Send + Sync + 'static,
    {
        self.gate = self.gate.when(predicate);
        self
    }

    pub fn for_times(mut self, times: usize) -> Self {
        self.gate = self.gate.for_times(times);
        self
    }

    pub fn only(mut self, times: usize) -> Self {
        self.gate = self.gate.only(times);
        self
    }

    /// Fire on every call the gate admits instead of taking turns with the
    /// other ordered callbacks of the setup.
    pub fn in_parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Restrict the callback to one interaction kind, e.g. only property sets.
    pub fn on(mut self, kind: InteractionKind) -> Self {
        self.on = Some(kind);
        self
    }

    pub fn applies_to(&self, kind: InteractionKind) -> bool {
        self.on.map_or(true, |on| on == kind)
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn gate(&self) -> &CallbackGate {
        &self.gate
    }

    /// Evaluate the gate and run the callback when it opens.
    pub fn try_fire(&self, invocation: &Invocation, invocation_count: usize) -> bool {
        match self.gate.try_pass(invocation_count) {
            Some(fired_count) => {
                (self.callback)(&CallbackContext {
                    invocation,
                    invocation_count,
                    fired_count,
                });
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for GatedCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatedCallback")
            .field("gate", &self.gate)
            .field("parallel", &self.parallel)
            .field("on", &self.on)
            .finish()
    }
}
