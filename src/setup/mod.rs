//! Behavior records registered against mocked members.

pub mod gate;
pub mod matcher;
pub mod registry;
pub mod sequencer;

pub use gate::{CallbackContext, CallbackGate, GatedCallback};
pub use matcher::{ArgMatcher, ParameterMatcher};
pub use registry::{SetupId, SetupRegistry};
pub use sequencer::{Response, ResponseSequencer, Thrown};

use crate::ledger::Invocation;
use crate::member::MemberId;
use crate::value::Value;
use crate::{MockError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Whether the proxy should forward the call to the base implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallBase {
    Yes,
    No,
    /// Defer to the mock's configured default.
    #[default]
    Default,
}

impl CallBase {
    pub fn resolve(self, global_default: bool) -> bool {
        match self {
            CallBase::Yes => true,
            CallBase::No => false,
            CallBase::Default => global_default,
        }
    }
}

#[derive(Clone)]
enum Initializer {
    Value(Value),
    Factory(Arc<dyn Fn(&Invocation) -> Value + Send + Sync>),
}

/// A registered behavior for one member.
pub struct Setup {
    member: MemberId,
    matcher: ParameterMatcher,
    responses: ResponseSequencer,
    callbacks: RwLock<Vec<Arc<GatedCallback>>>,
    callback_cursor: AtomicUsize,
    invocation_count: AtomicUsize,
    call_base: RwLock<CallBase>,
    initializer: OnceLock<Initializer>,
    property_value: RwLock<Option<Value>>,
    transient: bool,
}

impl Setup {
    pub fn new(member: MemberId, matcher: ParameterMatcher) -> Self {
        Self {
            member,
            matcher,
            responses: ResponseSequencer::new(),
            callbacks: RwLock::new(Vec::new()),
            callback_cursor: AtomicUsize::new(0),
            invocation_count: AtomicUsize::new(0),
            call_base: RwLock::new(CallBase::Default),
            initializer: OnceLock::new(),
            property_value: RwLock::new(None),
            transient: false,
        }
    }

    /// A setup synthesized for an unconfigured property, seeded with `value`.
    pub(crate) fn default_backed(member: MemberId, value: Value) -> Self {
        let setup = Self {
            transient: true,
            ..Self::new(member, ParameterMatcher::AnyArgs)
        };
        *setup.property_value.write() = Some(value);
        setup
    }

    pub fn member(&self) -> &MemberId {
        &self.member
    }

    pub fn matcher(&self) -> &ParameterMatcher {
        &self.matcher
    }

    pub fn responses(&self) -> &ResponseSequencer {
        &self.responses
    }

    /// True for setups the mock created on its own for a lenient miss.
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn matches(&self, member: &MemberId, args: &[Value]) -> bool {
        self.member == *member && self.matcher.matches(args)
    }

    pub fn returns(&self, value: impl Into<Value>) -> &Self {
        self.responses.push(Response::Literal(value.into()));
        self
    }

    pub fn returns_with<F, V>(&self, factory: F) -> &Self
    where
        F: Fn(&Invocation) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.responses
            .push(Response::Factory(Arc::new(move |inv: &Invocation| -> Value {
                factory(inv).into()
            })));
        self
    }

    pub fn throws<E: Error + Send + Sync + 'static>(&self, error: E) -> &Self {
        self.responses.push(Response::Exception(Thrown::new(error)));
        self
    }

    pub fn throws_with<F>(&self, factory: F) -> &Self
    where
        F: Fn(&Invocation) -> Thrown + Send + Sync + 'static,
    {
        self.responses
            .push(Response::ExceptionFactory(Arc::new(factory)));
        self
    }

    /// Register an ordered, ungated callback.
    pub fn callback<F>(&self, callback: F) -> &Self
    where
        F: Fn(&CallbackContext<'_>) + Send + Sync + 'static,
    {
        self.callback_gated(GatedCallback::new(callback))
    }

    pub fn callback_gated(&self, callback: GatedCallback) -> &Self {
        self.callbacks.write().push(Arc::new(callback));
        self
    }

    pub fn call_base(&self, call_base: CallBase) -> &Self {
        *self.call_base.write() = call_base;
        self
    }

    pub fn call_base_flag(&self) -> CallBase {
        *self.call_base.read()
    }

    pub fn out_parameter(&self, position: usize, value: impl Into<Value>) -> &Self {
        let value = value.into();
        self.responses
            .push_out_parameter(position, Arc::new(move |_: &Invocation| value.clone()));
        self
    }

    pub fn out_parameter_with<F, V>(&self, position: usize, producer: F) -> &Self
    where
        F: Fn(&Invocation) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.responses
            .push_out_parameter(
                position,
                Arc::new(move |inv: &Invocation| -> Value { producer(inv).into() }),
            );
        self
    }

    /// Seed the value a property or indexer slot starts with.
    pub fn initialize_with(&self, value: impl Into<Value>) -> Result<&Self> {
        let value = value.into();
        self.set_initializer(Initializer::Value(value.clone()))?;
        *self.property_value.write() = Some(value);
        Ok(self)
    }

    pub fn initialize_with_factory<F, V>(&self, factory: F) -> Result<&Self>
    where
        F: Fn(&Invocation) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.set_initializer(Initializer::Factory(Arc::new(
            move |inv: &Invocation| -> Value { factory(inv).into() },
        )))?;
        Ok(self)
    }

    fn set_initializer(&self, initializer: Initializer) -> Result<()> {
        self.initializer
            .set(initializer)
            .map_err(|_| MockError::AlreadyInitialized {
                member: self.member.to_string(),
            })
    }

    pub fn is_initialized(&self) -> bool {
        self.initializer.get().is_some()
    }

    /// The initial value for the slot addressed by `invocation`, if one was configured.
    pub fn initial_value(&self, invocation: &Invocation) -> Option<Value> {
        match self.initializer.get()?.clone() {
            Initializer::Value(value) => Some(value),
            Initializer::Factory(factory) => Some(factory(invocation)),
        }
    }

    pub fn property_value(&self) -> Option<Value> {
        self.property_value.read().clone()
    }

    pub fn store_property_value(&self, value: Value) {
        *self.property_value.write() = Some(value);
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Number of dispatches that reached this setup's callbacks.
    pub fn invocation_count(&self) -> usize {
        self.invocation_count.load(Ordering::Acquire)
    }

    /// Run the callbacks the gates admit for this call.
    ///
    /// The raw invocation count advances once per call and is shared by every
    /// callback. Callbacks restricted to another interaction kind are skipped
    /// without touching their gates. Parallel callbacks are evaluated on every
    /// call. Ordered callbacks take turns starting at the cursor: the first one
    /// whose gate opens fires and the cursor moves past it.
    pub fn fire_callbacks(&self, invocation: &Invocation) -> usize {
        let raw = self.invocation_count.fetch_add(1, Ordering::AcqRel);
        let callbacks: Vec<Arc<GatedCallback>> = self.callbacks.read().clone();
        if callbacks.is_empty() {
            return 0;
        }

        let len = callbacks.len();
        let start = self.callback_cursor.load(Ordering::Acquire) % len;
        let mut fired = 0;
        let mut ordered_fired = false;
        for offset in 0..len {
            let position = (start + offset) % len;
            let callback = &callbacks[position];
            if !callback.applies_to(invocation.kind()) {
                continue;
            }
            if callback.is_parallel() {
                if callback.try_fire(invocation, raw) {
                    fired += 1;
                }
            } else if !ordered_fired && callback.try_fire(invocation, raw) {
                ordered_fired = true;
                fired += 1;
                let _ = self.callback_cursor.compare_exchange(
                    start,
                    (position + 1) % len,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
            }
        }
        fired
    }

    /// Produce the response for this call.
    pub fn dispatch(
        &self,
        invocation: &Invocation,
        fallback: impl FnOnce() -> Value,
    ) -> Result<Value> {
        self.responses.dispatch(invocation, fallback)
    }
}

impl fmt::Debug for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setup")
            .field("member", &self.member)
            .field("matcher", &self.matcher)
            .field("responses", &self.responses.len())
            .field("callbacks", &self.callback_count())
            .field("call_base", &self.call_base_flag())
            .field("transient", &self.transient)
            .finish()
    }
}
