//! The dispatch facade a proxy calls for every intercepted member access.

use crate::config::MockConfig;
use crate::ledger::{Interactions, Invocation, InvocationLedger, Monitor};
use crate::logging;
use crate::member::{InteractionKind, MemberId};
use crate::runtime::defaults::DefaultRequest;
use crate::runtime::indexer_store::IndexerValueStore;
use crate::setup::{ParameterMatcher, Setup, SetupRegistry};
use crate::value::{FromValue, Value};
use crate::{MockError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What the proxy needs to complete an intercepted call.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Whether an explicit setup handled the call.
    pub matched: bool,
    pub value: Value,
    /// Out/ref parameter overrides as `(position, value)`.
    pub out_parameters: Vec<(usize, Value)>,
    /// Whether the proxy should forward the call to the base implementation.
    pub call_base: bool,
    /// Ledger index of the recorded call.
    pub index: u64,
}

/// Handle returned by [`Mock::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type EventHandler = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// A simulated object: setups, value stores and the interaction ledger of one mock.
///
/// All operations take `&self`; a mock may be shared across threads and
/// re-entered from its own callbacks.
pub struct Mock {
    name: Arc<str>,
    config: MockConfig,
    registry: SetupRegistry,
    ledger: Arc<InvocationLedger>,
    monitor: Monitor,
    indexers: RwLock<HashMap<Arc<str>, Arc<IndexerValueStore>>>,
    subscriptions: RwLock<HashMap<Arc<str>, Vec<(SubscriptionId, EventHandler)>>>,
    next_subscription: AtomicU64,
}

impl Mock {
    pub fn new(name: &str) -> Self {
        Self::with_config(name, MockConfig::default())
    }

    pub fn with_config(name: &str, config: MockConfig) -> Self {
        let ledger = Arc::new(InvocationLedger::new());
        let monitor = Monitor::new(Arc::clone(&ledger), config.behavior.monitor_buffer);
        Self {
            name: Arc::from(name),
            config,
            registry: SetupRegistry::new(),
            ledger,
            monitor,
            indexers: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    pub fn registry(&self) -> &SetupRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &Arc<InvocationLedger> {
        &self.ledger
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    // ---- setup -------------------------------------------------------------

    pub fn setup_method(&self, name: &str, matcher: ParameterMatcher) -> Arc<Setup> {
        self.registry.register_method(name, matcher)
    }

    pub fn setup_indexer(&self, name: &str, matcher: ParameterMatcher) -> Arc<Setup> {
        self.registry.register_indexer(name, matcher)
    }

    pub fn setup_property(&self, name: &str) -> Result<Arc<Setup>> {
        self.registry.register_property(name)
    }

    pub fn setup_event(&self, name: &str) -> Result<Arc<Setup>> {
        self.registry.register_event(name)
    }

    // ---- methods -----------------------------------------------------------

    /// Dispatch a method call and return the raw outcome.
    pub fn invoke_method(&self, name: &str, args: Vec<Value>) -> Result<DispatchOutcome> {
        self.dispatch_method(
            name,
            args,
            <Value as FromValue>::type_name(),
            <Value as FromValue>::type_default(),
        )
    }

    /// Dispatch a method call and convert its result to `T`.
    pub fn call<T: FromValue>(&self, name: &str, args: Vec<Value>) -> Result<T> {
        self.dispatch_method(name, args, T::type_name(), T::type_default())?
            .value
            .into_typed()
    }

    fn dispatch_method(
        &self,
        name: &str,
        args: Vec<Value>,
        type_name: &'static str,
        type_default: Value,
    ) -> Result<DispatchOutcome> {
        let member = MemberId::method(name);
        let invocation = self
            .ledger
            .record(member.clone(), InteractionKind::MethodCall, args);

        let Some(setup) = self.registry.resolve(&member, invocation.args()) else {
            let value = self.miss(&member, type_name, type_default)?;
            logging::log_dispatch(&member, invocation.index(), false);
            return Ok(DispatchOutcome {
                matched: false,
                value,
                out_parameters: Vec::new(),
                call_base: self.config.behavior.call_base_class,
                index: invocation.index(),
            });
        };

        setup.fire_callbacks(&invocation);
        let value = setup.dispatch(&invocation, || {
            self.generate_default(&member, type_name, type_default)
        })?;
        logging::log_dispatch(&member, invocation.index(), true);
        Ok(DispatchOutcome {
            matched: true,
            value,
            out_parameters: setup.responses().out_parameters(&invocation),
            call_base: setup
                .call_base_flag()
                .resolve(self.config.behavior.call_base_class),
            index: invocation.index(),
        })
    }

    // ---- properties --------------------------------------------------------

    pub fn get_property<T: FromValue>(&self, name: &str) -> Result<T> {
        self.read_property(name, T::type_name(), T::type_default())?
            .into_typed()
    }

    pub fn get_property_value(&self, name: &str) -> Result<Value> {
        self.read_property(
            name,
            <Value as FromValue>::type_name(),
            <Value as FromValue>::type_default(),
        )
    }

    fn read_property(
        &self,
        name: &str,
        type_name: &'static str,
        type_default: Value,
    ) -> Result<Value> {
        let member = MemberId::property(name);
        let invocation = self
            .ledger
            .record(member.clone(), InteractionKind::PropertyGet, Vec::new());
        let setup = self.property_setup(&member, || {
            self.generate_default(&member, type_name, type_default.clone())
        })?;

        setup.fire_callbacks(&invocation);
        if !setup.responses().is_empty() {
            return setup.dispatch(&invocation, || Value::Null);
        }
        Ok(setup
            .property_value()
            .unwrap_or_else(|| self.generate_default(&member, type_name, type_default)))
    }

    pub fn set_property(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let member = MemberId::property(name);
        let invocation = self.ledger.record(
            member.clone(),
            InteractionKind::PropertySet,
            vec![value.clone()],
        );
        let setup = self.property_setup(&member, || value.clone())?;
        setup.store_property_value(value);
        setup.fire_callbacks(&invocation);
        Ok(())
    }

    /// The explicit setup, or in lenient mode a cached default-backed one.
    fn property_setup(&self, member: &MemberId, init: impl FnOnce() -> Value) -> Result<Arc<Setup>> {
        if let Some(setup) = self.registry.property(member.name()) {
            return Ok(setup);
        }
        if self.config.is_strict() {
            logging::log_not_setup(member);
            return Err(MockError::NotSetup {
                member: member.to_string(),
            });
        }
        Ok(self.registry.get_or_create_property(member.name(), init))
    }

    // ---- indexers ----------------------------------------------------------

    pub fn get_indexer<T: FromValue>(&self, name: &str, key: Vec<Value>) -> Result<T> {
        self.read_indexer(name, key, T::type_name(), T::type_default())?
            .into_typed()
    }

    pub fn get_indexer_value(&self, name: &str, key: Vec<Value>) -> Result<Value> {
        self.read_indexer(
            name,
            key,
            <Value as FromValue>::type_name(),
            <Value as FromValue>::type_default(),
        )
    }

    fn read_indexer(
        &self,
        name: &str,
        key: Vec<Value>,
        type_name: &'static str,
        type_default: Value,
    ) -> Result<Value> {
        let member = MemberId::indexer(name);
        let invocation = self
            .ledger
            .record(member.clone(), InteractionKind::IndexerGet, key);
        let store = self.indexer_store(name);

        match self.registry.resolve(&member, invocation.args()) {
            Some(setup) => {
                setup.fire_callbacks(&invocation);
                if !setup.responses().is_empty() {
                    return setup.dispatch(&invocation, || Value::Null);
                }
                Ok(store.get_or_create(invocation.args(), || {
                    setup.initial_value(&invocation).unwrap_or_else(|| {
                        self.generate_default(&member, type_name, type_default)
                    })
                }))
            }
            None => {
                if let Some(stored) = store.get(invocation.args()) {
                    return Ok(stored);
                }
                let value = self.miss(&member, type_name, type_default)?;
                Ok(store.get_or_create(invocation.args(), || value))
            }
        }
    }

    /// Write an indexer slot. The matching setup's callbacks see the key
    /// followed by the written value.
    pub fn set_indexer(&self, name: &str, key: Vec<Value>, value: impl Into<Value>) {
        let value = value.into();
        let member = MemberId::indexer(name);
        let mut args = key;
        args.push(value.clone());
        let invocation = self
            .ledger
            .record(member.clone(), InteractionKind::IndexerSet, args);

        let key = &invocation.args()[..invocation.args().len() - 1];
        self.indexer_store(name).update(key, value);
        if let Some(setup) = self.registry.resolve(&member, key) {
            setup.fire_callbacks(&invocation);
        }
    }

    /// The value store backing indexer `name`.
    pub fn indexer_store(&self, name: &str) -> Arc<IndexerValueStore> {
        if let Some(store) = self.indexers.read().get(name) {
            return Arc::clone(store);
        }
        let mut indexers = self.indexers.write();
        Arc::clone(indexers.entry(Arc::from(name)).or_default())
    }

    // ---- events ------------------------------------------------------------

    /// Add an event handler. A strict mock without a setup for `event`
    /// records the attempt and fails with `NotSetup`.
    pub fn subscribe<F>(&self, event: &str, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::AcqRel));
        self.record_event(event, InteractionKind::EventAdd, id)?;
        self.subscriptions
            .write()
            .entry(Arc::from(event))
            .or_default()
            .push((id, Arc::new(handler)));
        Ok(id)
    }

    /// Remove a subscription. Returns whether it was present.
    pub fn unsubscribe(&self, event: &str, id: SubscriptionId) -> Result<bool> {
        self.record_event(event, InteractionKind::EventRemove, id)?;
        let mut subscriptions = self.subscriptions.write();
        Ok(match subscriptions.get_mut(event) {
            Some(handlers) => {
                let before = handlers.len();
                handlers.retain(|(existing, _)| *existing != id);
                handlers.len() != before
            }
            None => false,
        })
    }

    fn record_event(&self, event: &str, kind: InteractionKind, id: SubscriptionId) -> Result<()> {
        let member = MemberId::event(event);
        let invocation = self
            .ledger
            .record(member.clone(), kind, vec![Value::UInt(id.0)]);
        match self.registry.event(event) {
            Some(setup) => {
                setup.fire_callbacks(&invocation);
                Ok(())
            }
            None if self.config.is_strict() => {
                logging::log_not_setup(&member);
                Err(MockError::NotSetup {
                    member: member.to_string(),
                })
            }
            None => Ok(()),
        }
    }

    /// Invoke every current subscriber of `event`. Returns how many ran.
    pub fn raise(&self, event: &str, args: &[Value]) -> usize {
        let handlers: Vec<EventHandler> = self
            .subscriptions
            .read()
            .get(event)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        for handler in &handlers {
            handler(args);
        }
        logging::log_event_raised(event, handlers.len());
        handlers.len()
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.subscriptions.read().get(event).map_or(0, Vec::len)
    }

    // ---- verification ------------------------------------------------------

    /// Index-ordered snapshot of every recorded interaction.
    pub fn interactions(&self) -> Vec<Arc<Invocation>> {
        self.ledger.interactions()
    }

    // ---- defaults ----------------------------------------------------------

    fn miss(&self, member: &MemberId, type_name: &'static str, type_default: Value) -> Result<Value> {
        if self.config.is_strict() {
            logging::log_not_setup(member);
            return Err(MockError::NotSetup {
                member: member.to_string(),
            });
        }
        logging::log_not_setup_fallback(member);
        Ok(self.generate_default(member, type_name, type_default))
    }

    fn generate_default(&self, member: &MemberId, type_name: &'static str, type_default: Value) -> Value {
        self.config.default_values.generate(&DefaultRequest {
            member,
            type_name,
            type_default,
        })
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mock")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("setups", &self.registry.len())
            .field("interactions", &self.ledger.len())
            .finish()
    }
}
