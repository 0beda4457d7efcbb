use super::{ParameterMatcher, Setup};
use crate::logging;
use crate::member::{MemberId, MemberKind};
use crate::value::Value;
use crate::{MockError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Handle of a setup inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetupId(usize);

impl SetupId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Per-mock storage of setups.
///
/// Setups live in an append-only arena. Methods and indexers keep
/// registration-ordered handle lists that allow overlaps; properties and
/// events are keyed by name and accept one setup each.
#[derive(Default)]
pub struct SetupRegistry {
    arena: RwLock<Vec<Arc<Setup>>>,
    methods: RwLock<Vec<SetupId>>,
    indexers: RwLock<Vec<SetupId>>,
    properties: RwLock<HashMap<Arc<str>, SetupId>>,
    events: RwLock<HashMap<Arc<str>, SetupId>>,
}

impl SetupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a setup, failing for a second property or event setup under the same name.
    pub fn register(&self, setup: Setup) -> Result<SetupId> {
        let member = setup.member().clone();
        let id = match member.kind() {
            MemberKind::Method => self.push_listed(&self.methods, setup),
            MemberKind::Indexer => self.push_listed(&self.indexers, setup),
            MemberKind::Property => self.register_keyed(&self.properties, setup)?,
            MemberKind::Event => self.register_keyed(&self.events, setup)?,
        };
        logging::log_setup_registered(&member, id.index());
        Ok(id)
    }

    fn push_listed(&self, list: &RwLock<Vec<SetupId>>, setup: Setup) -> SetupId {
        let mut list = list.write();
        let id = self.push(setup);
        list.push(id);
        id
    }

    /// A transient default-backed setup is replaced; any other existing setup is a duplicate.
    fn register_keyed(
        &self,
        map: &RwLock<HashMap<Arc<str>, SetupId>>,
        setup: Setup,
    ) -> Result<SetupId> {
        let mut map = map.write();
        let name: Arc<str> = Arc::from(setup.member().name());
        if let Some(existing) = map.get(&name) {
            let transient = self
                .arena
                .read()
                .get(existing.0)
                .is_some_and(|s| s.is_transient());
            if !transient {
                return Err(MockError::DuplicateSetup {
                    member: setup.member().to_string(),
                });
            }
        }
        let id = self.push(setup);
        map.insert(name, id);
        Ok(id)
    }

    fn push(&self, setup: Setup) -> SetupId {
        let mut arena = self.arena.write();
        arena.push(Arc::new(setup));
        SetupId(arena.len() - 1)
    }

    pub fn register_method(&self, name: &str, matcher: ParameterMatcher) -> Arc<Setup> {
        self.register_listed(MemberId::method(name), matcher)
    }

    pub fn register_indexer(&self, name: &str, matcher: ParameterMatcher) -> Arc<Setup> {
        self.register_listed(MemberId::indexer(name), matcher)
    }

    fn register_listed(&self, member: MemberId, matcher: ParameterMatcher) -> Arc<Setup> {
        let list = match member.kind() {
            MemberKind::Indexer => &self.indexers,
            _ => &self.methods,
        };
        let id = self.push_listed(list, Setup::new(member.clone(), matcher));
        logging::log_setup_registered(&member, id.index());
        self.arena.read()[id.0].clone()
    }

    pub fn register_property(&self, name: &str) -> Result<Arc<Setup>> {
        let id = self.register(Setup::new(MemberId::property(name), ParameterMatcher::AnyArgs))?;
        Ok(self.arena.read()[id.0].clone())
    }

    pub fn register_event(&self, name: &str) -> Result<Arc<Setup>> {
        let id = self.register(Setup::new(MemberId::event(name), ParameterMatcher::AnyArgs))?;
        Ok(self.arena.read()[id.0].clone())
    }

    pub fn setup(&self, id: SetupId) -> Option<Arc<Setup>> {
        self.arena.read().get(id.0).cloned()
    }

    /// Find the most recently registered setup matching the member and arguments.
    ///
    /// Never fails; a miss is `None`.
    pub fn resolve(&self, member: &MemberId, args: &[Value]) -> Option<Arc<Setup>> {
        match member.kind() {
            MemberKind::Method => self.resolve_listed(&self.methods, member, args),
            MemberKind::Indexer => self.resolve_listed(&self.indexers, member, args),
            MemberKind::Property => self.property(member.name()),
            MemberKind::Event => self.event(member.name()),
        }
    }

    fn resolve_listed(
        &self,
        list: &RwLock<Vec<SetupId>>,
        member: &MemberId,
        args: &[Value],
    ) -> Option<Arc<Setup>> {
        // Matchers are user predicates and run after every lock is released.
        let candidates: Vec<Arc<Setup>> = {
            let ids = list.read();
            let arena = self.arena.read();
            ids.iter()
                .rev()
                .map(|id| Arc::clone(&arena[id.0]))
                .filter(|setup| setup.member() == member)
                .collect()
        };
        let resolved = candidates
            .into_iter()
            .find(|setup| setup.matcher().matches(args));
        logging::log_resolution(member, resolved.is_some());
        resolved
    }

    pub fn property(&self, name: &str) -> Option<Arc<Setup>> {
        Self::keyed(&self.properties, name).and_then(|id| self.setup(id))
    }

    pub fn event(&self, name: &str) -> Option<Arc<Setup>> {
        Self::keyed(&self.events, name).and_then(|id| self.setup(id))
    }

    fn keyed(map: &RwLock<HashMap<Arc<str>, SetupId>>, name: &str) -> Option<SetupId> {
        map.read().get(name).copied()
    }

    /// Return the property setup, creating and caching a default-backed one on a miss.
    ///
    /// `init` runs outside every lock; when two callers race, the first
    /// inserted setup wins and both observe it.
    pub fn get_or_create_property(&self, name: &str, init: impl FnOnce() -> Value) -> Arc<Setup> {
        if let Some(existing) = self.property(name) {
            return existing;
        }
        let value = init();
        let id = {
            let mut properties = self.properties.write();
            match properties.get(name) {
                Some(id) => *id,
                None => {
                    let id = self.push(Setup::default_backed(MemberId::property(name), value));
                    properties.insert(Arc::from(name), id);
                    logging::log_default_setup_created(name);
                    id
                }
            }
        };
        self.arena.read()[id.0].clone()
    }

    pub fn len(&self) -> usize {
        self.arena.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
