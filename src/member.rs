use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The kind of member a setup or invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Property,
    Indexer,
    Event,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemberKind::Method => "method",
            MemberKind::Property => "property",
            MemberKind::Indexer => "indexer",
            MemberKind::Event => "event",
        };
        f.write_str(name)
    }
}

/// The kind of access recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    MethodCall,
    PropertyGet,
    PropertySet,
    IndexerGet,
    IndexerSet,
    EventAdd,
    EventRemove,
}

impl InteractionKind {
    pub fn member_kind(self) -> MemberKind {
        match self {
            InteractionKind::MethodCall => MemberKind::Method,
            InteractionKind::PropertyGet | InteractionKind::PropertySet => MemberKind::Property,
            InteractionKind::IndexerGet | InteractionKind::IndexerSet => MemberKind::Indexer,
            InteractionKind::EventAdd | InteractionKind::EventRemove => MemberKind::Event,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::MethodCall => "method_call",
            InteractionKind::PropertyGet => "property_get",
            InteractionKind::PropertySet => "property_set",
            InteractionKind::IndexerGet => "indexer_get",
            InteractionKind::IndexerSet => "indexer_set",
            InteractionKind::EventAdd => "event_add",
            InteractionKind::EventRemove => "event_remove",
        }
    }
}

/// Qualified member name plus kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberId {
    name: Arc<str>,
    kind: MemberKind,
}

impl MemberId {
    pub fn new(kind: MemberKind, name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            kind,
        }
    }

    pub fn method(name: impl AsRef<str>) -> Self {
        Self::new(MemberKind::Method, name)
    }

    pub fn property(name: impl AsRef<str>) -> Self {
        Self::new(MemberKind::Property, name)
    }

    pub fn indexer(name: impl AsRef<str>) -> Self {
        Self::new(MemberKind::Indexer, name)
    }

    pub fn event(name: impl AsRef<str>) -> Self {
        Self::new(MemberKind::Event, name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}
