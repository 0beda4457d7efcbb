pub mod defaults;
pub mod indexer_store;
pub mod mocking;

pub use defaults::{DefaultRequest, DefaultValueGenerator, DefaultValues, NullDefaults, TypeDefaults};
pub use indexer_store::IndexerValueStore;
pub use mocking::{DispatchOutcome, Mock, SubscriptionId};
