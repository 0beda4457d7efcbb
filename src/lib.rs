pub mod config;
pub mod ledger;
pub mod logging;
pub mod member;
pub mod runtime;
pub mod setup;
pub mod value;
use miette::Diagnostic;

pub use config::{MockBehavior, MockConfig};
pub use ledger::{Interactions, Invocation, InvocationLedger, Monitor, MonitorResult};
pub use member::{InteractionKind, MemberId, MemberKind};
pub use runtime::defaults::{
    DefaultRequest, DefaultValueGenerator, DefaultValues, NullDefaults, TypeDefaults,
};
pub use runtime::indexer_store::IndexerValueStore;
pub use runtime::mocking::{DispatchOutcome, Mock, SubscriptionId};
pub use setup::{
    ArgMatcher, CallBase, CallbackContext, CallbackGate, GatedCallback, ParameterMatcher,
    Response, ResponseSequencer, Setup, SetupId, SetupRegistry, Thrown,
};
pub use value::{FromValue, Value};

/// Result type alias for the dispatch core
pub type Result<T> = std::result::Result<T, MockError>;

/// Error types raised by the dispatch core
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum MockError {
    #[error("No setup found for {member} and the mock is strict")]
    #[diagnostic(
        code(mock::not_setup),
        help("Register a setup for this member, or construct the mock with `throw_when_not_setup = false`.")
    )]
    NotSetup { member: String },

    #[error("A setup for {member} is already registered")]
    #[diagnostic(
        code(mock::duplicate_setup),
        help("Properties and events accept a single setup per name. Configure the existing setup instead.")
    )]
    DuplicateSetup { member: String },

    #[error("The setup for {member} is already initialized")]
    #[diagnostic(
        code(mock::already_initialized),
        help("`initialize_with` may only be called once per property or indexer setup.")
    )]
    AlreadyInitialized { member: String },

    #[error("The registered response of type {actual} is not compatible with the requested type {expected}")]
    #[diagnostic(
        code(mock::type_mismatch),
        help("Register responses whose type matches the type requested by the caller.")
    )]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("A monitor session is already running on this mock")]
    #[diagnostic(
        code(mock::monitor_already_running),
        help("Stop the running session before starting a new one.")
    )]
    MonitorAlreadyRunning,

    #[error("No monitor session is running on this mock")]
    #[diagnostic(code(mock::monitor_not_running))]
    MonitorNotRunning,

    #[error("Invalid parameter matcher: {0}")]
    #[diagnostic(code(mock::invalid_matcher))]
    InvalidMatcher(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(mock::config_error),
        help("Check that the configuration file exists and is valid TOML.")
    )]
    Config(String),

    /// An error produced by a registered `throws` response, passed through unchanged.
    #[error(transparent)]
    Thrown(#[from] Thrown),
}

impl MockError {
    /// The user error carried by a `throws` response, if this is one.
    pub fn thrown(&self) -> Option<&Thrown> {
        match self {
            MockError::Thrown(thrown) => Some(thrown),
            _ => None,
        }
    }
}
