//! Structured logging helpers for the dispatch core.
//!
//! Every event goes through `tracing`; installing a subscriber is up to the
//! host test binary, or [`init`] for a ready-made one.

use crate::ledger::Invocation;
use crate::member::MemberId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable that overrides the filter passed to [`init`].
pub const LOG_ENV: &str = "MOCK_DISPATCH_LOG";

/// Install a global subscriber. Later calls are no-ops.
pub fn init(level: &str, json: bool) {
    let fallback_filter = format!("mock_dispatch={}", level);
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| fallback_filter.into());

    let result = if json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);
        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
    };
    if result.is_err() {
        tracing::trace!("Subscriber already installed");
    }
}

/// Log setup registration.
pub fn log_setup_registered(member: &MemberId, setup_index: usize) {
    tracing::debug!(member = %member, setup_index, "Setup registered");
}

/// Log the outcome of resolving a call against the registry.
pub fn log_resolution(member: &MemberId, found: bool) {
    tracing::trace!(member = %member, found, "Setup resolution");
}

pub fn log_default_setup_created(property: &str) {
    tracing::debug!(property, "Default-backed property setup created");
}

/// Log a recorded interaction.
pub fn log_recorded(invocation: &Invocation) {
    tracing::trace!(
        index = invocation.index(),
        member = %invocation.member(),
        kind = invocation.kind().as_str(),
        args = invocation.args().len(),
        "Interaction recorded"
    );
}

/// Log a completed dispatch.
pub fn log_dispatch(member: &MemberId, index: u64, matched: bool) {
    tracing::debug!(member = %member, index, matched, "Dispatched");
}

/// Log a lenient miss answered with a generated default.
pub fn log_not_setup_fallback(member: &MemberId) {
    tracing::warn!(member = %member, "No setup found, returning default value");
}

/// Log a strict miss.
pub fn log_not_setup(member: &MemberId) {
    tracing::debug!(member = %member, "No setup found for strict mock");
}

pub fn log_monitor_started(fence: u64) {
    tracing::debug!(fence, "Monitor session started");
}

pub fn log_monitor_stopped(fence: u64, captured: usize) {
    tracing::debug!(fence, captured, "Monitor session stopped");
}

/// Log an event raised to subscribers.
pub fn log_event_raised(event: &str, subscribers: usize) {
    tracing::debug!(event, subscribers, "Event raised");
}
