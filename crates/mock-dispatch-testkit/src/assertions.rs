use itertools::Itertools;
use mock_dispatch::{InteractionKind, Interactions, Invocation, MemberId, ParameterMatcher};
use std::fmt;
use std::sync::Arc;

/// Expected number of matching interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    Never,
    Once,
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
}

impl Times {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Times::Never => count == 0,
            Times::Once => count == 1,
            Times::Exactly(n) => count == n,
            Times::AtLeast(n) => count >= n,
            Times::AtMost(n) => count <= n,
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Times::Never => f.write_str("never"),
            Times::Once => f.write_str("exactly once"),
            Times::Exactly(n) => write!(f, "exactly {n} times"),
            Times::AtLeast(n) => write!(f, "at least {n} times"),
            Times::AtMost(n) => write!(f, "at most {n} times"),
        }
    }
}

/// Panicking verification helpers over a ledger or a monitor result.
pub struct CallAssertions<'a, I: Interactions> {
    source: &'a I,
}

impl<'a, I: Interactions> CallAssertions<'a, I> {
    pub fn new(source: &'a I) -> Self {
        Self { source }
    }

    /// Assert how often `member` saw a `kind` interaction matching `matcher`.
    /// Returns the matching interactions in ledger order.
    pub fn assert_called(
        &self,
        member: &MemberId,
        kind: InteractionKind,
        matcher: &ParameterMatcher,
        times: Times,
    ) -> Vec<Arc<Invocation>> {
        let hits = self.source.matching(member, kind, matcher);
        assert!(
            times.accepts(hits.len()),
            "expected {} {}{} {}, but it happened {} times. Recorded: [{}]",
            member,
            kind.as_str(),
            matcher.describe(),
            times,
            hits.len(),
            describe_all(&self.source.for_member(member))
        );
        hits
    }

    pub fn assert_method_called(&self, method: &str, matcher: &ParameterMatcher, times: Times) {
        self.assert_called(
            &MemberId::method(method),
            InteractionKind::MethodCall,
            matcher,
            times,
        );
    }

    pub fn assert_never_called(&self, member: &MemberId) {
        let seen = self.source.for_member(member);
        assert!(
            seen.is_empty(),
            "expected no interaction with {}, found [{}]",
            member,
            describe_all(&seen)
        );
    }

    /// Assert that the given interactions happened in this relative order.
    /// Other interactions may be interleaved.
    pub fn assert_in_order(&self, expected: &[(MemberId, InteractionKind)]) {
        let recorded = self.source.interactions();
        let mut remaining = recorded.iter();
        for (member, kind) in expected {
            let found = remaining
                .by_ref()
                .any(|inv| inv.member() == member && inv.kind() == *kind);
            assert!(
                found,
                "expected {} {} in order {:?}, recorded: [{}]",
                member,
                kind.as_str(),
                expected
                    .iter()
                    .map(|(m, k)| format!("{} {}", m, k.as_str()))
                    .collect::<Vec<_>>(),
                describe_all(&recorded)
            );
        }
    }
}

fn describe_all(invocations: &[Arc<Invocation>]) -> String {
    invocations
        .iter()
        .map(|inv| format!("#{} {}{:?}", inv.index(), inv.member(), inv.args()))
        .join(", ")
}
