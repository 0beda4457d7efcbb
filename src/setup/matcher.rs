use crate::value::Value;
use crate::{MockError, Result};
use itertools::Itertools;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

type ArgPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type ListPredicate = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// A predicate over a single argument position.
#[derive(Clone)]
pub struct ArgMatcher {
    description: String,
    predicate: ArgPredicate,
}

impl ArgMatcher {
    /// Matches any value, including null.
    pub fn any() -> Self {
        Self::satisfies("any", |_| true)
    }

    /// Matches values equal to `expected`.
    pub fn eq(expected: impl Into<Value>) -> Self {
        let expected = expected.into();
        let description = format!("{expected:?}");
        Self::satisfies(description, move |v| *v == expected)
    }

    pub fn null() -> Self {
        Self::satisfies("null", Value::is_null)
    }

    pub fn satisfies<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Matches string values against a regular expression.
    pub fn regex(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            MockError::InvalidMatcher(format!("Invalid regex pattern '{}': {}", pattern, e))
        })?;
        Ok(Self::satisfies(format!("re:{}", pattern), move |v| {
            v.as_str().is_some_and(|s| regex.is_match(s))
        }))
    }

    pub fn matches(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }

    pub fn describe(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Decides whether a setup applies to an argument list.
#[derive(Clone)]
pub enum ParameterMatcher {
    /// One matcher per position; the arity must match exactly.
    Fixed(Vec<ArgMatcher>),
    /// Matches any combination of arguments.
    AnyArgs,
    /// A predicate over the whole argument list.
    Predicate(ListPredicate),
}

impl ParameterMatcher {
    pub fn fixed<I: IntoIterator<Item = ArgMatcher>>(matchers: I) -> Self {
        ParameterMatcher::Fixed(matchers.into_iter().collect())
    }

    /// Matches exactly the given argument values.
    pub fn exact<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::fixed(values.into_iter().map(ArgMatcher::eq))
    }

    pub fn none() -> Self {
        ParameterMatcher::Fixed(Vec::new())
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        ParameterMatcher::Predicate(Arc::new(predicate))
    }

    pub fn matches(&self, args: &[Value]) -> bool {
        match self {
            ParameterMatcher::Fixed(matchers) => {
                matchers.len() == args.len()
                    && matchers.iter().zip(args).all(|(m, a)| m.matches(a))
            }
            ParameterMatcher::AnyArgs => true,
            ParameterMatcher::Predicate(predicate) => predicate(args),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ParameterMatcher::Fixed(matchers) => {
                format!("({})", matchers.iter().map(ArgMatcher::describe).join(", "))
            }
            ParameterMatcher::AnyArgs => "(..)".to_string(),
            ParameterMatcher::Predicate(_) => "(<predicate>)".to_string(),
        }
    }
}

impl fmt::Debug for ParameterMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
