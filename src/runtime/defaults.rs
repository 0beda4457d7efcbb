use crate::member::MemberId;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// What the mock asks for when no setup supplies a value.
#[derive(Debug, Clone)]
pub struct DefaultRequest<'a> {
    pub member: &'a MemberId,
    /// Name of the type the caller requested.
    pub type_name: &'static str,
    /// The natural default of that type.
    pub type_default: Value,
}

/// Fallback-value policy consulted when no setup applies.
pub trait DefaultValueGenerator: Send + Sync {
    fn generate(&self, request: &DefaultRequest<'_>) -> Value;
}

/// Zero, empty string, `false`, empty list or null, by requested type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeDefaults;

impl DefaultValueGenerator for TypeDefaults {
    fn generate(&self, request: &DefaultRequest<'_>) -> Value {
        request.type_default.clone()
    }
}

/// Always null.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDefaults;

impl DefaultValueGenerator for NullDefaults {
    fn generate(&self, _request: &DefaultRequest<'_>) -> Value {
        Value::Null
    }
}

impl<F> DefaultValueGenerator for F
where
    F: Fn(&DefaultRequest<'_>) -> Value + Send + Sync,
{
    fn generate(&self, request: &DefaultRequest<'_>) -> Value {
        self(request)
    }
}

/// Shared handle to a generator, carried in the mock configuration.
#[derive(Clone)]
pub struct DefaultValues(Arc<dyn DefaultValueGenerator>);

impl DefaultValues {
    pub fn new<G: DefaultValueGenerator + 'static>(generator: G) -> Self {
        Self(Arc::new(generator))
    }

    pub fn generate(&self, request: &DefaultRequest<'_>) -> Value {
        self.0.generate(request)
    }
}

impl Default for DefaultValues {
    fn default() -> Self {
        Self::new(TypeDefaults)
    }
}

impl fmt::Debug for DefaultValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultValues")
    }
}
