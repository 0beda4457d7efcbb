use crate::ledger::Invocation;
use crate::value::{FromValue, Value};
use crate::Result;
use parking_lot::RwLock;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A user error produced by a `throws` response.
///
/// It is propagated to the caller exactly as registered.
#[derive(Clone)]
pub struct Thrown(Arc<dyn Error + Send + Sync>);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

impl Thrown {
    pub fn new<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Self(Arc::new(error))
    }

    /// A plain message error.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    pub fn inner(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl Error for Thrown {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

type ValueFactory = Arc<dyn Fn(&Invocation) -> Value + Send + Sync>;
type ThrownFactory = Arc<dyn Fn(&Invocation) -> Thrown + Send + Sync>;

/// One entry of a response sequence.
#[derive(Clone)]
pub enum Response {
    Literal(Value),
    Factory(ValueFactory),
    Exception(Thrown),
    ExceptionFactory(ThrownFactory),
}

impl Response {
    pub fn produce(&self, invocation: &Invocation) -> Result<Value> {
        match self {
            Response::Literal(value) => Ok(value.clone()),
            Response::Factory(factory) => Ok(factory(invocation)),
            Response::Exception(thrown) => Err(thrown.clone().into()),
            Response::ExceptionFactory(factory) => Err(factory(invocation).into()),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Literal(value) => write!(f, "Literal({value:?})"),
            Response::Factory(_) => f.write_str("Factory"),
            Response::Exception(thrown) => write!(f, "Exception({thrown})"),
            Response::ExceptionFactory(_) => f.write_str("ExceptionFactory"),
        }
    }
}

/// Round-robin replay of registered responses.
///
/// The cursor advances once per dispatch and selects `cursor % len`.
#[derive(Default)]
pub struct ResponseSequencer {
    responses: RwLock<Vec<Response>>,
    out_parameters: RwLock<Vec<(usize, ValueFactory)>>,
    cursor: AtomicUsize,
}

impl ResponseSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Response) {
        self.responses.write().push(response);
    }

    pub fn push_out_parameter(&self, position: usize, producer: ValueFactory) {
        self.out_parameters.write().push((position, producer));
    }

    pub fn len(&self) -> usize {
        self.responses.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.read().is_empty()
    }

    /// Number of dispatches that consumed a response.
    pub fn dispatch_count(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Produce the next response, or `fallback()` when nothing is registered.
    pub fn dispatch(
        &self,
        invocation: &Invocation,
        fallback: impl FnOnce() -> Value,
    ) -> Result<Value> {
        let selected = {
            let responses = self.responses.read();
            if responses.is_empty() {
                None
            } else {
                let cursor = self.cursor.fetch_add(1, Ordering::AcqRel);
                Some(responses[cursor % responses.len()].clone())
            }
        };
        match selected {
            Some(response) => response.produce(invocation),
            None => Ok(fallback()),
        }
    }

    /// Typed dispatch. The type check runs on the produced value only.
    pub fn dispatch_as<T: FromValue>(
        &self,
        invocation: &Invocation,
        fallback: impl FnOnce() -> Value,
    ) -> Result<T> {
        self.dispatch(invocation, fallback)?.into_typed()
    }

    /// Evaluate the out/ref parameter overrides for this call.
    pub fn out_parameters(&self, invocation: &Invocation) -> Vec<(usize, Value)> {
        let producers: Vec<(usize, ValueFactory)> = self.out_parameters.read().clone();
        producers
            .into_iter()
            .map(|(position, producer)| (position, producer(invocation)))
            .collect()
    }
}

impl fmt::Debug for ResponseSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSequencer")
            .field("responses", &*self.responses.read())
            .field("cursor", &self.dispatch_count())
            .finish()
    }
}
