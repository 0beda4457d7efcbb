use crate::fixtures::{FixtureError, FixtureLoader};
use mock_dispatch::{DefaultValueGenerator, Mock, MockConfig, ParameterMatcher, Value};
use serde_json::Value as Json;

type Step = Box<dyn FnOnce(&Mock) -> Result<(), FixtureError>>;

/// Fluent construction of a configured [`Mock`].
pub struct MockBuilder {
    name: String,
    config: MockConfig,
    steps: Vec<Step>,
}

impl MockBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            config: MockConfig::default(),
            steps: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.config = config;
        self
    }

    pub fn strict(mut self) -> Self {
        self.config.behavior.throw_when_not_setup = true;
        self
    }

    pub fn call_base_class(mut self, call_base_class: bool) -> Self {
        self.config.behavior.call_base_class = call_base_class;
        self
    }

    pub fn with_default_values<G: DefaultValueGenerator + 'static>(mut self, generator: G) -> Self {
        self.config = self.config.with_default_values(generator);
        self
    }

    /// Register a method setup that always returns `value`.
    pub fn with_method_return(
        mut self,
        method: &str,
        matcher: ParameterMatcher,
        value: impl Into<Value>,
    ) -> Self {
        let method = method.to_string();
        let value = value.into();
        self.steps.push(Box::new(move |mock| {
            mock.setup_method(&method, matcher).returns(value);
            Ok(())
        }));
        self
    }

    /// Register an initialized property setup.
    pub fn with_property(mut self, property: &str, value: impl Into<Value>) -> Self {
        let property = property.to_string();
        let value = value.into();
        self.steps.push(Box::new(move |mock| {
            mock.setup_property(&property)?.initialize_with(value)?;
            Ok(())
        }));
        self
    }

    /// Write an indexer slot without registering a setup.
    pub fn with_indexer_value(mut self, indexer: &str, key: Vec<Value>, value: impl Into<Value>) -> Self {
        let indexer = indexer.to_string();
        let value = value.into();
        self.steps.push(Box::new(move |mock| {
            mock.indexer_store(&indexer).update(&key, value);
            Ok(())
        }));
        self
    }

    pub fn with_properties_json(mut self, json: Json) -> Self {
        self.steps.push(Box::new(move |mock| {
            FixtureLoader::populate_properties(mock, &json).map(|_| ())
        }));
        self
    }

    pub fn with_indexer_json(mut self, indexer: &str, json: Json) -> Self {
        let indexer = indexer.to_string();
        self.steps.push(Box::new(move |mock| {
            FixtureLoader::populate_indexer(mock, &indexer, &json).map(|_| ())
        }));
        self
    }

    /// Apply every step in order. The first failing step aborts the build.
    pub fn build(self) -> Result<Mock, FixtureError> {
        let mock = Mock::with_config(&self.name, self.config);
        for step in self.steps {
            step(&mock)?;
        }
        Ok(mock)
    }
}
