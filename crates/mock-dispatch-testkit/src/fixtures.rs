use mock_dispatch::{Mock, MockError, Value};
use serde_json::Value as Json;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Fixture must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error(transparent)]
    Mock(#[from] MockError),
}

/// Seeds mock state from JSON documents.
pub struct FixtureLoader;

impl FixtureLoader {
    /// Register one initialized property setup per key of `json`.
    pub fn populate_properties(mock: &Mock, json: &Json) -> Result<usize, FixtureError> {
        let object = json
            .as_object()
            .ok_or_else(|| FixtureError::NotAnObject(json.to_string()))?;
        for (name, value) in object {
            mock.setup_property(name)?
                .initialize_with(Value::from_json(value))?;
        }
        Ok(object.len())
    }

    /// Write one indexer slot per key of `json`.
    ///
    /// Keys become single string arguments. A key holding a JSON array of the
    /// form `[[k1, k2, ...], value]` under `"$slots"` writes multi-argument slots.
    pub fn populate_indexer(mock: &Mock, indexer: &str, json: &Json) -> Result<usize, FixtureError> {
        let object = json
            .as_object()
            .ok_or_else(|| FixtureError::NotAnObject(json.to_string()))?;
        let store = mock.indexer_store(indexer);
        let mut written = 0;
        for (key, value) in object {
            if key == "$slots" {
                for slot in value.as_array().into_iter().flatten() {
                    if let Some([Json::Array(parts), value]) = slot.as_array().map(Vec::as_slice) {
                        let parts: Vec<Value> = parts.iter().map(Value::from_json).collect();
                        store.update(&parts, Value::from_json(value));
                        written += 1;
                    }
                }
                continue;
            }
            store.update(&[Value::str(key)], Value::from_json(value));
            written += 1;
        }
        Ok(written)
    }
}
