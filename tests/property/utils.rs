use mock_dispatch::Value;
use proptest::prelude::*;

/// Scalar values usable as arguments and keys.
pub fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ]
}

pub fn key_tuple() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(scalar_value(), 0..4)
}
