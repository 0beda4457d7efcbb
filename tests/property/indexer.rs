use crate::utils::key_tuple;
use mock_dispatch::{IndexerValueStore, Value};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_update_wins_over_later_factory(key in key_tuple(), first in any::<i64>(), written in any::<i64>()) {
        let store = IndexerValueStore::new();
        prop_assert_eq!(store.get_or_create(&key, || Value::from(first)), Value::from(first));
        store.update(&key, Value::from(written));
        prop_assert_eq!(store.get_or_create(&key, || Value::Null), Value::from(written));
        prop_assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_distinct_keys_do_not_interfere(a in key_tuple(), b in key_tuple()) {
        prop_assume!(a != b);
        let store = IndexerValueStore::new();
        store.update(&a, Value::from("a"));
        store.update(&b, Value::from("b"));
        prop_assert_eq!(store.get(&a), Some(Value::from("a")));
        prop_assert_eq!(store.get(&b), Some(Value::from("b")));
    }
}
