use mock_dispatch::{
    InteractionKind, Interactions, MemberId, Mock, MockConfig, MockError, ParameterMatcher, Value,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

#[test]
fn test_sequential_calls_get_dense_indices() {
    let mock = Mock::new("Clock");
    let indices: Vec<u64> = (0..10)
        .map(|_| mock.invoke_method("Tick", vec![]).unwrap().index)
        .collect();
    assert_eq!(indices, (0..10).collect::<Vec<u64>>());
}

#[test]
fn test_concurrent_calls_form_a_permutation() {
    let mock = Arc::new(Mock::new("Clock"));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let mock = Arc::clone(&mock);
            thread::spawn(move || {
                (0..200)
                    .map(|_| mock.invoke_method("Tick", vec![]).unwrap().index)
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut seen = BTreeSet::new();
    for handle in handles {
        let local = handle.join().unwrap();
        assert!(local.windows(2).all(|pair| pair[0] < pair[1]));
        seen.extend(local);
    }
    assert_eq!(seen.len(), 1200);
    assert_eq!(seen.iter().copied().collect::<Vec<u64>>(), (0..1200).collect::<Vec<u64>>());

    let stored: Vec<u64> = mock.interactions().iter().map(|inv| inv.index()).collect();
    assert_eq!(stored, (0..1200).collect::<Vec<u64>>());
}

#[test]
fn test_monitor_window() {
    let mock = Mock::new("Mailer");
    for _ in 0..5 {
        mock.invoke_method("Ping", vec![]).unwrap();
    }

    assert_eq!(mock.monitor().start().unwrap(), 5);
    mock.invoke_method("Send", vec![Value::from("a")]).unwrap();
    mock.set_property("Retries", 2).unwrap();
    mock.invoke_method("Send", vec![Value::from("b")]).unwrap();
    assert!(matches!(
        mock.monitor().start(),
        Err(MockError::MonitorAlreadyRunning)
    ));

    let result = mock.monitor().stop().unwrap();
    let indices: Vec<u64> = result.entries().iter().map(|inv| inv.index()).collect();
    assert_eq!(indices, vec![5, 6, 7]);
    assert_eq!(
        result.count_matching(
            &MemberId::method("Send"),
            InteractionKind::MethodCall,
            &ParameterMatcher::AnyArgs,
        ),
        2
    );

    mock.invoke_method("Ping", vec![]).unwrap();
    assert_eq!(result.len(), 3);
    assert!(matches!(mock.monitor().stop(), Err(MockError::MonitorNotRunning)));
}

#[test]
fn test_monitor_recent_drains_live_feed() {
    let mut config = MockConfig::lenient();
    config.behavior.monitor_buffer = 2;
    let mock = Mock::with_config("Mailer", config);

    mock.monitor().start().unwrap();
    for _ in 0..4 {
        mock.invoke_method("Send", vec![]).unwrap();
    }
    assert_eq!(mock.monitor().recent().len(), 2);
    mock.invoke_method("Send", vec![]).unwrap();
    assert_eq!(mock.monitor().recent().len(), 1);
    assert_eq!(mock.monitor().stop().unwrap().len(), 5);
}

#[test]
fn test_event_subscriptions_are_recorded() {
    let mock = Mock::with_config("Button", MockConfig::strict());
    mock.setup_event("Clicked").unwrap();
    let clicks = Arc::new(parking_lot::Mutex::new(0));
    let counter = Arc::clone(&clicks);
    let id = mock
        .subscribe("Clicked", move |args| {
            *counter.lock() += args.len();
        })
        .unwrap();

    assert_eq!(mock.raise("Clicked", &[Value::from(1), Value::from(2)]), 1);
    assert!(mock.unsubscribe("Clicked", id).unwrap());
    assert!(!mock.unsubscribe("Clicked", id).unwrap());
    assert_eq!(mock.raise("Clicked", &[]), 0);
    assert_eq!(*clicks.lock(), 2);

    let kinds: Vec<InteractionKind> = mock
        .ledger()
        .for_member(&MemberId::event("Clicked"))
        .iter()
        .map(|inv| inv.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            InteractionKind::EventAdd,
            InteractionKind::EventRemove,
            InteractionKind::EventRemove,
        ]
    );
}

#[test]
fn test_strict_subscribe_without_setup_fails() {
    let mock = Mock::with_config("Button", MockConfig::strict());
    assert!(matches!(
        mock.subscribe("Clicked", |_| {}),
        Err(MockError::NotSetup { .. })
    ));
    assert_eq!(mock.subscriber_count("Clicked"), 0);
    assert_eq!(mock.raise("Clicked", &[]), 0);

    let lenient = Mock::new("Button");
    let id = lenient.subscribe("Clicked", |_| {}).unwrap();
    assert!(lenient.unsubscribe("Clicked", id).unwrap());
}

#[test]
fn test_ledger_exports_json() {
    let mock = Mock::new("Repo");
    mock.invoke_method("Find", vec![Value::from(7)]).unwrap();
    let json = mock.ledger().to_json_value();
    assert_eq!(json[0]["member"], "Find");
    assert_eq!(json[0]["kind"], "method_call");
    assert_eq!(json[0]["args"][0], 7);
}
