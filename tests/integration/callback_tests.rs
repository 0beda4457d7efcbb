use mock_dispatch::{GatedCallback, InteractionKind, Mock, ParameterMatcher, Value};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_gate_fires_on_first_two_even_calls() {
    let mock = Mock::new("Clock");
    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fired);
    mock.setup_method("Tick", ParameterMatcher::AnyArgs).callback_gated(
        GatedCallback::new(move |ctx| sink.lock().push(ctx.invocation.index()))
            .when(|i| i % 2 == 0)
            .for_times(2),
    );

    for _ in 0..6 {
        mock.invoke_method("Tick", vec![]).unwrap();
    }
    assert_eq!(*fired.lock(), vec![0, 2]);
}

#[test]
fn test_ordered_callbacks_see_the_same_call_count() {
    let mock = Mock::new("Clock");
    let fired = Arc::new(Mutex::new(Vec::new()));
    let every = Arc::clone(&fired);
    let odd = Arc::clone(&fired);
    mock.setup_method("Tick", ParameterMatcher::AnyArgs)
        .callback(move |ctx| every.lock().push(format!("A@{}", ctx.invocation.index())))
        .callback_gated(
            GatedCallback::new(move |ctx| odd.lock().push(format!("B@{}", ctx.invocation.index())))
                .when(|i| i % 2 == 1),
        );

    for _ in 0..4 {
        mock.invoke_method("Tick", vec![]).unwrap();
    }
    assert_eq!(*fired.lock(), vec!["A@0", "B@1", "A@2", "B@3"]);
}

#[test]
fn test_only_deactivates_after_limit() {
    let mock = Mock::new("Clock");
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    mock.setup_method("Tick", ParameterMatcher::AnyArgs).callback_gated(
        GatedCallback::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .only(3),
    );

    for _ in 0..10 {
        mock.invoke_method("Tick", vec![]).unwrap();
    }
    assert_eq!(fired.load(Ordering::SeqCst), 3);
}

#[test]
fn test_property_callbacks_filtered_by_kind() {
    let mock = Mock::new("Settings");
    let writes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&writes);
    mock.setup_property("Volume").unwrap().callback_gated(
        GatedCallback::new(move |ctx| sink.lock().push(ctx.args()[0].clone()))
            .on(InteractionKind::PropertySet)
            .in_parallel(),
    );

    mock.set_property("Volume", 3).unwrap();
    mock.get_property::<i64>("Volume").unwrap();
    mock.set_property("Volume", 7).unwrap();
    assert_eq!(*writes.lock(), vec![Value::from(3), Value::from(7)]);
}

#[test]
fn test_callback_can_reenter_the_mock() {
    let mock = Arc::new(Mock::new("Service"));
    let weak = Arc::downgrade(&mock);
    mock.setup_method("Start", ParameterMatcher::none())
        .callback(move |_| {
            if let Some(mock) = weak.upgrade() {
                mock.set_property("Running", true).unwrap();
                mock.invoke_method("Log", vec![Value::from("started")]).unwrap();
            }
        })
        .returns(true);

    assert!(mock.call::<bool>("Start", vec![]).unwrap());
    assert!(mock.get_property::<bool>("Running").unwrap());

    let kinds: Vec<InteractionKind> = mock.interactions().iter().map(|inv| inv.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            InteractionKind::MethodCall,
            InteractionKind::PropertySet,
            InteractionKind::MethodCall,
            InteractionKind::PropertyGet,
        ]
    );
}

#[test]
fn test_reentrant_callbacks_across_threads() {
    let mock = Arc::new(Mock::new("Service"));
    let weak = Arc::downgrade(&mock);
    mock.setup_method("Outer", ParameterMatcher::AnyArgs)
        .callback_gated(
            GatedCallback::new(move |ctx| {
                if let Some(mock) = weak.upgrade() {
                    mock.invoke_method("Inner", ctx.args().to_vec()).unwrap();
                }
            })
            .in_parallel(),
        )
        .returns_with(|inv| inv.args()[0].clone());

    let handles: Vec<_> = (0..8)
        .map(|t: i64| {
            let mock = Arc::clone(&mock);
            thread::spawn(move || {
                for i in 0..50i64 {
                    let value = mock.call::<i64>("Outer", vec![Value::from(t * 100 + i)]).unwrap();
                    assert_eq!(value, t * 100 + i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(mock.ledger().len(), 800);
}

#[test]
fn test_concurrent_for_times_fires_exactly() {
    let mock = Arc::new(Mock::new("Counter"));
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    mock.setup_method("Hit", ParameterMatcher::AnyArgs).callback_gated(
        GatedCallback::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .for_times(25),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mock = Arc::clone(&mock);
            thread::spawn(move || {
                for _ in 0..100 {
                    mock.invoke_method("Hit", vec![]).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(fired.load(Ordering::SeqCst), 25);
}
