use mock_dispatch::{
    ArgMatcher, CallBase, DefaultRequest, Mock, MockConfig, MockError, NullDefaults,
    ParameterMatcher, Thrown, Value,
};
use std::fmt;

#[derive(Debug, PartialEq)]
struct Overdrawn {
    balance: i64,
}

impl fmt::Display for Overdrawn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account overdrawn at {}", self.balance)
    }
}

impl std::error::Error for Overdrawn {}

#[test]
fn test_round_robin_replays_first_response() {
    let mock = Mock::new("Formatter");
    mock.setup_method("Format", ParameterMatcher::fixed([ArgMatcher::any()]))
        .returns("a")
        .returns("b")
        .returns_with(|inv| format!("c{}", inv.args()[0]));

    let results: Vec<String> = (0..4)
        .map(|i| mock.call::<String>("Format", vec![Value::from(i)]).unwrap())
        .collect();
    assert_eq!(results, vec!["a", "b", "c2", "a"]);
}

#[test]
fn test_later_setup_wins_on_overlap() {
    let mock = Mock::new("Calc");
    mock.setup_method(
        "Square",
        ParameterMatcher::fixed([ArgMatcher::satisfies("int", |v| v.as_i64().is_some())]),
    )
    .returns(-1);
    mock.setup_method("Square", ParameterMatcher::exact([3]))
        .returns(9);

    assert_eq!(mock.call::<i64>("Square", vec![Value::from(3)]).unwrap(), 9);
    assert_eq!(mock.call::<i64>("Square", vec![Value::from(4)]).unwrap(), -1);
}

#[test]
fn test_lenient_miss_returns_type_default() {
    let mock = Mock::new("Repo");
    assert_eq!(mock.call::<i64>("Count", vec![]).unwrap(), 0);
    assert_eq!(mock.call::<String>("Name", vec![]).unwrap(), "");
    assert_eq!(mock.call::<Option<i64>>("Find", vec![Value::from(1)]).unwrap(), None);

    let outcome = mock.invoke_method("Count", vec![]).unwrap();
    assert!(!outcome.matched);
    assert_eq!(mock.ledger().len(), 4);
}

#[test]
fn test_custom_default_generator() {
    let config = MockConfig::lenient().with_default_values(NullDefaults);
    let mock = Mock::with_config("Repo", config);
    assert_eq!(mock.invoke_method("Find", vec![]).unwrap().value, Value::Null);

    let config = MockConfig::lenient().with_default_values(
        |request: &DefaultRequest<'_>| -> Value {
            Value::from(format!("stub:{}", request.member.name()))
        },
    );
    let mock = Mock::with_config("Repo", config);
    assert_eq!(mock.call::<String>("Find", vec![]).unwrap(), "stub:Find");
}

#[test]
fn test_strict_miss_raises_but_is_recorded() {
    let mock = Mock::with_config("Repo", MockConfig::strict());
    let err = mock.call::<i64>("Count", vec![]).unwrap_err();
    assert!(matches!(err, MockError::NotSetup { ref member } if member == "method Count"));
    assert_eq!(mock.ledger().len(), 1);
}

#[test]
fn test_strict_and_lenient_properties() {
    let strict = Mock::with_config("Settings", MockConfig::strict());
    assert!(matches!(
        strict.get_property::<i64>("Timeout"),
        Err(MockError::NotSetup { .. })
    ));
    assert!(matches!(
        strict.set_property("Timeout", 5),
        Err(MockError::NotSetup { .. })
    ));

    let lenient = Mock::new("Settings");
    assert_eq!(lenient.get_property::<i64>("Timeout").unwrap(), 0);
    lenient.set_property("Timeout", 30).unwrap();
    assert_eq!(lenient.get_property::<i64>("Timeout").unwrap(), 30);
}

#[test]
fn test_initialized_property_tracks_writes() {
    let mock = Mock::with_config("Settings", MockConfig::strict());
    mock.setup_property("Theme")
        .unwrap()
        .initialize_with("dark")
        .unwrap();

    assert_eq!(mock.get_property::<String>("Theme").unwrap(), "dark");
    mock.set_property("Theme", "light").unwrap();
    assert_eq!(mock.get_property::<String>("Theme").unwrap(), "light");
}

#[test]
fn test_duplicate_and_double_initialize() {
    let mock = Mock::new("Settings");
    let setup = mock.setup_property("Theme").unwrap();
    assert!(matches!(
        mock.setup_property("Theme"),
        Err(MockError::DuplicateSetup { .. })
    ));

    setup.initialize_with("dark").unwrap();
    assert!(matches!(
        setup.initialize_with("light"),
        Err(MockError::AlreadyInitialized { .. })
    ));
}

#[test]
fn test_type_mismatch_on_typed_call() {
    let mock = Mock::new("Repo");
    mock.setup_method("Count", ParameterMatcher::none()).returns("many");

    let err = mock.call::<i64>("Count", vec![]).unwrap_err();
    assert!(matches!(err, MockError::TypeMismatch { actual: "string", .. }));
}

#[test]
fn test_thrown_error_reaches_caller_unchanged() {
    let mock = Mock::new("Account");
    mock.setup_method("Withdraw", ParameterMatcher::AnyArgs)
        .throws(Overdrawn { balance: -20 })
        .returns(true);

    let err = mock.call::<bool>("Withdraw", vec![Value::from(50)]).unwrap_err();
    let thrown = err.thrown().expect("thrown error");
    assert_eq!(thrown.downcast_ref::<Overdrawn>(), Some(&Overdrawn { balance: -20 }));
    assert_eq!(err.to_string(), "account overdrawn at -20");

    assert!(mock.call::<bool>("Withdraw", vec![Value::from(1)]).unwrap());
}

#[test]
fn test_thrown_factory_sees_arguments() {
    let mock = Mock::new("Parser");
    mock.setup_method("Parse", ParameterMatcher::AnyArgs)
        .throws_with(|inv| Thrown::msg(format!("cannot parse {}", inv.args()[0])));

    let err = mock.invoke_method("Parse", vec![Value::from("x")]).unwrap_err();
    assert!(err.to_string().contains("cannot parse"));
}

#[test]
fn test_call_base_resolution() {
    let mock = Mock::with_config("Service", MockConfig::lenient().with_call_base_class(true));
    mock.setup_method("Run", ParameterMatcher::none());
    mock.setup_method("Stop", ParameterMatcher::none())
        .call_base(CallBase::No);

    assert!(mock.invoke_method("Run", vec![]).unwrap().call_base);
    assert!(!mock.invoke_method("Stop", vec![]).unwrap().call_base);
    assert!(mock.invoke_method("Unknown", vec![]).unwrap().call_base);
}

#[test]
fn test_out_parameters() {
    let mock = Mock::new("Dictionary");
    mock.setup_method(
        "TryGet",
        ParameterMatcher::fixed([ArgMatcher::eq("k"), ArgMatcher::any()]),
    )
    .returns(true)
    .out_parameter_with(1, |inv| format!("value of {}", inv.args()[0]));

    let outcome = mock
        .invoke_method("TryGet", vec![Value::from("k"), Value::Null])
        .unwrap();
    assert!(outcome.matched);
    assert_eq!(outcome.out_parameters, vec![(1, Value::from("value of k"))]);
}

#[test]
fn test_regex_matcher() {
    let mock = Mock::new("Router");
    mock.setup_method(
        "Route",
        ParameterMatcher::fixed([ArgMatcher::regex(r"^/api/").unwrap()]),
    )
    .returns("api");

    assert_eq!(mock.call::<String>("Route", vec![Value::from("/api/users")]).unwrap(), "api");
    assert_eq!(mock.call::<String>("Route", vec![Value::from("/home")]).unwrap(), "");
    assert!(matches!(
        ArgMatcher::regex("("),
        Err(MockError::InvalidMatcher(_))
    ));
}

#[test]
fn test_unsigned_argument_matches_signed_setup() {
    let mock = Mock::new("Calc");
    mock.setup_method("Square", ParameterMatcher::exact([3])).returns(9);

    let outcome = mock.invoke_method("Square", vec![Value::from(3u32)]).unwrap();
    assert!(outcome.matched);
    assert_eq!(outcome.value, Value::from(9));
    assert_eq!(mock.call::<i64>("Square", vec![Value::from(3usize)]).unwrap(), 9);
}
