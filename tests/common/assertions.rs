//! Custom assertion macros

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}

/// Assert that a JSON event has the given `type` and field values
///
/// ```text
/// assert_event!(event, "status_change", "user_id" => 2, "status" => "online");
/// ```
#[macro_export]
macro_rules! assert_event {
    ($event:expr, $kind:expr $(, $field:expr => $value:expr)* $(,)?) => {{
        let event: &serde_json::Value = &$event;
        assert_eq!(event["type"], $kind, "unexpected event: {}", event);
        $(
            assert_eq!(event[$field], serde_json::json!($value), "field {} of {}", $field, event);
        )*
    }};
}
