/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Objects become [`Value::Map`](crate::Value::Map) in the order written, arrays become
/// [`Value::List`](crate::Value::List), and any other expression goes through
/// `Value::from`.
///
/// ```rust
/// use qs_codec::{qs, Value};
///
/// let value = qs!({ "a": { "b": "c" }, "list": [1, 2], "none": null });
/// assert_eq!(value["a"]["b"], Value::from("c"));
/// assert_eq!(value["list"][1], Value::from(2));
/// assert!(value["none"].is_null());
/// ```
#[macro_export]
macro_rules! qs {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::List(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::List(vec![$($crate::qs!($elem)),*])
    };

    ({}) => {
        $crate::Value::Map($crate::QsMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::QsMap::new();
        $(
            map.insert($key.to_string(), $crate::qs!($value));
        )*
        $crate::Value::Map(map)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
