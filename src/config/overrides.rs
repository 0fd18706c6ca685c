use serde::Serialize;
use serde_json::Value;

/// Serialize CLI overrides, dropping nulls and empty arrays so that flags the user
/// did not pass leave file and environment values alone
pub fn filter_unset<T: Serialize>(input: T) -> Value {
    let mut value = serde_json::to_value(input).unwrap_or(Value::Null);
    filter_unset_recursive(&mut value);
    match value {
        Value::Object(_) => value,
        _ => Value::Object(Default::default()),
    }
}

fn filter_unset_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| match v {
                Value::Null => false,
                Value::Array(arr) => !arr.is_empty(),
                _ => true,
            });

            // Recursively filter nested objects
            for (_, v) in map.iter_mut() {
                filter_unset_recursive(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                filter_unset_recursive(item);
            }
        }
        _ => {}
    }
}
