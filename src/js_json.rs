//! Plain-data interchange between interpreted values and
//! `serde_json::Value`, for hosts that feed inputs in and read results
//! out as JSON. Property insertion order is preserved in both directions.

use serde_json::{Map, Number};

use crate::core::value::{ObjectKind, Property, Value, lock, new_array, new_plain_object};

/// Interpreted value → JSON. Functions, promises, and coroutine objects
/// have no JSON form and come out as null; non-finite numbers likewise.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Undefined | Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => Number::from_f64(*n).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Object(obj) => {
            let data = lock(obj);
            match &data.kind {
                ObjectKind::Array(elements) => {
                    serde_json::Value::Array(elements.iter().map(value_to_json).collect())
                }
                ObjectKind::Plain => {
                    let mut map = Map::new();
                    for (key, prop) in &data.properties {
                        if let Property::Data { value, enumerable: true } = prop {
                            map.insert(key.clone(), value_to_json(value));
                        }
                    }
                    serde_json::Value::Object(map)
                }
                _ => serde_json::Value::Null,
            }
        }
    }
}

/// JSON → interpreted value. Objects become plain objects with the
/// map's key order as insertion order.
pub fn value_from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => {
            Value::Object(new_array(items.iter().map(value_from_json).collect()))
        }
        serde_json::Value::Object(map) => {
            let obj = new_plain_object();
            {
                let mut data = lock(&obj);
                for (key, v) in map {
                    data.properties.insert(key.clone(), Property::data(value_from_json(v)));
                }
            }
            Value::Object(obj)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::value_to_string;

    #[test]
    fn round_trips_plain_data() {
        let json: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": [true, null, "x"]}"#).unwrap();
        let value = value_from_json(&json);
        assert_eq!(value_to_json(&value), json);
    }

    #[test]
    fn arrays_render_like_interpreted_arrays() {
        let json: serde_json::Value = serde_json::from_str("[1, 2, 3]").unwrap();
        let value = value_from_json(&json);
        assert_eq!(value_to_string(&value), "1,2,3");
    }
}
