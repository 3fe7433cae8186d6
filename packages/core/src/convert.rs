//! Conversions between `Value` and `serde_json::Value`.
//!
//! Pipeline outputs are mostly plain data (labels, scores, boxes); this turns
//! them into JSON for logging or serving. Values that only make sense inside
//! the bridge (proxies, pending results, images) do not convert.

use tjs_handle::ElementType;

use crate::{Error, Result, Value};

/// Convert a decoded value to JSON.
///
/// Bytes and typed arrays become arrays of numbers.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => serde_json::Value::Array(b.iter().map(|&x| x.into()).collect()),
        Value::Typed(t) => typed_to_json(t)?,
        Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(value_to_json).collect::<Result<_>>()?)
        }
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), value_to_json(v)?)))
                .collect::<Result<_>>()?,
        ),
        Value::Image(_) | Value::Proxy(_) | Value::Pending(_) => {
            return Err(Error::conversion(format!(
                "{} has no JSON form",
                value.kind()
            )))
        }
    })
}

fn typed_to_json(typed: &tjs_handle::TypedArray) -> Result<serde_json::Value> {
    fn numbers<T: tjs_handle::TypedElement + Into<serde_json::Value>>(
        typed: &tjs_handle::TypedArray,
    ) -> Result<serde_json::Value> {
        let values = typed
            .to_vec::<T>()
            .ok_or_else(|| Error::conversion("typed array element mismatch"))?;
        Ok(serde_json::Value::Array(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    match typed.element_type {
        ElementType::Int8 => numbers::<i8>(typed),
        ElementType::Uint8 => numbers::<u8>(typed),
        ElementType::Int16 => numbers::<i16>(typed),
        ElementType::Uint16 => numbers::<u16>(typed),
        ElementType::Int32 => numbers::<i32>(typed),
        ElementType::Uint32 => numbers::<u32>(typed),
        ElementType::Int64 => numbers::<i64>(typed),
        ElementType::Uint64 => numbers::<u64>(typed),
        ElementType::Float32 => numbers::<f32>(typed),
        ElementType::Float64 => numbers::<f64>(typed),
        ElementType::Bool => numbers::<bool>(typed),
    }
}

/// Convert JSON to a value.
pub fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;
    use serde_json::json;
    use tjs_handle::TypedArray;

    #[test]
    fn classification_output_to_json() {
        let value = Value::Array(vec![Value::Map(btree! {
            "label".to_string() => Value::from("POSITIVE"),
            "score".to_string() => Value::Float(0.5),
        })]);
        assert_eq!(
            value_to_json(&value).unwrap(),
            json!([{ "label": "POSITIVE", "score": 0.5 }])
        );
    }

    #[test]
    fn typed_arrays_become_number_arrays() {
        let value = Value::Typed(TypedArray::from_slice(&[1.5f32, 2.0]));
        assert_eq!(value_to_json(&value).unwrap(), json!([1.5, 2.0]));
        assert_eq!(
            value_to_json(&Value::Bytes(vec![1, 2])).unwrap(),
            json!([1, 2])
        );
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(
            value_to_json(&Value::Float(f64::NAN)).unwrap(),
            serde_json::Value::Null
        );
    }

    #[test]
    fn json_roundtrips_through_value() {
        let json = json!({ "topk": 3, "threshold": 0.25, "labels": ["a", "b"], "x": null });
        let value = json_to_value(json.clone());
        assert_eq!(value_to_json(&value).unwrap(), json);
    }

    #[test]
    fn images_have_no_json_form() {
        let image = tjs_media::LocalImage::new(1, 1, 1, vec![0]).unwrap();
        assert!(matches!(
            value_to_json(&Value::Image(image)),
            Err(Error::Conversion { .. })
        ));
    }
}
