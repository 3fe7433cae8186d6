//! The marshalling protocol between local [`Value`]s and [`ForeignValue`]s.

use std::collections::BTreeMap;
use std::sync::Arc;

use tjs_handle::{BlobHost, Bytes, ForeignValue, Handle, TypeTag};
use tjs_media::{as_url, MediaInput};

use crate::{Error, PendingValue, Result, Value};

/// Turns a foreign object without a structural form into a local value.
///
/// Decoding never drops data: whatever `materialize` cannot express is handed
/// here, and the usual answer is a proxy.
pub trait DefaultConverter: Send + Sync {
    fn convert(&self, handle: Handle) -> Result<Value>;
}

impl<T: DefaultConverter + ?Sized> DefaultConverter for Arc<T> {
    fn convert(&self, handle: Handle) -> Result<Value> {
        self.as_ref().convert(handle)
    }
}

/// Encode a local value for the foreign side.
///
/// Proxies unwrap to their handle, maps become object literals, images cross
/// as blob URLs and `Null` becomes `undefined`. A pending value cannot be sent.
pub fn encode(value: Value, blobs: Option<&dyn BlobHost>) -> Result<ForeignValue> {
    Ok(match value {
        Value::Null => ForeignValue::Undefined,
        Value::Bool(b) => ForeignValue::Bool(b),
        Value::Integer(i) => ForeignValue::Integer(i),
        Value::Float(f) => ForeignValue::Number(f),
        Value::String(s) => ForeignValue::String(s),
        Value::Bytes(b) => ForeignValue::Bytes(Bytes::from(b)),
        Value::Typed(t) => ForeignValue::Typed(t),
        Value::Array(items) => ForeignValue::Array(
            items
                .into_iter()
                .map(|v| encode(v, blobs))
                .collect::<Result<_>>()?,
        ),
        Value::Map(map) => ForeignValue::Object(
            map.into_iter()
                .map(|(k, v)| Ok((k, encode(v, blobs)?)))
                .collect::<Result<_>>()?,
        ),
        Value::Image(image) => ForeignValue::String(as_url(MediaInput::Image(image), blobs)?),
        Value::Proxy(proxy) => ForeignValue::Handle(proxy.into_handle()),
        Value::Pending(_) => {
            return Err(Error::precondition(
                "a pending value must be settled before it is sent",
            ))
        }
    })
}

/// Encode call arguments. Non-empty keyword arguments are appended as one
/// trailing object literal.
pub fn encode_call_args(
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
    blobs: Option<&dyn BlobHost>,
) -> Result<Vec<ForeignValue>> {
    let mut encoded = args
        .into_iter()
        .map(|v| encode(v, blobs))
        .collect::<Result<Vec<_>>>()?;
    if !kwargs.is_empty() {
        encoded.push(encode(Value::Map(kwargs), blobs)?);
    }
    Ok(encoded)
}

/// Decode a foreign value.
///
/// Objects are materialized and each leaf without a structural form goes to
/// `fallback`. Functions are always handed to `fallback`. Pending values
/// decode once settled, with the same fallback.
pub fn decode<C>(value: ForeignValue, fallback: &C) -> Result<Value>
where
    C: DefaultConverter + Clone + 'static,
{
    match value {
        ForeignValue::Handle(handle) => match handle.type_tag() {
            TypeTag::Function => fallback.convert(handle),
            TypeTag::Object => decode_tree(handle.materialize()?, fallback),
        },
        other => decode_tree(other, fallback),
    }
}

fn decode_tree<C>(value: ForeignValue, fallback: &C) -> Result<Value>
where
    C: DefaultConverter + Clone + 'static,
{
    Ok(match value {
        ForeignValue::Undefined | ForeignValue::Null => Value::Null,
        ForeignValue::Bool(b) => Value::Bool(b),
        ForeignValue::Integer(i) => Value::Integer(i),
        ForeignValue::Number(n) => Value::Float(n),
        ForeignValue::String(s) => Value::String(s),
        ForeignValue::Bytes(b) => Value::Bytes(b.to_vec()),
        ForeignValue::Typed(t) => Value::Typed(t),
        ForeignValue::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| decode_tree(v, fallback))
                .collect::<Result<_>>()?,
        ),
        ForeignValue::Object(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| Ok((k, decode_tree(v, fallback)?)))
                .collect::<Result<_>>()?,
        ),
        // Already materialized: leaves are opaque.
        ForeignValue::Handle(handle) => fallback.convert(handle)?,
        ForeignValue::Pending(pending) => {
            Value::Pending(PendingValue::new(pending, fallback.clone()))
        }
    })
}
