//! The local view of bridged values.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tjs_handle::{Pending, TypedArray};
use tjs_media::LocalImage;

use crate::codec::{decode, DefaultConverter};
use crate::{Error, Proxy, Result};

/// A value on the local side of the bridge.
///
/// Plain data crosses by value; anything the library owns and that has no
/// structural form stays on the foreign side behind a [`Proxy`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// A byte array (`Uint8Array` on the foreign side).
    Bytes(Vec<u8>),
    /// Any other typed array.
    Typed(TypedArray),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A local image; crosses the boundary as a blob URL.
    Image(LocalImage),
    Proxy(Proxy),
    /// A foreign asynchronous result, decoded once settled.
    Pending(PendingValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Value::Pending(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of `Integer` or `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&Proxy> {
        match self {
            Value::Proxy(p) => Some(p),
            _ => None,
        }
    }

    /// The proxy inside, or a precondition error naming what was found.
    pub fn into_proxy(self) -> Result<Proxy> {
        match self {
            Value::Proxy(p) => Ok(p),
            other => Err(Error::precondition(format!(
                "expected a foreign object, got {}",
                other.kind()
            ))),
        }
    }

    /// Await the value if it is pending; other values are returned as is.
    pub async fn settle(self) -> Result<Value> {
        match self {
            Value::Pending(p) => p.settle().await,
            other => Ok(other),
        }
    }

    /// Short name of the variant, for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Typed(_) => "typed array",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Image(_) => "image",
            Value::Proxy(_) => "proxy",
            Value::Pending(_) => "pending",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<TypedArray> for Value {
    fn from(v: TypedArray) -> Self {
        Value::Typed(v)
    }
}

impl From<LocalImage> for Value {
    fn from(v: LocalImage) -> Self {
        Value::Image(v)
    }
}

impl From<Proxy> for Value {
    fn from(v: Proxy) -> Self {
        Value::Proxy(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

/// A pending foreign result together with the converter its settled value is
/// decoded with.
#[derive(Clone)]
pub struct PendingValue {
    pending: Pending,
    fallback: Arc<dyn DefaultConverter>,
}

impl PendingValue {
    pub fn new<C: DefaultConverter + 'static>(pending: Pending, fallback: C) -> Self {
        Self {
            pending,
            fallback: Arc::new(fallback),
        }
    }

    /// Wait for the foreign result and decode it.
    ///
    /// A foreign rejection is returned as [`Error::Foreign`], undecoded.
    pub async fn settle(self) -> Result<Value> {
        let settled = self.pending.settle().await?;
        decode(settled, &self.fallback)
    }
}

impl PartialEq for PendingValue {
    fn eq(&self, other: &Self) -> bool {
        self.pending == other.pending
    }
}

impl fmt::Debug for PendingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PendingValue")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tjs_handle::{ForeignValue, Handle, HandleError};

    #[derive(Clone)]
    struct Refuse;

    impl DefaultConverter for Refuse {
        fn convert(&self, _handle: Handle) -> Result<Value> {
            Err(Error::conversion("no proxies here"))
        }
    }

    #[tokio::test]
    async fn pending_decodes_settled_value() {
        let pending = Pending::ready(Ok(ForeignValue::Object(vec![(
            "label".to_string(),
            ForeignValue::from("POSITIVE"),
        )])));
        let value = Value::Pending(PendingValue::new(pending, Refuse));
        let settled = value.settle().await.unwrap();
        assert_eq!(
            settled.as_map().unwrap().get("label"),
            Some(&Value::from("POSITIVE"))
        );
    }

    #[tokio::test]
    async fn pending_rejection_is_foreign_error() {
        let pending = Pending::ready(Err(HandleError::thrown("Error", "model not found")));
        let err = PendingValue::new(pending, Refuse).settle().await.unwrap_err();
        assert!(matches!(err, Error::Foreign(HandleError::Thrown { .. })));
        assert_eq!(err.to_string(), "Error: model not found");
    }

    #[tokio::test]
    async fn settle_passes_plain_values_through() {
        assert_eq!(Value::from(3i64).settle().await.unwrap(), Value::Integer(3));
    }

    #[test]
    fn into_proxy_reports_kind() {
        let err = Value::from("text").into_proxy().unwrap_err();
        assert!(err.to_string().contains("string"));
    }
}
