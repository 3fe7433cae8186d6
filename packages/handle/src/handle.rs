//! The foreign object trait and the `Handle` that owns one.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::{ForeignValue, HandleError};

/// Identity of a foreign object. Two handles with the same id refer to the
/// same foreign object.
pub type ObjectId = u64;

/// The foreign runtime's type tag for a referenced value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Object,
    Function,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Object => f.write_str("object"),
            TypeTag::Function => f.write_str("function"),
        }
    }
}

/// A value living in the foreign runtime.
///
/// Host bindings implement this once; everything above only talks to
/// [`Handle`].
///
/// # Object Safety
///
/// This trait is object-safe: handles store `Arc<dyn ForeignObject>`.
pub trait ForeignObject: Send + Sync {
    /// Stable identity of the referenced object.
    fn id(&self) -> ObjectId;

    fn type_tag(&self) -> TypeTag;

    /// Read a member. Missing members read as `Undefined`.
    fn get(&self, name: &str) -> Result<ForeignValue, HandleError>;

    /// Write a member.
    fn set(&self, name: &str, value: ForeignValue) -> Result<(), HandleError>;

    /// Whether the member is reachable, including inherited members.
    fn has(&self, name: &str) -> Result<bool, HandleError>;

    /// Own enumerable member names.
    fn keys(&self) -> Result<Vec<String>, HandleError>;

    /// Invoke with an optional receiver.
    fn call(&self, this: Option<&Handle>, args: Vec<ForeignValue>)
        -> Result<ForeignValue, HandleError>;

    /// Invoke as a constructor.
    fn construct(&self, args: Vec<ForeignValue>) -> Result<ForeignValue, HandleError>;

    /// The foreign string form (for functions, their source text).
    fn source_text(&self) -> Result<String, HandleError>;

    /// Convert to a structural equivalent.
    ///
    /// Plain objects become `ForeignValue::Object`, arrays `ForeignValue::Array`,
    /// typed arrays `Bytes`/`Typed`, recursively. Anything that has no faithful
    /// structural form (class instances, functions) is left in the tree as a
    /// `ForeignValue::Handle` leaf, for the caller's fallback to deal with. If
    /// this object itself has no structural form the result is a handle leaf to
    /// it.
    fn materialize(&self) -> Result<ForeignValue, HandleError>;
}

/// Owning reference to a foreign value.
///
/// Cloning is cheap and preserves identity.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<dyn ForeignObject>,
}

impl Handle {
    pub fn new(object: Arc<dyn ForeignObject>) -> Self {
        Self { inner: object }
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id()
    }

    pub fn type_tag(&self) -> TypeTag {
        self.inner.type_tag()
    }

    pub fn is_function(&self) -> bool {
        self.type_tag() == TypeTag::Function
    }

    /// Identity comparison on the foreign side.
    pub fn same(&self, other: &Handle) -> bool {
        self.id() == other.id()
    }

    pub fn get(&self, name: &str) -> Result<ForeignValue, HandleError> {
        self.inner.get(name)
    }

    pub fn set(&self, name: &str, value: ForeignValue) -> Result<(), HandleError> {
        self.inner.set(name, value)
    }

    pub fn has(&self, name: &str) -> Result<bool, HandleError> {
        self.inner.has(name)
    }

    pub fn keys(&self) -> Result<Vec<String>, HandleError> {
        self.inner.keys()
    }

    /// Plain invocation, no receiver.
    pub fn call(&self, args: Vec<ForeignValue>) -> Result<ForeignValue, HandleError> {
        self.inner.call(None, args)
    }

    /// Invocation with `this` bound to `receiver`.
    pub fn call_with(
        &self,
        receiver: &Handle,
        args: Vec<ForeignValue>,
    ) -> Result<ForeignValue, HandleError> {
        self.inner.call(Some(receiver), args)
    }

    /// `this.name(...args)`.
    pub fn call_method(
        &self,
        name: &str,
        args: Vec<ForeignValue>,
    ) -> Result<ForeignValue, HandleError> {
        match self.get(name)? {
            ForeignValue::Handle(method) if method.is_function() => method.call_with(self, args),
            _ => Err(HandleError::thrown(
                "TypeError",
                format!("{} is not a function", name),
            )),
        }
    }

    pub fn construct(&self, args: Vec<ForeignValue>) -> Result<ForeignValue, HandleError> {
        self.inner.construct(args)
    }

    pub fn source_text(&self) -> Result<String, HandleError> {
        self.inner.source_text()
    }

    pub fn materialize(&self) -> Result<ForeignValue, HandleError> {
        self.inner.materialize()
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(#{}, {})", self.id(), self.type_tag())
    }
}

/// The host's binary-resource primitive.
///
/// Produces a short-lived URL for binary content that the foreign side can
/// fetch, like `URL.createObjectURL(new Blob([data]))`.
pub trait BlobHost: Send + Sync {
    fn create_object_url(&self, data: Bytes) -> Result<String, HandleError>;
}

impl<T: BlobHost + ?Sized> BlobHost for Arc<T> {
    fn create_object_url(&self, data: Bytes) -> Result<String, HandleError> {
        self.as_ref().create_object_url(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRuntime;

    #[test]
    fn clones_share_identity() {
        let rt = MemoryRuntime::new();
        let a = rt.object();
        let b = a.clone();
        let c = rt.object();
        assert!(a.same(&b));
        assert!(!a.same(&c));
        assert_eq!(a, b);
    }

    #[test]
    fn call_method_binds_receiver() {
        let rt = MemoryRuntime::new();
        let obj = rt.object();
        obj.set("value", ForeignValue::Integer(41)).unwrap();
        let method = rt.function("getValue", |ctx| {
            let this = ctx.this.ok_or_else(|| HandleError::thrown("TypeError", "no this"))?;
            match this.get("value")? {
                ForeignValue::Integer(i) => Ok(ForeignValue::Integer(i + 1)),
                _ => Ok(ForeignValue::Undefined),
            }
        });
        obj.set("getValue", method.into()).unwrap();

        let res = obj.call_method("getValue", vec![]).unwrap();
        assert_eq!(res, ForeignValue::Integer(42));
    }

    #[test]
    fn call_method_on_non_function_throws() {
        let rt = MemoryRuntime::new();
        let obj = rt.object();
        obj.set("x", ForeignValue::Integer(1)).unwrap();
        let err = obj.call_method("x", vec![]).unwrap_err();
        assert!(err.to_string().contains("is not a function"));
    }

    #[test]
    fn debug_shows_identity_and_tag() {
        let rt = MemoryRuntime::new();
        let f = rt.function("f", |_| Ok(ForeignValue::Undefined));
        let debug = format!("{:?}", f);
        assert!(debug.contains("function"));
        assert!(debug.contains(&format!("#{}", f.id())));
    }
}
