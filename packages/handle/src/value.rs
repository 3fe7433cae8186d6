//! Values as they cross the boundary.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::{Handle, HandleError};

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A value in transit between the local side and the foreign runtime.
///
/// Outbound, this is what arguments and assigned values are encoded to.
/// Inbound, member reads and calls produce it. `Object` and `Array` are
/// literals: outbound they are materialized as fresh foreign objects, inbound
/// they only appear inside the tree returned by [`Handle::materialize`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ForeignValue {
    /// The foreign "no value".
    #[default]
    Undefined,
    Null,
    Bool(bool),
    /// A number known to hold an integral value.
    Integer(i64),
    Number(f64),
    String(String),
    /// A byte array (`Uint8Array`).
    Bytes(Bytes),
    /// Any other typed array.
    Typed(TypedArray),
    Array(Vec<ForeignValue>),
    /// An object literal; entry order is preserved.
    Object(Vec<(String, ForeignValue)>),
    Handle(Handle),
    /// An in-flight asynchronous result.
    Pending(Pending),
}

impl ForeignValue {
    /// Check for `undefined` or `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, ForeignValue::Undefined | ForeignValue::Null)
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            ForeignValue::Handle(h) => Some(h),
            _ => None,
        }
    }

    pub fn into_handle(self) -> Option<Handle> {
        match self {
            ForeignValue::Handle(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ForeignValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of `Integer` or `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ForeignValue::Integer(i) => Some(*i as f64),
            ForeignValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Non-negative integral view, for sizes and dimensions.
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ForeignValue::Integer(i) if *i >= 0 => Some(*i as usize),
            ForeignValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
            _ => None,
        }
    }
}

impl From<&str> for ForeignValue {
    fn from(v: &str) -> Self {
        ForeignValue::String(v.to_string())
    }
}

impl From<String> for ForeignValue {
    fn from(v: String) -> Self {
        ForeignValue::String(v)
    }
}

impl From<bool> for ForeignValue {
    fn from(v: bool) -> Self {
        ForeignValue::Bool(v)
    }
}

impl From<i64> for ForeignValue {
    fn from(v: i64) -> Self {
        ForeignValue::Integer(v)
    }
}

impl From<f64> for ForeignValue {
    fn from(v: f64) -> Self {
        ForeignValue::Number(v)
    }
}

impl From<Handle> for ForeignValue {
    fn from(v: Handle) -> Self {
        ForeignValue::Handle(v)
    }
}

/// Element types of foreign typed arrays.
///
/// Names follow the tensor `type` strings of the wrapped library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Bool,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            ElementType::Int8 | ElementType::Uint8 | ElementType::Bool => 1,
            ElementType::Int16 | ElementType::Uint16 => 2,
            ElementType::Int32 | ElementType::Uint32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::Uint64 | ElementType::Float64 => 8,
        }
    }

    /// Parse a type name such as `"float32"`.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int8" => ElementType::Int8,
            "uint8" => ElementType::Uint8,
            "int16" => ElementType::Int16,
            "uint16" => ElementType::Uint16,
            "int32" => ElementType::Int32,
            "uint32" => ElementType::Uint32,
            "int64" => ElementType::Int64,
            "uint64" => ElementType::Uint64,
            "float32" => ElementType::Float32,
            "float64" => ElementType::Float64,
            "bool" => ElementType::Bool,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Int8 => "int8",
            ElementType::Uint8 => "uint8",
            ElementType::Int16 => "int16",
            ElementType::Uint16 => "uint16",
            ElementType::Int32 => "int32",
            ElementType::Uint32 => "uint32",
            ElementType::Int64 => "int64",
            ElementType::Uint64 => "uint64",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
            ElementType::Bool => "bool",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rust scalar types that can be read out of a [`TypedArray`].
pub trait TypedElement: Copy {
    const ELEMENT_TYPE: ElementType;

    /// Decode one element from little-endian bytes of exactly the element size.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Append the little-endian encoding of `self`.
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! typed_element {
    ($ty:ty, $variant:ident) => {
        impl TypedElement for $ty {
            const ELEMENT_TYPE: ElementType = ElementType::$variant;

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(bytes);
                <$ty>::from_le_bytes(buf)
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
        }
    };
}

typed_element!(i8, Int8);
typed_element!(u8, Uint8);
typed_element!(i16, Int16);
typed_element!(u16, Uint16);
typed_element!(i32, Int32);
typed_element!(u32, Uint32);
typed_element!(i64, Int64);
typed_element!(u64, Uint64);
typed_element!(f32, Float32);
typed_element!(f64, Float64);

impl TypedElement for bool {
    const ELEMENT_TYPE: ElementType = ElementType::Bool;

    fn from_le_slice(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }
}

/// A typed array: an element type plus its little-endian backing buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedArray {
    pub element_type: ElementType,
    pub data: Bytes,
}

impl TypedArray {
    pub fn new(element_type: ElementType, data: Bytes) -> Self {
        Self { element_type, data }
    }

    /// Build from a slice of scalars.
    pub fn from_slice<T: TypedElement>(values: &[T]) -> Self {
        let mut out = Vec::with_capacity(values.len() * T::ELEMENT_TYPE.size());
        for v in values {
            v.write_le(&mut out);
        }
        Self {
            element_type: T::ELEMENT_TYPE,
            data: Bytes::from(out),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.element_type.size()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode all elements as `T`.
    ///
    /// Returns `None` if `T` does not match the element type.
    pub fn to_vec<T: TypedElement>(&self) -> Option<Vec<T>> {
        if T::ELEMENT_TYPE != self.element_type {
            return None;
        }
        Some(
            self.data
                .chunks_exact(self.element_type.size())
                .map(T::from_le_slice)
                .collect(),
        )
    }
}

/// An in-flight foreign result (a promise).
///
/// Settling consumes the underlying future; clones share it, so only the
/// first `settle` observes the value.
#[derive(Clone)]
pub struct Pending {
    inner: Arc<Mutex<Option<BoxFuture<Result<ForeignValue, HandleError>>>>>,
}

impl Pending {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<ForeignValue, HandleError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Some(Box::pin(future)))),
        }
    }

    /// An already-settled result.
    pub fn ready(result: Result<ForeignValue, HandleError>) -> Self {
        Self::new(async move { result })
    }

    /// Wait for the foreign side to settle.
    pub async fn settle(self) -> Result<ForeignValue, HandleError> {
        let taken = match self.inner.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => return Err(HandleError::thrown("Error", "pending slot poisoned")),
        };
        match taken {
            Some(future) => future.await,
            None => Err(HandleError::AlreadySettled),
        }
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pending")
    }
}
