//! Local stand-ins for foreign objects.
//!
//! Every foreign object that does not convert to plain data is represented by
//! a [`Proxy`]. All proxies share one interface, [`ForeignProxy`]; the
//! specialized variants override parts of it for the library's `RawImage`
//! class, `RawImage` instances and `Tensor` instances.

mod class;
mod generic;
mod image;
mod tensor;

use std::fmt;

use tjs_handle::Handle;

use crate::{Kwargs, Library, Result, Value};

pub use class::ClassProxy;
pub use generic::GenericProxy;
pub use image::ImageProxy;
pub use tensor::{TensorArray, TensorProxy};

/// A subscript key, as in `proxy[key]`.
#[derive(Clone, Debug, PartialEq)]
pub enum Index {
    /// A member name.
    Name(String),
    /// An integer position.
    Position(i64),
    /// A `start:stop:step` range.
    Slice(Slice),
    /// One entry per axis, as in `tensor[1, 1:3]`.
    Axes(Vec<Axis>),
}

impl From<&str> for Index {
    fn from(name: &str) -> Self {
        Index::Name(name.to_string())
    }
}

impl From<String> for Index {
    fn from(name: String) -> Self {
        Index::Name(name)
    }
}

impl From<i64> for Index {
    fn from(position: i64) -> Self {
        Index::Position(position)
    }
}

impl From<Slice> for Index {
    fn from(slice: Slice) -> Self {
        Index::Slice(slice)
    }
}

impl From<Vec<Axis>> for Index {
    fn from(axes: Vec<Axis>) -> Self {
        Index::Axes(axes)
    }
}

/// A half-open range with optional bounds and step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    /// `start:stop`
    pub fn new(start: i64, stop: i64) -> Self {
        Slice {
            start: Some(start),
            stop: Some(stop),
            step: None,
        }
    }

    /// `:` - the whole axis.
    pub fn full() -> Self {
        Slice::default()
    }

    #[must_use]
    pub fn with_step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }
}

/// One axis of a multi-axis subscript.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    At(i64),
    Range(Slice),
}

/// The operations every proxy supports.
///
/// Reads and call results are decoded with the proxy's library, writes and
/// arguments are encoded with it.
pub trait ForeignProxy {
    /// The wrapped foreign object.
    fn handle(&self) -> &Handle;

    /// Read a member.
    fn get(&self, name: &str) -> Result<Value>;

    /// Write a member.
    fn set(&self, name: &str, value: Value) -> Result<()>;

    /// Invoke the proxy.
    fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Value>;

    /// Subscript read.
    fn index(&self, key: Index) -> Result<Value>;

    /// Subscript write.
    fn set_item(&self, key: Index, value: Value) -> Result<()>;

    /// `proxy.name(...)`.
    fn call_method(&self, name: &str, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        self.get(name)?.into_proxy()?.call(args, kwargs)
    }
}

/// A proxy of whichever kind the wrapped object was recognized as.
#[derive(Clone)]
pub enum Proxy {
    Generic(GenericProxy),
    /// The `RawImage` class itself.
    Class(ClassProxy),
    /// A `RawImage` instance.
    Image(ImageProxy),
    /// A `Tensor` instance.
    Tensor(TensorProxy),
}

impl Proxy {
    fn inner(&self) -> &GenericProxy {
        match self {
            Proxy::Generic(p) => p,
            Proxy::Class(p) => p.generic(),
            Proxy::Image(p) => p.generic(),
            Proxy::Tensor(p) => p.generic(),
        }
    }

    fn as_dyn(&self) -> &dyn ForeignProxy {
        match self {
            Proxy::Generic(p) => p,
            Proxy::Class(p) => p,
            Proxy::Image(p) => p,
            Proxy::Tensor(p) => p,
        }
    }

    pub fn library(&self) -> &Library {
        self.inner().library()
    }

    pub fn into_handle(self) -> Handle {
        match self {
            Proxy::Generic(p) => p.into_handle(),
            Proxy::Class(p) => p.into_generic().into_handle(),
            Proxy::Image(p) => p.into_generic().into_handle(),
            Proxy::Tensor(p) => p.into_generic().into_handle(),
        }
    }

    /// Bind `this` for plain calls, as reading a method off an object does.
    #[must_use]
    pub fn bound_to(self, receiver: Handle) -> Proxy {
        match self {
            Proxy::Generic(p) => Proxy::Generic(p.bound_to(receiver)),
            other => other,
        }
    }

    /// Whether the wrapped object looks like a class definition.
    pub fn is_class(&self) -> bool {
        self.inner().is_class()
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.inner().keys()
    }

    pub fn as_image(&self) -> Option<&ImageProxy> {
        match self {
            Proxy::Image(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&TensorProxy> {
        match self {
            Proxy::Tensor(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassProxy> {
        match self {
            Proxy::Class(p) => Some(p),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Proxy::Generic(_) => "generic",
            Proxy::Class(_) => "class",
            Proxy::Image(_) => "image",
            Proxy::Tensor(_) => "tensor",
        }
    }
}

impl ForeignProxy for Proxy {
    fn handle(&self) -> &Handle {
        self.as_dyn().handle()
    }

    fn get(&self, name: &str) -> Result<Value> {
        self.as_dyn().get(name)
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        self.as_dyn().set(name, value)
    }

    fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        self.as_dyn().call(args, kwargs)
    }

    fn index(&self, key: Index) -> Result<Value> {
        self.as_dyn().index(key)
    }

    fn set_item(&self, key: Index, value: Value) -> Result<()> {
        self.as_dyn().set_item(key, value)
    }

    fn call_method(&self, name: &str, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        self.as_dyn().call_method(name, args, kwargs)
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.handle().same(other.handle())
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Proxy::{}({:?})", self.kind(), self.handle())
    }
}
