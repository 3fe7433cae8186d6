//! One imported copy of the wrapped library.

use std::fmt;
use std::sync::Arc;

use tjs_handle::{BlobHost, ForeignValue, Handle};
use tracing::trace;

use crate::codec::{decode, encode, DefaultConverter};
use crate::proxy::{ClassProxy, GenericProxy, ImageProxy, Proxy, TensorProxy};
use crate::{Result, Value};

/// An imported library: its namespace object plus the host's blob primitive.
///
/// Every proxy carries the `Library` it came from, so objects of two
/// imported versions are recognized against their own `RawImage` and
/// `Tensor` classes.
#[derive(Clone)]
pub struct Library {
    namespace: Handle,
    blobs: Option<Arc<dyn BlobHost>>,
}

impl Library {
    pub fn new(namespace: Handle) -> Self {
        Self {
            namespace,
            blobs: None,
        }
    }

    #[must_use]
    pub fn with_blob_host(mut self, blobs: Arc<dyn BlobHost>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    /// The namespace object's handle.
    pub fn handle(&self) -> &Handle {
        &self.namespace
    }

    pub fn blob_host(&self) -> Option<&dyn BlobHost> {
        self.blobs.as_deref()
    }

    pub fn namespace(&self) -> Namespace {
        Namespace {
            library: self.clone(),
        }
    }

    fn export(&self, name: &str) -> Result<Option<Handle>> {
        Ok(self.namespace.get(name)?.into_handle())
    }

    /// Wrap a handle in the proxy matching its type.
    ///
    /// First match wins: the `RawImage` class itself, then instances of
    /// `RawImage`, then instances of `Tensor`, otherwise a generic proxy.
    pub fn wrap(&self, handle: Handle) -> Result<Proxy> {
        let generic = GenericProxy::new(handle.clone(), self.clone())?;

        let raw_image = self.export("RawImage")?;
        if raw_image.as_ref().is_some_and(|c| c.same(&handle)) {
            trace!(?handle, "Wrapping RawImage class");
            return Ok(Proxy::Class(ClassProxy::new(generic)));
        }

        let constructor = match handle.get("constructor")? {
            ForeignValue::Handle(c) => c,
            _ => return Ok(Proxy::Generic(generic)),
        };
        if raw_image.is_some_and(|c| c.same(&constructor)) {
            trace!(?handle, "Wrapping RawImage instance");
            return Ok(Proxy::Image(ImageProxy::new(generic)));
        }
        if self.export("Tensor")?.is_some_and(|c| c.same(&constructor)) {
            trace!(?handle, "Wrapping Tensor instance");
            return Ok(Proxy::Tensor(TensorProxy::new(generic)));
        }
        Ok(Proxy::Generic(generic))
    }

    /// Decode with this library as the fallback converter.
    pub fn decode(&self, value: ForeignValue) -> Result<Value> {
        decode(value, self)
    }

    pub fn encode(&self, value: Value) -> Result<ForeignValue> {
        encode(value, self.blob_host())
    }

    /// Whether both refer to the same imported namespace.
    pub fn same_as(&self, other: &Library) -> bool {
        self.namespace.same(&other.namespace)
    }
}

impl DefaultConverter for Library {
    fn convert(&self, handle: Handle) -> Result<Value> {
        Ok(Value::Proxy(self.wrap(handle)?))
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("namespace", &self.namespace)
            .field("blobs", &self.blobs.is_some())
            .finish()
    }
}

/// The library's top-level exports.
///
/// Object and function exports are returned as proxies without conversion;
/// plain exports (strings, numbers) are decoded.
#[derive(Clone, Debug)]
pub struct Namespace {
    library: Library,
}

impl Namespace {
    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn handle(&self) -> &Handle {
        self.library.handle()
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        match self.library.handle().get(name)? {
            ForeignValue::Handle(h) => Ok(Value::Proxy(self.library.wrap(h)?)),
            other => self.library.decode(other),
        }
    }

    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        let value = self.library.encode(value)?;
        Ok(self.library.handle().set(name, value)?)
    }

    pub fn has(&self, name: &str) -> Result<bool> {
        Ok(self.library.handle().has(name)?)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.library.handle().keys()?)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.keys()?.is_empty())
    }

    pub fn same_as(&self, other: &Namespace) -> bool {
        self.library.same_as(&other.library)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.keys() {
            Ok(keys) => write!(f, "Namespace({})", keys.join(", ")),
            Err(_) => write!(f, "Namespace(?)"),
        }
    }
}
