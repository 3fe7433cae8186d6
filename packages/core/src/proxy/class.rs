use tjs_handle::{ForeignValue, Handle};
use tjs_media::{as_url, is_url, MediaInput};
use tracing::debug;

use crate::proxy::{ForeignProxy, GenericProxy, Index, Proxy};
use crate::{Error, Kwargs, Library, Result, Value};

/// Coerce the input of `RawImage.read` to what the library accepts.
///
/// An image proxy is passed as its handle and a URL string as is. Paths,
/// bytes and local images are turned into blob URLs first.
pub(crate) fn read_input(input: Value, library: &Library) -> Result<ForeignValue> {
    let blob_url = |media: MediaInput| -> Result<ForeignValue> {
        Ok(ForeignValue::String(as_url(media, library.blob_host())?))
    };
    let arg = match input {
        Value::Proxy(Proxy::Image(image)) => {
            ForeignValue::Handle(image.into_generic().into_handle())
        }
        Value::String(s) if is_url(&s) => ForeignValue::String(s),
        Value::String(path) => blob_url(MediaInput::from(path))?,
        Value::Bytes(data) => blob_url(MediaInput::from(data))?,
        Value::Image(image) => blob_url(MediaInput::Image(image))?,
        other => {
            return Err(Error::precondition(format!(
                "RawImage.read() expects a RawImage, URL, path, bytes or image, got {}",
                other.kind()
            )))
        }
    };
    debug!("Reading RawImage");
    Ok(arg)
}

/// The library's `RawImage` class.
///
/// Calling it always constructs. `read` accepts local media as well as
/// `RawImage` instances and URLs.
#[derive(Clone, Debug)]
pub struct ClassProxy(GenericProxy);

impl ClassProxy {
    pub fn new(inner: GenericProxy) -> Self {
        Self(inner)
    }

    pub fn generic(&self) -> &GenericProxy {
        &self.0
    }

    pub fn into_generic(self) -> GenericProxy {
        self.0
    }

    /// `RawImage.read(input)`. The result is usually pending.
    ///
    /// The `read` member itself coerces its first argument, so reading it
    /// off the class and calling it later behaves the same.
    pub fn read(&self, input: Value) -> Result<Value> {
        self.get("read")?.into_proxy()?.call(vec![input], Kwargs::new())
    }
}

impl ForeignProxy for ClassProxy {
    fn handle(&self) -> &Handle {
        self.0.handle()
    }

    fn get(&self, name: &str) -> Result<Value> {
        match self.0.get(name)? {
            Value::Proxy(Proxy::Generic(method)) if name == "read" => {
                Ok(Value::Proxy(Proxy::Generic(method.reading_media())))
            }
            other => Ok(other),
        }
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        self.0.set(name, value)
    }

    fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        self.0.construct(args, kwargs)
    }

    fn index(&self, key: Index) -> Result<Value> {
        self.0.index(key)
    }

    fn set_item(&self, key: Index, value: Value) -> Result<()> {
        self.0.set_item(key, value)
    }
}
