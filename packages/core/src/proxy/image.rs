use std::path::Path;

use ndarray::Array3;
use tjs_handle::{ElementType, ForeignValue, Handle};
use tjs_media::LocalImage;

use crate::proxy::{ForeignProxy, GenericProxy, Index};
use crate::{Error, Kwargs, Result, Value};

/// A `RawImage` instance.
#[derive(Clone, Debug)]
pub struct ImageProxy(GenericProxy);

impl ImageProxy {
    pub fn new(inner: GenericProxy) -> Self {
        Self(inner)
    }

    pub fn generic(&self) -> &GenericProxy {
        &self.0
    }

    pub fn into_generic(self) -> GenericProxy {
        self.0
    }

    fn dimension(&self, name: &str) -> Result<usize> {
        self.0
            .handle()
            .get(name)?
            .as_usize()
            .ok_or_else(|| Error::conversion(format!("RawImage.{} is not a size", name)))
    }

    pub fn width(&self) -> Result<usize> {
        self.dimension("width")
    }

    pub fn height(&self) -> Result<usize> {
        self.dimension("height")
    }

    pub fn channels(&self) -> Result<usize> {
        self.dimension("channels")
    }

    /// The interleaved pixel buffer.
    pub fn pixels(&self) -> Result<Vec<u8>> {
        pixel_bytes(self.0.handle().get("data")?)
    }

    /// Pixels as a `(height, width, channels)` array.
    pub fn to_array(&self) -> Result<Array3<u8>> {
        let shape = (self.height()?, self.width()?, self.channels()?);
        Array3::from_shape_vec(shape, self.pixels()?)
            .map_err(|e| Error::conversion(format!("RawImage data does not fit its size: {}", e)))
    }

    /// Copy into a local image; one channel gives a grayscale image.
    pub fn to_local_image(&self) -> Result<LocalImage> {
        let channels = u8::try_from(self.channels()?)
            .map_err(|_| Error::conversion("RawImage has too many channels"))?;
        let width = u32::try_from(self.width()?)
            .map_err(|_| Error::conversion("RawImage is too wide"))?;
        let height = u32::try_from(self.height()?)
            .map_err(|_| Error::conversion("RawImage is too tall"))?;
        Ok(LocalImage::new(width, height, channels, self.pixels()?)?)
    }

    /// Save to `path`, the format chosen by its extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if !cfg!(feature = "image") {
            return Err(Error::unavailable("image encoder"));
        }
        Ok(self.to_local_image()?.save(path)?)
    }
}

fn pixel_bytes(data: ForeignValue) -> Result<Vec<u8>> {
    match data {
        ForeignValue::Bytes(b) => Ok(b.to_vec()),
        ForeignValue::Typed(t) if t.element_type == ElementType::Uint8 => Ok(t.data.to_vec()),
        ForeignValue::Array(items) => items
            .iter()
            .map(|v| {
                v.as_usize()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| Error::conversion("RawImage data holds a non-byte value"))
            })
            .collect(),
        ForeignValue::Handle(h) => match h.materialize()? {
            ForeignValue::Handle(_) => Err(Error::conversion("RawImage data is not an array")),
            materialized => pixel_bytes(materialized),
        },
        other => Err(Error::conversion(format!(
            "RawImage data is not a byte array: {:?}",
            other
        ))),
    }
}

impl ForeignProxy for ImageProxy {
    fn handle(&self) -> &Handle {
        self.0.handle()
    }

    fn get(&self, name: &str) -> Result<Value> {
        self.0.get(name)
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        self.0.set(name, value)
    }

    fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        self.0.call(args, kwargs)
    }

    fn index(&self, key: Index) -> Result<Value> {
        self.0.index(key)
    }

    fn set_item(&self, key: Index, value: Value) -> Result<()> {
        self.0.set_item(key, value)
    }
}
