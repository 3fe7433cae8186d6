//! transformers-js: call Transformers.js from Rust.
//!
//! The library lives in a JavaScript engine owned by the host. This crate
//! presents its object graph as local proxies, imports it on demand and
//! translates values in both directions.
//!
//! Layers, leaves first:
//! - `tjs-handle`: raw handles into the foreign object graph
//! - `tjs-media`: URLs for local media, WAV decoding
//! - `tjs-core`: the value codec and the proxies
//! - `tjs-loader`: version resolution, the import registry, deferred bindings
//!
//! # Example
//!
//! ```rust,ignore
//! use transformers_js::{pipeline, ForeignProxy, ModuleRegistry, Value};
//!
//! async fn run(registry: &ModuleRegistry) -> transformers_js::Result<Value> {
//!     let classifier = pipeline(registry, vec!["sentiment-analysis".into()], Default::default())
//!         .await?
//!         .into_proxy()?;
//!     Ok(classifier
//!         .call(vec!["I love transformers!".into()], Default::default())?
//!         .settle()
//!         .await?)
//! }
//! ```

pub use tjs_core::convert::{json_to_value, value_to_json};
pub use tjs_core::Error as CoreError;
pub use tjs_core::{
    AttrPath, Axis, ClassProxy, ForeignProxy, GenericProxy, ImageProxy, Index, Kwargs, Library,
    Namespace, PendingValue, Proxy, Slice, TensorArray, TensorProxy, Value,
};
pub use tjs_handle::{BlobHost, ForeignObject, ForeignValue, Handle, HandleError};
pub use tjs_loader::{
    resolve_source, DeferredBinding, Error, ExecutionContext, LoaderConfig, ModuleLoader,
    ModuleRegistry, ModuleSource, Result,
};
pub use tjs_media::{as_url, is_url, read_audio, Error as MediaError, LocalImage, MediaInput};

/// This crate's version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Import a version (or module URL) of the library.
pub async fn import_transformers_js(
    registry: &ModuleRegistry,
    version_or_url: &str,
) -> Result<Namespace> {
    registry.import(version_or_url).await
}

/// A binding for any top-level export, imported when first invoked.
///
/// ```rust
/// let tokenizer = transformers_js::deferred("AutoTokenizer")
///     .unwrap()
///     .attr("from_pretrained")
///     .unwrap();
/// assert_eq!(tokenizer.to_string(), "DeferredBinding(AutoTokenizer.from_pretrained)");
/// ```
pub fn deferred(name: &str) -> Result<DeferredBinding> {
    DeferredBinding::new(name)
}

/// `pipeline(...)` on the default version, importing it if needed.
pub async fn pipeline(registry: &ModuleRegistry, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
    deferred("pipeline")?.invoke(registry, args, kwargs).await
}

/// The library's `RawImage` class on the default version.
pub struct RawImage;

impl RawImage {
    /// `RawImage.read(input)`.
    ///
    /// `input` may be a URL, a local path, bytes, a `LocalImage` or an image
    /// proxy; local media is passed to the library by blob URL.
    pub async fn read(registry: &ModuleRegistry, input: impl Into<Value>) -> Result<Value> {
        deferred("RawImage.read")?
            .invoke(registry, vec![input.into()], Kwargs::new())
            .await
    }

    /// `RawImage.fromURL(url)`.
    pub async fn from_url(registry: &ModuleRegistry, url: &str) -> Result<Value> {
        deferred("RawImage.fromURL")?
            .invoke(registry, vec![url.into()], Kwargs::new())
            .await
    }
}
