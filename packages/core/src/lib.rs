//! Core Bridge: Semantic Proxy Layer
//!
//! This layer gives meaning to the raw handles of `tjs-handle`:
//! - `Value`: the local view of anything that crossed the boundary
//! - `encode` / `decode`: the marshalling protocol between `Value` and `ForeignValue`
//! - `Proxy`: local stand-ins for foreign objects, specialized for the
//!   library's `RawImage` and `Tensor` types
//! - `Library` / `Namespace`: one imported copy of the library and its exports
//! - `AttrPath`: validated dotted attribute paths
//!
//! Use this layer for:
//! - Calling into an already-imported library
//! - Converting results into local data (arrays, images, JSON)
//!
//! # Example
//!
//! ```rust,ignore
//! use tjs_core::{ForeignProxy, Library, Value};
//!
//! async fn classify(library: &Library, text: &str) -> Result<Value, tjs_core::Error> {
//!     let ns = library.namespace();
//!     let pipeline = ns.get("pipeline")?.into_proxy()?;
//!     let classifier = pipeline
//!         .call(vec!["sentiment-analysis".into()], Default::default())?
//!         .settle()
//!         .await?
//!         .into_proxy()?;
//!     classifier.call(vec![text.into()], Default::default())?.settle().await
//! }
//! ```

pub use tjs_handle::{BlobHost, ForeignValue, Handle, HandleError, TypedArray};
pub use tjs_media::LocalImage;

mod codec;
pub mod convert;
mod error;
mod library;
mod path;
pub mod proxy;
mod value;

pub use codec::{decode, encode, encode_call_args, DefaultConverter};
pub use error::Error;
pub use library::{Library, Namespace};
pub use path::{AttrPath, PathError};
pub use proxy::{
    Axis, ClassProxy, ForeignProxy, GenericProxy, ImageProxy, Index, Proxy, Slice, TensorArray,
    TensorProxy,
};
pub use value::{PendingValue, Value};

/// Keyword arguments of a call, encoded as one trailing object literal.
pub type Kwargs = std::collections::BTreeMap<String, Value>;

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
