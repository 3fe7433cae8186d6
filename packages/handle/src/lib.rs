//! Foreign Value Handles
//!
//! This is the narrow waist of the bridge. Everything at this level is a raw
//! reference into the foreign (JavaScript) object graph - no proxy selection,
//! no local value semantics, no knowledge of the wrapped library.
//!
//! Use this layer for:
//! - Implementing a host binding (a JS engine, a wasm-bindgen shim, a test double)
//! - Moving values across the boundary without interpreting them
//!
//! # Example
//!
//! ```rust,ignore
//! use tjs_handle::{ForeignValue, Handle, HandleError};
//!
//! fn read_width(image: &Handle) -> Result<Option<f64>, HandleError> {
//!     Ok(image.get("width")?.as_f64())
//! }
//! ```
//!
//! # Test Support
//!
//! Enable the `test-utils` feature for `MemoryRuntime`, an in-process object
//! graph that behaves like a small JavaScript heap.

pub use bytes::Bytes;

mod error;
mod handle;
mod value;

pub use error::HandleError;
pub use handle::{BlobHost, ForeignObject, Handle, ObjectId, TypeTag};
pub use value::{BoxFuture, ElementType, ForeignValue, Pending, TypedArray, TypedElement};

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

/// Result alias for handle operations.
pub type HandleResult<T> = Result<T, HandleError>;
