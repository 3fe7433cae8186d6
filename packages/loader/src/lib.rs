//! Module Loading
//!
//! Getting from "a version string" to a usable `Namespace`:
//! - `LoaderConfig`: where the library comes from and how it is initialized
//! - `resolve_source`: version or URL to a `ModuleSource`
//! - `ModuleLoader`: the host seam that fetches and evaluates a module
//! - `ModuleRegistry`: one initialized `Library` per key, loaded at most once
//! - `DeferredBinding`: a path into the library that imports on first call
//!
//! # Example
//!
//! ```rust,ignore
//! use tjs_loader::{DeferredBinding, ModuleRegistry};
//!
//! async fn classify(registry: &ModuleRegistry) -> Result<tjs_core::Value, tjs_loader::Error> {
//!     let pipeline = DeferredBinding::new("pipeline")?;
//!     let classifier = pipeline
//!         .invoke(registry, vec!["sentiment-analysis".into()], Default::default())
//!         .await?;
//!     // ...
//!     Ok(classifier)
//! }
//! ```

mod config;
mod deferred;
mod error;
mod loader;
mod registry;
mod source;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use config::{ExecutionContext, LoaderConfig};
pub use deferred::DeferredBinding;
pub use error::Error;
pub use loader::ModuleLoader;
pub use registry::ModuleRegistry;
pub use source::{resolve_source, ModuleSource};

pub type Result<T> = std::result::Result<T, Error>;
