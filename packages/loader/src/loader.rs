//! The host seam for fetching and evaluating a module.

use async_trait::async_trait;
use tjs_core::Library;
use tjs_handle::HandleError;

use crate::ModuleSource;

/// Fetches and evaluates the library, returning its namespace.
///
/// Implemented by the host that owns the JavaScript engine. The returned
/// `Library` should carry the host's blob primitive so local media can be
/// passed by URL. Errors are whatever the engine threw; the registry wraps
/// them with the source location.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, source: &ModuleSource) -> Result<Library, HandleError>;
}

#[async_trait]
impl<T: ModuleLoader + ?Sized> ModuleLoader for std::sync::Arc<T> {
    async fn load(&self, source: &ModuleSource) -> Result<Library, HandleError> {
        (**self).load(source).await
    }
}
