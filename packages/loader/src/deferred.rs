//! Bindings that import the library on first use.

use std::fmt;

use tjs_core::{AttrPath, ForeignProxy, Kwargs, Value};
use tracing::debug;

use crate::{ModuleRegistry, Result};

/// A path into the library that has not been imported yet.
///
/// Extending the path never imports. `invoke` imports the default version,
/// walks the path and calls what it finds, awaiting the result if it is
/// pending.
///
/// ```rust
/// use tjs_loader::DeferredBinding;
///
/// let read = DeferredBinding::new("RawImage").unwrap().attr("read").unwrap();
/// assert_eq!(read.to_string(), "DeferredBinding(RawImage.read)");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeferredBinding {
    path: AttrPath,
}

impl DeferredBinding {
    /// A binding for a top-level export, or a dotted path from it.
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            path: AttrPath::parse(name)?,
        })
    }

    pub fn from_path(path: AttrPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &AttrPath {
        &self.path
    }

    /// A binding one attribute further down.
    #[must_use = "attr returns a new binding and leaves this one unchanged"]
    pub fn attr(&self, name: &str) -> Result<DeferredBinding> {
        Ok(Self {
            path: self.path.attr(name)?,
        })
    }

    /// Import, resolve and call.
    pub async fn invoke(
        &self,
        registry: &ModuleRegistry,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value> {
        let namespace = registry.import_default().await?;
        debug!(path = %self.path, "Invoking deferred binding");

        let (last, parents) = self.path.split_last();
        let result = match parents.split_first() {
            None => namespace.get(last)?.into_proxy()?.call(args, kwargs)?,
            Some((first, rest)) => {
                let mut target = namespace.get(first)?.into_proxy()?;
                for name in rest {
                    target = target.get(name)?.into_proxy()?;
                }
                target.call_method(last, args, kwargs)?
            }
        };
        Ok(result.settle().await?)
    }
}

impl fmt::Display for DeferredBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeferredBinding({})", self.path)
    }
}
