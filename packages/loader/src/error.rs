use tjs_handle::HandleError;

/// Errors of the loader layer.
///
/// Everything below the loader arrives as `Core`. A failed import is the one
/// case that is wrapped: `Initialization` adds the resolved location and
/// keeps the foreign error untouched as its `source()`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tjs_core::Error),

    /// The host failed to fetch or evaluate the library. Match on `source`
    /// for what the foreign side threw.
    #[error("Failed to initialize library from {location}: {source}")]
    Initialization {
        location: String,
        #[source]
        source: HandleError,
    },

    #[error("Invalid loader configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<HandleError> for Error {
    fn from(error: HandleError) -> Self {
        Error::Core(error.into())
    }
}

impl From<tjs_core::PathError> for Error {
    fn from(error: tjs_core::PathError) -> Self {
        Error::Core(error.into())
    }
}
