//! Error types for the Core layer.

use tjs_handle::HandleError;

use crate::path::PathError;

/// Errors at the Core layer.
///
/// Foreign errors are carried unchanged; everything else is raised locally
/// before or after a boundary crossing.
#[derive(Debug)]
pub enum Error {
    /// The foreign side threw, or the handle could not be operated on.
    Foreign(HandleError),

    /// A capability is missing in this environment (blob host, image encoder).
    Unavailable { capability: String },

    /// An argument or state the operation cannot work with.
    Precondition { message: String },

    /// Attribute path validation error.
    Path(PathError),

    /// Media I/O or decoding failure.
    Media(tjs_media::Error),

    /// A foreign value could not be converted to the requested local form.
    Conversion { message: String },
}

impl Error {
    pub fn precondition(message: impl Into<String>) -> Self {
        Error::Precondition {
            message: message.into(),
        }
    }

    pub fn unavailable(capability: impl Into<String>) -> Self {
        Error::Unavailable {
            capability: capability.into(),
        }
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Error::Conversion {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Foreign(e) => write!(f, "{}", e),
            Error::Unavailable { capability } => {
                write!(f, "{} is not available in this environment", capability)
            }
            Error::Precondition { message } => write!(f, "{}", message),
            Error::Path(e) => write!(f, "path error: {}", e),
            Error::Media(e) => write!(f, "media error: {}", e),
            Error::Conversion { message } => write!(f, "conversion error: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Foreign(e) => Some(e),
            Error::Path(e) => Some(e),
            Error::Media(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HandleError> for Error {
    fn from(e: HandleError) -> Self {
        Error::Foreign(e)
    }
}

impl From<PathError> for Error {
    fn from(e: PathError) -> Self {
        Error::Path(e)
    }
}

impl From<tjs_media::Error> for Error {
    fn from(e: tjs_media::Error) -> Self {
        match e {
            tjs_media::Error::Unavailable { capability } => Error::Unavailable { capability },
            tjs_media::Error::Precondition { message } => Error::Precondition { message },
            tjs_media::Error::Foreign(e) => Error::Foreign(e),
            other => Error::Media(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn foreign_errors_display_unchanged() {
        let e = Error::from(HandleError::thrown("TypeError", "boom"));
        assert_eq!(e.to_string(), "TypeError: boom");
        assert!(e.source().is_some());
    }

    #[test]
    fn media_availability_maps_to_core_availability() {
        let e = Error::from(tjs_media::Error::unavailable("Blob"));
        assert!(matches!(e, Error::Unavailable { ref capability } if capability == "Blob"));
        assert!(e.to_string().contains("not available"));
    }

    #[test]
    fn media_io_stays_media() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e = Error::from(tjs_media::Error::from(io));
        assert!(matches!(e, Error::Media(_)));
        assert!(e.to_string().starts_with("media error"));
    }
}
