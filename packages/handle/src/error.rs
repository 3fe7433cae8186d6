//! Error types for the handle layer.
//!
//! Errors at this level describe what the foreign side reported. They are never
//! reinterpreted by higher layers, only carried through.

/// Errors raised while operating on a foreign handle.
#[derive(Debug)]
pub enum HandleError {
    /// The foreign side threw.
    ///
    /// `name` is the error class as the foreign runtime reports it
    /// (`TypeError`, `Error`, ...), `message` its message.
    Thrown { name: String, message: String },

    /// The handle does not refer to something callable.
    NotCallable,

    /// The handle does not refer to something constructible.
    NotConstructor,

    /// A pending result was awaited twice.
    AlreadySettled,

    /// Host transport failure (engine gone, channel closed, ...).
    Transport(Box<dyn std::error::Error + Send + Sync>),
}

impl HandleError {
    /// Shorthand for a foreign exception.
    pub fn thrown(name: impl Into<String>, message: impl Into<String>) -> Self {
        HandleError::Thrown {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for HandleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleError::Thrown { name, message } => write!(f, "{}: {}", name, message),
            HandleError::NotCallable => write!(f, "foreign value is not callable"),
            HandleError::NotConstructor => write!(f, "foreign value is not a constructor"),
            HandleError::AlreadySettled => write!(f, "pending value already settled"),
            HandleError::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for HandleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandleError::Transport(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HandleError {
    fn from(e: std::io::Error) -> Self {
        HandleError::Transport(Box::new(e))
    }
}
