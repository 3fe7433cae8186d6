use tjs_handle::HandleError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{capability} is not available in this environment")]
    Unavailable { capability: String },

    #[error("{message}")]
    Precondition { message: String },

    #[error("Foreign error: {0}")]
    Foreign(#[from] HandleError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] ::image::ImageError),
}

impl Error {
    pub fn unavailable(capability: impl Into<String>) -> Self {
        Error::Unavailable {
            capability: capability.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Error::Precondition {
            message: message.into(),
        }
    }
}
