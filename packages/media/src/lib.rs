//! Media helpers for the transformers.js bridge.
//!
//! The wrapped library reads images and audio through URLs, so binary media
//! has to be turned into something `fetch()` understands before it crosses the
//! boundary. This crate holds those coercions plus the local-side decoders:
//!
//! - [`is_url`] / [`as_url`]: URL detection and blob-URL coercion
//! - [`LocalImage`]: an owned pixel buffer, PNG-encodable with the `image` feature
//! - [`read_audio`]: WAV decoding, resampling and downmixing
//!
//! # Features
//!
//! - `image` (default): PNG encoding via the `image` crate. Without it,
//!   encoding and saving fail with [`Error::Unavailable`].

mod audio;
mod error;
mod local_image;
mod media_url;

pub use crate::audio::{downmix, read_audio, resample};
pub use crate::error::Error;
pub use crate::local_image::LocalImage;
pub use crate::media_url::{as_url, is_url, MediaInput};

pub type Result<T> = std::result::Result<T, Error>;
