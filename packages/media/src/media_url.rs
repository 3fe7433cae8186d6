//! URL detection and blob-URL coercion.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tjs_handle::BlobHost;
use tracing::debug;

use crate::{Error, LocalImage, Result};

/// Whether `candidate` parses as an absolute URL, any scheme.
pub fn is_url(candidate: &str) -> bool {
    ::url::Url::parse(candidate).is_ok()
}

/// Something that can be turned into a fetchable URL.
#[derive(Clone, Debug)]
pub enum MediaInput {
    /// A local file, read when the URL is created.
    Path(PathBuf),
    Bytes(Bytes),
    /// Encoded as PNG.
    Image(LocalImage),
}

impl From<&str> for MediaInput {
    fn from(path: &str) -> Self {
        MediaInput::Path(PathBuf::from(path))
    }
}

impl From<String> for MediaInput {
    fn from(path: String) -> Self {
        MediaInput::Path(PathBuf::from(path))
    }
}

impl From<&Path> for MediaInput {
    fn from(path: &Path) -> Self {
        MediaInput::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for MediaInput {
    fn from(path: PathBuf) -> Self {
        MediaInput::Path(path)
    }
}

impl From<Bytes> for MediaInput {
    fn from(data: Bytes) -> Self {
        MediaInput::Bytes(data)
    }
}

impl From<Vec<u8>> for MediaInput {
    fn from(data: Vec<u8>) -> Self {
        MediaInput::Bytes(Bytes::from(data))
    }
}

impl From<LocalImage> for MediaInput {
    fn from(image: LocalImage) -> Self {
        MediaInput::Image(image)
    }
}

/// Turn media into a short-lived URL the foreign side can `fetch()`.
///
/// Files are read on every call, so a changed file yields a URL for its new
/// content. Fails with [`Error::Unavailable`] when no blob host is present.
pub fn as_url(input: impl Into<MediaInput>, blobs: Option<&dyn BlobHost>) -> Result<String> {
    let blobs = blobs.ok_or_else(|| Error::unavailable("Blob"))?;

    let data = match input.into() {
        MediaInput::Path(path) => {
            debug!(path = %path.display(), "Reading media file for blob URL");
            Bytes::from(std::fs::read(&path)?)
        }
        MediaInput::Bytes(data) => data,
        MediaInput::Image(image) => Bytes::from(image.to_png()?),
    };

    let url = blobs.create_object_url(data)?;
    debug!(url = %url, "Created blob URL");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tjs_handle::memory::MemoryRuntime;

    #[test]
    fn recognizes_urls() {
        assert!(is_url("https://example.com/cat.png"));
        assert!(is_url("blob:https://example.com/1234"));
        assert!(is_url("data:text/plain,hello"));
        assert!(!is_url("cat.png"));
        assert!(!is_url("/tmp/cat.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn bytes_become_blob_urls() {
        let rt = MemoryRuntime::new();
        let url = as_url(vec![1u8, 2, 3], Some(&rt)).unwrap();
        assert!(is_url(&url));
        assert_eq!(rt.blob(&url).unwrap().as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn missing_blob_host_is_unavailable() {
        let err = as_url(vec![0u8], None).unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let rt = MemoryRuntime::new();
        let err = as_url("/definitely/not/here.png", Some(&rt)).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
