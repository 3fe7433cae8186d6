use std::io::Write;

use tjs_handle::memory::MemoryRuntime;
use tjs_media::{as_url, is_url, LocalImage};

#[test]
fn path_input_is_read_fresh_each_time() {
    let rt = MemoryRuntime::new();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"first").unwrap();
    file.flush().unwrap();

    let first = as_url(file.path(), Some(&rt)).unwrap();
    assert_eq!(rt.blob(&first).unwrap().as_ref(), b"first");

    std::fs::write(file.path(), b"second").unwrap();
    let second = as_url(file.path(), Some(&rt)).unwrap();
    assert_ne!(first, second);
    assert_eq!(rt.blob(&second).unwrap().as_ref(), b"second");
}

#[test]
fn string_paths_are_files_not_urls() {
    let rt = MemoryRuntime::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audio.bin");
    std::fs::write(&path, [9u8, 8, 7]).unwrap();

    let url = as_url(path.to_string_lossy().into_owned(), Some(&rt)).unwrap();
    assert!(is_url(&url));
    assert_eq!(rt.blob(&url).unwrap().as_ref(), &[9, 8, 7]);
}

#[cfg(feature = "image")]
#[test]
fn images_cross_as_png() {
    let rt = MemoryRuntime::new();
    let image = LocalImage::new(2, 2, 4, vec![255; 16]).unwrap();
    let url = as_url(image, Some(&rt)).unwrap();
    let blob = rt.blob(&url).unwrap();
    assert_eq!(&blob[..8], b"\x89PNG\r\n\x1a\n");
}

#[cfg(not(feature = "image"))]
#[test]
fn images_need_the_encoder() {
    let rt = MemoryRuntime::new();
    let image = LocalImage::new(1, 1, 1, vec![0]).unwrap();
    assert!(matches!(
        as_url(image, Some(&rt)),
        Err(tjs_media::Error::Unavailable { .. })
    ));
}
