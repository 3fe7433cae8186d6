//! Owned local images.

use std::path::Path;

use crate::{Error, Result};

/// An 8-bit image held on the local side, row-major and interleaved.
///
/// One channel is grayscale, two grayscale with alpha, three RGB, four RGBA.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalImage {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl LocalImage {
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<Self> {
        if !(1..=4).contains(&channels) {
            return Err(Error::precondition(format!(
                "unsupported channel count: {}",
                channels
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(Error::precondition(format!(
                "pixel buffer has {} bytes, expected {} for {}x{}x{}",
                pixels.len(),
                expected,
                width,
                height,
                channels
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    #[cfg(feature = "image")]
    fn color_type(&self) -> ::image::ExtendedColorType {
        use ::image::ExtendedColorType;
        match self.channels {
            1 => ExtendedColorType::L8,
            2 => ExtendedColorType::La8,
            3 => ExtendedColorType::Rgb8,
            _ => ExtendedColorType::Rgba8,
        }
    }

    /// Encode as PNG.
    #[cfg(feature = "image")]
    pub fn to_png(&self) -> Result<Vec<u8>> {
        use ::image::codecs::png::PngEncoder;
        use ::image::ImageEncoder;

        let mut out = Vec::new();
        PngEncoder::new(&mut out).write_image(
            &self.pixels,
            self.width,
            self.height,
            self.color_type(),
        )?;
        Ok(out)
    }

    #[cfg(not(feature = "image"))]
    pub fn to_png(&self) -> Result<Vec<u8>> {
        Err(Error::unavailable("image encoder"))
    }

    /// Write to `path`, the format chosen by its extension.
    #[cfg(feature = "image")]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        ::image::save_buffer(
            path,
            &self.pixels,
            self.width,
            self.height,
            self.color_type(),
        )?;
        Ok(())
    }

    #[cfg(not(feature = "image"))]
    pub fn save(&self, _path: impl AsRef<Path>) -> Result<()> {
        Err(Error::unavailable("image encoder"))
    }
}
