//! Frame capture
//!
//! A [`FrameSource`] stands in for the camera. Frames are encoded as JPEG
//! data URLs before they go out on the detection channel.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;

use crate::detection::FrameGeometry;
use crate::{Error, Result};

/// Default JPEG quality for outbound frames
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// File extensions picked up by [`ImageDirSource`]
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Provides video frames on demand
pub trait FrameSource: Send {
    /// Dimensions of the current frame, zero until one is available
    fn geometry(&self) -> FrameGeometry;

    /// Advance to and return the next frame
    ///
    /// Returns `Ok(None)` while no frame is available.
    ///
    /// # Errors
    ///
    /// Returns error if the frame cannot be read
    fn grab(&mut self) -> Result<Option<DynamicImage>>;
}

/// A frame ready to send to the detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    /// `data:image/jpeg;base64,...`
    pub data_url: String,
    pub geometry: FrameGeometry,
}

/// Grab and encode the next frame
///
/// Returns `Ok(None)` when the source is not ready, which is a normal
/// transient state.
///
/// # Errors
///
/// Returns error if the frame cannot be read or encoded
pub fn capture_frame(source: &mut dyn FrameSource, quality: u8) -> Result<Option<EncodedFrame>> {
    let Some(frame) = source.grab()? else {
        return Ok(None);
    };

    let geometry = FrameGeometry::new(frame.width(), frame.height());
    if !geometry.is_ready() {
        return Ok(None);
    }

    Ok(Some(EncodedFrame {
        data_url: encode_jpeg_data_url(&frame, quality)?,
        geometry,
    }))
}

/// Encode an image as a base64 JPEG data URL
///
/// # Errors
///
/// Returns error if JPEG encoding fails
pub fn encode_jpeg_data_url(frame: &DynamicImage, quality: u8) -> Result<String> {
    let mut jpeg = Cursor::new(Vec::new());
    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(frame.to_rgb8())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality))?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        STANDARD.encode(jpeg.into_inner())
    ))
}

/// Cycles through the images of a directory, in file name order
pub struct ImageDirSource {
    paths: Vec<PathBuf>,
    next: usize,
    geometry: FrameGeometry,
}

impl ImageDirSource {
    /// Scan a directory for JPEG and PNG files
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read
    pub fn open(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| Error::Capture(format!("cannot read {}: {e}", dir.display())))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image(path))
            .collect();
        paths.sort();

        if paths.is_empty() {
            tracing::warn!(dir = %dir.display(), "no frames found");
        } else {
            tracing::info!(dir = %dir.display(), frames = paths.len(), "frame source ready");
        }

        Ok(Self {
            paths,
            next: 0,
            geometry: FrameGeometry::default(),
        })
    }

    /// Number of frames in the cycle
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    fn grab(&mut self) -> Result<Option<DynamicImage>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next = (self.next + 1) % self.paths.len();

        let frame = image::open(path)?;
        self.geometry = FrameGeometry::new(frame.width(), frame.height());
        tracing::trace!(path = %path.display(), "grabbed frame");

        Ok(Some(frame))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}
