//! Thumbnail rendering for extracted frames.
//!
//! Scene detection and keyframe extraction both yield raw [`Frame`]s; this
//! module turns them into image files and composite summary sheets.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use vidmatch_core::Frame;

use crate::error::{Result, VideoError};

/// Output format for thumbnail images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThumbnailFormat {
    /// JPEG, quality-controlled.
    #[default]
    Jpeg,
    /// PNG, lossless.
    Png,
}

impl ThumbnailFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ThumbnailFormat::Jpeg => "jpg",
            ThumbnailFormat::Png => "png",
        }
    }
}

/// Size specification for thumbnail output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size with the specified dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Fit within the given maximum dimensions while preserving aspect ratio.
    pub fn fit_within(
        original_width: u32,
        original_height: u32,
        max_width: u32,
        max_height: u32,
    ) -> Self {
        if original_width == 0 || original_height == 0 {
            return Self::new(max_width, max_height);
        }

        let width_ratio = max_width as f64 / original_width as f64;
        let height_ratio = max_height as f64 / original_height as f64;
        let ratio = width_ratio.min(height_ratio);

        Self {
            width: ((original_width as f64 * ratio) as u32).max(1),
            height: ((original_height as f64 * ratio) as u32).max(1),
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
        }
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// Configuration options for thumbnail rendering.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Output size (None = frame size).
    pub size: Option<Size>,
    /// Output format.
    pub format: ThumbnailFormat,
    /// Quality for lossy formats (0-100).
    pub quality: u8,
    /// Preserve aspect ratio when resizing.
    pub preserve_aspect_ratio: bool,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: None,
            format: ThumbnailFormat::Jpeg,
            quality: 85,
            preserve_aspect_ratio: true,
        }
    }
}

impl ThumbnailConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: ThumbnailFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the quality for lossy formats (0-100).
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.min(100);
        self
    }

    /// Set whether to preserve aspect ratio when resizing.
    pub fn preserve_aspect_ratio(mut self, enabled: bool) -> Self {
        self.preserve_aspect_ratio = enabled;
        self
    }
}

/// A renderable thumbnail wrapping an extracted frame.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    image: RgbImage,
}

impl Thumbnail {
    /// Build a thumbnail from an RGB frame.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        if frame.channels != 3 {
            return Err(VideoError::InvalidParameter(format!(
                "expected 3-channel RGB frame, got {} channels",
                frame.channels
            )));
        }
        let image = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| VideoError::InvalidParameter("frame buffer size mismatch".into()))?;
        Ok(Self { image })
    }

    /// Thumbnail width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Thumbnail height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Resize per the config, returning a new thumbnail.
    pub fn resized(&self, size: Size, preserve_aspect_ratio: bool) -> Self {
        let (w, h) = if preserve_aspect_ratio {
            let fitted = Size::fit_within(self.width(), self.height(), size.width, size.height);
            (fitted.width, fitted.height)
        } else {
            (size.width, size.height)
        };
        Self {
            image: image::imageops::resize(&self.image, w, h, FilterType::Triangle),
        }
    }

    /// Write the thumbnail to disk, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P, config: &ThumbnailConfig) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let rendered = match config.size {
            Some(size) => self.resized(size, config.preserve_aspect_ratio),
            None => self.clone(),
        };

        match config.format {
            ThumbnailFormat::Png => rendered
                .image
                .save_with_format(path, image::ImageFormat::Png)
                .map_err(|e| VideoError::DecoderFailed(format!("png encode failed: {e}"))),
            ThumbnailFormat::Jpeg => {
                let file = std::fs::File::create(path)?;
                let mut writer = std::io::BufWriter::new(file);
                let encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, config.quality);
                DynamicImage::ImageRgb8(rendered.image)
                    .write_with_encoder(encoder)
                    .map_err(|e| VideoError::DecoderFailed(format!("jpeg encode failed: {e}")))
            }
        }
    }
}

/// Composite frames into a single row-major grid image.
///
/// Each cell is `cell_width` by `cell_height`; frames are resized to fill
/// their cell. The sheet has `cols` columns and as many rows as needed.
pub fn create_summary_sheet(
    frames: &[Frame],
    cols: usize,
    cell_width: u32,
    cell_height: u32,
) -> Result<Thumbnail> {
    if frames.is_empty() {
        return Err(VideoError::InvalidParameter("empty frame list".into()));
    }
    if cols == 0 {
        return Err(VideoError::InvalidParameter("cols must be > 0".into()));
    }

    let rows = frames.len().div_ceil(cols);
    let mut sheet = RgbImage::new(cell_width * cols as u32, cell_height * rows as u32);

    for (i, frame) in frames.iter().enumerate() {
        let cell = Thumbnail::from_frame(frame)?
            .resized(Size::new(cell_width, cell_height), false)
            .image;
        let x = (i % cols) as u32 * cell_width;
        let y = (i / cols) as u32 * cell_height;
        image::imageops::overlay(&mut sheet, &cell, x as i64, y as i64);
    }

    Ok(Thumbnail { image: sheet })
}
