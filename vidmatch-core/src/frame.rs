//! Video frame representation used across extractors.

use crate::error::{Error, Result};

/// A decoded video frame (interleaved RGB or grayscale).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Raw pixel data, interleaved.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of channels (1 = grayscale, 3 = RGB).
    pub channels: u8,
}

impl Frame {
    /// Create a new frame. Fails if the buffer size does not match the
    /// declared geometry.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(Error::invalid_input(format!(
                "frame buffer is {} bytes, geometry {}x{}x{} needs {}",
                data.len(),
                width,
                height,
                channels,
                expected
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Total pixel count.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Luminance of the pixel at (x, y) as a 0-255 value.
    #[inline]
    pub fn luma_at(&self, x: usize, y: usize) -> u8 {
        let idx = (y * self.width as usize + x) * self.channels as usize;
        if self.channels >= 3 {
            let r = self.data[idx] as u32;
            let g = self.data[idx + 1] as u32;
            let b = self.data[idx + 2] as u32;
            ((r * 299 + g * 587 + b * 114) / 1000) as u8
        } else {
            self.data[idx]
        }
    }

    /// Convert to a grayscale plane (ITU-R BT.601 luma weights).
    pub fn to_grayscale(&self) -> Vec<u8> {
        let w = self.width as usize;
        let h = self.height as usize;
        let mut gray = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                gray.push(self.luma_at(x, y));
            }
        }
        gray
    }

    /// Downsample to a `target_w` x `target_h` grayscale grid by averaging
    /// each source block. Used by hash-style extractors where area averaging
    /// is more stable than point sampling.
    pub fn grayscale_resized(&self, target_w: usize, target_h: usize) -> Vec<u8> {
        let w = self.width as usize;
        let h = self.height as usize;
        let mut out = vec![0u8; target_w * target_h];

        for ty in 0..target_h {
            for tx in 0..target_w {
                let x0 = tx * w / target_w;
                let x1 = (((tx + 1) * w).div_ceil(target_w)).min(w).max(x0 + 1);
                let y0 = ty * h / target_h;
                let y1 = (((ty + 1) * h).div_ceil(target_h)).min(h).max(y0 + 1);

                let mut sum = 0u32;
                let mut count = 0u32;
                for y in y0..y1.min(h) {
                    for x in x0..x1.min(w) {
                        sum += self.luma_at(x, y) as u32;
                        count += 1;
                    }
                }
                out[ty * target_w + tx] = if count > 0 { (sum / count) as u8 } else { 0 };
            }
        }
        out
    }

    /// Bilinear resize, preserving channel count.
    pub fn resize_bilinear(&self, target_w: u32, target_h: u32) -> Frame {
        let src_w = self.width as usize;
        let src_h = self.height as usize;
        let ch = self.channels as usize;
        let tw = target_w as usize;
        let th = target_h as usize;
        let mut data = vec![0u8; tw * th * ch];

        let scale_x = src_w as f32 / tw as f32;
        let scale_y = src_h as f32 / th as f32;

        for y in 0..th {
            let src_y = (y as f32 + 0.5) * scale_y - 0.5;
            let y0 = (src_y.floor().max(0.0)) as usize;
            let y1 = (y0 + 1).min(src_h - 1);
            let fy = (src_y - y0 as f32).clamp(0.0, 1.0);

            for x in 0..tw {
                let src_x = (x as f32 + 0.5) * scale_x - 0.5;
                let x0 = (src_x.floor().max(0.0)) as usize;
                let x1 = (x0 + 1).min(src_w - 1);
                let fx = (src_x - x0 as f32).clamp(0.0, 1.0);

                for c in 0..ch {
                    let v00 = self.data[(y0 * src_w + x0) * ch + c] as f32;
                    let v01 = self.data[(y0 * src_w + x1) * ch + c] as f32;
                    let v10 = self.data[(y1 * src_w + x0) * ch + c] as f32;
                    let v11 = self.data[(y1 * src_w + x1) * ch + c] as f32;

                    let top = v00 * (1.0 - fx) + v01 * fx;
                    let bottom = v10 * (1.0 - fx) + v11 * fx;
                    data[(y * tw + x) * ch + c] = (top * (1.0 - fy) + bottom * fy).round() as u8;
                }
            }
        }

        Frame {
            data,
            width: target_w,
            height: target_h,
            channels: self.channels,
        }
    }
}
