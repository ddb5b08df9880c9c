/// PixelBuffer - CPU-addressable image handed to downstream image code.

use half::f16;
use crate::error::{Error, Result};
use crate::graphics_device::TextureFormat;

/// Pixel layout of a `PixelBuffer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit unsigned normalized RGBA
    Rgba8Unorm,
    /// 16-bit half float RGBA, little endian
    Rgba16Float,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8Unorm => 4,
            PixelFormat::Rgba16Float => 8,
        }
    }

    /// Texture format with the same memory layout
    pub fn texture_format(&self) -> TextureFormat {
        match self {
            PixelFormat::Rgba8Unorm => TextureFormat::R8G8B8A8_UNORM,
            PixelFormat::Rgba16Float => TextureFormat::R16G16B16A16_SFLOAT,
        }
    }
}

/// Owned image memory with an explicit row stride
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    bytes_per_row: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap `data` as a `width` x `height` image
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the stride is shorter than a row or the
    /// data does not hold `height` rows.
    pub fn new(width: u32, height: u32, format: PixelFormat, bytes_per_row: usize, data: Vec<u8>) -> Result<Self> {
        let row_size = width as usize * format.bytes_per_pixel();
        if bytes_per_row < row_size {
            return Err(Error::InvalidResource(format!(
                "row stride {} shorter than row size {}",
                bytes_per_row, row_size
            )));
        }
        if data.len() < bytes_per_row * height as usize {
            return Err(Error::InvalidResource(format!(
                "pixel data holds {} bytes, {} rows of {} needed",
                data.len(),
                height,
                bytes_per_row
            )));
        }
        Ok(Self { width, height, format, bytes_per_row, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Bytes of row `y`, without stride padding
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.bytes_per_row;
        Some(&self.data[start..start + self.width as usize * self.format.bytes_per_pixel()])
    }

    /// Linear RGBA color of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let row = self.row(y)?;
        let bytes = &row[x as usize * bpp..(x as usize + 1) * bpp];
        Some(match self.format {
            PixelFormat::Rgba8Unorm => [
                bytes[0] as f32 / 255.0,
                bytes[1] as f32 / 255.0,
                bytes[2] as f32 / 255.0,
                bytes[3] as f32 / 255.0,
            ],
            PixelFormat::Rgba16Float => {
                let mut rgba = [0.0; 4];
                for (channel, value) in rgba.iter_mut().enumerate() {
                    let bits = u16::from_le_bytes([bytes[channel * 2], bytes[channel * 2 + 1]]);
                    *value = f16::from_bits(bits).to_f32();
                }
                rgba
            }
        })
    }

    /// Convert to tightly packed 8-bit RGBA for image consumers
    pub fn to_rgba8(&self) -> PixelBuffer {
        if self.format == PixelFormat::Rgba8Unorm && self.bytes_per_row == self.width as usize * 4 {
            return self.clone();
        }
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                let rgba = self.pixel(x, y).unwrap_or_default();
                data.extend(rgba.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8));
            }
        }
        PixelBuffer {
            width: self.width,
            height: self.height,
            format: PixelFormat::Rgba8Unorm,
            bytes_per_row: self.width as usize * 4,
            data,
        }
    }
}

#[cfg(test)]
#[path = "pixel_buffer_tests.rs"]
mod tests;
