/// Canvas - CPU 2D drawing context used to pre-fill offscreen targets.
///
/// Pixels are 8-bit RGBA, big-endian byte order (R first in memory) with
/// premultiplied alpha, rows tightly packed.

use crate::error::{Error, Result};
use crate::graphics_device::ClearColor;

const BYTES_PER_PIXEL: usize = 4;

pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    /// Transparent canvas of `width` x `height` pixels
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidResource(format!(
                "canvas dimensions must be non-zero ({}x{})",
                width, height
            )));
        }
        let size = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| {
                Error::InvalidResource(format!("canvas of {}x{} pixels does not fit in memory", width, height))
            })?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; size],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Fill the whole canvas with a solid color
    pub fn fill(&mut self, color: ClearColor) {
        self.fill_rect(0, 0, self.width, self.height, color);
    }

    /// Fill a rectangle, clipped to the canvas bounds
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: ClearColor) {
        let pixel = premultiplied(color);
        let x_end = x.saturating_add(width).min(self.width) as usize;
        let y_end = y.saturating_add(height).min(self.height) as usize;
        let row_bytes = self.bytes_per_row();
        for row in (y as usize)..y_end {
            let start = row * row_bytes;
            for column in (x as usize)..x_end {
                let offset = start + column * BYTES_PER_PIXEL;
                self.data[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&pixel);
            }
        }
    }

    /// RGBA bytes of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.bytes_per_row() + x as usize * BYTES_PER_PIXEL;
        let mut pixel = [0u8; 4];
        pixel.copy_from_slice(&self.data[offset..offset + BYTES_PER_PIXEL]);
        Some(pixel)
    }
}

fn premultiplied(color: ClearColor) -> [u8; 4] {
    let alpha = color.a.clamp(0.0, 1.0);
    let channel = |value: f32| (value.clamp(0.0, 1.0) * alpha * 255.0).round() as u8;
    [
        channel(color.r),
        channel(color.g),
        channel(color.b),
        (alpha * 255.0).round() as u8,
    ]
}

#[cfg(test)]
#[path = "canvas_tests.rs"]
mod tests;
