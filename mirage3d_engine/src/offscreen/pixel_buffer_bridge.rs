/// PixelBufferBridge - copies an offscreen target's memory into a pixel buffer.
///
/// The output format is fixed (half float RGBA). Source rows may carry
/// backend padding; output rows are tightly packed.

use std::time::Duration;
use half::f16;
use crate::config::DEFAULT_READBACK_TIMEOUT;
use crate::error::{Error, Result};
use crate::graphics_device::HostMemory;
use crate::{engine_trace, engine_warn};
use super::{OffscreenTarget, PixelBuffer, PixelFormat, RenderCompletion};

pub struct PixelBufferBridge {
    format: PixelFormat,
    timeout: Duration,
}

impl PixelBufferBridge {
    /// Bridge waiting at most `timeout` for a frame to complete
    pub fn new(timeout: Duration) -> Self {
        Self {
            format: PixelFormat::Rgba16Float,
            timeout,
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Convert `target` once the frame behind `completion` has finished
    ///
    /// Only the latest frame submitted into `target` can be read: every frame
    /// writes the same memory, so an older completion yields `None` instead
    /// of pixels that a newer frame may be overwriting. The check is repeated
    /// after the copy, which discards a read overlapped by a new submission.
    ///
    /// Returns `None` when the completion is stale or belongs to another
    /// target, when the wait fails or times out, when the target has no
    /// host-visible memory, or when its format cannot be converted.
    pub fn to_pixel_buffer(&self, target: &OffscreenTarget, completion: &RenderCompletion) -> Option<PixelBuffer> {
        if !completion.is_for(target) {
            engine_warn!(
                "mirage3d::PixelBufferBridge",
                "Frame {} was rendered into another target, no pixel buffer",
                completion.frame_index()
            );
            return None;
        }
        if !self.is_readable(completion) {
            return None;
        }
        match completion.wait_for(self.timeout) {
            Ok(()) => {}
            Err(e @ Error::Timeout(_)) => {
                engine_warn!("mirage3d::PixelBufferBridge", "{}, no pixel buffer", e);
                return None;
            }
            Err(e) => {
                engine_warn!(
                    "mirage3d::PixelBufferBridge",
                    "Waiting for frame {} failed: {}",
                    completion.frame_index(), e
                );
                return None;
            }
        }

        let host = self.host_memory(target)?;
        if !self.is_readable(completion) {
            return None;
        }
        self.convert_host(target, host)
    }

    /// Convert `target` as its memory is right now, without waiting
    ///
    /// Safe right after allocation. Once renders are in flight the result
    /// may mix frames; prefer `to_pixel_buffer`.
    pub fn to_pixel_buffer_now(&self, target: &OffscreenTarget) -> Option<PixelBuffer> {
        self.convert(target)
    }

    fn is_readable(&self, completion: &RenderCompletion) -> bool {
        if completion.is_latest() {
            return true;
        }
        engine_warn!(
            "mirage3d::PixelBufferBridge",
            "Frame {} superseded by a later render into the same target, no pixel buffer",
            completion.frame_index()
        );
        false
    }

    fn host_memory(&self, target: &OffscreenTarget) -> Option<HostMemory> {
        let host = target.texture().host_memory();
        if host.is_none() {
            engine_warn!(
                "mirage3d::PixelBufferBridge",
                "Offscreen target has no host-visible memory, no pixel buffer"
            );
        }
        host
    }

    fn convert(&self, target: &OffscreenTarget) -> Option<PixelBuffer> {
        let host = self.host_memory(target)?;
        self.convert_host(target, host)
    }

    fn convert_host(&self, target: &OffscreenTarget, host: HostMemory) -> Option<PixelBuffer> {
        match self.convert_memory(target, host) {
            Ok(buffer) => {
                engine_trace!(
                    "mirage3d::PixelBufferBridge",
                    "Converted {}x{} target into {:?} pixel buffer",
                    buffer.width(), buffer.height(), buffer.format()
                );
                Some(buffer)
            }
            Err(e) => {
                engine_warn!("mirage3d::PixelBufferBridge", "Pixel buffer conversion failed: {}", e);
                None
            }
        }
    }

    fn convert_memory(&self, target: &OffscreenTarget, host: HostMemory) -> Result<PixelBuffer> {
        let width = target.width() as usize;
        let height = target.height() as usize;
        let source_format = target.format();
        let source_bpp = source_format.bytes_per_pixel() as usize;

        if host.bytes_per_row < width * source_bpp {
            return Err(Error::InvalidResource(format!(
                "host row stride {} shorter than {} pixels of {:?}",
                host.bytes_per_row, width, source_format
            )));
        }
        if host.bytes.len() < host.bytes_per_row * height {
            return Err(Error::InvalidResource(format!(
                "host memory holds {} bytes, {} rows of {} needed",
                host.bytes.len(), height, host.bytes_per_row
            )));
        }

        let output_bpp = self.format.bytes_per_pixel();
        let mut data = Vec::with_capacity(width * height * output_bpp);
        for row in host.bytes.chunks(host.bytes_per_row).take(height) {
            for pixel in row[..width * source_bpp].chunks_exact(source_bpp) {
                let rgba = source_format.decode_color(pixel);
                for channel in rgba {
                    data.extend_from_slice(&f16::from_f32(channel).to_bits().to_le_bytes());
                }
            }
        }

        PixelBuffer::new(target.width(), target.height(), self.format, width * output_bpp, data)
    }
}

impl Default for PixelBufferBridge {
    fn default() -> Self {
        Self::new(DEFAULT_READBACK_TIMEOUT)
    }
}

#[cfg(test)]
#[path = "pixel_buffer_bridge_tests.rs"]
mod tests;
