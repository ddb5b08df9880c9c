//! Engine and offscreen pipeline configuration
//!
//! All values are compile-time constants surfaced through `Default` impls.
//! There is no runtime reconfiguration surface: a pipeline built from a
//! config keeps it for its whole lifetime.

use std::time::Duration;
use crate::graphics_device::{ClearColor, TextureFormat};

/// Base preview width the offscreen target is scaled from
pub const BASE_TARGET_WIDTH: u32 = 360;
/// Base preview height the offscreen target is scaled from
pub const BASE_TARGET_HEIGHT: u32 = 640;
/// Scale applied to the base resolution
pub const TARGET_SCALE: u32 = 3;

/// Default offscreen target width (1080)
pub const DEFAULT_TARGET_WIDTH: u32 = BASE_TARGET_WIDTH * TARGET_SCALE;
/// Default offscreen target height (1920)
pub const DEFAULT_TARGET_HEIGHT: u32 = BASE_TARGET_HEIGHT * TARGET_SCALE;
/// Default offscreen target format
pub const DEFAULT_TARGET_FORMAT: TextureFormat = TextureFormat::R8G8B8A8_UNORM;

/// Solid color the target is pre-filled with before the first render (opaque green)
pub const DEFAULT_FILL_COLOR: ClearColor = ClearColor::rgba(0.0, 1.0, 0.0, 1.0);
/// Color each render pass clears to (opaque white)
pub const DEFAULT_CLEAR_COLOR: ClearColor = ClearColor::rgba(1.0, 1.0, 1.0, 1.0);

/// How long the pixel buffer bridge waits for a frame before giving up
pub const DEFAULT_READBACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Validation message severity filter for backends with debug layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything including info and verbose messages
    All,
}

/// Backend configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Validation message filter (only used when validation is enabled)
    pub debug_severity: DebugSeverity,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            app_name: "Mirage3D Application".to_string(),
            app_version: (1, 0, 0),
        }
    }
}

/// What to do when no compatible GPU device can be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceLossPolicy {
    /// Report the initialization error to the caller, which terminates
    Fatal,
    /// Keep running with offscreen rendering disabled
    DisableOffscreen,
}

/// Offscreen pipeline configuration
#[derive(Debug, Clone)]
pub struct OffscreenConfig {
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
    /// Target pixel format
    pub format: TextureFormat,
    /// Pre-fill color written at allocation time
    pub fill_color: ClearColor,
    /// Clear color for every render pass
    pub clear_color: ClearColor,
    /// Keep a host-visible copy of the target after every render
    pub host_readback: bool,
    /// Convert every rendered frame into a pixel buffer
    pub capture_pixel_buffers: bool,
    /// Upper bound for waiting on a frame before reading it back
    pub readback_timeout: Duration,
    /// Behavior when the GPU device is unavailable
    pub device_loss_policy: DeviceLossPolicy,
}

impl Default for OffscreenConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_TARGET_WIDTH,
            height: DEFAULT_TARGET_HEIGHT,
            format: DEFAULT_TARGET_FORMAT,
            fill_color: DEFAULT_FILL_COLOR,
            clear_color: DEFAULT_CLEAR_COLOR,
            host_readback: true,
            capture_pixel_buffers: false,
            readback_timeout: DEFAULT_READBACK_TIMEOUT,
            device_loss_policy: DeviceLossPolicy::Fatal,
        }
    }
}
