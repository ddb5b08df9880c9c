//! Virtual content module
//!
//! Face-anchored content variants (mask, glasses, robot head) and the
//! updater that keeps the selected variant bound to the tracked face.

mod face;
mod virtual_content;
mod content_updater;

pub use face::{BlendShape, FaceAnchor, FaceData};
pub use virtual_content::{
    GlassesOverlay, Mask, RobotHead, VirtualContent, VirtualContentType,
};
pub use content_updater::VirtualContentUpdater;
