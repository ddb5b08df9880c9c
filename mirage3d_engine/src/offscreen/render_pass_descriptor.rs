/// RenderPassDescriptor - per-frame description of one offscreen pass.

use crate::graphics_device::{
    AttachmentDesc, ClearColor, ClearValue, ImageLayout, LoadOp, RenderPassDesc, StoreOp,
};
use super::OffscreenTarget;

/// What happens to the target's content when the pass begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadAction {
    /// Overwrite with the clear color
    Clear,
    /// Keep the previous content
    Load,
}

/// What happens to the rendered content when the pass ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreAction {
    Store,
    Discard,
}

/// Transient pass description, built per frame and consumed once
#[derive(Clone)]
pub struct RenderPassDescriptor {
    pub target: OffscreenTarget,
    pub clear_color: ClearColor,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
}

impl RenderPassDescriptor {
    /// Clear-then-store pass, the only kind the offscreen renderer issues
    pub fn clear_and_store(target: &OffscreenTarget, clear_color: ClearColor) -> Self {
        Self {
            target: target.clone(),
            clear_color,
            load_action: LoadAction::Clear,
            store_action: StoreAction::Store,
        }
    }

    /// Single color attachment matching this descriptor
    ///
    /// The attachment starts from `Undefined` when cleared (previous content
    /// is irrelevant) and always ends shader-readable so the target can be
    /// sampled as a material right after the pass.
    pub fn attachment(&self) -> AttachmentDesc {
        let (load_op, initial_layout) = match self.load_action {
            LoadAction::Clear => (LoadOp::Clear, ImageLayout::Undefined),
            LoadAction::Load => (LoadOp::Load, ImageLayout::ShaderReadOnly),
        };
        let store_op = match self.store_action {
            StoreAction::Store => StoreOp::Store,
            StoreAction::Discard => StoreOp::DontCare,
        };
        AttachmentDesc {
            format: self.target.format(),
            load_op,
            store_op,
            initial_layout,
            final_layout: ImageLayout::ShaderReadOnly,
        }
    }

    pub fn render_pass_desc(&self) -> RenderPassDesc {
        RenderPassDesc {
            color_attachments: vec![self.attachment()],
        }
    }

    pub fn clear_values(&self) -> Vec<ClearValue> {
        vec![self.clear_color.into()]
    }
}
