/// BindingGroup trait and binding group descriptors
///
/// A BindingGroup is an immutable set of shader resource bindings, created
/// against one pipeline and bound at one set index. Materials use it to
/// hand a sampled texture to the fragment stage.

use std::sync::Arc;
use crate::graphics_device::{ShaderStage, Texture};

/// Type of resource bound at a given slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// Texture and sampler in one binding
    CombinedImageSampler,
}

/// How a sampled texture is filtered and addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerType {
    /// Bilinear filtering, coordinates clamped to the edge
    #[default]
    LinearClamp,
    /// Nearest texel, coordinates clamped to the edge
    NearestClamp,
}

/// One binding slot of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingSlotDesc {
    /// Binding number (`layout(binding = N)` in GLSL)
    pub binding: u32,
    pub binding_type: BindingType,
    /// Shader stage reading the binding
    pub stage: ShaderStage,
}

/// Layout of one binding group, declared on the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingGroupLayoutDesc {
    pub entries: Vec<BindingSlotDesc>,
}

impl BindingGroupLayoutDesc {
    /// A single combined image sampler at binding 0, read by the fragment stage
    pub fn sampled_texture() -> Self {
        Self {
            entries: vec![BindingSlotDesc {
                binding: 0,
                binding_type: BindingType::CombinedImageSampler,
                stage: ShaderStage::Fragment,
            }],
        }
    }
}

/// A concrete resource written into a binding group, one per layout entry
pub enum BindingResource<'a> {
    SampledTexture(&'a Arc<dyn Texture>, SamplerType),
}

/// Immutable set of resource bindings
///
/// Keeps the bound resources alive. Create a new group to change them.
pub trait BindingGroup: Send + Sync {
    /// Set index this group was created for
    fn set_index(&self) -> u32;
}
