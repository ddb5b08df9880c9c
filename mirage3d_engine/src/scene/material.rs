/// Material - surface inputs of a mesh node.

use std::fmt;
use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{SamplerType, Texture, TextureUsage};

/// Diffuse texture sampled across a mesh's texture coordinates
///
/// The drawn color is the vertex color times the sampled texel. An offscreen
/// target is used as a material through `OffscreenTarget::material`.
#[derive(Clone)]
pub struct Material {
    diffuse: Arc<dyn Texture>,
    sampler: SamplerType,
}

impl Material {
    /// Material sampling `diffuse` with bilinear filtering
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the texture lacks `TextureUsage::SAMPLED`.
    pub fn textured(diffuse: Arc<dyn Texture>) -> Result<Self> {
        if !diffuse.info().usage.contains(TextureUsage::SAMPLED) {
            return Err(Error::InvalidResource(format!(
                "material texture usage {:?} lacks SAMPLED",
                diffuse.info().usage
            )));
        }
        Ok(Self { diffuse, sampler: SamplerType::default() })
    }

    pub fn with_sampler(mut self, sampler: SamplerType) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn diffuse(&self) -> &Arc<dyn Texture> {
        &self.diffuse
    }

    pub fn sampler(&self) -> SamplerType {
        self.sampler
    }

    /// True when both materials sample the same texture the same way
    pub fn same_inputs(&self, other: &Material) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.diffuse), Arc::as_ptr(&other.diffuse))
            && self.sampler == other.sampler
    }
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.diffuse.info();
        f.debug_struct("Material")
            .field("diffuse", &format_args!("{}x{} {:?}", info.width, info.height, info.format))
            .field("sampler", &self.sampler)
            .finish()
    }
}
