/// Tests for TextureProvisioner
///
/// Allocation contract: dimensions, usage, pre-fill and rejected inputs.

use super::*;
use crate::graphics_device::mock_graphics_device::{as_mock_texture, MockGraphicsDevice};

const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

fn provisioner(width: u32, height: u32, format: TextureFormat) -> TextureProvisioner {
    TextureProvisioner::new(MockGraphicsDevice::shared(), width, height, format)
}

// ============================================================================
// allocate
// ============================================================================

#[test]
fn test_allocate_matches_dimensions_and_usage() {
    let target = provisioner(64, 32, TextureFormat::R8G8B8A8_UNORM)
        .allocate(64, 32, TextureFormat::R8G8B8A8_UNORM)
        .unwrap();

    assert_eq!(target.width(), 64);
    assert_eq!(target.height(), 32);
    assert_eq!(target.format(), TextureFormat::R8G8B8A8_UNORM);
    assert!(target.usage().contains(TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED));
    assert!(target.usage().contains(TextureUsage::HOST_READBACK));
    assert_eq!(target.render_target().width(), 64);
    assert!(Arc::ptr_eq(target.render_target().texture(), target.texture()));
}

#[test]
fn test_allocate_prefills_every_pixel() {
    let target = provisioner(16, 8, TextureFormat::R8G8B8A8_UNORM)
        .allocate(16, 8, TextureFormat::R8G8B8A8_UNORM)
        .unwrap();

    let mock = as_mock_texture(target.texture());
    for y in 0..8 {
        for x in 0..16 {
            assert_eq!(mock.device_pixel(x, y), GREEN);
        }
    }
    let host = target.texture().host_memory().unwrap();
    assert!(host.bytes.chunks_exact(4).all(|p| p == [0, 255, 0, 255]));
}

#[test]
fn test_allocate_custom_fill_in_bgra() {
    let target = provisioner(2, 2, TextureFormat::B8G8R8A8_UNORM)
        .with_fill_color(ClearColor::rgba(1.0, 0.0, 0.0, 1.0))
        .allocate(2, 2, TextureFormat::B8G8R8A8_UNORM)
        .unwrap();

    let host = target.texture().host_memory().unwrap();
    assert!(host.bytes.chunks_exact(4).all(|p| p == [0, 0, 255, 255]));
}

#[test]
fn test_allocate_without_host_readback() {
    let target = provisioner(4, 4, TextureFormat::R8G8B8A8_UNORM)
        .with_host_readback(false)
        .allocate(4, 4, TextureFormat::R8G8B8A8_UNORM)
        .unwrap();

    assert!(!target.usage().contains(TextureUsage::HOST_READBACK));
    assert!(target.texture().host_memory().is_none());
}

#[test]
fn test_allocate_default_config_size() {
    let config = OffscreenConfig::default();
    let target = TextureProvisioner::from_config(MockGraphicsDevice::shared(), &config)
        .allocate(config.width, config.height, config.format)
        .unwrap();

    assert_eq!((target.width(), target.height()), (1080, 1920));
}

// ============================================================================
// Rejected inputs
// ============================================================================

#[test]
fn test_allocate_zero_size() {
    let result = provisioner(0, 4, TextureFormat::R8G8B8A8_UNORM).allocate(0, 4, TextureFormat::R8G8B8A8_UNORM);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_allocate_wide_format_rejected() {
    let result = provisioner(4, 4, TextureFormat::R16G16B16A16_SFLOAT)
        .allocate(4, 4, TextureFormat::R16G16B16A16_SFLOAT);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_allocate_other_triple_rejected() {
    let provisioner = provisioner(4, 4, TextureFormat::R8G8B8A8_UNORM);
    assert!(matches!(
        provisioner.allocate(8, 4, TextureFormat::R8G8B8A8_UNORM),
        Err(Error::InvalidResource(_))
    ));
    assert!(matches!(
        provisioner.allocate(4, 4, TextureFormat::R8G8B8A8_SRGB),
        Err(Error::InvalidResource(_))
    ));
}

#[test]
fn test_clone_shares_texture() {
    let target = provisioner(2, 2, TextureFormat::R8G8B8A8_UNORM)
        .allocate(2, 2, TextureFormat::R8G8B8A8_UNORM)
        .unwrap();
    let clone = target.clone();
    assert!(Arc::ptr_eq(clone.texture(), target.texture()));
}
