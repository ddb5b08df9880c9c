/// Virtual content variants attached to a tracked face.
///
/// Each variant owns a small subtree of the scene graph, rooted at a node
/// that follows the face anchor. The capability set is fixed:
/// `attach`, `update` and `detach`.

use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::error::{Error, Result};
use crate::scene::{Mesh, NodeKey, SceneGraph, SceneNode};
use crate::engine_debug;
use super::{BlendShape, FaceAnchor, FaceData};

const MASK_COLOR: [f32; 4] = [0.92, 0.92, 0.92, 1.0];
const GLASSES_COLOR: [f32; 4] = [0.05, 0.05, 0.05, 1.0];
const ROBOT_HEAD_COLOR: [f32; 4] = [0.6, 0.62, 0.66, 1.0];
const ROBOT_EYE_COLOR: [f32; 4] = [0.1, 0.6, 1.0, 1.0];
const ROBOT_JAW_COLOR: [f32; 4] = [0.45, 0.47, 0.5, 1.0];

const LENS_OFFSET: Vec3 = Vec3::new(0.032, 0.025, 0.06);
const BRIDGE_OFFSET: Vec3 = Vec3::new(0.0, 0.03, 0.06);

const EYE_OFFSET: Vec3 = Vec3::new(0.04, 0.03, 0.081);
const JAW_REST: Vec3 = Vec3::new(0.0, -0.08, 0.02);
const BROW_REST: Vec3 = Vec3::new(0.0, 0.07, 0.081);
/// Distance the jaw drops when fully open
const JAW_TRAVEL: f32 = 0.04;
/// Distance the brow rises when fully raised
const BROW_TRAVEL: f32 = 0.015;

/// Kind of content a user can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualContentType {
    /// Mask following the tracked face geometry
    FaceGeometry,
    /// Glasses model placed on the face
    OverlayModel,
    /// Robot head animated by blend shapes
    BlendShapeModel,
}

impl VirtualContentType {
    pub const ALL: [VirtualContentType; 3] = [
        VirtualContentType::FaceGeometry,
        VirtualContentType::OverlayModel,
        VirtualContentType::BlendShapeModel,
    ];
}

/// Mask content: the tracked face mesh, opaque
#[derive(Debug, Default)]
pub struct Mask {
    anchor_node: Option<NodeKey>,
    geometry_node: Option<NodeKey>,
}

/// Glasses content: a frame in front of the eyes plus a hidden face occluder
#[derive(Debug, Default)]
pub struct GlassesOverlay {
    anchor_node: Option<NodeKey>,
    occluder_node: Option<NodeKey>,
    lens_nodes: [Option<NodeKey>; 2],
}

/// Robot head content driven by expression coefficients
#[derive(Debug, Default)]
pub struct RobotHead {
    anchor_node: Option<NodeKey>,
    eye_nodes: [Option<NodeKey>; 2],
    jaw_node: Option<NodeKey>,
    brow_node: Option<NodeKey>,
}

/// Face-anchored content
#[derive(Debug)]
pub enum VirtualContent {
    Mask(Mask),
    GlassesOverlay(GlassesOverlay),
    RobotHead(RobotHead),
}

impl VirtualContent {
    /// Detached content of the given type
    pub fn for_type(content_type: VirtualContentType) -> Self {
        match content_type {
            VirtualContentType::FaceGeometry => VirtualContent::Mask(Mask::default()),
            VirtualContentType::OverlayModel => VirtualContent::GlassesOverlay(GlassesOverlay::default()),
            VirtualContentType::BlendShapeModel => VirtualContent::RobotHead(RobotHead::default()),
        }
    }

    pub fn content_type(&self) -> VirtualContentType {
        match self {
            VirtualContent::Mask(_) => VirtualContentType::FaceGeometry,
            VirtualContent::GlassesOverlay(_) => VirtualContentType::OverlayModel,
            VirtualContent::RobotHead(_) => VirtualContentType::BlendShapeModel,
        }
    }

    /// Node following the face anchor, while attached
    pub fn anchor_node(&self) -> Option<NodeKey> {
        match self {
            VirtualContent::Mask(mask) => mask.anchor_node,
            VirtualContent::GlassesOverlay(glasses) => glasses.anchor_node,
            VirtualContent::RobotHead(robot) => robot.anchor_node,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.anchor_node().is_some()
    }

    /// Create this content's nodes under a new node placed at the anchor
    ///
    /// Attaching already attached content moves it to the new anchor.
    pub fn attach(&mut self, scene: &mut SceneGraph, anchor: &FaceAnchor) -> Result<NodeKey> {
        if self.is_attached() {
            self.detach(scene);
        }
        let anchor_node = scene.add_node(
            scene.root(),
            SceneNode::new(format!("face_anchor_{}", anchor.identifier)).with_transform(anchor.transform),
        )?;

        match self {
            VirtualContent::Mask(mask) => {
                mask.geometry_node = Some(scene.add_node(anchor_node, SceneNode::new("mask"))?);
                mask.anchor_node = Some(anchor_node);
            }
            VirtualContent::GlassesOverlay(glasses) => {
                let mut occluder = SceneNode::new("face_occluder");
                occluder.visible = false;
                glasses.occluder_node = Some(scene.add_node(anchor_node, occluder)?);

                let lens = Arc::new(Mesh::quad(0.05, 0.035, GLASSES_COLOR));
                for (slot, side) in glasses.lens_nodes.iter_mut().zip([-1.0f32, 1.0]) {
                    let offset = Vec3::new(side * LENS_OFFSET.x, LENS_OFFSET.y, LENS_OFFSET.z);
                    *slot = Some(scene.add_node(
                        anchor_node,
                        SceneNode::new("lens")
                            .with_mesh(lens.clone())
                            .with_transform(Mat4::from_translation(offset)),
                    )?);
                }
                scene.add_node(
                    anchor_node,
                    SceneNode::new("bridge")
                        .with_mesh(Arc::new(Mesh::cuboid(Vec3::new(0.02, 0.005, 0.005), GLASSES_COLOR)))
                        .with_transform(Mat4::from_translation(BRIDGE_OFFSET)),
                )?;
                glasses.anchor_node = Some(anchor_node);
            }
            VirtualContent::RobotHead(robot) => {
                scene.add_node(
                    anchor_node,
                    SceneNode::new("head").with_mesh(Arc::new(Mesh::cuboid(Vec3::new(0.16, 0.2, 0.16), ROBOT_HEAD_COLOR))),
                )?;
                let eye = Arc::new(Mesh::cuboid(Vec3::new(0.03, 0.03, 0.01), ROBOT_EYE_COLOR));
                for (slot, side) in robot.eye_nodes.iter_mut().zip([-1.0f32, 1.0]) {
                    let offset = Vec3::new(side * EYE_OFFSET.x, EYE_OFFSET.y, EYE_OFFSET.z);
                    *slot = Some(scene.add_node(
                        anchor_node,
                        SceneNode::new("eye")
                            .with_mesh(eye.clone())
                            .with_transform(Mat4::from_translation(offset)),
                    )?);
                }
                robot.jaw_node = Some(scene.add_node(
                    anchor_node,
                    SceneNode::new("jaw")
                        .with_mesh(Arc::new(Mesh::cuboid(Vec3::new(0.1, 0.03, 0.1), ROBOT_JAW_COLOR)))
                        .with_transform(Mat4::from_translation(JAW_REST)),
                )?);
                robot.brow_node = Some(scene.add_node(
                    anchor_node,
                    SceneNode::new("brow")
                        .with_mesh(Arc::new(Mesh::cuboid(Vec3::new(0.1, 0.01, 0.01), ROBOT_JAW_COLOR)))
                        .with_transform(Mat4::from_translation(BROW_REST)),
                )?);
                robot.anchor_node = Some(anchor_node);
            }
        }

        engine_debug!("mirage3d::content", "{:?} attached to face {}", self.content_type(), anchor.identifier);
        Ok(anchor_node)
    }

    /// Move the content to the anchor's new pose
    pub fn follow(&mut self, scene: &mut SceneGraph, anchor: &FaceAnchor) -> Result<()> {
        let anchor_node = self.require_attached()?;
        scene.set_transform(anchor_node, anchor.transform);
        Ok(())
    }

    /// React to new face data
    ///
    /// Mask and glasses rebuild the face mesh from the tracked vertices.
    /// The robot head moves its parts from the blend shape coefficients.
    pub fn update(&mut self, scene: &mut SceneGraph, face: &FaceData) -> Result<()> {
        self.require_attached()?;
        match self {
            VirtualContent::Mask(mask) => {
                if let Some(node) = mask.geometry_node {
                    replace_face_mesh(scene, node, face, MASK_COLOR)?;
                }
            }
            VirtualContent::GlassesOverlay(glasses) => {
                if let Some(node) = glasses.occluder_node {
                    replace_face_mesh(scene, node, face, GLASSES_COLOR)?;
                }
            }
            VirtualContent::RobotHead(robot) => {
                let blinks = [
                    face.blend_shape(BlendShape::EyeBlinkLeft),
                    face.blend_shape(BlendShape::EyeBlinkRight),
                ];
                for ((node, blink), side) in robot.eye_nodes.iter().zip(blinks).zip([-1.0f32, 1.0]) {
                    if let Some(node) = node {
                        let offset = Vec3::new(side * EYE_OFFSET.x, EYE_OFFSET.y, EYE_OFFSET.z);
                        let transform = Mat4::from_translation(offset)
                            * Mat4::from_scale(Vec3::new(1.0, 1.0 - blink, 1.0));
                        scene.set_transform(*node, transform);
                    }
                }
                if let Some(jaw) = robot.jaw_node {
                    let drop = JAW_TRAVEL * face.blend_shape(BlendShape::JawOpen);
                    scene.set_transform(jaw, Mat4::from_translation(JAW_REST - Vec3::Y * drop));
                }
                if let Some(brow) = robot.brow_node {
                    let lift = BROW_TRAVEL * face.blend_shape(BlendShape::BrowInnerUp);
                    scene.set_transform(brow, Mat4::from_translation(BROW_REST + Vec3::Y * lift));
                }
            }
        }
        Ok(())
    }

    /// Remove this content's nodes from the scene
    pub fn detach(&mut self, scene: &mut SceneGraph) {
        if let Some(anchor_node) = self.anchor_node() {
            scene.remove_node(anchor_node);
        }
        *self = VirtualContent::for_type(self.content_type());
    }

    fn require_attached(&self) -> Result<NodeKey> {
        self.anchor_node().ok_or_else(|| {
            Error::InvalidResource(format!("{:?} content is not attached to a face", self.content_type()))
        })
    }
}

fn replace_face_mesh(scene: &mut SceneGraph, node: NodeKey, face: &FaceData, color: [f32; 4]) -> Result<()> {
    if !face.has_geometry() {
        return Ok(());
    }
    let mesh = Mesh::from_indexed(&face.vertices, &face.triangle_indices, color)?;
    if let Some(node) = scene.node_mut(node) {
        node.mesh = Some(Arc::new(mesh));
    }
    Ok(())
}

#[cfg(test)]
#[path = "virtual_content_tests.rs"]
mod tests;
