/// SceneSnapshot - what the offscreen renderer draws for one frame.

use super::{SceneGraph, Viewpoint};

/// Scene graph and viewpoint borrowed for the duration of one render call
#[derive(Clone, Copy)]
pub struct SceneSnapshot<'a> {
    pub scene: &'a SceneGraph,
    pub viewpoint: &'a Viewpoint,
}

impl<'a> SceneSnapshot<'a> {
    pub fn new(scene: &'a SceneGraph, viewpoint: &'a Viewpoint) -> Self {
        Self { scene, viewpoint }
    }
}
