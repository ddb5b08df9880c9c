//! Scene module
//!
//! A minimal scene graph (nodes with transforms, meshes and materials), the viewpoint
//! it is rendered from, and the borrowed snapshot handed to the renderer.

mod mesh;
mod material;
mod scene_graph;
mod viewpoint;
mod snapshot;

pub use mesh::{Mesh, Vertex};
pub use material::Material;
pub use scene_graph::{Drawable, NodeKey, SceneGraph, SceneNode};
pub use viewpoint::Viewpoint;
pub use snapshot::SceneSnapshot;
