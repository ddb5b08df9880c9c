/// VirtualContentUpdater - keeps the selected content bound to the tracked face.
///
/// One content instance is kept per type, so switching back and forth does
/// not rebuild state. Only the selected instance is attached at any time.

use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::scene::SceneGraph;
use crate::engine_info;
use super::{FaceAnchor, FaceData, VirtualContent, VirtualContentType};

pub struct VirtualContentUpdater {
    contents: FxHashMap<VirtualContentType, VirtualContent>,
    selected: VirtualContentType,
    anchor: Option<FaceAnchor>,
}

impl VirtualContentUpdater {
    pub fn new(selected: VirtualContentType) -> Self {
        let contents = VirtualContentType::ALL
            .iter()
            .map(|content_type| (*content_type, VirtualContent::for_type(*content_type)))
            .collect();
        Self {
            contents,
            selected,
            anchor: None,
        }
    }

    pub fn selected(&self) -> VirtualContentType {
        self.selected
    }

    /// Currently tracked face anchor
    pub fn anchor(&self) -> Option<&FaceAnchor> {
        self.anchor.as_ref()
    }

    /// The selected content instance
    pub fn content(&self) -> Option<&VirtualContent> {
        self.contents.get(&self.selected)
    }

    /// Switch the selected content
    ///
    /// The previous content is detached; the new one is attached right away
    /// when a face is currently tracked.
    pub fn select(&mut self, scene: &mut SceneGraph, content_type: VirtualContentType) -> Result<()> {
        if content_type == self.selected {
            return Ok(());
        }
        if let Some(previous) = self.contents.get_mut(&self.selected) {
            previous.detach(scene);
        }
        self.selected = content_type;
        engine_info!("mirage3d::content", "Selected virtual content {:?}", content_type);

        if let Some(anchor) = self.anchor {
            if let Some(content) = self.contents.get_mut(&self.selected) {
                content.attach(scene, &anchor)?;
            }
        }
        Ok(())
    }

    /// A face started being tracked
    pub fn anchor_added(&mut self, scene: &mut SceneGraph, anchor: FaceAnchor, face: &FaceData) -> Result<()> {
        self.anchor = Some(anchor);
        if let Some(content) = self.contents.get_mut(&self.selected) {
            content.attach(scene, &anchor)?;
            content.update(scene, face)?;
        }
        Ok(())
    }

    /// The tracked face moved or changed expression
    ///
    /// Updates for a different face than the tracked one are ignored.
    pub fn anchor_updated(&mut self, scene: &mut SceneGraph, anchor: FaceAnchor, face: &FaceData) -> Result<()> {
        match self.anchor {
            Some(tracked) if tracked.identifier == anchor.identifier => {}
            Some(_) => return Ok(()),
            None => return self.anchor_added(scene, anchor, face),
        }
        self.anchor = Some(anchor);
        if let Some(content) = self.contents.get_mut(&self.selected) {
            if !content.is_attached() {
                content.attach(scene, &anchor)?;
            }
            content.follow(scene, &anchor)?;
            content.update(scene, face)?;
        }
        Ok(())
    }

    /// The tracked face was lost
    pub fn anchor_removed(&mut self, scene: &mut SceneGraph, identifier: u64) {
        if self.anchor.map(|a| a.identifier) != Some(identifier) {
            return;
        }
        self.anchor = None;
        for content in self.contents.values_mut() {
            content.detach(scene);
        }
    }
}

impl Default for VirtualContentUpdater {
    fn default() -> Self {
        Self::new(VirtualContentType::OverlayModel)
    }
}

#[cfg(test)]
#[path = "content_updater_tests.rs"]
mod tests;
