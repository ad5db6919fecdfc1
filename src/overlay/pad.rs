use super::{
    resolve, OverlayEditor, ResolvedLayout, TouchDispatcher, TouchEvent, TouchOutput,
    TransformSet, Viewport,
};
use crate::persistence::KeyValueStore;
use tracing::info;

/// The on-screen pad: transforms, resolved zones, dispatcher and editor of one view.
///
/// Every layout pass writes the current transforms back to the store, which is a no-op
/// for values that did not change.
#[derive(Debug, Clone)]
pub struct VirtualPad {
    transforms: TransformSet,
    layout: ResolvedLayout,
    dispatcher: TouchDispatcher,
    editor: OverlayEditor,
    edit_mode: bool,
}

impl VirtualPad {
    /// Loads the persisted transforms and lays the pad out for `viewport`
    pub fn load(store: &mut dyn KeyValueStore, viewport: Viewport) -> Self {
        let transforms = TransformSet::load(store);
        let layout = resolve(viewport, &transforms);
        transforms.save(store);
        let dispatcher = TouchDispatcher::new(&layout);
        info!(
            "Virtual pad ready for {}x{}, custom layout: {}",
            viewport.width,
            viewport.height,
            !transforms.is_identity()
        );
        Self {
            transforms,
            layout,
            dispatcher,
            editor: OverlayEditor::new(),
            edit_mode: false,
        }
    }

    pub fn transforms(&self) -> &TransformSet {
        &self.transforms
    }

    pub fn layout(&self) -> &ResolvedLayout {
        &self.layout
    }

    pub fn dispatcher(&self) -> &TouchDispatcher {
        &self.dispatcher
    }

    pub fn editor(&self) -> &OverlayEditor {
        &self.editor
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Resolves the zones again from the transforms and persists them
    pub fn relayout(&mut self, store: &mut dyn KeyValueStore) {
        self.layout = resolve(*self.layout.viewport(), &self.transforms);
        self.transforms.save(store);
        self.dispatcher.on_layout(&self.layout);
    }

    pub fn set_viewport(&mut self, viewport: Viewport, store: &mut dyn KeyValueStore) {
        info!("Viewport changed to {}x{}", viewport.width, viewport.height);
        self.layout = resolve(viewport, &self.transforms);
        self.transforms.save(store);
        self.dispatcher.on_layout(&self.layout);
    }

    /// Switches between playing and editing; either switch drops the current gesture
    pub fn set_edit_mode(&mut self, enabled: bool) {
        if self.edit_mode == enabled {
            return;
        }
        info!("Overlay edit mode {}", if enabled { "enabled" } else { "disabled" });
        self.edit_mode = enabled;
        self.editor.end();
        self.dispatcher.reset(&self.layout);
    }

    /// Routes a touch event; returns the pad output unless edit mode consumed it
    pub fn on_touch_event(&mut self, event: &TouchEvent, store: &mut dyn KeyValueStore) -> Option<TouchOutput> {
        if self.edit_mode {
            if self.editor.on_touch_event(&self.layout, &mut self.transforms, event) {
                self.relayout(store);
            }
            return None;
        }
        Some(self.dispatcher.on_touch_event(&self.layout, event))
    }

    /// Applies an incremental pinch factor to the selected group in edit mode
    pub fn on_pinch(&mut self, factor: f32, store: &mut dyn KeyValueStore) -> bool {
        if !self.edit_mode {
            return false;
        }
        let changed = self.editor.pinch(&mut self.transforms, factor);
        if changed {
            self.relayout(store);
        }
        changed
    }

    pub fn end_pinch(&mut self) {
        self.editor.end();
    }

    /// Restores the default layout and removes the persisted overrides
    pub fn reset_layout(&mut self, store: &mut dyn KeyValueStore) {
        self.editor.reset(&mut self.transforms, store);
        self.layout = resolve(*self.layout.viewport(), &self.transforms);
        self.dispatcher.reset(&self.layout);
    }
}
