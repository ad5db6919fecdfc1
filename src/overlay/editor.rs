//! Edit mode: drags and pinches move and scale one control group instead of pressing it

use super::{PointerId, ResolvedLayout, TouchAction, TouchEvent, TransformGroup, TransformSet};
use crate::persistence::KeyValueStore;
use tracing::{debug, info, warn};

/// Tracks the group being edited and the last drag position
#[derive(Debug, Clone, Default)]
pub struct OverlayEditor {
    selected: Option<TransformGroup>,
    drag_pointer: Option<PointerId>,
    last: Option<(f32, f32)>,
}

impl OverlayEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<TransformGroup> {
        self.selected
    }

    /// Selects the group owning the zone under `(x, y)`, if any
    pub fn select(&mut self, layout: &ResolvedLayout, pointer: PointerId, x: f32, y: f32) -> Option<TransformGroup> {
        self.selected = layout.hit_test(x, y).map(|zone| zone.id.group());
        if let Some(group) = self.selected {
            debug!("Editing group {} with pointer {}", group.key_name(), pointer);
            self.drag_pointer = Some(pointer);
            self.last = Some((x, y));
        } else {
            self.drag_pointer = None;
            self.last = None;
        }
        self.selected
    }

    /// Moves the selected group by the pointer's travel since the last sample.
    /// Returns true when a transform changed.
    pub fn drag(&mut self, layout: &ResolvedLayout, transforms: &mut TransformSet, x: f32, y: f32) -> bool {
        let (Some(group), Some((last_x, last_y))) = (self.selected, self.last) else {
            return false;
        };
        self.last = Some((x, y));

        let scale = layout.scale();
        if scale <= 0.0 {
            return false;
        }
        let factor = layout.viewport().form_factor.drag_factor() / scale;
        let dx = (x - last_x) * factor;
        let dy = (y - last_y) * factor;
        if dx == 0.0 && dy == 0.0 {
            return false;
        }

        let transform = transforms.get_mut(group);
        transform.x_shift += dx;
        transform.y_shift += dy;
        true
    }

    /// Multiplies the selected group's scale by an incremental pinch factor
    pub fn pinch(&mut self, transforms: &mut TransformSet, factor: f32) -> bool {
        let Some(group) = self.selected else {
            return false;
        };
        if !factor.is_finite() || factor <= 0.0 {
            warn!("Ignoring pinch factor {} for group {}", factor, group.key_name());
            return false;
        }

        let transform = transforms.get_mut(group);
        let scaled = transform.scale * factor;
        if !scaled.is_finite() || scaled <= 0.0 {
            warn!(
                "Pinch would make scale of {} degenerate ({}), keeping {}",
                group.key_name(),
                scaled,
                transform.scale
            );
            return false;
        }
        transform.scale = scaled;
        true
    }

    /// Ends the gesture and drops the selection
    pub fn end(&mut self) {
        if let Some(group) = self.selected.take() {
            debug!("Finished editing group {}", group.key_name());
        }
        self.drag_pointer = None;
        self.last = None;
    }

    /// Feeds a touch event; returns true when the transforms changed and need a re-layout
    pub fn on_touch_event(
        &mut self,
        layout: &ResolvedLayout,
        transforms: &mut TransformSet,
        event: &TouchEvent,
    ) -> bool {
        match event.action {
            TouchAction::Down => {
                if let Some(p) = event.pointers.first() {
                    self.select(layout, p.id, p.x, p.y);
                }
                false
            }
            TouchAction::Move => {
                let tracked = self
                    .drag_pointer
                    .and_then(|id| event.pointers.iter().find(|p| p.id == id));
                match tracked {
                    Some(p) => self.drag(layout, transforms, p.x, p.y),
                    None => false,
                }
            }
            // A second finger means a pinch, which reports through `pinch`
            TouchAction::PointerDown(_) => {
                self.last = None;
                false
            }
            TouchAction::PointerUp(_) | TouchAction::Up | TouchAction::Cancel => {
                self.end();
                false
            }
        }
    }

    /// Restores every group to identity and drops persisted overrides
    pub fn reset(&mut self, transforms: &mut TransformSet, store: &mut dyn KeyValueStore) {
        info!("Resetting overlay layout");
        self.end();
        transforms.reset(store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{resolve, FormFactor, Pointer, Viewport, ZoneId};

    fn layout(form_factor: FormFactor) -> ResolvedLayout {
        resolve(Viewport::new(640.0, 480.0, 1.0, form_factor), &TransformSet::default())
    }

    #[test]
    fn test_select_maps_zone_to_group() {
        let layout = layout(FormFactor::Phone);
        let mut editor = OverlayEditor::new();
        let (x, y) = layout.zone(ZoneId::DPAD_UP_RIGHT).rect.center();
        assert_eq!(editor.select(&layout, 0, x, y), Some(TransformGroup::Dpad));
        assert_eq!(editor.select(&layout, 0, -5.0, -5.0), None);
    }

    #[test]
    fn test_drag_converts_to_design_units() {
        let layout = layout(FormFactor::Phone);
        let mut transforms = TransformSet::default();
        let mut editor = OverlayEditor::new();
        let (x, y) = layout.zone(ZoneId::START).rect.center();
        editor.select(&layout, 0, x, y);

        assert!(editor.drag(&layout, &mut transforms, x + 7.0, y - 14.0));
        let start = transforms.get(TransformGroup::Start);
        assert!((start.x_shift - 10.0).abs() < 1e-4);
        assert!((start.y_shift + 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_tablet_drag_is_doubled() {
        let layout = layout(FormFactor::Tablet);
        let mut transforms = TransformSet::default();
        let mut editor = OverlayEditor::new();
        let (x, y) = layout.zone(ZoneId::BUTTON_A).rect.center();
        editor.select(&layout, 0, x, y);
        editor.drag(&layout, &mut transforms, x + 8.0, y);
        // 8 px at control scale 0.8, doubled
        assert!((transforms.get(TransformGroup::Buttons).x_shift - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_rejected_pinch_factors() {
        let layout = layout(FormFactor::Phone);
        let mut transforms = TransformSet::default();
        let mut editor = OverlayEditor::new();
        assert!(!editor.pinch(&mut transforms, 2.0), "nothing selected");

        let (x, y) = layout.analog_base().center();
        editor.select(&layout, 0, x, y);
        for factor in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(!editor.pinch(&mut transforms, factor));
        }
        assert!(editor.pinch(&mut transforms, 1.5));
        assert_eq!(transforms.get(TransformGroup::Analog).scale, 1.5);
    }

    #[test]
    fn test_touch_sequence_drags_and_deselects() {
        let layout = layout(FormFactor::Phone);
        let mut transforms = TransformSet::default();
        let mut editor = OverlayEditor::new();
        let (x, y) = layout.zone(ZoneId::LEFT_TRIGGER).rect.center();

        let down = TouchEvent::new(TouchAction::Down, vec![Pointer::new(4, x, y)]);
        assert!(!editor.on_touch_event(&layout, &mut transforms, &down));
        let moved = TouchEvent::new(TouchAction::Move, vec![Pointer::new(4, x + 3.5, y)]);
        assert!(editor.on_touch_event(&layout, &mut transforms, &moved));
        let up = TouchEvent::new(TouchAction::Up, vec![Pointer::new(4, x + 3.5, y)]);
        editor.on_touch_event(&layout, &mut transforms, &up);

        assert_eq!(editor.selected(), None);
        assert!((transforms.get(TransformGroup::LeftTrigger).x_shift - 5.0).abs() < 1e-4);
    }
}
