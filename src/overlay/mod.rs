//! On-screen virtual pad
//!
//! The overlay turns touches on a fixed set of control zones into controller input
//! for the local player:
//!
//! 1. Layout model (this module) - base zone geometry in a 640x480 design space and
//!    the six user-adjustable transform groups
//! 2. [`layout`] - resolves zones to viewport rectangles for the current screen
//! 3. [`dispatcher`] - multi-touch hit-testing into buttons, triggers and the stick
//! 4. [`editor`] - edit mode, where drags and pinches move and scale a group
//! 5. [`pad`] - the view-level owner tying the above together
//!
//! # Architecture
//!
//! ```text
//! BASE_ZONES + TransformSet ──► resolve() ──► ResolvedLayout
//!                                                 │
//! TouchEvent ──────────────► TouchDispatcher ◄────┘ ──► TouchOutput
//!            └─(edit mode)─► OverlayEditor ──► TransformSet (persisted)
//! ```

pub mod dispatcher;
pub mod editor;
pub mod layout;
pub mod pad;

pub use dispatcher::{Pointer, PointerId, TouchAction, TouchDispatcher, TouchEvent, TouchOutput};
pub use editor::OverlayEditor;
pub use layout::{resolve, FormFactor, Rect, ResolvedLayout, ResolvedZone, Viewport};
pub use pad::VirtualPad;

use crate::buttons::{
    CONT_A, CONT_B, CONT_DPAD_DOWN, CONT_DPAD_LEFT, CONT_DPAD_RIGHT, CONT_DPAD_UP, CONT_START,
    CONT_X, CONT_Y,
};
use crate::persistence::KeyValueStore;
use tracing::{debug, info};

/// Width of the design space all base geometry is expressed in
pub const DESIGN_WIDTH: f32 = 640.0;
/// Height of the design space all base geometry is expressed in
pub const DESIGN_HEIGHT: f32 = 480.0;

/// Number of zones with stored base geometry
pub const BASE_ZONE_COUNT: usize = 13;
/// Base zones plus the four derived D-pad diagonals
pub const ZONE_COUNT: usize = 17;

/// Stable zone index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub usize);

impl ZoneId {
    pub const DPAD_LEFT: ZoneId = ZoneId(0);
    pub const DPAD_UP: ZoneId = ZoneId(1);
    pub const DPAD_RIGHT: ZoneId = ZoneId(2);
    pub const DPAD_DOWN: ZoneId = ZoneId(3);
    pub const BUTTON_X: ZoneId = ZoneId(4);
    pub const BUTTON_Y: ZoneId = ZoneId(5);
    pub const BUTTON_B: ZoneId = ZoneId(6);
    pub const BUTTON_A: ZoneId = ZoneId(7);
    pub const START: ZoneId = ZoneId(8);
    pub const LEFT_TRIGGER: ZoneId = ZoneId(9);
    pub const RIGHT_TRIGGER: ZoneId = ZoneId(10);
    pub const ANALOG_BASE: ZoneId = ZoneId(11);
    pub const ANALOG_NUB: ZoneId = ZoneId(12);
    pub const DPAD_UP_LEFT: ZoneId = ZoneId(13);
    pub const DPAD_UP_RIGHT: ZoneId = ZoneId(14);
    pub const DPAD_DOWN_LEFT: ZoneId = ZoneId(15);
    pub const DPAD_DOWN_RIGHT: ZoneId = ZoneId(16);

    pub const fn index(self) -> usize {
        self.0
    }

    /// Transform group that owns this zone
    pub fn group(self) -> TransformGroup {
        match self.0 {
            0..=3 | 13..=16 => TransformGroup::Dpad,
            4..=7 => TransformGroup::Buttons,
            8 => TransformGroup::Start,
            9 => TransformGroup::LeftTrigger,
            10 => TransformGroup::RightTrigger,
            _ => TransformGroup::Analog,
        }
    }
}

/// What a zone asserts while touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    /// Clears these bits of the active-low button word
    Button(u16),
    LeftTrigger,
    RightTrigger,
    AnalogBase,
    AnalogNub,
}

impl ZoneKind {
    /// Legacy integer code: the button mask, or the negative sentinel of a special zone
    pub const fn code(self) -> i32 {
        match self {
            ZoneKind::Button(mask) => mask as i32,
            ZoneKind::LeftTrigger => -1,
            ZoneKind::RightTrigger => -2,
            ZoneKind::AnalogBase => -3,
            ZoneKind::AnalogNub => -4,
        }
    }

    pub const fn button_mask(self) -> u16 {
        match self {
            ZoneKind::Button(mask) => mask,
            _ => 0,
        }
    }
}

/// A zone as stored: design-space geometry plus its kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseZone {
    pub id: ZoneId,
    pub rect: Rect,
    pub kind: ZoneKind,
}

const fn base(id: ZoneId, x: f32, y: f32, w: f32, h: f32, kind: ZoneKind) -> BaseZone {
    BaseZone {
        id,
        rect: Rect::new(x, y, w, h),
        kind,
    }
}

/// Base geometry of the thirteen stored zones, indexed by [`ZoneId`]
pub const BASE_ZONES: [BaseZone; BASE_ZONE_COUNT] = [
    base(ZoneId::DPAD_LEFT, 24.0, 88.0, 64.0, 64.0, ZoneKind::Button(CONT_DPAD_LEFT)),
    base(ZoneId::DPAD_UP, 88.0, 24.0, 64.0, 64.0, ZoneKind::Button(CONT_DPAD_UP)),
    base(ZoneId::DPAD_RIGHT, 152.0, 88.0, 64.0, 64.0, ZoneKind::Button(CONT_DPAD_RIGHT)),
    base(ZoneId::DPAD_DOWN, 88.0, 152.0, 64.0, 64.0, ZoneKind::Button(CONT_DPAD_DOWN)),
    base(ZoneId::BUTTON_X, 440.0, 344.0, 64.0, 64.0, ZoneKind::Button(CONT_X)),
    base(ZoneId::BUTTON_Y, 504.0, 280.0, 64.0, 64.0, ZoneKind::Button(CONT_Y)),
    base(ZoneId::BUTTON_B, 568.0, 344.0, 64.0, 64.0, ZoneKind::Button(CONT_B)),
    base(ZoneId::BUTTON_A, 504.0, 408.0, 64.0, 64.0, ZoneKind::Button(CONT_A)),
    base(ZoneId::START, 288.0, 392.0, 64.0, 64.0, ZoneKind::Button(CONT_START)),
    base(ZoneId::LEFT_TRIGGER, 440.0, 200.0, 90.0, 64.0, ZoneKind::LeftTrigger),
    base(ZoneId::RIGHT_TRIGGER, 542.0, 200.0, 90.0, 64.0, ZoneKind::RightTrigger),
    base(ZoneId::ANALOG_BASE, 0.0, 352.0, 128.0, 128.0, ZoneKind::AnalogBase),
    base(ZoneId::ANALOG_NUB, 48.0, 400.0, 32.0, 32.0, ZoneKind::AnalogNub),
];

/// The derived D-pad diagonals: (diagonal, horizontal neighbour, vertical neighbour)
pub const DIAGONALS: [(ZoneId, ZoneId, ZoneId); 4] = [
    (ZoneId::DPAD_UP_LEFT, ZoneId::DPAD_LEFT, ZoneId::DPAD_UP),
    (ZoneId::DPAD_UP_RIGHT, ZoneId::DPAD_RIGHT, ZoneId::DPAD_UP),
    (ZoneId::DPAD_DOWN_LEFT, ZoneId::DPAD_LEFT, ZoneId::DPAD_DOWN),
    (ZoneId::DPAD_DOWN_RIGHT, ZoneId::DPAD_RIGHT, ZoneId::DPAD_DOWN),
];

/// Horizontal edge a group sticks to when the viewport is wider than the design space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

/// Vertical edge a group sticks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAnchor {
    Top,
    Bottom,
}

/// The six independently adjustable control groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformGroup {
    Dpad,
    Buttons,
    Start,
    LeftTrigger,
    RightTrigger,
    Analog,
}

impl TransformGroup {
    pub const ALL: [TransformGroup; 6] = [
        TransformGroup::Dpad,
        TransformGroup::Buttons,
        TransformGroup::Start,
        TransformGroup::LeftTrigger,
        TransformGroup::RightTrigger,
        TransformGroup::Analog,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Name used in the persisted keys
    pub const fn key_name(self) -> &'static str {
        match self {
            TransformGroup::Dpad => "dpad",
            TransformGroup::Buttons => "buttons",
            TransformGroup::Start => "start",
            TransformGroup::LeftTrigger => "left_trigger",
            TransformGroup::RightTrigger => "right_trigger",
            TransformGroup::Analog => "analog",
        }
    }

    pub const fn anchors(self) -> (HorizontalAnchor, VerticalAnchor) {
        match self {
            TransformGroup::Dpad => (HorizontalAnchor::Left, VerticalAnchor::Top),
            TransformGroup::Buttons => (HorizontalAnchor::Right, VerticalAnchor::Bottom),
            TransformGroup::Start => (HorizontalAnchor::Center, VerticalAnchor::Bottom),
            TransformGroup::LeftTrigger | TransformGroup::RightTrigger => {
                (HorizontalAnchor::Right, VerticalAnchor::Top)
            }
            TransformGroup::Analog => (HorizontalAnchor::Left, VerticalAnchor::Bottom),
        }
    }

    /// Top-left corner of the group's base bounding box, the pivot for scaling
    pub fn pivot(self) -> (f32, f32) {
        BASE_ZONES
            .iter()
            .filter(|zone| zone.id.group() == self)
            .fold((f32::MAX, f32::MAX), |(x, y), zone| {
                (x.min(zone.rect.x), y.min(zone.rect.y))
            })
    }

    fn x_shift_key(self) -> String {
        format!("touch_x_shift_{}", self.key_name())
    }

    fn y_shift_key(self) -> String {
        format!("touch_y_shift_{}", self.key_name())
    }

    fn scale_key(self) -> String {
        format!("touch_scale_{}", self.key_name())
    }
}

/// User customization of one group: shift in design units and a scale factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneTransform {
    pub x_shift: f32,
    pub y_shift: f32,
    pub scale: f32,
}

impl ZoneTransform {
    pub const IDENTITY: ZoneTransform = ZoneTransform {
        x_shift: 0.0,
        y_shift: 0.0,
        scale: 1.0,
    };

    /// Applies the transform to a base rectangle of a group pivoting at `pivot`
    pub fn apply(&self, rect: Rect, pivot: (f32, f32)) -> Rect {
        Rect::new(
            pivot.0 + (rect.x - pivot.0) * self.scale + self.x_shift,
            pivot.1 + (rect.y - pivot.1) * self.scale + self.y_shift,
            rect.w * self.scale,
            rect.h * self.scale,
        )
    }
}

impl Default for ZoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Transforms of all six groups
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransformSet {
    groups: [ZoneTransform; 6],
}

impl TransformSet {
    pub fn get(&self, group: TransformGroup) -> ZoneTransform {
        self.groups[group.index()]
    }

    pub fn get_mut(&mut self, group: TransformGroup) -> &mut ZoneTransform {
        &mut self.groups[group.index()]
    }

    pub fn set(&mut self, group: TransformGroup, transform: ZoneTransform) {
        self.groups[group.index()] = transform;
    }

    pub fn is_identity(&self) -> bool {
        self.groups.iter().all(|t| *t == ZoneTransform::IDENTITY)
    }

    /// Loads every group; missing keys fall back to `(0, 0, 1)`
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut set = Self::default();
        for group in TransformGroup::ALL {
            let transform = ZoneTransform {
                x_shift: store.get_f32(&group.x_shift_key()).unwrap_or(0.0),
                y_shift: store.get_f32(&group.y_shift_key()).unwrap_or(0.0),
                scale: store.get_f32(&group.scale_key()).unwrap_or(1.0),
            };
            debug!("Loaded transform for {}: {:?}", group.key_name(), transform);
            set.set(group, transform);
        }
        set
    }

    /// Writes every group; writing unchanged values is a no-op for the stores
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        for group in TransformGroup::ALL {
            let transform = self.get(group);
            store.set_f32(&group.x_shift_key(), transform.x_shift);
            store.set_f32(&group.y_shift_key(), transform.y_shift);
            store.set_f32(&group.scale_key(), transform.scale);
        }
    }

    /// Restores identity transforms and drops every persisted override
    pub fn reset(&mut self, store: &mut dyn KeyValueStore) {
        info!("Resetting all overlay transforms");
        *self = Self::default();
        for group in TransformGroup::ALL {
            store.remove(&group.x_shift_key());
            store.remove(&group.y_shift_key());
            store.remove(&group.scale_key());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_base_zones_are_indexed_by_id() {
        for (i, zone) in BASE_ZONES.iter().enumerate() {
            assert_eq!(zone.id.index(), i);
        }
    }

    #[test]
    fn test_sentinel_codes_never_mix_with_masks() {
        for zone in BASE_ZONES {
            match zone.kind {
                ZoneKind::Button(mask) => assert!(mask != 0 && zone.kind.code() > 0),
                other => {
                    assert!(other.code() < 0);
                    assert_eq!(other.button_mask(), 0);
                }
            }
        }
    }

    #[test]
    fn test_thirteen_zones_in_six_groups() {
        let mut counts = [0usize; 6];
        for zone in BASE_ZONES {
            counts[zone.id.group().index()] += 1;
        }
        assert_eq!(counts, [4, 4, 1, 1, 1, 2]);
        for (diagonal, _, _) in DIAGONALS {
            assert_eq!(diagonal.group(), TransformGroup::Dpad);
        }
    }

    #[test]
    fn test_group_pivot_is_bounding_box_corner() {
        assert_eq!(TransformGroup::Dpad.pivot(), (24.0, 24.0));
        assert_eq!(TransformGroup::Buttons.pivot(), (440.0, 280.0));
        assert_eq!(TransformGroup::Analog.pivot(), (0.0, 352.0));
    }

    #[test]
    fn test_transform_scales_about_pivot() {
        let transform = ZoneTransform {
            x_shift: 10.0,
            y_shift: -5.0,
            scale: 2.0,
        };
        let rect = transform.apply(Rect::new(88.0, 24.0, 64.0, 64.0), (24.0, 24.0));
        assert_eq!(rect, Rect::new(24.0 + 128.0 + 10.0, 24.0 - 5.0, 128.0, 128.0));
    }

    #[test]
    fn test_transform_set_persistence() {
        let mut store = MemoryStore::new();
        let mut set = TransformSet::default();
        set.set(
            TransformGroup::Analog,
            ZoneTransform {
                x_shift: 12.5,
                y_shift: -3.0,
                scale: 1.5,
            },
        );
        set.save(&mut store);
        assert_eq!(store.get_f32("touch_scale_analog"), Some(1.5));
        assert_eq!(TransformSet::load(&store), set);

        set.reset(&mut store);
        assert!(set.is_identity());
        assert!(store.is_empty());
        assert_eq!(TransformSet::load(&store), TransformSet::default());
    }
}
