//! Layout resolution
//!
//! Maps the design-space zones through their group transforms into viewport pixels.
//! Resolution always starts from [`BASE_ZONES`] and the current [`TransformSet`], never
//! from a previous result, so resolving twice with the same inputs is bit-identical.

use super::{
    HorizontalAnchor, TransformGroup, TransformSet, VerticalAnchor, ZoneId, ZoneKind, BASE_ZONES,
    DESIGN_HEIGHT, DESIGN_WIDTH, DIAGONALS, ZONE_COUNT,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Half-open containment test
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Same size, centered on `(cx, cy)`
    pub fn centered_at(&self, cx: f32, cy: f32) -> Rect {
        Rect::new(cx - self.w / 2.0, cy - self.h / 2.0, self.w, self.h)
    }
}

/// Device class; selects the control-size constant and a few input quirks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFactor {
    #[default]
    Phone,
    Tablet,
    Tv,
}

impl FormFactor {
    /// Physical control size constant
    pub const fn magic(self) -> f32 {
        match self {
            FormFactor::Phone | FormFactor::Tv => 0.7,
            FormFactor::Tablet => 0.8,
        }
    }

    /// Multiplier applied to edit-mode drag deltas
    pub const fn drag_factor(self) -> f32 {
        match self {
            FormFactor::Tablet => 2.0,
            _ => 1.0,
        }
    }
}

/// Screen the pad is drawn on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub density: f32,
    pub form_factor: FormFactor,
}

impl Viewport {
    pub fn new(width: f32, height: f32, density: f32, form_factor: FormFactor) -> Self {
        Self {
            width,
            height,
            density,
            form_factor,
        }
    }

    /// Viewport pixels per design unit, always derived from the height
    pub fn unit(&self) -> f32 {
        self.height / DESIGN_HEIGHT
    }

    /// Viewport pixels per design unit for the controls themselves
    pub fn control_scale(&self) -> f32 {
        self.unit() * self.density * self.form_factor.magic()
    }
}

/// A zone placed in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedZone {
    pub id: ZoneId,
    pub rect: Rect,
    pub kind: ZoneKind,
}

/// Result of one layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    viewport: Viewport,
    scale: f32,
    zones: [ResolvedZone; ZONE_COUNT],
}

impl ResolvedLayout {
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Viewport pixels per design unit used for the controls
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn zones(&self) -> &[ResolvedZone] {
        &self.zones
    }

    pub fn zone(&self, id: ZoneId) -> &ResolvedZone {
        &self.zones[id.index()]
    }

    pub fn analog_base(&self) -> Rect {
        self.zone(ZoneId::ANALOG_BASE).rect
    }

    /// Resting nub rectangle, centered in the analog base
    pub fn resting_nub(&self) -> Rect {
        let (cx, cy) = self.analog_base().center();
        self.zone(ZoneId::ANALOG_NUB).rect.centered_at(cx, cy)
    }

    /// First zone in ascending id order containing the point
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&ResolvedZone> {
        self.zones.iter().find(|zone| zone.rect.contains(x, y))
    }
}

/// Resolves every zone for `viewport` under `transforms`
pub fn resolve(viewport: Viewport, transforms: &TransformSet) -> ResolvedLayout {
    let unit = viewport.unit();
    let scl = viewport.control_scale();
    let tx = (viewport.width - DESIGN_WIDTH * unit) / 2.0;
    let ty = viewport.height - DESIGN_HEIGHT * unit;

    let place = |group: TransformGroup, design: Rect| -> Rect {
        let (h_anchor, v_anchor) = group.anchors();
        let x = match h_anchor {
            HorizontalAnchor::Left => tx + design.x * scl,
            HorizontalAnchor::Center => {
                tx + DESIGN_WIDTH / 2.0 * unit - (DESIGN_WIDTH / 2.0 - design.x) * scl
            }
            HorizontalAnchor::Right => tx + DESIGN_WIDTH * unit - (DESIGN_WIDTH - design.x) * scl,
        };
        let y = match v_anchor {
            VerticalAnchor::Top => ty + design.y * scl,
            VerticalAnchor::Bottom => ty + DESIGN_HEIGHT * unit - (DESIGN_HEIGHT - design.y) * scl,
        };
        Rect::new(x, y, design.w * scl, design.h * scl)
    };

    let mut zones = [ResolvedZone {
        id: ZoneId(0),
        rect: Rect::default(),
        kind: ZoneKind::AnalogNub,
    }; ZONE_COUNT];

    for zone in BASE_ZONES {
        let group = zone.id.group();
        let design = transforms.get(group).apply(zone.rect, group.pivot());
        zones[zone.id.index()] = ResolvedZone {
            id: zone.id,
            rect: place(group, design),
            kind: zone.kind,
        };
    }

    for (diagonal, horizontal, vertical) in DIAGONALS {
        let h = zones[horizontal.index()];
        let v = zones[vertical.index()];
        zones[diagonal.index()] = ResolvedZone {
            id: diagonal,
            rect: Rect::new(h.rect.x, v.rect.y, h.rect.w, v.rect.h),
            kind: ZoneKind::Button(h.kind.button_mask() | v.kind.button_mask()),
        };
    }

    debug!(
        "Resolved layout for {}x{} (unit {:.3}, control scale {:.3})",
        viewport.width, viewport.height, unit, scl
    );

    ResolvedLayout {
        viewport,
        scale: scl,
        zones,
    }
}
