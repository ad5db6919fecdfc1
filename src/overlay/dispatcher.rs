//! Touch dispatcher - multi-touch to controller state
//!
//! Consumes pointer batches and produces the on-screen pad's contribution for the
//! local player. Every finger owns at most one logical channel (a button zone, a
//! trigger, or the analog stick) until that finger is lifted; lifting one finger never
//! disturbs what other fingers hold.
//!
//! # Gesture States
//!
//! ```text
//! Idle ──Down──► Tracking ──Up─────► Released
//!                    │
//!                    └────Cancel───► Cancelled
//! ```
//!
//! Button bits are rebuilt from the live pointers on every pass, so a zone's bit is
//! cleared exactly while some tracked pointer is inside it. The analog and trigger
//! bindings are sticky per pointer id.

use super::{ResolvedLayout, Rect, ZoneId, ZoneKind, ZONE_COUNT};
use crate::buttons::{RELEASED, TRIGGER_MAX};
use std::collections::HashMap;
use tracing::{debug, info};

pub type PointerId = i32;

/// Largest axis magnitude the stick produces
pub const AXIS_MAX: i16 = 127;

/// One live pointer of a touch event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub id: PointerId,
    pub x: f32,
    pub y: f32,
}

impl Pointer {
    pub fn new(id: PointerId, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

/// Touch event kind, modelled on the platform motion-event actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    /// First finger down, starts a gesture
    Down,
    Move,
    /// An additional finger went down
    PointerDown(PointerId),
    /// A finger other than the last one lifted; it is still listed in the batch
    PointerUp(PointerId),
    /// Last finger lifted, ends the gesture
    Up,
    Cancel,
}

/// A batch of pointers with the action that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub pointers: Vec<Pointer>,
}

impl TouchEvent {
    pub fn new(action: TouchAction, pointers: Vec<Pointer>) -> Self {
        Self { action, pointers }
    }

    fn lifted(&self) -> Option<PointerId> {
        match self.action {
            TouchAction::PointerUp(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Tracking,
    Released,
    Cancelled,
}

/// What a live pointer is currently driving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Zone(ZoneId),
    Analog,
    Unassigned,
}

/// Pad state produced by one dispatch pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchOutput {
    /// Active-low button word
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub axis_x: i16,
    pub axis_y: i16,
    /// A zone went from untouched to touched during this pass
    pub haptic: bool,
}

impl Default for TouchOutput {
    fn default() -> Self {
        Self {
            buttons: RELEASED,
            left_trigger: 0,
            right_trigger: 0,
            axis_x: 0,
            axis_y: 0,
            haptic: false,
        }
    }
}

/// Per-zone debounce counter values
const TOUCH_IDLE: u8 = 0;
const TOUCH_NEW: u8 = 1;
const TOUCH_HELD: u8 = 2;

#[derive(Debug, Clone)]
pub struct TouchDispatcher {
    state: GestureState,
    assignments: HashMap<PointerId, Assignment>,
    analog_pointer: Option<PointerId>,
    left_trigger_pointer: Option<PointerId>,
    right_trigger_pointer: Option<PointerId>,
    touch_state: [u8; ZONE_COUNT],
    nub: Rect,
    output: TouchOutput,
}

impl TouchDispatcher {
    pub fn new(layout: &ResolvedLayout) -> Self {
        Self {
            state: GestureState::Idle,
            assignments: HashMap::new(),
            analog_pointer: None,
            left_trigger_pointer: None,
            right_trigger_pointer: None,
            touch_state: [TOUCH_IDLE; ZONE_COUNT],
            nub: layout.resting_nub(),
            output: TouchOutput::default(),
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn output(&self) -> TouchOutput {
        self.output
    }

    /// Current nub rectangle in viewport pixels
    pub fn nub(&self) -> Rect {
        self.nub
    }

    pub fn assignment(&self, pointer: PointerId) -> Option<Assignment> {
        self.assignments.get(&pointer).copied()
    }

    pub fn analog_pointer(&self) -> Option<PointerId> {
        self.analog_pointer
    }

    /// Re-seats the nub after a layout pass; bindings survive
    pub fn on_layout(&mut self, layout: &ResolvedLayout) {
        if self.analog_pointer.is_none() {
            self.nub = layout.resting_nub();
        } else {
            let (cx, cy) = self.nub.center();
            self.nub = layout.resting_nub().centered_at(cx, cy);
            self.track_analog(layout, cx, cy);
        }
    }

    /// Runs one dispatch pass over `event`
    pub fn on_touch_event(&mut self, layout: &ResolvedLayout, event: &TouchEvent) -> TouchOutput {
        match event.action {
            TouchAction::Up | TouchAction::Cancel => {
                self.release_all(layout);
                self.state = if event.action == TouchAction::Up {
                    GestureState::Released
                } else {
                    GestureState::Cancelled
                };
                debug!("Gesture ended: {:?}", self.state);
                return self.output;
            }
            TouchAction::Down => {
                self.assignments.clear();
                self.state = GestureState::Tracking;
            }
            TouchAction::PointerUp(id) => self.release_pointer(layout, id),
            TouchAction::Move | TouchAction::PointerDown(_) => {
                self.state = GestureState::Tracking;
            }
        }

        let lifted = event.lifted();
        let live: Vec<Pointer> = event
            .pointers
            .iter()
            .copied()
            .filter(|p| Some(p.id) != lifted)
            .collect();

        // A bound analog pointer is tracked before anything is hit-tested
        if let Some(analog_id) = self.analog_pointer {
            if let Some(pointer) = live.iter().find(|p| p.id == analog_id) {
                self.track_analog(layout, pointer.x, pointer.y);
            }
        }

        let mut buttons = RELEASED;
        let mut touched = [false; ZONE_COUNT];
        let mut left_held = false;
        let mut right_held = false;

        for pointer in &live {
            if Some(pointer.id) == self.analog_pointer {
                touched[ZoneId::ANALOG_BASE.index()] = true;
                self.assignments.insert(pointer.id, Assignment::Analog);
                continue;
            }

            let Some(zone) = layout.hit_test(pointer.x, pointer.y) else {
                self.assignments.insert(pointer.id, Assignment::Unassigned);
                continue;
            };
            touched[zone.id.index()] = true;
            self.assignments.insert(pointer.id, Assignment::Zone(zone.id));

            match zone.kind {
                ZoneKind::Button(mask) => buttons &= !mask,
                ZoneKind::AnalogBase => {
                    if self.analog_pointer.is_none() {
                        debug!("Pointer {} bound to analog stick", pointer.id);
                        self.analog_pointer = Some(pointer.id);
                        self.assignments.insert(pointer.id, Assignment::Analog);
                        self.track_analog(layout, pointer.x, pointer.y);
                    }
                }
                ZoneKind::LeftTrigger => {
                    if bind_trigger(&mut self.left_trigger_pointer, pointer.id) {
                        left_held = true;
                    }
                }
                ZoneKind::RightTrigger => {
                    if bind_trigger(&mut self.right_trigger_pointer, pointer.id) {
                        right_held = true;
                    }
                }
                ZoneKind::AnalogNub => {}
            }
        }

        // A trigger finger that slid off its zone or vanished gives the trigger up
        if !left_held && self.left_trigger_pointer.take().is_some() {
            debug!("Left trigger released");
        }
        if !right_held && self.right_trigger_pointer.take().is_some() {
            debug!("Right trigger released");
        }

        let mut haptic = false;
        for (state, is_touched) in self.touch_state.iter_mut().zip(touched) {
            *state = match (is_touched, *state) {
                (false, _) => TOUCH_IDLE,
                (true, TOUCH_IDLE) => {
                    haptic = true;
                    TOUCH_NEW
                }
                (true, _) => TOUCH_HELD,
            };
        }

        self.output.buttons = buttons;
        self.output.left_trigger = if left_held { TRIGGER_MAX } else { 0 };
        self.output.right_trigger = if right_held { TRIGGER_MAX } else { 0 };
        self.output.haptic = haptic;
        self.output
    }

    /// Moves the nub toward `(x, y)`, clamped so it stays inside the base
    fn track_analog(&mut self, layout: &ResolvedLayout, x: f32, y: f32) {
        let base = layout.analog_base();
        let half_w = self.nub.w / 2.0;
        let half_h = self.nub.h / 2.0;
        let cx = x.min(base.right() - half_w).max(base.x + half_w);
        let cy = y.min(base.bottom() - half_h).max(base.y + half_h);
        self.nub = self.nub.centered_at(cx, cy);

        // Full deflection when the nub touches the rim
        let (bx, by) = base.center();
        self.output.axis_x = axis_value(cx - bx, base.w / 2.0 - half_w);
        self.output.axis_y = axis_value(cy - by, base.h / 2.0 - half_h);
    }

    /// Drops whatever `pointer` was bound to, leaving other pointers alone
    fn release_pointer(&mut self, layout: &ResolvedLayout, pointer: PointerId) {
        debug!("Pointer {} lifted", pointer);
        self.assignments.remove(&pointer);
        if self.analog_pointer == Some(pointer) {
            self.analog_pointer = None;
            self.nub = layout.resting_nub();
            self.output.axis_x = 0;
            self.output.axis_y = 0;
        }
        if self.left_trigger_pointer == Some(pointer) {
            self.left_trigger_pointer = None;
        }
        if self.right_trigger_pointer == Some(pointer) {
            self.right_trigger_pointer = None;
        }
    }

    fn release_all(&mut self, layout: &ResolvedLayout) {
        self.assignments.clear();
        self.analog_pointer = None;
        self.left_trigger_pointer = None;
        self.right_trigger_pointer = None;
        self.touch_state = [TOUCH_IDLE; ZONE_COUNT];
        self.nub = layout.resting_nub();
        self.output = TouchOutput::default();
    }

    /// Forgets the gesture entirely, e.g. when entering edit mode
    pub fn reset(&mut self, layout: &ResolvedLayout) {
        info!("Touch dispatcher reset");
        self.release_all(layout);
        self.state = GestureState::Idle;
    }
}

/// Binds `pointer` to a trigger slot unless another pointer already holds it
fn bind_trigger(slot: &mut Option<PointerId>, pointer: PointerId) -> bool {
    match *slot {
        Some(owner) => owner == pointer,
        None => {
            debug!("Pointer {} bound to trigger", pointer);
            *slot = Some(pointer);
            true
        }
    }
}

fn axis_value(offset: f32, half_extent: f32) -> i16 {
    if half_extent <= 0.0 {
        return 0;
    }
    let value = (offset * f32::from(AXIS_MAX) / half_extent).round();
    value.clamp(-f32::from(AXIS_MAX), f32::from(AXIS_MAX)) as i16
}
