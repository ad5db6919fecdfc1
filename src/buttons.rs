//! Logical button bits, physical key codes and analog axis identifiers
//!
//! The emulated controller reports its digital state as a single 16-bit word in
//! active-low form: a cleared bit means "pressed", so a fully released pad reads
//! [`RELEASED`]. Physical key codes follow the Android `KeyEvent` numbering, which
//! is what the bundled vendor tables and the persisted per-button overrides use.

use serde::{Deserialize, Serialize};

pub const CONT_C: u16 = 1 << 0;
pub const CONT_B: u16 = 1 << 1;
pub const CONT_A: u16 = 1 << 2;
pub const CONT_START: u16 = 1 << 3;
pub const CONT_DPAD_UP: u16 = 1 << 4;
pub const CONT_DPAD_DOWN: u16 = 1 << 5;
pub const CONT_DPAD_LEFT: u16 = 1 << 6;
pub const CONT_DPAD_RIGHT: u16 = 1 << 7;
pub const CONT_Z: u16 = 1 << 8;
pub const CONT_Y: u16 = 1 << 9;
pub const CONT_X: u16 = 1 << 10;

/// All four cardinal D-pad bits
pub const CONT_DPAD_ALL: u16 = CONT_DPAD_UP | CONT_DPAD_DOWN | CONT_DPAD_LEFT | CONT_DPAD_RIGHT;

/// Active-low word with no button held
pub const RELEASED: u16 = 0xFFFF;

/// Full-scale trigger intensity
pub const TRIGGER_MAX: u8 = 255;

/// Physical key codes (Android `KeyEvent` numbering)
pub mod keycodes {
    pub const BACK: u32 = 4;
    pub const DPAD_UP: u32 = 19;
    pub const DPAD_DOWN: u32 = 20;
    pub const DPAD_LEFT: u32 = 21;
    pub const DPAD_RIGHT: u32 = 22;
    pub const DPAD_CENTER: u32 = 23;
    pub const MENU: u32 = 82;
    pub const BUTTON_A: u32 = 96;
    pub const BUTTON_B: u32 = 97;
    pub const BUTTON_C: u32 = 98;
    pub const BUTTON_X: u32 = 99;
    pub const BUTTON_Y: u32 = 100;
    pub const BUTTON_Z: u32 = 101;
    pub const BUTTON_L1: u32 = 102;
    pub const BUTTON_R1: u32 = 103;
    pub const BUTTON_L2: u32 = 104;
    pub const BUTTON_R2: u32 = 105;
    pub const BUTTON_THUMBL: u32 = 106;
    pub const BUTTON_THUMBR: u32 = 107;
    pub const BUTTON_START: u32 = 108;
    pub const BUTTON_SELECT: u32 = 109;
    pub const BUTTON_MODE: u32 = 110;
}

/// Analog axes a physical device can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisId {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
    HatX,
    HatY,
    LTrigger,
    RTrigger,
}

impl AxisId {
    pub const COUNT: usize = 10;

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One snapshot of every axis of a device, Android sign convention (down/right positive)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    values: [f32; AxisId::COUNT],
}

impl MotionSample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, axis: AxisId, value: f32) -> Self {
        self.set(axis, value);
        self
    }

    pub fn get(&self, axis: AxisId) -> f32 {
        self.values[axis.index()]
    }

    pub fn set(&mut self, axis: AxisId, value: f32) {
        self.values[axis.index()] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_released_word_has_every_button_bit_set() {
        for mask in [CONT_A, CONT_B, CONT_X, CONT_Y, CONT_START, CONT_DPAD_ALL] {
            assert_eq!(RELEASED & mask, mask);
        }
    }

    #[test]
    fn test_motion_sample_builder() {
        let sample = MotionSample::new().with(AxisId::X, 0.5).with(AxisId::Rz, -1.0);
        assert_eq!(sample.get(AxisId::X), 0.5);
        assert_eq!(sample.get(AxisId::Rz), -1.0);
        assert_eq!(sample.get(AxisId::Y), 0.0);
    }
}
