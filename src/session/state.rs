use crate::buttons::RELEASED;
use crate::overlay::TouchOutput;
use chrono::{DateTime, Local};

/// Controller state of one player port as the emulator core sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInputState {
    /// Active-low button word
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub axis_x: i16,
    pub axis_y: i16,
}

impl Default for PlayerInputState {
    fn default() -> Self {
        Self::released()
    }
}

impl PlayerInputState {
    pub const fn released() -> Self {
        Self {
            buttons: RELEASED,
            left_trigger: 0,
            right_trigger: 0,
            axis_x: 0,
            axis_y: 0,
        }
    }

    /// Combines a physical pad with the on-screen pad.
    ///
    /// A button is pressed if either source presses it, triggers take the stronger
    /// input, and a deflected physical stick wins over the touch stick.
    pub fn merge_touch(&self, touch: &TouchOutput) -> Self {
        let stick_active = self.axis_x != 0 || self.axis_y != 0;
        Self {
            buttons: self.buttons & touch.buttons,
            left_trigger: self.left_trigger.max(touch.left_trigger),
            right_trigger: self.right_trigger.max(touch.right_trigger),
            axis_x: if stick_active { self.axis_x } else { touch.axis_x },
            axis_y: if stick_active { self.axis_y } else { touch.axis_y },
        }
    }
}

/// One push of the local player's state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputFrame {
    pub state: PlayerInputState,
    pub haptic: bool,
    pub timestamp: DateTime<Local>,
}

impl InputFrame {
    pub fn new(state: PlayerInputState, haptic: bool) -> Self {
        Self {
            state,
            haptic,
            timestamp: Local::now(),
        }
    }
}
