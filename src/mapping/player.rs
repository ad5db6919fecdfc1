//! Spieler-Slots und die Verarbeitung von Tasten- und Achsereignissen physischer Geräte

use super::table::{select_table, Binding, MappingTable, RightStickMode, SlotModes};
use super::{MappingError, PLAYER_SLOTS};
use crate::buttons::*;
use crate::overlay::FormFactor;
use crate::persistence::{keys, KeyValueStore};
use crate::session::PlayerInputState;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Skalierung physischer Stickwerte (-1..1) auf die Achsen des Kerns
pub const STICK_SCALE: f32 = 126.0;
/// Auslenkung, ab der der Stick im Joystick-Modus das D-Pad drückt
pub const JOYSTICK_DPAD_THRESHOLD: f32 = 0.5;
/// Auslenkung, ab der der rechte Stick als Taste gilt
pub const STICK_BUTTON_THRESHOLD: f32 = 0.25;

/// Ergebnis eines Tastenereignisses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Kein gebundenes Gerät oder kein Eintrag in der Tabelle
    Ignored,
    Handled { slot: usize },
    /// Select wurde gedrückt
    MenuRequested { slot: usize },
}

/// Zustand eines Controller-Anschlusses
#[derive(Debug, Clone, Default)]
pub struct PlayerSlot {
    descriptor: Option<String>,
    modes: SlotModes,
    device_name: Option<String>,
    table: Option<MappingTable>,

    /// Letzte beiden Stickwerte, trennen echte Stickbewegung von D-Pad-Ereignissen
    previous_axis: (f32, f32),
    global_axis: (f32, f32),

    /// Rechter Stick steht gerade als Taste über der Schwelle
    was_key_stick: bool,
    stick_button: u16,
    stick_dpad: u16,

    /// Über Tasten gehaltene Bits (aktiv-hoch)
    held: u16,
    key_left_trigger: bool,
    key_right_trigger: bool,
    analog_left_trigger: u8,
    analog_right_trigger: u8,
    axis: (i16, i16),
}

impl PlayerSlot {
    fn load(store: &dyn KeyValueStore, slot: usize) -> Self {
        Self {
            descriptor: store.get_string(&keys::player_key(keys::DEVICE_DESCRIPTOR, slot)),
            modes: SlotModes::load(store, slot),
            ..Self::default()
        }
    }

    pub fn descriptor(&self) -> Option<&str> {
        self.descriptor.as_deref()
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn modes(&self) -> &SlotModes {
        &self.modes
    }

    pub fn table(&self) -> Option<&MappingTable> {
        self.table.as_ref()
    }

    /// Zustand, wie ihn der Kern für diesen Anschluss erhält
    pub fn input_state(&self) -> PlayerInputState {
        let pressed = self.held | self.stick_dpad | self.stick_button;
        let trigger = |key: bool, analog: u8| if key { TRIGGER_MAX } else { analog };
        PlayerInputState {
            buttons: RELEASED & !pressed,
            left_trigger: trigger(self.key_left_trigger, self.analog_left_trigger),
            right_trigger: trigger(self.key_right_trigger, self.analog_right_trigger),
            axis_x: self.axis.0,
            axis_y: self.axis.1,
        }
    }

    /// Lässt alles los, die Bindung bleibt erhalten
    fn release(&mut self) {
        *self = Self {
            descriptor: self.descriptor.take(),
            modes: self.modes,
            ..Self::default()
        };
    }

    fn apply_key(&mut self, binding: Binding, pressed: bool) {
        match binding {
            Binding::Buttons(mask) => {
                if pressed {
                    self.held |= mask;
                    if mask & CONT_DPAD_ALL != 0 {
                        // Stickwerte des Geräts sind bis zur nächsten echten Bewegung ungültig
                        self.global_axis = (0.0, 0.0);
                    }
                } else {
                    self.held &= !mask;
                }
            }
            Binding::LeftTrigger => self.key_left_trigger = pressed,
            Binding::RightTrigger => self.key_right_trigger = pressed,
            Binding::Menu => {}
        }
    }

    fn apply_motion(&mut self, sample: &MotionSample, form_factor: FormFactor) {
        let (left_y_axis, right_x_axis, right_y_axis) = match form_factor {
            FormFactor::Tv => (AxisId::Rz, AxisId::Rx, AxisId::Ry),
            _ => (AxisId::Y, AxisId::Z, AxisId::Rz),
        };

        let current = (sample.get(AxisId::X), sample.get(left_y_axis));
        if current != self.previous_axis {
            self.global_axis = current;
        }
        self.previous_axis = current;

        let (gx, gy) = self.global_axis;
        if self.modes.joystick {
            let mut dpad = 0;
            if gx < -JOYSTICK_DPAD_THRESHOLD {
                dpad |= CONT_DPAD_LEFT;
            } else if gx > JOYSTICK_DPAD_THRESHOLD {
                dpad |= CONT_DPAD_RIGHT;
            }
            if gy < -JOYSTICK_DPAD_THRESHOLD {
                dpad |= CONT_DPAD_UP;
            } else if gy > JOYSTICK_DPAD_THRESHOLD {
                dpad |= CONT_DPAD_DOWN;
            }
            self.stick_dpad = dpad;
            self.axis = (0, 0);
        } else {
            self.stick_dpad = 0;
            self.axis = (scale_stick(gx), scale_stick(gy));
        }

        let mut left = trigger_value(sample.get(AxisId::LTrigger));
        let mut right = trigger_value(sample.get(AxisId::RTrigger));

        let (rx, ry) = (sample.get(right_x_axis), sample.get(right_y_axis));
        match self.modes.right_stick {
            RightStickMode::Off => {}
            RightStickMode::AnalogTriggers => {
                if ry > 0.0 {
                    right = right.max(trigger_value(ry));
                } else {
                    left = left.max(trigger_value(-ry));
                }
            }
            RightStickMode::Buttons => self.apply_stick_button(rx, ry),
        }

        self.analog_left_trigger = left;
        self.analog_right_trigger = right;
    }

    fn apply_stick_button(&mut self, rx: f32, ry: f32) {
        let direction = if rx.abs().max(ry.abs()) <= STICK_BUTTON_THRESHOLD {
            None
        } else if ry.abs() >= rx.abs() {
            Some(if ry < 0.0 { CONT_Y } else { CONT_A })
        } else {
            Some(if rx < 0.0 { CONT_X } else { CONT_B })
        };

        match (direction, self.was_key_stick) {
            (Some(mask), false) => {
                debug!("Right stick pressed as button {:#06x}", mask);
                self.stick_button = mask;
                self.was_key_stick = true;
            }
            (Some(mask), true) if mask != self.stick_button => {
                debug!("Right stick moved to button {:#06x}", mask);
                self.stick_button = mask;
            }
            (None, true) => {
                debug!("Right stick button released");
                self.stick_button = 0;
                self.was_key_stick = false;
            }
            _ => {}
        }
    }
}

fn scale_stick(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * STICK_SCALE).round() as i16
}

fn trigger_value(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * f32::from(TRIGGER_MAX)).round() as u8
}

/// Verwaltet die vier Slots, ihre Bindungen und die aktiven Tabellen
#[derive(Debug, Clone)]
pub struct GamepadRegistry {
    slots: [PlayerSlot; PLAYER_SLOTS],
    /// Namen aller angeschlossenen Geräte nach Deskriptor
    connected: HashMap<String, String>,
    game_id: Option<String>,
    form_factor: FormFactor,
}

impl GamepadRegistry {
    /// Lädt Bindungen und Schalter aller Slots
    pub fn load(store: &dyn KeyValueStore, form_factor: FormFactor) -> Self {
        let slots = std::array::from_fn(|slot| PlayerSlot::load(store, slot));
        for (slot, player) in slots.iter().enumerate() {
            if let Some(descriptor) = player.descriptor() {
                debug!("Player {} bound to device {}", slot + 1, descriptor);
            }
        }
        Self {
            slots,
            connected: HashMap::new(),
            game_id: None,
            form_factor,
        }
    }

    pub fn slot(&self, slot: usize) -> Option<&PlayerSlot> {
        self.slots.get(slot)
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    /// Slot, an den `descriptor` gebunden ist
    pub fn slot_for(&self, descriptor: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.descriptor() == Some(descriptor))
    }

    /// Setzt das laufende Spiel; Slots im Kompatibilitätsmodus lesen danach dessen Bereich
    pub fn set_game(&mut self, game_id: Option<String>, store: &dyn KeyValueStore) {
        info!("Active game changed to {:?}", game_id);
        self.game_id = game_id;
        for slot in 0..PLAYER_SLOTS {
            self.refresh_table(slot, store);
        }
    }

    /// Ein Gerät wurde angeschlossen; liefert den Slot, falls es gebunden ist
    pub fn device_connected(&mut self, descriptor: &str, name: &str, store: &dyn KeyValueStore) -> Option<usize> {
        info!("Device connected: '{}' ({})", name, descriptor);
        self.connected.insert(descriptor.to_string(), name.to_string());
        let slot = self.slot_for(descriptor)?;
        self.refresh_table(slot, store);
        Some(slot)
    }

    /// Ein Gerät wurde getrennt; sein Slot lässt alle Tasten los
    pub fn device_disconnected(
        &mut self,
        descriptor: &str,
        players: &mut [PlayerInputState; PLAYER_SLOTS],
    ) -> Option<usize> {
        let name = self.connected.remove(descriptor);
        info!("Device disconnected: {:?} ({})", name, descriptor);
        let slot = self.slot_for(descriptor)?;
        let player = &mut self.slots[slot];
        player.release();
        player.device_name = None;
        player.table = None;
        players[slot] = player.input_state();
        Some(slot)
    }

    /// Bindet ein Gerät an einen Slot und speichert die Bindung.
    /// Eine bestehende Bindung desselben Geräts an einen anderen Slot wird gelöst.
    pub fn bind_device(
        &mut self,
        slot: usize,
        descriptor: &str,
        store: &mut dyn KeyValueStore,
        players: &mut [PlayerInputState; PLAYER_SLOTS],
    ) -> Result<(), MappingError> {
        if slot >= PLAYER_SLOTS {
            return Err(MappingError::InvalidSlot(slot));
        }
        if descriptor.trim().is_empty() {
            return Err(MappingError::InvalidDescriptor(descriptor.to_string()));
        }
        if let Some(previous) = self.slot_for(descriptor) {
            if previous != slot {
                self.unbind(previous, store, players)?;
            }
        }

        store.set_string(&keys::player_key(keys::DEVICE_DESCRIPTOR, slot), descriptor);
        let player = &mut self.slots[slot];
        player.release();
        player.descriptor = Some(descriptor.to_string());
        players[slot] = player.input_state();
        info!("Player {} bound to device {}", slot + 1, descriptor);
        self.refresh_table(slot, store);
        Ok(())
    }

    /// Löst die Bindung eines Slots
    pub fn unbind(
        &mut self,
        slot: usize,
        store: &mut dyn KeyValueStore,
        players: &mut [PlayerInputState; PLAYER_SLOTS],
    ) -> Result<(), MappingError> {
        let player = self.slots.get_mut(slot).ok_or(MappingError::InvalidSlot(slot))?;
        store.remove(&keys::player_key(keys::DEVICE_DESCRIPTOR, slot));
        *player = PlayerSlot {
            modes: player.modes,
            ..PlayerSlot::default()
        };
        players[slot] = player.input_state();
        info!("Player {} unbound", slot + 1);
        Ok(())
    }

    /// Ändert und speichert die Schalter eines Slots und wählt die Tabelle neu
    pub fn set_modes(
        &mut self,
        slot: usize,
        modes: SlotModes,
        store: &mut dyn KeyValueStore,
    ) -> Result<(), MappingError> {
        if slot >= PLAYER_SLOTS {
            return Err(MappingError::InvalidSlot(slot));
        }
        modes.save(store, slot);
        self.slots[slot].modes = modes;
        self.refresh_table(slot, store);
        Ok(())
    }

    /// Wählt die Tabelle eines Slots neu, sofern sein Gerät angeschlossen ist
    fn refresh_table(&mut self, slot: usize, store: &dyn KeyValueStore) {
        let player = &mut self.slots[slot];
        let Some(name) = player
            .descriptor
            .as_ref()
            .and_then(|descriptor| self.connected.get(descriptor))
        else {
            return;
        };
        let table = select_table(name, slot, &player.modes, store, self.game_id.as_deref());
        info!(
            "Player {} uses {} mapping for '{}'",
            slot + 1,
            table.source(),
            name
        );
        player.device_name = Some(name.clone());
        player.table = Some(table);
    }

    /// Verarbeitet eine Taste eines physischen Geräts
    pub fn on_key(
        &mut self,
        descriptor: &str,
        code: u32,
        pressed: bool,
        players: &mut [PlayerInputState; PLAYER_SLOTS],
    ) -> KeyOutcome {
        let Some(slot) = self.slot_for(descriptor) else {
            return KeyOutcome::Ignored;
        };
        let player = &mut self.slots[slot];
        let Some(binding) = player.table.as_ref().and_then(|table| table.lookup(code)) else {
            debug!("Key {} has no binding for player {}", code, slot + 1);
            return KeyOutcome::Ignored;
        };

        debug!(
            "Player {} key {} {} -> {:?}",
            slot + 1,
            code,
            if pressed { "down" } else { "up" },
            binding
        );
        player.apply_key(binding, pressed);
        players[slot] = player.input_state();

        match binding {
            Binding::Menu if pressed => KeyOutcome::MenuRequested { slot },
            _ => KeyOutcome::Handled { slot },
        }
    }

    /// Verarbeitet einen Achsen-Schnappschuss eines physischen Geräts
    pub fn on_motion(
        &mut self,
        descriptor: &str,
        sample: &MotionSample,
        players: &mut [PlayerInputState; PLAYER_SLOTS],
    ) -> Option<usize> {
        let slot = self.slot_for(descriptor)?;
        let player = &mut self.slots[slot];
        if player.table.is_none() {
            warn!("Motion from player {} before its device was classified", slot + 1);
            return None;
        }
        player.apply_motion(sample, self.form_factor);
        players[slot] = player.input_state();
        Some(slot)
    }
}
