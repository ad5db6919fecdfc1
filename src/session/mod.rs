//! Input session with statum state machine
//!
//! Owns the per-port controller state and routes every input source into it: touches
//! through the [`VirtualPad`], physical keys and axes through the [`GamepadRegistry`].
//! After each event the affected port is pushed to the [`InputSink`]. Port 0 always
//! carries the touch pad merged with whatever physical pad is bound to it.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──start()──► Running
//! ```
//!
//! # Architecture
//!
//! ```text
//! TouchEvent ──► VirtualPad ───────► TouchOutput ──┐
//!                                                  ├──► players[4] ──► InputSink
//! DeviceEvent ─► GamepadRegistry ──► players[n] ───┘
//! ```

pub mod sink;
pub mod state;

pub use sink::{ChannelSink, InputSink, SinkUpdate};
pub use state::{InputFrame, PlayerInputState};

use crate::buttons::MotionSample;
use crate::controller::DeviceEvent;
use crate::mapping::{GamepadRegistry, KeyOutcome, MappingError, SlotModes, PLAYER_SLOTS};
use crate::overlay::{TouchEvent, TouchOutput, Viewport, VirtualPad};
use crate::persistence::{KeyValueStore, StoreError};
use statum::{machine, state};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Preference store error: {0}")]
    Store(#[from] StoreError),
}

/// States for the session lifecycle using statum
#[state]
#[derive(Debug, Clone)]
pub enum SessionState {
    Initializing, // Preferences loaded, nothing pushed yet
    Running,      // Routing events to the sink
}

#[machine]
pub struct InputSession<S: SessionState> {
    store: Box<dyn KeyValueStore>,
    pad: VirtualPad,
    registry: GamepadRegistry,
    players: [PlayerInputState; PLAYER_SLOTS],
    touch: TouchOutput,
    sink: Box<dyn InputSink>,
}

impl<S: SessionState> InputSession<S> {
    pub fn pad(&self) -> &VirtualPad {
        &self.pad
    }

    pub fn registry(&self) -> &GamepadRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        &*self.store
    }

    /// State of a port as last pushed; port 0 includes the touch pad
    pub fn player_state(&self, slot: usize) -> Option<PlayerInputState> {
        let state = self.players.get(slot)?;
        Some(if slot == 0 {
            state.merge_touch(&self.touch)
        } else {
            *state
        })
    }
}

impl InputSession<Initializing> {
    /// Loads the overlay layout and the slot bindings from `store`
    pub fn create(
        mut store: Box<dyn KeyValueStore>,
        sink: Box<dyn InputSink>,
        viewport: Viewport,
    ) -> Self {
        info!("Initializing input session");
        let pad = VirtualPad::load(&mut *store, viewport);
        let registry = GamepadRegistry::load(&*store, viewport.form_factor);

        Self::new(
            store,
            pad,
            registry,
            [PlayerInputState::released(); PLAYER_SLOTS],
            TouchOutput::default(),
            sink,
        )
    }

    /// Selects the game whose compat overrides apply
    pub fn with_game(mut self, game_id: Option<String>) -> Self {
        self.registry.set_game(game_id, &*self.store);
        self
    }

    /// Pushes the released state of every port and starts routing events
    pub fn start(self) -> InputSession<Running> {
        let mut session: InputSession<Running> = self.transition();
        for slot in 0..PLAYER_SLOTS {
            session.push(slot, false);
        }
        info!("Input session running");
        session
    }
}

impl InputSession<Running> {
    /// Routes a touch event to the pad; in edit mode nothing is pushed
    pub fn on_touch_event(&mut self, event: &TouchEvent) -> Option<TouchOutput> {
        let output = self.pad.on_touch_event(event, &mut *self.store)?;
        self.touch = output;
        self.push(0, output.haptic);
        Some(output)
    }

    pub fn on_pinch(&mut self, factor: f32) -> bool {
        self.pad.on_pinch(factor, &mut *self.store)
    }

    pub fn end_pinch(&mut self) {
        self.pad.end_pinch();
    }

    pub fn set_edit_mode(&mut self, enabled: bool) {
        if self.pad.edit_mode() == enabled {
            return;
        }
        self.pad.set_edit_mode(enabled);
        // Whatever the fingers held is released on the switch
        self.touch = TouchOutput::default();
        self.push(0, false);
    }

    pub fn reset_layout(&mut self) {
        self.pad.reset_layout(&mut *self.store);
        self.touch = TouchOutput::default();
        self.push(0, false);
    }

    /// Lays the pad out again; a held stick may move, so port 0 is pushed
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.pad.set_viewport(viewport, &mut *self.store);
        self.touch = self.pad.dispatcher().output();
        self.push(0, false);
    }

    pub fn set_game(&mut self, game_id: Option<String>) {
        self.registry.set_game(game_id, &*self.store);
    }

    pub fn on_key(&mut self, descriptor: &str, code: u32, pressed: bool) -> KeyOutcome {
        let outcome = self.registry.on_key(descriptor, code, pressed, &mut self.players);
        match outcome {
            KeyOutcome::Handled { slot } | KeyOutcome::MenuRequested { slot } => {
                self.push(slot, false)
            }
            KeyOutcome::Ignored => {}
        }
        outcome
    }

    pub fn on_motion(&mut self, descriptor: &str, sample: &MotionSample) -> Option<usize> {
        let slot = self.registry.on_motion(descriptor, sample, &mut self.players)?;
        self.push(slot, false);
        Some(slot)
    }

    pub fn device_connected(&mut self, descriptor: &str, name: &str) -> Option<usize> {
        self.registry.device_connected(descriptor, name, &*self.store)
    }

    pub fn device_disconnected(&mut self, descriptor: &str) -> Option<usize> {
        let slot = self.registry.device_disconnected(descriptor, &mut self.players)?;
        self.push(slot, false);
        Some(slot)
    }

    /// Dispatches a collector event; key events report their outcome
    pub fn on_device_event(&mut self, event: &DeviceEvent) -> Option<KeyOutcome> {
        match event {
            DeviceEvent::Connected { descriptor, name, .. } => {
                self.device_connected(descriptor, name);
                None
            }
            DeviceEvent::Disconnected { descriptor, .. } => {
                self.device_disconnected(descriptor);
                None
            }
            DeviceEvent::Key {
                descriptor,
                code,
                pressed,
                ..
            } => Some(self.on_key(descriptor, *code, *pressed)),
            DeviceEvent::Motion {
                descriptor, sample, ..
            } => {
                self.on_motion(descriptor, sample);
                None
            }
        }
    }

    pub fn bind_device(&mut self, slot: usize, descriptor: &str) -> Result<(), SessionError> {
        self.registry
            .bind_device(slot, descriptor, &mut *self.store, &mut self.players)?;
        self.push(slot, false);
        Ok(())
    }

    pub fn unbind(&mut self, slot: usize) -> Result<(), SessionError> {
        self.registry
            .unbind(slot, &mut *self.store, &mut self.players)?;
        self.push(slot, false);
        Ok(())
    }

    pub fn set_slot_modes(&mut self, slot: usize, modes: SlotModes) -> Result<(), SessionError> {
        self.registry.set_modes(slot, modes, &mut *self.store)?;
        Ok(())
    }

    /// Consumes the session and hands back the store, e.g. for a final flush
    pub fn into_store(self) -> Box<dyn KeyValueStore> {
        self.store
    }
}

impl<S: SessionState> InputSession<S> {
    fn push(&mut self, slot: usize, haptic: bool) {
        let Some(state) = self.player_state(slot) else {
            return;
        };
        let update = if slot == 0 {
            SinkUpdate::Local(InputFrame::new(state, haptic))
        } else {
            SinkUpdate::Remote {
                player: slot,
                buttons: state.buttons,
            }
        };
        debug!("Pushing {:?}", update);
        self.sink.push(update);
    }
}
