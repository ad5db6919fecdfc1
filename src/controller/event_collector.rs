use crate::buttons::{keycodes, AxisId, MotionSample};
use chrono::{DateTime, Local};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// Device event with precise chrono timestamps
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    Connected {
        descriptor: String,
        name: String,
        timestamp: DateTime<Local>,
    },
    Disconnected {
        descriptor: String,
        timestamp: DateTime<Local>,
    },
    Key {
        descriptor: String,
        code: u32,
        pressed: bool,
        timestamp: DateTime<Local>,
    },
    Motion {
        descriptor: String,
        sample: MotionSample,
        timestamp: DateTime<Local>,
    },
}

impl DeviceEvent {
    pub fn descriptor(&self) -> &str {
        match self {
            DeviceEvent::Connected { descriptor, .. }
            | DeviceEvent::Disconnected { descriptor, .. }
            | DeviceEvent::Key { descriptor, .. }
            | DeviceEvent::Motion { descriptor, .. } => descriptor,
        }
    }
}

// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    pub joystick_deadzone: f32,
    pub poll_interval_ms: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
            poll_interval_ms: 2,
        }
    }
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Event channel closed")]
    ChannelClosed,

    #[error("Collector task failed: {0}")]
    TaskError(String),
}

// Define collector states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context
    gilrs: Gilrs,

    // Collector settings
    settings: CollectorSettings,

    // Channel for sending events to the session
    event_sender: mpsc::Sender<DeviceEvent>,

    // Stable descriptors of every gamepad seen so far
    descriptors: HashMap<GamepadId, String>,
}

// Implementation of methods available in all states
impl<S: CollectionState> EventCollector<S> {
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    // Send an event without blocking; a full queue drops it
    fn send(&self, event: DeviceEvent) -> Result<(), CollectorError> {
        match self.event_sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                warn!("Event queue full, dropping event from {}", event.descriptor());
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(CollectorError::ChannelClosed),
        }
    }

    fn descriptor_of(&mut self, id: GamepadId) -> String {
        if let Some(descriptor) = self.descriptors.get(&id) {
            return descriptor.clone();
        }
        let descriptor = descriptor_for(&self.gilrs.gamepad(id));
        self.descriptors.insert(id, descriptor.clone());
        descriptor
    }
}

// Implementation for Initializing state
impl EventCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        event_sender: mpsc::Sender<DeviceEvent>,
    ) -> Result<Self, CollectorError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, settings, event_sender, HashMap::new()))
    }

    // Announce the gamepads already present and transition to Collecting state
    pub fn initialize(mut self) -> Result<EventCollector<Collecting>, CollectorError> {
        let gamepads: Vec<(GamepadId, String, String)> = self
            .gilrs
            .gamepads()
            .map(|(id, gamepad)| (id, descriptor_for(&gamepad), gamepad.name().to_string()))
            .collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, waiting for hot-plug");
        } else {
            info!("Found {} gamepads:", gamepads.len());
        }

        for (id, descriptor, name) in gamepads {
            info!("  ID: {}, Name: {}, Descriptor: {}", id, name, descriptor);
            self.descriptors.insert(id, descriptor.clone());
            self.send(DeviceEvent::Connected {
                descriptor,
                name,
                timestamp: Local::now(),
            })?;
        }

        info!("Event Collector initialized, transitioning to Collecting state");
        Ok(self.transition())
    }
}

// Implementation for Collecting state
impl EventCollector<Collecting> {
    // Drain pending gilrs events into the queue
    pub fn collect_pending(&mut self) -> Result<usize, CollectorError> {
        let mut count = 0;
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if let Some(device_event) = self.convert_gilrs_event(id, event) {
                match &device_event {
                    DeviceEvent::Key { code, pressed, timestamp, .. } => debug!(
                        "Key {} {} at {}",
                        code,
                        if *pressed { "down" } else { "up" },
                        timestamp.format("%H:%M:%S.%3f")
                    ),
                    DeviceEvent::Motion { .. } => {}
                    other => info!("Device event: {:?}", other),
                }
                self.send(device_event)?;
                count += 1;
            }
        }
        Ok(count)
    }

    // Run the collector until cancelled or the receiver goes away
    pub fn run_collection_loop(&mut self, cancel: &CancellationToken) -> Result<(), CollectorError> {
        info!("Starting Event Collector loop");

        let mut event_count = 0;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);
        let poll_interval = std::time::Duration::from_millis(self.settings.poll_interval_ms.max(1));

        while !cancel.is_cancelled() {
            event_count += self.collect_pending()?;

            let now = Local::now();
            if now - last_log_time > log_interval {
                debug!(
                    "Event Collector stats: forwarded {} events in last {} seconds",
                    event_count,
                    log_interval.num_seconds()
                );
                event_count = 0;
                last_log_time = now;
            }

            std::thread::sleep(poll_interval);
        }

        info!("Event Collector loop cancelled");
        Ok(())
    }

    fn convert_gilrs_event(&mut self, id: GamepadId, event: EventType) -> Option<DeviceEvent> {
        let now = Local::now();

        match event {
            EventType::ButtonPressed(button, _) | EventType::ButtonReleased(button, _) => {
                let pressed = matches!(event, EventType::ButtonPressed(..));
                let Some(code) = map_button(button) else {
                    debug!("Ignoring unmapped button: {:?}", button);
                    return None;
                };
                Some(DeviceEvent::Key {
                    descriptor: self.descriptor_of(id),
                    code,
                    pressed,
                    timestamp: now,
                })
            }
            EventType::AxisChanged(..)
            | EventType::ButtonChanged(Button::LeftTrigger2, ..)
            | EventType::ButtonChanged(Button::RightTrigger2, ..) => {
                let sample = self.snapshot(id);
                Some(DeviceEvent::Motion {
                    descriptor: self.descriptor_of(id),
                    sample,
                    timestamp: now,
                })
            }
            EventType::Connected => {
                let descriptor = self.descriptor_of(id);
                let name = self.gilrs.gamepad(id).name().to_string();
                Some(DeviceEvent::Connected {
                    descriptor,
                    name,
                    timestamp: now,
                })
            }
            EventType::Disconnected => Some(DeviceEvent::Disconnected {
                descriptor: self.descriptor_of(id),
                timestamp: now,
            }),
            _ => None,
        }
    }

    // Current value of every axis, flipped to down/right positive
    fn snapshot(&self, id: GamepadId) -> MotionSample {
        let gamepad = self.gilrs.gamepad(id);
        let deadzone = self.settings.joystick_deadzone;
        let stick = |axis: Axis| apply_deadzone(gamepad.value(axis), deadzone);
        let trigger = |button: Button| {
            gamepad
                .button_data(button)
                .map(|data| data.value())
                .unwrap_or(0.0)
        };

        MotionSample::new()
            .with(AxisId::X, stick(Axis::LeftStickX))
            .with(AxisId::Y, -stick(Axis::LeftStickY))
            .with(AxisId::Z, stick(Axis::RightStickX))
            .with(AxisId::Rz, -stick(Axis::RightStickY))
            .with(AxisId::HatX, gamepad.value(Axis::DPadX))
            .with(AxisId::HatY, -gamepad.value(Axis::DPadY))
            .with(AxisId::LTrigger, trigger(Button::LeftTrigger2))
            .with(AxisId::RTrigger, trigger(Button::RightTrigger2))
    }
}

// Public interface for spawning and running the collector
pub struct CollectorHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<(), CollectorError>>,
}

impl CollectorHandle {
    // Create the collector on a blocking thread and run it until cancelled
    pub fn spawn(
        settings: Option<CollectorSettings>,
        event_sender: mpsc::Sender<DeviceEvent>,
        cancel: CancellationToken,
    ) -> Self {
        info!("Spawning Event Collector with settings: {:?}", settings);
        let token = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            let collector = EventCollector::create(settings, event_sender)?;
            let mut collecting = collector.initialize()?;
            collecting.run_collection_loop(&token)
        });
        Self { cancel, task }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    // Stop the collector and wait for its thread
    pub async fn shutdown(self) -> Result<(), CollectorError> {
        self.cancel.cancel();
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(CollectorError::TaskError(e.to_string())),
        }
    }
}

// Stable descriptor: the gamepad UUID in hex
fn descriptor_for(gamepad: &Gamepad<'_>) -> String {
    gamepad
        .uuid()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

// Map gilrs buttons to Android key codes
fn map_button(button: Button) -> Option<u32> {
    match button {
        Button::South => Some(keycodes::BUTTON_A),
        Button::East => Some(keycodes::BUTTON_B),
        Button::West => Some(keycodes::BUTTON_X),
        Button::North => Some(keycodes::BUTTON_Y),
        Button::C => Some(keycodes::BUTTON_C),
        Button::Z => Some(keycodes::BUTTON_Z),
        Button::LeftTrigger => Some(keycodes::BUTTON_L1),
        Button::RightTrigger => Some(keycodes::BUTTON_R1),
        Button::LeftTrigger2 => Some(keycodes::BUTTON_L2),
        Button::RightTrigger2 => Some(keycodes::BUTTON_R2),
        Button::Select => Some(keycodes::BUTTON_SELECT),
        Button::Start => Some(keycodes::BUTTON_START),
        Button::Mode => Some(keycodes::BUTTON_MODE),
        Button::LeftThumb => Some(keycodes::BUTTON_THUMBL),
        Button::RightThumb => Some(keycodes::BUTTON_THUMBR),
        Button::DPadUp => Some(keycodes::DPAD_UP),
        Button::DPadDown => Some(keycodes::DPAD_DOWN),
        Button::DPadLeft => Some(keycodes::DPAD_LEFT),
        Button::DPadRight => Some(keycodes::DPAD_RIGHT),
        _ => None,
    }
}

// Apply deadzone to analog stick values
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        // Rescale the value to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}
