//! Physical controller input
//!
//! [`event_collector`] polls gilrs on a blocking thread and turns hot-plug, button and
//! axis changes into [`DeviceEvent`]s keyed by a stable device descriptor.
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► EventCollector ──► mpsc<DeviceEvent> ──► InputSession
//!            (Android key codes,
//!             axis snapshots)
//! ```

pub mod event_collector;

pub use event_collector::{
    CollectionState, CollectorError, CollectorHandle, CollectorSettings, DeviceEvent,
    EventCollector,
};
