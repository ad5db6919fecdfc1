//! On-screen virtual game pad and physical controller mapping
//!
//! Touches on the overlay and events from physical gamepads are turned into the
//! active-low button word, trigger and stick values of four emulated controller ports.

pub mod buttons;
pub mod config;
pub mod controller;
pub mod mapping;
pub mod overlay;
pub mod persistence;
pub mod session;
