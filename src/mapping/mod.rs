//! Modul für die Zuordnung physischer Controller zu Spieler-Slots und Belegungstabellen.
//!
//! Ein Gerät wird über seinen stabilen Deskriptor einem der vier Slots zugeordnet. Pro
//! Slot wird genau eine Tabelle aktiv: benutzerdefiniert (oder Kompatibilitätsmodus),
//! die Tabelle eines erkannten Herstellers oder die generische Tabelle. Tasten- und
//! Achsereignisse laufen danach über [`GamepadRegistry`] in den Zustand des Spielers.

pub mod error;
pub mod player;
pub mod table;
pub mod vendor;

// Re-exports für einfacheren Zugriff
pub use error::MappingError;
pub use player::{GamepadRegistry, KeyOutcome, PlayerSlot};
pub use table::{
    classify, Binding, LogicalButton, MappingSource, MappingTable, RightStickMode, SlotModes,
};
pub use vendor::{detect_vendor, MatchKind, Vendor, VendorSignature, VENDOR_SIGNATURES};

/// Anzahl der Controller-Anschlüsse
pub const PLAYER_SLOTS: usize = 4;
