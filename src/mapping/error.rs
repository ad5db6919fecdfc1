//! Fehlerdefinitionen für das Mapping-Modul

use thiserror::Error;

/// Fehlertypen der Geräteverwaltung
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    /// Slot außerhalb von 0..4
    #[error("Ungültiger Spieler-Slot: {0}")]
    InvalidSlot(usize),

    /// Leerer Gerätedeskriptor
    #[error("Ungültiger Gerätedeskriptor: '{0}'")]
    InvalidDescriptor(String),
}
