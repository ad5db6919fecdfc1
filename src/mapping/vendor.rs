//! Herstellererkennung und fest eingebaute Belegungstabellen
//!
//! Die Erkennung ist datengetrieben: [`VENDOR_SIGNATURES`] listet Muster und Vergleichsart,
//! exakte Treffer werden vor Teilstring-Treffern geprüft.

use super::table::Binding;
use crate::buttons::{keycodes::*, *};
use std::fmt::{Display, Formatter};

/// Bekannte Controller-Hersteller mit eigener Tabelle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    Sony,
    Xbox,
    Shield,
    Moga,
    Gamekey,
}

impl Display for Vendor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Vendor::Sony => write!(f, "Sony"),
            Vendor::Xbox => write!(f, "Xbox"),
            Vendor::Shield => write!(f, "Shield"),
            Vendor::Moga => write!(f, "Moga"),
            Vendor::Gamekey => write!(f, "Gamekey"),
        }
    }
}

/// Art des Namensvergleichs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Contains,
}

/// Ein Eintrag der Erkennungstabelle
#[derive(Debug, Clone, Copy)]
pub struct VendorSignature {
    pub kind: MatchKind,
    pub pattern: &'static str,
    pub vendor: Vendor,
}

const fn sig(kind: MatchKind, pattern: &'static str, vendor: Vendor) -> VendorSignature {
    VendorSignature {
        kind,
        pattern,
        vendor,
    }
}

/// Erkennungstabelle, Reihenfolge innerhalb einer Vergleichsart entscheidet
pub const VENDOR_SIGNATURES: &[VendorSignature] = &[
    sig(MatchKind::Exact, "Sony PLAYSTATION(R)3 Controller", Vendor::Sony),
    sig(MatchKind::Exact, "Sony Computer Entertainment Wireless Controller", Vendor::Sony),
    sig(MatchKind::Exact, "Microsoft X-Box 360 pad", Vendor::Xbox),
    sig(MatchKind::Exact, "Xbox 360 Wireless Receiver", Vendor::Xbox),
    sig(MatchKind::Exact, "Xbox Wireless Controller", Vendor::Xbox),
    sig(MatchKind::Contains, "NVIDIA Controller", Vendor::Shield),
    sig(MatchKind::Contains, "Moga", Vendor::Moga),
    sig(MatchKind::Contains, "keypad-game-zeus", Vendor::Gamekey),
    sig(MatchKind::Contains, "keypad-zeus", Vendor::Gamekey),
];

/// Ermittelt den Hersteller anhand des Gerätenamens
///
/// Alle exakten Muster werden vor den Teilstring-Mustern geprüft, sodass ein exakt
/// bekannter Name nie von einem allgemeineren Muster überdeckt wird.
pub fn detect_vendor(device_name: &str) -> Option<Vendor> {
    let matches = |kind: MatchKind| {
        VENDOR_SIGNATURES
            .iter()
            .filter(move |s| s.kind == kind)
            .find(|s| match s.kind {
                MatchKind::Exact => device_name == s.pattern,
                MatchKind::Contains => device_name.contains(s.pattern),
            })
            .map(|s| s.vendor)
    };
    matches(MatchKind::Exact).or_else(|| matches(MatchKind::Contains))
}

const fn b(code: u32, mask: u16) -> (u32, Binding) {
    (code, Binding::Buttons(mask))
}

/// Konsolenartige Standardtabelle für unbekannte Geräte.
/// Start und Select stehen absichtlich doppelt darin, der erste Treffer gewinnt.
pub const GENERIC_TABLE: &[(u32, Binding)] = &[
    b(BUTTON_Y, CONT_Y),
    b(BUTTON_B, CONT_B),
    b(BUTTON_A, CONT_A),
    b(BUTTON_X, CONT_X),
    b(BUTTON_START, CONT_START),
    b(DPAD_UP, CONT_DPAD_UP),
    b(DPAD_DOWN, CONT_DPAD_DOWN),
    b(DPAD_LEFT, CONT_DPAD_LEFT),
    b(DPAD_RIGHT, CONT_DPAD_RIGHT),
    (BUTTON_L1, Binding::LeftTrigger),
    (BUTTON_R1, Binding::RightTrigger),
    (BUTTON_SELECT, Binding::Menu),
    b(BUTTON_START, CONT_START),
    (BUTTON_SELECT, Binding::Menu),
];

const SONY_TABLE: &[(u32, Binding)] = &[
    b(BUTTON_A, CONT_A),
    b(BUTTON_B, CONT_B),
    b(BUTTON_X, CONT_X),
    b(BUTTON_Y, CONT_Y),
    b(DPAD_UP, CONT_DPAD_UP),
    b(DPAD_DOWN, CONT_DPAD_DOWN),
    b(DPAD_LEFT, CONT_DPAD_LEFT),
    b(DPAD_RIGHT, CONT_DPAD_RIGHT),
    b(BUTTON_L1, CONT_C),
    b(BUTTON_R1, CONT_Z),
    (BUTTON_L2, Binding::LeftTrigger),
    (BUTTON_R2, Binding::RightTrigger),
    b(BUTTON_START, CONT_START),
    (BUTTON_SELECT, Binding::Menu),
];

const XBOX_TABLE: &[(u32, Binding)] = SONY_TABLE;

const SHIELD_TABLE: &[(u32, Binding)] = &[
    b(BUTTON_A, CONT_A),
    b(BUTTON_B, CONT_B),
    b(BUTTON_X, CONT_X),
    b(BUTTON_Y, CONT_Y),
    b(DPAD_UP, CONT_DPAD_UP),
    b(DPAD_DOWN, CONT_DPAD_DOWN),
    b(DPAD_LEFT, CONT_DPAD_LEFT),
    b(DPAD_RIGHT, CONT_DPAD_RIGHT),
    b(BUTTON_L1, CONT_C),
    b(BUTTON_R1, CONT_Z),
    (BUTTON_L2, Binding::LeftTrigger),
    (BUTTON_R2, Binding::RightTrigger),
    b(BUTTON_START, CONT_START),
    (BUTTON_SELECT, Binding::Menu),
    (BACK, Binding::Menu),
];

const MOGA_TABLE: &[(u32, Binding)] = &[
    b(BUTTON_A, CONT_A),
    b(BUTTON_B, CONT_B),
    b(BUTTON_X, CONT_X),
    b(BUTTON_Y, CONT_Y),
    b(BUTTON_START, CONT_START),
    b(DPAD_UP, CONT_DPAD_UP),
    b(DPAD_DOWN, CONT_DPAD_DOWN),
    b(DPAD_LEFT, CONT_DPAD_LEFT),
    b(DPAD_RIGHT, CONT_DPAD_RIGHT),
    (BUTTON_L1, Binding::LeftTrigger),
    (BUTTON_R1, Binding::RightTrigger),
    (BUTTON_SELECT, Binding::Menu),
    b(BUTTON_START, CONT_START),
    (BUTTON_SELECT, Binding::Menu),
];

/// Tastatur-ähnliche Gamepads: die mittlere Taste ist A, Zurück ist B
const GAMEKEY_TABLE: &[(u32, Binding)] = &[
    b(DPAD_UP, CONT_DPAD_UP),
    b(DPAD_DOWN, CONT_DPAD_DOWN),
    b(DPAD_LEFT, CONT_DPAD_LEFT),
    b(DPAD_RIGHT, CONT_DPAD_RIGHT),
    b(DPAD_CENTER, CONT_A),
    b(BACK, CONT_B),
    b(BUTTON_X, CONT_X),
    b(BUTTON_Y, CONT_Y),
    (BUTTON_L1, Binding::LeftTrigger),
    (BUTTON_R1, Binding::RightTrigger),
    b(BUTTON_START, CONT_START),
    (BUTTON_SELECT, Binding::Menu),
];

impl Vendor {
    /// Fest eingebaute Belegung dieses Herstellers
    pub const fn table(self) -> &'static [(u32, Binding)] {
        match self {
            Vendor::Sony => SONY_TABLE,
            Vendor::Xbox => XBOX_TABLE,
            Vendor::Shield => SHIELD_TABLE,
            Vendor::Moga => MOGA_TABLE,
            Vendor::Gamekey => GAMEKEY_TABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_only_clear_known_bits() {
        let known = CONT_C
            | CONT_B
            | CONT_A
            | CONT_START
            | CONT_DPAD_ALL
            | CONT_Z
            | CONT_Y
            | CONT_X;
        let vendors = [Vendor::Sony, Vendor::Xbox, Vendor::Shield, Vendor::Moga, Vendor::Gamekey];
        let used = vendors
            .iter()
            .flat_map(|vendor| vendor.table().iter())
            .chain(GENERIC_TABLE.iter())
            .fold(0u16, |acc, (_, binding)| match binding {
                Binding::Buttons(mask) => acc | mask,
                _ => acc,
            });
        assert_eq!(used, known);
    }

    #[test]
    fn test_exact_names() {
        assert_eq!(detect_vendor("Sony PLAYSTATION(R)3 Controller"), Some(Vendor::Sony));
        assert_eq!(detect_vendor("Xbox Wireless Controller"), Some(Vendor::Xbox));
        // Exact patterns do not match as substrings
        assert_eq!(detect_vendor("Fake Sony PLAYSTATION(R)3 Controller"), None);
    }

    #[test]
    fn test_substring_names() {
        assert_eq!(detect_vendor("NVIDIA Controller v01.04"), Some(Vendor::Shield));
        assert_eq!(detect_vendor("Moga Pro 2 HID"), Some(Vendor::Moga));
        assert_eq!(detect_vendor("keypad-game-zeus"), Some(Vendor::Gamekey));
        assert_eq!(detect_vendor("Logitech Dual Action"), None);
    }

    #[test]
    fn test_start_and_select_are_fixed_in_every_table() {
        let tables = [
            GENERIC_TABLE,
            Vendor::Sony.table(),
            Vendor::Xbox.table(),
            Vendor::Shield.table(),
            Vendor::Moga.table(),
            Vendor::Gamekey.table(),
        ];
        for table in tables {
            let first = |code| table.iter().find(|(c, _)| *c == code).map(|(_, b)| *b);
            assert_eq!(first(BUTTON_START), Some(Binding::Buttons(CONT_START)));
            assert_eq!(first(BUTTON_SELECT), Some(Binding::Menu));
        }
    }
}
