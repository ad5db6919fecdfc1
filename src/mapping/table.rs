//! Belegungstabellen und ihre Auswahl pro Spieler-Slot

use super::vendor::{detect_vendor, Vendor, GENERIC_TABLE};
use super::PLAYER_SLOTS;
use crate::buttons::{keycodes, *};
use crate::persistence::{keys, KeyValueStore};
use std::fmt::{Display, Formatter};
use tracing::{debug, info};

/// Ziel eines physischen Tastencodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Bits im aktiv-niedrigen Tastenwort
    Buttons(u16),
    LeftTrigger,
    RightTrigger,
    /// Select, öffnet das Menü statt eine Taste zu drücken
    Menu,
}

/// Herkunft einer Tabelle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingSource {
    Vendor(Vendor),
    Generic,
    Custom,
    Compat,
}

impl Display for MappingSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingSource::Vendor(vendor) => write!(f, "{} defaults", vendor),
            MappingSource::Generic => write!(f, "Generic"),
            MappingSource::Custom => write!(f, "Custom"),
            MappingSource::Compat => write!(f, "Compat"),
        }
    }
}

/// Geordnete Liste aus (physischer Code, Ziel); der erste Treffer gewinnt
#[derive(Debug, Clone, PartialEq)]
pub struct MappingTable {
    source: MappingSource,
    entries: Vec<(u32, Binding)>,
}

impl MappingTable {
    /// Erstellt eine Tabelle aus festen Einträgen
    pub fn from_entries(source: MappingSource, entries: &[(u32, Binding)]) -> Self {
        Self {
            source,
            entries: entries.to_vec(),
        }
    }

    pub fn generic() -> Self {
        Self::from_entries(MappingSource::Generic, GENERIC_TABLE)
    }

    pub fn for_vendor(vendor: Vendor) -> Self {
        Self::from_entries(MappingSource::Vendor(vendor), vendor.table())
    }

    /// Baut die benutzerdefinierte Tabelle eines Slots.
    ///
    /// Jede umbelegbare Taste liest ihren Code aus `<taste>_player_<n>`, innerhalb von
    /// `scope` (Spiel-ID) zuerst aus dem Spielbereich. Fehlt der Wert, gilt der
    /// Standardcode. Start und Select werden immer fest angehängt.
    pub fn custom(
        source: MappingSource,
        store: &dyn KeyValueStore,
        slot: usize,
        scope: Option<&str>,
    ) -> Self {
        let mut entries = Vec::with_capacity(LogicalButton::REMAPPABLE.len() + 2);
        for button in LogicalButton::REMAPPABLE {
            let key = keys::player_key(button.key_name(), slot);
            let scoped = scope.and_then(|id| store.get_i32(&keys::game_key(id, &key)));
            let code = scoped
                .or_else(|| store.get_i32(&key))
                .and_then(|code| u32::try_from(code).ok())
                .unwrap_or(button.default_code());
            entries.push((code, button.binding()));
        }
        entries.push((keycodes::BUTTON_START, Binding::Buttons(CONT_START)));
        entries.push((keycodes::BUTTON_SELECT, Binding::Menu));
        Self { source, entries }
    }

    pub fn source(&self) -> MappingSource {
        self.source
    }

    pub fn entries(&self) -> &[(u32, Binding)] {
        &self.entries
    }

    /// Sucht das Ziel eines physischen Codes
    pub fn lookup(&self, code: u32) -> Option<Binding> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, binding)| *binding)
    }
}

/// Logische Tasten mit eigenem Schlüssel für die Umbelegung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalButton {
    A,
    B,
    X,
    Y,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    LeftTrigger,
    RightTrigger,
}

impl LogicalButton {
    pub const REMAPPABLE: [LogicalButton; 10] = [
        LogicalButton::A,
        LogicalButton::B,
        LogicalButton::X,
        LogicalButton::Y,
        LogicalButton::DpadUp,
        LogicalButton::DpadDown,
        LogicalButton::DpadLeft,
        LogicalButton::DpadRight,
        LogicalButton::LeftTrigger,
        LogicalButton::RightTrigger,
    ];

    /// Schlüsselname in den Einstellungen
    pub const fn key_name(self) -> &'static str {
        match self {
            LogicalButton::A => "a",
            LogicalButton::B => "b",
            LogicalButton::X => "x",
            LogicalButton::Y => "y",
            LogicalButton::DpadUp => "dpad_up",
            LogicalButton::DpadDown => "dpad_down",
            LogicalButton::DpadLeft => "dpad_left",
            LogicalButton::DpadRight => "dpad_right",
            LogicalButton::LeftTrigger => "left_trigger",
            LogicalButton::RightTrigger => "right_trigger",
        }
    }

    /// Herstellerneutraler Standardcode
    pub const fn default_code(self) -> u32 {
        match self {
            LogicalButton::A => keycodes::BUTTON_A,
            LogicalButton::B => keycodes::BUTTON_B,
            LogicalButton::X => keycodes::BUTTON_X,
            LogicalButton::Y => keycodes::BUTTON_Y,
            LogicalButton::DpadUp => keycodes::DPAD_UP,
            LogicalButton::DpadDown => keycodes::DPAD_DOWN,
            LogicalButton::DpadLeft => keycodes::DPAD_LEFT,
            LogicalButton::DpadRight => keycodes::DPAD_RIGHT,
            LogicalButton::LeftTrigger => keycodes::BUTTON_L1,
            LogicalButton::RightTrigger => keycodes::BUTTON_R1,
        }
    }

    pub const fn binding(self) -> Binding {
        match self {
            LogicalButton::A => Binding::Buttons(CONT_A),
            LogicalButton::B => Binding::Buttons(CONT_B),
            LogicalButton::X => Binding::Buttons(CONT_X),
            LogicalButton::Y => Binding::Buttons(CONT_Y),
            LogicalButton::DpadUp => Binding::Buttons(CONT_DPAD_UP),
            LogicalButton::DpadDown => Binding::Buttons(CONT_DPAD_DOWN),
            LogicalButton::DpadLeft => Binding::Buttons(CONT_DPAD_LEFT),
            LogicalButton::DpadRight => Binding::Buttons(CONT_DPAD_RIGHT),
            LogicalButton::LeftTrigger => Binding::LeftTrigger,
            LogicalButton::RightTrigger => Binding::RightTrigger,
        }
    }
}

/// Verhalten des rechten Sticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RightStickMode {
    #[default]
    Off,
    /// Vertikale Auslenkung ersetzt den analogen Triggerdruck
    AnalogTriggers,
    /// Auslenkung über der Schwelle wirkt als zusätzliche Taste
    Buttons,
}

impl RightStickMode {
    pub fn from_pref(value: i32) -> Self {
        match value {
            1 => RightStickMode::AnalogTriggers,
            2 => RightStickMode::Buttons,
            _ => RightStickMode::Off,
        }
    }

    pub fn to_pref(self) -> i32 {
        match self {
            RightStickMode::Off => 0,
            RightStickMode::AnalogTriggers => 1,
            RightStickMode::Buttons => 2,
        }
    }
}

/// Pro-Slot-Schalter aus den Einstellungen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotModes {
    /// Stick steuert die digitalen D-Pad-Bits statt der Achsen
    pub joystick: bool,
    pub compat: bool,
    pub custom: bool,
    pub right_stick: RightStickMode,
}

impl SlotModes {
    /// Lädt die Schalter eines Slots; fehlende Werte sind aus
    pub fn load(store: &dyn KeyValueStore, slot: usize) -> Self {
        let flag = |base: &str| store.get_bool(&keys::player_key(base, slot)).unwrap_or(false);
        Self {
            joystick: flag(keys::JOYSTICK_MODE),
            compat: flag(keys::COMPAT_MODE),
            custom: flag(keys::CUSTOM_MODE),
            right_stick: store
                .get_i32(&keys::player_key(keys::RIGHT_STICK_MODE, slot))
                .map(RightStickMode::from_pref)
                .unwrap_or_default(),
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, slot: usize) {
        store.set_bool(&keys::player_key(keys::JOYSTICK_MODE, slot), self.joystick);
        store.set_bool(&keys::player_key(keys::COMPAT_MODE, slot), self.compat);
        store.set_bool(&keys::player_key(keys::CUSTOM_MODE, slot), self.custom);
        store.set_i32(
            &keys::player_key(keys::RIGHT_STICK_MODE, slot),
            self.right_stick.to_pref(),
        );
    }
}

/// Sucht den Slot, an den ein Gerät gebunden ist
pub fn bound_slot(store: &dyn KeyValueStore, descriptor: &str) -> Option<usize> {
    (0..PLAYER_SLOTS).find(|&slot| {
        store
            .get_string(&keys::player_key(keys::DEVICE_DESCRIPTOR, slot))
            .is_some_and(|bound| bound == descriptor)
    })
}

/// Wählt die Tabelle eines gebundenen Slots.
///
/// Reihenfolge: Kompatibilitätsmodus (Spielbereich), benutzerdefiniert, erkannter
/// Hersteller, generische Tabelle.
pub fn select_table(
    device_name: &str,
    slot: usize,
    modes: &SlotModes,
    store: &dyn KeyValueStore,
    game_id: Option<&str>,
) -> MappingTable {
    if modes.compat {
        return MappingTable::custom(MappingSource::Compat, store, slot, game_id);
    }
    if modes.custom {
        return MappingTable::custom(MappingSource::Custom, store, slot, None);
    }
    match detect_vendor(device_name) {
        Some(vendor) => MappingTable::for_vendor(vendor),
        None => MappingTable::generic(),
    }
}

/// Ordnet ein Gerät seinem Slot und seiner Tabelle zu.
/// Nicht gebundene Geräte werden ignoriert.
pub fn classify(
    device_name: &str,
    descriptor: &str,
    store: &dyn KeyValueStore,
    game_id: Option<&str>,
) -> Option<(usize, MappingTable)> {
    let Some(slot) = bound_slot(store, descriptor) else {
        debug!("Device '{}' ({}) is not bound to a player", device_name, descriptor);
        return None;
    };
    let modes = SlotModes::load(store, slot);
    let table = select_table(device_name, slot, &modes, store, game_id);
    info!(
        "Device '{}' bound to player {} using {} mapping",
        device_name,
        slot + 1,
        table.source()
    );
    Some((slot, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn bound_store(slot: usize, descriptor: &str) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.set_string(&keys::player_key(keys::DEVICE_DESCRIPTOR, slot), descriptor);
        store
    }

    #[test]
    fn test_unbound_device_is_ignored() {
        let store = bound_store(0, "abc");
        assert_eq!(classify("Moga Pro", "other", &store, None), None);
    }

    #[test]
    fn test_vendor_then_generic() {
        let store = bound_store(2, "dev");
        let (slot, table) = classify("Xbox Wireless Controller", "dev", &store, None).unwrap();
        assert_eq!(slot, 2);
        assert_eq!(table.source(), MappingSource::Vendor(Vendor::Xbox));
        assert_eq!(table.lookup(keycodes::BUTTON_L2), Some(Binding::LeftTrigger));

        let (_, table) = classify("Unknown Pad", "dev", &store, None).unwrap();
        assert_eq!(table, MappingTable::generic());
        assert_eq!(table.lookup(keycodes::BUTTON_L1), Some(Binding::LeftTrigger));
        assert_eq!(table.lookup(keycodes::MENU), None);
    }

    #[test]
    fn test_custom_mode_beats_vendor() {
        let mut store = bound_store(0, "moga");
        store.set_bool("custom_mode_player_1", true);
        store.set_i32("a_player_1", keycodes::BUTTON_C as i32);

        let (_, table) = classify("Moga Pro HID", "moga", &store, None).unwrap();
        assert_eq!(table, MappingTable::custom(MappingSource::Custom, &store, 0, None));
        assert_ne!(table.entries(), Vendor::Moga.table());
        assert_eq!(table.lookup(keycodes::BUTTON_C), Some(Binding::Buttons(CONT_A)));
        assert_eq!(table.lookup(keycodes::BUTTON_START), Some(Binding::Buttons(CONT_START)));
    }

    #[test]
    fn test_compat_mode_reads_game_scope() {
        let mut store = bound_store(1, "pad");
        store.set_bool("compat_mode_player_2", true);
        store.set_i32("game.T-8111.b_player_2", keycodes::BUTTON_Z as i32);
        store.set_i32("b_player_2", keycodes::BUTTON_C as i32);

        let (_, table) = classify("Sony PLAYSTATION(R)3 Controller", "pad", &store, Some("T-8111")).unwrap();
        assert_eq!(table.source(), MappingSource::Compat);
        assert_eq!(table.lookup(keycodes::BUTTON_Z), Some(Binding::Buttons(CONT_B)));

        // Without a game the slot-wide override applies
        let (_, table) = classify("Sony PLAYSTATION(R)3 Controller", "pad", &store, None).unwrap();
        assert_eq!(table.lookup(keycodes::BUTTON_C), Some(Binding::Buttons(CONT_B)));
    }

    #[test]
    fn test_slot_modes_roundtrip() {
        let mut store = MemoryStore::new();
        let modes = SlotModes {
            joystick: true,
            compat: false,
            custom: true,
            right_stick: RightStickMode::Buttons,
        };
        modes.save(&mut store, 3);
        assert_eq!(store.get_i32("right_stick_mode_player_4"), Some(2));
        assert_eq!(SlotModes::load(&store, 3), modes);
        assert_eq!(SlotModes::load(&store, 0), SlotModes::default());
    }
}
