//! Integration tests for controller binding and table selection

use openpad::buttons::{keycodes, CONT_A, CONT_B, CONT_START, RELEASED};
use openpad::mapping::{
    classify, Binding, GamepadRegistry, KeyOutcome, MappingSource, SlotModes, Vendor, PLAYER_SLOTS,
};
use openpad::overlay::FormFactor;
use openpad::persistence::{keys, KeyValueStore, MemoryStore, TomlStore};
use openpad::session::PlayerInputState;
use tempfile::TempDir;

const MOGA: &str = "Moga Pro 2 HID";
const DESCRIPTOR: &str = "05000000d620000011a7";

fn bound_store(slot: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.set_string(&keys::player_key(keys::DEVICE_DESCRIPTOR, slot), DESCRIPTOR);
    store
}

fn players() -> [PlayerInputState; PLAYER_SLOTS] {
    [PlayerInputState::released(); PLAYER_SLOTS]
}

#[test]
fn test_custom_mode_beats_vendor_detection() {
    let mut store = bound_store(1);
    let (_, table) = classify(MOGA, DESCRIPTOR, &store, None).unwrap();
    assert_eq!(table.source(), MappingSource::Vendor(Vendor::Moga));

    store.set_bool(&keys::player_key(keys::CUSTOM_MODE, 1), true);
    // A on the B key
    store.set_i32(&keys::player_key("a", 1), keycodes::BUTTON_B as i32);

    let (slot, table) = classify(MOGA, DESCRIPTOR, &store, None).unwrap();
    assert_eq!(slot, 1);
    assert_eq!(table.source(), MappingSource::Custom);
    assert_eq!(
        table.lookup(keycodes::BUTTON_B),
        Some(Binding::Buttons(CONT_A))
    );
    // Start is never remapped
    assert_eq!(
        table.lookup(keycodes::BUTTON_START),
        Some(Binding::Buttons(CONT_START))
    );
}

#[test]
fn test_compat_mode_reads_game_scope_first() {
    let mut store = bound_store(0);
    store.set_bool(&keys::player_key(keys::COMPAT_MODE, 0), true);
    store.set_bool(&keys::player_key(keys::CUSTOM_MODE, 0), true);
    store.set_i32(&keys::player_key("b", 0), keycodes::BUTTON_Y as i32);
    store.set_i32(
        &keys::game_key("T1401N", &keys::player_key("b", 0)),
        keycodes::BUTTON_X as i32,
    );

    let (_, table) = classify(MOGA, DESCRIPTOR, &store, Some("T1401N")).unwrap();
    assert_eq!(table.source(), MappingSource::Compat);
    assert_eq!(
        table.lookup(keycodes::BUTTON_X),
        Some(Binding::Buttons(CONT_B))
    );

    // Outside the game the global override applies
    let (_, table) = classify(MOGA, DESCRIPTOR, &store, Some("other")).unwrap();
    assert_eq!(
        table.lookup(keycodes::BUTTON_Y),
        Some(Binding::Buttons(CONT_B))
    );
}

#[test]
fn test_unbound_device_never_reaches_a_player() {
    let mut store = MemoryStore::new();
    let mut registry = GamepadRegistry::load(&store, FormFactor::Phone);
    let mut players = players();

    assert_eq!(registry.device_connected(DESCRIPTOR, MOGA, &store), None);
    assert_eq!(
        registry.on_key(DESCRIPTOR, keycodes::BUTTON_A, true, &mut players),
        KeyOutcome::Ignored
    );
    assert!(players.iter().all(|p| p.buttons == RELEASED));

    registry
        .bind_device(2, DESCRIPTOR, &mut store, &mut players)
        .unwrap();
    assert_eq!(
        registry.on_key(DESCRIPTOR, keycodes::BUTTON_A, true, &mut players),
        KeyOutcome::Handled { slot: 2 }
    );
    assert_eq!(players[2].buttons, RELEASED & !CONT_A);
    assert_eq!(
        registry.on_key(DESCRIPTOR, keycodes::BUTTON_SELECT, true, &mut players),
        KeyOutcome::MenuRequested { slot: 2 }
    );
}

#[test]
fn test_bindings_survive_a_restart() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("preferences.toml");

    {
        let mut store = TomlStore::open(&path).unwrap();
        let mut registry = GamepadRegistry::load(&store, FormFactor::Tv);
        let mut players = players();
        registry
            .bind_device(3, DESCRIPTOR, &mut store, &mut players)
            .unwrap();
        registry
            .set_modes(
                3,
                SlotModes {
                    custom: true,
                    ..SlotModes::default()
                },
                &mut store,
            )
            .unwrap();
        assert!(store.is_dirty());
        store.flush().unwrap();
    }

    let store = TomlStore::open(&path).unwrap();
    let registry = GamepadRegistry::load(&store, FormFactor::Tv);
    assert_eq!(registry.slot_for(DESCRIPTOR), Some(3));
    assert!(SlotModes::load(&store, 3).custom);

    let (slot, table) = classify(MOGA, DESCRIPTOR, &store, None).unwrap();
    assert_eq!(slot, 3);
    assert_eq!(table.source(), MappingSource::Custom);
}
