//! Integration tests for the on-screen pad

use openpad::buttons::{CONT_A, CONT_DPAD_LEFT, CONT_DPAD_UP, CONT_X, RELEASED};
use openpad::overlay::{
    resolve, FormFactor, Pointer, TouchAction, TouchDispatcher, TouchEvent, TransformGroup,
    TransformSet, Viewport, VirtualPad, ZoneId, ZoneKind, ZoneTransform, DIAGONALS,
};
use openpad::persistence::{KeyValueStore, MemoryStore};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

fn viewports() -> Vec<Viewport> {
    vec![
        Viewport::new(480.0, 800.0, 2.0, FormFactor::Phone),
        Viewport::new(1920.0, 1080.0, 1.0, FormFactor::Tv),
        Viewport::new(1280.0, 800.0, 1.5, FormFactor::Tablet),
    ]
}

fn transforms() -> TransformSet {
    let mut set = TransformSet::default();
    set.set(
        TransformGroup::Dpad,
        ZoneTransform {
            x_shift: 18.0,
            y_shift: -7.5,
            scale: 1.3,
        },
    );
    set.set(
        TransformGroup::Analog,
        ZoneTransform {
            x_shift: -4.0,
            y_shift: 12.0,
            scale: 0.75,
        },
    );
    set
}

fn down(id: i32, x: f32, y: f32) -> TouchEvent {
    TouchEvent::new(TouchAction::Down, vec![Pointer::new(id, x, y)])
}

#[test]
fn test_fixture_portrait_phone() {
    let viewport = Viewport::new(480.0, 800.0, 2.0, FormFactor::Phone);
    let layout = resolve(viewport, &TransformSet::default());
    let left = layout.zone(ZoneId::DPAD_LEFT);

    assert!(approx(layout.scale(), 800.0 / 480.0 * 2.0 * 0.7));
    assert!(approx(left.rect.x, -237.333));
    assert!(approx(left.rect.y, 205.333));
    assert!(approx(left.rect.w, 149.333));
    assert!(approx(left.rect.h, 149.333));
    assert_eq!(left.kind, ZoneKind::Button(CONT_DPAD_LEFT));
}

#[test]
fn test_resolve_is_idempotent() {
    let set = transforms();
    for viewport in viewports() {
        assert_eq!(resolve(viewport, &set), resolve(viewport, &set));
    }
}

#[test]
fn test_diagonals_follow_their_neighbours() {
    let set = transforms();
    for viewport in viewports() {
        let layout = resolve(viewport, &set);
        for (diagonal, horizontal, vertical) in DIAGONALS {
            let d = layout.zone(diagonal);
            let h = layout.zone(horizontal);
            let v = layout.zone(vertical);
            assert_eq!(d.rect.x, h.rect.x);
            assert_eq!(d.rect.y, v.rect.y);
            assert_eq!(d.rect.w, h.rect.w);
            assert_eq!(d.rect.h, v.rect.h);
            assert_eq!(
                d.kind.button_mask(),
                h.kind.button_mask() | v.kind.button_mask()
            );
        }
    }
    let layout = resolve(viewports()[0], &set);
    assert_eq!(
        layout.zone(ZoneId::DPAD_UP_LEFT).kind,
        ZoneKind::Button(CONT_DPAD_LEFT | CONT_DPAD_UP)
    );
}

#[test]
fn test_lifting_one_pointer_keeps_the_others() {
    let viewport = Viewport::new(1280.0, 720.0, 1.0, FormFactor::Phone);
    let layout = resolve(viewport, &TransformSet::default());
    let mut dispatcher = TouchDispatcher::new(&layout);

    let (ax, ay) = layout.zone(ZoneId::BUTTON_A).rect.center();
    let (xx, xy) = layout.zone(ZoneId::BUTTON_X).rect.center();
    let (lx, ly) = layout.zone(ZoneId::DPAD_LEFT).rect.center();

    dispatcher.on_touch_event(&layout, &down(0, ax, ay));
    dispatcher.on_touch_event(
        &layout,
        &TouchEvent::new(
            TouchAction::PointerDown(1),
            vec![Pointer::new(0, ax, ay), Pointer::new(1, xx, xy)],
        ),
    );
    let out = dispatcher.on_touch_event(
        &layout,
        &TouchEvent::new(
            TouchAction::PointerDown(2),
            vec![
                Pointer::new(0, ax, ay),
                Pointer::new(1, xx, xy),
                Pointer::new(2, lx, ly),
            ],
        ),
    );
    assert_eq!(out.buttons, RELEASED & !(CONT_A | CONT_X | CONT_DPAD_LEFT));

    // The lifted pointer is still listed in the batch
    let out = dispatcher.on_touch_event(
        &layout,
        &TouchEvent::new(
            TouchAction::PointerUp(1),
            vec![
                Pointer::new(0, ax, ay),
                Pointer::new(1, xx, xy),
                Pointer::new(2, lx, ly),
            ],
        ),
    );
    assert_eq!(out.buttons, RELEASED & !(CONT_A | CONT_DPAD_LEFT));
    assert_eq!(dispatcher.assignment(1), None);

    let out = dispatcher.on_touch_event(
        &layout,
        &TouchEvent::new(TouchAction::Up, vec![Pointer::new(0, ax, ay)]),
    );
    assert_eq!(out.buttons, RELEASED);
}

#[test]
fn test_lifting_one_finger_keeps_stick_trigger_and_button() {
    let viewport = Viewport::new(1280.0, 720.0, 1.0, FormFactor::Phone);
    let layout = resolve(viewport, &TransformSet::default());

    let (bx, by) = layout.analog_base().center();
    let (tx, ty) = layout.zone(ZoneId::LEFT_TRIGGER).rect.center();
    let (ax, ay) = layout.zone(ZoneId::BUTTON_A).rect.center();
    // Stick finger off-center so both axes are non-zero
    let fingers = vec![
        Pointer::new(0, bx + 20.0, by - 10.0),
        Pointer::new(1, tx, ty),
        Pointer::new(2, ax, ay),
    ];

    for lifted in 0..3 {
        let mut dispatcher = TouchDispatcher::new(&layout);
        dispatcher.on_touch_event(&layout, &TouchEvent::new(TouchAction::Down, fingers[..1].to_vec()));
        dispatcher.on_touch_event(
            &layout,
            &TouchEvent::new(TouchAction::PointerDown(1), fingers[..2].to_vec()),
        );
        let held = dispatcher.on_touch_event(
            &layout,
            &TouchEvent::new(TouchAction::PointerDown(2), fingers.clone()),
        );
        assert_ne!(held.axis_x, 0);
        assert_ne!(held.axis_y, 0);
        assert_eq!(held.left_trigger, 255);
        assert_eq!(held.buttons, RELEASED & !CONT_A);

        let out = dispatcher.on_touch_event(
            &layout,
            &TouchEvent::new(TouchAction::PointerUp(lifted), fingers.clone()),
        );
        let stick = if lifted == 0 { (0, 0) } else { (held.axis_x, held.axis_y) };
        let trigger = if lifted == 1 { 0 } else { held.left_trigger };
        let buttons = if lifted == 2 { RELEASED } else { held.buttons };
        assert_eq!((out.axis_x, out.axis_y), stick, "after lifting {}", lifted);
        assert_eq!(out.left_trigger, trigger, "after lifting {}", lifted);
        assert_eq!(out.buttons, buttons, "after lifting {}", lifted);

        // The remaining fingers keep their channels on the next move
        let rest: Vec<Pointer> = fingers.iter().copied().filter(|p| p.id != lifted).collect();
        let out = dispatcher.on_touch_event(&layout, &TouchEvent::new(TouchAction::Move, rest));
        assert_eq!((out.axis_x, out.axis_y), stick);
        assert_eq!(out.left_trigger, trigger);
        assert_eq!(out.buttons, buttons);
    }
}

#[test]
fn test_button_word_is_active_low() {
    let viewport = Viewport::new(1280.0, 720.0, 1.0, FormFactor::Phone);
    let layout = resolve(viewport, &TransformSet::default());
    let mut dispatcher = TouchDispatcher::new(&layout);

    for zone in layout.zones() {
        let ZoneKind::Button(mask) = zone.kind else {
            continue;
        };
        let (x, y) = zone.rect.center();
        // Zones may overlap, the hit-tested zone decides
        let Some(hit) = layout.hit_test(x, y) else {
            continue;
        };
        let out = dispatcher.on_touch_event(&layout, &down(0, x, y));
        assert_eq!(out.buttons, RELEASED & !hit.kind.button_mask());
        if hit.id == zone.id {
            assert_eq!(out.buttons & mask, 0);
        }
        let out = dispatcher.on_touch_event(
            &layout,
            &TouchEvent::new(TouchAction::Up, vec![Pointer::new(0, x, y)]),
        );
        assert_eq!(out.buttons, RELEASED);
    }
}

#[test]
fn test_nub_stays_inside_base() {
    let viewport = Viewport::new(1280.0, 720.0, 1.0, FormFactor::Phone);
    let layout = resolve(viewport, &transforms());
    let mut dispatcher = TouchDispatcher::new(&layout);
    let base = layout.analog_base();
    let (cx, cy) = base.center();

    dispatcher.on_touch_event(&layout, &down(3, cx, cy));
    let targets = [
        (-500.0, -500.0),
        (5000.0, cy),
        (cx, 5000.0),
        (base.x + 1.0, base.bottom() - 1.0),
        (cx + 3.0, cy - 2.0),
    ];
    for (x, y) in targets {
        let out = dispatcher.on_touch_event(
            &layout,
            &TouchEvent::new(TouchAction::Move, vec![Pointer::new(3, x, y)]),
        );
        let nub = dispatcher.nub();
        assert!(nub.x >= base.x - 1e-3 && nub.right() <= base.right() + 1e-3);
        assert!(nub.y >= base.y - 1e-3 && nub.bottom() <= base.bottom() + 1e-3);
        assert!(out.axis_x.abs() <= 127 && out.axis_y.abs() <= 127);
    }
}

#[test]
fn test_pinch_keeps_scale_positive_and_finite() {
    let viewport = Viewport::new(1280.0, 720.0, 1.0, FormFactor::Phone);
    let mut store = MemoryStore::new();
    let mut pad = VirtualPad::load(&mut store, viewport);
    pad.set_edit_mode(true);

    let (x, y) = pad.layout().zone(ZoneId::START).rect.center();
    pad.on_touch_event(&down(0, x, y), &mut store);
    pad.on_touch_event(
        &TouchEvent::new(
            TouchAction::PointerDown(1),
            vec![Pointer::new(0, x, y), Pointer::new(1, x + 40.0, y)],
        ),
        &mut store,
    );

    for factor in [1.5, 0.0, -2.0, f32::NAN, f32::INFINITY, 1e-30, 1e30, 1e30, 0.5] {
        pad.on_pinch(factor, &mut store);
        let scale = pad.transforms().get(TransformGroup::Start).scale;
        assert!(scale.is_finite() && scale > 0.0, "scale = {}", scale);
    }
    pad.end_pinch();

    let stored = store.get_f32("touch_scale_start");
    assert_eq!(stored, Some(pad.transforms().get(TransformGroup::Start).scale));
}

#[test]
fn test_reset_matches_fresh_load() {
    let viewport = Viewport::new(1920.0, 1080.0, 1.0, FormFactor::Tv);
    let mut store = MemoryStore::new();
    let mut pad = VirtualPad::load(&mut store, viewport);
    pad.set_edit_mode(true);

    let (x, y) = pad.layout().zone(ZoneId::BUTTON_A).rect.center();
    pad.on_touch_event(&down(0, x, y), &mut store);
    pad.on_touch_event(
        &TouchEvent::new(TouchAction::Move, vec![Pointer::new(0, x + 60.0, y - 30.0)]),
        &mut store,
    );
    assert!(!pad.transforms().is_identity());

    pad.reset_layout(&mut store);
    assert!(store.is_empty());

    let fresh = VirtualPad::load(&mut MemoryStore::new(), viewport);
    assert_eq!(pad.transforms(), fresh.transforms());
    assert_eq!(pad.layout(), fresh.layout());
}
