#![cfg(target_arch = "wasm32")]

use swipedeck::SwipeBinding;
use swipedeck_core::{GestureConfig, GestureDetector};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{window, Element, EventTarget, PointerEvent, PointerEventInit};

wasm_bindgen_test_configure!(run_in_browser);

fn pointer(kind: &str, client_x: i32) -> PointerEvent {
    let init = PointerEventInit::new();
    init.set_pointer_id(7);
    init.set_pointer_type("touch");
    init.set_is_primary(true);
    init.set_client_x(client_x);
    init.set_bubbles(true);
    init.set_cancelable(true);
    PointerEvent::new_with_event_init_dict(kind, &init).expect("pointer event")
}

fn card_element() -> Element {
    let document = window().and_then(|w| w.document()).expect("document");
    let element = document.create_element("div").expect("div");
    document
        .body()
        .expect("body")
        .append_child(&element)
        .expect("append");
    element
}

#[wasm_bindgen_test]
fn window_listeners_drive_the_detector() {
    let element = card_element();
    let detector = GestureDetector::new(GestureConfig::default());
    let binding = SwipeBinding::attach(&element, detector.clone()).expect("binding");
    let win: EventTarget = window().expect("window").unchecked_into();

    element.dispatch_event(&pointer("pointerdown", 10)).expect("down");
    assert!(detector.state().is_dragging);
    win.dispatch_event(&pointer("pointermove", 90)).expect("move");
    assert_eq!(detector.state().offset_px, 80.0);
    win.dispatch_event(&pointer("pointerup", 180)).expect("up");
    assert!(detector.state().has_reached_threshold);

    drop(binding);
    element.remove();
}

#[wasm_bindgen_test]
fn dropped_binding_stops_listening() {
    let element = card_element();
    let detector = GestureDetector::new(GestureConfig::default());
    drop(SwipeBinding::attach(&element, detector.clone()).expect("binding"));

    element.dispatch_event(&pointer("pointerdown", 10)).expect("down");
    assert!(!detector.state().is_dragging);
    element.remove();
}

#[wasm_bindgen_test]
fn lost_capture_cancels_the_drag() {
    let element = card_element();
    let detector = GestureDetector::new(GestureConfig::default());
    let _binding = SwipeBinding::attach(&element, detector.clone()).expect("binding");

    element.dispatch_event(&pointer("pointerdown", 10)).expect("down");
    element.dispatch_event(&pointer("pointermove", 60)).expect("move");
    element
        .dispatch_event(&pointer("lostpointercapture", 60))
        .expect("lost capture");
    let state = detector.state();
    assert!(!state.is_dragging);
    assert!(!state.has_reached_threshold);
    assert_eq!(state.offset_px, 0.0);
    element.remove();
}
