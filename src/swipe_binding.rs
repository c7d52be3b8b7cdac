use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use swipedeck_core::GestureDetector;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, PointerEvent};

use crate::input::{pointer_sample, starts_swipe};

/// Pointer listeners feeding one card's detector. The press is taken on the
/// card element; moves and releases are followed on the window so a drag
/// keeps working once the pointer leaves the card. Losing pointer capture
/// counts as a cancel. Dropping the binding detaches every listener.
pub struct SwipeBinding {
    _listeners: Vec<EventListener>,
}

impl SwipeBinding {
    pub fn attach(element: &Element, detector: Rc<GestureDetector>) -> Option<Self> {
        let window = web_sys::window()?;
        let options = || EventListenerOptions {
            phase: EventListenerPhase::Capture,
            passive: false,
        };

        let down_detector = Rc::clone(&detector);
        let target = element.clone();
        let down = EventListener::new_with_options(
            element,
            "pointerdown",
            options(),
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<PointerEvent>() else {
                    return;
                };
                if !starts_swipe(event) {
                    return;
                }
                if down_detector.pointer_down(pointer_sample(event)) {
                    if target.set_pointer_capture(event.pointer_id()).is_err() {
                        gloo::console::warn!("swipe: pointer capture refused", event.pointer_id());
                    }
                    event.prevent_default();
                }
            },
        );

        let move_detector = Rc::clone(&detector);
        let pointer_move = EventListener::new_with_options(
            &window,
            "pointermove",
            options(),
            move |event: &Event| {
                if let Some(event) = event.dyn_ref::<PointerEvent>() {
                    move_detector.pointer_move(pointer_sample(event));
                }
            },
        );

        let up_detector = Rc::clone(&detector);
        let pointer_up = EventListener::new_with_options(
            &window,
            "pointerup",
            options(),
            move |event: &Event| {
                if let Some(event) = event.dyn_ref::<PointerEvent>() {
                    if let Some(direction) = up_detector.pointer_up(pointer_sample(event)) {
                        gloo::console::log!("swipe: committed", direction.to_string());
                    }
                }
            },
        );

        let cancel_detector = Rc::clone(&detector);
        let pointer_cancel = EventListener::new_with_options(
            &window,
            "pointercancel",
            options(),
            move |event: &Event| {
                if let Some(event) = event.dyn_ref::<PointerEvent>() {
                    cancel_detector.pointer_cancel(event.pointer_id());
                }
            },
        );

        let lost_detector = Rc::clone(&detector);
        let lost_capture = EventListener::new(element, "lostpointercapture", move |event: &Event| {
            if let Some(event) = event.dyn_ref::<PointerEvent>() {
                lost_detector.pointer_cancel(event.pointer_id());
            }
        });

        Some(Self {
            _listeners: vec![down, pointer_move, pointer_up, pointer_cancel, lost_capture],
        })
    }
}
