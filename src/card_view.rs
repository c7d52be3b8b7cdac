use std::rc::Rc;

use swipedeck_core::{Card, CardId, CardPose, CardSlot, GestureDetector};
use web_sys::Element;
use yew::prelude::*;

use crate::swipe_binding::SwipeBinding;

const FRONT_SHADOW: &str = "0 1px 2px rgba(0, 0, 0, 0.45)";

/// Inline style carrying a pose into the stylesheet's custom properties.
pub fn pose_style(pose: &CardPose, transition_ms: u32) -> String {
    let duration = if pose.tracks_pointer { 0 } else { transition_ms };
    let pointer_events = if pose.interactive { "auto" } else { "none" };
    let shadow = if pose.emphasized { FRONT_SHADOW } else { "none" };
    format!(
        "--_dir: {}; --_x: {}px; --_y: {}px; --_rotate: {}deg; \
         transition-duration: {}ms; pointer-events: {}; box-shadow: {};",
        pose.direction.sign(),
        pose.offset_px,
        pose.lift_px,
        pose.rotation_deg,
        duration,
        pointer_events,
        shadow
    )
}

fn card_body(card: &Card) -> Html {
    html! {
        <>
            <img class="card-art" src={card.image_ref.clone()} alt=" " width="48" height="48" />
            <div class="card-title">{ card.title.clone() }</div>
            <p>{ card.description.clone() }</p>
        </>
    }
}

/// Identity of the engine a mounted card is wired to. A new detector for the
/// same card id must re-run the wiring.
fn engine_key(
    slot: &CardSlot,
    detector: &Rc<GestureDetector>,
) -> (CardId, *const GestureDetector) {
    (slot.card.id.clone(), Rc::as_ptr(detector))
}

#[derive(Properties)]
pub struct SwipeCardProps {
    pub slot: CardSlot,
    pub detector: Rc<GestureDetector>,
    pub transition_ms: u32,
}

impl PartialEq for SwipeCardProps {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
            && Rc::ptr_eq(&self.detector, &other.detector)
            && self.transition_ms == other.transition_ms
    }
}

#[function_component(SwipeCard)]
pub fn swipe_card(props: &SwipeCardProps) -> Html {
    let node = use_node_ref();
    let drag = use_state(|| props.detector.state());
    {
        let node = node.clone();
        let drag = drag.clone();
        let detector = Rc::clone(&props.detector);
        use_effect_with(engine_key(&props.slot, &props.detector), move |_| {
            let sink = drag.clone();
            let subscription = detector.subscribe_fn(move |state| sink.set(*state));
            drag.set(detector.state());
            let binding = node
                .cast::<Element>()
                .and_then(|element| SwipeBinding::attach(&element, detector));
            if binding.is_none() {
                gloo::console::warn!("swipe: card mounted without pointer binding");
            }
            move || {
                drop(binding);
                drop(subscription);
            }
        });
    }

    let pose = props.slot.pose(Some(&*drag));
    let class = classes!(
        "card",
        "swipe-card",
        (drag.is_dragging || drag.has_reached_threshold).then_some("contained"),
    );
    html! {
        <div
            ref={node}
            {class}
            data-reached-threshold={drag.has_reached_threshold.to_string()}
            style={pose_style(&pose, props.transition_ms)}
        >
            { card_body(&props.slot.card) }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct InertCardProps {
    pub slot: CardSlot,
    pub transition_ms: u32,
}

#[function_component(InertCard)]
pub fn inert_card(props: &InertCardProps) -> Html {
    let pose = props.slot.pose(None);
    html! {
        <div class="card inert-card" style={pose_style(&pose, props.transition_ms)}>
            { card_body(&props.slot.card) }
        </div>
    }
}
