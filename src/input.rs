use swipedeck_core::PointerSample;
use web_sys::PointerEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
    Unknown,
}

impl PointerKind {
    pub fn from_pointer_type(value: &str) -> Self {
        match value {
            "mouse" => PointerKind::Mouse,
            "touch" => PointerKind::Touch,
            "pen" => PointerKind::Pen,
            _ => PointerKind::Unknown,
        }
    }
}

const PRIMARY_BUTTON: i16 = 0;

/// Whether a `pointerdown` may start a swipe: primary pointer, and for mice
/// only the main button.
pub fn starts_swipe(event: &PointerEvent) -> bool {
    if !event.is_primary() {
        return false;
    }
    match PointerKind::from_pointer_type(&event.pointer_type()) {
        PointerKind::Mouse => event.button() == PRIMARY_BUTTON,
        _ => true,
    }
}

/// Horizontal position in client pixels, stamped with the event time.
pub fn pointer_sample(event: &PointerEvent) -> PointerSample {
    PointerSample::new(
        event.pointer_id(),
        f64::from(event.client_x()),
        event.time_stamp(),
    )
}
