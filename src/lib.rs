pub mod card_view;
pub mod gloo_timer;
pub mod input;
pub mod swipe_binding;
pub mod yew_app;

pub use gloo_timer::GlooScheduler;
pub use swipe_binding::SwipeBinding;

/// Mounts the demo deck on the document body.
pub fn start() {
    console_error_panic_hook::set_once();
    gloo::console::log!("swipedeck: starting");
    yew::Renderer::<yew_app::App>::new().render();
}
