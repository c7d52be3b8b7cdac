use gloo::timers::callback::Timeout;
use swipedeck_core::{ScheduledTask, Scheduler, TimerCallback};

/// Browser timers. The `Timeout` handle is the task guard, so dropping the
/// task clears the pending `setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooScheduler;

impl Scheduler for GlooScheduler {
    fn schedule(&self, delay_ms: u32, callback: TimerCallback) -> ScheduledTask {
        ScheduledTask::new(Timeout::new(delay_ms, callback))
    }
}
