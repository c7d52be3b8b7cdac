use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub type TimerCallback = Box<dyn FnOnce()>;

/// Source of one-shot timers on the UI thread.
pub trait Scheduler {
    fn schedule(&self, delay_ms: u32, callback: TimerCallback) -> ScheduledTask;
}

/// A pending timer. Dropping it (or calling [`ScheduledTask::cancel`]) cancels
/// the callback if it has not run yet.
pub struct ScheduledTask {
    _guard: Box<dyn Any>,
}

impl ScheduledTask {
    /// Wraps a platform handle whose `Drop` cancels the timer.
    pub fn new<G: 'static>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScheduledTask")
    }
}

struct Pending {
    id: u64,
    due_ms: u64,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualQueue {
    now_ms: u64,
    next_id: u64,
    pending: Vec<Pending>,
}

impl ManualQueue {
    fn pop_due(&mut self, until_ms: u64) -> Option<Pending> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due_ms <= until_ms)
            .min_by_key(|(_, task)| (task.due_ms, task.id))
            .map(|(idx, _)| idx)?;
        Some(self.pending.remove(idx))
    }
}

/// Virtual clock scheduler. Nothing fires until the clock is advanced.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<ManualQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.queue.borrow().now_ms
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    /// Moves the clock forward, running due callbacks in deadline order.
    /// Returns how many callbacks ran.
    pub fn advance(&self, delta_ms: u64) -> usize {
        let target = self.queue.borrow().now_ms.saturating_add(delta_ms);
        let mut fired = 0;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                let task = queue.pop_due(target);
                if let Some(task) = task.as_ref() {
                    queue.now_ms = queue.now_ms.max(task.due_ms);
                }
                task
            };
            let Some(task) = next else {
                break;
            };
            (task.callback)();
            fired += 1;
        }
        self.queue.borrow_mut().now_ms = target;
        fired
    }

    /// Advances exactly to the next deadline, if any.
    pub fn fire_next(&self) -> bool {
        let next_due = {
            let queue = self.queue.borrow();
            queue.pending.iter().map(|task| task.due_ms).min()
        };
        match next_due {
            Some(due) => {
                let delta = due.saturating_sub(self.now_ms());
                self.advance(delta) > 0
            }
            None => false,
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, callback: TimerCallback) -> ScheduledTask {
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id;
        queue.next_id = id.wrapping_add(1);
        let due_ms = queue.now_ms.saturating_add(u64::from(delay_ms));
        queue.pending.push(Pending {
            id,
            due_ms,
            callback,
        });
        ScheduledTask::new(ManualGuard {
            id,
            queue: Rc::downgrade(&self.queue),
        })
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("ManualScheduler")
            .field("now_ms", &queue.now_ms)
            .field("pending", &queue.pending.len())
            .finish()
    }
}

struct ManualGuard {
    id: u64,
    queue: Weak<RefCell<ManualQueue>>,
}

impl Drop for ManualGuard {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.upgrade() {
            queue.borrow_mut().pending.retain(|task| task.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn fires_only_once_deadline_passes() {
        let scheduler = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _task = scheduler.schedule(200, Box::new(move || counter.set(counter.get() + 1)));

        assert_eq!(scheduler.advance(199), 0);
        assert_eq!(hits.get(), 0);
        assert_eq!(scheduler.advance(1), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(scheduler.advance(1_000), 0);
        assert_eq!(scheduler.now_ms(), 1_200);
    }

    #[test]
    fn dropping_task_cancels() {
        let scheduler = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let task = scheduler.schedule(10, Box::new(move || counter.set(counter.get() + 1)));
        task.cancel();
        assert_eq!(scheduler.pending(), 0);
        scheduler.advance(100);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn runs_in_deadline_order_and_allows_rescheduling() {
        let scheduler = ManualScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut tasks = Vec::new();
        for (label, delay) in [("late", 30u32), ("early", 10), ("tie", 10)] {
            let order = Rc::clone(&order);
            tasks.push(scheduler.schedule(delay, Box::new(move || order.borrow_mut().push(label))));
        }
        let nested = Rc::new(RefCell::new(None));
        {
            let order = Rc::clone(&order);
            let inner = scheduler.clone();
            let nested_slot = Rc::clone(&nested);
            tasks.push(scheduler.schedule(
                15,
                Box::new(move || {
                    let order = Rc::clone(&order);
                    *nested_slot.borrow_mut() =
                        Some(inner.schedule(5, Box::new(move || order.borrow_mut().push("nested"))));
                }),
            ));
        }
        scheduler.advance(100);
        assert_eq!(*order.borrow(), vec!["early", "tie", "nested", "late"]);
    }

    #[test]
    fn fire_next_jumps_to_deadline() {
        let scheduler = ManualScheduler::new();
        let _task = scheduler.schedule(250, Box::new(|| {}));
        assert!(scheduler.fire_next());
        assert_eq!(scheduler.now_ms(), 250);
        assert!(!scheduler.fire_next());
    }
}
