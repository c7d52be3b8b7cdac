use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

pub type Listener<T> = Rc<dyn Fn(&T)>;

struct Registry<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

/// Single-threaded one-to-many notifier.
///
/// Listeners run synchronously in registration order. `notify` iterates over a
/// snapshot of the registrations, so listeners may subscribe or unsubscribe
/// while being notified. A listener that panics is logged and skipped; the rest
/// still run.
pub struct Observer<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T> Observer<T> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self, listener: Listener<T>) -> Subscription<T> {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id = id.wrapping_add(1);
        registry.entries.push((id, listener));
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
            active: Cell::new(true),
        }
    }

    pub fn subscribe_fn<F>(&self, listener: F) -> Subscription<T>
    where
        F: Fn(&T) + 'static,
    {
        self.subscribe(Rc::new(listener))
    }

    /// Removes the first registration of `listener`. Unknown listeners are ignored.
    pub fn unsubscribe(&self, listener: &Listener<T>) {
        let mut registry = self.registry.borrow_mut();
        if let Some(idx) = registry
            .entries
            .iter()
            .position(|(_, item)| Rc::ptr_eq(item, listener))
        {
            registry.entries.remove(idx);
        }
    }

    pub fn notify(&self, payload: &T) {
        let listeners: Vec<Listener<T>> = self
            .registry
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for (idx, listener) in listeners.iter().enumerate() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener(payload)));
            if let Err(cause) = result {
                tracing::error!(
                    listener = idx,
                    cause = %panic_message(cause.as_ref()),
                    "observer listener panicked"
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Observer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<T> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Handle for one registration. Unsubscribes when dropped unless detached.
pub struct Subscription<T> {
    id: u64,
    registry: Weak<RefCell<Registry<T>>>,
    active: Cell<bool>,
}

impl<T> Subscription<T> {
    /// Removes this registration. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry
            .borrow_mut()
            .entries
            .retain(|(id, _)| *id != self.id);
    }

    /// Whether the registration is still in its observer, however it got
    /// removed (this handle, `Observer::unsubscribe`, or a dropped observer).
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|registry| registry.borrow().entries.iter().any(|(id, _)| *id == self.id))
            .unwrap_or(false)
    }

    /// Keeps the registration alive for the lifetime of the observer.
    pub fn detach(self) {
        self.active.set(false);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> Listener<u32>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |name: &'static str| -> Listener<u32> {
            let sink = Rc::clone(&sink);
            Rc::new(move |value: &u32| sink.borrow_mut().push(format!("{name}:{value}")))
        };
        (log, make)
    }

    #[test]
    fn notify_runs_listeners_in_registration_order() {
        let observer = Observer::new();
        let (log, make) = recorder();
        let _a = observer.subscribe(make("a"));
        let _b = observer.subscribe(make("b"));
        observer.notify(&7);
        assert_eq!(*log.borrow(), vec!["a:7", "b:7"]);
    }

    #[test]
    fn same_listener_twice_fires_twice() {
        let observer = Observer::new();
        let (log, make) = recorder();
        let listener = make("x");
        let _first = observer.subscribe(Rc::clone(&listener));
        let _second = observer.subscribe(Rc::clone(&listener));
        observer.notify(&1);
        assert_eq!(log.borrow().len(), 2);

        observer.unsubscribe(&listener);
        assert_eq!(observer.len(), 1);
        observer.notify(&2);
        assert_eq!(log.borrow().last().map(String::as_str), Some("x:2"));
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn unsubscribe_unknown_listener_is_noop() {
        let observer: Observer<u32> = Observer::new();
        let (_log, make) = recorder();
        let _a = observer.subscribe(make("a"));
        observer.unsubscribe(&make("stranger"));
        assert_eq!(observer.len(), 1);
    }

    #[test]
    fn handle_unsubscribe_is_idempotent() {
        let observer = Observer::new();
        let (log, make) = recorder();
        let a = observer.subscribe(make("a"));
        let _b = observer.subscribe(make("b"));
        a.unsubscribe();
        a.unsubscribe();
        assert!(!a.is_active());
        assert_eq!(observer.len(), 1);
        observer.notify(&3);
        assert_eq!(*log.borrow(), vec!["b:3"]);
    }

    #[test]
    fn handle_only_removes_its_own_registration() {
        let observer = Observer::new();
        let (log, make) = recorder();
        let shared = make("s");
        let first = observer.subscribe(Rc::clone(&shared));
        let _second = observer.subscribe(Rc::clone(&shared));
        first.unsubscribe();
        first.unsubscribe();
        observer.notify(&4);
        assert_eq!(*log.borrow(), vec!["s:4"]);
    }

    #[test]
    fn dropping_handle_unsubscribes_and_detach_keeps() {
        let observer = Observer::new();
        let (log, make) = recorder();
        drop(observer.subscribe(make("gone")));
        observer.subscribe(make("kept")).detach();
        observer.notify(&5);
        assert_eq!(*log.borrow(), vec!["kept:5"]);
    }

    #[test]
    fn panicking_listener_does_not_starve_others() {
        let observer = Observer::new();
        let (log, make) = recorder();
        let _a = observer.subscribe(make("a"));
        let _bad = observer.subscribe_fn(|_: &u32| panic!("listener failure"));
        let _c = observer.subscribe(make("c"));
        observer.notify(&9);
        assert_eq!(*log.borrow(), vec!["a:9", "c:9"]);
    }

    #[test]
    fn listener_can_unsubscribe_during_notify() {
        let observer: Observer<u32> = Observer::new();
        let (log, make) = recorder();
        let slot: Rc<RefCell<Option<Subscription<u32>>>> = Rc::new(RefCell::new(None));
        let slot_inner = Rc::clone(&slot);
        let once = observer.subscribe_fn(move |_| {
            if let Some(sub) = slot_inner.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        let _later = observer.subscribe(make("later"));
        *slot.borrow_mut() = Some(once);

        observer.notify(&1);
        observer.notify(&2);
        assert_eq!(*log.borrow(), vec!["later:1", "later:2"]);
        assert_eq!(observer.len(), 1);
    }

    #[test]
    fn is_active_follows_the_registration() {
        let observer: Observer<u32> = Observer::new();
        let listener: Listener<u32> = Rc::new(|_: &u32| {});
        let by_handle = observer.subscribe(Rc::clone(&listener));
        let by_identity = observer.subscribe_fn(|_| {});
        assert!(by_handle.is_active());

        observer.unsubscribe(&listener);
        assert!(!by_handle.is_active());
        assert!(by_identity.is_active());
        by_identity.unsubscribe();
        assert!(!by_identity.is_active());
    }

    #[test]
    fn subscription_outlives_observer() {
        let observer: Observer<u32> = Observer::new();
        let sub = observer.subscribe_fn(|_| {});
        drop(observer);
        assert!(!sub.is_active());
        sub.unsubscribe();
    }
}
