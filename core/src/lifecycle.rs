use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::card::{CardId, Direction};
use crate::deck::Deck;
use crate::gesture::{GestureDetector, SwipeState};
use crate::observer::Subscription;
use crate::timer::{ScheduledTask, Scheduler};

pub const DEFAULT_TRANSITION_MS: u32 = 200;

pub type ExitCallback = Rc<dyn Fn(Direction)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitPhase {
    Waiting,
    Scheduled,
    Finished,
    TornDown,
}

struct ExitState {
    phase: ExitPhase,
    direction: Direction,
    task: Option<ScheduledTask>,
}

/// Removes a committed card once its exit transition has had time to play.
///
/// The first threshold signal schedules a single timer; the timer removes the
/// card from the deck by id and, only if the card was still there, reports the
/// direction to `on_exit`. Tearing the controller down cancels a pending timer.
pub struct ExitController {
    me: Weak<ExitController>,
    card_id: CardId,
    deck: Weak<Deck>,
    scheduler: Rc<dyn Scheduler>,
    transition_ms: u32,
    on_exit: Option<ExitCallback>,
    state: RefCell<ExitState>,
}

impl ExitController {
    pub fn new(
        card_id: CardId,
        deck: &Rc<Deck>,
        scheduler: Rc<dyn Scheduler>,
        transition_ms: u32,
        on_exit: Option<ExitCallback>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            card_id,
            deck: Rc::downgrade(deck),
            scheduler,
            transition_ms,
            on_exit,
            state: RefCell::new(ExitState {
                phase: ExitPhase::Waiting,
                direction: Direction::Neutral,
                task: None,
            }),
        })
    }

    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    /// Follows `detector` for as long as the returned subscription lives. A
    /// detector that already committed is picked up immediately.
    pub fn bind(&self, detector: &GestureDetector) -> Subscription<SwipeState> {
        let me = self.me.clone();
        let subscription = detector.subscribe_fn(move |state| {
            if let Some(controller) = me.upgrade() {
                controller.observe(state);
            }
        });
        self.observe(&detector.state());
        subscription
    }

    pub fn observe(&self, swipe: &SwipeState) {
        if !swipe.has_reached_threshold {
            return;
        }
        {
            let mut state = self.state.borrow_mut();
            if state.phase != ExitPhase::Waiting {
                return;
            }
            state.phase = ExitPhase::Scheduled;
            state.direction = swipe.direction();
        }
        tracing::debug!(
            card = %self.card_id,
            delay_ms = self.transition_ms,
            "exit scheduled"
        );
        let me = self.me.clone();
        let task = self.scheduler.schedule(
            self.transition_ms,
            Box::new(move || {
                if let Some(controller) = me.upgrade() {
                    controller.fire();
                }
            }),
        );
        let mut state = self.state.borrow_mut();
        if state.phase == ExitPhase::Scheduled {
            state.task = Some(task);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().phase == ExitPhase::Scheduled
    }

    pub fn has_fired(&self) -> bool {
        self.state.borrow().phase == ExitPhase::Finished
    }

    /// Cancels a pending exit. Safe to call more than once.
    pub fn teardown(&self) {
        let task = {
            let mut state = self.state.borrow_mut();
            match state.phase {
                ExitPhase::Waiting | ExitPhase::Scheduled => {
                    state.phase = ExitPhase::TornDown;
                    state.task.take()
                }
                ExitPhase::Finished | ExitPhase::TornDown => None,
            }
        };
        if task.is_some() {
            tracing::debug!(card = %self.card_id, "pending exit cancelled");
        }
        drop(task);
    }

    fn fire(&self) {
        let direction = {
            let mut state = self.state.borrow_mut();
            if state.phase != ExitPhase::Scheduled {
                return;
            }
            state.phase = ExitPhase::Finished;
            state.direction
        };
        let Some(deck) = self.deck.upgrade() else {
            return;
        };
        if deck.remove(&self.card_id).is_none() {
            tracing::debug!(card = %self.card_id, "exit skipped, card already gone");
            return;
        }
        tracing::info!(card = %self.card_id, %direction, "card exited");
        if let Some(on_exit) = self.on_exit.as_ref() {
            on_exit(direction);
        }
    }
}

impl std::fmt::Debug for ExitController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ExitController")
            .field("card_id", &self.card_id)
            .field("phase", &state.phase)
            .field("direction", &state.direction)
            .finish()
    }
}
