use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::card::{Card, CardId, Direction};
use crate::config::SwipeConfig;
use crate::deck::{CardSlot, Deck, DeckChange, SlotKind};
use crate::gesture::{GestureDetector, PointerSample, SwipeState};
use crate::layout::CardPose;
use crate::lifecycle::ExitController;
use crate::observer::{Listener, Observer, Subscription};
use crate::timer::Scheduler;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExitEvent {
    pub card_id: CardId,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedCard {
    pub slot: CardSlot,
    pub pose: CardPose,
}

impl RenderedCard {
    pub fn card(&self) -> &Card {
        &self.slot.card
    }
}

struct CardEngine {
    detector: Rc<GestureDetector>,
    controller: Rc<ExitController>,
    _binding: Subscription<SwipeState>,
}

/// Wires a deck to per-card gesture detectors and exit controllers.
///
/// Only the front `gesture_depth` cards get an engine. Engines are keyed by
/// card id, so a card keeps its detector while it moves toward the front, and
/// an engine whose card left the swipeable range is torn down. A card with a
/// pending exit keeps its engine wherever it moves until it leaves the deck.
pub struct SwipeSession {
    me: Weak<SwipeSession>,
    deck: Rc<Deck>,
    config: SwipeConfig,
    scheduler: Rc<dyn Scheduler>,
    engines: RefCell<HashMap<CardId, CardEngine>>,
    exits: Observer<ExitEvent>,
    deck_subscription: RefCell<Option<Subscription<DeckChange>>>,
}

impl SwipeSession {
    pub fn new(deck: Rc<Deck>, config: SwipeConfig, scheduler: Rc<dyn Scheduler>) -> Rc<Self> {
        let session = Rc::new_cyclic(|me| Self {
            me: me.clone(),
            deck,
            config,
            scheduler,
            engines: RefCell::new(HashMap::new()),
            exits: Observer::new(),
            deck_subscription: RefCell::new(None),
        });
        let me = Rc::downgrade(&session);
        let subscription = session.deck.subscribe_fn(move |_| {
            if let Some(session) = me.upgrade() {
                session.sync();
            }
        });
        *session.deck_subscription.borrow_mut() = Some(subscription);
        session.sync();
        session
    }

    pub fn deck(&self) -> &Rc<Deck> {
        &self.deck
    }

    pub fn config(&self) -> &SwipeConfig {
        &self.config
    }

    pub fn subscribe_exits(&self, listener: Listener<ExitEvent>) -> Subscription<ExitEvent> {
        self.exits.subscribe(listener)
    }

    pub fn subscribe_exits_fn<F>(&self, listener: F) -> Subscription<ExitEvent>
    where
        F: Fn(&ExitEvent) + 'static,
    {
        self.exits.subscribe_fn(listener)
    }

    pub fn detector(&self, id: &CardId) -> Option<Rc<GestureDetector>> {
        self.engines
            .borrow()
            .get(id)
            .map(|engine| Rc::clone(&engine.detector))
    }

    pub fn is_exit_pending(&self, id: &CardId) -> bool {
        self.engines
            .borrow()
            .get(id)
            .map(|engine| engine.controller.is_pending())
            .unwrap_or(false)
    }

    pub fn swipe_state(&self, id: &CardId) -> Option<SwipeState> {
        self.detector(id).map(|detector| detector.state())
    }

    /// Current slots with their poses, back to front.
    pub fn render(&self) -> Vec<RenderedCard> {
        self.deck
            .slots(&self.config.view)
            .into_iter()
            .map(|slot| {
                let drag = match slot.kind {
                    SlotKind::Swipeable => self.swipe_state(&slot.card.id),
                    SlotKind::Inert => None,
                };
                let pose = slot.pose(drag.as_ref());
                RenderedCard { slot, pose }
            })
            .collect()
    }

    /// Routes a press to the front card. Returns `true` when a drag started.
    pub fn pointer_down(&self, sample: PointerSample) -> bool {
        let Some(front) = self.deck.frontmost() else {
            return false;
        };
        match self.detector(&front.id) {
            Some(detector) => detector.pointer_down(sample),
            None => false,
        }
    }

    pub fn pointer_move(&self, sample: PointerSample) {
        for detector in self.detectors() {
            detector.pointer_move(sample);
        }
    }

    pub fn pointer_up(&self, sample: PointerSample) -> Option<Direction> {
        let mut decision = None;
        for detector in self.detectors() {
            if let Some(direction) = detector.pointer_up(sample) {
                decision = Some(direction);
            }
        }
        decision
    }

    pub fn pointer_cancel(&self, pointer_id: i32) {
        for detector in self.detectors() {
            detector.pointer_cancel(pointer_id);
        }
    }

    /// Tears down every engine; pending exits are cancelled.
    pub fn shutdown(&self) {
        if let Some(subscription) = self.deck_subscription.borrow_mut().take() {
            subscription.unsubscribe();
        }
        let engines: Vec<CardEngine> = self.engines.borrow_mut().drain().map(|(_, e)| e).collect();
        for engine in &engines {
            engine.controller.teardown();
        }
    }

    fn detectors(&self) -> Vec<Rc<GestureDetector>> {
        self.engines
            .borrow()
            .values()
            .map(|engine| Rc::clone(&engine.detector))
            .collect()
    }

    fn sync(&self) {
        let wanted: Vec<CardId> = self
            .deck
            .slots(&self.config.view)
            .into_iter()
            .filter(|slot| slot.kind == SlotKind::Swipeable)
            .map(|slot| slot.card.id)
            .collect();

        let stale: Vec<CardEngine> = {
            let mut engines = self.engines.borrow_mut();
            let gone: Vec<CardId> = engines
                .iter()
                .filter(|(id, engine)| {
                    !wanted.contains(id)
                        && !(engine.controller.is_pending() && self.deck.contains(id))
                })
                .map(|(id, _)| id.clone())
                .collect();
            gone.iter().filter_map(|id| engines.remove(id)).collect()
        };
        for engine in &stale {
            engine.controller.teardown();
        }
        drop(stale);

        for id in wanted {
            if self.engines.borrow().contains_key(&id) {
                continue;
            }
            let engine = self.build_engine(id.clone());
            self.engines.borrow_mut().insert(id, engine);
        }
    }

    fn build_engine(&self, card_id: CardId) -> CardEngine {
        let detector = GestureDetector::new(self.config.gesture);
        let me = self.me.clone();
        let exit_id = card_id.clone();
        let on_exit = Rc::new(move |direction: Direction| {
            if let Some(session) = me.upgrade() {
                session.exits.notify(&ExitEvent {
                    card_id: exit_id.clone(),
                    direction,
                });
            }
        });
        let controller = ExitController::new(
            card_id,
            &self.deck,
            Rc::clone(&self.scheduler),
            self.config.transition_ms,
            Some(on_exit),
        );
        let binding = controller.bind(&detector);
        CardEngine {
            detector,
            controller,
            _binding: binding,
        }
    }
}

impl Drop for SwipeSession {
    fn drop(&mut self) {
        for engine in self.engines.get_mut().values() {
            engine.controller.teardown();
        }
    }
}

impl std::fmt::Debug for SwipeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwipeSession")
            .field("deck", &self.deck)
            .field("engines", &self.engines.borrow().len())
            .finish()
    }
}
