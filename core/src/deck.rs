use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::card::{Card, CardId};
use crate::gesture::SwipeState;
use crate::layout::{card_pose, position_from_top, CardPose};
use crate::observer::{Listener, Observer, Subscription};

pub const DEFAULT_GESTURE_DEPTH: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeckChange {
    Prepended { count: usize },
    Appended { count: usize },
    Removed { id: CardId, index: usize },
    Replaced { len: usize },
    Cleared,
    Updated,
}

/// Which cards get rendered and which of them get gesture handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackView {
    /// Cards deeper than this are not rendered. `None` renders every card.
    pub visible_depth: Option<usize>,
    /// Number of cards, counted from the front, wired as swipeable.
    pub gesture_depth: usize,
}

impl Default for StackView {
    fn default() -> Self {
        Self {
            visible_depth: None,
            gesture_depth: DEFAULT_GESTURE_DEPTH,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    Swipeable,
    Inert,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CardSlot {
    pub card: Card,
    pub index: usize,
    pub position_from_top: usize,
    pub kind: SlotKind,
}

impl CardSlot {
    pub fn pose(&self, drag: Option<&SwipeState>) -> CardPose {
        match self.kind {
            SlotKind::Swipeable => card_pose(self.position_from_top, drag),
            SlotKind::Inert => card_pose(self.position_from_top, None),
        }
    }
}

/// Ordered card stack; the last card is the front one.
///
/// Every mutation goes through [`Deck::update`] against the current sequence,
/// so a removal and a prepend that race each other are both kept.
pub struct Deck {
    cards: RefCell<Vec<Card>>,
    observer: Observer<DeckChange>,
}

impl Deck {
    pub fn new(cards: Vec<Card>) -> Rc<Self> {
        Rc::new(Self {
            cards: RefCell::new(dedupe_against(&[], cards)),
            observer: Observer::new(),
        })
    }

    pub fn empty() -> Rc<Self> {
        Self::new(Vec::new())
    }

    pub fn subscribe(&self, listener: Listener<DeckChange>) -> Subscription<DeckChange> {
        self.observer.subscribe(listener)
    }

    pub fn subscribe_fn<F>(&self, listener: F) -> Subscription<DeckChange>
    where
        F: Fn(&DeckChange) + 'static,
    {
        self.observer.subscribe_fn(listener)
    }

    /// Applies `mutator` to the current sequence and notifies subscribers.
    /// Callers are responsible for keeping ids unique.
    ///
    /// The sequence stays mutably borrowed while `mutator` runs, so reading the
    /// deck from inside it (`len`, `cards`, `slots`, ...) panics. Work on the
    /// `&mut Vec<Card>` it is given instead.
    pub fn update<F, R>(&self, mutator: F) -> R
    where
        F: FnOnce(&mut Vec<Card>) -> R,
    {
        self.apply(|cards| (mutator(cards), Some(DeckChange::Updated)))
    }

    fn apply<F, R>(&self, mutator: F) -> R
    where
        F: FnOnce(&mut Vec<Card>) -> (R, Option<DeckChange>),
    {
        let (result, change) = {
            let mut cards = self.cards.borrow_mut();
            mutator(&mut cards)
        };
        if let Some(change) = change {
            self.observer.notify(&change);
        }
        result
    }

    /// Inserts cards behind the current stack. Returns how many were added.
    pub fn prepend(&self, incoming: Vec<Card>) -> usize {
        self.apply(|cards| {
            let fresh = dedupe_against(cards, incoming);
            let count = fresh.len();
            if count == 0 {
                return (0, None);
            }
            let current = std::mem::replace(cards, fresh);
            cards.extend(current);
            (count, Some(DeckChange::Prepended { count }))
        })
    }

    /// Puts a card on top of the stack.
    pub fn push(&self, card: Card) -> bool {
        self.apply(|cards| {
            let fresh = dedupe_against(cards, vec![card]);
            if fresh.is_empty() {
                return (false, None);
            }
            cards.extend(fresh);
            (true, Some(DeckChange::Appended { count: 1 }))
        })
    }

    pub fn remove(&self, id: &CardId) -> Option<Card> {
        self.apply(|cards| {
            let Some(index) = cards.iter().position(|card| &card.id == id) else {
                return (None, None);
            };
            let card = cards.remove(index);
            (
                Some(card),
                Some(DeckChange::Removed {
                    id: id.clone(),
                    index,
                }),
            )
        })
    }

    /// Swaps in a whole new sequence, dropping duplicate ids.
    pub fn replace(&self, incoming: Vec<Card>) {
        self.apply(|cards| {
            *cards = dedupe_against(&[], incoming);
            ((), Some(DeckChange::Replaced { len: cards.len() }))
        })
    }

    pub fn clear(&self) {
        self.apply(|cards| {
            if cards.is_empty() {
                return ((), None);
            }
            cards.clear();
            ((), Some(DeckChange::Cleared))
        })
    }

    pub fn len(&self) -> usize {
        self.cards.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.borrow().is_empty()
    }

    pub fn cards(&self) -> Vec<Card> {
        self.cards.borrow().clone()
    }

    pub fn ids(&self) -> Vec<CardId> {
        self.cards.borrow().iter().map(|card| card.id.clone()).collect()
    }

    pub fn contains(&self, id: &CardId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: &CardId) -> Option<usize> {
        self.cards.borrow().iter().position(|card| &card.id == id)
    }

    pub fn position_of(&self, id: &CardId) -> Option<usize> {
        let cards = self.cards.borrow();
        let index = cards.iter().position(|card| &card.id == id)?;
        position_from_top(index, cards.len())
    }

    pub fn frontmost(&self) -> Option<Card> {
        self.cards.borrow().last().cloned()
    }

    /// Render slots, back to front.
    pub fn slots(&self, view: &StackView) -> Vec<CardSlot> {
        let cards = self.cards.borrow();
        let len = cards.len();
        cards
            .iter()
            .enumerate()
            .filter_map(|(index, card)| {
                let depth = position_from_top(index, len)?;
                if let Some(visible) = view.visible_depth {
                    if depth >= visible {
                        return None;
                    }
                }
                let kind = if depth < view.gesture_depth {
                    SlotKind::Swipeable
                } else {
                    SlotKind::Inert
                };
                Some(CardSlot {
                    card: card.clone(),
                    index,
                    position_from_top: depth,
                    kind,
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for Deck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deck").field("ids", &self.ids()).finish()
    }
}

fn dedupe_against(existing: &[Card], incoming: Vec<Card>) -> Vec<Card> {
    let mut seen: HashSet<CardId> = existing.iter().map(|card| card.id.clone()).collect();
    let mut fresh = Vec::with_capacity(incoming.len());
    for card in incoming {
        if seen.insert(card.id.clone()) {
            fresh.push(card);
        } else {
            tracing::warn!(id = %card.id, "duplicate card id skipped");
        }
    }
    fresh
}
