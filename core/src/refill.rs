use std::cell::Cell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::deck::Deck;

pub const DEFAULT_LOW_WATERMARK: usize = 5;
pub const DEFAULT_BATCH_SIZE: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefillConfig {
    /// A refill may start once the deck holds this many cards or fewer.
    pub low_watermark: usize,
    pub batch_size: usize,
}

impl Default for RefillConfig {
    fn default() -> Self {
        Self {
            low_watermark: DEFAULT_LOW_WATERMARK,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Allows at most one outstanding top-up of a running-low deck.
#[derive(Debug)]
pub struct RefillGate {
    config: RefillConfig,
    in_flight: Rc<Cell<bool>>,
}

impl RefillGate {
    pub fn new(config: RefillConfig) -> Self {
        Self {
            config,
            in_flight: Rc::new(Cell::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    pub fn begin(&self, deck: &Rc<Deck>) -> Option<RefillTicket> {
        if self.in_flight.get() || deck.len() > self.config.low_watermark {
            return None;
        }
        self.in_flight.set(true);
        tracing::debug!(len = deck.len(), batch = self.config.batch_size, "refill started");
        Some(RefillTicket {
            deck: Rc::downgrade(deck),
            in_flight: Rc::clone(&self.in_flight),
            batch_size: self.config.batch_size,
        })
    }
}

/// An outstanding refill. Dropping it without completing releases the gate.
#[derive(Debug)]
pub struct RefillTicket {
    deck: Weak<Deck>,
    in_flight: Rc<Cell<bool>>,
    batch_size: usize,
}

impl RefillTicket {
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Puts the fetched cards behind the current stack. Returns how many landed.
    pub fn complete(self, cards: Vec<Card>) -> usize {
        match self.deck.upgrade() {
            Some(deck) => deck.prepend(cards),
            None => 0,
        }
    }
}

impl Drop for RefillTicket {
    fn drop(&mut self) {
        self.in_flight.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(prefix: &str, count: usize) -> Vec<Card> {
        (0..count)
            .map(|idx| Card::new(format!("{prefix}{idx}"), "t", "i.png", "card"))
            .collect()
    }

    #[test]
    fn only_one_refill_at_a_time() {
        let deck = Deck::new(cards("a", 2));
        let gate = RefillGate::new(RefillConfig::default());
        let ticket = gate.begin(&deck).expect("ticket");
        assert!(gate.is_in_flight());
        assert!(gate.begin(&deck).is_none());

        assert_eq!(ticket.complete(cards("n", 3)), 3);
        assert!(!gate.is_in_flight());
        assert_eq!(deck.len(), 5);
        assert_eq!(deck.ids()[0].as_str(), "n0");
        assert_eq!(deck.frontmost().map(|card| card.id.to_string()), Some("a1".into()));
    }

    #[test]
    fn full_deck_does_not_refill() {
        let deck = Deck::new(cards("a", 6));
        let gate = RefillGate::new(RefillConfig::default());
        assert!(gate.begin(&deck).is_none());
        deck.remove(&"a0".into());
        assert!(gate.begin(&deck).is_some());
    }

    #[test]
    fn abandoned_ticket_releases_gate() {
        let deck = Deck::new(Vec::new());
        let gate = RefillGate::new(RefillConfig::default());
        drop(gate.begin(&deck));
        assert!(!gate.is_in_flight());
        assert!(gate.begin(&deck).is_some());
    }
}
