use std::cell::RefCell;
use std::rc::Rc;

use gloo::timers::callback::Timeout;
use swipedeck_core::{Card, Deck, Direction, RefillGate, SlotKind, SwipeConfig, SwipeSession};
use yew::prelude::*;

use crate::card_view::{InertCard, SwipeCard};
use crate::gloo_timer::GlooScheduler;

const INITIAL_CARDS: usize = 5;
const MOCK_FETCH_DELAY_MS: u32 = 600;
const MOCK_TITLES: &[&str] = &[
    "accusamus beatae ad facilis cum similique qui sunt",
    "reprehenderit est deserunt velit ipsam",
    "officia porro iure quia iusto qui ipsa ut modi",
    "culpa odio esse rerum omnis laboriosam voluptate repudiandae",
    "natus nisi omnis corporis facere molestiae rerum in",
    "accusamus ea aliquid et amet sequi nemo",
];

fn mock_cards(count: usize) -> Vec<Card> {
    (0..count)
        .map(|_| {
            let seed = (js_sys::Math::random() * f64::from(u32::MAX)) as u32;
            let id = format!("{seed:x}");
            let title = MOCK_TITLES[seed as usize % MOCK_TITLES.len()];
            let image = format!("https://picsum.photos/seed/{id}/96");
            Card::new(id, title, image, "card")
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tally {
    right: u32,
    left: u32,
}

impl Tally {
    fn record(&mut self, direction: Direction) {
        match direction {
            Direction::Right => self.right += 1,
            Direction::Left => self.left += 1,
            Direction::Neutral => {}
        }
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let session = use_memo((), |_| {
        let deck = Deck::new(mock_cards(INITIAL_CARDS));
        SwipeSession::new(deck, SwipeConfig::default(), Rc::new(GlooScheduler))
    });
    let refresh = use_force_update();
    let tally = use_mut_ref(Tally::default);

    {
        let session = Rc::clone(&*session);
        let refresh = refresh.clone();
        let tally = tally.clone();
        use_effect_with((), move |_| {
            let gate = Rc::new(RefillGate::new(session.config().refill));
            let pending_fetch: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));

            let refill = {
                let deck = Rc::clone(session.deck());
                let gate = Rc::clone(&gate);
                let pending_fetch = Rc::clone(&pending_fetch);
                move || {
                    let Some(ticket) = gate.begin(&deck) else {
                        return;
                    };
                    gloo::console::log!("deck: refilling", deck.len());
                    let batch = ticket.batch_size();
                    let timer = Timeout::new(MOCK_FETCH_DELAY_MS, move || {
                        let added = ticket.complete(mock_cards(batch));
                        gloo::console::log!("deck: refill landed", added);
                    });
                    *pending_fetch.borrow_mut() = Some(timer);
                }
            };
            refill();

            let deck_subscription = {
                let refresh = refresh.clone();
                session.deck().subscribe_fn(move |_| {
                    refresh.force_update();
                    refill();
                })
            };
            let exit_subscription = session.subscribe_exits_fn(move |event| {
                gloo::console::log!("exit", event.card_id.to_string(), event.direction.sign());
                tally.borrow_mut().record(event.direction);
                refresh.force_update();
            });

            move || {
                drop(exit_subscription);
                drop(deck_subscription);
                pending_fetch.borrow_mut().take();
                session.shutdown();
            }
        });
    }

    let transition_ms = session.config().transition_ms;
    let cards = session.deck().slots(&session.config().view).into_iter().map(|slot| {
        let key = slot.card.id.to_string();
        let detector = match slot.kind {
            SlotKind::Swipeable => session.detector(&slot.card.id),
            SlotKind::Inert => None,
        };
        match detector {
            Some(detector) => html! {
                <SwipeCard key={key} {slot} {detector} {transition_ms} />
            },
            None => html! {
                <InertCard key={key} {slot} {transition_ms} />
            },
        }
    });
    let tally = *tally.borrow();

    html! {
        <main class="swipe-page">
            <div class="stack">
                { for cards }
            </div>
            <p class="tally">
                { format!("right {} / left {}", tally.right, tally.left) }
            </p>
        </main>
    }
}
