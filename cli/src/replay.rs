use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Context};
use rand::Rng;
use serde::{Deserialize, Serialize};
use swipedeck_core::{
    Card, Deck, ManualScheduler, PointerSample, RefillGate, SwipeConfig, SwipeSession,
};

const DEFAULT_POINTER_ID: i32 = 1;

#[derive(Debug, Default, Deserialize)]
pub struct ReplayScript {
    pub config: Option<SwipeConfig>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl ReplayScript {
    pub fn parse(source: &str) -> anyhow::Result<Self> {
        let script: ReplayScript = toml::from_str(source).context("invalid replay script")?;
        if let Some(config) = script.config.as_ref() {
            config.validate().context("invalid [config] table in replay script")?;
        }
        Ok(script)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScriptAction {
    Down {
        x: f64,
        #[serde(default = "default_pointer")]
        pointer: i32,
    },
    Move {
        x: f64,
        #[serde(default = "default_pointer")]
        pointer: i32,
    },
    Up {
        x: f64,
        #[serde(default = "default_pointer")]
        pointer: i32,
    },
    Cancel {
        #[serde(default = "default_pointer")]
        pointer: i32,
    },
    Refill,
}

fn default_pointer() -> i32 {
    DEFAULT_POINTER_ID
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitRecord {
    pub at_ms: u64,
    pub card_id: String,
    pub direction: i8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplayReport {
    pub exits: Vec<ExitRecord>,
    pub commits: usize,
    pub refilled: usize,
    pub remaining: Vec<String>,
}

impl ReplayReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for exit in &self.exits {
            out.push_str(&format!(
                "{:>6}ms exit {} {:+}\n",
                exit.at_ms, exit.card_id, exit.direction
            ));
        }
        out.push_str(&format!(
            "commits={} refilled={} remaining=[{}]\n",
            self.commits,
            self.refilled,
            self.remaining.join(",")
        ));
        out
    }
}

/// Mock card content in the shape the demo page uses.
pub fn generate_cards(count: usize) -> Vec<Card> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|idx| {
            let id = format!("{:x}", rng.gen::<u64>());
            Card::new(
                id,
                format!("Generated card {}", idx + 1),
                format!("https://placehold.invalid/{}", idx + 1),
                "card",
            )
        })
        .collect()
}

/// Plays the script on a virtual clock: events fire at their `at_ms`, and
/// pending exits are flushed after the last event.
pub fn run(script: ReplayScript, config: SwipeConfig) -> anyhow::Result<ReplayReport> {
    let config = script.config.unwrap_or(config);
    let scheduler = ManualScheduler::new();
    let deck = Deck::new(script.cards);
    let session = SwipeSession::new(Rc::clone(&deck), config, Rc::new(scheduler.clone()));
    let gate = RefillGate::new(config.refill);

    let exits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&exits);
    let clock = scheduler.clone();
    let _exit_subscription = session.subscribe_exits_fn(move |event| {
        sink.borrow_mut().push(ExitRecord {
            at_ms: clock.now_ms(),
            card_id: event.card_id.to_string(),
            direction: event.direction.sign(),
        });
    });

    let mut report = ReplayReport::default();
    for (idx, event) in script.events.iter().enumerate() {
        let now = scheduler.now_ms();
        if event.at_ms < now {
            bail!(
                "event {} at {}ms is earlier than the previous event ({}ms)",
                idx,
                event.at_ms,
                now
            );
        }
        scheduler.advance(event.at_ms - now);
        let time_ms = event.at_ms as f64;
        match event.action {
            ScriptAction::Down { x, pointer } => {
                let captured = session.pointer_down(PointerSample::new(pointer, x, time_ms));
                tracing::debug!(at_ms = event.at_ms, captured, "down");
            }
            ScriptAction::Move { x, pointer } => {
                session.pointer_move(PointerSample::new(pointer, x, time_ms));
            }
            ScriptAction::Up { x, pointer } => {
                if session
                    .pointer_up(PointerSample::new(pointer, x, time_ms))
                    .is_some()
                {
                    report.commits += 1;
                }
            }
            ScriptAction::Cancel { pointer } => session.pointer_cancel(pointer),
            ScriptAction::Refill => match gate.begin(&deck) {
                Some(ticket) => {
                    let batch = generate_cards(ticket.batch_size());
                    report.refilled += ticket.complete(batch);
                }
                None => tracing::info!(at_ms = event.at_ms, len = deck.len(), "refill skipped"),
            },
        }
    }
    while scheduler.fire_next() {}

    report.exits = exits.borrow().clone();
    report.remaining = deck.ids().into_iter().map(|id| id.to_string()).collect();
    session.shutdown();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
        [[cards]]
        id = "A"
        title = "Alpha"
        img = "a.png"

        [[cards]]
        id = "B"
        title = "Beta"
        img = "b.png"

        [[events]]
        at_ms = 0
        kind = "down"
        x = 100

        [[events]]
        at_ms = 120
        kind = "move"
        x = 260.5

        [[events]]
        at_ms = 140
        kind = "up"
        x = 260.5

        [[events]]
        at_ms = 400
        kind = "down"
        x = 100

        [[events]]
        at_ms = 1400
        kind = "up"
        x = 70
    "#;

    #[test]
    fn replays_commit_then_snap_back() {
        let script = ReplayScript::parse(SCRIPT).expect("script");
        let report = run(script, SwipeConfig::default()).expect("report");
        assert_eq!(
            report.exits,
            vec![ExitRecord {
                at_ms: 340,
                card_id: "B".into(),
                direction: 1,
            }]
        );
        assert_eq!(report.commits, 1);
        assert_eq!(report.remaining, vec!["A".to_string()]);
        assert!(report.render_text().contains("exit B +1"));
    }

    #[test]
    fn refill_event_prepends_generated_cards() {
        let script = ReplayScript::parse(
            r#"
            [[events]]
            at_ms = 0
            kind = "refill"

            [[events]]
            at_ms = 5
            kind = "refill"
            "#,
        )
        .expect("script");
        let report = run(script, SwipeConfig::default()).expect("report");
        assert_eq!(report.refilled, 6);
        assert_eq!(report.remaining.len(), 6);
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let script = ReplayScript::parse(
            r#"
            [[events]]
            at_ms = 50
            kind = "cancel"

            [[events]]
            at_ms = 10
            kind = "cancel"
            "#,
        )
        .expect("script");
        let err = run(script, SwipeConfig::default()).expect_err("ordering");
        assert!(err.to_string().contains("earlier"));
    }

    #[test]
    fn inline_config_must_be_valid() {
        let err = ReplayScript::parse("[config.gesture]\ncommit_distance_px = -1.0\n")
            .expect_err("invalid");
        assert!(format!("{err:#}").contains("commit_distance_px"));
    }

    #[test]
    fn generated_ids_are_unique() {
        let cards = generate_cards(32);
        let deck = Deck::new(cards);
        assert_eq!(deck.len(), 32);
    }
}
