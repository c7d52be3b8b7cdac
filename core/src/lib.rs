pub mod card;
pub mod config;
pub mod deck;
pub mod error;
pub mod gesture;
pub mod layout;
pub mod lifecycle;
pub mod observer;
pub mod refill;
pub mod session;
pub mod timer;

pub use card::{Card, CardId, Direction};
pub use config::SwipeConfig;
pub use deck::{CardSlot, Deck, DeckChange, SlotKind, StackView};
pub use error::ConfigError;
pub use gesture::{evaluate_commit, GestureConfig, GestureDetector, PointerSample, SwipeState};
pub use layout::{base_rotation, card_pose, position_from_top, CardPose};
pub use lifecycle::{ExitCallback, ExitController, DEFAULT_TRANSITION_MS};
pub use observer::{Listener, Observer, Subscription};
pub use refill::{RefillConfig, RefillGate, RefillTicket};
pub use session::{ExitEvent, RenderedCard, SwipeSession};
pub use timer::{ManualScheduler, ScheduledTask, Scheduler, TimerCallback};
