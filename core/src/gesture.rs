use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::card::Direction;
use crate::observer::{Listener, Observer, Subscription};

pub const DEFAULT_COMMIT_DISTANCE_PX: f64 = 100.0;
pub const DEFAULT_COMMIT_VELOCITY_PX_PER_MS: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub commit_distance_px: f64,
    pub commit_velocity_px_per_ms: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            commit_distance_px: DEFAULT_COMMIT_DISTANCE_PX,
            commit_velocity_px_per_ms: DEFAULT_COMMIT_VELOCITY_PX_PER_MS,
        }
    }
}

/// What a detector reports to its consumers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SwipeState {
    pub offset_px: f64,
    pub is_dragging: bool,
    pub has_reached_threshold: bool,
}

impl SwipeState {
    pub fn direction(&self) -> Direction {
        Direction::from_offset(self.offset_px)
    }
}

/// One pointer reading. `x` is in the same horizontal space for every event of a drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub pointer_id: i32,
    pub x: f64,
    pub time_ms: f64,
}

impl PointerSample {
    pub fn new(pointer_id: i32, x: f64, time_ms: f64) -> Self {
        Self {
            pointer_id,
            x,
            time_ms,
        }
    }
}

/// Distance-or-velocity commit rule. A non-positive `elapsed_ms` falls back to
/// distance only.
pub fn evaluate_commit(config: &GestureConfig, offset_px: f64, elapsed_ms: f64) -> bool {
    let distance = offset_px.abs();
    if distance >= config.commit_distance_px {
        return true;
    }
    if elapsed_ms <= 0.0 || !elapsed_ms.is_finite() {
        return false;
    }
    distance / elapsed_ms > config.commit_velocity_px_per_ms
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle,
    Dragging(DragState),
    Committed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DragState {
    pointer_id: i32,
    origin_x: f64,
    started_at_ms: f64,
}

#[derive(Debug)]
struct DetectorState {
    phase: Phase,
    offset_px: f64,
}

impl DetectorState {
    fn snapshot(&self) -> SwipeState {
        SwipeState {
            offset_px: self.offset_px,
            is_dragging: matches!(self.phase, Phase::Dragging(_)),
            has_reached_threshold: matches!(self.phase, Phase::Committed),
        }
    }
}

/// Turns the pointer stream of one card into a [`SwipeState`].
///
/// Idle -> Dragging on pointer down, back to Idle when a release does not
/// commit, and Committed (terminal) when it does. Every accepted transition is
/// published to subscribers. The detector never touches the deck.
pub struct GestureDetector {
    config: GestureConfig,
    state: RefCell<DetectorState>,
    observer: Observer<SwipeState>,
}

impl GestureDetector {
    pub fn new(config: GestureConfig) -> Rc<Self> {
        Rc::new(Self {
            config,
            state: RefCell::new(DetectorState {
                phase: Phase::Idle,
                offset_px: 0.0,
            }),
            observer: Observer::new(),
        })
    }

    pub fn config(&self) -> GestureConfig {
        self.config
    }

    pub fn state(&self) -> SwipeState {
        self.state.borrow().snapshot()
    }

    pub fn direction(&self) -> Direction {
        self.state().direction()
    }

    pub fn is_committed(&self) -> bool {
        matches!(self.state.borrow().phase, Phase::Committed)
    }

    pub fn subscribe(&self, listener: Listener<SwipeState>) -> Subscription<SwipeState> {
        self.observer.subscribe(listener)
    }

    pub fn subscribe_fn<F>(&self, listener: F) -> Subscription<SwipeState>
    where
        F: Fn(&SwipeState) + 'static,
    {
        self.observer.subscribe_fn(listener)
    }

    /// Returns `true` when the pointer was captured.
    pub fn pointer_down(&self, sample: PointerSample) -> bool {
        let mut state = self.state.borrow_mut();
        match state.phase {
            Phase::Idle => {}
            Phase::Dragging(_) => {
                tracing::trace!(pointer_id = sample.pointer_id, "pointer down ignored while dragging");
                return false;
            }
            Phase::Committed => {
                tracing::trace!(pointer_id = sample.pointer_id, "pointer down ignored after commit");
                return false;
            }
        }
        state.phase = Phase::Dragging(DragState {
            pointer_id: sample.pointer_id,
            origin_x: sample.x,
            started_at_ms: sample.time_ms,
        });
        state.offset_px = 0.0;
        drop(state);
        tracing::debug!(pointer_id = sample.pointer_id, x = sample.x, "drag started");
        self.publish();
        true
    }

    pub fn pointer_move(&self, sample: PointerSample) {
        let mut state = self.state.borrow_mut();
        let Phase::Dragging(drag) = state.phase else {
            tracing::trace!(pointer_id = sample.pointer_id, "pointer move without drag");
            return;
        };
        if drag.pointer_id != sample.pointer_id {
            return;
        }
        state.offset_px = sample.x - drag.origin_x;
        drop(state);
        self.publish();
    }

    /// Ends the drag. The release position counts as the final move. Returns the
    /// decision when the drag commits.
    pub fn pointer_up(&self, sample: PointerSample) -> Option<Direction> {
        let mut state = self.state.borrow_mut();
        let Phase::Dragging(drag) = state.phase else {
            tracing::trace!(pointer_id = sample.pointer_id, "pointer up without drag");
            return None;
        };
        if drag.pointer_id != sample.pointer_id {
            return None;
        }
        let offset_px = sample.x - drag.origin_x;
        let elapsed_ms = sample.time_ms - drag.started_at_ms;
        let committed = evaluate_commit(&self.config, offset_px, elapsed_ms);
        let decision = if committed {
            state.phase = Phase::Committed;
            state.offset_px = offset_px;
            let direction = Direction::from_offset(offset_px);
            tracing::info!(offset_px, elapsed_ms, %direction, "swipe committed");
            Some(direction)
        } else {
            state.phase = Phase::Idle;
            state.offset_px = 0.0;
            tracing::debug!(offset_px, elapsed_ms, "drag released below threshold");
            None
        };
        drop(state);
        self.publish();
        decision
    }

    /// Lost capture or a cancelled pointer: never commits.
    pub fn pointer_cancel(&self, pointer_id: i32) {
        let mut state = self.state.borrow_mut();
        let Phase::Dragging(drag) = state.phase else {
            return;
        };
        if drag.pointer_id != pointer_id {
            return;
        }
        state.phase = Phase::Idle;
        state.offset_px = 0.0;
        drop(state);
        tracing::debug!(pointer_id, "drag cancelled");
        self.publish();
    }

    /// Returns to a neutral idle state, including from Committed.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        if state.phase == Phase::Idle && state.offset_px == 0.0 {
            return;
        }
        state.phase = Phase::Idle;
        state.offset_px = 0.0;
        drop(state);
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.state();
        self.observer.notify(&snapshot);
    }
}

impl std::fmt::Debug for GestureDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureDetector")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}
