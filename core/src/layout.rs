use crate::card::Direction;
use crate::gesture::SwipeState;

const FAN_STEP_DEG: f64 = 2.0;
const DRAG_ROTATION_DIVISOR: f64 = 10.0;
const DRAG_LIFT_DIVISOR: f64 = 5.0;

/// Visual parameters of one card, derived from its depth and live drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardPose {
    pub rotation_deg: f64,
    pub offset_px: f64,
    pub lift_px: f64,
    pub interactive: bool,
    pub emphasized: bool,
    pub tracks_pointer: bool,
    pub direction: Direction,
}

/// Depth of the card at `index` in a deck of `len` cards; the last card is 0.
pub fn position_from_top(index: usize, len: usize) -> Option<usize> {
    if index >= len {
        return None;
    }
    Some(len - 1 - index)
}

/// Fan-out rotation: 0 for the front card, then alternating sides growing by
/// two degrees per level (-2, +4, -6, +8, ...).
pub fn base_rotation(position_from_top: usize) -> f64 {
    if position_from_top == 0 {
        return 0.0;
    }
    let depth = position_from_top as f64;
    let side = if position_from_top % 2 == 0 { 1.0 } else { -1.0 };
    side * depth * FAN_STEP_DEG
}

pub fn card_pose(position_from_top: usize, drag: Option<&SwipeState>) -> CardPose {
    let front = position_from_top == 0;
    let base = base_rotation(position_from_top);
    match drag {
        Some(drag) => CardPose {
            rotation_deg: base + drag.offset_px / DRAG_ROTATION_DIVISOR,
            offset_px: drag.offset_px,
            lift_px: drag.offset_px.abs() / DRAG_LIFT_DIVISOR,
            interactive: front && !drag.has_reached_threshold,
            emphasized: front,
            tracks_pointer: drag.is_dragging && !drag.has_reached_threshold,
            direction: drag.direction(),
        },
        None => CardPose {
            rotation_deg: base,
            offset_px: 0.0,
            lift_px: 0.0,
            interactive: front,
            emphasized: front,
            tracks_pointer: false,
            direction: Direction::Neutral,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_alternates_and_grows() {
        let rotations: Vec<f64> = (0..5).map(base_rotation).collect();
        assert_eq!(rotations, vec![0.0, -2.0, 4.0, -6.0, 8.0]);
    }

    #[test]
    fn position_counts_from_the_end() {
        assert_eq!(position_from_top(4, 5), Some(0));
        assert_eq!(position_from_top(0, 5), Some(4));
        assert_eq!(position_from_top(5, 5), None);
        assert_eq!(position_from_top(0, 0), None);
    }

    #[test]
    fn drag_tilts_and_lifts_front_card() {
        let drag = SwipeState {
            offset_px: -60.0,
            is_dragging: true,
            has_reached_threshold: false,
        };
        let pose = card_pose(0, Some(&drag));
        assert_eq!(pose.rotation_deg, -6.0);
        assert_eq!(pose.offset_px, -60.0);
        assert_eq!(pose.lift_px, 12.0);
        assert!(pose.interactive);
        assert!(pose.emphasized);
        assert!(pose.tracks_pointer);
        assert_eq!(pose.direction, Direction::Left);
    }

    #[test]
    fn committed_card_is_inert_but_keeps_exit_pose() {
        let drag = SwipeState {
            offset_px: 150.0,
            is_dragging: false,
            has_reached_threshold: true,
        };
        let pose = card_pose(0, Some(&drag));
        assert!(!pose.interactive);
        assert!(!pose.tracks_pointer);
        assert!(pose.emphasized);
        assert_eq!(pose.rotation_deg, 15.0);
        assert_eq!(pose.lift_px, 30.0);
        assert_eq!(pose.direction, Direction::Right);
    }

    #[test]
    fn cards_behind_the_front_are_inert() {
        let pose = card_pose(1, Some(&SwipeState::default()));
        assert!(!pose.interactive);
        assert!(!pose.emphasized);
        assert_eq!(pose.rotation_deg, -2.0);

        let pose = card_pose(3, None);
        assert!(!pose.interactive);
        assert_eq!(pose.lift_px, 0.0);
        assert_eq!(pose.offset_px, 0.0);
    }

    #[test]
    fn pose_is_pure() {
        let drag = SwipeState {
            offset_px: 33.0,
            is_dragging: true,
            has_reached_threshold: false,
        };
        assert_eq!(card_pose(2, Some(&drag)), card_pose(2, Some(&drag)));
        assert_eq!(card_pose(2, None), card_pose(2, None));
    }
}
