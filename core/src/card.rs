use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CardId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Content supplied by the card source. The engine only reorders and removes cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    #[serde(alias = "img")]
    pub image_ref: String,
    #[serde(default)]
    pub description: String,
}

impl Card {
    pub fn new(
        id: impl Into<CardId>,
        title: impl Into<String>,
        image_ref: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_ref: image_ref.into(),
            description: description.into(),
        }
    }
}

/// Resolved swipe decision: the sign of the final drag offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Neutral,
    Right,
}

impl Direction {
    pub fn from_offset(offset_px: f64) -> Self {
        if offset_px > 0.0 {
            Direction::Right
        } else if offset_px < 0.0 {
            Direction::Left
        } else {
            Direction::Neutral
        }
    }

    pub fn sign(self) -> i8 {
        match self {
            Direction::Left => -1,
            Direction::Neutral => 0,
            Direction::Right => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Direction::Left => "left",
            Direction::Neutral => "neutral",
            Direction::Right => "right",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_offset_sign() {
        assert_eq!(Direction::from_offset(150.0), Direction::Right);
        assert_eq!(Direction::from_offset(-0.5), Direction::Left);
        assert_eq!(Direction::from_offset(0.0), Direction::Neutral);
        assert_eq!(Direction::from_offset(-0.0), Direction::Neutral);
        assert_eq!(Direction::from_offset(f64::NAN), Direction::Neutral);
        assert_eq!(Direction::Left.sign(), -1);
        assert_eq!(Direction::Right.sign(), 1);
    }

    #[test]
    fn card_accepts_img_alias() {
        let card: Card = toml::from_str(
            r#"
            id = "a1"
            title = "Harbour"
            img = "https://example.invalid/a1.png"
            "#,
        )
        .expect("card");
        assert_eq!(card.id.as_str(), "a1");
        assert_eq!(card.image_ref, "https://example.invalid/a1.png");
        assert!(card.description.is_empty());
    }
}
