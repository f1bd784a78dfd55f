//! Shared match-state types for hearthwatch.
//!
//! These enums form the external contract consumed by overlay and upload
//! components: each carries an `Unknown` sentinel for unresolved state and a
//! stable lowercase name string (via `as_str`/`Display`) used for display
//! and telemetry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the match an entity or card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    #[serde(rename = "self")]
    Own,
    Opponent,
    #[default]
    Unknown,
}

impl Player {
    pub fn as_str(&self) -> &'static str {
        match self {
            Player::Own => "self",
            Player::Opponent => "opponent",
            Player::Unknown => "unknown",
        }
    }
}

/// Who takes the first turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoingOrder {
    First,
    Second,
    #[default]
    Unknown,
}

impl GoingOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoingOrder::First => "first",
            GoingOrder::Second => "second",
            GoingOrder::Unknown => "unknown",
        }
    }
}

/// The queue the match was played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Ranked,
    Casual,
    Solo,
    Arena,
    Friendly,
    TavernBrawl,
    #[default]
    Unknown,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Ranked => "ranked",
            GameMode::Casual => "casual",
            GameMode::Solo => "solo",
            GameMode::Arena => "arena",
            GameMode::Friendly => "friendly",
            GameMode::TavernBrawl => "tavern_brawl",
            GameMode::Unknown => "unknown",
        }
    }
}

/// Terminal result of a match from the local player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Victory,
    Defeat,
    #[default]
    Unknown,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Victory => "victory",
            Outcome::Defeat => "defeat",
            Outcome::Unknown => "unknown",
        }
    }
}

/// The nine playable hero classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeroClass {
    Priest,
    Rogue,
    Mage,
    Paladin,
    Warrior,
    Warlock,
    Hunter,
    Shaman,
    Druid,
    #[default]
    Unknown,
}

impl HeroClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeroClass::Priest => "priest",
            HeroClass::Rogue => "rogue",
            HeroClass::Mage => "mage",
            HeroClass::Paladin => "paladin",
            HeroClass::Warrior => "warrior",
            HeroClass::Warlock => "warlock",
            HeroClass::Hunter => "hunter",
            HeroClass::Shaman => "shaman",
            HeroClass::Druid => "druid",
            HeroClass::Unknown => "unknown",
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),+) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })+
    };
}

impl_display!(Player, GoingOrder, GameMode, Outcome, HeroClass);

/// One card the tracker observed being played or drawn.
///
/// Immutable once appended to a [`CardHistoryList`]. The `entity_id` is the
/// game client's internal id for the card instance; `card_id` is the stable
/// catalog identifier (e.g. `CS2_029`) used by consumers to resolve name,
/// mana cost and art.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardHistoryItem {
    pub turn: u32,
    pub player: Player,
    pub card_id: String,
    pub entity_id: i64,
}

impl CardHistoryItem {
    pub fn new(turn: u32, player: Player, card_id: impl Into<String>, entity_id: i64) -> Self {
        Self {
            turn,
            player,
            card_id: card_id.into(),
            entity_id,
        }
    }
}

/// Chronological, append-only record of cards played/drawn during one match.
pub type CardHistoryList = Vec<CardHistoryItem>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_strings_are_stable() {
        assert_eq!(Player::Own.as_str(), "self");
        assert_eq!(Player::Opponent.to_string(), "opponent");
        assert_eq!(GoingOrder::Second.as_str(), "second");
        assert_eq!(GameMode::TavernBrawl.as_str(), "tavern_brawl");
        assert_eq!(Outcome::Victory.as_str(), "victory");
        assert_eq!(HeroClass::Warlock.as_str(), "warlock");
    }

    #[test]
    fn unknown_is_the_default_sentinel() {
        assert_eq!(Player::default(), Player::Unknown);
        assert_eq!(GoingOrder::default(), GoingOrder::Unknown);
        assert_eq!(GameMode::default(), GameMode::Unknown);
        assert_eq!(Outcome::default(), Outcome::Unknown);
        assert_eq!(HeroClass::default(), HeroClass::Unknown);
    }

    #[test]
    fn history_item_serializes_with_lowercase_player() {
        let item = CardHistoryItem::new(3, Player::Own, "CS2_029", 42);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"player\":\"self\""));
        assert!(json.contains("\"card_id\":\"CS2_029\""));
    }
}
