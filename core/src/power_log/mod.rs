//! Typed facts extracted from raw game log lines.
//!
//! One raw line maps to zero or one [`LogToken`]. The log contains far more
//! noise than signal; anything unrecognized is simply dropped by the parser.

mod parser;

pub use parser::parse_line;

use hearthwatch_types::{GameMode, HeroClass};

/// Catalog id of The Coin, dealt to the player going second.
pub const CARD_ID_COIN: &str = "GAME_005";

/// Terminal play state announced on a player entity when the game resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Won,
    Lost,
    Tied,
}

/// A per-entity attribute update carried by a tag-change line.
///
/// Only the tags the tracker consumes are kept; all other tag changes parse
/// to `None` at the line level.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityTag {
    Controller(u8),
    Zone(String),
    PlayState(PlayState),
}

/// A structured fact extracted from one log line.
#[derive(Debug, Clone, PartialEq)]
pub enum LogToken {
    /// A new game was created; marks the start of a match.
    GameStart,
    /// The game entity reached its terminal state; marks the end of a match.
    GameEnd,
    /// The raw half-turn counter advanced (increments once per player turn).
    TurnChange(u32),
    /// A card instance moved between zones. `card_id` is empty when the
    /// client hides the card (e.g. opponent draws).
    ZoneChange {
        entity_id: i64,
        card_id: String,
        player_id: u8,
        from: String,
        to: String,
    },
    /// A new entity came into existence, optionally with a known card id.
    EntityCreate {
        entity_id: i64,
        card_id: Option<String>,
    },
    /// An attribute changed on an existing entity.
    TagChange { entity_id: i64, tag: EntityTag },
    /// A numeric player id was bound to its player entity.
    PlayerBind { entity_id: i64, player_id: u8 },
    /// A hero power activation block started.
    HeroPowerUsed { card_id: String, player_id: u8 },
    /// A menu screen announced the queued game mode.
    GameMode(GameMode),
    /// The ranked medal for the current ladder position was shown.
    Rank(u32),
    /// The legend ladder position was shown.
    Legend(u32),
    SpectatorBegin,
    SpectatorEnd,
}

/// Map a hero card id to its class.
///
/// Skins share the base hero's numeric prefix (`HERO_08a` is still a mage),
/// so only the first seven characters are significant.
pub fn hero_class_for_card(card_id: &str) -> HeroClass {
    if !card_id.starts_with("HERO_") {
        return HeroClass::Unknown;
    }
    // get() rather than indexing: corrupt lines can put a multi-byte
    // character across the prefix boundary.
    let Some(prefix) = card_id.get(..7) else {
        return HeroClass::Unknown;
    };
    match prefix {
        "HERO_01" => HeroClass::Warrior,
        "HERO_02" => HeroClass::Shaman,
        "HERO_03" => HeroClass::Rogue,
        "HERO_04" => HeroClass::Paladin,
        "HERO_05" => HeroClass::Hunter,
        "HERO_06" => HeroClass::Druid,
        "HERO_07" => HeroClass::Warlock,
        "HERO_08" => HeroClass::Mage,
        "HERO_09" => HeroClass::Priest,
        _ => HeroClass::Unknown,
    }
}
