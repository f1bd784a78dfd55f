//! Line-level pattern matching for the game client's debug log.
//!
//! The exact textual grammars are owned by the game client and drift with
//! its versions, so every recognized shape lives in the matcher table below
//! and nowhere else. The parser is a pure function: one line in, at most one
//! [`LogToken`] out, no state, no errors — noise parses to `None`.

use std::sync::LazyLock;

use memchr::memchr;
use regex::Regex;
use tracing::trace;

use hearthwatch_types::GameMode;

use super::{EntityTag, LogToken, PlayState};

macro_rules! matcher {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| {
            // Patterns are literals reviewed at compile time; a failure here
            // is a programming error, not runtime input.
            Regex::new($pattern).unwrap()
        });
    };
}

matcher!(
    RE_ZONE_CHANGE,
    r"ProcessChanges.*\[.* id=(\d+) .*cardId=(\w*) player=(\d+)\] zone from (.*) -> (.+)"
);
matcher!(RE_TURN, r"TAG_CHANGE Entity=GameEntity tag=TURN value=(\d+)");
matcher!(RE_GAME_COMPLETE, r"TAG_CHANGE Entity=GameEntity tag=STATE value=COMPLETE");
matcher!(
    RE_TAG_CHANGE,
    r"TAG_CHANGE Entity=(?:\[.* id=(\d+) .*\]|(\d+)) tag=(\w+) value=(\w+)"
);
matcher!(RE_FULL_ENTITY, r"FULL_ENTITY - Creating ID=(\d+) CardID=(\w*)");
matcher!(RE_SHOW_ENTITY, r"SHOW_ENTITY - Updating Entity=.* id=(\d+) .* CardID=(\w+)");
matcher!(RE_PLAYER_BIND, r"Player EntityID=(\d+) PlayerID=(\d+) GameAccountId");
matcher!(
    RE_HERO_POWER_BLOCK,
    r"BLOCK_START BlockType=POWER Entity=\[.*cardId=(\w+) player=(\d+)\]"
);
matcher!(
    RE_HERO_POWER_ACTION,
    r"ACTION_START Entity=\[.*cardId=(\w+) player=(\d+)\] (?:Block|Sub)Type=POWER"
);
matcher!(RE_SCREEN, r"---RegisterScreen(\w+)---");
matcher!(RE_RANK, r"Medal_Ranked_(\d+)");
matcher!(RE_LEGEND, r"legend rank (\d+)");

/// Parse one complete log line into a token, or `None` for noise.
pub fn parse_line(line: &str) -> Option<LogToken> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() || line.starts_with("(Filename:") {
        return None;
    }

    // Cheap reject before any regex work: every recognized shape carries
    // a '=' or one of the rare literal markers.
    let bytes = line.as_bytes();
    if memchr(b'=', bytes).is_none()
        && !line.contains("CREATE_GAME")
        && !line.contains("---")
        && !line.contains("Spectat")
        && !line.contains("legend rank")
    {
        return None;
    }

    if let Some(caps) = RE_ZONE_CHANGE.captures(line) {
        return Some(LogToken::ZoneChange {
            entity_id: caps[1].parse().ok()?,
            card_id: caps[2].to_string(),
            player_id: caps[3].parse().ok()?,
            from: caps[4].trim().to_string(),
            to: caps[5].trim().to_string(),
        });
    }

    if let Some(caps) = RE_TURN.captures(line) {
        return Some(LogToken::TurnChange(caps[1].parse().ok()?));
    }

    if RE_GAME_COMPLETE.is_match(line) {
        return Some(LogToken::GameEnd);
    }

    if line.contains("CREATE_GAME") {
        return Some(LogToken::GameStart);
    }

    if let Some(caps) = RE_TAG_CHANGE.captures(line) {
        let entity_id: i64 = caps
            .get(1)
            .or_else(|| caps.get(2))?
            .as_str()
            .parse()
            .ok()?;
        let tag = parse_entity_tag(&caps[3], &caps[4])?;
        return Some(LogToken::TagChange { entity_id, tag });
    }

    if let Some(caps) = RE_FULL_ENTITY.captures(line) {
        let card_id = &caps[2];
        return Some(LogToken::EntityCreate {
            entity_id: caps[1].parse().ok()?,
            card_id: (!card_id.is_empty()).then(|| card_id.to_string()),
        });
    }

    if let Some(caps) = RE_SHOW_ENTITY.captures(line) {
        return Some(LogToken::EntityCreate {
            entity_id: caps[1].parse().ok()?,
            card_id: Some(caps[2].to_string()),
        });
    }

    if let Some(caps) = RE_PLAYER_BIND.captures(line) {
        return Some(LogToken::PlayerBind {
            entity_id: caps[1].parse().ok()?,
            player_id: caps[2].parse().ok()?,
        });
    }

    if let Some(caps) = RE_HERO_POWER_BLOCK
        .captures(line)
        .or_else(|| RE_HERO_POWER_ACTION.captures(line))
    {
        return Some(LogToken::HeroPowerUsed {
            card_id: caps[1].to_string(),
            player_id: caps[2].parse().ok()?,
        });
    }

    if let Some(caps) = RE_SCREEN.captures(line) {
        return screen_mode(&caps[1]).map(LogToken::GameMode);
    }

    if let Some(caps) = RE_RANK.captures(line) {
        return Some(LogToken::Rank(caps[1].parse().ok()?));
    }

    if let Some(caps) = RE_LEGEND.captures(line) {
        return Some(LogToken::Legend(caps[1].parse().ok()?));
    }

    if line.contains("Begin Spectating") || line.contains("Start Spectator Game") {
        return Some(LogToken::SpectatorBegin);
    }
    if line.contains("End Spectator Mode") {
        return Some(LogToken::SpectatorEnd);
    }

    trace!(line, "unrecognized log line");
    None
}

fn parse_entity_tag(tag: &str, value: &str) -> Option<EntityTag> {
    match tag {
        "CONTROLLER" => Some(EntityTag::Controller(value.parse().ok()?)),
        "ZONE" => Some(EntityTag::Zone(value.to_string())),
        "PLAYSTATE" => match value {
            "WON" => Some(EntityTag::PlayState(PlayState::Won)),
            "LOST" => Some(EntityTag::PlayState(PlayState::Lost)),
            "TIED" => Some(EntityTag::PlayState(PlayState::Tied)),
            _ => None,
        },
        _ => None,
    }
}

fn screen_mode(screen: &str) -> Option<GameMode> {
    match screen {
        "Practice" => Some(GameMode::Solo),
        "Tourneys" => Some(GameMode::Casual),
        "Forge" => Some(GameMode::Arena),
        "Friendly" => Some(GameMode::Friendly),
        "TavernBrawl" => Some(GameMode::TavernBrawl),
        _ => None,
    }
}
