use serde::{Deserialize, Serialize};

use hearthwatch_types::{CardHistoryList, GameMode, GoingOrder, HeroClass, Outcome};

/// Match-lifecycle events emitted by the tracker as derived facts become
/// known. These are the only output of the core: overlay and upload
/// consumers subscribe to this stream and never touch tracker state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum MatchEvent {
    /// A new match began; all prior session state has been reset.
    MatchStart,
    /// The match resolved. Carries the frozen card history and whether the
    /// local client was spectating rather than playing.
    MatchEnd {
        card_history: CardHistoryList,
        was_spectating: bool,
    },
    Outcome(Outcome),
    GoingOrder(GoingOrder),
    GameMode(GameMode),
    OwnClass(HeroClass),
    OpponentClass(HeroClass),
    /// Ranked ladder position. May repeat: the client re-announces rank.
    Rank(u32),
    /// Legend ladder position. At most once per match.
    Legend(u32),
}
