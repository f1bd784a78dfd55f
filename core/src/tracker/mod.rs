//! Match state machine.
//!
//! Consumes one [`LogToken`] at a time, in arrival order, and maintains the
//! authoritative state of the match in progress. Two macro-states: `Idle`
//! (between matches) and `InMatch`. Every token yields zero or more
//! [`MatchEvent`]s; nothing here is ever fatal — inconsistent or
//! out-of-sequence tokens are dropped with a diagnostic and the machine
//! keeps running for the lifetime of the game client.

mod entities;


pub use entities::{EntityArena, EntityRecord};

use chrono::{DateTime, Local};
use hashbrown::HashMap;
use tracing::{debug, info, warn};

use hearthwatch_types::{
    CardHistoryItem, CardHistoryList, GameMode, GoingOrder, HeroClass, Outcome, Player,
};

use crate::events::MatchEvent;
use crate::power_log::{CARD_ID_COIN, EntityTag, LogToken, PlayState, hero_class_for_card};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TrackerState {
    #[default]
    Idle,
    InMatch,
}

#[derive(Debug, Default)]
pub struct MatchTracker {
    state: TrackerState,

    // Session state, reset on every match start.
    turn_counter: u32,
    hero_power_used: bool,
    hero_player_id: Option<u8>,
    legend_tracked: bool,
    spectating: bool,
    order_emitted: bool,
    mode_emitted: bool,
    own_class_emitted: bool,
    opponent_class_emitted: bool,
    coin_receiver: Option<u8>,
    playstates: HashMap<u8, PlayState>,
    entities: EntityArena,
    card_history: CardHistoryList,
    started_at: Option<DateTime<Local>>,

    // Sticky state that outlives a session: the menu screens and spectator
    // markers that describe a match arrive before its CREATE_GAME.
    queued_mode: GameMode,
    spectating_sticky: bool,
}

impl MatchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_match(&self) -> bool {
        self.state == TrackerState::InMatch
    }

    /// Displayed turn number. The log's TURN tag counts half-turns; both
    /// players' first turns map to turn 1.
    pub fn current_turn(&self) -> u32 {
        ((self.turn_counter + 1) / 2).max(1)
    }

    pub fn card_history(&self) -> &CardHistoryList {
        &self.card_history
    }

    /// Drop any in-progress session without emitting events. Used when the
    /// line source detects log truncation or rotation.
    pub fn reset(&mut self) {
        if self.in_match() {
            warn!("log stream reset mid-match; discarding session");
        }
        self.state = TrackerState::Idle;
        self.reset_session();
    }

    /// Advance the state machine by one token.
    pub fn handle_token(&mut self, token: &LogToken) -> Vec<MatchEvent> {
        let mut events = Vec::new();

        match token {
            LogToken::GameStart => self.handle_game_start(&mut events),
            LogToken::GameEnd => self.handle_game_end(&mut events),

            LogToken::SpectatorBegin => {
                self.spectating_sticky = true;
                if self.in_match() {
                    self.spectating = true;
                }
            }
            LogToken::SpectatorEnd => {
                self.spectating_sticky = false;
                // The session flag stays set until reset: a match that was
                // ever spectated is not the local user's own result.
            }

            LogToken::GameMode(mode) => {
                self.queued_mode = *mode;
                if self.in_match() && !self.mode_emitted {
                    self.mode_emitted = true;
                    events.push(MatchEvent::GameMode(*mode));
                }
            }
            LogToken::Rank(rank) => {
                // A ranked medal implies the queue was ranked, not casual.
                if matches!(self.queued_mode, GameMode::Unknown | GameMode::Casual) {
                    self.queued_mode = GameMode::Ranked;
                }
                events.push(MatchEvent::Rank(*rank));
            }
            LogToken::Legend(legend) => {
                if !self.legend_tracked {
                    self.legend_tracked = true;
                    events.push(MatchEvent::Legend(*legend));
                }
            }

            LogToken::TurnChange(raw) => {
                if self.in_match() {
                    // Monotonic: a stale repeat never rolls the turn back.
                    self.turn_counter = self.turn_counter.max(*raw);
                    self.hero_power_used = false;
                }
            }

            LogToken::EntityCreate { entity_id, card_id } => {
                if self.in_match() {
                    self.entities.create(*entity_id, card_id.as_deref());
                }
            }
            LogToken::PlayerBind {
                entity_id,
                player_id,
            } => {
                if self.in_match() {
                    self.entities.set_controller(*entity_id, *player_id);
                }
            }
            LogToken::TagChange { entity_id, tag } => {
                if self.in_match() {
                    self.handle_tag_change(*entity_id, tag);
                }
            }
            LogToken::ZoneChange {
                entity_id,
                card_id,
                player_id,
                from,
                to,
            } => {
                if self.in_match() {
                    self.handle_zone_change(*entity_id, card_id, *player_id, from, to, &mut events);
                }
            }
            LogToken::HeroPowerUsed { card_id, player_id } => {
                if self.in_match() && !self.hero_power_used {
                    self.hero_power_used = true;
                    let player = self.resolve_player(*player_id);
                    self.record_card(player, card_id, 0);
                }
            }
        }

        events
    }

    fn handle_game_start(&mut self, events: &mut Vec<MatchEvent>) {
        if self.in_match() {
            // Missed end marker (truncation, client crash): implicit
            // end-then-start. The stale session is discarded without a
            // MatchEnd so no partial history ever reaches subscribers.
            warn!(
                discarded_cards = self.card_history.len(),
                "match start without preceding match end; discarding stale session"
            );
        }
        self.reset_session();
        self.state = TrackerState::InMatch;
        self.started_at = Some(Local::now());

        events.push(MatchEvent::MatchStart);
        if self.queued_mode != GameMode::Unknown {
            self.mode_emitted = true;
            events.push(MatchEvent::GameMode(self.queued_mode));
        }
    }

    fn handle_game_end(&mut self, events: &mut Vec<MatchEvent>) {
        if !self.in_match() {
            debug!("match end marker while idle; ignoring");
            return;
        }

        let outcome = self.compute_outcome();
        let duration_secs = self
            .started_at
            .map(|t| (Local::now() - t).num_seconds())
            .unwrap_or(0);
        info!(
            %outcome,
            duration_secs,
            cards = self.card_history.len(),
            spectating = self.spectating,
            "match ended"
        );

        events.push(MatchEvent::Outcome(outcome));
        events.push(MatchEvent::MatchEnd {
            card_history: std::mem::take(&mut self.card_history),
            was_spectating: self.spectating,
        });

        self.state = TrackerState::Idle;
        self.reset_session();
    }

    fn handle_tag_change(&mut self, entity_id: i64, tag: &EntityTag) {
        match tag {
            EntityTag::Controller(controller) => {
                self.entities.set_controller(entity_id, *controller);
            }
            EntityTag::Zone(zone) => {
                self.entities.set_zone(entity_id, zone);
            }
            EntityTag::PlayState(state) => {
                match self.entities.get(entity_id).and_then(|r| r.controller) {
                    Some(controller) => {
                        self.playstates.insert(controller, *state);
                    }
                    None => debug!(entity_id, "playstate for entity with unknown controller"),
                }
            }
        }
    }

    fn handle_zone_change(
        &mut self,
        entity_id: i64,
        card_id: &str,
        player_id: u8,
        from: &str,
        to: &str,
        events: &mut Vec<MatchEvent>,
    ) {
        self.entities.observe_move(entity_id, card_id, player_id, to);

        // Hero entity entering play resolves a class and, on the friendly
        // side, binds the local player's numeric id.
        if card_id.starts_with("HERO_") && to.ends_with("PLAY (Hero)") {
            let class = hero_class_for_card(card_id);
            if to.contains("FRIENDLY") {
                self.hero_player_id = Some(player_id);
                if !self.own_class_emitted && class != HeroClass::Unknown {
                    self.own_class_emitted = true;
                    events.push(MatchEvent::OwnClass(class));
                }
                self.try_resolve_order(events);
            } else if to.contains("OPPOSING")
                && !self.opponent_class_emitted
                && class != HeroClass::Unknown
            {
                self.opponent_class_emitted = true;
                events.push(MatchEvent::OpponentClass(class));
            }
            return;
        }

        // The coin is dealt to the hand of whoever goes second.
        if card_id == CARD_ID_COIN && to.contains("HAND") && !from.contains("HAND") {
            self.coin_receiver = Some(player_id);
            self.try_resolve_order(events);
            return;
        }

        if card_id.is_empty() {
            return;
        }

        let player = self.resolve_player(player_id);

        // A card entering the play zone proper (not the hero/hero-power
        // slots) was played.
        if to.contains("PLAY") && !to.contains("(Hero") && !from.contains("PLAY") {
            self.record_card(player, card_id, entity_id);
        } else if from.contains("DECK") && to.contains("HAND") {
            // Draws are only revealed for the local player.
            self.record_card(player, card_id, entity_id);
        }
    }

    fn record_card(&mut self, player: Player, card_id: &str, entity_id: i64) {
        debug!(turn = self.current_turn(), %player, card_id, "card recorded");
        self.card_history.push(CardHistoryItem::new(
            self.current_turn(),
            player,
            card_id,
            entity_id,
        ));
    }

    fn try_resolve_order(&mut self, events: &mut Vec<MatchEvent>) {
        if self.order_emitted {
            return;
        }
        let (Some(hero_id), Some(coin_id)) = (self.hero_player_id, self.coin_receiver) else {
            return;
        };
        let order = if coin_id == hero_id {
            GoingOrder::Second
        } else {
            GoingOrder::First
        };
        self.order_emitted = true;
        events.push(MatchEvent::GoingOrder(order));
    }

    fn resolve_player(&self, player_id: u8) -> Player {
        match self.hero_player_id {
            Some(own) if own == player_id => Player::Own,
            Some(_) => Player::Opponent,
            // Attribution is deferred until the friendly hero is seen.
            None => Player::Unknown,
        }
    }

    fn compute_outcome(&self) -> Outcome {
        let Some(hero_id) = self.hero_player_id else {
            return Outcome::Unknown;
        };
        match self.playstates.get(&hero_id) {
            Some(PlayState::Won) => Outcome::Victory,
            Some(PlayState::Lost) => Outcome::Defeat,
            Some(PlayState::Tied) | None => Outcome::Unknown,
        }
    }

    fn reset_session(&mut self) {
        self.turn_counter = 0;
        self.hero_power_used = false;
        self.hero_player_id = None;
        self.legend_tracked = false;
        self.order_emitted = false;
        self.mode_emitted = false;
        self.own_class_emitted = false;
        self.opponent_class_emitted = false;
        self.coin_receiver = None;
        self.playstates.clear();
        self.entities.clear();
        self.card_history.clear();
        self.started_at = None;
        self.spectating = self.spectating_sticky;
    }
}
