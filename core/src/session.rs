//! Wiring between the parser, the tracker and event consumers.

use tokio::sync::broadcast;
use tracing::debug;

use crate::events::{EventSink, MatchEvent};
use crate::power_log::parse_line;
use crate::tracker::MatchTracker;

const BROADCAST_CAPACITY: usize = 256;

/// Owns one tracker plus its subscribers, and drives lines through the
/// parse → track → dispatch pipeline.
///
/// Must only ever be driven from one logical task: the tracker is not
/// thread-safe by design. Subscribers receive events two ways:
/// registered [`EventSink`]s are invoked synchronously in order, and the
/// broadcast channel fans out to async consumers without ever blocking the
/// consumption loop (a slow subscriber lags and drops, it does not stall
/// ingestion).
pub struct TrackerSession {
    tracker: MatchTracker,
    sinks: Vec<Box<dyn EventSink + Send>>,
    broadcast: broadcast::Sender<MatchEvent>,
}

impl Default for TrackerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerSession {
    pub fn new() -> Self {
        let (broadcast, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tracker: MatchTracker::new(),
            sinks: Vec::new(),
            broadcast,
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink + Send>) {
        self.sinks.push(sink);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.broadcast.subscribe()
    }

    pub fn tracker(&self) -> &MatchTracker {
        &self.tracker
    }

    /// Parse one complete line and dispatch whatever events it produced.
    pub fn process_line(&mut self, line: &str) {
        if let Some(token) = parse_line(line) {
            let events = self.tracker.handle_token(&token);
            self.dispatch(events);
        }
    }

    pub fn process_lines<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            self.process_line(line);
        }
    }

    /// Replay already-parsed tokens (e.g. from a bulk read of an existing
    /// file) through the tracker, preserving order.
    pub fn process_tokens<'a>(&mut self, tokens: impl IntoIterator<Item = &'a crate::LogToken>) {
        for token in tokens {
            let events = self.tracker.handle_token(token);
            self.dispatch(events);
        }
    }

    /// Discard any in-progress session. Called when the line source detects
    /// log truncation or rotation.
    pub fn reset(&mut self) {
        self.tracker.reset();
    }

    fn dispatch(&mut self, events: Vec<MatchEvent>) {
        if events.is_empty() {
            return;
        }
        for sink in &mut self.sinks {
            sink.handle_events(&events);
        }
        for event in events {
            debug!(?event, "emitting match event");
            // No receivers is fine; fire-and-forget.
            let _ = self.broadcast.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingSink;

    #[test]
    fn lines_flow_through_to_sinks() {
        let mut session = TrackerSession::new();
        session.add_sink(Box::new(CollectingSink::default()));
        let mut rx = session.subscribe();

        session.process_lines([
            "GameState.DebugPrintPower() - CREATE_GAME",
            "[Graphics] some noise line",
            "GameState.DebugPrintPower() - TAG_CHANGE Entity=GameEntity tag=STATE value=COMPLETE",
        ]);

        assert_eq!(rx.try_recv(), Ok(MatchEvent::MatchStart));
        assert!(matches!(rx.try_recv(), Ok(MatchEvent::Outcome(_))));
        assert!(matches!(rx.try_recv(), Ok(MatchEvent::MatchEnd { .. })));
    }

    #[test]
    fn raw_log_replay_produces_a_full_match() {
        use hearthwatch_types::{GameMode, GoingOrder, HeroClass, Outcome, Player};

        let mut session = TrackerSession::new();
        let mut rx = session.subscribe();
        session.process_lines([
            "[Bob] ---RegisterScreenTourneys---",
            "GameState.DebugPrintPower() - CREATE_GAME",
            "GameState.DebugPrintPower() - Player EntityID=2 PlayerID=1 GameAccountId=[hi=1 lo=2]",
            "ZoneChangeList.ProcessChanges() - id=1 local=False [name=Jaina Proudmoore id=64 \
             zone=PLAY zonePos=0 cardId=HERO_08 player=1] zone from  -> FRIENDLY PLAY (Hero)",
            "ZoneChangeList.ProcessChanges() - id=1 local=False [name=Garrosh Hellscream id=66 \
             zone=PLAY zonePos=0 cardId=HERO_01 player=2] zone from  -> OPPOSING PLAY (Hero)",
            "ZoneChangeList.ProcessChanges() - id=2 local=True [name=The Coin id=68 zone=HAND \
             zonePos=5 cardId=GAME_005 player=2] zone from  -> OPPOSING HAND",
            "GameState.DebugPrintPower() - TAG_CHANGE Entity=GameEntity tag=TURN value=1",
            "(Filename: C:/BuildAgent/work/helloworld.cpp Line: 27)",
            "ZoneChangeList.ProcessChanges() - id=3 local=False [name=Arcane Missiles id=34 \
             zone=PLAY zonePos=0 cardId=EX1_277 player=1] zone from FRIENDLY HAND -> FRIENDLY PLAY",
            "PowerTaskList.DebugPrintPower() - TAG_CHANGE Entity=[name=Jaina Proudmoore id=64 \
             zone=PLAY zonePos=0 cardId=HERO_08 player=1] tag=PLAYSTATE value=WON",
            "GameState.DebugPrintPower() - TAG_CHANGE Entity=GameEntity tag=STATE value=COMPLETE",
        ]);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert_eq!(events[0], MatchEvent::MatchStart);
        assert_eq!(events[1], MatchEvent::GameMode(GameMode::Casual));
        assert!(events.contains(&MatchEvent::OwnClass(HeroClass::Mage)));
        assert!(events.contains(&MatchEvent::OpponentClass(HeroClass::Warrior)));
        assert!(events.contains(&MatchEvent::GoingOrder(GoingOrder::First)));
        assert!(events.contains(&MatchEvent::Outcome(Outcome::Victory)));
        let Some(MatchEvent::MatchEnd { card_history, .. }) = events.last() else {
            panic!("expected MatchEnd, got {:?}", events.last());
        };
        assert_eq!(card_history.len(), 1);
        assert_eq!(card_history[0].turn, 1);
        assert_eq!(card_history[0].player, Player::Own);
        assert_eq!(card_history[0].card_id, "EX1_277");
    }

    #[test]
    fn unparseable_lines_are_inert() {
        let mut session = TrackerSession::new();
        let mut rx = session.subscribe();
        session.process_line("ZoneChangeList.ProcessChang"); // truncated
        session.process_line("");
        assert!(rx.try_recv().is_err());
        assert!(!session.tracker().in_match());
    }
}
