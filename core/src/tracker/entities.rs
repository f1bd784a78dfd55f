//! Working set of game entities for the current match.
//!
//! The log refers to every game object (card, hero, player) by an internal
//! numeric id, and freely references ids before announcing them. The arena
//! is a plain id-to-record map: lookups return an explicit `None` for
//! unknown ids, nothing is deleted mid-match, and the whole table is
//! discarded on session reset.

use hashbrown::HashMap;

/// Last-known attributes of one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRecord {
    pub card_id: Option<String>,
    pub controller: Option<u8>,
    pub zone: Option<String>,
}

#[derive(Debug, Default)]
pub struct EntityArena {
    entities: HashMap<i64, EntityRecord>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity_id: i64) -> Option<&EntityRecord> {
        self.entities.get(&entity_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Record an entity creation. Duplicate creations for the same id are
    /// tolerated: attributes are overwritten last-write-wins, except that a
    /// known card id is never cleared by a later empty one.
    pub fn create(&mut self, entity_id: i64, card_id: Option<&str>) {
        let record = self.entities.entry(entity_id).or_default();
        if let Some(id) = card_id
            && !id.is_empty()
        {
            record.card_id = Some(id.to_string());
        }
    }

    pub fn set_controller(&mut self, entity_id: i64, controller: u8) {
        self.entities.entry(entity_id).or_default().controller = Some(controller);
    }

    pub fn set_zone(&mut self, entity_id: i64, zone: &str) {
        self.entities.entry(entity_id).or_default().zone = Some(zone.to_string());
    }

    /// Fold a zone-change observation into the record. Zone changes carry
    /// the freshest controller and (when revealed) card id.
    pub fn observe_move(&mut self, entity_id: i64, card_id: &str, controller: u8, zone: &str) {
        let record = self.entities.entry(entity_id).or_default();
        if !card_id.is_empty() {
            record.card_id = Some(card_id.to_string());
        }
        record.controller = Some(controller);
        record.zone = Some(zone.to_string());
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
