//! Player identity resolution.
//!
//! Scoresheets name players inconsistently: sometimes with a stable id,
//! sometimes by name only, in varying case.  Lookups go through a two-tier
//! index: the id map first, then a case-insensitive name index.  A name match
//! never joins two players whose ids are both known and differ.

use std::collections::HashMap;

use crate::db::models::{BatsmanStat, BowlerStat, PlayerRef};

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Pairwise form of the index rule, for one-off comparisons.
pub fn same_player(a: &PlayerRef, b: &PlayerRef) -> bool {
    match (a.id.as_deref(), b.id.as_deref()) {
        (Some(x), Some(y)) => x == y,
        _ => name_key(&a.name) == name_key(&b.name),
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlayerIndex {
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
    ids: Vec<Option<String>>,
}

impl PlayerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<'a, I>(players: I) -> Self
    where
        I: IntoIterator<Item = &'a PlayerRef>,
    {
        let mut index = Self::new();
        for player in players {
            index.insert(player);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Slot of the entry this player resolves to, if any.
    pub fn find(&self, player: &PlayerRef) -> Option<usize> {
        if let Some(id) = player.id.as_deref() {
            if let Some(&slot) = self.by_id.get(id) {
                return Some(slot);
            }
        }
        self.by_name
            .get(&name_key(&player.name))?
            .iter()
            .copied()
            .find(|&slot| player.id.is_none() || self.ids[slot].is_none())
    }

    /// Adds a new entry and returns its slot.
    pub fn insert(&mut self, player: &PlayerRef) -> usize {
        let slot = self.ids.len();
        if let Some(id) = &player.id {
            self.by_id.insert(id.clone(), slot);
        }
        self.by_name
            .entry(name_key(&player.name))
            .or_default()
            .push(slot);
        self.ids.push(player.id.clone());
        slot
    }

    /// Promotes a name-only entry into the id map once its id is learned.
    pub fn attach_id(&mut self, slot: usize, id: &str) {
        if let Some(existing) = self.ids.get_mut(slot) {
            if existing.is_none() {
                *existing = Some(id.to_string());
                self.by_id.insert(id.to_string(), slot);
            }
        }
    }
}

/// Stat rows keyed by the player they describe.
pub trait PlayerRow {
    fn player(&self) -> &PlayerRef;
    fn player_mut(&mut self) -> &mut PlayerRef;
}

impl PlayerRow for BatsmanStat {
    fn player(&self) -> &PlayerRef {
        &self.player
    }

    fn player_mut(&mut self) -> &mut PlayerRef {
        &mut self.player
    }
}

impl PlayerRow for BowlerStat {
    fn player(&self) -> &PlayerRef {
        &self.player
    }

    fn player_mut(&mut self) -> &mut PlayerRef {
        &mut self.player
    }
}

/// The stat rows of one innings, addressed through a [`PlayerIndex`].
#[derive(Debug, Clone)]
pub struct RowBook<T> {
    rows: Vec<T>,
    index: PlayerIndex,
}

impl<T: PlayerRow> RowBook<T> {
    pub fn new(rows: Vec<T>) -> Self {
        let index = PlayerIndex::build(rows.iter().map(|r| r.player()));
        RowBook { rows, index }
    }

    pub fn get(&self, player: &PlayerRef) -> Option<&T> {
        self.index.find(player).map(|slot| &self.rows[slot])
    }

    /// The row for `player`, created with `make` on first appearance.  A
    /// name-only row adopts the id the first time one is supplied.
    pub fn entry(&mut self, player: &PlayerRef, make: impl FnOnce() -> T) -> &mut T {
        let slot = match self.index.find(player) {
            Some(slot) => {
                if let Some(id) = player.id.as_deref() {
                    if self.rows[slot].player().id.is_none() {
                        self.index.attach_id(slot, id);
                        self.rows[slot].player_mut().id = Some(id.to_string());
                    }
                }
                slot
            }
            None => {
                let slot = self.index.insert(player);
                self.rows.push(make());
                slot
            }
        };
        &mut self.rows[slot]
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}
