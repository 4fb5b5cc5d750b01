//! Initiative rolling and the turn order it produces.

use std::cmp::Ordering;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sk_core::{Ability, CombatantId};

use crate::combatant::Combatant;
use crate::dice::roll_d20;

/// One combatant's place in the turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeEntry {
    /// The combatant.
    pub id: CombatantId,
    /// d20 + Dexterity modifier.
    pub total: i32,
    /// Dexterity modifier, the first tiebreaker.
    pub dex_modifier: i32,
    /// Random value, the second tiebreaker.
    pub tiebreak: u32,
}

impl InitiativeEntry {
    /// Build an entry from a known natural roll and tiebreak value.
    pub fn from_roll(combatant: &Combatant, natural: u32, tiebreak: u32) -> Self {
        let dex_modifier = combatant.modifier(Ability::Dexterity);
        Self {
            id: combatant.id.clone(),
            total: natural as i32 + dex_modifier,
            dex_modifier,
            tiebreak,
        }
    }

    /// Turn-order comparison: `Less` means `self` acts first.
    pub fn order(&self, other: &Self) -> Ordering {
        other
            .total
            .cmp(&self.total)
            .then_with(|| other.dex_modifier.cmp(&self.dex_modifier))
            .then_with(|| other.tiebreak.cmp(&self.tiebreak))
    }
}

/// The ordered list of combatants for a fight plus the current turn index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnOrder {
    entries: Vec<InitiativeEntry>,
    index: usize,
}

impl TurnOrder {
    /// Sort entries into a turn order starting at index 0.
    pub fn from_entries(mut entries: Vec<InitiativeEntry>) -> Self {
        entries.sort_by(InitiativeEntry::order);
        Self { entries, index: 0 }
    }

    /// The entries in acting order.
    pub fn entries(&self) -> &[InitiativeEntry] {
        &self.entries
    }

    /// Combatant ids in acting order.
    pub fn ids(&self) -> Vec<CombatantId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nobody is in the order.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The current turn index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The combatant whose turn it is, if the index is in bounds.
    pub fn current(&self) -> Option<&CombatantId> {
        self.entries.get(self.index).map(|e| &e.id)
    }

    /// Returns true if the combatant is in the order.
    pub fn contains(&self, id: &CombatantId) -> bool {
        self.entries.iter().any(|e| &e.id == id)
    }

    /// Move to the next entry. Returns true if the order wrapped back to 0.
    pub fn advance(&mut self) -> bool {
        if self.entries.is_empty() {
            self.index = 0;
            return true;
        }
        self.index = (self.index + 1) % self.entries.len();
        self.index == 0
    }

    /// Keep only matching entries. The index keeps addressing the same
    /// combatant, or the one after it if that combatant was removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&InitiativeEntry) -> bool) {
        let mut removed_before = 0;
        let mut position = 0;
        let index = self.index;
        self.entries.retain(|entry| {
            let kept = keep(entry);
            if !kept && position < index {
                removed_before += 1;
            }
            position += 1;
            kept
        });
        self.index -= removed_before;
        if self.index >= self.entries.len() {
            self.index = 0;
        }
    }

    /// Insert an entry at its sorted position, after any entries it ties
    /// with. The current combatant keeps the turn. Returns the position.
    pub fn insert(&mut self, entry: InitiativeEntry) -> usize {
        let position = self
            .entries
            .iter()
            .position(|existing| existing.order(&entry) == Ordering::Greater)
            .unwrap_or(self.entries.len());
        let was_empty = self.entries.is_empty();
        self.entries.insert(position, entry);
        if !was_empty && position <= self.index {
            self.index += 1;
        }
        position
    }
}

/// Rolls initiative and maintains turn order.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitiativeScheduler;

impl InitiativeScheduler {
    /// Roll d20 + DEX for one combatant and record the total on it.
    pub fn roll(combatant: &mut Combatant, rng: &mut StdRng) -> InitiativeEntry {
        let natural = roll_d20(rng);
        let tiebreak = rng.random::<u32>();
        let entry = InitiativeEntry::from_roll(combatant, natural, tiebreak);
        combatant.initiative = entry.total;
        debug!(
            combatant = %combatant.id,
            natural,
            total = entry.total,
            "initiative rolled"
        );
        entry
    }

    /// Roll for every combatant and sort them into a turn order.
    pub fn roll_initiative<'a>(
        combatants: impl IntoIterator<Item = &'a mut Combatant>,
        rng: &mut StdRng,
    ) -> TurnOrder {
        let entries = combatants
            .into_iter()
            .map(|c| Self::roll(c, rng))
            .collect();
        TurnOrder::from_entries(entries)
    }

    /// Roll once for a late arrival and insert it into an existing order.
    pub fn insert_combatant(
        order: &mut TurnOrder,
        combatant: &mut Combatant,
        rng: &mut StdRng,
    ) -> usize {
        let entry = Self::roll(combatant, rng);
        order.insert(entry)
    }
}
