//! Cooldown ledger: per-unit, per-ability turn counters
//!
//! Entries gate ability re-use. They are decremented on the owning player's
//! turn start and reset to the configured cooldown right after execution.
//! Nothing persists beyond the current match; a removed unit takes its
//! entries with it.

use crate::board::BoardState;
use crate::core::{AbilityId, PlayerId, UnitId};
use crate::rules::ability::AbilityDefinition;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct CooldownLedger {
    entries: FxHashMap<UnitId, FxHashMap<AbilityId, u32>>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, unit: UnitId, ability: &AbilityId, turns: u32) {
        self.entries
            .entry(unit)
            .or_default()
            .insert(ability.clone(), turns);
    }

    /// Remaining turns; unknown entries read as 0 (ready)
    pub fn get(&self, unit: UnitId, ability: &AbilityId) -> u32 {
        self.entries
            .get(&unit)
            .and_then(|m| m.get(ability))
            .copied()
            .unwrap_or(0)
    }

    /// Decrement one entry, flooring at 0
    pub fn reduce(&mut self, unit: UnitId, ability: &AbilityId) {
        if let Some(counter) = self.entries.get_mut(&unit).and_then(|m| m.get_mut(ability)) {
            *counter = counter.saturating_sub(1);
        }
    }

    /// Decrement every running counter on units owned by `owner`
    pub fn reduce_all_for_owner(&mut self, owner: PlayerId, board: &BoardState) {
        for (unit_id, counters) in self.entries.iter_mut() {
            let owned = board.unit(*unit_id).map(|u| u.owner == owner).unwrap_or(false);
            if !owned {
                continue;
            }
            for counter in counters.values_mut() {
                *counter = counter.saturating_sub(1);
            }
        }
    }

    /// Reset an entry to the ability's configured cooldown
    pub fn reset_to_default(&mut self, unit: UnitId, ability: &AbilityDefinition) {
        self.set(unit, &ability.name, ability.cooldown);
    }

    /// Drop all entries for a removed unit
    pub fn forget_unit(&mut self, unit: UnitId) {
        self.entries.remove(&unit);
    }
}
