//! Ability registry: unit-type id to ability definitions
//!
//! Built once at startup by the content loader and read-only afterwards.
//! The core never mutates this table during a match.

use crate::core::{AbilityId, UnitTypeId};
use crate::rules::ability::AbilityDefinition;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct AbilityRegistry {
    abilities: FxHashMap<UnitTypeId, Vec<AbilityDefinition>>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_id: UnitTypeId, ability: AbilityDefinition) {
        self.abilities.entry(type_id).or_default().push(ability);
    }

    /// Abilities for a unit type, in registration order
    pub fn for_type(&self, type_id: &UnitTypeId) -> &[AbilityDefinition] {
        self.abilities
            .get(type_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn find(&self, type_id: &UnitTypeId, name: &AbilityId) -> Option<&AbilityDefinition> {
        self.for_type(type_id).iter().find(|a| &a.name == name)
    }

    pub fn type_count(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}
