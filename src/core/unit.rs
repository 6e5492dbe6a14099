//! Unit instances and stat rules

use crate::core::{PlayerId, Position, UnitId, UnitTypeId};
use serde::{Deserialize, Serialize};

/// Which stat a permanent modification applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatKind {
    Attack,
    Health,
    Both,
}

/// A unit on the board
///
/// Many units can share the same type definition; this struct is the live
/// instance during a match. Mutable state is owned exclusively by the board -
/// no other component keeps a divergent copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Unique ID for this unit instance
    pub id: UnitId,

    /// Stable type id, the key into the ability registry
    pub type_id: UnitTypeId,

    /// Display name (e.g. "Footman")
    pub name: String,

    pub attack: i32,

    pub health: i32,

    pub max_health: i32,

    /// Cells of movement per action (Manhattan)
    pub move_range: i32,

    /// Cells of attack reach (Manhattan)
    pub attack_range: i32,

    /// Owning player (0 or 1)
    pub owner: PlayerId,

    pub position: Position,

    /// A face-down unit cannot move, attack, or be targeted by triggered
    /// abilities requiring visibility; it is revealed when attacked.
    pub face_down: bool,

    /// Set exactly once per turn-cycle, reset only by phase-start logic
    pub has_acted: bool,
}

impl Unit {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: UnitId,
        type_id: UnitTypeId,
        name: String,
        attack: i32,
        max_health: i32,
        move_range: i32,
        attack_range: i32,
        owner: PlayerId,
        position: Position,
    ) -> Self {
        Unit {
            id,
            type_id,
            name,
            attack,
            health: max_health,
            max_health,
            move_range,
            attack_range,
            owner,
            position,
            face_down: false,
            has_acted: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn is_enemy_of(&self, other: PlayerId) -> bool {
        self.owner != other
    }

    /// Apply damage, clamping health at 0. Returns the raw amount dealt.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        self.health = (self.health - amount).max(0);
        amount
    }

    /// Apply damage but never drop below 1 health
    ///
    /// Used for the reveal-attack rule: a unit flipped face-up by the attack
    /// that revealed it survives that attack with at least 1 health.
    pub fn apply_damage_floored(&mut self, amount: i32) -> i32 {
        self.health = (self.health - amount).max(1);
        amount
    }

    /// Heal up to max health. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health).max(0);
        self.health - before
    }

    /// Permanently adjust a stat
    ///
    /// Health modifications move both current and maximum health; current
    /// health stays within [0, max_health].
    pub fn modify_stat(&mut self, stat: StatKind, amount: i32) {
        match stat {
            StatKind::Attack => self.attack = (self.attack + amount).max(0),
            StatKind::Health => self.adjust_health(amount),
            StatKind::Both => {
                self.attack = (self.attack + amount).max(0);
                self.adjust_health(amount);
            }
        }
    }

    fn adjust_health(&mut self, amount: i32) {
        self.max_health = (self.max_health + amount).max(0);
        self.health = (self.health + amount).clamp(0, self.max_health);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_unit() -> Unit {
        Unit::new(
            UnitId::new(1),
            UnitTypeId::new("footman"),
            "Footman".to_string(),
            3,
            5,
            2,
            1,
            PlayerId::PLAYER,
            Position::new(0, 0),
        )
    }

    #[test]
    fn test_unit_creation() {
        let unit = test_unit();
        assert_eq!(unit.health, 5);
        assert_eq!(unit.max_health, 5);
        assert!(unit.is_alive());
        assert!(!unit.face_down);
        assert!(!unit.has_acted);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut unit = test_unit();
        let dealt = unit.apply_damage(8);
        assert_eq!(dealt, 8);
        assert_eq!(unit.health, 0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn test_damage_floored_keeps_one_health() {
        let mut unit = test_unit();
        unit.apply_damage_floored(20);
        assert_eq!(unit.health, 1);
        assert!(unit.is_alive());
    }

    #[test]
    fn test_heal_clamps_at_max() {
        let mut unit = test_unit();
        unit.apply_damage(3);
        assert_eq!(unit.heal(10), 3);
        assert_eq!(unit.health, 5);
    }

    #[test]
    fn test_modify_stat() {
        let mut unit = test_unit();
        unit.modify_stat(StatKind::Attack, 2);
        assert_eq!(unit.attack, 5);

        unit.modify_stat(StatKind::Health, 3);
        assert_eq!(unit.max_health, 8);
        assert_eq!(unit.health, 8);

        unit.modify_stat(StatKind::Both, -1);
        assert_eq!(unit.attack, 4);
        assert_eq!(unit.max_health, 7);
        assert_eq!(unit.health, 7);
    }
}
