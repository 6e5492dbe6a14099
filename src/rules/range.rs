//! Range resolution: which cells an ability or native action may target
//!
//! A full-board scan per call; fine at chessboard scale, no incremental
//! indexing. Scan order is the board's row-major order so results are
//! deterministic.

use crate::board::BoardState;
use crate::core::{Position, Unit};
use crate::rules::ability::{AbilityDefinition, RangePolicy};
use crate::rules::condition::EvalContext;
use crate::rules::cooldown::CooldownLedger;

/// True when `striker` could land a hit on `pos`, ignoring whether it has
/// already acted this turn
///
/// This is the reach check used for counter-attacks: a unit that already
/// acted still retaliates. Face-down units never strike.
pub fn can_strike(board: &BoardState, striker: &Unit, pos: Position) -> bool {
    if striker.face_down || pos == striker.position {
        return false;
    }
    if striker.position.manhattan(pos) > striker.attack_range {
        return false;
    }
    board
        .unit_at(pos)
        .is_some_and(|u| u.is_enemy_of(striker.owner) || u.face_down)
}

pub struct RangeResolver<'a> {
    pub board: &'a BoardState,
    pub ledger: &'a CooldownLedger,
}

impl<'a> RangeResolver<'a> {
    pub fn new(board: &'a BoardState, ledger: &'a CooldownLedger) -> Self {
        RangeResolver { board, ledger }
    }

    /// Native move legality: within move range, destination empty, unit
    /// face-up and not yet acted
    pub fn can_move_to(&self, unit: &Unit, pos: Position) -> bool {
        !unit.face_down
            && !unit.has_acted
            && unit.position.manhattan(pos) <= unit.move_range
            && self.board.is_empty(pos)
    }

    /// Native attack legality: reach plus the not-yet-acted requirement
    pub fn can_attack(&self, unit: &Unit, pos: Position) -> bool {
        !unit.has_acted && can_strike(self.board, unit, pos)
    }

    /// All positions the ability may target from `source`, in scan order
    ///
    /// Every policy excludes the source's own cell.
    pub fn resolve(&self, ability: &AbilityDefinition, source: &Unit) -> Vec<Position> {
        let mut out = Vec::new();
        for pos in self.board.positions() {
            if pos == source.position {
                continue;
            }
            let ok = match ability.range_policy {
                RangePolicy::Default => ability
                    .trigger_condition
                    .evaluate(&self.ctx(source, pos)),
                RangePolicy::AttackRangeBased => {
                    self.can_attack(source, pos) && self.aux_ok(ability, source, pos)
                }
                RangePolicy::MoveRangeBased => {
                    self.can_move_to(source, pos) && self.aux_ok(ability, source, pos)
                }
                RangePolicy::Custom(n) => {
                    source.position.manhattan(pos) <= n && self.aux_ok(ability, source, pos)
                }
                RangePolicy::Unlimited => self.aux_ok(ability, source, pos),
            };
            if ok {
                out.push(pos);
            }
        }
        out
    }

    fn aux_ok(&self, ability: &AbilityDefinition, source: &Unit, pos: Position) -> bool {
        ability
            .range_condition
            .as_ref()
            .map(|cond| cond.evaluate(&self.ctx(source, pos)))
            .unwrap_or(true)
    }

    fn ctx<'b>(&'b self, source: &'b Unit, target: Position) -> EvalContext<'b> {
        EvalContext {
            board: self.board,
            ledger: self.ledger,
            source,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlayerId, UnitTypeId};

    fn setup() -> (BoardState, CooldownLedger) {
        let mut board = BoardState::new(4, 6);
        board
            .spawn(
                UnitTypeId::new("knight"),
                "Knight".to_string(),
                3,
                5,
                2,
                1,
                PlayerId::PLAYER,
                Position::new(1, 1),
            )
            .unwrap();
        board
            .spawn(
                UnitTypeId::new("goblin"),
                "Goblin".to_string(),
                1,
                2,
                1,
                1,
                PlayerId::ENEMY,
                Position::new(1, 2),
            )
            .unwrap();
        (board, CooldownLedger::new())
    }

    #[test]
    fn test_default_policy_scans_by_condition() {
        let (board, ledger) = setup();
        let resolver = RangeResolver::new(&board, &ledger);
        let source = board.unit_at(Position::new(1, 1)).unwrap();
        let ability =
            AbilityDefinition::new("Strike").with_condition("Distance==1 && Enemy");

        let targets = resolver.resolve(&ability, source);
        assert_eq!(targets, vec![Position::new(1, 2)]);
    }

    /// Round-trip invariant: a position resolves under AttackRangeBased iff
    /// the native attack legality accepts it.
    #[test]
    fn test_attack_range_round_trip() {
        let (board, ledger) = setup();
        let resolver = RangeResolver::new(&board, &ledger);
        let source = board.unit_at(Position::new(1, 1)).unwrap();
        let ability = AbilityDefinition::new("Smite").with_range(RangePolicy::AttackRangeBased);

        let resolved = resolver.resolve(&ability, source);
        for pos in board.positions() {
            if pos == source.position {
                continue;
            }
            assert_eq!(
                resolved.contains(&pos),
                resolver.can_attack(source, pos),
                "divergence at {pos}"
            );
        }
    }

    #[test]
    fn test_move_range_excludes_occupied() {
        let (board, ledger) = setup();
        let resolver = RangeResolver::new(&board, &ledger);
        let source = board.unit_at(Position::new(1, 1)).unwrap();
        let ability = AbilityDefinition::new("Dash").with_range(RangePolicy::MoveRangeBased);

        let targets = resolver.resolve(&ability, source);
        assert!(targets.contains(&Position::new(1, 0)));
        assert!(targets.contains(&Position::new(3, 1)));
        // occupied by the goblin
        assert!(!targets.contains(&Position::new(1, 2)));
        // beyond move range 2
        assert!(!targets.contains(&Position::new(3, 3)));
    }

    #[test]
    fn test_custom_and_unlimited_policies() {
        let (board, ledger) = setup();
        let resolver = RangeResolver::new(&board, &ledger);
        let source = board.unit_at(Position::new(1, 1)).unwrap();

        let custom = AbilityDefinition::new("Burst").with_range(RangePolicy::Custom(1));
        let targets = resolver.resolve(&custom, source);
        assert_eq!(targets.len(), 4);

        let unlimited = AbilityDefinition::new("Nova")
            .with_range(RangePolicy::Unlimited)
            .with_range_condition("Enemy");
        let targets = resolver.resolve(&unlimited, source);
        assert_eq!(targets, vec![Position::new(1, 2)]);
    }

    #[test]
    fn test_acted_unit_has_no_native_targets() {
        let (mut board, ledger) = setup();
        let id = board.unit_id_at(Position::new(1, 1)).unwrap();
        board.unit_mut(id).unwrap().has_acted = true;
        let resolver = RangeResolver::new(&board, &ledger);
        let source = board.unit_at(Position::new(1, 1)).unwrap();

        assert!(!resolver.can_attack(source, Position::new(1, 2)));
        assert!(!resolver.can_move_to(source, Position::new(1, 0)));
        // reach check ignores has_acted: counters still work
        assert!(can_strike(&board, source, Position::new(1, 2)));
    }

    #[test]
    fn test_source_position_always_excluded() {
        let (board, ledger) = setup();
        let resolver = RangeResolver::new(&board, &ledger);
        let source = board.unit_at(Position::new(1, 1)).unwrap();
        let ability = AbilityDefinition::new("Wide").with_range(RangePolicy::Unlimited);
        assert!(!resolver.resolve(&ability, source).contains(&source.position));
    }
}
