//! End-to-end rule scenarios
//!
//! Exercises the executor and ledger through the public API on small boards:
//! face-up kills, face-down reveals (the friendly and floored variants),
//! sequence completeness, and cooldown ticking across phases.

use grid_skirmish::core::{PlayerId, Position, UnitId, UnitTypeId};
use grid_skirmish::game::{GameEvent, MatchState, TurnEngine};
use grid_skirmish::rules::{
    AbilityDefinition, AbilityRegistry, ActionKind, HealAmount, RangePolicy, TargetSelector,
};

fn spawn(
    state: &mut MatchState,
    type_id: &str,
    attack: i32,
    health: i32,
    owner: PlayerId,
    pos: Position,
) -> UnitId {
    state
        .board
        .spawn(
            UnitTypeId::new(type_id),
            type_id.to_string(),
            attack,
            health,
            2,
            1,
            owner,
            pos,
        )
        .unwrap()
}

fn attack_ability() -> AbilityDefinition {
    AbilityDefinition::new("Strike")
        .with_condition("Distance==1 && Enemy")
        .with_step(ActionKind::Attack, TargetSelector::Target)
}

/// Scenario: 4x6 board, X at (1,1) owner 0 with attack 3 health 5, Y at
/// (1,2) owner 1 with health 2 face-up. Executing the attack ability kills Y
/// and consumes X's action.
#[tokio::test]
async fn face_up_attack_kills_and_consumes_action() {
    let mut state = MatchState::new(4, 6);
    let x = spawn(&mut state, "knight", 3, 5, PlayerId::PLAYER, Position::new(1, 1));
    let y = spawn(&mut state, "goblin", 0, 2, PlayerId::ENEMY, Position::new(1, 2));

    let ability = attack_ability();
    assert!(state.executor().can_execute(&ability, x, Position::new(1, 2)));
    let report = state
        .executor()
        .execute(&ability, x, Position::new(1, 2), false)
        .await;

    assert!(report.completed);
    assert!(!state.board.contains(y));
    assert!(state.board.unit(x).unwrap().has_acted);
    assert!(state
        .bus
        .events()
        .contains(&GameEvent::UnitRemoved { pos: Position::new(1, 2) }));
}

/// Same setup but Y is a face-down friendly: the attack flips it face-up,
/// emits the flip, and deals no damage.
#[tokio::test]
async fn face_down_friendly_is_revealed_unharmed() {
    let mut state = MatchState::new(4, 6);
    let x = spawn(&mut state, "knight", 3, 5, PlayerId::PLAYER, Position::new(1, 1));
    let y = spawn(&mut state, "scout", 1, 2, PlayerId::PLAYER, Position::new(1, 2));
    state.board.unit_mut(y).unwrap().face_down = true;

    let ability = AbilityDefinition::new("Strike")
        .with_condition("Distance==1 && EnemyOrFaceDown")
        .with_step(ActionKind::Attack, TargetSelector::Target);
    state
        .executor()
        .execute(&ability, x, Position::new(1, 2), false)
        .await;

    let revealed = state.board.unit(y).unwrap();
    assert!(!revealed.face_down);
    assert_eq!(revealed.health, 2);

    let events = state.bus.events();
    assert!(events.contains(&GameEvent::UnitAttacked {
        attacker: Position::new(1, 1),
        target: Position::new(1, 2),
    }));
    assert!(events.contains(&GameEvent::UnitFlipped {
        pos: Position::new(1, 2),
        face_down: false,
    }));
    assert!(!events.iter().any(|e| matches!(e, GameEvent::UnitDamaged { .. })));
    // the reveal still costs the attacker its action
    assert!(state.board.unit(x).unwrap().has_acted);
}

/// Same setup but Y is a face-down enemy: damage applies, yet the reveal
/// floor keeps Y at 1 health instead of removing it. Intentional rule, not
/// a bug to correct.
#[tokio::test]
async fn face_down_enemy_reveal_survives_at_one_health() {
    let mut state = MatchState::new(4, 6);
    let x = spawn(&mut state, "knight", 3, 5, PlayerId::PLAYER, Position::new(1, 1));
    let y = spawn(&mut state, "goblin", 0, 2, PlayerId::ENEMY, Position::new(1, 2));
    state.board.unit_mut(y).unwrap().face_down = true;

    let ability = AbilityDefinition::new("Strike")
        .with_condition("Distance==1 && EnemyOrFaceDown")
        .with_step(ActionKind::Attack, TargetSelector::Target);
    state
        .executor()
        .execute(&ability, x, Position::new(1, 2), false)
        .await;

    let revealed = state.board.unit(y).unwrap();
    assert!(!revealed.face_down);
    assert_eq!(revealed.health, 1);
    assert!(state.board.contains(y));
}

/// Cooldown 2 ability: 2 right after execution, 1 after the owner's next
/// start phase, 0 after the one following, when it becomes usable again.
#[tokio::test]
async fn cooldown_ticks_across_owner_start_phases() {
    let mut state = MatchState::new(4, 6);
    let x = spawn(&mut state, "knight", 1, 5, PlayerId::PLAYER, Position::new(1, 1));
    spawn(&mut state, "goblin", 0, 9, PlayerId::ENEMY, Position::new(1, 2));

    let ability = attack_ability().with_cooldown(2);
    state
        .executor()
        .execute(&ability, x, Position::new(1, 2), false)
        .await;
    assert_eq!(state.ledger.get(x, &ability.name), 2);
    assert!(!state.executor().can_execute(&ability, x, Position::new(1, 2)));

    let registry = AbilityRegistry::new();
    let mut engine = TurnEngine::new(&mut state, &registry);
    engine.begin().await; // PlayerStart: tick to 1
    assert_eq!(engine.state.ledger.get(x, &ability.name), 1);

    // advance through the rest of the cycle back to PlayerStart
    for _ in 0..6 {
        engine.advance().await;
    }
    assert_eq!(engine.phase(), grid_skirmish::game::TurnPhase::PlayerStart);
    assert_eq!(engine.state.ledger.get(x, &ability.name), 0);
    assert!(state.executor().can_execute(&ability, x, Position::new(1, 2)));
}

/// A sequence whose middle step loses its target still runs the remaining
/// steps and reports completion.
#[tokio::test]
async fn sequence_completes_when_a_target_vanishes() {
    let mut state = MatchState::new(4, 6);
    let x = spawn(&mut state, "duelist", 5, 6, PlayerId::PLAYER, Position::new(1, 1));
    state.board.unit_mut(x).unwrap().health = 2;
    let y = spawn(&mut state, "goblin", 0, 3, PlayerId::ENEMY, Position::new(1, 2));

    // first attack kills Y; the second attack's target is gone; the final
    // heal still lands on the duelist
    let ability = AbilityDefinition::new("Flurry")
        .with_condition("Distance==1 && Enemy")
        .with_step(ActionKind::Attack, TargetSelector::Target)
        .with_step(ActionKind::Attack, TargetSelector::Target)
        .with_step(ActionKind::Heal(HealAmount::Literal(3)), TargetSelector::SelfUnit);
    let report = state
        .executor()
        .execute(&ability, x, Position::new(1, 2), false)
        .await;

    assert!(report.completed);
    assert_eq!(report.steps_run, 2);
    assert_eq!(report.steps_skipped, 1);
    assert!(!state.board.contains(y));
    assert_eq!(state.board.unit(x).unwrap().health, 5);
}

/// An off-board step target is skipped, not an abort.
#[tokio::test]
async fn off_board_step_targets_are_skipped() {
    let mut state = MatchState::new(4, 6);
    let x = spawn(&mut state, "mystic", 1, 5, PlayerId::PLAYER, Position::new(0, 0));
    state.board.unit_mut(x).unwrap().health = 1;

    let ability = AbilityDefinition::new("Echo")
        .with_range(RangePolicy::Unlimited)
        .with_step(
            ActionKind::Heal(HealAmount::Literal(1)),
            TargetSelector::TargetPosition { dx: -5, dy: -5 },
        )
        .with_step(ActionKind::Heal(HealAmount::Literal(2)), TargetSelector::SelfUnit);
    let report = state
        .executor()
        .execute(&ability, x, Position::new(1, 1), false)
        .await;

    assert!(report.completed);
    assert_eq!(report.steps_skipped, 1);
    assert_eq!(state.board.unit(x).unwrap().health, 3);
}
