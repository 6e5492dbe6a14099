//! Ability action executor
//!
//! Interprets an ability's ordered action steps against the board, resolving
//! each step's concrete target through the selector algebra and suspending
//! at presentation acknowledgement points. Execution is single-writer: the
//! executor holds exclusive access to board, ledger, and bus for the whole
//! invocation.
//!
//! A step that cannot resolve (target vanished, off-board position) is
//! skipped with a logged no-op; the sequence always runs to completion.

use crate::board::BoardState;
use crate::core::{Position, StatKind, UnitId};
use crate::game::events::{AckKind, EventBus, GameEvent};
use crate::game::logger::GameLogger;
use crate::log_if_verbose;
use crate::rules::ability::{
    AbilityDefinition, ActionKind, EffectKind, HealAmount, TargetSelector,
};
use crate::rules::cooldown::CooldownLedger;
use crate::rules::range::{can_strike, RangeResolver};
use smallvec::SmallVec;

/// Context key holding the damage dealt by the most recent Attack step
pub const DEALT_DAMAGE_KEY: &str = "dealtDamage";

/// Context key holding the amount restored by the most recent Heal step
pub const HEALED_AMOUNT_KEY: &str = "healedAmount";

/// Scratch values threaded between the steps of one ability invocation
///
/// Created at invocation start, discarded at completion; nothing persists
/// across abilities.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    values: SmallVec<[(String, i32); 2]>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: i32) {
        if let Some((_, v)) = self.values.iter_mut().find(|(k, _)| k == key) {
            *v = value;
        } else {
            self.values.push((key.to_string(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<i32> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }
}

/// Outcome of one ability invocation
///
/// `completed` is always true on return: a failed step is a skip, never an
/// abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecReport {
    pub steps_run: usize,
    pub steps_skipped: usize,
    pub completed: bool,
}

/// Executes ability action sequences and native move/attack actions
pub struct ActionExecutor<'a> {
    board: &'a mut BoardState,
    ledger: &'a mut CooldownLedger,
    bus: &'a mut EventBus,
    logger: &'a GameLogger,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(
        board: &'a mut BoardState,
        ledger: &'a mut CooldownLedger,
        bus: &'a mut EventBus,
        logger: &'a GameLogger,
    ) -> Self {
        ActionExecutor {
            board,
            ledger,
            bus,
            logger,
        }
    }

    /// Boundary precondition: may `source` invoke `ability` against `target`
    /// right now? No state is mutated; an illegal request just reads false.
    pub fn can_execute(
        &self,
        ability: &AbilityDefinition,
        source: UnitId,
        target: Position,
    ) -> bool {
        let Ok(unit) = self.board.unit(source) else {
            return false;
        };
        if unit.face_down || self.ledger.get(source, &ability.name) > 0 {
            return false;
        }
        RangeResolver::new(self.board, self.ledger)
            .resolve(ability, unit)
            .contains(&target)
    }

    /// Run the full action sequence; suspends until complete
    ///
    /// `auto` marks phase-triggered invocations, which do not consume the
    /// source's action for the turn.
    pub async fn execute(
        &mut self,
        ability: &AbilityDefinition,
        source: UnitId,
        target: Position,
        auto: bool,
    ) -> ExecReport {
        let mut report = ExecReport::default();
        if !self.board.contains(source) {
            log_if_verbose!(self.logger, "ability {}: source unit gone, no-op", ability.name);
            report.completed = true;
            return report;
        }
        log_if_verbose!(
            self.logger,
            "executing ability {} from unit {source} at {target}",
            ability.name
        );

        let mut ctx = ExecutionContext::new();
        for (index, step) in ability.steps.iter().enumerate() {
            let Some(step_target) = self.resolve_selector(&step.target, source, target) else {
                log_if_verbose!(self.logger, "step {index}: selector unresolvable, skipped");
                report.steps_skipped += 1;
                continue;
            };
            if !self.board.in_bounds(step_target) {
                log_if_verbose!(self.logger, "step {index}: {step_target} off board, skipped");
                report.steps_skipped += 1;
                continue;
            }

            let applied = match &step.kind {
                ActionKind::Move => self.step_move(source, step_target).await,
                ActionKind::Attack => self.step_attack(source, step_target, &mut ctx).await,
                ActionKind::Heal(amount) => self.step_heal(step_target, amount, &mut ctx).await,
                ActionKind::ModifyStat { stat, amount } => {
                    self.step_modify_stat(step_target, *stat, *amount).await
                }
                ActionKind::Wait { seconds } => {
                    self.bus.wait_secs(*seconds).await;
                    true
                }
                ActionKind::ApplyEffect(effect) => {
                    self.step_apply_effect(step_target, *effect).await
                }
                ActionKind::ResetCounter(ability_id) => {
                    match self.board.unit_id_at(step_target) {
                        Some(unit_id) => {
                            self.ledger.set(unit_id, ability_id, 0);
                            true
                        }
                        None => false,
                    }
                }
            };
            if applied {
                report.steps_run += 1;
            } else {
                log_if_verbose!(self.logger, "step {index}: target invalid, skipped");
                report.steps_skipped += 1;
            }
            self.bus.step_pause().await;
        }

        if self.board.contains(source) {
            self.ledger.reset_to_default(source, ability);
            if !auto {
                self.board
                    .unit_mut(source)
                    .expect("source checked above")
                    .has_acted = true;
            }
        }
        report.completed = true;
        report
    }

    /// Native move action (the interaction machine's Moving state)
    pub async fn basic_move(&mut self, unit_id: UnitId, to: Position) -> bool {
        {
            let Ok(unit) = self.board.unit(unit_id) else {
                return false;
            };
            let resolver = RangeResolver::new(self.board, self.ledger);
            if !resolver.can_move_to(unit, to) {
                return false;
            }
        }
        let moved = self.step_move(unit_id, to).await;
        if moved {
            self.board
                .unit_mut(unit_id)
                .expect("unit just moved")
                .has_acted = true;
        }
        moved
    }

    /// Native attack action (the interaction machine's Attacking state)
    pub async fn basic_attack(&mut self, unit_id: UnitId, target: Position) -> bool {
        {
            let Ok(unit) = self.board.unit(unit_id) else {
                return false;
            };
            let resolver = RangeResolver::new(self.board, self.ledger);
            if !resolver.can_attack(unit, target) {
                return false;
            }
        }
        let mut ctx = ExecutionContext::new();
        let done = self.step_attack(unit_id, target, &mut ctx).await;
        if done && self.board.contains(unit_id) {
            self.board
                .unit_mut(unit_id)
                .expect("attacker present")
                .has_acted = true;
        }
        done
    }

    /// Resolve a selector to a concrete position
    ///
    /// `SelfUnit` re-reads the source's position each step, since earlier
    /// steps may have moved it.
    fn resolve_selector(
        &self,
        selector: &TargetSelector,
        source: UnitId,
        target: Position,
    ) -> Option<Position> {
        match selector {
            TargetSelector::SelfUnit => self.board.unit(source).ok().map(|u| u.position),
            TargetSelector::Target => Some(target),
            TargetSelector::TargetPosition { dx, dy } => Some(target.offset(*dx, *dy)),
            TargetSelector::TargetDirection { shorten } => {
                let src = self.board.unit(source).ok()?.position;
                let (sx, sy) = src.signum_toward(target);
                let dist = (src.chebyshev(target) - shorten).max(1);
                Some(src.offset(sx * dist, sy * dist))
            }
        }
    }

    async fn step_move(&mut self, unit_id: UnitId, to: Position) -> bool {
        let Ok(unit) = self.board.unit(unit_id) else {
            return false;
        };
        let from = unit.position;
        // emptiness was the range legality that picked the cell, but the
        // board may have changed mid-sequence
        if self.board.move_unit(unit_id, to).is_err() {
            return false;
        }
        self.bus.emit(GameEvent::UnitMoved { from, to });
        true
    }

    async fn step_attack(
        &mut self,
        attacker_id: UnitId,
        target_pos: Position,
        ctx: &mut ExecutionContext,
    ) -> bool {
        let Ok(attacker) = self.board.unit(attacker_id) else {
            return false;
        };
        if attacker.face_down {
            return false;
        }
        let attacker_pos = attacker.position;
        let attack_value = attacker.attack;
        let attacker_owner = attacker.owner;

        let Some(defender_id) = self.board.unit_id_at(target_pos) else {
            return false;
        };
        if defender_id == attacker_id {
            return false;
        }

        self.bus.emit(GameEvent::UnitAttacked {
            attacker: attacker_pos,
            target: target_pos,
        });
        self.bus
            .wait_for(AckKind::AttackAnimDone, attacker_pos)
            .await;

        let (was_face_down, defender_owner) = {
            let defender = self.board.unit(defender_id).expect("defender present");
            (defender.face_down, defender.owner)
        };

        if was_face_down {
            self.board
                .unit_mut(defender_id)
                .expect("defender present")
                .face_down = false;
            self.bus.emit(GameEvent::UnitFlipped {
                pos: target_pos,
                face_down: false,
            });
            self.bus.wait_for(AckKind::FlipAnimDone, target_pos).await;
        }

        // revealing a friendly unit costs the attack but deals no damage
        if was_face_down && defender_owner == attacker_owner {
            ctx.set(DEALT_DAMAGE_KEY, 0);
            return true;
        }

        let dealt = {
            let defender = self.board.unit_mut(defender_id).expect("defender present");
            if was_face_down {
                // reveal floor: a unit flipped by this attack survives it
                defender.apply_damage_floored(attack_value)
            } else {
                defender.apply_damage(attack_value)
            }
        };
        self.bus.emit(GameEvent::UnitDamaged { pos: target_pos });
        self.bus.wait_for(AckKind::DamageAnimDone, target_pos).await;
        ctx.set(DEALT_DAMAGE_KEY, dealt);

        // primary damage is applied and death-checked before any counter
        let defender_alive = self
            .board
            .unit(defender_id)
            .map(|u| u.is_alive())
            .unwrap_or(false);
        if !defender_alive {
            self.resolve_death(defender_id, target_pos).await;
            return true;
        }

        let counter = {
            let defender = self.board.unit(defender_id).expect("defender alive");
            can_strike(self.board, defender, attacker_pos).then_some(defender.attack)
        };
        if let Some(counter_damage) = counter {
            if self.board.contains(attacker_id) {
                self.board
                    .unit_mut(attacker_id)
                    .expect("attacker present")
                    .apply_damage(counter_damage);
                self.bus.emit(GameEvent::UnitDamaged { pos: attacker_pos });
                self.bus
                    .wait_for(AckKind::DamageAnimDone, attacker_pos)
                    .await;
                let attacker_alive = self
                    .board
                    .unit(attacker_id)
                    .map(|u| u.is_alive())
                    .unwrap_or(false);
                if !attacker_alive {
                    self.resolve_death(attacker_id, attacker_pos).await;
                }
            }
        }
        true
    }

    async fn step_heal(
        &mut self,
        pos: Position,
        amount: &HealAmount,
        ctx: &mut ExecutionContext,
    ) -> bool {
        let Some(unit_id) = self.board.unit_id_at(pos) else {
            return false;
        };
        let amount = match amount {
            HealAmount::Literal(n) => *n,
            HealAmount::PercentOf { pct, key } => ctx.get(key).unwrap_or(0) * pct / 100,
        };
        let healed = self
            .board
            .unit_mut(unit_id)
            .expect("unit present")
            .heal(amount);
        self.bus.emit(GameEvent::UnitHealed { pos });
        self.bus.wait_for(AckKind::HealAnimDone, pos).await;
        ctx.set(HEALED_AMOUNT_KEY, healed);
        true
    }

    async fn step_modify_stat(&mut self, pos: Position, stat: StatKind, amount: i32) -> bool {
        let Some(unit_id) = self.board.unit_id_at(pos) else {
            return false;
        };
        self.board
            .unit_mut(unit_id)
            .expect("unit present")
            .modify_stat(stat, amount);
        self.bus.emit(GameEvent::UnitStatModified { pos });
        // a health reduction can be lethal
        let alive = self
            .board
            .unit(unit_id)
            .map(|u| u.is_alive())
            .unwrap_or(false);
        if !alive {
            self.resolve_death(unit_id, pos).await;
        }
        true
    }

    async fn step_apply_effect(&mut self, pos: Position, effect: EffectKind) -> bool {
        let Some(unit_id) = self.board.unit_id_at(pos) else {
            return false;
        };
        let want_down = matches!(effect, EffectKind::Conceal);
        let unit = self.board.unit_mut(unit_id).expect("unit present");
        if unit.face_down == want_down {
            return true;
        }
        unit.face_down = want_down;
        self.bus.emit(GameEvent::UnitFlipped {
            pos,
            face_down: want_down,
        });
        self.bus.wait_for(AckKind::FlipAnimDone, pos).await;
        true
    }

    async fn resolve_death(&mut self, unit_id: UnitId, pos: Position) {
        self.bus.emit(GameEvent::UnitRemoved { pos });
        self.bus.wait_for(AckKind::DeathAnimDone, pos).await;
        self.ledger.forget_unit(unit_id);
        self.board.remove(unit_id);
        log_if_verbose!(self.logger, "unit {unit_id} removed at {pos}");
    }
}
