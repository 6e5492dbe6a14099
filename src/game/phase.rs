//! Turn phase state machine
//!
//! Six strictly linear, looping phases alternating between the two owners.
//! Entering a Start phase resets the owner's acted flags, ticks the cooldown
//! ledger, and fires start-tagged automatic abilities; an End phase fires
//! end-tagged automatics, waits out a presentation grace delay, and hands
//! the turn over. Player input is live only during PlayerMain; EnemyMain
//! delegates to an external action policy.

use crate::core::{PlayerId, Position, UnitId};
use crate::game::controller::{ActionPolicy, BoardView, PolicyAction};
use crate::game::events::GameEvent;
use crate::game::interaction::{ClickOutcome, InteractionMachine};
use crate::game::state::MatchState;
use crate::log_if_verbose;
use crate::rules::ability::AutoPhase;
use crate::rules::condition::EvalContext;
use crate::rules::registry::AbilityRegistry;
use serde::{Deserialize, Serialize};

/// The six turn phases, in cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    PlayerStart,
    PlayerMain,
    PlayerEnd,
    EnemyStart,
    EnemyMain,
    EnemyEnd,
}

impl TurnPhase {
    /// The next phase in the cycle
    pub fn next(&self) -> TurnPhase {
        match self {
            TurnPhase::PlayerStart => TurnPhase::PlayerMain,
            TurnPhase::PlayerMain => TurnPhase::PlayerEnd,
            TurnPhase::PlayerEnd => TurnPhase::EnemyStart,
            TurnPhase::EnemyStart => TurnPhase::EnemyMain,
            TurnPhase::EnemyMain => TurnPhase::EnemyEnd,
            TurnPhase::EnemyEnd => TurnPhase::PlayerStart,
        }
    }

    /// The player whose sub-turn this phase belongs to
    pub fn owner(&self) -> PlayerId {
        match self {
            TurnPhase::PlayerStart | TurnPhase::PlayerMain | TurnPhase::PlayerEnd => {
                PlayerId::PLAYER
            }
            TurnPhase::EnemyStart | TurnPhase::EnemyMain | TurnPhase::EnemyEnd => PlayerId::ENEMY,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, TurnPhase::PlayerStart | TurnPhase::EnemyStart)
    }

    pub fn is_main(&self) -> bool {
        matches!(self, TurnPhase::PlayerMain | TurnPhase::EnemyMain)
    }

    pub fn is_end(&self) -> bool {
        matches!(self, TurnPhase::PlayerEnd | TurnPhase::EnemyEnd)
    }
}

/// Reason a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEndReason {
    /// A player lost all units; the winner is recorded
    Elimination(PlayerId),
    /// Both sides were wiped out simultaneously
    Draw,
    /// The cycle limit was reached without a decision
    CycleLimit,
}

/// Result of running a match to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub winner: Option<PlayerId>,
    pub cycles_played: u32,
    pub end_reason: MatchEndReason,
}

/// Turn engine: owns phase progression for one match
///
/// Borrows the match state for its lifetime; the registry is shared
/// read-only configuration.
pub struct TurnEngine<'a> {
    pub state: &'a mut MatchState,
    registry: &'a AbilityRegistry,
    phase: TurnPhase,
    cycles_completed: u32,
    max_cycles: u32,
    /// Presentation grace delay before handing the turn over, in seconds
    grace_secs: f32,
    interaction: InteractionMachine,
}

impl<'a> TurnEngine<'a> {
    pub fn new(state: &'a mut MatchState, registry: &'a AbilityRegistry) -> Self {
        TurnEngine {
            state,
            registry,
            phase: TurnPhase::PlayerStart,
            cycles_completed: 0,
            max_cycles: 100,
            grace_secs: 0.5,
            interaction: InteractionMachine::new(PlayerId::PLAYER),
        }
    }

    pub fn with_max_cycles(mut self, max_cycles: u32) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_grace_secs(mut self, grace_secs: f32) -> Self {
        self.grace_secs = grace_secs;
        self
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn interaction(&self) -> &InteractionMachine {
        &self.interaction
    }

    /// Run the initial PlayerStart entry logic
    pub async fn begin(&mut self) {
        self.enter(TurnPhase::PlayerStart).await;
    }

    /// Advance to the next phase and run its entry logic
    ///
    /// Strictly sequential: the previous phase's automatic-ability batch has
    /// fully completed before this returns control.
    pub async fn advance(&mut self) -> TurnPhase {
        self.phase = self.phase.next();
        if self.phase == TurnPhase::PlayerStart {
            self.cycles_completed += 1;
        }
        self.enter(self.phase).await;
        self.phase
    }

    /// Route a click to the interaction machine (live only in PlayerMain)
    pub async fn handle_click(&mut self, pos: Position) -> ClickOutcome {
        let active = self.phase == TurnPhase::PlayerMain;
        self.interaction
            .handle_click(pos, self.state, self.registry, active)
            .await
    }

    async fn enter(&mut self, phase: TurnPhase) {
        let owner = phase.owner();
        if phase.is_start() {
            self.state.bus.emit(GameEvent::TurnStarted { owner });
            log_if_verbose!(self.state.logger, "phase {:?}: turn start for {owner}", phase);
            self.reset_acted_flags(owner);
            self.state.ledger.reduce_all_for_owner(owner, &self.state.board);
            self.fire_automatics(AutoPhase::TurnStart, owner).await;
        } else if phase.is_end() {
            self.fire_automatics(AutoPhase::TurnEnd, owner).await;
            let grace = self.grace_secs;
            self.state.bus.wait_secs(grace).await;
            self.state.bus.emit(GameEvent::TurnEnded { owner });
            self.interaction.reset(self.state);
        }
        // main phases have no entry logic; input or a policy drives them
    }

    fn reset_acted_flags(&mut self, owner: PlayerId) {
        let ids: Vec<UnitId> = self.state.board.units_of(owner).map(|u| u.id).collect();
        for id in ids {
            if let Ok(unit) = self.state.board.unit_mut(id) {
                unit.has_acted = false;
            }
        }
    }

    /// Fire phase-tagged automatic abilities for the owner's face-up units
    ///
    /// Units are processed in board-scan order. An automatic ability fires
    /// when its cooldown is clear and its trigger condition holds against
    /// the chosen target: the first resolved candidate, or the unit's own
    /// position when the resolver comes up empty (self-targeted effects).
    async fn fire_automatics(&mut self, moment: AutoPhase, owner: PlayerId) {
        let mut ordered: Vec<(Position, UnitId)> = self
            .state
            .board
            .units_of(owner)
            .filter(|u| !u.face_down)
            .map(|u| (u.position, u.id))
            .collect();
        ordered.sort_by_key(|(pos, _)| (pos.y, pos.x));

        for (_, unit_id) in ordered {
            let abilities: Vec<_> = {
                let Ok(unit) = self.state.board.unit(unit_id) else {
                    continue;
                };
                self.registry
                    .for_type(&unit.type_id)
                    .iter()
                    .filter(|a| a.auto_phase == Some(moment))
                    .cloned()
                    .collect()
            };
            for ability in abilities {
                // an earlier automatic may have removed or flipped this unit
                let Ok(unit) = self.state.board.unit(unit_id) else {
                    break;
                };
                if unit.face_down || self.state.ledger.get(unit_id, &ability.name) > 0 {
                    continue;
                }
                let unit = unit.clone();
                let targets = self.state.resolver().resolve(&ability, &unit);
                let target = targets.first().copied().unwrap_or(unit.position);
                let holds = ability.trigger_condition.evaluate(&EvalContext {
                    board: &self.state.board,
                    ledger: &self.state.ledger,
                    source: &unit,
                    target,
                });
                if !holds {
                    continue;
                }
                log_if_verbose!(
                    self.state.logger,
                    "automatic {} fires for unit {unit_id} at {target}",
                    ability.name
                );
                self.state.busy = true;
                self.state
                    .executor()
                    .execute(&ability, unit_id, target, true)
                    .await;
                self.state.busy = false;
            }
        }
    }

    /// Drive a main phase with an action policy until it passes
    ///
    /// Illegal requests are rejected without state change; a bounded attempt
    /// count protects against policies that never pass.
    pub async fn run_main_with(&mut self, policy: &mut dyn ActionPolicy) {
        debug_assert!(self.phase.is_main());
        let owner = self.phase.owner();
        let mut attempts = 0usize;
        let attempt_limit = self.state.board.unit_count() * 4 + 8;
        loop {
            attempts += 1;
            if attempts > attempt_limit {
                log_if_verbose!(self.state.logger, "policy for {owner} kept requesting actions, cutting off");
                break;
            }
            let action = {
                let view = BoardView::new(self.state, self.registry, owner);
                policy.choose_action(&view)
            };
            match action {
                PolicyAction::Pass => break,
                PolicyAction::MoveUnit { unit, to } => {
                    self.state.busy = true;
                    self.state.executor().basic_move(unit, to).await;
                    self.state.busy = false;
                }
                PolicyAction::AttackUnit { unit, target } => {
                    self.state.busy = true;
                    self.state.executor().basic_attack(unit, target).await;
                    self.state.busy = false;
                }
                PolicyAction::UseAbility {
                    unit,
                    ability,
                    target,
                } => {
                    let def = self
                        .state
                        .board
                        .unit(unit)
                        .ok()
                        .and_then(|u| self.registry.find(&u.type_id, &ability))
                        .cloned();
                    let Some(def) = def else {
                        continue;
                    };
                    if !self.state.executor().can_execute(&def, unit, target) {
                        continue;
                    }
                    self.state.busy = true;
                    self.state.executor().execute(&def, unit, target, false).await;
                    self.state.busy = false;
                }
            }
        }
    }

    /// Run a full match with a policy on each side
    pub async fn run_match(
        &mut self,
        player_policy: &mut dyn ActionPolicy,
        enemy_policy: &mut dyn ActionPolicy,
    ) -> MatchResult {
        self.begin().await;
        loop {
            if let Some(result) = self.decided() {
                self.notify_end(player_policy, enemy_policy, &result);
                return result;
            }
            match self.phase {
                TurnPhase::PlayerMain => self.run_main_with(player_policy).await,
                TurnPhase::EnemyMain => self.run_main_with(enemy_policy).await,
                _ => {}
            }
            if self.cycles_completed >= self.max_cycles {
                let result = MatchResult {
                    winner: None,
                    cycles_played: self.cycles_completed,
                    end_reason: MatchEndReason::CycleLimit,
                };
                self.notify_end(player_policy, enemy_policy, &result);
                return result;
            }
            self.advance().await;
        }
    }

    /// Check the elimination win condition
    fn decided(&self) -> Option<MatchResult> {
        let player_alive = self.state.board.units_of(PlayerId::PLAYER).next().is_some();
        let enemy_alive = self.state.board.units_of(PlayerId::ENEMY).next().is_some();
        match (player_alive, enemy_alive) {
            (true, true) => None,
            (true, false) => Some(MatchResult {
                winner: Some(PlayerId::PLAYER),
                cycles_played: self.cycles_completed,
                end_reason: MatchEndReason::Elimination(PlayerId::PLAYER),
            }),
            (false, true) => Some(MatchResult {
                winner: Some(PlayerId::ENEMY),
                cycles_played: self.cycles_completed,
                end_reason: MatchEndReason::Elimination(PlayerId::ENEMY),
            }),
            (false, false) => Some(MatchResult {
                winner: None,
                cycles_played: self.cycles_completed,
                end_reason: MatchEndReason::Draw,
            }),
        }
    }

    fn notify_end(
        &self,
        player_policy: &mut dyn ActionPolicy,
        enemy_policy: &mut dyn ActionPolicy,
        result: &MatchResult,
    ) {
        let view = BoardView::new(self.state, self.registry, PlayerId::PLAYER);
        player_policy.on_match_end(&view, result.winner == Some(PlayerId::PLAYER));
        let view = BoardView::new(self.state, self.registry, PlayerId::ENEMY);
        enemy_policy.on_match_end(&view, result.winner == Some(PlayerId::ENEMY));
    }
}
