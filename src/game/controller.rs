//! Action policy trait and board view
//!
//! The turn engine calls a policy during a main phase when no human input
//! drives the interaction machine (always, for the enemy side). Policies
//! inspect a read-only view and pick actions; the engine validates and
//! executes them through the same resolver/executor APIs the player path
//! uses. Selection heuristics live entirely outside the rule core.

use crate::core::{AbilityId, PlayerId, Position, Unit, UnitId};
use crate::game::state::MatchState;
use crate::rules::registry::AbilityRegistry;
use rand::Rng;

/// An action a policy may request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyAction {
    MoveUnit { unit: UnitId, to: Position },
    AttackUnit { unit: UnitId, target: Position },
    UseAbility {
        unit: UnitId,
        ability: AbilityId,
        target: Position,
    },
    /// End the main phase
    Pass,
}

/// Read-only view of match state from one player's perspective
pub struct BoardView<'a> {
    state: &'a MatchState,
    registry: &'a AbilityRegistry,
    player: PlayerId,
}

impl<'a> BoardView<'a> {
    pub fn new(state: &'a MatchState, registry: &'a AbilityRegistry, player: PlayerId) -> Self {
        BoardView {
            state,
            registry,
            player,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.state.board.unit(id).ok()
    }

    /// Own face-up units that have not acted this turn
    pub fn ready_units(&self) -> Vec<UnitId> {
        self.state
            .board
            .units_of(self.player)
            .filter(|u| !u.face_down && !u.has_acted)
            .map(|u| u.id)
            .collect()
    }

    /// Every action the engine would accept right now
    ///
    /// Enumerated in deterministic order: units by id, abilities in
    /// registration order, positions in board-scan order.
    pub fn legal_actions(&self) -> Vec<PolicyAction> {
        let mut actions = Vec::new();
        let resolver = self.state.resolver();
        for id in self.ready_units() {
            let Ok(unit) = self.state.board.unit(id) else {
                continue;
            };
            for ability in self.registry.for_type(&unit.type_id) {
                if ability.is_automatic() || self.state.ledger.get(id, &ability.name) > 0 {
                    continue;
                }
                for target in resolver.resolve(ability, unit) {
                    actions.push(PolicyAction::UseAbility {
                        unit: id,
                        ability: ability.name.clone(),
                        target,
                    });
                }
            }
            for pos in self.state.board.positions() {
                if resolver.can_attack(unit, pos) {
                    actions.push(PolicyAction::AttackUnit {
                        unit: id,
                        target: pos,
                    });
                }
            }
            for pos in self.state.board.positions() {
                if resolver.can_move_to(unit, pos) {
                    actions.push(PolicyAction::MoveUnit { unit: id, to: pos });
                }
            }
        }
        actions
    }
}

/// Action selection policy for a main phase
///
/// Implement this to create AI players or connect to UI. The engine calls
/// `choose_action` repeatedly until the policy passes or no actions remain.
pub trait ActionPolicy {
    fn player_id(&self) -> PlayerId;

    fn choose_action(&mut self, view: &BoardView) -> PolicyAction;

    /// Called when the match ends (for cleanup/logging)
    fn on_match_end(&mut self, _view: &BoardView, _won: bool) {}
}

/// A policy that makes random choices
///
/// Baseline for testing and AI-vs-AI matches.
pub struct RandomPolicy {
    player: PlayerId,
    rng: Box<dyn rand::RngCore>,
}

impl RandomPolicy {
    pub fn new(player: PlayerId) -> Self {
        RandomPolicy {
            player,
            rng: Box::new(rand::thread_rng()),
        }
    }

    /// Seeded variant for deterministic matches
    pub fn with_seed(player: PlayerId, seed: u64) -> Self {
        use rand::SeedableRng;
        RandomPolicy {
            player,
            rng: Box::new(rand_chacha::ChaCha12Rng::seed_from_u64(seed)),
        }
    }
}

impl ActionPolicy for RandomPolicy {
    fn player_id(&self) -> PlayerId {
        self.player
    }

    fn choose_action(&mut self, view: &BoardView) -> PolicyAction {
        let actions = view.legal_actions();
        if actions.is_empty() {
            PolicyAction::Pass
        } else {
            let index = self.rng.gen_range(0..actions.len());
            actions[index].clone()
        }
    }
}

/// A policy that always takes the first legal action
///
/// Fully deterministic without a seed; handy in tests.
pub struct FirstActionPolicy {
    player: PlayerId,
}

impl FirstActionPolicy {
    pub fn new(player: PlayerId) -> Self {
        FirstActionPolicy { player }
    }
}

impl ActionPolicy for FirstActionPolicy {
    fn player_id(&self) -> PlayerId {
        self.player
    }

    fn choose_action(&mut self, view: &BoardView) -> PolicyAction {
        view.legal_actions()
            .into_iter()
            .next()
            .unwrap_or(PolicyAction::Pass)
    }
}
