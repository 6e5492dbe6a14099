//! Card interaction state machine
//!
//! Drives a single unit's turn action from click input:
//! Idle -> Selected -> {Moving, Attacking, AbilityRunning} -> Idle.
//!
//! Destination clicks are resolved in strict priority order: any registered
//! ability whose range includes the destination, then native attack
//! legality, then native move legality, else deselect. The machine is inert
//! outside the owning player's main phase and while an action is in flight.

use crate::core::{PlayerId, Position, UnitId};
use crate::game::events::GameEvent;
use crate::game::state::MatchState;
use crate::log_if_verbose;
use crate::rules::registry::AbilityRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Selected(UnitId),
    Moving,
    Attacking,
    AbilityRunning,
}

/// What a click did, for callers and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Input ignored (inactive phase, busy, or nothing clickable)
    Ignored,
    Selected,
    Reselected,
    Deselected,
    Moved,
    Attacked,
    AbilityExecuted,
}

#[derive(Debug)]
pub struct InteractionMachine {
    player: PlayerId,
    state: InteractionState,
}

impl InteractionMachine {
    pub fn new(player: PlayerId) -> Self {
        InteractionMachine {
            player,
            state: InteractionState::Idle,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn selected(&self) -> Option<UnitId> {
        match self.state {
            InteractionState::Selected(id) => Some(id),
            _ => None,
        }
    }

    /// Force the machine back to Idle, clearing presentation highlights
    pub fn reset(&mut self, state: &mut MatchState) {
        self.enter_idle(state);
    }

    /// Process one click at a board position
    ///
    /// `active` is true only during the owning player's main phase.
    pub async fn handle_click(
        &mut self,
        pos: Position,
        state: &mut MatchState,
        registry: &AbilityRegistry,
        active: bool,
    ) -> ClickOutcome {
        if !active || state.busy {
            return ClickOutcome::Ignored;
        }

        match self.state {
            InteractionState::Idle => {
                if self.is_selectable(state, pos) {
                    let id = state.board.unit_id_at(pos).expect("selectable implies occupied");
                    self.state = InteractionState::Selected(id);
                    ClickOutcome::Selected
                } else {
                    ClickOutcome::Ignored
                }
            }
            InteractionState::Selected(selected_id) => {
                self.handle_destination(selected_id, pos, state, registry).await
            }
            // transient action states never see input: the busy gate above
            // rejects it first
            _ => ClickOutcome::Ignored,
        }
    }

    async fn handle_destination(
        &mut self,
        selected_id: UnitId,
        pos: Position,
        state: &mut MatchState,
        registry: &AbilityRegistry,
    ) -> ClickOutcome {
        if !state.board.contains(selected_id) {
            self.enter_idle(state);
            return ClickOutcome::Deselected;
        }

        // clicking another of one's own ready units re-targets the selection
        if state.board.unit_id_at(pos) != Some(selected_id) && self.is_selectable(state, pos) {
            let id = state.board.unit_id_at(pos).expect("selectable implies occupied");
            self.state = InteractionState::Selected(id);
            return ClickOutcome::Reselected;
        }

        let source = state.board.unit(selected_id).expect("checked above").clone();

        // priority (a): a registered ability covering the destination
        let chosen = registry.for_type(&source.type_id).iter().find(|ability| {
            !ability.is_automatic()
                && state.ledger.get(selected_id, &ability.name) == 0
                && state.resolver().resolve(ability, &source).contains(&pos)
        });
        if let Some(ability) = chosen {
            log_if_verbose!(state.logger, "unit {selected_id} uses {} at {pos}", ability.name);
            self.state = InteractionState::AbilityRunning;
            state.busy = true;
            state.executor().execute(ability, selected_id, pos, false).await;
            state.busy = false;
            self.enter_idle(state);
            return ClickOutcome::AbilityExecuted;
        }

        // priority (b): native attack
        if state.resolver().can_attack(&source, pos) {
            self.state = InteractionState::Attacking;
            state.busy = true;
            state.executor().basic_attack(selected_id, pos).await;
            state.busy = false;
            self.enter_idle(state);
            return ClickOutcome::Attacked;
        }

        // priority (c): native move
        if state.resolver().can_move_to(&source, pos) {
            self.state = InteractionState::Moving;
            state.busy = true;
            state.executor().basic_move(selected_id, pos).await;
            state.busy = false;
            self.enter_idle(state);
            return ClickOutcome::Moved;
        }

        self.enter_idle(state);
        ClickOutcome::Deselected
    }

    fn is_selectable(&self, state: &MatchState, pos: Position) -> bool {
        state
            .board
            .unit_at(pos)
            .is_some_and(|u| u.owner == self.player && !u.has_acted && !u.face_down)
    }

    /// Entering Idle always clears selection and highlight state
    fn enter_idle(&mut self, state: &mut MatchState) {
        self.state = InteractionState::Idle;
        state.bus.emit(GameEvent::HighlightsCleared);
    }
}
