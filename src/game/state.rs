//! Central match state
//!
//! Owns the board, cooldown ledger, event bus, and logger for one match.
//! The ability registry is deliberately not here: it is immutable shared
//! configuration, passed by reference to whatever needs it.

use crate::board::BoardState;
use crate::core::{PlayerId, Position, UnitId};
use crate::game::events::EventBus;
use crate::game::logger::GameLogger;
use crate::loader::UnitDefinition;
use crate::rules::cooldown::CooldownLedger;
use crate::rules::executor::ActionExecutor;
use crate::rules::range::RangeResolver;
use crate::Result;

/// All mutable state for one match
///
/// Scoped to a single match; nothing is persisted. Mutation happens on one
/// logical thread only - the `busy` flag gates interaction input while an
/// action is executing.
#[derive(Debug)]
pub struct MatchState {
    pub board: BoardState,
    pub ledger: CooldownLedger,
    pub bus: EventBus,
    pub logger: GameLogger,
    /// Process-wide "ability/action in progress" gate for player input
    pub busy: bool,
}

impl MatchState {
    /// New match on an empty board with a headless event bus
    pub fn new(width: i32, height: i32) -> Self {
        MatchState {
            board: BoardState::new(width, height),
            ledger: CooldownLedger::new(),
            bus: EventBus::headless(),
            logger: GameLogger::new(),
            busy: false,
        }
    }

    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_logger(mut self, logger: GameLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Borrow the state as an action executor for one invocation
    pub fn executor(&mut self) -> ActionExecutor<'_> {
        ActionExecutor::new(&mut self.board, &mut self.ledger, &mut self.bus, &self.logger)
    }

    /// Read-only range resolution over the current board
    pub fn resolver(&self) -> RangeResolver<'_> {
        RangeResolver::new(&self.board, &self.ledger)
    }

    /// Spawn a unit from a loader definition
    pub fn spawn_from(
        &mut self,
        def: &UnitDefinition,
        owner: PlayerId,
        pos: Position,
    ) -> Result<UnitId> {
        let id = self.board.spawn(
            def.type_id.clone(),
            def.name.clone(),
            def.attack,
            def.max_health,
            def.move_range,
            def.attack_range,
            owner,
            pos,
        )?;
        if def.starts_face_down {
            self.board.unit_mut(id)?.face_down = true;
        }
        Ok(id)
    }
}
