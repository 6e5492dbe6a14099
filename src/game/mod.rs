//! Match orchestration: state machines, events, policies, and match state

pub mod controller;
pub mod events;
pub mod interaction;
pub mod logger;
pub mod phase;
pub mod state;

pub use controller::{ActionPolicy, BoardView, FirstActionPolicy, PolicyAction, RandomPolicy};
pub use events::{AckEvent, AckKind, EventBus, GameEvent};
pub use interaction::{ClickOutcome, InteractionMachine, InteractionState};
pub use logger::{GameLogger, LogEntry, OutputFormat, OutputMode, VerbosityLevel};
pub use phase::{MatchEndReason, MatchResult, TurnEngine, TurnPhase};
pub use state::MatchState;
