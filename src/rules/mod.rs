//! The rule engine: conditions, ranges, cooldowns, and ability execution

pub mod ability;
pub mod condition;
pub mod cooldown;
pub mod executor;
pub mod range;
pub mod registry;

pub use ability::{
    AbilityDefinition, ActionKind, ActionStep, AutoPhase, EffectKind, HealAmount, RangePolicy,
    TargetSelector,
};
pub use condition::{ConditionExpr, EvalContext};
pub use cooldown::CooldownLedger;
pub use executor::{ActionExecutor, ExecReport, ExecutionContext};
pub use range::{can_strike, RangeResolver};
pub use registry::AbilityRegistry;
