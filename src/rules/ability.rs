//! Ability definitions: the data model behind every card skill
//!
//! Abilities are external content, not code. Each definition carries a
//! trigger-condition expression, a range policy, a cooldown, and an ordered
//! list of typed action steps. Definitions are immutable once registered;
//! units reference them through their type id.

use crate::core::{AbilityId, StatKind};
use crate::rules::condition::ConditionExpr;
use smallvec::SmallVec;

/// Strategy determining which positions an ability may target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePolicy {
    /// Whole-board scan filtered by the trigger condition
    Default,
    /// The unit's native attack legality, plus the auxiliary condition
    AttackRangeBased,
    /// The unit's native move legality, plus the auxiliary condition
    MoveRangeBased,
    /// Manhattan distance at most n, plus the auxiliary condition
    Custom(i32),
    /// Every other cell, filtered only by the auxiliary condition
    Unlimited,
}

/// Phase moment at which an automatic ability fires (owner's phases)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPhase {
    TurnStart,
    TurnEnd,
}

/// Selector resolving an action step's concrete target position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelector {
    /// The source unit's current position, re-read each step
    SelfUnit,
    /// The position the ability was invoked against
    Target,
    /// The target position offset by a fixed delta
    TargetPosition { dx: i32, dy: i32 },
    /// Along the source-to-target direction vector, shortened from the
    /// Chebyshev distance by `shorten` cells (never below 1)
    TargetDirection { shorten: i32 },
}

/// Heal amount: a literal, or a percentage of an execution-context value
#[derive(Debug, Clone, PartialEq)]
pub enum HealAmount {
    Literal(i32),
    PercentOf { pct: i32, key: String },
}

/// Board effect applied by an `ApplyEffect` step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Turn the target face-up
    Reveal,
    /// Turn the target face-down
    Conceal,
}

/// One typed step of an ability's action sequence
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    Move,
    Attack,
    Heal(HealAmount),
    ModifyStat { stat: StatKind, amount: i32 },
    Wait { seconds: f32 },
    ApplyEffect(EffectKind),
    ResetCounter(AbilityId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionStep {
    pub kind: ActionKind,
    pub target: TargetSelector,
}

/// Immutable configuration for one ability
///
/// The trigger condition is parsed once at construction; evaluation never
/// re-parses the source text.
#[derive(Debug, Clone)]
pub struct AbilityDefinition {
    /// Ability name, also the cooldown ledger key
    pub name: AbilityId,

    /// Trigger condition; empty means always true
    pub trigger_condition: ConditionExpr,

    /// Action steps, executed strictly in order
    pub steps: SmallVec<[ActionStep; 4]>,

    /// Turns before the ability can be used again
    pub cooldown: u32,

    pub range_policy: RangePolicy,

    /// Extra filter applied by the non-Default range policies
    pub range_condition: Option<ConditionExpr>,

    /// When set, the ability fires automatically on the owner's phase
    pub auto_phase: Option<AutoPhase>,
}

impl AbilityDefinition {
    pub fn new(name: impl Into<AbilityId>) -> Self {
        AbilityDefinition {
            name: name.into(),
            trigger_condition: ConditionExpr::always_true(),
            steps: SmallVec::new(),
            cooldown: 0,
            range_policy: RangePolicy::Default,
            range_condition: None,
            auto_phase: None,
        }
    }

    pub fn with_condition(mut self, expr: &str) -> Self {
        self.trigger_condition = ConditionExpr::new(expr);
        self
    }

    pub fn with_range(mut self, policy: RangePolicy) -> Self {
        self.range_policy = policy;
        self
    }

    pub fn with_range_condition(mut self, expr: &str) -> Self {
        self.range_condition = Some(ConditionExpr::new(expr));
        self
    }

    pub fn with_cooldown(mut self, turns: u32) -> Self {
        self.cooldown = turns;
        self
    }

    pub fn with_auto(mut self, phase: AutoPhase) -> Self {
        self.auto_phase = Some(phase);
        self
    }

    pub fn with_step(mut self, kind: ActionKind, target: TargetSelector) -> Self {
        self.steps.push(ActionStep { kind, target });
        self
    }

    pub fn is_automatic(&self) -> bool {
        self.auto_phase.is_some()
    }
}
