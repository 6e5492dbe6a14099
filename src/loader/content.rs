//! Content file loader (.txt format)
//!
//! Units and their abilities are authored as line-oriented text blocks:
//!
//! ```text
//! Name:Knight
//! Type:knight
//! Attack:3
//! Health:5
//! MoveRange:2
//! AttackRange:1
//! A:Name$ Cleave | Cond$ Distance==1 && Enemy | Range$ AttackRangeBased | \
//!   Cooldown$ 2 | Steps$ Attack @ Target; Heal 50% of dealtDamage @ Self
//! ```
//!
//! Blocks are separated by blank lines. Malformed lines are non-fatal: they
//! are reported as warnings and skipped, and the rest of the file loads.

use crate::core::{AbilityId, StatKind, UnitTypeId};
use crate::rules::ability::{
    AbilityDefinition, ActionKind, ActionStep, AutoPhase, EffectKind, HealAmount, RangePolicy,
    TargetSelector,
};
use crate::rules::registry::AbilityRegistry;
use crate::{Result, SkirmishError};
use std::fs;
use std::path::Path;

/// Spawn template for a unit type (not yet placed on a board)
#[derive(Debug, Clone)]
pub struct UnitDefinition {
    pub type_id: UnitTypeId,
    pub name: String,
    pub attack: i32,
    pub max_health: i32,
    pub move_range: i32,
    pub attack_range: i32,
    pub starts_face_down: bool,
}

/// Everything a content file yields
#[derive(Debug, Clone, Default)]
pub struct ContentSet {
    pub definitions: Vec<UnitDefinition>,
    pub registry: AbilityRegistry,
    /// Non-fatal problems found while loading
    pub warnings: Vec<String>,
}

impl ContentSet {
    pub fn definition(&self, type_id: &UnitTypeId) -> Option<&UnitDefinition> {
        self.definitions.iter().find(|d| &d.type_id == type_id)
    }
}

/// Content loader for .txt files
pub struct ContentLoader;

impl ContentLoader {
    /// Load content from a .txt file
    pub fn load_from_file(path: &Path) -> Result<ContentSet> {
        let content = fs::read_to_string(path).map_err(SkirmishError::IoError)?;
        Self::parse(&content)
    }

    /// Parse content from text
    pub fn parse(content: &str) -> Result<ContentSet> {
        let mut set = ContentSet::default();

        for block in content.split("\n\n") {
            let block = block.trim();
            if block.is_empty() || block.lines().all(|l| l.trim().starts_with('#')) {
                continue;
            }
            Self::parse_block(block, &mut set);
        }

        if set.definitions.is_empty() {
            return Err(SkirmishError::InvalidContentFormat(
                "no unit definitions found".to_string(),
            ));
        }
        Ok(set)
    }

    fn parse_block(block: &str, set: &mut ContentSet) {
        let mut name = None;
        let mut type_id = None;
        let mut attack = 0;
        let mut max_health = 1;
        let mut move_range = 1;
        let mut attack_range = 1;
        let mut starts_face_down = false;
        let mut raw_abilities = Vec::new();

        for line in block.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                set.warnings.push(format!("ignored line without ':': '{line}'"));
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            match key {
                "Name" => name = Some(value.to_string()),
                "Type" => type_id = Some(UnitTypeId::new(value)),
                "Attack" => attack = Self::parse_num(value, "Attack", &mut set.warnings),
                "Health" => max_health = Self::parse_num(value, "Health", &mut set.warnings),
                "MoveRange" => move_range = Self::parse_num(value, "MoveRange", &mut set.warnings),
                "AttackRange" => {
                    attack_range = Self::parse_num(value, "AttackRange", &mut set.warnings)
                }
                "FaceDown" => starts_face_down = value.eq_ignore_ascii_case("true"),
                "A" => raw_abilities.push(value.to_string()),
                _ => {} // Ignore other fields for now
            }
        }

        let Some(name) = name else {
            set.warnings
                .push("unit block without a Name line skipped".to_string());
            return;
        };
        let type_id = type_id.unwrap_or_else(|| UnitTypeId::new(name.to_lowercase()));

        for raw in raw_abilities {
            match Self::parse_ability(&raw, &mut set.warnings) {
                Some(ability) => set.registry.register(type_id.clone(), ability),
                None => set
                    .warnings
                    .push(format!("ability line skipped for {type_id}: '{raw}'")),
            }
        }

        set.definitions.push(UnitDefinition {
            type_id,
            name,
            attack,
            max_health,
            move_range,
            attack_range,
            starts_face_down,
        });
    }

    fn parse_num(value: &str, field: &str, warnings: &mut Vec<String>) -> i32 {
        match value.parse() {
            Ok(n) => n,
            Err(_) => {
                warnings.push(format!("bad {field} value '{value}', defaulting to 0"));
                0
            }
        }
    }

    /// Parse one `A:` ability line of `Key$ Value` pairs separated by `|`
    fn parse_ability(raw: &str, warnings: &mut Vec<String>) -> Option<AbilityDefinition> {
        let mut name = None;
        let mut condition = None;
        let mut range_policy = RangePolicy::Default;
        let mut range_condition = None;
        let mut cooldown = 0;
        let mut auto_phase = None;
        let mut steps = Vec::new();

        for pair in raw.split('|') {
            let Some((key, value)) = pair.split_once('$') else {
                warnings.push(format!("ability field without '$': '{pair}'"));
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            match key {
                "Name" => name = Some(AbilityId::new(value)),
                "Cond" => condition = Some(value.to_string()),
                "RangeCond" => range_condition = Some(value.to_string()),
                "Cooldown" => cooldown = Self::parse_num(value, "Cooldown", warnings).max(0) as u32,
                "Range" => match Self::parse_range(value) {
                    Some(policy) => range_policy = policy,
                    None => warnings.push(format!("unknown range policy '{value}'")),
                },
                "Auto" => match value {
                    "TurnStart" => auto_phase = Some(AutoPhase::TurnStart),
                    "TurnEnd" => auto_phase = Some(AutoPhase::TurnEnd),
                    _ => warnings.push(format!("unknown auto phase '{value}'")),
                },
                "Steps" => {
                    for step_src in value.split(';') {
                        match Self::parse_step(step_src.trim()) {
                            Some(step) => steps.push(step),
                            None => {
                                warnings.push(format!("bad action step '{}'", step_src.trim()))
                            }
                        }
                    }
                }
                _ => warnings.push(format!("unknown ability field '{key}'")),
            }
        }

        let name = name?;
        if steps.is_empty() {
            return None;
        }
        let mut ability = AbilityDefinition::new(name)
            .with_range(range_policy)
            .with_cooldown(cooldown);
        if let Some(cond) = condition {
            ability = ability.with_condition(&cond);
            if let Some(err) = ability.trigger_condition.parse_error() {
                warnings.push(format!("condition '{cond}' is malformed: {err}"));
            }
        }
        if let Some(cond) = range_condition {
            ability = ability.with_range_condition(&cond);
        }
        if let Some(phase) = auto_phase {
            ability = ability.with_auto(phase);
        }
        for step in steps {
            ability = ability.with_step(step.kind, step.target);
        }
        Some(ability)
    }

    fn parse_range(value: &str) -> Option<RangePolicy> {
        if let Some(n) = value.strip_prefix("Custom:") {
            return n.trim().parse().ok().map(RangePolicy::Custom);
        }
        match value {
            "Default" => Some(RangePolicy::Default),
            "AttackRangeBased" => Some(RangePolicy::AttackRangeBased),
            "MoveRangeBased" => Some(RangePolicy::MoveRangeBased),
            "Unlimited" => Some(RangePolicy::Unlimited),
            _ => None,
        }
    }

    /// Parse one step: `<action> @ <selector>` (selector defaults to Target)
    fn parse_step(src: &str) -> Option<ActionStep> {
        let (body, selector) = match src.split_once('@') {
            Some((body, sel)) => (body.trim(), Self::parse_selector(sel.trim())?),
            None => (src, TargetSelector::Target),
        };

        let mut words = body.split_whitespace();
        let kind = match words.next()? {
            "Move" => ActionKind::Move,
            "Attack" => ActionKind::Attack,
            "Heal" => {
                let rest: Vec<&str> = words.collect();
                ActionKind::Heal(Self::parse_heal(&rest)?)
            }
            "ModifyStat" => {
                let stat = match words.next()? {
                    "attack" => StatKind::Attack,
                    "health" => StatKind::Health,
                    "both" => StatKind::Both,
                    _ => return None,
                };
                let amount: i32 = words.next()?.parse().ok()?;
                ActionKind::ModifyStat { stat, amount }
            }
            "Wait" => {
                let seconds: f32 = words.next()?.parse().ok()?;
                ActionKind::Wait { seconds }
            }
            "ApplyEffect" => match words.next()? {
                "Reveal" => ActionKind::ApplyEffect(EffectKind::Reveal),
                "Conceal" => ActionKind::ApplyEffect(EffectKind::Conceal),
                _ => return None,
            },
            "ResetCounter" => ActionKind::ResetCounter(AbilityId::new(words.next()?)),
            _ => return None,
        };
        Some(ActionStep {
            kind,
            target: selector,
        })
    }

    /// Heal amounts: `3` or `50% of dealtDamage`
    fn parse_heal(words: &[&str]) -> Option<HealAmount> {
        match words {
            // a bare percentage with no context key is malformed
            [n] if !n.ends_with('%') => n.parse().ok().map(HealAmount::Literal),
            [pct, "of", key] => {
                let pct = pct.strip_suffix('%')?.parse().ok()?;
                Some(HealAmount::PercentOf {
                    pct,
                    key: key.to_string(),
                })
            }
            _ => None,
        }
    }

    fn parse_selector(src: &str) -> Option<TargetSelector> {
        match src {
            "Self" => return Some(TargetSelector::SelfUnit),
            "Target" => return Some(TargetSelector::Target),
            "TargetDirection" => return Some(TargetSelector::TargetDirection { shorten: 0 }),
            _ => {}
        }
        if let Some(rest) = src.strip_prefix("TargetDirection-") {
            let shorten = rest.parse().ok()?;
            return Some(TargetSelector::TargetDirection { shorten });
        }
        if let Some(rest) = src.strip_prefix("TargetPosition(") {
            let inner = rest.strip_suffix(')')?;
            let (dx, dy) = inner.split_once(',')?;
            return Some(TargetSelector::TargetPosition {
                dx: dx.trim().parse().ok()?,
                dy: dy.trim().parse().ok()?,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# demo roster
Name:Knight
Type:knight
Attack:3
Health:5
MoveRange:2
AttackRange:1
A:Name$ Cleave | Cond$ Distance==1 && Enemy | Range$ AttackRangeBased | Cooldown$ 2 | Steps$ Attack @ Target; Heal 50% of dealtDamage @ Self

Name:Scout
Attack:1
Health:3
MoveRange:3
AttackRange:1
FaceDown:true
A:Name$ Ambush | Range$ Custom:2 | RangeCond$ Empty | Steps$ Move @ Target; ApplyEffect Reveal @ Self
A:Name$ Rest | Auto$ TurnStart | Cond$ TurnCounter[Ambush]>0 | Range$ Unlimited | Steps$ Heal 1 @ Self
";

    #[test]
    fn test_parse_roster() {
        let set = ContentLoader::parse(SAMPLE).unwrap();
        assert_eq!(set.definitions.len(), 2);
        assert!(set.warnings.is_empty(), "warnings: {:?}", set.warnings);

        let knight = set.definition(&UnitTypeId::new("knight")).unwrap();
        assert_eq!(knight.attack, 3);
        assert_eq!(knight.max_health, 5);
        assert!(!knight.starts_face_down);

        // the Scout block has no Type line; the lowercased name is the id
        let scout = set.definition(&UnitTypeId::new("scout")).unwrap();
        assert!(scout.starts_face_down);
        assert_eq!(scout.move_range, 3);
    }

    #[test]
    fn test_parse_abilities() {
        let set = ContentLoader::parse(SAMPLE).unwrap();

        let cleave = set
            .registry
            .find(&UnitTypeId::new("knight"), &AbilityId::new("Cleave"))
            .unwrap();
        assert_eq!(cleave.cooldown, 2);
        assert_eq!(cleave.range_policy, RangePolicy::AttackRangeBased);
        assert_eq!(cleave.steps.len(), 2);
        assert_eq!(
            cleave.steps[1].kind,
            ActionKind::Heal(HealAmount::PercentOf {
                pct: 50,
                key: "dealtDamage".to_string()
            })
        );
        assert_eq!(cleave.steps[1].target, TargetSelector::SelfUnit);

        let ambush = set
            .registry
            .find(&UnitTypeId::new("scout"), &AbilityId::new("Ambush"))
            .unwrap();
        assert_eq!(ambush.range_policy, RangePolicy::Custom(2));
        assert!(ambush.range_condition.is_some());

        let rest = set
            .registry
            .find(&UnitTypeId::new("scout"), &AbilityId::new("Rest"))
            .unwrap();
        assert_eq!(rest.auto_phase, Some(AutoPhase::TurnStart));
    }

    #[test]
    fn test_selectors() {
        assert_eq!(
            ContentLoader::parse_selector("TargetPosition(1,-2)"),
            Some(TargetSelector::TargetPosition { dx: 1, dy: -2 })
        );
        assert_eq!(
            ContentLoader::parse_selector("TargetDirection-2"),
            Some(TargetSelector::TargetDirection { shorten: 2 })
        );
        assert_eq!(ContentLoader::parse_selector("Nowhere"), None);
    }

    #[test]
    fn test_bad_lines_are_warnings_not_errors() {
        let src = "\
Name:Wobbly
Attack:abc
Health:4
A:Name$ Broken | Steps$ Dance @ Target
A:Name$ Fine | Steps$ Attack @ Target
";
        let set = ContentLoader::parse(src).unwrap();
        assert_eq!(set.definitions.len(), 1);
        // bad Attack value defaulted, bad step reported, bad ability dropped
        assert!(!set.warnings.is_empty());
        assert_eq!(set.definitions[0].attack, 0);
        let wobbly = set.registry.for_type(&UnitTypeId::new("wobbly"));
        assert_eq!(wobbly.len(), 1);
        assert_eq!(wobbly[0].name.as_str(), "Fine");
    }

    #[test]
    fn test_empty_content_is_an_error() {
        assert!(ContentLoader::parse("# only comments\n").is_err());
    }
}
