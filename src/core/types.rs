//! Strongly-typed wrappers for game concepts
//!
//! Newtypes prevent type confusion between the various identifiers in play:
//! players, unit instances, unit types, and ability names are all distinct
//! concepts that must not be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two players in a match
///
/// Matches are always two-player: owner 0 (the player) and owner 1 (the
/// enemy). The turn phase machine alternates between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(u8);

impl PlayerId {
    pub const PLAYER: PlayerId = PlayerId(0);
    pub const ENEMY: PlayerId = PlayerId(1);

    pub fn new(id: u8) -> Self {
        debug_assert!(id <= 1, "two-player matches only");
        PlayerId(id)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// The other player
    pub fn opponent(&self) -> PlayerId {
        PlayerId(1 - self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique ID for a unit instance on the board
///
/// IDs are allocated by the board and stay stable for the unit's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    pub fn new(id: u32) -> Self {
        UnitId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable unit-type identifier (e.g. "footman", "cleric")
///
/// Units reference their abilities indirectly through this id via the
/// ability registry, never by copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitTypeId(String);

impl UnitTypeId {
    pub fn new(s: impl Into<String>) -> Self {
        UnitTypeId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UnitTypeId {
    fn from(s: String) -> Self {
        UnitTypeId(s)
    }
}

impl From<&str> for UnitTypeId {
    fn from(s: &str) -> Self {
        UnitTypeId(s.to_string())
    }
}

/// Ability name, used as the cooldown ledger key and in `TurnCounter[..]`
/// expressions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityId(String);

impl AbilityId {
    pub fn new(s: impl Into<String>) -> Self {
        AbilityId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AbilityId {
    fn from(s: String) -> Self {
        AbilityId(s)
    }
}

impl From<&str> for AbilityId {
    fn from(s: &str) -> Self {
        AbilityId(s.to_string())
    }
}
