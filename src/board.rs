//! Board state: the authoritative position-to-unit mapping
//!
//! All unit mutation flows through this structure; the action executor and
//! phase logic are its only writers.

use crate::core::{PlayerId, Position, Unit, UnitId, UnitTypeId};
use crate::{Result, SkirmishError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The battle grid and every unit on it
///
/// Units live in a BTreeMap for deterministic iteration order; the occupancy
/// index is a hash map that is only ever probed, never iterated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardState {
    width: i32,
    height: i32,
    units: BTreeMap<UnitId, Unit>,
    occupancy: FxHashMap<Position, UnitId>,
    next_unit_id: u32,
}

impl BoardState {
    pub fn new(width: i32, height: i32) -> Self {
        BoardState {
            width,
            height,
            units: BTreeMap::new(),
            occupancy: FxHashMap::default(),
            next_unit_id: 0,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// In bounds and unoccupied
    pub fn is_empty(&self, pos: Position) -> bool {
        self.in_bounds(pos) && !self.occupancy.contains_key(&pos)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.occupancy.contains_key(&pos)
    }

    /// Spawn a new unit onto an empty cell
    pub fn spawn(
        &mut self,
        type_id: UnitTypeId,
        name: String,
        attack: i32,
        max_health: i32,
        move_range: i32,
        attack_range: i32,
        owner: PlayerId,
        pos: Position,
    ) -> Result<UnitId> {
        if !self.in_bounds(pos) {
            return Err(SkirmishError::OutOfBounds(pos.x, pos.y));
        }
        if self.occupancy.contains_key(&pos) {
            return Err(SkirmishError::CellOccupied(pos.x, pos.y));
        }

        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id += 1;

        let unit = Unit::new(
            id,
            type_id,
            name,
            attack,
            max_health,
            move_range,
            attack_range,
            owner,
            pos,
        );
        self.units.insert(id, unit);
        self.occupancy.insert(pos, id);
        Ok(id)
    }

    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.units
            .get(&id)
            .ok_or(SkirmishError::UnitNotFound(id.as_u32()))
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units
            .get_mut(&id)
            .ok_or(SkirmishError::UnitNotFound(id.as_u32()))
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    pub fn unit_id_at(&self, pos: Position) -> Option<UnitId> {
        self.occupancy.get(&pos).copied()
    }

    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.unit_id_at(pos).and_then(|id| self.units.get(&id))
    }

    /// Relocate a unit to an empty destination cell
    pub fn move_unit(&mut self, id: UnitId, to: Position) -> Result<()> {
        if !self.in_bounds(to) {
            return Err(SkirmishError::OutOfBounds(to.x, to.y));
        }
        if self.occupancy.contains_key(&to) {
            return Err(SkirmishError::CellOccupied(to.x, to.y));
        }
        let from = self.unit(id)?.position;
        self.occupancy.remove(&from);
        self.occupancy.insert(to, id);
        self.units
            .get_mut(&id)
            .expect("unit checked above")
            .position = to;
        Ok(())
    }

    /// Remove a unit from the board (death or despawn)
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(&id)?;
        self.occupancy.remove(&unit.position);
        Some(unit)
    }

    /// All units, in stable id order
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn units_of(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.owner == owner)
    }

    /// Every cell of the board in row-major scan order
    ///
    /// Range resolution and automatic-ability firing iterate this order so
    /// results are deterministic across runs.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width;
        let height = self.height;
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_basic(board: &mut BoardState, owner: PlayerId, pos: Position) -> UnitId {
        board
            .spawn(
                UnitTypeId::new("footman"),
                "Footman".to_string(),
                2,
                5,
                2,
                1,
                owner,
                pos,
            )
            .unwrap()
    }

    #[test]
    fn test_spawn_and_lookup() {
        let mut board = BoardState::new(4, 6);
        let pos = Position::new(1, 1);
        let id = spawn_basic(&mut board, PlayerId::PLAYER, pos);

        assert_eq!(board.unit(id).unwrap().position, pos);
        assert_eq!(board.unit_id_at(pos), Some(id));
        assert!(!board.is_empty(pos));
        assert!(board.is_empty(Position::new(0, 0)));
    }

    #[test]
    fn test_spawn_rejects_occupied_and_out_of_bounds() {
        let mut board = BoardState::new(4, 6);
        let pos = Position::new(1, 1);
        spawn_basic(&mut board, PlayerId::PLAYER, pos);

        assert!(board
            .spawn(
                UnitTypeId::new("footman"),
                "Footman".to_string(),
                2,
                5,
                2,
                1,
                PlayerId::ENEMY,
                pos,
            )
            .is_err());
        assert!(board
            .spawn(
                UnitTypeId::new("footman"),
                "Footman".to_string(),
                2,
                5,
                2,
                1,
                PlayerId::ENEMY,
                Position::new(9, 9),
            )
            .is_err());
    }

    #[test]
    fn test_move_unit_updates_occupancy() {
        let mut board = BoardState::new(4, 6);
        let from = Position::new(1, 1);
        let to = Position::new(2, 1);
        let id = spawn_basic(&mut board, PlayerId::PLAYER, from);

        board.move_unit(id, to).unwrap();
        assert_eq!(board.unit(id).unwrap().position, to);
        assert!(board.is_empty(from));
        assert_eq!(board.unit_id_at(to), Some(id));

        let other = spawn_basic(&mut board, PlayerId::ENEMY, from);
        assert!(board.move_unit(other, to).is_err());
    }

    #[test]
    fn test_remove_clears_cell() {
        let mut board = BoardState::new(4, 6);
        let pos = Position::new(1, 1);
        let id = spawn_basic(&mut board, PlayerId::PLAYER, pos);

        let removed = board.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(board.is_empty(pos));
        assert!(board.unit(id).is_err());
    }

    #[test]
    fn test_scan_order_is_row_major() {
        let board = BoardState::new(2, 2);
        let scanned: Vec<Position> = board.positions().collect();
        assert_eq!(
            scanned,
            vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(0, 1),
                Position::new(1, 1),
            ]
        );
    }
}
