//! [`Calendar`]: the loaded collection of entity days for one grid.
//!
//! Backed by a persistent ordered map, so cloning a calendar is O(1) and the
//! clone is structurally independent: a write to either side copies only the
//! touched path. Snapshots rely on this instead of serializing the data.

use im::OrdMap;
use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::row::{CalendarRow, CellKey};
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq)]
pub struct Calendar<R: CalendarRow> {
    rows: OrdMap<CellKey, R>,
}

impl<R: CalendarRow> Default for Calendar<R> {
    fn default() -> Self {
        Self {
            rows: OrdMap::new(),
        }
    }
}

impl<R: CalendarRow> Calendar<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a calendar from fetched rows.
    ///
    /// Fails with [`CoreError::Conflict`] when two rows share an
    /// `(entity, date)` key, since every cell must be addressable.
    pub fn from_rows(rows: impl IntoIterator<Item = R>) -> Result<Self, CoreError> {
        let mut map = OrdMap::new();
        for row in rows {
            let key = row.key();
            if map.insert(key, row).is_some() {
                return Err(CoreError::Conflict(format!(
                    "Duplicate {} row for cell {key}",
                    R::GRID
                )));
            }
        }
        Ok(Self { rows: map })
    }

    pub fn get(&self, key: &CellKey) -> Option<&R> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &CellKey) -> bool {
        self.rows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows ordered by entity, then date.
    pub fn rows(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    /// Distinct entity ids, ascending.
    pub fn entity_ids(&self) -> Vec<DbId> {
        let mut ids: Vec<DbId> = self.rows.keys().map(|k| k.entity_id).collect();
        ids.dedup();
        ids
    }

    /// Mutable access for the store; the persistent map copies the path on
    /// write so any outstanding clone keeps its values.
    pub(crate) fn get_mut(&mut self, key: &CellKey) -> Option<&mut R> {
        self.rows.get_mut(key)
    }
}

impl<R: CalendarRow> Serialize for Calendar<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date;
    use crate::inventory::{InventoryDay, InventoryPatch};
    use assert_matches::assert_matches;

    fn day(room: DbId, date: &str, total: u32) -> InventoryDay {
        InventoryDay::new(room, parse_date(date).unwrap(), total, 0, 0)
    }

    #[test]
    fn rows_come_back_in_grid_order() {
        let cal = Calendar::from_rows(vec![
            day(2, "2024-01-02", 1),
            day(1, "2024-01-02", 1),
            day(2, "2024-01-01", 1),
            day(1, "2024-01-01", 1),
        ])
        .unwrap();
        let keys: Vec<String> = cal.rows().map(|r| r.key().to_string()).collect();
        assert_eq!(
            keys,
            vec!["1-2024-01-01", "1-2024-01-02", "2-2024-01-01", "2-2024-01-02"]
        );
        assert_eq!(cal.entity_ids(), vec![1, 2]);
    }

    #[test]
    fn duplicate_cells_are_rejected() {
        let result = Calendar::from_rows(vec![day(1, "2024-01-01", 3), day(1, "2024-01-01", 4)]);
        assert_matches!(result, Err(CoreError::Conflict(_)));
    }

    #[test]
    fn clones_are_structurally_independent() {
        let mut live = Calendar::from_rows(vec![day(1, "2024-01-01", 10)]).unwrap();
        let copy = live.clone();
        let key = CellKey::new(1, parse_date("2024-01-01").unwrap());

        live.get_mut(&key)
            .unwrap()
            .apply_patch(&InventoryPatch::total(4));

        assert_eq!(live.get(&key).unwrap().total, 4);
        assert_eq!(copy.get(&key).unwrap().total, 10);
    }

    #[test]
    fn serializes_as_row_array() {
        let cal = Calendar::from_rows(vec![day(3, "2024-01-01", 2)]).unwrap();
        let json = serde_json::to_value(&cal).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["roomId"], 3);
    }
}
