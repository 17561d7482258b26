//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Table status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
    Maintenance,
    Cleaning,
}

impl TableStatus {
    /// Can be given to a new dine-in order
    pub fn is_seatable(&self) -> bool {
        matches!(self, TableStatus::Available | TableStatus::Reserved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "available",
            TableStatus::Occupied => "occupied",
            TableStatus::Reserved => "reserved",
            TableStatus::Maintenance => "maintenance",
            TableStatus::Cleaning => "cleaning",
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dining table entity (桌台)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiningTable {
    pub id: String,
    pub restaurant_id: String,
    pub area_id: String,
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub status: TableStatus,
}

/// Upsert payload pushed by the table/area collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableUpsert {
    pub area_id: String,
    pub name: String,
    #[serde(default)]
    pub capacity: u32,
    /// Only applied when the table is new
    #[serde(default)]
    pub status: Option<TableStatus>,
}

/// Conditional status change by staff
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableStatusChange {
    pub expected: TableStatus,
    pub target: TableStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seatable() {
        assert!(TableStatus::Available.is_seatable());
        assert!(TableStatus::Reserved.is_seatable());
        assert!(!TableStatus::Occupied.is_seatable());
        assert!(!TableStatus::Maintenance.is_seatable());
        assert!(!TableStatus::Cleaning.is_seatable());
    }

    #[test]
    fn test_status_defaults_to_available() {
        let table: DiningTable = serde_json::from_str(
            r#"{"id":"t-1","restaurant_id":"r-1","area_id":"a-1","name":"T1","capacity":4}"#,
        )
        .unwrap();
        assert_eq!(table.status, TableStatus::Available);
    }
}
