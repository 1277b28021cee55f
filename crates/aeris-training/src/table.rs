//! Serialized feature table format.

use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};

/// A named column of numeric values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Column-oriented table, the on-store representation of the
/// feature-engineered training data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Decodes a table from stored bytes and checks its shape.
    pub fn from_slice(bytes: &[u8]) -> TrainingResult<Self> {
        let table: Table = serde_json::from_slice(bytes)
            .map_err(|e| TrainingError::Schema(format!("malformed table: {e}")))?;
        table.validate()?;
        Ok(table)
    }

    pub fn to_bytes(&self) -> TrainingResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// All columns must have the same row count and distinct names.
    pub fn validate(&self) -> TrainingResult<()> {
        if self.columns.is_empty() {
            return Err(TrainingError::Schema("table has no columns".to_string()));
        }
        let rows = self.columns[0].values.len();
        for col in &self.columns {
            if col.values.len() != rows {
                return Err(TrainingError::Schema(format!(
                    "column {} has {} rows, expected {}",
                    col.name,
                    col.values.len(),
                    rows
                )));
            }
        }
        let mut names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err(TrainingError::Schema("duplicate column name".to_string()));
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let table = Table::new(vec![
            Column { name: "f1".to_string(), values: vec![1.0, 2.0] },
            Column { name: "pm25".to_string(), values: vec![10.0, 20.0] },
        ]);
        let bytes = table.to_bytes().unwrap();
        let decoded = Table::from_slice(&bytes).unwrap();
        assert_eq!(decoded.rows(), 2);
        assert_eq!(decoded.column("pm25").unwrap().values, vec![10.0, 20.0]);
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let table = Table::new(vec![
            Column { name: "a".to_string(), values: vec![1.0, 2.0] },
            Column { name: "b".to_string(), values: vec![1.0] },
        ]);
        assert!(matches!(table.validate(), Err(TrainingError::Schema(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let table = Table::new(vec![
            Column { name: "a".to_string(), values: vec![1.0] },
            Column { name: "a".to_string(), values: vec![2.0] },
        ]);
        assert!(matches!(table.validate(), Err(TrainingError::Schema(_))));
    }

    #[test]
    fn test_garbage_bytes_are_schema_error() {
        assert!(matches!(Table::from_slice(b"not json"), Err(TrainingError::Schema(_))));
    }
}
