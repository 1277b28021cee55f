//! Dataset construction from a stored table.

use crate::error::{TrainingError, TrainingResult};
use crate::table::Table;
use aeris_store::ObjectStore;
use tracing::debug;

/// Transformed-target column names, in selection priority order.
pub const TRANSFORMED_TARGET_CANDIDATES: [&str; 2] = ["pm25_boxcox", "pm25_log"];

/// The untransformed target column. Retained for eventual inverse-transform
/// and evaluation; not consumed by the search loop.
pub const RAW_TARGET: &str = "pm25";

/// Feature matrix plus target vector, constructed once per job run and
/// immutable thereafter.
///
/// Invariants: `features`, `target`, and `target_original` have the same row
/// count; the matrix contains neither target column.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    /// Row-major feature matrix.
    pub features: Vec<Vec<f64>>,
    /// Transformed target used for fitting.
    pub target: Vec<f64>,
    /// Which transformed-target column was selected.
    pub target_name: String,
    /// Untransformed `pm25` values.
    pub target_original: Vec<f64>,
}

impl Dataset {
    pub fn rows(&self) -> usize {
        self.target.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Loads the serialized table at `table_path` and splits it into a feature
/// matrix and target vectors. Read-only with respect to the store.
pub fn load(store: &dyn ObjectStore, table_path: &str) -> TrainingResult<Dataset> {
    let bytes = store.read(table_path)?;
    let table = Table::from_slice(&bytes)?;
    from_table(&table)
}

/// Splits an in-memory table by the target-selection priority rule.
pub fn from_table(table: &Table) -> TrainingResult<Dataset> {
    let target_name = TRANSFORMED_TARGET_CANDIDATES
        .iter()
        .find(|name| table.column(name).is_some())
        .ok_or_else(|| {
            TrainingError::Schema(format!(
                "no transformed target column; expected one of {:?}",
                TRANSFORMED_TARGET_CANDIDATES
            ))
        })?;
    let target = table.column(target_name).expect("candidate just found").values.clone();

    let target_original = table
        .column(RAW_TARGET)
        .ok_or_else(|| TrainingError::Schema(format!("missing {RAW_TARGET} column")))?
        .values
        .clone();

    let feature_columns: Vec<_> = table
        .columns
        .iter()
        .filter(|c| c.name != *target_name && c.name != RAW_TARGET)
        .collect();
    if feature_columns.is_empty() {
        return Err(TrainingError::Schema("table has no feature columns".to_string()));
    }

    let rows = table.rows();
    let mut features = Vec::with_capacity(rows);
    for row in 0..rows {
        features.push(feature_columns.iter().map(|c| c.values[row]).collect());
    }

    debug!(
        rows,
        features = feature_columns.len(),
        target = %target_name,
        "dataset loaded"
    );

    Ok(Dataset {
        feature_names: feature_columns.iter().map(|c| c.name.clone()).collect(),
        features,
        target,
        target_name: (*target_name).to_string(),
        target_original,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use aeris_store::MemoryStore;

    fn table(names: &[&str]) -> Table {
        Table::new(
            names
                .iter()
                .map(|n| Column { name: (*n).to_string(), values: vec![1.0, 2.0, 3.0] })
                .collect(),
        )
    }

    #[test]
    fn test_boxcox_takes_priority_over_log() {
        let dataset = from_table(&table(&["f1", "pm25", "pm25_log", "pm25_boxcox"])).unwrap();
        assert_eq!(dataset.target_name, "pm25_boxcox");
        // The losing candidate stays in the feature matrix.
        assert_eq!(dataset.feature_names, vec!["f1", "pm25_log"]);
    }

    #[test]
    fn test_log_target_selected_when_boxcox_absent() {
        let dataset = from_table(&table(&["f1", "pm25", "pm25_log"])).unwrap();
        assert_eq!(dataset.target_name, "pm25_log");
        assert_eq!(dataset.feature_names, vec!["f1"]);
    }

    #[test]
    fn test_missing_both_transformed_targets_is_schema_error() {
        let err = from_table(&table(&["f1", "f2", "pm25"])).unwrap_err();
        assert!(matches!(err, TrainingError::Schema(_)));
    }

    #[test]
    fn test_missing_raw_target_is_schema_error() {
        let err = from_table(&table(&["f1", "f2", "pm25_boxcox"])).unwrap_err();
        assert!(matches!(err, TrainingError::Schema(_)));
    }

    #[test]
    fn test_targets_never_in_feature_matrix() {
        let dataset = from_table(&table(&["f1", "f2", "pm25", "pm25_boxcox"])).unwrap();
        assert!(!dataset.feature_names.contains(&"pm25".to_string()));
        assert!(!dataset.feature_names.contains(&"pm25_boxcox".to_string()));
        assert_eq!(dataset.rows(), 3);
        assert_eq!(dataset.features[0].len(), dataset.n_features());
    }

    #[test]
    fn test_load_reads_from_store() {
        let store = MemoryStore::new();
        store.put("processed/train/data.json", &table(&["f1", "pm25", "pm25_log"]).to_bytes().unwrap());
        let dataset = load(&store, "processed/train/data.json").unwrap();
        assert_eq!(dataset.rows(), 3);
    }

    #[test]
    fn test_load_missing_table_propagates_not_found() {
        let store = MemoryStore::new();
        let err = load(&store, "missing.json").unwrap_err();
        assert!(matches!(err, TrainingError::Store(aeris_store::StoreError::NotFound(_))));
    }
}
