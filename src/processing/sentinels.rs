//! Missing-value sentinel handling.

use crate::types::{DataSet, Value};

/// Replace every cell equal to one of `sentinels` with [`Value::Null`].
///
/// Returns the rewritten dataset and the number of replaced cells. A literal `0` is never a
/// sentinel unless configured as one.
pub fn normalize_nulls(dataset: &DataSet, sentinels: &[String]) -> (DataSet, usize) {
    let mut replaced = 0usize;
    let out = dataset.map_values(|v| match v.as_str() {
        Some(s) if sentinels.iter().any(|t| t == s) => {
            replaced += 1;
            Value::Null
        }
        _ => v.clone(),
    });
    (out, replaced)
}
