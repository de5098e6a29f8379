//! Core tabular types shared by the extract and transform stages.
//!
//! Extraction produces a [`DataSet`] whose [`Schema`] is the source header row (every field
//! [`DataType::Utf8`]) and whose cells are raw [`Value::Utf8`] text or [`Value::Null`].
//! The transform stage reads that raw table against the typed column catalog in
//! [`crate::processing::columns`].

/// Logical data type for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// UTF-8 string.
    Utf8,
}

impl DataType {
    /// SQL column affinity used for this type in the store.
    pub fn sql_affinity(self) -> &'static str {
        match self {
            Self::Int64 => "INTEGER",
            Self::Float64 => "REAL",
            Self::Utf8 => "TEXT",
        }
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the shape of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A single value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
    /// Source line of each row (header is line 1), parallel to `rows`.
    row_lines: Vec<usize>,
}

impl DataSet {
    /// Create a dataset from schema and rows that directly follow a one-line header.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        let row_lines = (2..rows.len() + 2).collect();
        Self {
            schema,
            rows,
            row_lines,
        }
    }

    /// Create a dataset whose rows came from the given source lines.
    ///
    /// Lines beyond `rows.len()` are ignored; missing ones are numbered as if contiguous.
    pub fn with_row_lines(schema: Schema, rows: Vec<Vec<Value>>, mut row_lines: Vec<usize>) -> Self {
        row_lines.truncate(rows.len());
        while row_lines.len() < rows.len() {
            let next = row_lines.last().map_or(2, |l| l + 1);
            row_lines.push(next);
        }
        Self {
            schema,
            rows,
            row_lines,
        }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Source line number of row `idx`.
    pub fn source_line(&self, idx: usize) -> usize {
        self.row_lines.get(idx).copied().unwrap_or(idx + 2)
    }

    /// Create a new dataset by applying `mapper` to every cell.
    ///
    /// The returned dataset preserves the original schema.
    pub fn map_values<F>(&self, mut mapper: F) -> Self
    where
        F: FnMut(&Value) -> Value,
    {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(&mut mapper).collect())
            .collect();

        Self {
            schema: self.schema.clone(),
            rows,
            row_lines: self.row_lines.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataSet {
        DataSet::new(
            Schema::new(vec![
                Field::new("Player", DataType::Utf8),
                Field::new("PTS", DataType::Utf8),
            ]),
            vec![
                vec![Value::Utf8("A".into()), Value::Utf8("-".into())],
                vec![Value::Utf8("B".into()), Value::Null],
            ],
        )
    }

    #[test]
    fn index_of_finds_fields_by_exact_name() {
        let ds = sample();
        assert_eq!(ds.schema.index_of("PTS"), Some(1));
        assert_eq!(ds.schema.index_of("pts"), None);
        assert_eq!(ds.schema.field_names().collect::<Vec<_>>(), vec!["Player", "PTS"]);
    }

    #[test]
    fn map_values_preserves_shape() {
        let ds = sample();
        let mapped = ds.map_values(|v| match v.as_str() {
            Some("-") => Value::Null,
            _ => v.clone(),
        });
        assert_eq!(mapped.row_count(), 2);
        assert_eq!(mapped.schema, ds.schema);
        assert!(mapped.rows[0][1].is_null());
        assert_eq!(mapped.rows[0][0], Value::Utf8("A".into()));
    }

    #[test]
    fn source_lines_default_to_contiguous_and_survive_mapping() {
        let ds = sample();
        assert_eq!((ds.source_line(0), ds.source_line(1)), (2, 3));

        let gappy = DataSet::with_row_lines(ds.schema.clone(), ds.rows.clone(), vec![2, 5]);
        let mapped = gappy.map_values(Value::clone);
        assert_eq!(mapped.source_line(1), 5);
    }
}
