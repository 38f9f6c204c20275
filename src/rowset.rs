//! Reshapes raw tabular (drillthrough) results into column descriptors and
//! flat string rows. The forward-only row cursor stays behind the
//! [`RawRowSet`] boundary trait.

use itertools::Itertools;

/// Boundary to the driver's tabular result object.
pub trait RawRowSet {
    fn column_count(&self) -> usize;
    fn column_id(&self, column: usize) -> String;
    fn column_label(&self, column: usize) -> String;
    /// Moves the cursor to the next row, returning false once exhausted.
    fn advance(&mut self) -> bool;
    /// The string value of `column` at the current cursor row.
    fn string_value(&self, column: usize) -> Option<String>;
}

/// A result column: its identifier and display label.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, new)]
pub struct ColumnData {
    pub id: String,
    pub name: String,
}

/// A shaped view over one raw tabular result handle.
///
/// Columns and rows are computed once per handle and memoized; reading the
/// values drains the forward-only cursor, so a fresh handle is required for a
/// fresh read. Not thread-safe; both accessors take `&mut self`.
#[derive(new)]
pub struct RowSet {
    raw: Box<dyn RawRowSet>,
    #[new(default)]
    columns: Option<Vec<ColumnData>>,
    #[new(default)]
    values: Option<Vec<Vec<Option<String>>>>,
}

impl RowSet {
    /// Returns the column descriptors, in column order.
    pub fn columns(&mut self) -> &[ColumnData] {
        let raw = &self.raw;
        self.columns.get_or_insert_with(|| {
            (0..raw.column_count())
                .map(|column| ColumnData::new(raw.column_id(column), raw.column_label(column)))
                .collect_vec()
        })
    }

    /// Returns all rows as per-column string values, draining the cursor on
    /// first call.
    pub fn values(&mut self) -> &[Vec<Option<String>>] {
        if self.values.is_none() {
            let column_count = self.raw.column_count();
            let mut rows = Vec::new();
            while self.raw.advance() {
                rows.push(
                    (0..column_count).map(|column| self.raw.string_value(column)).collect_vec(),
                );
            }
            self.values = Some(rows);
        }
        self.values.as_deref().unwrap_or_default()
    }
}
