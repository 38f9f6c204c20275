//! Reshapes raw multidimensional results into axis metadata and dense value
//! grids. The raw result handle stays behind the [`RawCellSet`] boundary
//! trait; any blocking cell fetches happen inside the driver, not here.

use crate::error::MdxError;
use hashbrown::HashMap;
use itertools::Itertools;

/// Axis kinds derived from olap4j axis ordinals. Ordinals past `CHAPTERS`
/// report as `Sections`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AxisKind {
    Slicer,
    Columns,
    Rows,
    Pages,
    Chapters,
    Sections,
}

impl AxisKind {
    pub fn from_ordinal(ordinal: i32) -> Self {
        match ordinal {
            -1 => AxisKind::Slicer,
            0 => AxisKind::Columns,
            1 => AxisKind::Rows,
            2 => AxisKind::Pages,
            3 => AxisKind::Chapters,
            _ => AxisKind::Sections,
        }
    }
}

/// Which cell representation to fetch from the raw result.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ValueRepr {
    /// The typed scalar value.
    Value,
    /// The engine-formatted display string.
    FormattedValue,
}

impl Default for ValueRepr {
    fn default() -> Self {
        ValueRepr::FormattedValue
    }
}

/// A scalar cell value in either representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Text(String),
    Number(f64),
    Empty,
}

/// A member as exposed by the raw result, before shaping.
#[derive(Clone, Debug, Eq, PartialEq, new)]
pub struct RawMember {
    pub caption: String,
    pub unique_name: String,
    pub child_count: usize,
}

/// A member descriptor along an axis position. `drillable` is true iff the
/// member has at least one child.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, new)]
pub struct Member {
    pub name: String,
    pub unique_name: String,
    pub drillable: bool,
}

/// One result axis: its kind and the ordered member tuples at each position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, new)]
pub struct AxisData {
    pub axis: AxisKind,
    pub positions: Vec<Vec<Member>>,
}

/// Boundary to the driver's multidimensional result object.
pub trait RawCellSet {
    fn axis_count(&self) -> usize;
    fn axis_ordinal(&self, axis: usize) -> i32;
    fn position_count(&self, axis: usize) -> usize;
    fn position_members(&self, axis: usize, position: usize) -> Vec<RawMember>;
    /// Fetches the scalar at `coordinates` (`[column, row]` for two-axis
    /// results) in the requested representation.
    fn cell_value(&self, coordinates: &[usize], representation: ValueRepr) -> ScalarValue;
}

/// A shaped view over one raw result handle.
///
/// Axis metadata and value grids are computed once per handle and memoized.
/// Grids are memoized per representation: requesting formatted values after
/// raw values recomputes rather than returning the first-computed matrix.
/// Not thread-safe; both accessors take `&mut self`.
#[derive(new)]
pub struct CellSet {
    raw: Box<dyn RawCellSet>,
    #[new(default)]
    axes: Option<Vec<AxisData>>,
    #[new(default)]
    values: HashMap<ValueRepr, Vec<Vec<ScalarValue>>>,
}

impl CellSet {
    /// Returns the axis descriptors of the raw result, in axis order.
    pub fn axes(&mut self) -> &[AxisData] {
        let raw = &self.raw;
        self.axes.get_or_insert_with(|| build_axes(raw.as_ref()))
    }

    /// Returns the dense row-major value grid, sized
    /// `(row positions x column positions)`. Fails unless the raw result
    /// exposes exactly two axes. Empty display strings normalize to `"0"`.
    pub fn values(&mut self, representation: ValueRepr) -> Result<&[Vec<ScalarValue>], MdxError> {
        let axis_count = self.raw.axis_count();
        if axis_count != 2 {
            return Err(MdxError::UnsupportedDimensionality(axis_count));
        }

        if !self.values.contains_key(&representation) {
            let grid = build_grid(self.raw.as_ref(), representation);
            self.values.insert(representation, grid);
        }
        Ok(&self.values[&representation])
    }
}

fn build_axes(raw: &dyn RawCellSet) -> Vec<AxisData> {
    (0..raw.axis_count())
        .map(|axis| {
            let positions = (0..raw.position_count(axis))
                .map(|position| {
                    raw.position_members(axis, position)
                        .into_iter()
                        .map(|member| {
                            Member::new(
                                member.caption,
                                member.unique_name,
                                member.child_count > 0,
                            )
                        })
                        .collect_vec()
                })
                .collect_vec();
            AxisData::new(AxisKind::from_ordinal(raw.axis_ordinal(axis)), positions)
        })
        .collect_vec()
}

fn build_grid(raw: &dyn RawCellSet, representation: ValueRepr) -> Vec<Vec<ScalarValue>> {
    let columns = raw.position_count(0);
    let rows = raw.position_count(1);

    let mut grid = vec![vec![ScalarValue::Empty; columns]; rows];
    for column in 0..columns {
        for row in 0..rows {
            let mut value = raw.cell_value(&[column, row], representation);
            // Engines report empty cells as empty display strings.
            if let ScalarValue::Text(text) = &value {
                if text.is_empty() {
                    value = ScalarValue::Text("0".to_owned());
                }
            }
            grid[row][column] = value;
        }
    }
    grid
}
