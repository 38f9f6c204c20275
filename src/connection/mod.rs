//! Thin pass-through layer between the library and a live analytic engine.
//!
//! Drivers are looked up in an explicit [`DriverRegistry`] keyed by the
//! scheme embedded in the connection string, so the set of available drivers
//! is always visible at the call site. Everything here delegates to the
//! backend: statements go out unmodified, and backend errors propagate
//! unchanged.

use crate::cellset::{CellSet, RawCellSet};
use crate::error::MdxError;
use crate::rowset::{RawRowSet, RowSet};
use crate::util::timer::MdxTimer;
use hashbrown::HashMap;
use itertools::Itertools;
use log::info;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DimensionType {
    Measure,
    Time,
    Other,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, new)]
pub struct CubeData {
    pub unique_name: String,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, new)]
pub struct MeasureData {
    pub unique_name: String,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, new)]
pub struct DimensionData {
    pub unique_name: String,
    pub name: String,
    pub children: bool,
    pub dimension_type: DimensionType,
}

/// A member as listed by schema lookups. `children` is true iff the member
/// has at least one child.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, new)]
pub struct MemberData {
    pub unique_name: String,
    pub name: String,
    pub children: bool,
}

/// An open session against an analytic engine.
pub trait OlapBackend {
    /// Executes an MDX statement, returning the raw multidimensional result.
    fn execute(&mut self, statement: &str) -> Result<Box<dyn RawCellSet>, MdxError>;
    /// Executes a drillthrough statement, returning the raw tabular result.
    fn drillthrough(&mut self, statement: &str) -> Result<Box<dyn RawRowSet>, MdxError>;
    fn cubes(&mut self) -> Result<Vec<CubeData>, MdxError>;
    fn measures(&mut self, cube_unique_name: &str) -> Result<Vec<MeasureData>, MdxError>;
    fn dimensions(&mut self, cube_unique_name: &str) -> Result<Vec<DimensionData>, MdxError>;
    fn member_children(
        &mut self,
        cube_unique_name: &str,
        member_unique_name: &str,
    ) -> Result<Vec<MemberData>, MdxError>;
}

/// Creates backend sessions from connection strings.
pub trait OlapDriver {
    fn connect(&self, connection_string: &str) -> Result<Box<dyn OlapBackend>, MdxError>;
}

/// Explicit scheme -> driver table, passed into [`Connection::open`].
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Box<dyn OlapDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: Into<String>>(&mut self, scheme: S, driver: Box<dyn OlapDriver>) {
        self.drivers.insert(scheme.into(), driver);
    }

    fn get(&self, scheme: &str) -> Option<&dyn OlapDriver> {
        self.drivers.get(scheme).map(Box::as_ref)
    }
}

/// A connection to an analytic engine, with per-cube schema caches.
pub struct Connection {
    backend: Box<dyn OlapBackend>,
    cubes: Option<Vec<CubeData>>,
    measures: HashMap<String, Vec<MeasureData>>,
    dimensions: HashMap<String, Vec<DimensionData>>,
}

impl Connection {
    /// Opens a connection by extracting the driver scheme from
    /// `connection_string` (e.g. `mondrian` from `jdbc:mondrian:...`) and
    /// delegating to the registered driver.
    pub fn open(registry: &DriverRegistry, connection_string: &str) -> Result<Self, MdxError> {
        let scheme = extract_scheme(connection_string)?;
        let driver =
            registry.get(scheme).ok_or_else(|| MdxError::UnknownDriver(scheme.to_owned()))?;
        let backend = driver.connect(connection_string)?;
        Ok(Self {
            backend,
            cubes: None,
            measures: HashMap::new(),
            dimensions: HashMap::new(),
        })
    }

    /// Executes an MDX statement and wraps the raw result for shaping.
    pub fn execute(&mut self, statement: &str) -> Result<CellSet, MdxError> {
        let timer = MdxTimer::now();
        let raw = self.backend.execute(statement)?;
        info!("[Execute][{}] {}", timer.elapsed().to_millis_string(), statement);
        Ok(CellSet::new(raw))
    }

    /// Executes a drillthrough statement and wraps the raw tabular result.
    pub fn drillthrough(&mut self, statement: &str) -> Result<RowSet, MdxError> {
        let timer = MdxTimer::now();
        let raw = self.backend.drillthrough(statement)?;
        info!("[Drillthrough][{}] {}", timer.elapsed().to_millis_string(), statement);
        Ok(RowSet::new(raw))
    }

    /// Lists the cubes of the connected schema. Cached for the connection
    /// lifetime.
    pub fn cubes(&mut self) -> Result<&[CubeData], MdxError> {
        if self.cubes.is_none() {
            self.cubes = Some(self.backend.cubes()?);
        }
        Ok(self.cubes.as_deref().unwrap_or_default())
    }

    /// Lists the measures of `cube_unique_name`. Cached per cube.
    pub fn measures(&mut self, cube_unique_name: &str) -> Result<&[MeasureData], MdxError> {
        if !self.measures.contains_key(cube_unique_name) {
            let measures = self.backend.measures(cube_unique_name)?;
            self.measures.insert(cube_unique_name.to_owned(), measures);
        }
        Ok(&self.measures[cube_unique_name])
    }

    /// Lists the dimensions of `cube_unique_name`. Cached per cube.
    pub fn dimensions(&mut self, cube_unique_name: &str) -> Result<&[DimensionData], MdxError> {
        if !self.dimensions.contains_key(cube_unique_name) {
            let dimensions = self.backend.dimensions(cube_unique_name)?;
            self.dimensions.insert(cube_unique_name.to_owned(), dimensions);
        }
        Ok(&self.dimensions[cube_unique_name])
    }

    /// Lists the children of `member`, or the cube's dimensions when no
    /// member is given.
    pub fn children_lookup(
        &mut self,
        cube_unique_name: &str,
        member: Option<&str>,
    ) -> Result<Vec<MemberData>, MdxError> {
        match member {
            None => Ok(self
                .dimensions(cube_unique_name)?
                .iter()
                .map(|dimension| {
                    MemberData::new(
                        dimension.unique_name.clone(),
                        dimension.name.clone(),
                        dimension.children,
                    )
                })
                .collect_vec()),
            Some(member) => self.backend.member_children(cube_unique_name, member),
        }
    }
}

/// The driver scheme is the second colon-delimited token of the connection
/// string, e.g. `mondrian` in `jdbc:mondrian:Jdbc=...`.
fn extract_scheme(connection_string: &str) -> Result<&str, MdxError> {
    let mut parts = connection_string.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(protocol), Some(scheme), Some(_))
            if !protocol.is_empty()
                && !scheme.is_empty()
                && scheme.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            Ok(scheme)
        }
        _ => Err(MdxError::InvalidConnectionString(connection_string.to_owned())),
    }
}
