#[derive(Debug)]
pub enum MdxError {
    Generic(String),
    MalformedIdentifier(String),
    UnsupportedDimensionality(usize),
    InvalidConnectionString(String),
    UnknownDriver(String),
    Driver(String),
}

impl std::fmt::Display for MdxError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MdxError::Generic(msg) => write!(f, "[MdxError] {}", msg)?,
            MdxError::MalformedIdentifier(identifier) => {
                write!(
                    f,
                    "[QueryBuilderError] No bracketed hierarchy segment in identifier '{}'",
                    identifier
                )?;
            }
            MdxError::UnsupportedDimensionality(axes) => {
                write!(
                    f,
                    "[CellSetError] Value grids require results with exactly 2 axes, found {}",
                    axes
                )?;
            }
            MdxError::InvalidConnectionString(connection_string) => {
                write!(
                    f,
                    "[ConnectionError] Could not extract a driver scheme from '{}'",
                    connection_string
                )?;
            }
            MdxError::UnknownDriver(scheme) => {
                write!(f, "[ConnectionError] No driver registered for scheme '{}'", scheme)?;
            }
            MdxError::Driver(msg) => write!(f, "[DriverError] {}", msg)?,
        }
        Ok(())
    }
}
