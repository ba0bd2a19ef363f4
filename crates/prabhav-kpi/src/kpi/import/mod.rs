mod parser;

use std::io::Read;
use std::path::Path;

use super::parameters::{ParameterSet, ParameterSetError};

#[derive(Debug)]
pub enum ParameterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Parameters(ParameterSetError),
    EmptyName {
        row: usize,
    },
    InvalidValue {
        parameter: String,
        column: usize,
        value: String,
    },
}

impl std::fmt::Display for ParameterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterImportError::Io(err) => write!(f, "failed to read parameter file: {}", err),
            ParameterImportError::Csv(err) => write!(f, "invalid parameter CSV data: {}", err),
            ParameterImportError::Json(err) => write!(f, "invalid parameter JSON data: {}", err),
            ParameterImportError::Parameters(err) => write!(f, "{}", err),
            ParameterImportError::EmptyName { row } => {
                write!(f, "row {} has no parameter name", row)
            }
            ParameterImportError::InvalidValue {
                parameter,
                column,
                value,
            } => write!(
                f,
                "parameter '{}' has a non-numeric value '{}' in column {}",
                parameter, value, column
            ),
        }
    }
}

impl std::error::Error for ParameterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParameterImportError::Io(err) => Some(err),
            ParameterImportError::Csv(err) => Some(err),
            ParameterImportError::Json(err) => Some(err),
            ParameterImportError::Parameters(err) => Some(err),
            ParameterImportError::EmptyName { .. } | ParameterImportError::InvalidValue { .. } => {
                None
            }
        }
    }
}

impl From<std::io::Error> for ParameterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ParameterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for ParameterImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<ParameterSetError> for ParameterImportError {
    fn from(err: ParameterSetError) -> Self {
        Self::Parameters(err)
    }
}

/// Source layout of a parameter file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterFileFormat {
    Csv,
    Json,
}

impl ParameterFileFormat {
    /// `.csv` files are read as rows; everything else as a JSON object.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

/// Loads parameter sets from files for offline scoring.
pub struct ParameterSetImporter;

impl ParameterSetImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ParameterSet, ParameterImportError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, ParameterFileFormat::from_path(path))
    }

    pub fn from_reader<R: Read>(
        reader: R,
        format: ParameterFileFormat,
    ) -> Result<ParameterSet, ParameterImportError> {
        match format {
            ParameterFileFormat::Csv => parser::parse_rows(reader),
            ParameterFileFormat::Json => {
                let value: serde_json::Value = serde_json::from_reader(reader)?;
                Ok(ParameterSet::from_json(&value)?)
            }
        }
    }
}
