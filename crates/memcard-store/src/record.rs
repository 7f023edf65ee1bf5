use crate::write_atomic;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A record file that could not be read, parsed, or written.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: invalid YAML: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{}: root is not a mapping", .path.display())]
    NotMapping { path: PathBuf },
}

impl RecordError {
    pub fn path(&self) -> &Path {
        match self {
            RecordError::Io { path, .. }
            | RecordError::Parse { path, .. }
            | RecordError::NotMapping { path } => path,
        }
    }
}

/// Read and parse one record file. The root is returned as-is; callers decide
/// what a non-mapping root means.
pub fn read_record(path: &Path) -> Result<serde_yaml::Value, RecordError> {
    let content = std::fs::read_to_string(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| RecordError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a record mapping (key order preserved) and write it atomically.
pub fn write_record(path: &Path, record: &serde_yaml::Mapping) -> Result<(), RecordError> {
    let yaml = serde_yaml::to_string(record).map_err(|source| RecordError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, yaml.as_bytes()).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })
}
