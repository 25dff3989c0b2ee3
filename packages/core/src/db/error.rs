//! Store opening errors
//!
//! Raised by `TursoStore::new` and `TursoStore::new_in_memory` before any node is read.
//! Once a store is open, its failures travel as `anyhow::Error` through `NodeStore`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreOpenError {
    /// The directory holding the database file could not be created
    #[error("cannot create store directory {dir}: {source}")]
    CreateDirectory {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("no permission to create store directory {dir}")]
    DirectoryUnwritable { dir: PathBuf },

    /// libsql refused to open the file (`:memory:` for in-memory stores)
    #[error("cannot open tree store {path}: {source}")]
    Open {
        path: PathBuf,
        source: libsql::Error,
    },

    /// A pragma or DDL statement failed while preparing the nodes table
    #[error("tree store setup failed on `{statement}`: {source}")]
    Setup {
        statement: String,
        source: libsql::Error,
    },

    #[error(transparent)]
    Libsql(#[from] libsql::Error),
}

impl StoreOpenError {
    /// Classify a failed `create_dir_all` for the directory `dir`
    pub fn directory(dir: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::DirectoryUnwritable { dir }
        } else {
            Self::CreateDirectory { dir, source }
        }
    }

    pub fn open(path: impl Into<PathBuf>, source: libsql::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn setup(statement: &str, source: libsql::Error) -> Self {
        Self::Setup {
            statement: statement.split_whitespace().collect::<Vec<_>>().join(" "),
            source,
        }
    }
}
