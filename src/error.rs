use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Optional `"; Process ID: <id>"` suffix appended to lifecycle messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessNote(pub Option<u32>);

impl fmt::Display for ProcessNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "; Process ID: {id}"),
            None => Ok(()),
        }
    }
}

/// Failure to load a coefficient file. The store is always Empty afterwards.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Coefficient filename must not be empty{process}")]
    EmptyFilename { process: ProcessNote },

    #[error("Error loading VIS snow emissivity coefficient data from {}{process}", .path.display())]
    Read {
        path: PathBuf,
        process: ProcessNote,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl LoadError {
    pub(crate) fn read(path: PathBuf, process: ProcessNote, source: anyhow::Error) -> Self {
        LoadError::Read {
            path,
            process,
            source: source.into(),
        }
    }
}

/// The store still reported data after being released.
#[derive(Debug, Error)]
#[error("Error deallocating shared data structure{process}")]
pub struct DestroyError {
    pub process: ProcessNote,
}
