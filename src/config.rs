use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::data::FileFormat;

// ---------------------------------------------------------------------------
// LoadOptions – everything `load` takes besides the filename
// ---------------------------------------------------------------------------

/// Options for [`crate::SnowVisCoeff::load`]. Every field is optional in
/// serialized form. The defaults read packed binary without informational
/// output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Prepended verbatim to the filename. No separator is inserted.
    pub file_path: Option<String>,
    /// Read the self-describing Parquet variant instead of packed binary.
    pub use_alternate_format: bool,
    /// Suppress informational output regardless of process ids.
    pub quiet: bool,
    /// Id of the calling process in a multi-process run.
    pub process_id: Option<u32>,
    /// Id of the one process allowed to produce informational output.
    pub reporting_process_id: Option<u32>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options kept in a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_alternate_format(mut self, use_alternate_format: bool) -> Self {
        self.use_alternate_format = use_alternate_format;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_process_ids(mut self, process_id: u32, reporting_process_id: u32) -> Self {
        self.process_id = Some(process_id);
        self.reporting_process_id = Some(reporting_process_id);
        self
    }

    /// `file_path + filename`, exactly as given.
    pub fn compose_path(&self, filename: &str) -> PathBuf {
        match &self.file_path {
            Some(prefix) => PathBuf::from(format!("{prefix}{filename}")),
            None => PathBuf::from(filename),
        }
    }

    pub fn format(&self) -> FileFormat {
        FileFormat::from_alternate_flag(self.use_alternate_format)
    }

    /// Whether informational output should be suppressed.
    ///
    /// An explicit `quiet` always wins. Otherwise output is produced only
    /// when both ids are known and equal, i.e. by the reporting process.
    pub fn effective_quiet(&self) -> bool {
        if self.quiet {
            return true;
        }
        match (self.process_id, self.reporting_process_id) {
            (Some(pid), Some(reporting)) => pid != reporting,
            _ => true,
        }
    }
}
