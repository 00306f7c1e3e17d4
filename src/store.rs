use crate::config::LoadOptions;
use crate::data::loader;
use crate::data::model::CategoryTable;
use crate::error::{DestroyError, LoadError, ProcessNote};

// ---------------------------------------------------------------------------
// SnowVisCoeff – owner of the loaded emissivity table
// ---------------------------------------------------------------------------

/// Holder for the visible-band snow emissivity table.
///
/// Create one at model initialisation, pass it to whatever needs the table,
/// and [`destroy`](Self::destroy) it at teardown. The store is either
/// Empty or Loaded; a failed [`load`](Self::load) always leaves it Empty.
///
/// There is no internal locking. `load` and `destroy` take `&mut self`, so
/// only one owner can change the table at a time.
#[derive(Debug, Default)]
pub struct SnowVisCoeff {
    /// Loaded table (None until a load succeeds).
    table: Option<CategoryTable>,
}

impl SnowVisCoeff {
    /// An Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `filename` (prefixed by `options.file_path`) into the store.
    ///
    /// Loading over an already Loaded store replaces its contents. On any
    /// failure, including a failed reload, the store ends up Empty.
    pub fn load(&mut self, filename: &str, options: &LoadOptions) -> Result<(), LoadError> {
        let guard = ResetOnFailure::new(&mut self.table);
        let process = ProcessNote(options.process_id);

        if filename.is_empty() {
            let err = LoadError::EmptyFilename { process };
            log::error!("{err}");
            return Err(err);
        }

        let path = options.compose_path(filename);
        match loader::read_file(&path, options.format(), options.effective_quiet()) {
            Ok(table) => {
                guard.commit(table);
                Ok(())
            }
            Err(source) => {
                let cause = format!("{source:#}");
                let err = LoadError::read(path, process, source);
                log::error!("{err}: {cause}");
                Err(err)
            }
        }
    }

    /// Release the table. Safe to call on an Empty store.
    ///
    /// The post-release check cannot fail with the current slot type; it
    /// guards future changes to how the table is released.
    pub fn destroy(&mut self, process_id: Option<u32>) -> Result<(), DestroyError> {
        loader::destroy(&mut self.table);
        if loader::is_associated(&self.table) {
            let err = DestroyError {
                process: ProcessNote(process_id),
            };
            log::error!("{err}");
            return Err(err);
        }
        Ok(())
    }

    /// Whether a table is currently loaded.
    pub fn is_loaded(&self) -> bool {
        loader::is_associated(&self.table)
    }

    /// Borrow the loaded table, if any.
    pub fn table(&self) -> Option<&CategoryTable> {
        self.table.as_ref()
    }
}

/// Empties the table slot when dropped, unless a new table was committed.
/// Every early return from `load` goes through this.
struct ResetOnFailure<'a> {
    slot: &'a mut Option<CategoryTable>,
    committed: bool,
}

impl<'a> ResetOnFailure<'a> {
    fn new(slot: &'a mut Option<CategoryTable>) -> Self {
        ResetOnFailure {
            slot,
            committed: false,
        }
    }

    fn commit(mut self, table: CategoryTable) {
        *self.slot = Some(table);
        self.committed = true;
    }
}

impl Drop for ResetOnFailure<'_> {
    fn drop(&mut self) {
        if !self.committed {
            loader::destroy(self.slot);
        }
    }
}
