use std::collections::BTreeSet;
use std::fmt;

use anyhow::{Result, bail, ensure};

/// The only file release this crate understands. Versions within a release
/// are additive and all accepted.
pub const CATEGORY_TABLE_RELEASE: u32 = 1;

/// Current version written by [`crate::data::writer`].
pub const CATEGORY_TABLE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// CategoryTable – emissivity tabulated by surface category and frequency
// ---------------------------------------------------------------------------

/// A categorized lookup table: one emissivity row per surface category,
/// sampled on a shared frequency axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTable {
    pub release: u32,
    pub version: u32,
    /// Name of the surface classification scheme, e.g. `"Snow"`.
    pub classification_name: String,
    /// Spectral axis, strictly increasing.
    pub frequency: Vec<f64>,
    /// Category names, one per emissivity row.
    pub surface_types: Vec<String>,
    /// Row-major `[n_surface_types][n_frequencies]`.
    pub emissivity: Vec<f64>,
}

impl CategoryTable {
    /// Assemble a table at the current release/version and check it.
    pub fn new(
        classification_name: impl Into<String>,
        frequency: Vec<f64>,
        surface_types: Vec<String>,
        emissivity: Vec<f64>,
    ) -> Result<Self> {
        let table = CategoryTable {
            release: CATEGORY_TABLE_RELEASE,
            version: CATEGORY_TABLE_VERSION,
            classification_name: classification_name.into(),
            frequency,
            surface_types,
            emissivity,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn n_frequencies(&self) -> usize {
        self.frequency.len()
    }

    pub fn n_surface_types(&self) -> usize {
        self.surface_types.len()
    }

    /// Emissivity row for the category at `index`.
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        let n = self.n_frequencies();
        if index >= self.n_surface_types() {
            return None;
        }
        self.emissivity.get(index * n..(index + 1) * n)
    }

    /// Emissivity row for the named category.
    pub fn row_by_name(&self, surface_type: &str) -> Option<&[f64]> {
        let index = self.surface_types.iter().position(|s| s == surface_type)?;
        self.row(index)
    }

    /// Check every structural invariant. Readers call this before handing a
    /// table out, so a file that parses but violates these is still corrupt.
    pub fn validate(&self) -> Result<()> {
        if self.release != CATEGORY_TABLE_RELEASE {
            bail!(
                "unsupported release {} (supported: {CATEGORY_TABLE_RELEASE})",
                self.release
            );
        }
        ensure!(!self.frequency.is_empty(), "table has no frequencies");
        ensure!(!self.surface_types.is_empty(), "table has no surface types");

        for (i, pair) in self.frequency.windows(2).enumerate() {
            ensure!(
                pair[0] < pair[1],
                "frequency[{}] = {} is not above frequency[{i}] = {}",
                i + 1,
                pair[1],
                pair[0]
            );
        }
        if let Some(bad) = self.frequency.iter().position(|f| !f.is_finite()) {
            bail!("frequency[{bad}] is not finite");
        }

        let mut seen = BTreeSet::new();
        for (i, name) in self.surface_types.iter().enumerate() {
            ensure!(!name.is_empty(), "surface type {i} has an empty name");
            ensure!(seen.insert(name.as_str()), "duplicate surface type '{name}'");
        }

        let expected = self.n_surface_types() * self.n_frequencies();
        ensure!(
            self.emissivity.len() == expected,
            "emissivity has {} values, expected {} ({} surface types x {} frequencies)",
            self.emissivity.len(),
            expected,
            self.n_surface_types(),
            self.n_frequencies()
        );
        for (i, &e) in self.emissivity.iter().enumerate() {
            if !(0.0..=1.0).contains(&e) {
                let n = self.n_frequencies();
                bail!(
                    "emissivity for '{}' at frequency index {} is {e}, outside [0, 1]",
                    self.surface_types[i / n],
                    i % n
                );
            }
        }
        Ok(())
    }

    /// One-line summary used for informational output on load.
    pub fn info(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CategoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CategoryTable RELEASE.VERSION: {}.{:02}  CLASSIFICATION: {}  N_FREQUENCIES={}  N_SURFACE_TYPES={}",
            self.release,
            self.version,
            self.classification_name,
            self.n_frequencies(),
            self.n_surface_types()
        )
    }
}
