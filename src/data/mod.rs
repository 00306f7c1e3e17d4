/// Data layer: the categorized lookup table and its two on-disk variants.
///
/// Architecture:
/// ```text
///  .bin (packed binary)  /  .parquet (self-describing)
///        │                        ▲
///        ▼                        │
///   ┌──────────┐            ┌──────────┐
///   │  loader   │            │  writer   │
///   └──────────┘            └──────────┘
///        │                        ▲
///        ▼                        │
///   ┌───────────────┐             │
///   │ CategoryTable  │─────────────┘
///   └───────────────┘
/// ```

pub mod loader;
pub mod model;
pub mod writer;

/// Which on-disk variant a coefficient file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Packed little-endian binary (the default).
    #[default]
    Binary,
    /// Self-describing tabular variant stored as Parquet.
    Parquet,
}

impl FileFormat {
    pub fn from_alternate_flag(use_alternate_format: bool) -> Self {
        if use_alternate_format {
            FileFormat::Parquet
        } else {
            FileFormat::Binary
        }
    }
}

/// Magic bytes opening every packed-binary coefficient file.
pub(crate) const BINARY_MAGIC: [u8; 8] = *b"SNOWVIS\0";

/// Parquet column and key-value metadata names.
pub(crate) mod columns {
    pub const SURFACE_TYPE: &str = "surface_type";
    pub const FREQUENCY: &str = "frequency";
    pub const EMISSIVITY: &str = "emissivity";

    pub const META_RELEASE: &str = "release";
    pub const META_VERSION: &str = "version";
    pub const META_CLASSIFICATION: &str = "classification_name";
}
