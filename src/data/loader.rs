use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail, ensure};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, LargeListArray, ListArray, StringArray,
};
use arrow::datatypes::{DataType, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::format::KeyValue;

use super::model::{CATEGORY_TABLE_RELEASE, CategoryTable};
use super::{BINARY_MAGIC, FileFormat, columns};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a coefficient file into a fully validated [`CategoryTable`].
///
/// Nothing is returned unless the whole file parsed and passed
/// [`CategoryTable::validate`]. When `quiet` is false a one-line summary of
/// the table is logged at `info` level.
pub fn read_file(path: &Path, format: FileFormat, quiet: bool) -> Result<CategoryTable> {
    log::debug!("reading {format:?} coefficient file {}", path.display());

    let table = match format {
        FileFormat::Binary => read_binary(path)?,
        FileFormat::Parquet => read_parquet(path)?,
    };
    table
        .validate()
        .with_context(|| format!("invalid coefficient data in {}", path.display()))?;

    if !quiet {
        log::info!("FILE: {}; {}", path.display(), table.info());
    }
    Ok(table)
}

/// Clear a table slot. Safe on an already-empty slot.
pub fn destroy(slot: &mut Option<CategoryTable>) {
    if slot.take().is_some() {
        log::debug!("released coefficient table");
    }
}

/// Whether a table slot currently holds data.
pub fn is_associated(slot: &Option<CategoryTable>) -> bool {
    slot.is_some()
}

// ---------------------------------------------------------------------------
// Packed-binary reader
// ---------------------------------------------------------------------------

/// Layout (little-endian):
///
/// ```text
/// magic            [u8; 8] = "SNOWVIS\0"
/// release          u32
/// version          u32
/// n_frequencies    u32
/// n_surface_types  u32
/// classification   u32 length + UTF-8
/// surface_types    n_surface_types × (u32 length + UTF-8)
/// frequency        n_frequencies × f64
/// emissivity       n_surface_types × n_frequencies × f64
/// ```
fn read_binary(path: &Path) -> Result<CategoryTable> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading binary coefficient file {}", path.display()))?;
    decode_binary(&bytes).with_context(|| format!("decoding {}", path.display()))
}

pub(crate) fn decode_binary(bytes: &[u8]) -> Result<CategoryTable> {
    let mut r = ByteReader::new(bytes);

    let magic = r.take(BINARY_MAGIC.len()).context("reading magic")?;
    ensure!(magic == BINARY_MAGIC, "not a packed-binary coefficient file (bad magic)");

    let release = r.u32().context("reading release")?;
    let version = r.u32().context("reading version")?;
    ensure!(
        release == CATEGORY_TABLE_RELEASE,
        "unsupported release {release} (supported: {})",
        CATEGORY_TABLE_RELEASE
    );

    let n_frequencies = r.u32().context("reading n_frequencies")? as usize;
    let n_surface_types = r.u32().context("reading n_surface_types")? as usize;

    let classification_name = r.string().context("reading classification name")?;
    let surface_types = (0..n_surface_types)
        .map(|i| r.string().with_context(|| format!("reading surface type {i}")))
        .collect::<Result<Vec<_>>>()?;

    let frequency = r.f64s(n_frequencies).context("reading frequency")?;
    let n_values = n_surface_types
        .checked_mul(n_frequencies)
        .context("emissivity dimensions overflow")?;
    let emissivity = r.f64s(n_values).context("reading emissivity")?;

    if r.remaining() != 0 {
        bail!("{} unexpected trailing bytes", r.remaining());
    }

    Ok(CategoryTable {
        release,
        version,
        classification_name,
        frequency,
        surface_types,
        emissivity,
    })
}

/// Bounds-checked little-endian cursor over a byte slice.
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            bail!(
                "truncated: needed {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            );
        }
        let buf = self.buf;
        let out = &buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let b = self.take(len)?;
        String::from_utf8(b.to_vec()).context("string is not valid UTF-8")
    }

    fn f64s(&mut self, n: usize) -> Result<Vec<f64>> {
        let len = n.checked_mul(8).context("array length overflow")?;
        let b = self.take(len)?;
        Ok(b
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Expected schema, one row per surface type:
/// - `surface_type`: Utf8 or LargeUtf8
/// - `frequency`: List or LargeList of Float64/Float32, identical on every row
/// - `emissivity`: List or LargeList of Float64/Float32, same length as `frequency`
///
/// `release`, `version` and `classification_name` live in the file's
/// key-value metadata.
fn read_parquet(path: &Path) -> Result<CategoryTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening parquet file {}", path.display()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let kv = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .cloned()
        .unwrap_or_default();
    let release = meta_u32(&kv, columns::META_RELEASE)?;
    let version = meta_u32(&kv, columns::META_VERSION)?;
    ensure!(
        release == CATEGORY_TABLE_RELEASE,
        "unsupported release {release} (supported: {})",
        CATEGORY_TABLE_RELEASE
    );
    let classification_name = meta_str(&kv, columns::META_CLASSIFICATION)?.to_string();

    let reader = builder.build().context("building parquet reader")?;

    let mut frequency: Option<Vec<f64>> = None;
    let mut surface_types = Vec::new();
    let mut emissivity = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let name_idx = column_index(&schema, columns::SURFACE_TYPE)?;
        let freq_idx = column_index(&schema, columns::FREQUENCY)?;
        let emis_idx = column_index(&schema, columns::EMISSIVITY)?;

        let name_col = batch.column(name_idx);
        let freq_col = batch.column(freq_idx);
        let emis_col = batch.column(emis_idx);

        for row in 0..batch.num_rows() {
            let name = extract_string(name_col, row)
                .with_context(|| format!("Row {row}: failed to read '{}'", columns::SURFACE_TYPE))?;
            let freq = extract_f64_list(freq_col, row)
                .with_context(|| format!("Row {row}: failed to read '{}'", columns::FREQUENCY))?;
            let emis = extract_f64_list(emis_col, row)
                .with_context(|| format!("Row {row}: failed to read '{}'", columns::EMISSIVITY))?;

            if emis.len() != freq.len() {
                bail!(
                    "Row {row} ('{name}'): frequency has {} values but emissivity has {}",
                    freq.len(),
                    emis.len()
                );
            }
            if frequency.is_none() {
                frequency = Some(freq);
            } else if frequency.as_ref() != Some(&freq) {
                bail!("Row {row} ('{name}'): frequency axis differs from the first row");
            }

            surface_types.push(name);
            emissivity.extend(emis);
        }
    }

    Ok(CategoryTable {
        release,
        version,
        classification_name,
        frequency: frequency.unwrap_or_default(),
        surface_types,
        emissivity,
    })
}

// -- Parquet / Arrow helpers --

fn column_index(schema: &Schema, name: &str) -> Result<usize> {
    schema
        .index_of(name)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
}

fn meta_str<'a>(kv: &'a [KeyValue], key: &str) -> Result<&'a str> {
    kv.iter()
        .find(|entry| entry.key == key)
        .and_then(|entry| entry.value.as_deref())
        .with_context(|| format!("Parquet metadata missing '{key}'"))
}

fn meta_u32(kv: &[KeyValue], key: &str) -> Result<u32> {
    let raw = meta_str(kv, key)?;
    raw.trim()
        .parse()
        .with_context(|| format!("Parquet metadata '{key}' = '{raw}' is not an integer"))
}

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in string column");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected Utf8 or LargeUtf8 column, got {other:?}"),
    }
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    // Null elements become NaN and are rejected later by validation.
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}
