use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Builder, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;

use super::model::CategoryTable;
use super::{BINARY_MAGIC, FileFormat, columns};

/// Write `table` to `path` in the requested variant. The table is validated
/// first so a file this writes is always readable by [`super::loader`].
pub fn write_file(path: &Path, table: &CategoryTable, format: FileFormat) -> Result<()> {
    table.validate().context("refusing to write invalid table")?;
    match format {
        FileFormat::Binary => std::fs::write(path, encode_binary(table))
            .with_context(|| format!("writing {}", path.display())),
        FileFormat::Parquet => write_parquet(path, table),
    }
}

// ---------------------------------------------------------------------------
// Packed binary
// ---------------------------------------------------------------------------

pub(crate) fn encode_binary(table: &CategoryTable) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        BINARY_MAGIC.len() + 16 + 8 * (table.frequency.len() + table.emissivity.len()),
    );
    buf.extend_from_slice(&BINARY_MAGIC);
    buf.extend_from_slice(&table.release.to_le_bytes());
    buf.extend_from_slice(&table.version.to_le_bytes());
    buf.extend_from_slice(&(table.n_frequencies() as u32).to_le_bytes());
    buf.extend_from_slice(&(table.n_surface_types() as u32).to_le_bytes());
    put_string(&mut buf, &table.classification_name);
    for name in &table.surface_types {
        put_string(&mut buf, name);
    }
    for v in table.frequency.iter().chain(&table.emissivity) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

fn put_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn write_parquet(path: &Path, table: &CategoryTable) -> Result<()> {
    let mut freq_builder = ListBuilder::new(Float64Builder::new());
    let mut emis_builder = ListBuilder::new(Float64Builder::new());
    for i in 0..table.n_surface_types() {
        freq_builder.values().append_slice(&table.frequency);
        freq_builder.append(true);

        let row = table.row(i).context("emissivity row out of range")?;
        emis_builder.values().append_slice(row);
        emis_builder.append(true);
    }

    let names = StringArray::from(
        table.surface_types.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    );

    let item = || Arc::new(Field::new("item", DataType::Float64, true));
    let schema = Arc::new(Schema::new(vec![
        Field::new(columns::SURFACE_TYPE, DataType::Utf8, false),
        Field::new(columns::FREQUENCY, DataType::List(item()), false),
        Field::new(columns::EMISSIVITY, DataType::List(item()), false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(names),
            Arc::new(freq_builder.finish()),
            Arc::new(emis_builder.finish()),
        ],
    )
    .context("building record batch")?;

    let props = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![
            KeyValue::new(columns::META_RELEASE.to_string(), table.release.to_string()),
            KeyValue::new(columns::META_VERSION.to_string(), table.version.to_string()),
            KeyValue::new(
                columns::META_CLASSIFICATION.to_string(),
                table.classification_name.clone(),
            ),
        ]))
        .build();

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_file;
    use crate::data::model::tests::sample_table;

    /// Write a Parquet file with arbitrary rows and metadata, bypassing the
    /// table invariants, to exercise the reader's own checks.
    fn write_raw_parquet(
        path: &Path,
        rows: &[(&str, Vec<f64>, Vec<f64>)],
        with_emissivity: bool,
    ) {
        let mut freq_builder = ListBuilder::new(Float64Builder::new());
        let mut emis_builder = ListBuilder::new(Float64Builder::new());
        for (_, freq, emis) in rows {
            freq_builder.values().append_slice(freq);
            freq_builder.append(true);
            emis_builder.values().append_slice(emis);
            emis_builder.append(true);
        }
        let names = StringArray::from(rows.iter().map(|r| r.0).collect::<Vec<_>>());
        let item = || Arc::new(Field::new("item", DataType::Float64, true));

        let mut fields = vec![
            Field::new(columns::SURFACE_TYPE, DataType::Utf8, false),
            Field::new(columns::FREQUENCY, DataType::List(item()), false),
        ];
        let mut arrays: Vec<arrow::array::ArrayRef> =
            vec![Arc::new(names), Arc::new(freq_builder.finish())];
        if with_emissivity {
            fields.push(Field::new(columns::EMISSIVITY, DataType::List(item()), false));
            arrays.push(Arc::new(emis_builder.finish()));
        }
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays).expect("batch");

        let props = WriterProperties::builder()
            .set_key_value_metadata(Some(vec![
                KeyValue::new(columns::META_RELEASE.to_string(), "1".to_string()),
                KeyValue::new(columns::META_VERSION.to_string(), "1".to_string()),
                KeyValue::new(columns::META_CLASSIFICATION.to_string(), "Snow".to_string()),
            ]))
            .build();
        let file = std::fs::File::create(path).expect("create");
        let mut writer = ArrowWriter::try_new(file, schema, Some(props)).expect("writer");
        writer.write(&batch).expect("write");
        writer.close().expect("close");
    }

    #[test]
    fn binary_encoding_has_expected_length() {
        let t = sample_table();
        let bytes = encode_binary(&t);
        // header + "Snow" + "fresh_snow" + "old_snow" + 3 freqs + 6 values
        let expected = 8 + 16 + (4 + 4) + (4 + 10) + (4 + 8) + 8 * 3 + 8 * 6;
        assert_eq!(bytes.len(), expected);
        assert_eq!(&bytes[..8], b"SNOWVIS\0");
    }

    #[test]
    fn refuses_to_write_invalid_table() {
        let mut t = sample_table();
        t.frequency.reverse();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.bin");
        assert!(write_file(&path, &t, FileFormat::Binary).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn parquet_reader_rejects_inconsistent_frequency_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("skewed.parquet");
        write_raw_parquet(
            &path,
            &[
                ("fresh_snow", vec![0.4, 0.5], vec![0.9, 0.9]),
                ("old_snow", vec![0.4, 0.6], vec![0.8, 0.8]),
            ],
            true,
        );
        let err = read_file(&path, FileFormat::Parquet, true).unwrap_err();
        assert!(err.to_string().contains("frequency axis differs"), "{err}");
    }

    #[test]
    fn parquet_reader_rejects_missing_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("no_emis.parquet");
        write_raw_parquet(&path, &[("fresh_snow", vec![0.4, 0.5], vec![])], false);
        let err = read_file(&path, FileFormat::Parquet, true).unwrap_err();
        assert!(err.to_string().contains("missing 'emissivity'"), "{err}");
    }

    #[test]
    fn parquet_reader_rejects_length_mismatch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("short.parquet");
        write_raw_parquet(&path, &[("fresh_snow", vec![0.4, 0.5], vec![0.9])], true);
        assert!(read_file(&path, FileFormat::Parquet, true).is_err());
    }
}
