//! Parquet writer with optional `date=<label>` path partitioning.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_writer::ArrowWriterOptions;
use parquet::basic::Compression;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use tracing::{debug, info};

use crate::StoreError;

/// File name used when the output path names a directory.
pub const DEFAULT_FILE_NAME: &str = "data.parquet";

const PARQUET_SUFFIX: &str = ".parquet";

/// Insert a `date=<label>` segment into the output path.
///
/// Applies only when a label is given and the output's parent directory (or the
/// working directory, for a bare file name) already exists:
///
/// - `out/data.parquet` → `out/date=<label>/data.parquet`
/// - `out` or `out/`    → `out/date=<label>/data.parquet`
///
/// Otherwise the path is returned unchanged. A partitioned output path must be
/// valid UTF-8.
pub fn resolve_output_path(output: &Path, partition: Option<&str>) -> Result<PathBuf, StoreError> {
    let Some(label) = partition else {
        return Ok(output.to_path_buf());
    };

    let raw = output
        .to_str()
        .ok_or_else(|| StoreError::write(output, "partitioned output path is not valid UTF-8"))?;
    let parent = match raw.rfind('/') {
        Some(0) => "/",
        Some(i) => &raw[..i],
        None => ".",
    };
    if !Path::new(parent).is_dir() {
        debug!(output = raw, parent, "partition parent missing, writing unpartitioned");
        return Ok(output.to_path_buf());
    }

    let segment = format!("date={label}");
    let base = raw.trim_end_matches('/');
    if base.ends_with(PARQUET_SUFFIX) {
        let base = Path::new(base);
        let dir = base.parent().unwrap_or(Path::new(""));
        let file = base.file_name().unwrap_or(OsStr::new(DEFAULT_FILE_NAME));
        Ok(dir.join(segment).join(file))
    } else {
        Ok(Path::new(base).join(segment).join(DEFAULT_FILE_NAME))
    }
}

/// Write a batch to `path`, replacing any existing file.
///
/// Missing parent directories are created. The file is written to a hidden temporary
/// sibling and renamed into place, so a failed write leaves no partial output.
/// Schema metadata is stored as Parquet key/value metadata in key order.
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| StoreError::write(path, e))?;

    let tmp = tempfile::Builder::new()
        .prefix(".trainprep-")
        .tempfile_in(dir)
        .map_err(|e| StoreError::write(path, e))?;

    let options = ArrowWriterOptions::new()
        .with_properties(writer_properties(batch.schema_ref()))
        .with_skip_arrow_metadata(true);
    let mut writer = ArrowWriter::try_new_with_options(tmp, batch.schema(), options)
        .map_err(|e| StoreError::write(path, e))?;
    writer.write(batch).map_err(|e| StoreError::write(path, e))?;
    let tmp = writer.into_inner().map_err(|e| StoreError::write(path, e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::write(path, e.error))?;

    info!(path = %path.display(), rows = batch.num_rows(), "wrote parquet");
    Ok(())
}

/// Resolve the partitioned path and write the batch there. Returns the final path.
pub fn write_partitioned(
    output: &Path,
    partition: Option<&str>,
    batch: &RecordBatch,
) -> Result<PathBuf, StoreError> {
    let path = resolve_output_path(output, partition)?;
    write_parquet(&path, batch)?;
    Ok(path)
}

fn writer_properties(schema: &Schema) -> WriterProperties {
    let mut kv: Vec<KeyValue> = schema
        .metadata()
        .iter()
        .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
        .collect();
    kv.sort_by(|a, b| a.key.cmp(&b.key));

    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_key_value_metadata((!kv.is_empty()).then_some(kv))
        .build()
}
