//! Parquet decoding and table assembly.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, new_null_array};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::{ChunkReader, FileReader, SerializedFileReader};
use tracing::{debug, info};

use crate::{StoreError, remote, source};

/// One decoded input file: its schema (kept even when it holds no rows) and batches.
pub(crate) struct Part {
    pub label: String,
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

/// Load every Parquet file named by a path expression into a single batch.
///
/// Accepts a local file, directory, glob, or object-store URI (see
/// [`REMOTE_SCHEMES`](crate::REMOTE_SCHEMES)). Files with differing schemas are
/// unified by column name; a column missing from a file is null in that file's rows.
pub fn load_table(expr: &str) -> Result<RecordBatch, StoreError> {
    let parts = if source::is_remote(expr) {
        remote::read_remote(expr)?
    } else {
        source::resolve_local(expr)?
            .iter()
            .map(|path| read_part(path))
            .collect::<Result<Vec<_>, _>>()?
    };

    let files = parts.len();
    let table = assemble(expr, parts)?;
    info!(
        expr,
        files,
        rows = table.num_rows(),
        columns = table.num_columns(),
        "loaded table"
    );
    Ok(table)
}

/// Key/value pairs from a Parquet file's footer.
///
/// Run metadata lives here rather than in an embedded Arrow schema, so an Arrow
/// reader's schema metadata map does not carry it.
pub fn footer_metadata(path: &Path) -> Result<HashMap<String, String>, StoreError> {
    let label = path.display().to_string();
    let file = File::open(path).map_err(|e| StoreError::read(label.clone(), e))?;
    let reader = SerializedFileReader::new(file).map_err(|e| StoreError::read(&label, e))?;
    Ok(reader
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .into_iter()
        .flatten()
        .filter_map(|kv| Some((kv.key.clone(), kv.value.clone()?)))
        .collect())
}

fn read_part(path: &Path) -> Result<Part, StoreError> {
    let label = path.display().to_string();
    let file = File::open(path).map_err(|e| StoreError::read(label.clone(), e))?;
    decode(file, label)
}

/// Decode a Parquet payload from any chunk reader (local file or fetched bytes).
pub(crate) fn decode<R: ChunkReader + 'static>(
    reader: R,
    label: String,
) -> Result<Part, StoreError> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(reader).map_err(|e| StoreError::read(&label, e))?;
    let schema = Arc::clone(builder.schema());
    let batches = builder
        .build()
        .map_err(|e| StoreError::read(&label, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::read(&label, e))?;
    debug!(file = %label, batches = batches.len(), "decoded parquet");
    Ok(Part {
        label,
        schema,
        batches,
    })
}

/// Concatenate decoded parts under a merged schema.
///
/// Schema-level metadata is dropped before merging: writers such as pandas embed
/// per-file metadata that would otherwise conflict.
fn assemble(expr: &str, parts: Vec<Part>) -> Result<RecordBatch, StoreError> {
    let schemas = parts
        .iter()
        .map(|p| Schema::new(p.schema.fields().clone()))
        .collect::<Vec<_>>();
    let merged = Schema::try_merge(schemas).map_err(|e| StoreError::read(expr, e))?;
    let merged: SchemaRef = Arc::new(Schema::new(
        merged
            .fields()
            .iter()
            .map(|f| f.as_ref().clone().with_nullable(true))
            .collect::<Vec<Field>>(),
    ));

    let mut aligned = Vec::new();
    for part in &parts {
        for batch in &part.batches {
            aligned.push(
                align(batch, &merged).map_err(|e| StoreError::read(part.label.clone(), e))?,
            );
        }
    }
    concat_batches(&merged, &aligned).map_err(|e| StoreError::read(expr, e))
}

fn align(
    batch: &RecordBatch,
    schema: &SchemaRef,
) -> Result<RecordBatch, arrow::error::ArrowError> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| match batch.column_by_name(field.name()) {
            Some(col) if col.data_type() == field.data_type() => Ok(Arc::clone(col)),
            Some(col) => cast(col, field.data_type()),
            None => Ok(new_null_array(field.data_type(), batch.num_rows())),
        })
        .collect::<Result<Vec<ArrayRef>, _>>()?;
    RecordBatch::try_new(Arc::clone(schema), columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int64Array, StringArray};
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    fn write(path: &Path, batch: &RecordBatch) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
    }

    fn evaluations(tenants: &[&str], ids: &[i64]) -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            (
                "tenantId",
                Arc::new(StringArray::from(tenants.to_vec())) as ArrayRef,
            ),
            (
                "opportunityId",
                Arc::new(Int64Array::from(ids.to_vec())) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn loads_single_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("risk_evaluations.parquet");
        write(&path, &evaluations(&["t1", "t1"], &[1, 2]));

        let table = load_table(path.to_str().unwrap()).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.schema().field(0).name(), "tenantId");
        assert_eq!(table.schema().field(1).name(), "opportunityId");
    }

    #[test]
    fn concatenates_directory_in_path_order() {
        let tmp = TempDir::new().unwrap();
        write(
            &tmp.path().join("part-1.parquet"),
            &evaluations(&["t1"], &[20]),
        );
        write(
            &tmp.path().join("part-0.parquet"),
            &evaluations(&["t1"], &[10]),
        );

        let table = load_table(tmp.path().to_str().unwrap()).unwrap();
        let ids = table
            .column_by_name("opportunityId")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(ids.values().to_vec(), vec![10, 20]);
    }

    #[test]
    fn unifies_schemas_with_null_fill() {
        let tmp = TempDir::new().unwrap();
        write(
            &tmp.path().join("a.parquet"),
            &evaluations(&["t1"], &[1]),
        );
        let with_score = RecordBatch::try_from_iter(vec![
            ("tenantId", Arc::new(StringArray::from(vec!["t2"])) as ArrayRef),
            ("opportunityId", Arc::new(Int64Array::from(vec![2])) as ArrayRef),
            (
                "riskScore",
                Arc::new(Float64Array::from(vec![0.7])) as ArrayRef,
            ),
        ])
        .unwrap();
        write(&tmp.path().join("b.parquet"), &with_score);

        let table = load_table(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(table.num_rows(), 2);
        let score = table.column_by_name("riskScore").unwrap();
        assert!(score.is_null(0));
        assert!(score.is_valid(1));
    }

    #[test]
    fn conflicting_types_are_read_errors() {
        let tmp = TempDir::new().unwrap();
        write(
            &tmp.path().join("a.parquet"),
            &evaluations(&["t1"], &[1]),
        );
        let text_ids = RecordBatch::try_from_iter(vec![
            ("tenantId", Arc::new(StringArray::from(vec!["t1"])) as ArrayRef),
            (
                "opportunityId",
                Arc::new(StringArray::from(vec!["opp-1"])) as ArrayRef,
            ),
        ])
        .unwrap();
        write(&tmp.path().join("b.parquet"), &text_ids);

        let result = load_table(tmp.path().to_str().unwrap());
        assert!(matches!(result, Err(StoreError::ReadError { .. })));
    }

    #[test]
    fn corrupt_file_is_read_error_naming_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.parquet");
        std::fs::write(&path, b"not parquet").unwrap();

        match load_table(path.to_str().unwrap()) {
            Err(StoreError::ReadError { path: p, .. }) => assert!(p.ends_with("broken.parquet")),
            other => panic!("expected ReadError, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_keeps_schema() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.parquet");
        write(&path, &evaluations(&[], &[]));

        let table = load_table(path.to_str().unwrap()).unwrap();
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.num_columns(), 2);
    }

    #[test]
    fn footer_metadata_of_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let result = footer_metadata(&tmp.path().join("absent.parquet"));
        assert!(matches!(result, Err(StoreError::ReadError { .. })));
    }
}
