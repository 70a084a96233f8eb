use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};
use tantivy::schema::{NumericOptions, STORED, STRING, Schema, TantivyDocument};
use tantivy::{Index, IndexWriter};
use tokio::fs;
use tokio::task;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::datasets::DatasetFile;
use crate::store::{
    Catalog, Collection, CollectionFields, CollectionKind, DOCUMENT_FIELD, RELEASE_DATE_FIELD,
    VOTE_AVERAGE_FIELD,
};

const WRITER_MEMORY_BUDGET: usize = 64 * 1024 * 1024;
const RAM_WRITER_MEMORY_BUDGET: usize = 20_000_000;

pub fn build_schema(kind: CollectionKind) -> Schema {
    let mut schema_builder = Schema::builder();

    let numeric_options = NumericOptions::default()
        .set_indexed()
        .set_stored()
        .set_fast();

    schema_builder.add_i64_field(kind.numeric_key(), numeric_options.clone());
    schema_builder.add_text_field(kind.text_key(), STRING | STORED);
    if kind.has_release_fields() {
        schema_builder.add_text_field(RELEASE_DATE_FIELD, STRING | STORED);
        schema_builder.add_f64_field(VOTE_AVERAGE_FIELD, numeric_options);
    }
    schema_builder.add_text_field(DOCUMENT_FIELD, STORED);

    schema_builder.build()
}

/// Builds any missing collection index from the prepared dumps.
///
/// Existing indexes are reused untouched; delete the index directory to
/// force a rebuild.
pub async fn prepare_store(config: &AppConfig, datasets: &[DatasetFile]) -> Result<()> {
    fs::create_dir_all(&config.index_dir)
        .await
        .with_context(|| format!("creating index root at {}", config.index_dir.display()))?;

    for kind in CollectionKind::ALL {
        let index_dir = config.index_dir.join(kind.name());
        if index_exists(&index_dir) {
            info!(collection = %kind, path = %index_dir.display(), "reusing existing index");
            continue;
        }

        let source = datasets
            .iter()
            .find(|dataset| dataset.collection == kind)
            .filter(|dataset| dataset.jsonl_path.exists())
            .map(|dataset| dataset.jsonl_path.clone());
        if source.is_none() {
            warn!(collection = %kind, "no dump available; building an empty collection");
        }

        task::spawn_blocking(move || {
            build_collection_index_sync(kind, &index_dir, source.as_deref())
        })
        .await
        .context("joining index build task")??;
    }

    Ok(())
}

fn index_exists(index_dir: &Path) -> bool {
    index_dir.join("meta.json").exists()
}

fn build_collection_index_sync(
    kind: CollectionKind,
    index_dir: &Path,
    source: Option<&Path>,
) -> Result<()> {
    if index_dir.exists() {
        std::fs::remove_dir_all(index_dir)
            .with_context(|| format!("clearing existing index at {}", index_dir.display()))?;
    }
    std::fs::create_dir_all(index_dir)
        .with_context(|| format!("creating index directory {}", index_dir.display()))?;

    let index = Index::create_in_dir(index_dir, build_schema(kind))
        .with_context(|| format!("creating {kind} index in {}", index_dir.display()))?;
    let mut writer = index
        .writer::<TantivyDocument>(WRITER_MEMORY_BUDGET)
        .with_context(|| format!("creating {kind} index writer"))?;
    let fields = CollectionFields::new(kind, &index.schema())?;

    let mut record_count = 0usize;
    if let Some(path) = source {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("reading {}", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Value = serde_json::from_str(&line)
                .with_context(|| format!("parsing {} line {}", path.display(), line_no + 1))?;
            add_record(&mut writer, kind, &fields, record)
                .with_context(|| format!("indexing {} line {}", path.display(), line_no + 1))?;
            record_count += 1;

            if record_count.is_multiple_of(10_000) {
                info!(collection = %kind, processed = record_count, "indexing progress");
            }
        }
    }

    info!(collection = %kind, processed = record_count, "committing index");
    writer
        .commit()
        .with_context(|| format!("committing {kind} index"))?;
    Ok(())
}

/// Builds a catalog held entirely in memory.
pub fn build_catalog_in_ram(
    movies: impl IntoIterator<Item = Value>,
    credits: impl IntoIterator<Item = Value>,
    actors: impl IntoIterator<Item = Value>,
) -> Result<Catalog> {
    Ok(Catalog::new(
        build_collection_in_ram(CollectionKind::Movies, movies)?,
        build_collection_in_ram(CollectionKind::Credits, credits)?,
        build_collection_in_ram(CollectionKind::Actors, actors)?,
    ))
}

fn build_collection_in_ram(
    kind: CollectionKind,
    records: impl IntoIterator<Item = Value>,
) -> Result<Collection> {
    let index = Index::create_in_ram(build_schema(kind));
    let fields = CollectionFields::new(kind, &index.schema())?;
    let mut writer = index
        .writer::<TantivyDocument>(RAM_WRITER_MEMORY_BUDGET)
        .with_context(|| format!("creating {kind} index writer"))?;
    for record in records {
        add_record(&mut writer, kind, &fields, record)?;
    }
    writer
        .commit()
        .with_context(|| format!("committing {kind} index"))?;
    Ok(Collection::new(kind, &index)?)
}

fn add_record(
    writer: &mut IndexWriter,
    kind: CollectionKind,
    fields: &CollectionFields,
    record: Value,
) -> Result<()> {
    let Value::Object(mut record) = record else {
        return Err(anyhow!("{kind} record is not a JSON object"));
    };
    flatten_object_id(&mut record);

    let mut doc = TantivyDocument::default();
    if let Some(id) = record.get(kind.numeric_key()).and_then(integral_number) {
        doc.add_i64(fields.numeric_key, id);
    }
    if let Some(text) = record.get(kind.text_key()).and_then(Value::as_str) {
        doc.add_text(fields.text_key, text);
    }
    if let Some(field) = fields.release_date
        && let Some(date) = record.get(RELEASE_DATE_FIELD).and_then(Value::as_str)
    {
        doc.add_text(field, date);
    }
    if let Some(field) = fields.vote_average
        && let Some(rating) = record.get(VOTE_AVERAGE_FIELD).and_then(Value::as_f64)
    {
        doc.add_f64(field, rating);
    }
    doc.add_text(fields.document, serde_json::to_string(&record)?);

    writer
        .add_document(doc)
        .with_context(|| format!("adding document to {kind} index"))?;
    Ok(())
}

/// Replaces an extended-JSON `{"_id": {"$oid": "..."}}` with the bare hex string.
fn flatten_object_id(record: &mut Map<String, Value>) {
    let oid = match record.get("_id") {
        Some(Value::Object(inner)) => match inner.get("$oid") {
            Some(Value::String(oid)) => oid.clone(),
            _ => return,
        },
        _ => return,
    };
    record.insert("_id".to_string(), Value::String(oid));
}

/// Accepts integers and floats without a fractional part.
fn integral_number(value: &Value) -> Option<i64> {
    if let Some(id) = value.as_i64() {
        return Some(id);
    }
    let float = value.as_f64()?;
    if float.fract() == 0.0 && float >= i64::MIN as f64 && float <= i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}
