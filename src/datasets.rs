use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use futures_util::TryStreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::task;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::store::CollectionKind;

/// A JSON-lines dump of one collection, one document per line.
#[derive(Debug, Clone)]
pub struct DatasetFile {
    pub collection: CollectionKind,
    pub gz_path: PathBuf,
    pub jsonl_path: PathBuf,
}

impl DatasetFile {
    pub fn new(data_dir: &Path, collection: CollectionKind) -> Self {
        let jsonl_name = format!("{}.jsonl", collection.name());
        let gz_path = data_dir.join(format!("{jsonl_name}.gz"));
        let jsonl_path = data_dir.join(jsonl_name);
        Self {
            collection,
            gz_path,
            jsonl_path,
        }
    }

    fn archive_name(&self) -> String {
        format!("{}.jsonl.gz", self.collection.name())
    }
}

/// Makes sure every collection dump is available locally, fetching and
/// unpacking archives when a dataset URL is configured.
pub async fn prepare_datasets(config: &AppConfig) -> Result<Vec<DatasetFile>> {
    fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("creating data directory at {}", config.data_dir.display()))?;

    let files: Vec<DatasetFile> = CollectionKind::ALL
        .into_iter()
        .map(|collection| DatasetFile::new(&config.data_dir, collection))
        .collect();

    match config.dataset_url.as_deref() {
        Some(base_url) => download_missing_files(base_url, &files).await?,
        None => debug!("no dataset url configured; using local dumps only"),
    }
    decompress_archives(&files).await?;

    for file in &files {
        if !file.jsonl_path.exists() {
            warn!(
                collection = %file.collection,
                path = %file.jsonl_path.display(),
                "dump not found"
            );
        }
    }

    Ok(files)
}

async fn download_missing_files(base_url: &str, files: &[DatasetFile]) -> Result<()> {
    let client = reqwest::Client::new();
    for file in files {
        if file.gz_path.exists() {
            debug!(path = %file.gz_path.display(), "archive already downloaded");
            continue;
        }

        if file.jsonl_path.exists() {
            debug!(path = %file.jsonl_path.display(), "dump already prepared");
            continue;
        }

        let url = format!("{}/{}", base_url.trim_end_matches('/'), file.archive_name());
        info!(%url, path = %file.gz_path.display(), "downloading dump");

        let resp = client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {}", url))?;

        if !resp.status().is_success() {
            anyhow::bail!("failed to download {}: status {}", url, resp.status());
        }

        let mut stream = resp.bytes_stream();
        let mut tmp_path = file.gz_path.clone();
        tmp_path.set_extension("tmp-download");
        let mut dest = fs::File::create(&tmp_path)
            .await
            .with_context(|| format!("creating {}", tmp_path.display()))?;

        while let Some(chunk) = stream.try_next().await? {
            dest.write_all(&chunk).await?;
        }
        dest.flush().await?;
        drop(dest);

        fs::rename(&tmp_path, &file.gz_path)
            .await
            .with_context(|| {
                format!("moving download into place for {}", file.gz_path.display())
            })?;
    }
    Ok(())
}

async fn decompress_archives(files: &[DatasetFile]) -> Result<()> {
    for file in files {
        if !file.gz_path.exists() {
            continue;
        }

        if file.jsonl_path.exists() {
            let gz_meta = fs::metadata(&file.gz_path).await.ok();
            let jsonl_meta = fs::metadata(&file.jsonl_path).await.ok();
            if let (Some(gz), Some(jsonl)) = (gz_meta, jsonl_meta)
                && let (Ok(gz_time), Ok(jsonl_time)) = (gz.modified(), jsonl.modified())
                && gz_time <= jsonl_time
            {
                debug!(path = %file.jsonl_path.display(), "decompression up to date");
                remove_archive(&file.gz_path).await;
                continue;
            }
        }

        let gz_path = file.gz_path.clone();
        let jsonl_path = file.jsonl_path.clone();
        info!(
            gz = %gz_path.display(),
            jsonl = %jsonl_path.display(),
            "decompressing dump"
        );

        task::spawn_blocking(move || decompress_sync(&gz_path, &jsonl_path))
            .await
            .context("joining decompression task")??;

        remove_archive(&file.gz_path).await;
    }
    Ok(())
}

async fn remove_archive(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        warn!(
            path = %path.display(),
            error = %err,
            "failed to remove compressed archive"
        );
    } else {
        debug!(path = %path.display(), "removed compressed archive");
    }
}

fn decompress_sync(gz_path: &Path, jsonl_path: &Path) -> Result<()> {
    let input =
        File::open(gz_path).with_context(|| format!("opening archive {}", gz_path.display()))?;
    let reader = BufReader::new(input);
    let mut decoder = GzDecoder::new(reader);

    let output = File::create(jsonl_path)
        .with_context(|| format!("creating decompressed file {}", jsonl_path.display()))?;
    let mut writer = BufWriter::new(output);

    std::io::copy(&mut decoder, &mut writer)
        .with_context(|| format!("decompressing {}", gz_path.display()))?;
    writer.flush()?;
    Ok(())
}
