//! HTTP genesis fetcher
//!
//! Downloads a genesis from a URL. Two payloads are accepted:
//!
//! - a raw JSON document, written to the destination as-is
//! - a gzipped tarball (`.tar.gz` / `.tgz` URL or gzip magic bytes), kept in
//!   the download directory, extracted with the system `tar`, and whose first
//!   `genesis.json` is copied to the destination

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use crate::adapters::process;
use crate::context::BootstrapContext;
use crate::domain::GenesisArtifact;
use crate::error::FetchError;
use crate::ports::GenesisFetcher;

/// Name of the genesis document looked up inside archives
pub const GENESIS_FILE_NAME: &str = "genesis.json";

const TARBALL_NAME: &str = "genesis.tar.gz";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fetches geneses over HTTP(S) with `reqwest`
///
/// Tarball extraction runs the platform `tar` binary, which must be on
/// `PATH`; without it tarball URLs fail with [`FetchError::Extraction`].
/// Raw JSON geneses need no external tools.
#[derive(Clone, Debug)]
pub struct HttpGenesisFetcher {
    client: reqwest::Client,
    download_dir: PathBuf,
}

impl HttpGenesisFetcher {
    /// Create a fetcher keeping downloaded tarballs under `download_dir`
    pub fn new(download_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        // reqwest::Client::new() is infallible if the builder is not
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            download_dir: download_dir.into(),
        }
    }

    async fn download(&self, ctx: &BootstrapContext, url: &str) -> Result<Vec<u8>, FetchError> {
        let request_error = |e: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let cancelled = || FetchError::Interrupted {
            url: url.to_string(),
        };

        let response = tokio::select! {
            response = self.client.get(url).send() => response.map_err(request_error)?,
            _ = ctx.done() => return Err(cancelled()),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = tokio::select! {
            body = response.bytes() => body.map_err(request_error)?,
            _ = ctx.done() => return Err(cancelled()),
        };
        Ok(body.to_vec())
    }

    /// Scratch directory for one URL, stable across runs
    fn scratch_dir(&self, url: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(url.as_bytes()));
        self.download_dir.join(&digest[..16])
    }

    async fn extract_tarball(
        &self,
        ctx: &BootstrapContext,
        url: &str,
        body: &[u8],
        dest: &Path,
    ) -> Result<GenesisArtifact, FetchError> {
        let scratch = self.scratch_dir(url);
        let tarball = scratch.join(TARBALL_NAME);
        let extracted = scratch.join("extracted");

        remove_dir_if_present(&extracted).await?;
        fs::create_dir_all(&extracted).await.map_err(io_at(&extracted))?;
        fs::write(&tarball, body).await.map_err(io_at(&tarball))?;

        let mut command = Command::new("tar");
        command.arg("-xzf").arg(&tarball).arg("-C").arg(&extracted);
        process::run(ctx, "tar", command)
            .await
            .map_err(|e| FetchError::Extraction {
                archive: tarball.clone(),
                reason: e.to_string(),
            })?;

        let genesis = find_file(&extracted, GENESIS_FILE_NAME)
            .await?
            .ok_or_else(|| FetchError::MissingGenesis {
                archive: tarball.clone(),
            })?;
        debug!(found = %genesis.display(), "Genesis located in tarball");

        let contents = fs::read(&genesis).await.map_err(io_at(&genesis))?;
        write_dest(dest, &contents).await?;

        Ok(GenesisArtifact::new(dest).with_tarball(tarball))
    }
}

#[async_trait]
impl GenesisFetcher for HttpGenesisFetcher {
    async fn fetch(
        &self,
        ctx: &BootstrapContext,
        url: &str,
        dest: &Path,
    ) -> Result<GenesisArtifact, FetchError> {
        info!(url, dest = %dest.display(), "Fetching genesis");
        let body = self.download(ctx, url).await?;

        if is_tarball(url, &body) {
            return self.extract_tarball(ctx, url, &body, dest).await;
        }

        serde_json::from_slice::<serde_json::Value>(&body).map_err(|e| FetchError::NotJson {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        write_dest(dest, &body).await?;

        Ok(GenesisArtifact::new(dest))
    }
}

/// Whether a downloaded body is a gzipped tarball
pub fn is_tarball(url: &str, body: &[u8]) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.ends_with(".tar.gz") || path.ends_with(".tgz") || body.starts_with(&GZIP_MAGIC)
}

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> FetchError + '_ {
    move |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn write_dest(dest: &Path, contents: &[u8]) -> Result<(), FetchError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await.map_err(io_at(parent))?;
    }
    fs::write(dest, contents).await.map_err(io_at(dest))
}

async fn remove_dir_if_present(dir: &Path) -> Result<(), FetchError> {
    match fs::remove_dir_all(dir).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(FetchError::Io {
            path: dir.to_path_buf(),
            source: e,
        }),
        _ => Ok(()),
    }
}

/// Breadth-first search for a file called `name` below `root`
async fn find_file(root: &Path, name: &str) -> Result<Option<PathBuf>, FetchError> {
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        let mut entries = fs::read_dir(&dir).await.map_err(io_at(&dir))?;
        let mut subdirs = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(io_at(&dir))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(io_at(&path))?;
            if file_type.is_file() && entry.file_name() == name {
                return Ok(Some(path));
            }
            if file_type.is_dir() {
                subdirs.push(path);
            }
        }

        subdirs.sort();
        queue.extend(subdirs);
    }
    Ok(None)
}
