//! Chunk download and the on-disk chunk directory.

use std::path::{Path, PathBuf};

use tracing::info;

use super::catalog::EventFetcher;
use crate::error::AcquisitionError;
use crate::models::{Chunk, DateRange};

/// Prefix shared by every chunk file; the joiner selects on it.
pub const CHUNK_FILE_PREFIX: &str = "earthquake_data_";

// ---

/// The directory chunk files are written to.
///
/// Created explicitly by [`ChunkStore::prepare`] and removed only through
/// [`ChunkStore::discard`].
#[derive(Debug, Clone)]
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    /// Make sure `dir` exists. With `fresh`, any previous contents are removed first.
    pub fn prepare(dir: impl Into<PathBuf>, fresh: bool) -> Result<Self, AcquisitionError> {
        // ---
        let dir = dir.into();
        if fresh && dir.exists() {
            info!("Clearing previous chunk directory {}", dir.display());
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for the chunk covering `range`.
    pub fn path_for(&self, range: &DateRange) -> PathBuf {
        self.dir.join(chunk_file_name(range))
    }

    /// Remove the directory and every chunk in it.
    pub fn discard(self) -> Result<(), AcquisitionError> {
        std::fs::remove_dir_all(&self.dir)?;
        Ok(())
    }
}

pub fn chunk_file_name(range: &DateRange) -> String {
    format!(
        "{CHUNK_FILE_PREFIX}{}_{}.json",
        range.start_str(),
        range.end_str()
    )
}

// ---

/// Downloads one planned range and persists the body verbatim.
pub struct ChunkDownloader<'a, F> {
    fetcher: &'a F,
    store: &'a ChunkStore,
}

impl<'a, F: EventFetcher + Sync> ChunkDownloader<'a, F> {
    pub fn new(fetcher: &'a F, store: &'a ChunkStore) -> Self {
        Self { fetcher, store }
    }

    /// Fetch `range` and write it to its chunk file.
    ///
    /// `expected_count` is the planning count and is returned as-is; the
    /// payload is not inspected.
    pub async fn download(
        &self,
        range: DateRange,
        expected_count: u64,
    ) -> Result<Chunk, AcquisitionError> {
        // ---
        let body = self.fetcher.fetch(&range).await?;

        let path = self.store.path_for(&range);
        tokio::fs::write(&path, body.as_bytes()).await?;

        info!(
            "Data downloaded: {} to {} ({} events)",
            range.start, range.end, expected_count
        );

        Ok(Chunk {
            range,
            expected_count,
            path,
        })
    }
}
