//! Merge persisted chunk files into one flattened event corpus.
//!
//! Each chunk is a GeoJSON feature collection. Every feature is flattened into
//! a single object built from its `properties` and `geometry` members, minus
//! the administrative keys listed in [`KeyPolicy::CATALOG`]. The output is a
//! JSON array written one feature at a time so that only one chunk is held in
//! memory.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::acquisition::CHUNK_FILE_PREFIX;
use crate::error::JoinError;

/// Flush the output after this many input files.
const FLUSH_EVERY_FILES: usize = 10;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRule {
    Keep,
    Drop,
}

/// Decides which feature keys survive flattening.
#[derive(Debug, Clone, Copy)]
pub struct KeyPolicy {
    rules: &'static [(&'static str, KeyRule)],
    default: KeyRule,
}

impl KeyPolicy {
    /// Policy for USGS catalog features: administrative keys are dropped,
    /// everything else is kept.
    pub const CATALOG: KeyPolicy = KeyPolicy {
        rules: &[
            ("id", KeyRule::Drop),
            ("url", KeyRule::Drop),
            ("detail", KeyRule::Drop),
            ("code", KeyRule::Drop),
            ("ids", KeyRule::Drop),
            ("sources", KeyRule::Drop),
            ("types", KeyRule::Drop),
            ("title", KeyRule::Drop),
            ("status", KeyRule::Drop),
            ("type", KeyRule::Drop),
        ],
        default: KeyRule::Keep,
    };

    pub fn rule_for(&self, key: &str) -> KeyRule {
        self.rules
            .iter()
            .find(|(k, _)| *k == key)
            .map_or(self.default, |(_, rule)| *rule)
    }

    pub fn keeps(&self, key: &str) -> bool {
        self.rule_for(key) == KeyRule::Keep
    }

    /// Every key with an explicit rule of `rule`.
    pub fn keys_with(&self, rule: KeyRule) -> impl Iterator<Item = &'static str> + '_ {
        self.rules
            .iter()
            .filter(move |(_, r)| *r == rule)
            .map(|(k, _)| *k)
    }
}

/// One feature record as found in a chunk file.
#[derive(Debug, Default, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometry: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ChunkFile {
    /// Outer `None` when the key is absent, inner `None` for `null`.
    #[serde(default, deserialize_with = "present")]
    features: Option<Option<Vec<RawFeature>>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Flatten a feature. Geometry keys are applied after properties keys and
/// replace them on collision.
pub fn parse_feature(feature: RawFeature, policy: &KeyPolicy) -> Map<String, Value> {
    // ---
    let mut parsed = Map::new();
    for section in [feature.properties, feature.geometry].into_iter().flatten() {
        for (key, value) in section {
            if policy.keeps(&key) {
                parsed.insert(key, value);
            }
        }
    }
    parsed
}

// ---

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JoinSummary {
    pub files_found: usize,
    pub files_skipped: usize,
    pub events_written: u64,
}

/// Streams chunk files into a single corpus file.
pub struct FileJoiner {
    policy: KeyPolicy,
}

impl Default for FileJoiner {
    fn default() -> Self {
        Self {
            policy: KeyPolicy::CATALOG,
        }
    }
}

impl FileJoiner {
    pub fn new(policy: KeyPolicy) -> Self {
        Self { policy }
    }

    /// Join every chunk file in `input_dir` into `output`.
    pub fn join_dir(&self, input_dir: &Path, output: &Path) -> Result<JoinSummary, JoinError> {
        // ---
        let files = list_chunk_files(input_dir)?;
        info!("Found {} data files to process", files.len());
        self.join(&files, output)
    }

    /// Join `chunk_files` into `output`, replacing any previous output.
    ///
    /// Files that cannot be read or parsed are logged and skipped. Only
    /// failures writing `output` abort the join.
    pub fn join(&self, chunk_files: &[PathBuf], output: &Path) -> Result<JoinSummary, JoinError> {
        // ---
        let mut out = BufWriter::new(File::create(output)?);
        let mut summary = JoinSummary {
            files_found: chunk_files.len(),
            ..JoinSummary::default()
        };

        out.write_all(b"[\n")?;
        let mut first_feature = true;

        for (i, path) in chunk_files.iter().enumerate() {
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            info!("Processing file {}/{}: {}", i + 1, chunk_files.len(), name);

            match read_features(path) {
                Ok(features) => {
                    let file_events = features.len() as u64;
                    for feature in features {
                        let parsed = parse_feature(feature, &self.policy);
                        if !first_feature {
                            out.write_all(b",\n")?;
                        }
                        first_feature = false;
                        serde_json::to_writer(&mut out, &parsed)?;
                    }
                    summary.events_written += file_events;
                    info!(
                        "Added {} parsed events (total: {})",
                        file_events, summary.events_written
                    );
                }
                Err(e) => {
                    warn!("Error processing {}: {}", name, e);
                    summary.files_skipped += 1;
                }
            }

            if (i + 1) % FLUSH_EVERY_FILES == 0 {
                out.flush()?;
            }
        }

        out.write_all(b"\n]")?;
        out.flush()?;

        info!(
            "Joined {} events from {} files into {} ({} skipped)",
            summary.events_written,
            summary.files_found,
            output.display(),
            summary.files_skipped
        );
        Ok(summary)
    }
}

fn read_features(path: &Path) -> Result<Vec<RawFeature>, JoinError> {
    // ---
    let reader = BufReader::new(File::open(path)?);
    let chunk: ChunkFile = serde_json::from_reader(reader)?;
    // A null collection is a chunk without events, not a broken file.
    chunk
        .features
        .map(Option::unwrap_or_default)
        .ok_or(JoinError::MissingKey("features"))
}

/// Chunk files in `dir`, in file name (and therefore date) order.
pub fn list_chunk_files(dir: &Path) -> Result<Vec<PathBuf>, JoinError> {
    // ---
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_chunk = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(CHUNK_FILE_PREFIX) && n.ends_with(".json"));
        if is_chunk && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
