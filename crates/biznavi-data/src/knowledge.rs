//! Persisted policy knowledge index.
//!
//! Building turns every row of the policy CSV into one document, splits the
//! documents into overlapping chunks and embeds each chunk with a hashing
//! bag-of-words embedder. The result is written as a single JSON file
//! together with the SHA-256 of the source CSV, so a later load can tell
//! whether the source moved on since the build.
//!
//! Searching ranks chunks by cosine similarity against the embedded query.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use biznavi_contracts::error::{NaviError, NaviResult};
use biznavi_core::{text::tokenize, traits::KnowledgeIndex};

pub const DEFAULT_CHUNK_SIZE: usize = 600;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Rows whose joined text is this short or shorter carry no policy content.
const MIN_DOCUMENT_CHARS: usize = 20;

const INDEX_FORMAT_VERSION: u32 = 1;

// ── Chunking ──────────────────────────────────────────────────────────────────

/// Split `text` into chunks of at most `size` characters, each starting
/// `overlap` characters before the end of the previous one.
///
/// A chunk ends at the last whitespace in its second half when there is one,
/// so words are not cut in two.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let size = size.max(1);
    let overlap = overlap.min(size.saturating_sub(1));

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let mut end = (start + size).min(chars.len());
        if end < chars.len() {
            if let Some(ws) = chars[start + size / 2..end]
                .iter()
                .rposition(|c| c.is_whitespace())
            {
                end = start + size / 2 + ws;
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }
    chunks
}

// ── Embedding ─────────────────────────────────────────────────────────────────

/// Feature-hashing bag-of-words embedder.
///
/// Tokens are hashed with FNV-1a into a fixed number of buckets and the
/// vector is L2-normalised. The hash is stable across builds and platforms,
/// which a persisted index depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingEmbedder {
    pub dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimensions: 512 }
    }
}

impl HashingEmbedder {
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let dims = self.dimensions.max(1);
        let mut vector = vec![0f32; dims];
        for token in tokenize(text) {
            vector[(fnv1a(token.as_bytes()) % dims as u64) as usize] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// ── Stored index ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub text: String,
    pub vector: Vec<f32>,
}

/// The on-disk form of a built index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredIndex {
    pub version: u32,
    pub source: PathBuf,
    /// Hex SHA-256 of the source CSV at build time.
    pub source_sha256: String,
    pub built_at: DateTime<Utc>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embedder: HashingEmbedder,
    pub chunks: Vec<IndexedChunk>,
}

impl StoredIndex {
    /// Build an index from the policy CSV at `source`.
    pub fn build(source: &Path, chunk_size: usize, chunk_overlap: usize) -> NaviResult<Self> {
        let bytes = fs::read(source).map_err(|e| NaviError::Index {
            reason: format!("cannot read policy source '{}': {}", source.display(), e),
        })?;
        let documents = policy_documents(&bytes)?;

        let embedder = HashingEmbedder::default();
        let chunks: Vec<IndexedChunk> = documents
            .iter()
            .flat_map(|doc| chunk_text(doc, chunk_size, chunk_overlap))
            .map(|text| IndexedChunk {
                vector: embedder.embed(&text),
                text,
            })
            .collect();

        info!(
            source = %source.display(),
            documents = documents.len(),
            chunks = chunks.len(),
            "knowledge index built"
        );

        Ok(Self {
            version: INDEX_FORMAT_VERSION,
            source: source.to_path_buf(),
            source_sha256: sha256_hex(&bytes),
            built_at: Utc::now(),
            chunk_size,
            chunk_overlap,
            embedder,
            chunks,
        })
    }

    pub fn save(&self, path: &Path) -> NaviResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| NaviError::Index {
                    reason: format!("cannot create '{}': {}", parent.display(), e),
                })?;
            }
        }
        let json = serde_json::to_string(self)?;
        fs::write(path, json).map_err(|e| NaviError::Index {
            reason: format!("cannot write '{}': {}", path.display(), e),
        })
    }

    /// Load an index; a missing file is `NaviError::IndexNotBuilt`.
    pub fn load(path: &Path) -> NaviResult<Self> {
        if !path.is_file() {
            return Err(NaviError::IndexNotBuilt {
                path: path.display().to_string(),
            });
        }
        let json = fs::read_to_string(path).map_err(|e| NaviError::Index {
            reason: format!("cannot read '{}': {}", path.display(), e),
        })?;
        let index: StoredIndex = serde_json::from_str(&json).map_err(|e| NaviError::Index {
            reason: format!("'{}' is not a knowledge index: {}", path.display(), e),
        })?;
        if index.version != INDEX_FORMAT_VERSION {
            return Err(NaviError::Index {
                reason: format!(
                    "'{}' has format version {}, expected {}",
                    path.display(),
                    index.version,
                    INDEX_FORMAT_VERSION
                ),
            });
        }
        Ok(index)
    }

    /// True when the source file still hashes to the recorded digest.
    /// An unreadable source counts as fresh; there is nothing to compare.
    pub fn is_fresh(&self) -> bool {
        match fs::read(&self.source) {
            Ok(bytes) => sha256_hex(&bytes) == self.source_sha256,
            Err(_) => true,
        }
    }

    /// The `k` chunks most similar to `query`, best first. Chunks sharing no
    /// word with the query are never returned.
    pub fn search(&self, query: &str, k: usize) -> Vec<String> {
        let q = self.embedder.embed(query);
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|c| (dot(&q, &c.vector), c))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(k)
            .map(|(_, c)| c.text.clone())
            .collect()
    }
}

/// One document per CSV row: non-empty cells joined by spaces, kept when
/// longer than `MIN_DOCUMENT_CHARS`.
fn policy_documents(bytes: &[u8]) -> NaviResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let mut documents = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| NaviError::Index {
            reason: format!("policy row {}: {}", idx + 1, e),
        })?;
        let text = record
            .iter()
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.chars().count() > MIN_DOCUMENT_CHARS {
            documents.push(text);
        }
    }
    Ok(documents)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ── KnowledgeIndex implementation ─────────────────────────────────────────────

/// A `KnowledgeIndex` over an index file, loaded on first search.
#[derive(Debug)]
pub struct PersistedKnowledgeIndex {
    path: PathBuf,
    loaded: RwLock<Option<Arc<StoredIndex>>>,
}

impl PersistedKnowledgeIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Forget the loaded index so the next search re-reads the file.
    pub fn reload(&self) {
        *self.loaded.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn index(&self) -> NaviResult<Arc<StoredIndex>> {
        if let Some(index) = self
            .loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(StoredIndex::load(&self.path)?);
        if !index.is_fresh() {
            warn!(
                index = %self.path.display(),
                source = %index.source.display(),
                "policy source changed since the index was built; rebuild it"
            );
        }
        debug!(chunks = index.chunks.len(), "knowledge index loaded");
        *self.loaded.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&index));
        Ok(index)
    }
}

impl KnowledgeIndex for PersistedKnowledgeIndex {
    fn search(&self, query: &str, k: usize) -> NaviResult<Vec<String>> {
        Ok(self.index()?.search(query, k))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use biznavi_contracts::error::NaviError;
    use biznavi_core::traits::KnowledgeIndex;

    use super::{chunk_text, HashingEmbedder, PersistedKnowledgeIndex, StoredIndex};

    const POLICY: &str = "\
Topic,Detail
Shrinkage,Inventory shrinkage above 0.5 percent per quarter triggers a cycle count audit
Packaging,Fragile items must be double boxed with bubble wrap before outbound dispatch
Inbound,Inbound trucks are unloaded within four hours of arrival at the dock
Short,tiny
";

    #[test]
    fn chunks_respect_size_and_overlap() {
        let text = "word ".repeat(300);
        let chunks = chunk_text(&text, 600, 100);
        assert!(chunks.len() > 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 600));
        assert_eq!(chunk_text("short text", 600, 100), vec!["short text"]);
        assert!(chunk_text("", 600, 100).is_empty());
    }

    #[test]
    fn embedding_is_normalised_and_stable() {
        let e = HashingEmbedder::default();
        let v = e.embed("Shrinkage audit shrinkage");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert_eq!(v, e.embed("shrinkage AUDIT shrinkage"));
        assert!(e.embed("").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn build_skips_short_rows_and_finds_relevant_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("policy.csv");
        fs::write(&source, POLICY).unwrap();

        let index = StoredIndex::build(&source, 600, 100).unwrap();
        assert_eq!(index.chunks.len(), 3);
        assert!(index.is_fresh());

        let hits = index.search("what is the shrinkage limit", 3);
        assert!(!hits.is_empty() && hits.len() <= 3);
        assert!(hits[0].starts_with("Shrinkage"));
    }

    #[test]
    fn missing_index_file_is_not_built() {
        let index = PersistedKnowledgeIndex::new("/nonexistent/index.json");
        match index.search("anything", 3) {
            Err(NaviError::IndexNotBuilt { path }) => assert!(path.contains("index.json")),
            other => panic!("expected IndexNotBuilt, got {:?}", other),
        }
    }

    #[test]
    fn saved_index_is_searchable_and_detects_stale_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("policy.csv");
        let path = dir.path().join("db").join("index.json");
        fs::write(&source, POLICY).unwrap();

        StoredIndex::build(&source, 600, 100).unwrap().save(&path).unwrap();
        let persisted = PersistedKnowledgeIndex::new(&path);
        let hits = persisted.search("fragile packaging rules", 3).unwrap();
        assert!(hits[0].starts_with("Packaging"));

        fs::write(&source, "Topic,Detail\nNew,Completely different policy text here\n").unwrap();
        assert!(!StoredIndex::load(&path).unwrap().is_fresh());
    }
}
