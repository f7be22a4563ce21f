//! Long-term memory of completed jobs.
//!
//! The core only needs the narrow [`MemoryStore`] contract: recall a few
//! related past results to fold into a prompt, and remember a deliverable
//! after a successful job. The bundled implementation is a file-backed
//! store with lexical-overlap scoring; `remember` is best-effort and its
//! failures are logged, never fatal to a job that already succeeded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub trait MemoryStore {
    /// Return up to `k` stored texts related to `query`, best match first.
    /// May be empty.
    fn recall(&self, query: &str, k: usize) -> Vec<String>;

    /// Store a completed job's deliverable. Returns whether the write took.
    fn remember(&mut self, job_id: &str, content: &str) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryEntry {
    id: String,
    content: String,
}

/// JSON-file-backed memory store.
#[derive(Debug)]
pub struct FileMemory {
    path: PathBuf,
    entries: Vec<MemoryEntry>,
}

impl FileMemory {
    /// Open (or create) a memory file. A missing file is an empty store;
    /// an unreadable one is an error so corruption is not silently wiped.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_string)
        .collect()
}

impl MemoryStore for FileMemory {
    fn recall(&self, query: &str, k: usize) -> Vec<String> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(usize, &MemoryEntry)> = self
            .entries
            .iter()
            .map(|entry| {
                let entry_tokens = tokenize(&entry.content);
                let score = query_tokens
                    .iter()
                    .filter(|t| entry_tokens.contains(t))
                    .count();
                (score, entry)
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(k)
            .map(|(_, e)| e.content.clone())
            .collect()
    }

    fn remember(&mut self, job_id: &str, content: &str) -> bool {
        self.entries.push(MemoryEntry {
            id: job_id.to_string(),
            content: content.to_string(),
        });
        match self.persist() {
            Ok(()) => true,
            Err(e) => {
                eprintln!("memory write failed for job {job_id}: {e}");
                false
            }
        }
    }
}

/// A store that remembers nothing. Useful in tests and for the plan path.
#[derive(Debug, Default)]
pub struct NullMemory;

impl MemoryStore for NullMemory {
    fn recall(&self, _query: &str, _k: usize) -> Vec<String> {
        Vec::new()
    }

    fn remember(&mut self, _job_id: &str, _content: &str) -> bool {
        true
    }
}
