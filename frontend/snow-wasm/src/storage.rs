//! Persistence of the ground snapshot
//!
//! The snowpack survives page loads by writing its height samples to a
//! key-value store as a JSON array. Any failure here is recoverable: callers
//! log it and fall back to a freshly synthesized ground.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;

/// Key-value storage for the ground snapshot.
pub trait GroundStore {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process store, used headless and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    /// Every `load` errors, as a browser with storage disabled would.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Every `save` errors, as a full quota would.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl GroundStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads {
            bail!("storage unavailable");
        }
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            bail!("storage quota exceeded writing {key}");
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Outcome of reading a stored snapshot against the current width.
#[derive(Debug, PartialEq)]
pub enum SnapshotRead {
    Accepted(Vec<f32>),
    LengthMismatch { expected: usize, found: usize },
    Unparsable(String),
}

pub fn encode_snapshot(samples: &[f32]) -> Result<String> {
    serde_json::to_string(samples).context("encoding ground snapshot")
}

pub fn decode_snapshot(text: &str, expected_len: usize) -> SnapshotRead {
    let samples: Vec<f32> = match serde_json::from_str(text) {
        Ok(samples) => samples,
        Err(e) => return SnapshotRead::Unparsable(e.to_string()),
    };
    if samples.len() != expected_len {
        return SnapshotRead::LengthMismatch {
            expected: expected_len,
            found: samples.len(),
        };
    }
    if let Some(bad) = samples.iter().position(|h| !h.is_finite()) {
        return SnapshotRead::Unparsable(format!("non-finite sample at column {bad}"));
    }
    SnapshotRead::Accepted(samples)
}
