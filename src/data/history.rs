//! Recently scanned symbols
//!
//! Keeps a short most-recent-first list of symbols and persists it as JSON
//! so a front end can offer quick re-selection between sessions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::ScannerResult;

/// Default number of symbols remembered
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Most-recent-first symbol list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSymbols {
    capacity: usize,
    symbols: Vec<String>,
}

impl Default for RecentSymbols {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl RecentSymbols {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            symbols: Vec::new(),
        }
    }

    /// Record a lookup. The symbol is trimmed and uppercased, moved to the
    /// front if already present, and the oldest entry drops off at capacity.
    pub fn touch(&mut self, symbol: &str) {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return;
        }

        self.symbols.retain(|s| *s != symbol);
        self.symbols.insert(0, symbol);
        self.symbols.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn most_recent(&self) -> Option<&str> {
        self.symbols.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }

    /// Write the list as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> ScannerResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        tracing::info!("Saved {} recent symbols to {:?}", self.len(), path);
        Ok(())
    }

    /// Load a saved list. A missing file is an empty history.
    pub fn load(path: impl AsRef<Path>) -> ScannerResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let json = fs::read_to_string(path)?;
        let mut history: RecentSymbols = serde_json::from_str(&json)?;

        // Hand-edited files may violate the capacity
        history.capacity = history.capacity.max(1);
        history.symbols.truncate(history.capacity);

        tracing::info!("Loaded {} recent symbols from {:?}", history.len(), path);
        Ok(history)
    }
}

/// History file under a user data directory
pub fn default_history_path(data_dir: impl AsRef<Path>) -> PathBuf {
    data_dir.as_ref().join("recent_symbols.json")
}
