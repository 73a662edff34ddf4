//! Generation history: the most recent replies, newest first, stored as JSON.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::prompt::Intensity;
use crate::reply::ResponseTriple;

/// One past generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub message: String,
    pub intensity: Intensity,
    pub timestamp: DateTime<Utc>,
    pub responses: ResponseTriple,
}

impl HistoryItem {
    pub fn new(message: impl Into<String>, intensity: Intensity, responses: ResponseTriple) -> Self {
        Self {
            message: message.into(),
            intensity,
            timestamp: Utc::now(),
            responses,
        }
    }
}

/// Get the base data directory for audit-reply.
fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .map(|d| d.join("audit-reply"))
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

    Ok(data_dir)
}

/// Bounded history backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    limit: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
        }
    }

    /// Store at the default location: <data dir>/audit-reply/history.json
    pub fn open_default(limit: usize) -> Result<Self> {
        Ok(Self::new(get_data_dir()?.join("history.json"), limit))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries, newest first.
    ///
    /// A missing file is an empty history. A corrupt file is also treated as
    /// empty so a bad write never blocks generation.
    pub fn load(&self) -> Vec<HistoryItem> {
        if !self.path.exists() {
            return Vec::new();
        }

        let items = File::open(&self.path)
            .map_err(anyhow::Error::from)
            .and_then(|file| {
                serde_json::from_reader::<_, Vec<HistoryItem>>(BufReader::new(file))
                    .map_err(anyhow::Error::from)
            });

        match items {
            Ok(items) => items,
            Err(e) => {
                warn!("Ignoring unreadable history at {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Record a generation at the front, dropping the oldest beyond the limit.
    pub fn push(&self, item: HistoryItem) -> Result<Vec<HistoryItem>> {
        let mut items = self.load();
        items.insert(0, item);
        items.truncate(self.limit);
        self.save(&items)?;
        Ok(items)
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }

    fn save(&self, items: &[HistoryItem]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path).context("Failed to create history file")?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, items).context("Failed to write history JSON")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::normalize;
    use tempfile::TempDir;

    fn item(message: &str) -> HistoryItem {
        HistoryItem::new(message, Intensity::default(), normalize(""))
    }

    fn store(dir: &TempDir, limit: usize) -> HistoryStore {
        HistoryStore::new(dir.path().join("history.json"), limit)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir, 10).load().is_empty());
    }

    #[test]
    fn test_push_newest_first() {
        let dir = TempDir::new().unwrap();
        let history = store(&dir, 10);

        history.push(item("第一条")).unwrap();
        history.push(item("第二条")).unwrap();

        let items = history.load();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].message, "第二条");
        assert_eq!(items[1].message, "第一条");
    }

    #[test]
    fn test_push_truncates_to_limit() {
        let dir = TempDir::new().unwrap();
        let history = store(&dir, 3);

        for i in 0..5 {
            history.push(item(&format!("消息{i}"))).unwrap();
        }

        let items = history.load();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].message, "消息4");
        assert_eq!(items[2].message, "消息2");
    }

    #[test]
    fn test_round_trip_keeps_responses() {
        let dir = TempDir::new().unwrap();
        let history = store(&dir, 10);

        let original = item("预算调整");
        history.push(original.clone()).unwrap();
        assert_eq!(history.load(), vec![original]);
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let history = store(&dir, 10);
        fs::write(history.path(), "{not json").unwrap();

        assert!(history.load().is_empty());

        // Pushing over a corrupt file starts a fresh history
        history.push(item("新记录")).unwrap();
        assert_eq!(history.load().len(), 1);
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let history = store(&dir, 10);

        history.push(item("待清除")).unwrap();
        history.clear().unwrap();
        assert!(history.load().is_empty());

        // Clearing an absent history is fine
        history.clear().unwrap();
    }
}
