//! History aggregation.
//!
//! Holds the working history (newest first) built from persisted records and
//! fresh generations or uploads, and derives display groupings from it.
//! Groupings are recomputed on every call and never stored.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::instrument;

use crate::error::CoreError;
use crate::model::HistoryEntry;
use crate::session::Session;
use crate::traits::HistoryStore;

#[derive(Debug, Clone, Default)]
pub struct HistoryAggregator {
    entries: Vec<HistoryEntry>,
}

impl HistoryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the working history.
    pub fn ingest(&mut self, records: Vec<HistoryEntry>) {
        self.entries = records;
    }

    /// Insert an entry at the front, leaving the rest in order.
    pub fn prepend(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries grouped by [`HistoryEntry::kind`], each group in history order.
    pub fn group_by_kind(&self) -> BTreeMap<&str, Vec<&HistoryEntry>> {
        let mut groups: BTreeMap<&str, Vec<&HistoryEntry>> = BTreeMap::new();
        for entry in &self.entries {
            groups.entry(entry.kind()).or_default().push(entry);
        }
        groups
    }

    /// Fetch the user's persisted history and ingest it.
    #[instrument(skip_all, fields(user = %session.username()))]
    pub async fn refresh(
        &mut self,
        store: &dyn HistoryStore,
        session: &Session,
    ) -> Result<usize, CoreError> {
        let records = store
            .history(session.credential(), session.username())
            .await?;
        tracing::debug!(count = records.len(), "history loaded");
        self.ingest(records);
        Ok(self.entries.len())
    }

    /// Write the working history as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.entries).context("failed to serialize history")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write history to {}", path.display()))?;
        Ok(())
    }

    /// Load a history previously written by [`save_json`](Self::save_json).
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read history from {}", path.display()))?;
        let entries: Vec<HistoryEntry> =
            serde_json::from_str(&content).context("failed to parse history JSON")?;
        Ok(Self { entries })
    }
}

/// Entries that record a scored quiz attempt, in input order.
pub fn filter_quiz_results(records: &[HistoryEntry]) -> Vec<&HistoryEntry> {
    records.iter().filter(|e| e.is_quiz_result()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OTHER_KIND;
    use crate::test_support::{session_for, StubHistory};

    fn media(kind: &str, url: &str) -> HistoryEntry {
        HistoryEntry {
            media_type: Some(kind.into()),
            storage_url: Some(url.into()),
            ..Default::default()
        }
    }

    fn text(output: &str) -> HistoryEntry {
        HistoryEntry {
            entry_type: Some("text".into()),
            output: Some(output.into()),
            ..Default::default()
        }
    }

    fn quiz_result(quiz_id: &str, score: Option<u32>) -> HistoryEntry {
        HistoryEntry {
            quiz_id: Some(quiz_id.into()),
            score,
            total: Some(3),
            ..Default::default()
        }
    }

    fn sample() -> HistoryAggregator {
        let mut history = HistoryAggregator::new();
        history.ingest(vec![
            media("image", "https://x/2.png"),
            text("second"),
            media("video", "https://x/1.mp4"),
            media("image", "https://x/1.png"),
            text("first"),
            HistoryEntry::default(),
        ]);
        history
    }

    #[test]
    fn groups_preserve_newest_first_order() {
        let history = sample();
        let groups = history.group_by_kind();

        let keys: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["image", OTHER_KIND, "text", "video"]);

        let images: Vec<_> = groups["image"]
            .iter()
            .map(|e| e.storage_url.as_deref().unwrap())
            .collect();
        assert_eq!(images, vec!["https://x/2.png", "https://x/1.png"]);

        let texts: Vec<_> = groups["text"]
            .iter()
            .map(|e| e.output.as_deref().unwrap())
            .collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn prepend_goes_first_in_its_group_only() {
        let mut history = sample();
        let before = history.clone();
        let fresh = media("image", "https://x/3.png");

        history.prepend(fresh.clone());
        assert_eq!(history.entries()[0], fresh);
        assert_eq!(&history.entries()[1..], before.entries());

        let groups = history.group_by_kind();
        let old_groups = before.group_by_kind();
        assert_eq!(groups["image"][0], &fresh);
        assert_eq!(&groups["image"][1..], &old_groups["image"][..]);
        assert_eq!(groups["text"], old_groups["text"]);
        assert_eq!(groups["video"], old_groups["video"]);
    }

    #[test]
    fn grouping_is_idempotent() {
        let history = sample();
        assert_eq!(history.group_by_kind(), history.group_by_kind());
        assert_eq!(history.len(), 6);
    }

    #[test]
    fn ingest_replaces() {
        let mut history = sample();
        history.ingest(vec![text("only")]);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn quiz_results_need_id_and_score() {
        let records = vec![
            quiz_result("a", Some(2)),
            media("image", "https://x/1.png"),
            quiz_result("b", None),
            HistoryEntry {
                score: Some(1),
                ..Default::default()
            },
            quiz_result("c", Some(0)),
        ];
        let results = filter_quiz_results(&records);
        let ids: Vec<_> = results.iter().map(|e| e.quiz_id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(filter_quiz_results(&records), results);
    }

    #[test]
    fn json_export_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports/history.json");
        let history = sample();
        history.save_json(&path).unwrap();

        let loaded = HistoryAggregator::load_json(&path).unwrap();
        assert_eq!(loaded.entries(), history.entries());
    }

    #[tokio::test]
    async fn refresh_ingests_store_records() {
        let store = StubHistory::new(vec![
            HistoryEntry {
                user: Some("kid1".into()),
                ..media("image", "https://x/1.png")
            },
            HistoryEntry {
                user: Some("someone-else".into()),
                ..text("hidden")
            },
        ]);
        let mut history = sample();
        let count = history.refresh(&store, &session_for("kid1")).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(history.entries()[0].kind(), "image");
    }
}
