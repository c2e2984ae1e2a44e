//! The result store.
//!
//! Owns the in-memory [`Database`] and is the only thing that mutates it.
//! Every mutation re-derives the affected level's statistics from the full
//! result list and then persists a whole snapshot through the backend.
//! Persistence failures are logged and never fail the mutating call.

use super::backend::SnapshotBackend;
use super::load::LoadSource;
use super::model::{Database, LevelStatistics, Metadata, NewResult, ResultPatch, Statistics, TestResult};
use super::reconcile;
use crate::error::{StoreError, StoreResult};
use crate::output::{
    csv_filename, json_filename, render_csv, render_json, ExportArtifact, ExportDocument,
    ExportSink,
};
use crate::types::{parse_instant, ResultId, TestLevel};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Records that were not already present and were appended.
    pub imported: usize,
    /// Results held after the import.
    pub total: usize,
}

/// Storage figures for display.
#[derive(Debug, Clone)]
pub struct StorageInfo {
    pub total_results: usize,
    pub data_size_bytes: usize,
    pub last_updated: DateTime<Utc>,
    pub has_backup: bool,
}

/// Single-writer store of test results.
pub struct ResultStore<B> {
    db: Database,
    backend: B,
}

impl<B: SnapshotBackend> ResultStore<B> {
    /// Open a store over a backend.
    ///
    /// Loads the persisted snapshot, or starts (and saves) an empty
    /// database when none exists. An unreadable backend leaves the store
    /// empty in memory. Legacy data is migrated once.
    pub fn new(backend: B) -> Self {
        let (db, fresh) = Self::load_initial(&backend);
        Self::assemble(db, fresh, backend)
    }

    /// Open a store, consulting `source` for a starting document when the
    /// backend holds no snapshot.
    pub async fn open(backend: B, source: Option<&dyn LoadSource>) -> Self {
        let (db, fresh) = match (Self::load_initial(&backend), source) {
            ((_, true), Some(source)) => match source.fetch().await {
                Ok(db) => {
                    info!(source = %source.describe(), results = db.results.len(), "Loaded initial document");
                    (db, true)
                }
                Err(e) => {
                    warn!(source = %source.describe(), error = %e, "Initial load failed, starting empty");
                    (Database::empty(), true)
                }
            },
            (loaded, _) => loaded,
        };

        Self::assemble(db, fresh, backend)
    }

    fn load_initial(backend: &B) -> (Database, bool) {
        match backend.load() {
            Ok(Some(db)) => {
                debug!(results = db.results.len(), "Loaded snapshot");
                (db, false)
            }
            Ok(None) => {
                debug!("No snapshot found, initializing empty database");
                (Database::empty(), true)
            }
            Err(e) => {
                warn!(error = %e, "Snapshot unavailable, using an in-memory database");
                (Database::empty(), false)
            }
        }
    }

    fn assemble(db: Database, fresh: bool, backend: B) -> Self {
        let mut store = Self { db, backend };

        if fresh {
            store.save();
        }
        store.migrate_legacy();

        store
    }

    /// Fold data left by older storage layouts into the database.
    ///
    /// A legacy entry is removed only after its records are persisted, and
    /// only if every record in it could be read. Entries that stay behind
    /// are merged again (by id) on the next open. Returns the number of
    /// records added.
    pub fn migrate_legacy(&mut self) -> usize {
        let entries = match self.backend.read_legacy() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Legacy migration skipped");
                return 0;
            }
        };

        if entries.is_empty() {
            return 0;
        }

        let mut records = Vec::new();
        let mut settled = Vec::new();

        for entry in entries {
            let Some(value) = entry.value else {
                warn!(key = %entry.key, "Keeping unreadable legacy entry");
                continue;
            };

            let (parsed, skipped) = reconcile::collect_lenient(value);
            if skipped == 0 {
                settled.push(entry.key);
            } else {
                warn!(key = %entry.key, skipped, "Keeping legacy entry with unreadable records");
            }
            records.extend(parsed);
        }

        let added = reconcile::merge(&mut self.db.results, records);

        if added > 0 {
            self.db.rederive();
            if !self.save() {
                warn!(added, "Legacy entries kept until the migrated results are saved");
                return added;
            }
        }

        if let Err(e) = self.backend.remove_legacy(&settled) {
            warn!(error = %e, "Could not remove migrated legacy entries");
        }

        info!(added, removed = settled.len(), "Migrated legacy results");
        added
    }

    /// Record a new result at the front of the list.
    pub fn add_result(&mut self, input: NewResult) -> TestResult {
        let result = TestResult::create(input);
        let level = result.test_level;

        self.db.results.insert(0, result.clone());
        self.db.metadata.total_tests = self.db.results.len();
        self.db.refresh_level(level);
        self.save();

        info!(id = %result.id, level = %level, "Test result added");
        result
    }

    /// Merge `patch` over the result with `id`. `None` if no such result.
    pub fn update_result(&mut self, id: &ResultId, patch: ResultPatch) -> Option<TestResult> {
        let index = self.db.position(id)?;

        let previous_level = self.db.results[index].test_level;
        self.db.results[index].apply(patch);
        let updated = self.db.results[index].clone();

        self.db.metadata.touch();
        self.db.refresh_level(updated.test_level);
        if previous_level != updated.test_level {
            self.db.refresh_level(previous_level);
        }
        self.save();

        debug!(id = %id, "Test result updated");
        Some(updated)
    }

    /// Remove the first result with `id`. `None` (and nothing persisted)
    /// if no such result.
    pub fn delete_result(&mut self, id: &ResultId) -> Option<TestResult> {
        let Some(index) = self.db.position(id) else {
            debug!(id = %id, "Result not found");
            return None;
        };

        let deleted = self.db.results.remove(index);
        self.db.metadata.total_tests = self.db.results.len();
        self.db.metadata.touch();
        self.db.refresh_level(deleted.test_level);
        self.save();

        info!(id = %id, "Test result deleted");
        Some(deleted)
    }

    /// Copy of every result, newest first.
    pub fn all_results(&self) -> Vec<TestResult> {
        self.db.results.clone()
    }

    /// Results with the given level, in store order.
    pub fn results_by_level(&self, level: TestLevel) -> Vec<TestResult> {
        self.filtered(|r| r.test_level == level)
    }

    /// Results whose timestamp lies within `[start, end]`.
    pub fn results_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<TestResult> {
        self.filtered(|r| r.timestamp.is_some_and(|t| t >= start && t <= end))
    }

    /// Results within `[start, end]`, both bounds parsed as instants.
    pub fn results_by_date_range(&self, start: &str, end: &str) -> StoreResult<Vec<TestResult>> {
        let parse = |raw: &str| {
            parse_instant(raw).ok_or_else(|| StoreError::InvalidInstant(raw.to_string()))
        };
        Ok(self.results_between(parse(start)?, parse(end)?))
    }

    /// Results whose name, email or level contains `query`, ignoring case.
    pub fn search_results(&self, query: &str) -> Vec<TestResult> {
        let needle = query.to_lowercase();
        self.filtered(|r| r.matches_query(&needle))
    }

    fn filtered(&self, keep: impl Fn(&TestResult) -> bool) -> Vec<TestResult> {
        self.db.results.iter().filter(|r| keep(r)).cloned().collect()
    }

    /// Look up a result by id.
    pub fn get(&self, id: &ResultId) -> Option<&TestResult> {
        self.db.results.iter().find(|r| &r.id == id)
    }

    /// Resolve an id or unambiguous id prefix.
    pub fn find_by_prefix(&self, prefix: &str) -> StoreResult<&TestResult> {
        if let Some(exact) = self.db.results.iter().find(|r| r.id.as_str() == prefix) {
            return Ok(exact);
        }

        let matches: Vec<_> = self
            .db
            .results
            .iter()
            .filter(|r| r.id.starts_with(prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(StoreError::NotFound(prefix.to_string())),
            [only] => Ok(only),
            _ => Err(StoreError::NotFound(format!(
                "ambiguous prefix '{}': {} matches",
                prefix,
                matches.len()
            ))),
        }
    }

    /// Statistics for every level.
    pub fn statistics(&self) -> &Statistics {
        &self.db.statistics
    }

    /// Statistics for one level.
    pub fn level_statistics(&self, level: TestLevel) -> LevelStatistics {
        self.db.statistics.get(level)
    }

    /// Snapshot bookkeeping.
    pub fn metadata(&self) -> &Metadata {
        &self.db.metadata
    }

    /// The whole in-memory database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.db.results.len()
    }

    /// Whether the store holds no results.
    pub fn is_empty(&self) -> bool {
        self.db.results.is_empty()
    }

    /// Borrow the persistence backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutably borrow the persistence backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Reset to an empty database, persist it, and purge legacy entries.
    /// Returns whether the empty snapshot was saved.
    pub fn clear_all_data(&mut self) -> bool {
        self.db = Database::empty();
        let saved = self.save();

        match self.backend.purge_legacy() {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "Purged legacy keys"),
            Err(e) => warn!(error = %e, "Legacy purge failed"),
        }

        info!("All test data cleared");
        saved
    }

    /// Merge the results of an import document by id.
    pub fn import_database(&mut self, document: &Value) -> StoreResult<ImportOutcome> {
        let incoming = reconcile::parse_incoming(document)?;
        let imported = reconcile::merge(&mut self.db.results, incoming);

        self.db.rederive();
        self.db.metadata.touch();
        self.save();

        info!(imported, total = self.db.results.len(), "Import complete");
        Ok(ImportOutcome {
            imported,
            total: self.db.results.len(),
        })
    }

    /// Parse raw JSON bytes and import them.
    pub fn import_json(&mut self, bytes: &[u8]) -> StoreResult<ImportOutcome> {
        let document: Value = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::StructuralValidation(e.to_string()))?;
        self.import_database(&document)
    }

    /// Build the JSON export artifact for the current database.
    pub fn json_export(&self) -> StoreResult<ExportArtifact> {
        let now = Utc::now();
        let payload = render_json(&ExportDocument::new(&self.db, now))?;
        Ok(ExportArtifact::json(json_filename(now), payload))
    }

    /// Build the CSV export artifact, optionally limited to one level.
    pub fn csv_export(&self, level: Option<TestLevel>) -> StoreResult<ExportArtifact> {
        let results = match level {
            Some(level) => self.results_by_level(level),
            None => self.all_results(),
        };
        let payload = render_csv(&results)?;
        Ok(ExportArtifact::csv(csv_filename(level, Utc::now()), payload))
    }

    /// Export the database as JSON through `sink`.
    pub async fn export_json(&self, sink: &dyn ExportSink) -> StoreResult<ExportArtifact> {
        let artifact = self.json_export()?;
        sink.deliver(&artifact).await?;
        info!(file = %artifact.filename, "Database exported");
        Ok(artifact)
    }

    /// Export results as CSV through `sink`.
    pub async fn export_csv(
        &self,
        level: Option<TestLevel>,
        sink: &dyn ExportSink,
    ) -> StoreResult<ExportArtifact> {
        let artifact = self.csv_export(level)?;
        sink.deliver(&artifact).await?;
        info!(file = %artifact.filename, "Results exported");
        Ok(artifact)
    }

    /// Replace the database wholesale with the backup snapshot.
    ///
    /// Returns `false` when no backup exists or it cannot be read; the
    /// in-memory database is then left untouched.
    pub fn recover_from_backup(&mut self) -> bool {
        match self.backend.load_backup() {
            Ok(Some(db)) => {
                self.db = db;
                self.save();
                info!(results = self.db.results.len(), "Data recovered from backup");
                true
            }
            Ok(None) => {
                debug!("No backup to recover from");
                false
            }
            Err(e) => {
                error!(error = %e, "Error recovering from backup");
                false
            }
        }
    }

    /// Persist the whole database to the primary slot and mirror it into
    /// the backup slot. Returns `false` on failure, leaving memory as it
    /// was.
    pub fn save(&mut self) -> bool {
        let previous = self.db.metadata.last_updated;
        self.db.metadata.touch();

        let outcome = self
            .backend
            .save(&self.db)
            .and_then(|_| self.backend.save_backup(&self.db));

        match outcome {
            Ok(()) => {
                debug!(results = self.db.results.len(), "Data saved");
                true
            }
            Err(e) => {
                self.db.metadata.last_updated = previous;
                error!(error = %e, "Error saving data");
                false
            }
        }
    }

    /// Copy the current database into the backup slot if it holds any
    /// results. Returns whether a backup was written.
    pub fn backup_snapshot(&mut self) -> StoreResult<bool> {
        if self.db.results.is_empty() {
            return Ok(false);
        }

        self.backend.save_backup(&self.db)?;
        Ok(true)
    }

    /// Size and freshness figures.
    pub fn storage_info(&self) -> StorageInfo {
        StorageInfo {
            total_results: self.db.results.len(),
            data_size_bytes: serde_json::to_vec(&self.db).map_or(0, |bytes| bytes.len()),
            last_updated: self.db.metadata.last_updated,
            has_backup: self.backend.has_backup(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;
    use crate::storage::kv::{KvBackend, MemoryBlobStore, DEFAULT_BACKUP_KEY, DEFAULT_STORAGE_KEY};
    use crate::storage::statistics::recompute;
    use crate::storage::BlobStore;
    use crate::types::Grade;
    use chrono::Duration;
    use serde_json::json;

    type MemStore = ResultStore<KvBackend<MemoryBlobStore>>;

    fn store() -> MemStore {
        ResultStore::new(KvBackend::new(MemoryBlobStore::new()))
    }

    fn input(level: TestLevel, percentage: f64, name: &str) -> NewResult {
        NewResult::new(level, percentage)
            .with_student(name, format!("{}@example.com", name.to_lowercase()))
    }

    fn assert_consistent(store: &MemStore) {
        let db = store.database();
        assert_eq!(db.metadata.total_tests, db.results.len());
        for level in TestLevel::ALL {
            assert_eq!(db.statistics.get(level), recompute(level, &db.results));
        }
    }

    #[test]
    fn test_new_store_saves_empty_snapshot() {
        let store = store();
        assert!(store.is_empty());
        assert!(store.backend().load().unwrap().is_some());
        assert_consistent(&store);
    }

    #[test]
    fn test_add_inserts_newest_first() {
        let mut store = store();
        let first = store.add_result(input(TestLevel::B1, 90.0, "Anna"));
        let second = store.add_result(input(TestLevel::B2, 40.0, "Ben"));

        let results = store.all_results();
        assert_eq!(results[0].id, second.id);
        assert_eq!(results[1].id, first.id);
        assert_eq!(first.grade.grade, Grade::Excellent);
        assert_consistent(&store);
    }

    #[test]
    fn test_three_b1_results_statistics() {
        let mut store = store();
        for (pct, name) in [(90.0, "A"), (50.0, "B"), (65.0, "C")] {
            store.add_result(input(TestLevel::B1, pct, name));
            assert_consistent(&store);
        }

        assert_eq!(
            store.level_statistics(TestLevel::B1),
            LevelStatistics {
                total_tests: 3,
                average_score: 68,
                pass_rate: 67
            }
        );
        assert_eq!(store.level_statistics(TestLevel::C1), LevelStatistics::default());
    }

    #[test]
    fn test_add_persists_snapshot() {
        let mut store = store();
        store.add_result(input(TestLevel::C1, 70.0, "Cara"));

        let persisted = store.backend().load().unwrap().unwrap();
        assert_eq!(persisted.results.len(), 1);
        assert_eq!(persisted.statistics.get(TestLevel::C1).total_tests, 1);

        let reopened = ResultStore::new(KvBackend::new(store.backend().blobs().clone()));
        assert_eq!(reopened.all_results(), store.all_results());
    }

    #[test]
    fn test_update_rederives_grade_and_statistics() {
        let mut store = store();
        let added = store.add_result(input(TestLevel::B2, 55.0, "Dana"));

        let updated = store
            .update_result(
                &added.id,
                ResultPatch {
                    percentage: Some(88.0),
                    ..ResultPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.grade.grade, Grade::Excellent);
        assert_eq!(updated.timestamp, added.timestamp);
        assert_eq!(store.level_statistics(TestLevel::B2).pass_rate, 100);
        assert_consistent(&store);
    }

    #[test]
    fn test_update_level_change_refreshes_both_levels() {
        let mut store = store();
        let added = store.add_result(input(TestLevel::B1, 75.0, "Eli"));

        store.update_result(
            &added.id,
            ResultPatch {
                test_level: Some(TestLevel::C1),
                ..ResultPatch::default()
            },
        );

        assert_eq!(store.level_statistics(TestLevel::B1).total_tests, 0);
        assert_eq!(store.level_statistics(TestLevel::C1).total_tests, 1);
        assert_consistent(&store);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut store = store();
        store.add_result(input(TestLevel::B1, 75.0, "Eli"));
        let before = store.database().clone();

        assert!(store
            .update_result(&"missing".into(), ResultPatch::default())
            .is_none());
        assert_eq!(store.database(), &before);
    }

    #[test]
    fn test_delete_result() {
        let mut store = store();
        let keep = store.add_result(input(TestLevel::B1, 80.0, "Fay"));
        let gone = store.add_result(input(TestLevel::B1, 30.0, "Gus"));

        let deleted = store.delete_result(&gone.id).unwrap();
        assert_eq!(deleted.id, gone.id);
        assert_eq!(store.all_results().len(), 1);
        assert_eq!(store.all_results()[0].id, keep.id);
        assert_eq!(store.level_statistics(TestLevel::B1).average_score, 80);
        assert_consistent(&store);
    }

    #[test]
    fn test_delete_unknown_id_changes_nothing() {
        let mut store = store();
        store.add_result(input(TestLevel::C1, 61.0, "Hal"));

        let before = store.database().clone();
        let persisted_before = store.backend().blobs().get(DEFAULT_STORAGE_KEY).unwrap();

        assert!(store.delete_result(&"nope".into()).is_none());
        assert_eq!(store.database(), &before);
        assert_eq!(
            store.backend().blobs().get(DEFAULT_STORAGE_KEY).unwrap(),
            persisted_before
        );
    }

    #[test]
    fn test_all_results_is_a_copy() {
        let mut store = store();
        store.add_result(input(TestLevel::B1, 80.0, "Ivy"));

        let mut copy = store.all_results();
        copy.clear();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_queries() {
        let mut store = store();
        store.add_result(input(TestLevel::B1, 80.0, "Joanna"));
        store.add_result(input(TestLevel::B2, 70.0, "Karl"));
        store.add_result(
            NewResult::new(TestLevel::C1, 65.0).with_student("Lee", "hannah.lee@example.com"),
        );

        let b2 = store.results_by_level(TestLevel::B2);
        assert_eq!(b2.len(), 1);
        assert_eq!(b2[0].student_name.as_deref(), Some("Karl"));

        let anna = store.search_results("ANNA");
        assert_eq!(anna.len(), 2);
        assert!(anna.iter().all(|r| r.matches_query("anna")));

        assert_eq!(store.search_results("c1").len(), 1);
        assert!(store.search_results("zed").is_empty());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let mut store = store();
        let added = store.add_result(input(TestLevel::B1, 80.0, "Mo"));
        let at = added.timestamp.unwrap();

        assert_eq!(store.results_between(at, at).len(), 1);
        assert!(store
            .results_between(at + Duration::seconds(1), at + Duration::days(1))
            .is_empty());

        let start = (at - Duration::days(1)).format("%Y-%m-%d").to_string();
        let end = (at + Duration::days(1)).to_rfc3339();
        assert_eq!(store.results_by_date_range(&start, &end).unwrap().len(), 1);

        assert!(matches!(
            store.results_by_date_range("soon", &end),
            Err(StoreError::InvalidInstant(_))
        ));
    }

    #[test]
    fn test_import_into_empty_and_same_store() {
        let mut source = store();
        for (pct, name) in [(90.0, "Ana"), (52.0, "Bo"), (71.0, "Cy")] {
            source.add_result(input(TestLevel::B2, pct, name));
        }
        let exported = source.json_export().unwrap();

        let mut target = store();
        let outcome = target.import_json(&exported.payload).unwrap();
        assert_eq!(outcome, ImportOutcome { imported: 3, total: 3 });
        assert_eq!(target.all_results(), source.all_results());
        assert_consistent(&target);

        let again = source.import_json(&exported.payload).unwrap();
        assert_eq!(again, ImportOutcome { imported: 0, total: 3 });
        assert_consistent(&source);
    }

    #[test]
    fn test_import_appends_after_existing() {
        let mut store = store();
        let local = store.add_result(input(TestLevel::B1, 60.0, "Local"));

        store
            .import_database(&json!({"results": [
                {"id": "imp-1", "testLevel": "C1", "percentage": 90},
                {"id": "imp-2", "testLevel": "B1", "percentage": 30}
            ]}))
            .unwrap();

        let ids: Vec<_> = store.all_results().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![local.id, "imp-1".into(), "imp-2".into()]);
        assert_eq!(store.level_statistics(TestLevel::B1).pass_rate, 50);
        assert_eq!(store.level_statistics(TestLevel::C1).total_tests, 1);
        assert_consistent(&store);
    }

    #[test]
    fn test_import_rejects_bad_documents() {
        let mut store = store();
        store.add_result(input(TestLevel::B1, 60.0, "Local"));
        let before = store.all_results();

        assert!(matches!(
            store.import_database(&json!({"data": []})),
            Err(StoreError::StructuralValidation(_))
        ));
        assert!(matches!(
            store.import_json(b"not json"),
            Err(StoreError::StructuralValidation(_))
        ));
        assert!(store
            .import_database(&json!({"results": [{"id": "ok"}, {"name": "no id"}]}))
            .is_err());

        assert_eq!(store.all_results(), before);
    }

    #[test]
    fn test_clear_all_data() {
        let mut store = store();
        store.add_result(input(TestLevel::B1, 60.0, "Nia"));
        store
            .backend_mut()
            .blobs_mut()
            .set("testResult_9", b"{\"id\":\"x\"}")
            .unwrap();

        assert!(store.clear_all_data());
        assert!(store.is_empty());
        assert_consistent(&store);
        assert!(store.backend().blobs().get("testResult_9").unwrap().is_none());
        assert!(store.backend().load().unwrap().unwrap().results.is_empty());
    }

    #[test]
    fn test_recover_from_backup_replaces_wholesale() {
        let mut blobs = MemoryBlobStore::new();
        let mut backup = Database::empty();
        backup.results.push(TestResult::create(input(TestLevel::C1, 95.0, "Old")));
        backup.rederive();
        blobs
            .set(DEFAULT_BACKUP_KEY, &serde_json::to_vec(&backup).unwrap())
            .unwrap();
        blobs
            .set(DEFAULT_STORAGE_KEY, &serde_json::to_vec(&Database::empty()).unwrap())
            .unwrap();

        let mut store = ResultStore::new(KvBackend::new(blobs));
        assert!(store.is_empty());

        assert!(store.recover_from_backup());
        assert_eq!(store.all_results(), backup.results);
        assert_eq!(store.level_statistics(TestLevel::C1).total_tests, 1);
        assert_eq!(store.backend().load().unwrap().unwrap().results.len(), 1);
    }

    #[test]
    fn test_recover_without_backup() {
        let mut store = ResultStore::new(KvBackend::with_keys(
            MemoryBlobStore::new(),
            "primary",
            "never-written",
        ));
        store.backend_mut().blobs_mut().remove("never-written").unwrap();
        assert!(!store.recover_from_backup());
    }

    #[test]
    fn test_save_failure_leaves_memory_usable() {
        let mut store = ResultStore::new(KvBackend::new(MemoryBlobStore::with_quota(1500)));
        let before = store.metadata().last_updated;

        let big = "x".repeat(2000);
        let added = store.add_result(input(TestLevel::B1, 77.0, &big));

        assert_eq!(store.len(), 1);
        assert_eq!(store.all_results()[0].id, added.id);
        assert_eq!(store.metadata().last_updated, before);
        assert!(!store.save());
        assert!(store.backend().load().unwrap().unwrap().results.is_empty());
        assert_consistent(&store);
    }

    #[test]
    fn test_corrupt_snapshot_falls_back_to_empty() {
        let mut blobs = MemoryBlobStore::new();
        blobs.set(DEFAULT_STORAGE_KEY, b"{\"results\": [").unwrap();

        let mut store = ResultStore::new(KvBackend::new(blobs));
        assert!(store.is_empty());

        store.add_result(input(TestLevel::B2, 66.0, "Ora"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_legacy_keys_migrate_once() {
        let mut blobs = MemoryBlobStore::new();
        blobs
            .set(
                "allTestResults",
                json!([
                    {"id": "old-1", "testLevel": "B2", "percentage": 64},
                    {"id": "old-2", "testLevel": "B2", "percentage": 40}
                ])
                .to_string()
                .as_bytes(),
            )
            .unwrap();
        blobs
            .set(
                "testResult_3",
                json!({"id": "old-1", "testLevel": "B2", "percentage": 64})
                    .to_string()
                    .as_bytes(),
            )
            .unwrap();

        let store = ResultStore::new(KvBackend::new(blobs));
        assert_eq!(store.len(), 2);
        assert_eq!(store.level_statistics(TestLevel::B2).pass_rate, 50);
        assert_consistent(&store);

        let keys = store.backend().blobs().list_keys().unwrap();
        assert_eq!(keys, vec![DEFAULT_BACKUP_KEY, DEFAULT_STORAGE_KEY]);
    }

    #[test]
    fn test_legacy_keys_survive_a_failed_save() {
        let legacy = json!([{
            "id": "old",
            "testLevel": "B2",
            "percentage": 75,
            "studentName": "N".repeat(400)
        }])
        .to_string();
        let empty = serde_json::to_vec(&Database::empty()).unwrap().len();

        // Room for the legacy blob and two empty snapshots, not for a
        // snapshot carrying the migrated record.
        let mut blobs = MemoryBlobStore::with_quota(legacy.len() + 2 * empty + 100);
        blobs.set("allTestResults", legacy.as_bytes()).unwrap();

        let store = ResultStore::new(KvBackend::new(blobs));
        assert_eq!(store.len(), 1);

        let blobs = store.backend().blobs().clone();
        assert!(blobs.list_keys().unwrap().contains(&"allTestResults".to_string()));

        let reopened = ResultStore::new(KvBackend::new(blobs));
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.all_results()[0].id.as_str(), "old");
    }

    #[test]
    fn test_legacy_entries_with_unreadable_records_are_kept() {
        let mut blobs = MemoryBlobStore::new();
        blobs
            .set(
                "allTestResults",
                json!([
                    {"id": "good", "testLevel": "C1", "percentage": 90},
                    {"id": "bad", "testLevel": "A2"}
                ])
                .to_string()
                .as_bytes(),
            )
            .unwrap();
        blobs
            .set(
                "testResult_1",
                json!({"id": "loose", "testLevel": "b2", "percentage": "75"})
                    .to_string()
                    .as_bytes(),
            )
            .unwrap();
        blobs.set("testResult_2", b"not json").unwrap();

        let store = ResultStore::new(KvBackend::new(blobs));
        assert_eq!(store.len(), 2);
        assert_eq!(store.level_statistics(TestLevel::B2).pass_rate, 100);
        assert_consistent(&store);

        let keys = store.backend().blobs().list_keys().unwrap();
        assert_eq!(
            keys,
            vec![
                "allTestResults",
                DEFAULT_BACKUP_KEY,
                DEFAULT_STORAGE_KEY,
                "testResult_2"
            ]
        );

        let reopened = ResultStore::new(KvBackend::new(store.backend().blobs().clone()));
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_non_finite_percentage_survives_reopen() {
        let mut store = store();
        store.add_result(input(TestLevel::B1, 80.0, "Anna"));
        store.add_result(input(TestLevel::B1, f64::NAN, "Bo"));

        let reopened = ResultStore::new(KvBackend::new(store.backend().blobs().clone()));
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.all_results()[0].percentage, 0.0);
        assert_eq!(reopened.level_statistics(TestLevel::B1).average_score, 40);
    }

    #[test]
    fn test_snapshot_with_null_percentage_loads() {
        let mut blobs = MemoryBlobStore::new();
        blobs
            .set(
                DEFAULT_STORAGE_KEY,
                json!({
                    "metadata": {"totalTests": 2},
                    "statistics": {"B1": {}},
                    "results": [
                        {"id": "a", "testLevel": "B1", "percentage": null},
                        {"id": "b", "testLevel": "B1", "percentage": 70}
                    ]
                })
                .to_string()
                .as_bytes(),
            )
            .unwrap();

        let store = ResultStore::new(KvBackend::new(blobs));
        assert_eq!(store.len(), 2);
        assert_eq!(store.level_statistics(TestLevel::B1).pass_rate, 50);
        assert_consistent(&store);
    }

    #[test]
    fn test_import_accepts_loose_records() {
        let mut store = store();
        let outcome = store
            .import_database(&json!({"results": [
                {"id": "d1", "timestamp": "2024-01-15", "testLevel": "b1", "percentage": 61},
                {"id": "d2", "timestamp": "2024-01-16T09:30", "testLevel": "C1"}
            ]}))
            .unwrap();

        assert_eq!(outcome.imported, 2);
        assert_eq!(store.level_statistics(TestLevel::B1).pass_rate, 100);
        let january = store
            .results_by_date_range("2024-01-15", "2024-01-15T23:59:59Z")
            .unwrap();
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].id.as_str(), "d1");
    }

    #[test]
    fn test_find_by_prefix() {
        let mut store = store();
        store
            .import_database(&json!([{"id": "abc-1"}, {"id": "abc-2"}, {"id": "xyz"}]))
            .unwrap();

        assert_eq!(store.find_by_prefix("xy").unwrap().id.as_str(), "xyz");
        assert_eq!(store.find_by_prefix("abc-1").unwrap().id.as_str(), "abc-1");
        assert!(store.find_by_prefix("abc").is_err());
        assert!(store.find_by_prefix("q").is_err());
    }

    #[test]
    fn test_backup_snapshot_skips_empty_store() {
        let mut store = store();
        store.backend_mut().blobs_mut().remove(DEFAULT_BACKUP_KEY).unwrap();

        assert!(!store.backup_snapshot().unwrap());
        assert!(!store.backend().has_backup());

        store.add_result(input(TestLevel::B1, 50.0, "Pia"));
        assert!(store.backup_snapshot().unwrap());
        assert!(store.storage_info().has_backup);
    }

    #[tokio::test]
    async fn test_export_through_sink() {
        let mut store = store();
        store.add_result(input(TestLevel::B1, 50.0, "Quinn"));
        store.add_result(input(TestLevel::C1, 90.0, "Rae"));

        let sink = MemorySink::new();
        store.export_json(&sink).await.unwrap();
        store.export_csv(Some(TestLevel::C1), &sink).await.unwrap();

        let artifacts = sink.artifacts().await;
        assert_eq!(artifacts.len(), 2);
        assert!(artifacts[0].filename.starts_with("testResults_"));
        assert!(artifacts[1].filename.starts_with("test-results-C1-"));

        let csv = String::from_utf8(artifacts[1].payload.clone()).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("\"Rae\""));
    }

    #[tokio::test]
    async fn test_open_uses_load_source_when_no_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testResults.json");
        std::fs::write(
            &path,
            json!({"metadata": {}, "results": [{"id": "seed", "testLevel": "B1", "percentage": 61}]})
                .to_string(),
        )
        .unwrap();

        let source = crate::storage::FileLoadSource::new(&path);
        let store = ResultStore::open(KvBackend::new(MemoryBlobStore::new()), Some(&source)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.backend().load().unwrap().unwrap().results.len(), 1);

        let missing = crate::storage::FileLoadSource::new(dir.path().join("absent.json"));
        let empty = ResultStore::open(KvBackend::new(MemoryBlobStore::new()), Some(&missing)).await;
        assert!(empty.is_empty());
    }
}
