//! Migration orchestration over the tournament storage port.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::errors::{FailureKind, MigrationError, MigrationWarning, OrchestratorResult};
use super::legacy::{LegacyTournament, TournamentRecord};
use super::translator::MigrationTranslator;
use crate::config::{TournamentConfig, TournamentId, validate};
use crate::db::TournamentRepository;
use crate::engine::{Bracket, Participant, generate};

/// Batch pacing knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Tournaments migrated concurrently per chunk
    pub batch_size: usize,
    /// Pause between chunks
    pub batch_pause: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_pause: Duration::from_millis(100),
        }
    }
}

/// Terminal state of one migration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationOutcome {
    Success,
    /// The tournament already had a config
    Skipped,
    Failed { reason: FailureKind },
}

/// Result of migrating (or previewing) one tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub tournament_id: TournamentId,
    #[serde(flatten)]
    pub outcome: MigrationOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<LegacyTournament>,
    /// Translated config, or the existing one when skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TournamentConfig>,
    #[serde(default)]
    pub warnings: Vec<MigrationWarning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MigrationResult {
    fn success(
        record: TournamentRecord,
        config: TournamentConfig,
        warnings: Vec<MigrationWarning>,
    ) -> Self {
        Self {
            tournament_id: record.id(),
            outcome: MigrationOutcome::Success,
            original: Some(record.legacy),
            config: Some(config),
            warnings,
            error: None,
        }
    }

    fn skipped(record: TournamentRecord) -> Self {
        Self {
            tournament_id: record.id(),
            outcome: MigrationOutcome::Skipped,
            original: Some(record.legacy),
            config: record.config,
            warnings: vec![MigrationWarning::AlreadyMigrated],
            error: None,
        }
    }

    fn failed(
        id: TournamentId,
        original: Option<LegacyTournament>,
        warnings: Vec<MigrationWarning>,
        error: MigrationError,
    ) -> Self {
        Self {
            tournament_id: id,
            outcome: MigrationOutcome::Failed {
                reason: error.kind(),
            },
            original,
            config: None,
            warnings,
            error: Some(error.to_string()),
        }
    }

    /// Success or skip; both leave the tournament with a valid config
    pub fn succeeded(&self) -> bool {
        !matches!(self.outcome, MigrationOutcome::Failed { .. })
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self.outcome {
            MigrationOutcome::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Aggregate of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationBatch {
    pub batch_id: Uuid,
    pub results: Vec<MigrationResult>,
    pub total_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub dry_run: bool,
}

/// Migration progress across the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStats {
    pub total_tournaments: usize,
    pub migrated_tournaments: usize,
    pub legacy_tournaments: usize,
    /// Rounded to the nearest whole percent
    pub migration_percentage: u32,
}

/// A legacy tournament and what stands in the way of migrating it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentReadiness {
    pub tournament_id: TournamentId,
    pub name: String,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub total_legacy: usize,
    pub ready: Vec<TournamentReadiness>,
    pub needs_review: Vec<TournamentReadiness>,
    pub problems: Vec<TournamentReadiness>,
    pub estimated_duration_ms: u64,
}

const ESTIMATE_PER_TOURNAMENT_MS: u64 = 100;
const ESTIMATE_OVERHEAD_MS: u64 = 1000;

/// Entrants used when generating for a record: its roster when it can be
/// paired, otherwise placeholders for the configured field size.
pub(crate) fn entrants(legacy: &LegacyTournament, config: &TournamentConfig) -> Vec<Participant> {
    let roster = legacy.roster();
    if roster.len() >= 2 {
        roster.into_iter().map(Participant::new).collect()
    } else {
        Participant::placeholders(config.meta.participant_count as usize)
    }
}

fn rounded_percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part * 200 + total) / (total * 2)) as u32
}

/// Drives legacy → canonical migration against an injected repository.
///
/// Config mutations for one tournament are serialized by a per-tournament lock;
/// live writes additionally go through the store's compare-and-set so a writer
/// outside this process is never overwritten.
#[derive(Clone)]
pub struct MigrationOrchestrator {
    repo: Arc<dyn TournamentRepository>,
    translator: MigrationTranslator,
    settings: OrchestratorSettings,
    locks: Arc<Mutex<HashMap<TournamentId, Arc<Mutex<()>>>>>,
}

impl MigrationOrchestrator {
    /// Create an orchestrator with default translation and batch settings
    ///
    /// # Arguments
    ///
    /// * `repo` - Tournament storage
    pub fn new(repo: Arc<dyn TournamentRepository>) -> Self {
        Self {
            repo,
            translator: MigrationTranslator::default(),
            settings: OrchestratorSettings::default(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_translator(mut self, translator: MigrationTranslator) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn repository(&self) -> &Arc<dyn TournamentRepository> {
        &self.repo
    }

    pub fn translator(&self) -> &MigrationTranslator {
        &self.translator
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Run `work` holding the tournament's lock, then drop the lock entry if
    /// nobody else holds or waits on it.
    async fn with_lock<T>(&self, id: TournamentId, work: impl Future<Output = T>) -> T {
        let lock = self.locks.lock().await.entry(id).or_default().clone();
        let output = {
            let _guard = lock.lock().await;
            work.await
        };

        let mut locks = self.locks.lock().await;
        let idle = Arc::strong_count(&lock) == 2;
        if idle && locks.get(&id).is_some_and(|l| Arc::ptr_eq(l, &lock)) {
            locks.remove(&id);
        }
        output
    }

    /// Migrate one tournament.
    ///
    /// Dry runs take the same path as live runs but never write. Failures are
    /// reported in the result rather than returned as errors.
    ///
    /// # Arguments
    ///
    /// * `id` - Tournament to migrate
    /// * `dry_run` - Skip the config write
    ///
    /// # Returns
    ///
    /// * `MigrationResult` - Outcome, translated config and warnings
    pub async fn migrate_single(&self, id: TournamentId, dry_run: bool) -> MigrationResult {
        self.with_lock(id, self.migrate_locked(id, dry_run)).await
    }

    async fn migrate_locked(&self, id: TournamentId, dry_run: bool) -> MigrationResult {
        let record = match self.repo.get_tournament(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return MigrationResult::failed(id, None, Vec::new(), MigrationError::NotFound(id));
            }
            Err(e) => {
                log::error!("Failed to load tournament {id}: {e}");
                return MigrationResult::failed(id, None, Vec::new(), e.into());
            }
        };

        if record.is_migrated() {
            log::info!("Tournament {id} already has a config, skipping");
            return MigrationResult::skipped(record);
        }

        let translation = self.translator.translate(&record.legacy);
        let config = translation.config;
        let mut warnings = translation.warnings;

        let report = validate(&config);
        if !report.valid {
            log::warn!("Tournament {id} failed validation: {}", report.joined());
            return MigrationResult::failed(
                id,
                Some(record.legacy),
                warnings,
                MigrationError::Validation(report.errors),
            );
        }

        match generate(&config, &entrants(&record.legacy, &config), id) {
            Ok(bracket) => warnings.extend(
                bracket
                    .warnings
                    .into_iter()
                    .map(|message| MigrationWarning::Generation { message }),
            ),
            Err(e) => {
                log::warn!("Tournament {id} failed bracket generation probe: {e}");
                return MigrationResult::failed(id, Some(record.legacy), warnings, e.into());
            }
        }

        if dry_run {
            log::debug!("Dry run for tournament {id}: {} warnings", warnings.len());
            return MigrationResult::success(record, config, warnings);
        }

        match self.repo.set_config_if_absent(id, &config).await {
            Ok(true) => {
                log::info!(
                    "Migrated tournament {id} to {}",
                    config
                        .first_stage()
                        .map(|s| s.engine())
                        .unwrap_or_default()
                );
                MigrationResult::success(record, config, warnings)
            }
            Ok(false) => {
                // Another writer got there first; report what is stored now.
                log::warn!("Tournament {id} gained a config concurrently, skipping");
                match self.repo.get_tournament(id).await {
                    Ok(Some(current)) => MigrationResult::skipped(current),
                    Ok(None) => MigrationResult::failed(
                        id,
                        Some(record.legacy),
                        warnings,
                        MigrationError::NotFound(id),
                    ),
                    Err(e) => {
                        MigrationResult::failed(id, Some(record.legacy), warnings, e.into())
                    }
                }
            }
            Err(e) => {
                log::error!("Failed to store config for tournament {id}: {e}");
                MigrationResult::failed(id, Some(record.legacy), warnings, e.into())
            }
        }
    }

    /// Migrate `ids` in chunks of `batch_size`, each chunk concurrently
    pub async fn migrate_batch(
        &self,
        ids: &[TournamentId],
        batch_size: usize,
        dry_run: bool,
    ) -> MigrationBatch {
        let batch_id = Uuid::new_v4();
        let start_time = Utc::now();
        log::info!(
            "Starting migration batch {batch_id}: {} tournaments, chunk size {batch_size}, \
             dry run {dry_run}",
            ids.len()
        );

        let mut results = Vec::with_capacity(ids.len());
        for (chunk_index, chunk) in ids.chunks(batch_size.max(1)).enumerate() {
            if chunk_index > 0 && !self.settings.batch_pause.is_zero() {
                tokio::time::sleep(self.settings.batch_pause).await;
            }
            let chunk_results =
                join_all(chunk.iter().map(|&id| self.migrate_single(id, dry_run))).await;
            results.extend(chunk_results);
        }

        let success_count = results.iter().filter(|r| r.succeeded()).count();
        let batch = MigrationBatch {
            batch_id,
            total_count: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            results,
            start_time,
            end_time: Utc::now(),
            dry_run,
        };

        log::info!(
            "Finished migration batch {batch_id}: {}/{} succeeded",
            batch.success_count,
            batch.total_count
        );
        batch
    }

    /// Migrate every tournament that has no config yet
    pub async fn migrate_all(&self, dry_run: bool) -> OrchestratorResult<MigrationBatch> {
        let ids: Vec<TournamentId> = self
            .repo
            .get_tournaments()
            .await?
            .iter()
            .filter(|r| !r.is_migrated())
            .map(TournamentRecord::id)
            .collect();

        Ok(self
            .migrate_batch(&ids, self.settings.batch_size, dry_run)
            .await)
    }

    /// Migration outcome without persisting anything
    pub async fn preview(&self, id: TournamentId) -> MigrationResult {
        self.migrate_single(id, true).await
    }

    /// Restore legacy behaviour: clear any generated matches, then the config.
    ///
    /// Returns `false` if the tournament is missing or storage fails; the
    /// detail is logged. A failure part way leaves a config without matches,
    /// never matches without a config.
    pub async fn rollback(&self, id: TournamentId) -> bool {
        self.with_lock(id, self.rollback_locked(id)).await
    }

    async fn rollback_locked(&self, id: TournamentId) -> bool {
        match self.repo.get_tournament(id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                log::warn!("Rollback requested for missing tournament {id}");
                return false;
            }
            Err(e) => {
                log::error!("Rollback of tournament {id} failed: {e}");
                return false;
            }
        }

        if let Err(e) = self.repo.replace_matches(id, &[]).await {
            log::error!("Rollback of tournament {id} could not clear matches: {e}");
            return false;
        }

        match self.repo.update_config(id, None).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                log::warn!("Rollback requested for missing tournament {id}");
                return false;
            }
            Err(e) => {
                log::error!("Rollback of tournament {id} could not clear config: {e}");
                return false;
            }
        }

        log::info!("Rolled back tournament {id}");
        true
    }

    pub async fn stats(&self) -> OrchestratorResult<MigrationStats> {
        let records = self.repo.get_tournaments().await?;
        let migrated = records.iter().filter(|r| r.is_migrated()).count();

        Ok(MigrationStats {
            total_tournaments: records.len(),
            migrated_tournaments: migrated,
            legacy_tournaments: records.len() - migrated,
            migration_percentage: rounded_percentage(migrated, records.len()),
        })
    }

    /// Classify legacy tournaments by how much attention they need before migrating
    pub async fn readiness_report(&self) -> OrchestratorResult<ReadinessReport> {
        let legacy: Vec<TournamentRecord> = self
            .repo
            .get_tournaments()
            .await?
            .into_iter()
            .filter(|r| !r.is_migrated())
            .collect();

        let mut report = ReadinessReport {
            total_legacy: legacy.len(),
            ready: Vec::new(),
            needs_review: Vec::new(),
            problems: Vec::new(),
            estimated_duration_ms: legacy.len() as u64 * ESTIMATE_PER_TOURNAMENT_MS
                + ESTIMATE_OVERHEAD_MS,
        };

        for record in legacy {
            let t = &record.legacy;
            let mut issues = Vec::new();
            if t.tournament_type.is_none() {
                issues.push("Missing tournament type".to_string());
            }
            if t.sport.is_none() {
                issues.push("Missing sport information".to_string());
            }
            if t.declared_participants().is_none() {
                issues.push("Missing participant count".to_string());
            }
            if t.is_completed() && !self.repo.get_matches(t.id).await?.is_empty() {
                issues.push("Completed tournament with existing bracket data".to_string());
            }

            let entry = TournamentReadiness {
                tournament_id: t.id,
                name: t.name.clone(),
                issues,
            };
            match entry.issues.len() {
                0 => report.ready.push(entry),
                1..=2 => report.needs_review.push(entry),
                _ => report.problems.push(entry),
            }
        }

        Ok(report)
    }

    /// Generate and store the opening stage of a migrated tournament.
    ///
    /// Refuses when the tournament has no config or already has matches. All
    /// matches are written in one `replace_matches` call.
    pub async fn generate_bracket(&self, id: TournamentId) -> OrchestratorResult<Bracket> {
        self.with_lock(id, self.generate_locked(id)).await
    }

    async fn generate_locked(&self, id: TournamentId) -> OrchestratorResult<Bracket> {
        let record = self
            .repo
            .get_tournament(id)
            .await?
            .ok_or(MigrationError::NotFound(id))?;
        let config = record
            .config
            .as_ref()
            .ok_or(MigrationError::NotMigrated(id))?;
        if !self.repo.get_matches(id).await?.is_empty() {
            return Err(MigrationError::AlreadyGenerated(id));
        }

        let bracket = generate(config, &entrants(&record.legacy, config), id)?;
        self.repo.replace_matches(id, &bracket.matches).await?;

        log::info!(
            "Stored {} matches for tournament {id}",
            bracket.matches.len()
        );
        Ok(bracket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryTournamentRepository, RepositoryError, RepositoryResult};
    use crate::engine::{BracketKind, Match};
    use async_trait::async_trait;

    fn record(id: TournamentId, kind: &str) -> TournamentRecord {
        let mut legacy = LegacyTournament::new(id, format!("Tournament {id}"));
        legacy.tournament_type = Some(kind.to_string());
        legacy.sport = Some("Soccer".to_string());
        legacy.max_participants = Some(8);
        TournamentRecord::legacy(legacy)
    }

    const SETTINGS: OrchestratorSettings = OrchestratorSettings {
        batch_size: 2,
        batch_pause: Duration::ZERO,
    };

    fn orchestrator(
        records: Vec<TournamentRecord>,
    ) -> (Arc<InMemoryTournamentRepository>, MigrationOrchestrator) {
        let repo = Arc::new(InMemoryTournamentRepository::with_tournaments(records));
        let orchestrator = MigrationOrchestrator::new(repo.clone()).with_settings(SETTINGS);
        (repo, orchestrator)
    }

    /// Store whose match writes always fail
    struct BrokenMatchStore {
        inner: InMemoryTournamentRepository,
    }

    #[async_trait]
    impl TournamentRepository for BrokenMatchStore {
        async fn get_tournament(
            &self,
            id: TournamentId,
        ) -> RepositoryResult<Option<TournamentRecord>> {
            self.inner.get_tournament(id).await
        }

        async fn get_tournaments(&self) -> RepositoryResult<Vec<TournamentRecord>> {
            self.inner.get_tournaments().await
        }

        async fn update_config(
            &self,
            id: TournamentId,
            config: Option<&TournamentConfig>,
        ) -> RepositoryResult<Option<TournamentRecord>> {
            self.inner.update_config(id, config).await
        }

        async fn set_config_if_absent(
            &self,
            id: TournamentId,
            config: &TournamentConfig,
        ) -> RepositoryResult<bool> {
            self.inner.set_config_if_absent(id, config).await
        }

        async fn get_matches(&self, id: TournamentId) -> RepositoryResult<Vec<Match>> {
            self.inner.get_matches(id).await
        }

        async fn replace_matches(&self, _: TournamentId, _: &[Match]) -> RepositoryResult<()> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[test]
    fn test_rounded_percentage() {
        assert_eq!(rounded_percentage(0, 0), 0);
        assert_eq!(rounded_percentage(1, 3), 33);
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(1, 2), 50);
        assert_eq!(rounded_percentage(5, 5), 100);
    }

    #[test]
    fn test_entrants_fall_back_to_placeholders() {
        let config = TournamentConfig::simple(
            "Cup",
            4,
            crate::config::Stage::Single(crate::config::SingleStage {
                size: 4,
                third_place: false,
            }),
        );
        let legacy = LegacyTournament::new(1, "Cup");
        let names: Vec<String> = entrants(&legacy, &config).into_iter().map(|p| p.name).collect();
        assert_eq!(names.len(), 4);
        assert_eq!(names[0], "Participant 1");
    }

    #[test]
    fn test_result_wire_format() {
        let result = MigrationResult::failed(9, None, Vec::new(), MigrationError::NotFound(9));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["reason"], "not_found");
        assert_eq!(value["tournamentId"], 9);
        assert_eq!(value["error"], "Tournament not found: 9");
    }

    #[tokio::test]
    async fn test_migrate_single_and_skip() {
        let (repo, orchestrator) = orchestrator(vec![record(1, "round-robin")]);

        let first = orchestrator.migrate_single(1, false).await;
        assert_eq!(first.outcome, MigrationOutcome::Success);
        assert_eq!(repo.write_count(), 1);

        let second = orchestrator.migrate_single(1, false).await;
        assert_eq!(second.outcome, MigrationOutcome::Skipped);
        assert_eq!(second.warnings, vec![MigrationWarning::AlreadyMigrated]);
        assert_eq!(second.config, first.config);
        assert_eq!(repo.write_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_tournament_fails_not_found() {
        let (_, orchestrator) = orchestrator(Vec::new());
        let result = orchestrator.migrate_single(42, false).await;
        assert_eq!(result.failure(), Some(FailureKind::NotFound));
    }

    #[tokio::test]
    async fn test_validation_failure_is_reported() {
        let mut bad = record(3, "single");
        bad.legacy.max_participants = Some(1);
        let (repo, orchestrator) = orchestrator(vec![bad]);

        let result = orchestrator.migrate_single(3, false).await;
        assert_eq!(result.failure(), Some(FailureKind::Validation));
        assert!(
            result
                .error
                .as_deref()
                .is_some_and(|e| e.starts_with("Config validation failed:"))
        );
        assert_eq!(repo.write_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_migrations_write_once() {
        let (repo, orchestrator) = orchestrator(vec![record(5, "swiss")]);
        let results = join_all((0..4).map(|_| orchestrator.migrate_single(5, false))).await;

        let successes = results
            .iter()
            .filter(|r| r.outcome == MigrationOutcome::Success)
            .count();
        assert_eq!(successes, 1);
        assert!(results.iter().all(MigrationResult::succeeded));
        assert_eq!(repo.write_count(), 1);
    }

    #[tokio::test]
    async fn test_readiness_classification() {
        let ready = record(1, "single");
        let mut review = record(2, "single");
        review.legacy.sport = None;
        let mut problem = LegacyTournament::new(3, "Bare");
        problem.status = Some("completed".to_string());
        let (repo, orchestrator) =
            orchestrator(vec![ready, review, TournamentRecord::legacy(problem)]);
        repo.replace_matches(3, &[Match::new("W1-1", 3, 0, BracketKind::Winners, 1, 1)])
            .await
            .unwrap();

        let report = orchestrator.readiness_report().await.unwrap();
        assert_eq!(report.total_legacy, 3);
        assert_eq!(report.ready.len(), 1);
        assert_eq!(report.needs_review.len(), 1);
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].issues.len(), 4);
        assert_eq!(report.estimated_duration_ms, 1300);
    }

    #[tokio::test]
    async fn test_failed_rollback_keeps_config_with_matches() {
        let inner = InMemoryTournamentRepository::with_tournaments(vec![record(4, "single")]);
        let config = MigrationTranslator::default()
            .translate(&record(4, "single").legacy)
            .config;
        inner.set_config_if_absent(4, &config).await.unwrap();
        inner
            .replace_matches(4, &[Match::new("W1-1", 4, 0, BracketKind::Winners, 1, 1)])
            .await
            .unwrap();

        let repo = Arc::new(BrokenMatchStore { inner });
        let orchestrator = MigrationOrchestrator::new(repo.clone()).with_settings(SETTINGS);

        assert!(!orchestrator.rollback(4).await);
        let stored = repo.get_tournament(4).await.unwrap().unwrap();
        assert_eq!(stored.config, Some(config));
        assert_eq!(repo.get_matches(4).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lock_entries_are_released() {
        let (_, orchestrator) = orchestrator(vec![record(1, "single"), record(2, "swiss")]);

        join_all((0..3).map(|_| orchestrator.migrate_single(1, false))).await;
        orchestrator.migrate_batch(&[1, 2], 2, true).await;
        orchestrator.generate_bracket(1).await.unwrap();
        assert!(orchestrator.rollback(1).await);
        assert!(!orchestrator.rollback(9).await);

        assert!(orchestrator.locks.lock().await.is_empty());
    }
}
