//! Post-migration verification.
//!
//! Each tournament is put through four checks against the config the
//! orchestrator produces: validation, bracket generation, integrity of the
//! legacy fields and sanity of the serialized config.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::legacy::{LegacyTournament, TournamentRecord};
use super::orchestrator::{MigrationOrchestrator, entrants};
use crate::config::{
    GenderPolicy, ParticipantType, Stage, TournamentConfig, TournamentId, validate,
};
use crate::engine::generate;

const CHECKS: u32 = 4;

/// Which checks passed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckFlags {
    pub config_validation: bool,
    pub bracket_generation: bool,
    pub data_integrity: bool,
    pub functionality_test: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationTestResult {
    pub tournament_id: TournamentId,
    pub tests_passed: u32,
    pub tests_total: u32,
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub details: CheckFlags,
}

impl MigrationTestResult {
    fn new(tournament_id: TournamentId) -> Self {
        Self {
            tournament_id,
            tests_passed: 0,
            tests_total: CHECKS,
            success: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            details: CheckFlags::default(),
        }
    }

    fn record(&mut self, errors: Vec<String>) -> bool {
        let passed = errors.is_empty();
        if passed {
            self.tests_passed += 1;
        } else {
            self.errors.extend(errors);
        }
        passed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationTestSuite {
    pub suite_name: String,
    pub test_results: Vec<MigrationTestResult>,
    pub overall_success: bool,
    /// Share of passed checks, rounded to a whole percent
    pub success_rate: u32,
    /// Checks run across every tournament
    pub total_tests: usize,
    pub passed_tests: usize,
    pub execution_time_ms: u64,
}

/// Runs migration checks through an orchestrator
pub struct MigrationTestHarness {
    orchestrator: MigrationOrchestrator,
}

impl MigrationTestHarness {
    pub fn new(orchestrator: MigrationOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Migrate (dry run unless `dry_run` is false) and check one tournament
    pub async fn run_test(&self, id: TournamentId, dry_run: bool) -> MigrationTestResult {
        let mut result = MigrationTestResult::new(id);

        let original = match self.orchestrator.repository().get_tournament(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                result.errors.push("Tournament not found".to_string());
                return result;
            }
            Err(e) => {
                result.errors.push(format!("Failed to load tournament: {e}"));
                return result;
            }
        };

        let migration = self.orchestrator.migrate_single(id, dry_run).await;
        result
            .warnings
            .extend(migration.warnings.iter().map(ToString::to_string));
        if !migration.succeeded() {
            result.errors.push(format!(
                "Migration failed: {}",
                migration.error.as_deref().unwrap_or("unknown error")
            ));
            return result;
        }
        let Some(config) = migration.config else {
            result
                .errors
                .push("Tournament config is null after migration".to_string());
            return result;
        };

        // Re-read so the integrity check compares against what storage now holds
        let stored = match self.orchestrator.repository().get_tournament(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                result
                    .errors
                    .push("Tournament missing after migration".to_string());
                return result;
            }
            Err(e) => {
                result.errors.push(format!("Failed to reload tournament: {e}"));
                return result;
            }
        };
        let migrated = TournamentRecord {
            legacy: stored.legacy,
            config: if dry_run { Some(config) } else { stored.config },
        };

        result.details.config_validation = result.record(check_config(&migrated));
        result.details.bracket_generation = result.record(check_generation(&migrated));
        result.details.data_integrity =
            result.record(check_integrity(&original.legacy, &migrated));
        result.details.functionality_test = result.record(check_functionality(&migrated));
        result.success = result.tests_passed == result.tests_total;

        log::debug!(
            "Migration test for tournament {id}: {}/{} checks passed",
            result.tests_passed,
            result.tests_total
        );
        result
    }

    /// Run [`run_test`](Self::run_test) for each id in order
    pub async fn run_suite(&self, ids: &[TournamentId], dry_run: bool) -> MigrationTestSuite {
        let started = Instant::now();
        let mut test_results = Vec::with_capacity(ids.len());
        for &id in ids {
            test_results.push(self.run_test(id, dry_run).await);
        }

        let passed_tests: usize = test_results.iter().map(|r| r.tests_passed as usize).sum();
        let total_tests: usize = test_results.iter().map(|r| r.tests_total as usize).sum();
        let success_rate = if total_tests == 0 {
            0
        } else {
            ((passed_tests * 200 + total_tests) / (total_tests * 2)) as u32
        };

        let suite = MigrationTestSuite {
            suite_name: format!(
                "Migration Test Suite ({})",
                if dry_run { "Dry Run" } else { "Live" }
            ),
            test_results,
            overall_success: success_rate == 100,
            success_rate,
            total_tests,
            passed_tests,
            execution_time_ms: started.elapsed().as_millis() as u64,
        };
        log::info!(
            "{}: {}/{} checks passed",
            suite.suite_name,
            suite.passed_tests,
            suite.total_tests
        );
        suite
    }
}

fn config_of(record: &TournamentRecord) -> Result<&TournamentConfig, Vec<String>> {
    record
        .config
        .as_ref()
        .ok_or_else(|| vec!["Tournament config is null after migration".to_string()])
}

fn check_config(record: &TournamentRecord) -> Vec<String> {
    let config = match config_of(record) {
        Ok(config) => config,
        Err(errors) => return errors,
    };
    let report = validate(config);
    if !report.valid {
        return report.errors;
    }

    let mut errors = Vec::new();
    if config.divisions.is_empty() {
        errors.push("Config missing divisions".to_string());
    }
    if config.stages.is_empty() {
        errors.push("Config missing stages".to_string());
    }
    errors
}

fn check_generation(record: &TournamentRecord) -> Vec<String> {
    let config = match config_of(record) {
        Ok(config) => config,
        Err(errors) => return errors,
    };

    match generate(config, &entrants(&record.legacy, config), record.id()) {
        Ok(bracket) => {
            let elimination = config.first_stage().is_some_and(Stage::is_elimination);
            if elimination && bracket.matches.is_empty() {
                vec!["Elimination bracket should have matches".to_string()]
            } else {
                Vec::new()
            }
        }
        Err(e) => vec![format!("Bracket generation failed: {e}")],
    }
}

fn check_integrity(original: &LegacyTournament, migrated: &TournamentRecord) -> Vec<String> {
    let config = match config_of(migrated) {
        Ok(config) => config,
        Err(errors) => return errors,
    };
    let current = &migrated.legacy;
    let mut errors = Vec::new();

    if original.name != current.name {
        errors.push("Tournament name changed during migration".to_string());
    }
    if original.user_id != current.user_id {
        errors.push("Tournament owner changed during migration".to_string());
    }
    if original.status != current.status {
        errors.push("Tournament status changed during migration".to_string());
    }

    let before = original.declared_participants().unwrap_or(16);
    let after = config.meta.participant_count;
    if before != after {
        errors.push(format!("Participant count changed: {before} -> {after}"));
    }

    if let Some(size) = original.team_size.filter(|&n| n > 0)
        && Some(size) != config.meta.team_size
    {
        errors.push(format!(
            "Team size changed: {size} -> {}",
            config
                .meta
                .team_size
                .map_or_else(|| "none".to_string(), |n| n.to_string())
        ));
    }

    if original.sport.is_some() && current.sport.is_none() {
        errors.push("Legacy sport field was removed".to_string());
    }
    if original.tournament_type.is_some() && current.tournament_type.is_none() {
        errors.push("Legacy tournamentType field was removed".to_string());
    }
    errors
}

/// Inspect the config as it would be stored, so a value that only fails on the
/// wire is still caught.
fn check_functionality(record: &TournamentRecord) -> Vec<String> {
    let config = match config_of(record) {
        Ok(config) => config,
        Err(errors) => return errors,
    };
    let value = match serde_json::to_value(config) {
        Ok(value) => value,
        Err(e) => return vec![format!("Functionality test failed: {e}")],
    };
    let mut errors = Vec::new();

    let participant_type = value["meta"]["participantType"].as_str().unwrap_or_default();
    if !ParticipantType::ALL.contains(&participant_type) {
        errors.push("Invalid participant type in config".to_string());
    }

    for division in value["divisions"].as_array().into_iter().flatten() {
        if division["name"].as_str().is_none_or(str::is_empty) {
            errors.push("Division missing name".to_string());
        }
        let policy = division["genderPolicy"].as_str().unwrap_or_default();
        if !GenderPolicy::ALL.contains(&policy) {
            errors.push(format!("Invalid gender policy: {policy}"));
        }
    }

    for stage in value["stages"].as_array().into_iter().flatten() {
        let engine = stage["engine"].as_str().unwrap_or_default();
        let positive = |field: &str| stage[field].as_u64().is_some_and(|n| n > 0);
        match engine {
            "single" | "double" => {
                if !positive("size") {
                    errors.push(format!(
                        "Invalid size for {engine} stage: {}",
                        stage["size"]
                    ));
                }
            }
            "round_robin" => {
                if !positive("groups") {
                    errors.push("Invalid groups for round_robin stage".to_string());
                }
                if stage["points"]["win"].as_i64().is_none_or(|w| w == 0) {
                    errors.push("Missing points configuration for round_robin stage".to_string());
                }
            }
            "swiss" => {
                if !positive("rounds") {
                    errors.push("Invalid rounds for swiss stage".to_string());
                }
            }
            "leaderboard" => {
                if stage["events"].as_array().is_none_or(Vec::is_empty) {
                    errors.push("Missing events for leaderboard stage".to_string());
                }
            }
            other => errors.push(format!("Invalid stage engine: {other}")),
        }
    }

    if value["seeding"]["method"].as_str().is_none() {
        errors.push("Missing seeding configuration".to_string());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryTournamentRepository, RepositoryResult, TournamentRepository};
    use crate::engine::Match;
    use async_trait::async_trait;
    use std::sync::Arc;

    fn harness(
        records: Vec<TournamentRecord>,
    ) -> (Arc<InMemoryTournamentRepository>, MigrationTestHarness) {
        let repo = Arc::new(InMemoryTournamentRepository::with_tournaments(records));
        (repo.clone(), MigrationTestHarness::new(MigrationOrchestrator::new(repo)))
    }

    /// Store that renames a tournament whenever it writes its config
    struct RenamingRepository {
        inner: InMemoryTournamentRepository,
    }

    #[async_trait]
    impl TournamentRepository for RenamingRepository {
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
            let written = self.inner.set_config_if_absent(id, config).await?;
            if let Some(mut record) = self.inner.get_tournament(id).await? {
                record.legacy.name = "Renamed".to_string();
                self.inner.insert(record).await;
            }
            Ok(written)
        }

        async fn get_matches(&self, id: TournamentId) -> RepositoryResult<Vec<Match>> {
            self.inner.get_matches(id).await
        }

        async fn replace_matches(
            &self,
            id: TournamentId,
            matches: &[Match],
        ) -> RepositoryResult<()> {
            self.inner.replace_matches(id, matches).await
        }
    }

    fn legacy(id: TournamentId, kind: &str, max: u32) -> TournamentRecord {
        let mut legacy = LegacyTournament::new(id, format!("Event {id}"));
        legacy.tournament_type = Some(kind.to_string());
        legacy.sport = Some("Basketball".to_string());
        legacy.max_participants = Some(max);
        legacy.user_id = Some("owner-1".to_string());
        legacy.status = Some("upcoming".to_string());
        TournamentRecord::legacy(legacy)
    }

    #[tokio::test]
    async fn test_all_checks_pass_for_clean_record() {
        let (repo, harness) = harness(vec![legacy(1, "double-elimination", 8)]);
        let result = harness.run_test(1, true).await;
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.tests_passed, 4);
        assert!(result.details.functionality_test);
        assert_eq!(repo.write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_tournament() {
        let (_, harness) = harness(Vec::new());
        let result = harness.run_test(7, true).await;
        assert!(!result.success);
        assert_eq!(result.errors, vec!["Tournament not found".to_string()]);
    }

    #[tokio::test]
    async fn test_suite_rates() {
        let (_, harness) = harness(vec![legacy(1, "swiss", 12), legacy(2, "single", 1)]);
        let suite = harness.run_suite(&[1, 2], true).await;
        assert_eq!(suite.suite_name, "Migration Test Suite (Dry Run)");
        assert_eq!(suite.total_tests, 8);
        assert_eq!(suite.passed_tests, 4);
        assert_eq!(suite.success_rate, 50);
        assert!(!suite.overall_success);
        assert!(suite.test_results[1].errors[0].starts_with("Migration failed:"));
    }

    #[test]
    fn test_integrity_detects_changes() {
        let original = legacy(1, "single", 8);
        let mut migrated = original.clone();
        migrated.config = Some(crate::migration::translate(&original.legacy).config);
        assert!(check_integrity(&original.legacy, &migrated).is_empty());

        migrated.legacy.name = "Renamed".to_string();
        migrated.legacy.sport = None;
        let errors = check_integrity(&original.legacy, &migrated);
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn test_live_run_catches_corrupted_record() {
        let repo = Arc::new(RenamingRepository {
            inner: InMemoryTournamentRepository::with_tournaments(vec![
                legacy(1, "single-elimination", 8),
                legacy(2, "double-elimination", 8),
            ]),
        });
        let harness = MigrationTestHarness::new(MigrationOrchestrator::new(repo));

        let dry = harness.run_test(1, true).await;
        assert!(dry.success, "{:?}", dry.errors);

        let live = harness.run_test(1, false).await;
        assert!(!live.success);
        assert_eq!(live.tests_passed, 3);
        assert!(!live.details.data_integrity);
        assert!(live.details.config_validation && live.details.functionality_test);
        assert!(
            live.errors
                .contains(&"Tournament name changed during migration".to_string())
        );

        // Tournament 1 is now skipped and untouched; 2 is renamed on write
        let suite = harness.run_suite(&[1, 2], false).await;
        assert_eq!(suite.test_results[0].tests_passed, 4);
        assert_eq!(suite.test_results[1].tests_passed, 3);
        assert_eq!(suite.total_tests, 8);
        assert_eq!(suite.passed_tests, 7);
        assert_eq!(suite.success_rate, 88);
        assert!(!suite.overall_success);
    }
}
