//! Legacy tournament migration.
//!
//! Legacy records carry a free-form `tournamentType` plus a handful of loose
//! fields. [`MigrationTranslator`] turns one record into a canonical
//! [`TournamentConfig`](crate::config::TournamentConfig);
//! [`MigrationOrchestrator`] runs translation against storage with dry runs,
//! batching and rollback; [`MigrationTestHarness`] verifies the outcome.
//!
//! ## Example
//!
//! ```
//! use tourney::migration::{LegacyTournament, translate};
//!
//! let mut legacy = LegacyTournament::new(1, "City League");
//! legacy.tournament_type = Some("round-robin".to_string());
//! legacy.max_participants = Some(20);
//!
//! let translation = translate(&legacy);
//! assert_eq!(translation.config.stages[0].engine(), "round_robin");
//! assert!(translation.warnings.is_empty());
//! ```

pub mod errors;
pub mod harness;
pub mod legacy;
pub mod orchestrator;
pub mod translator;

pub use errors::{FailureKind, MigrationError, MigrationWarning, OrchestratorResult};
pub use harness::{CheckFlags, MigrationTestHarness, MigrationTestResult, MigrationTestSuite};
pub use legacy::{LegacyTeam, LegacyTournament, TournamentRecord};
pub use orchestrator::{
    MigrationBatch, MigrationOrchestrator, MigrationOutcome, MigrationResult, MigrationStats,
    OrchestratorSettings, ReadinessReport, TournamentReadiness,
};
pub use translator::{
    EngineKind, MigrationTranslator, Translation, TranslatorSettings, lookup_format, translate,
};
