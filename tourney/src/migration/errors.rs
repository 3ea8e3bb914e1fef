//! Migration error and warning types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::TournamentId;
use crate::db::RepositoryError;
use crate::engine::GenerationError;

/// Migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Config validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Bracket generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Tournament {0} has no config; migrate it first")]
    NotMigrated(TournamentId),

    #[error("Tournament {0} already has generated matches")]
    AlreadyGenerated(TournamentId),

    #[error("Storage error: {0}")]
    Repository(#[from] RepositoryError),
}

impl MigrationError {
    /// Failure category recorded on a migration result
    pub fn kind(&self) -> FailureKind {
        match self {
            MigrationError::NotFound(_) => FailureKind::NotFound,
            MigrationError::Validation(_) => FailureKind::Validation,
            MigrationError::Generation(_) => FailureKind::Generation,
            MigrationError::NotMigrated(_)
            | MigrationError::AlreadyGenerated(_)
            | MigrationError::Repository(_) => FailureKind::Storage,
        }
    }
}

pub type OrchestratorResult<T> = Result<T, MigrationError>;

/// Why a migration failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Validation,
    Generation,
    Storage,
}

/// Non-fatal findings surfaced alongside a migration result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MigrationWarning {
    /// No engine is known for the legacy type; single elimination was used
    UnmappedTournamentType { tournament_type: Option<String> },
    /// The legacy format was collapsed onto the closest available engine
    ApproximatedFormat {
        tournament_type: String,
        engine: String,
    },
    UnmappedAgeGroup { age_group: String },
    UnmappedGenderDivision { gender_division: String },
    /// A legacy division entry had no usable name and was dropped
    IgnoredDivision { index: usize },
    /// The tournament already had a config; nothing was written
    AlreadyMigrated,
    /// The event ranks highest-first although its sport ranks lowest-first
    ReversedRanking { event: String, unit: String },
    /// Reported by the engine while probing bracket generation
    Generation { message: String },
}

impl fmt::Display for MigrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationWarning::UnmappedTournamentType {
                tournament_type: Some(t),
            } => write!(
                f,
                "Unrecognized tournament type '{t}'; defaulting to single elimination"
            ),
            MigrationWarning::UnmappedTournamentType {
                tournament_type: None,
            } => f.write_str("Missing tournament type; defaulting to single elimination"),
            MigrationWarning::ApproximatedFormat {
                tournament_type,
                engine,
            } => write!(
                f,
                "Format '{tournament_type}' has no exact engine; approximated as {engine}"
            ),
            MigrationWarning::UnmappedAgeGroup { age_group } => write!(
                f,
                "Age group '{age_group}' has no known band; division left unrestricted"
            ),
            MigrationWarning::UnmappedGenderDivision { gender_division } => write!(
                f,
                "Gender division '{gender_division}' is not recognized; using open"
            ),
            MigrationWarning::IgnoredDivision { index } => {
                write!(f, "Legacy division {index} has no name and was skipped")
            }
            MigrationWarning::AlreadyMigrated => {
                f.write_str("Tournament already has config data - skipping migration")
            }
            MigrationWarning::ReversedRanking { event, unit } => write!(
                f,
                "Event '{event}' ranks the most {unit} first; review before publishing results"
            ),
            MigrationWarning::Generation { message } => f.write_str(message),
        }
    }
}
