//! # Tourney
//!
//! A tournament format engine: a canonical, typed tournament configuration,
//! bracket generators for each competition format, and the pipeline that
//! migrates legacy tournament records onto the canonical config.
//!
//! ## Architecture
//!
//! A tournament is described by a [`TournamentConfig`]: participants,
//! divisions, seeding and an ordered list of stages. Each stage names one of
//! five engines:
//!
//! - **single**: single elimination, optional third-place match
//! - **double**: winners and losers brackets with a grand final
//! - **round_robin**: groups playing every other member once
//! - **swiss**: score-group pairing without repeats
//! - **leaderboard**: heats ranked by time or score
//!
//! Every engine implements [`engine::FormatEngine`] and is dispatched through
//! `enum_dispatch`, so generation is a pure function from config and entrants
//! to a [`engine::Bracket`].
//!
//! ## Core Modules
//!
//! - [`config`]: Canonical config model and validation
//! - [`engine`]: Bracket generation, standings and leaderboards
//! - [`migration`]: Legacy translation, orchestration and verification
//! - [`db`]: Storage port with in-memory and PostgreSQL adapters
//!
//! ## Example
//!
//! ```
//! use tourney::{Participant, generate};
//! use tourney::config::{SingleStage, Stage, TournamentConfig};
//!
//! let config = TournamentConfig::simple(
//!     "Club Cup",
//!     16,
//!     Stage::Single(SingleStage { size: 16, third_place: true }),
//! );
//! let bracket = generate(&config, &Participant::placeholders(16), 1).unwrap();
//!
//! assert_eq!(bracket.matches.len(), 16);
//! assert_eq!(bracket.total_rounds, 4);
//! ```

/// Canonical tournament configuration and validation.
pub mod config;
pub use config::{Stage, TournamentConfig, TournamentId, ValidationReport, validate};

/// Bracket generators for every format engine.
pub mod engine;
pub use engine::{Bracket, GenerationError, Match, Participant, generate};

/// Legacy record migration.
pub mod migration;
pub use migration::{MigrationOrchestrator, MigrationTranslator, translate};

/// Storage port and adapters.
pub mod db;
