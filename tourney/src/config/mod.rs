//! Canonical tournament configuration and its validation.
//!
//! ## Example
//!
//! ```
//! use tourney::config::{validate, SingleStage, Stage, TournamentConfig};
//!
//! let config = TournamentConfig::simple(
//!     "Spring Open",
//!     16,
//!     Stage::Single(SingleStage { size: 16, third_place: true }),
//! );
//! assert!(validate(&config).valid);
//! ```

pub mod models;
pub mod validator;

pub use models::{
    Band, Division, DoubleStage, Eligibility, Finals, GenderPolicy, LeaderboardEvent,
    LeaderboardStage, MeasureType, Meta, ParticipantType, Points, RoundRobinStage, Scheduling,
    Seeding, SeedingMethod, SingleStage, Stage, SwissPairing, SwissStage, Tiebreaker, TimeWindow,
    TournamentConfig, TournamentId,
};
pub use validator::{ValidationReport, check_structure, validate, validate_value};
