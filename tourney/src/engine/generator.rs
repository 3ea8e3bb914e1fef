//! Bracket generation from a validated config.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{Bracket, FormatEngine, GenerationError, GenerationResult, StageContext, StageEngine};
use crate::config::{SeedingMethod, TournamentConfig, TournamentId, validate};

/// An entrant, optionally carrying a rating for rating-based seeding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rating: None,
        }
    }

    pub fn rated(name: impl Into<String>, rating: i64) -> Self {
        Self {
            name: name.into(),
            rating: Some(rating),
        }
    }

    /// `count` placeholder entrants named "Participant 1", "Participant 2", ...
    pub fn placeholders(count: usize) -> Vec<Self> {
        (1..=count)
            .map(|i| Self::new(format!("Participant {i}")))
            .collect()
    }
}

impl From<&str> for Participant {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Order participants for the given seeding method, best seed first.
///
/// `SeedOrder` keeps the list as supplied. `RatingBased` sorts by rating,
/// highest first, keeping list order between equal ratings.
pub fn seed_participants(
    method: SeedingMethod,
    participants: &[Participant],
) -> GenerationResult<Vec<String>> {
    match method {
        SeedingMethod::SeedOrder => Ok(participants.iter().map(|p| p.name.clone()).collect()),
        SeedingMethod::Random => {
            let mut names: Vec<String> = participants.iter().map(|p| p.name.clone()).collect();
            names.shuffle(&mut rand::rng());
            Ok(names)
        }
        SeedingMethod::RatingBased => {
            let mut rated = Vec::with_capacity(participants.len());
            for p in participants {
                let rating = p
                    .rating
                    .ok_or_else(|| GenerationError::RatingMissing(p.name.clone()))?;
                rated.push((rating, p.name.clone()));
            }
            rated.sort_by(|a, b| b.0.cmp(&a.0));
            Ok(rated.into_iter().map(|(_, name)| name).collect())
        }
    }
}

/// Generate the opening stage of a tournament
pub fn generate(
    config: &TournamentConfig,
    participants: &[Participant],
    tournament_id: TournamentId,
) -> GenerationResult<Bracket> {
    generate_stage(config, 0, participants, tournament_id)
}

/// Generate stage `index` for an already-decided entry list
pub fn generate_stage(
    config: &TournamentConfig,
    index: usize,
    participants: &[Participant],
    tournament_id: TournamentId,
) -> GenerationResult<Bracket> {
    let report = validate(config);
    if !report.valid {
        return Err(GenerationError::InvalidConfig(report.errors));
    }

    let stage = config
        .stages
        .get(index)
        .ok_or(GenerationError::StageOutOfRange {
            index,
            count: config.stages.len(),
        })?;

    let seeded = seed_participants(config.seeding.method, participants)?;
    let engine = StageEngine::from(stage);
    let bracket = engine.generate(StageContext::new(tournament_id, index), &seeded)?;

    log::info!(
        "Generated {} stage for tournament {}: {} matches, {} heats",
        stage,
        tournament_id,
        bracket.matches.len(),
        bracket.heats.len()
    );
    Ok(bracket)
}
