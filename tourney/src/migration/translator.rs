//! Legacy record → canonical config translation.
//!
//! Translation is pure: it reads one legacy record and produces a config plus
//! the warnings describing every lossy or defaulted decision.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::MigrationWarning;
use super::legacy::LegacyTournament;
use crate::config::{
    Band, Division, DoubleStage, Eligibility, Finals, GenderPolicy, LeaderboardEvent,
    LeaderboardStage, MeasureType, Meta, ParticipantType, Points, RoundRobinStage, Scheduling,
    Seeding, SeedingMethod, SingleStage, Stage, SwissPairing, SwissStage, Tiebreaker,
    TournamentConfig,
};

/// Engine a legacy format maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Single,
    Double,
    RoundRobin,
    Swiss,
    Leaderboard,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Single => "single",
            EngineKind::Double => "double",
            EngineKind::RoundRobin => "round_robin",
            EngineKind::Swiss => "swiss",
            EngineKind::Leaderboard => "leaderboard",
        }
    }
}

use EngineKind::{Double, Leaderboard, RoundRobin, Single, Swiss};

/// Legacy `tournamentType` → engine. The flag is false where the legacy
/// format has no exact engine and is run as the closest one.
const FORMAT_TABLE: &[(&str, EngineKind, bool)] = &[
    ("single", Single, true),
    ("single-elimination", Single, true),
    ("double", Double, true),
    ("double-elimination", Double, true),
    ("round-robin", RoundRobin, true),
    ("pool-play", RoundRobin, true),
    ("round-robin-pools", RoundRobin, true),
    ("swiss-system", Swiss, true),
    ("swiss", Swiss, true),
    ("free-for-all", Leaderboard, true),
    ("multi-heat-racing", Leaderboard, true),
    ("battle-royale", Leaderboard, true),
    ("point-accumulation", Leaderboard, true),
    ("time-trials", Leaderboard, true),
    ("survival-elimination", Leaderboard, true),
    ("stroke-play", Leaderboard, true),
    ("multi-event-scoring", Leaderboard, true),
    ("preliminary-finals", Leaderboard, true),
    ("heat-management", Leaderboard, true),
    ("skills-competition", Leaderboard, true),
    ("march-madness", Single, false),
    ("triple-elimination", Double, false),
    ("compass-draw", Single, false),
    ("game-guarantee", Double, false),
    ("weight-class-bracket", Single, false),
    ("conference-championship", Single, false),
    ("prediction-bracket", Single, false),
    ("double-stage", Single, false),
    ("match-play", Single, false),
    ("scramble", Leaderboard, false),
    ("best-ball", Leaderboard, false),
    ("alternate-shot", Leaderboard, false),
    ("modified-stableford", Leaderboard, false),
    ("playoff-bracket", Single, false),
    ("dual-meet", Leaderboard, false),
    ("triangular-meet", RoundRobin, false),
    ("group-stage-knockout", Single, false),
    ("home-away-series", RoundRobin, false),
    ("draw-management", Single, false),
    ("elimination-pools", Single, false),
    ("consolation-bracket", Double, false),
    ("team-vs-individual", Leaderboard, false),
    ("portfolio-review", Leaderboard, false),
    ("oral-competition", Leaderboard, false),
    ("written-test", Leaderboard, false),
    ("judged-performance", Leaderboard, false),
    ("timed-competition", Leaderboard, false),
    ("scoring-average", Leaderboard, false),
    ("advancement-ladder", Single, false),
    ("rating-system", Swiss, false),
    ("prediction-scoring", Leaderboard, false),
    ("multiple-bracket-system", Single, false),
    ("three-bracket-system", Single, false),
    ("guarantee-system", Double, false),
    ("regional-bracket", Single, false),
    ("individual-leaderboard", Leaderboard, false),
    ("heat-progression", Leaderboard, false),
    ("elimination-rounds", Single, false),
    ("performance-ranking", Leaderboard, false),
    ("cumulative-scoring", Leaderboard, false),
    ("time-based-ranking", Leaderboard, false),
];

/// Engine for a legacy type and whether the mapping is exact
pub fn lookup_format(tournament_type: &str) -> Option<(EngineKind, bool)> {
    FORMAT_TABLE
        .iter()
        .find(|(name, _, _)| *name == tournament_type)
        .map(|&(_, engine, exact)| (engine, exact))
}

fn age_band(age_group: &str) -> Option<Band> {
    let (min, max) = match age_group {
        "Elementary" => (Some(5), Some(11)),
        "Middle School" => (Some(11), Some(14)),
        "High School" => (Some(14), Some(18)),
        "College" => (Some(18), Some(23)),
        "Adult" => (Some(18), None),
        "Masters" => (Some(35), None),
        "Senior" => (Some(55), None),
        _ => return None,
    };
    Some(Band::new(min, max))
}

fn grade_band(age_group: &str) -> Option<Band> {
    match age_group {
        "Elementary" => Some(Band::new(Some(1), Some(5))),
        "Middle School" => Some(Band::new(Some(6), Some(8))),
        "High School" => Some(Band::new(Some(9), Some(12))),
        _ => None,
    }
}

fn gender_policy(gender_division: &str) -> Option<GenderPolicy> {
    match gender_division {
        "Men" | "Boys" => Some(GenderPolicy::Male),
        "Women" | "Girls" => Some(GenderPolicy::Female),
        "Mixed" => Some(GenderPolicy::Mixed),
        "Co-Ed" | "CoEd" => Some(GenderPolicy::Coed),
        _ => None,
    }
}

/// Tunable translation heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorSettings {
    pub group_size_min: u32,
    pub group_size_max: u32,
    /// Field size assumed when the record declares none
    pub default_participants: u32,
    pub min_swiss_rounds: u32,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            group_size_min: 3,
            group_size_max: 8,
            default_participants: 16,
            min_swiss_rounds: 3,
        }
    }
}

/// A translated config and the warnings raised while building it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub config: TournamentConfig,
    pub warnings: Vec<MigrationWarning>,
}

/// Translates legacy records using a fixed format table and tunable heuristics
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationTranslator {
    settings: TranslatorSettings,
}

impl MigrationTranslator {
    pub fn new(settings: TranslatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TranslatorSettings {
        &self.settings
    }

    /// Field size the translation uses for `legacy`
    pub fn participant_count(&self, legacy: &LegacyTournament) -> u32 {
        legacy
            .declared_participants()
            .unwrap_or(self.settings.default_participants)
    }

    pub fn translate(&self, legacy: &LegacyTournament) -> Translation {
        let mut warnings = Vec::new();

        let engine = match legacy.tournament_type.as_deref().map(|t| (t, lookup_format(t))) {
            Some((_, Some((engine, true)))) => engine,
            Some((t, Some((engine, false)))) => {
                warnings.push(MigrationWarning::ApproximatedFormat {
                    tournament_type: t.to_string(),
                    engine: engine.as_str().to_string(),
                });
                engine
            }
            Some((_, None)) | None => {
                warnings.push(MigrationWarning::UnmappedTournamentType {
                    tournament_type: legacy.tournament_type.clone(),
                });
                EngineKind::Single
            }
        };

        let config = TournamentConfig {
            meta: self.meta(legacy),
            divisions: divisions(legacy, &mut warnings),
            stages: vec![self.stage(engine, legacy, &mut warnings)],
            seeding: Seeding {
                method: SeedingMethod::Random,
            },
            scheduling: Scheduling::default(),
        };

        log::debug!(
            "Translated tournament {} ({:?}) to {} with {} warnings",
            legacy.id,
            legacy.tournament_type,
            engine.as_str(),
            warnings.len()
        );
        Translation { config, warnings }
    }

    fn meta(&self, legacy: &LegacyTournament) -> Meta {
        let declared = legacy.team_size.filter(|&n| n > 0);
        let participant_type = if declared.is_some_and(|n| n > 1) {
            ParticipantType::Team
        } else {
            ParticipantType::Individual
        };
        let team_size = match participant_type {
            ParticipantType::Team => declared.or(Some(2)),
            ParticipantType::Individual => declared,
        };

        Meta {
            name: legacy.name.clone(),
            participant_type,
            team_size,
            participant_count: self.participant_count(legacy),
        }
    }

    fn stage(
        &self,
        engine: EngineKind,
        legacy: &LegacyTournament,
        warnings: &mut Vec<MigrationWarning>,
    ) -> Stage {
        let count = self.participant_count(legacy);
        let kind = legacy.tournament_type.as_deref().unwrap_or_default();

        match engine {
            EngineKind::Single => Stage::Single(SingleStage {
                size: count,
                third_place: matches!(kind, "march-madness" | "weight-class-bracket"),
            }),
            EngineKind::Double => {
                let guarantee = kind == "game-guarantee";
                Stage::Double(DoubleStage {
                    size: count,
                    finals: if guarantee {
                        Finals::IfNecessary
                    } else {
                        Finals::Single
                    },
                    min_games_guaranteed: guarantee.then_some(2),
                })
            }
            EngineKind::RoundRobin => {
                let min = self.settings.group_size_min;
                let group_size = ceil_sqrt(count).clamp(min, self.settings.group_size_max.max(min));
                Stage::RoundRobin(RoundRobinStage {
                    groups: count.div_ceil(group_size.max(1)),
                    group_size,
                    points: Points::league(),
                    tiebreakers: vec![
                        Tiebreaker::Points,
                        Tiebreaker::HeadToHead,
                        Tiebreaker::GoalDifference,
                    ],
                })
            }
            EngineKind::Swiss => Stage::Swiss(SwissStage {
                rounds: ceil_log2(count).max(self.settings.min_swiss_rounds),
                pairing: SwissPairing::Seed,
                tiebreakers: vec![
                    Tiebreaker::Points,
                    Tiebreaker::OpponentsScore,
                    Tiebreaker::Buchholz,
                ],
            }),
            EngineKind::Leaderboard => Stage::Leaderboard(LeaderboardStage {
                events: leaderboard_events(legacy, warnings),
            }),
        }
    }
}

/// Translate with default settings
pub fn translate(legacy: &LegacyTournament) -> Translation {
    MigrationTranslator::default().translate(legacy)
}

fn ceil_sqrt(n: u32) -> u32 {
    let mut root = 0u32;
    while root.saturating_mul(root) < n {
        root += 1;
    }
    root
}

fn ceil_log2(n: u32) -> u32 {
    n.max(1).next_power_of_two().trailing_zeros()
}

fn divisions(legacy: &LegacyTournament, warnings: &mut Vec<MigrationWarning>) -> Vec<Division> {
    let age_group = legacy.age_group.as_deref();
    let gender = legacy.gender_division.as_deref().unwrap_or("Mixed");

    let eligibility = match age_group {
        Some(group) => {
            let eligibility = Eligibility {
                age_band: age_band(group),
                grade_band: grade_band(group),
            };
            if eligibility.age_band.is_none() {
                warnings.push(MigrationWarning::UnmappedAgeGroup {
                    age_group: group.to_string(),
                });
            }
            eligibility
        }
        None => Eligibility::default(),
    };

    let gender_policy = gender_policy(gender).unwrap_or_else(|| {
        warnings.push(MigrationWarning::UnmappedGenderDivision {
            gender_division: gender.to_string(),
        });
        GenderPolicy::Open
    });

    let mut divisions = vec![Division {
        name: format!("{} {}", age_group.unwrap_or("Open"), gender)
            .trim()
            .to_string(),
        eligibility,
        gender_policy,
    }];

    for (index, entry) in legacy.divisions.iter().flatten().enumerate() {
        let Some(object) = entry.as_object() else {
            continue;
        };
        let Some(name) = object
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
        else {
            warnings.push(MigrationWarning::IgnoredDivision { index });
            continue;
        };
        let eligibility = object
            .get("eligibility")
            .and_then(|e| serde_json::from_value(e.clone()).ok())
            .unwrap_or_default();
        let gender_policy = object
            .get("genderPolicy")
            .and_then(|g| serde_json::from_value(g.clone()).ok())
            .unwrap_or(GenderPolicy::Open);
        divisions.push(Division {
            name: name.to_string(),
            eligibility,
            gender_policy,
        });
    }
    divisions
}

fn leaderboard_events(
    legacy: &LegacyTournament,
    warnings: &mut Vec<MigrationWarning>,
) -> Vec<LeaderboardEvent> {
    let sport = legacy.sport.as_deref().unwrap_or("General");
    let kind = legacy.tournament_type.as_deref().unwrap_or_default();
    let cap = legacy.max_participants.filter(|&n| n > 0);

    let event = |name: &str, measure_type: MeasureType, unit: &str, max: Option<u32>| {
        LeaderboardEvent {
            name: Some(name.to_string()),
            measure_type,
            unit: unit.to_string(),
            max_participants: max,
        }
    };

    if sport.contains("Track") || kind == "time-trials" {
        vec![event("Main Event", MeasureType::Time, "seconds", cap)]
    } else if sport.contains("Golf") || kind == "stroke-play" {
        // Score ranks descending, so the stroke count reads backwards
        warnings.push(MigrationWarning::ReversedRanking {
            event: "Stroke Play".to_string(),
            unit: "strokes".to_string(),
        });
        vec![event("Stroke Play", MeasureType::Score, "strokes", cap)]
    } else if sport.contains("Swimming") || kind == "multi-heat-racing" {
        vec![
            event("Heat 1", MeasureType::Time, "seconds", Some(8)),
            event("Heat 2", MeasureType::Time, "seconds", Some(8)),
        ]
    } else if kind == "multi-event-scoring" {
        vec![
            event("Event 1", MeasureType::Score, "points", cap),
            event("Event 2", MeasureType::Score, "points", cap),
        ]
    } else if kind.contains("time") {
        vec![event("Main Competition", MeasureType::Time, "seconds", cap)]
    } else {
        vec![event("Main Competition", MeasureType::Score, "points", cap)]
    }
}
