//! Canonical tournament configuration models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tournament ID type
pub type TournamentId = i64;

/// Whether participants are single competitors or teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantType {
    Individual,
    Team,
}

impl ParticipantType {
    pub const ALL: [&'static str; 2] = ["individual", "team"];
}

/// Gender eligibility policy for a division
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderPolicy {
    Male,
    Female,
    Mixed,
    Coed,
    Open,
}

impl GenderPolicy {
    pub const ALL: [&'static str; 5] = ["male", "female", "mixed", "coed", "open"];
}

/// Tournament-level descriptive data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Display name
    pub name: String,
    /// Individual or team competition
    pub participant_type: ParticipantType,
    /// Players per team (required for team competitions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_size: Option<u32>,
    /// Expected number of entrants
    pub participant_count: u32,
}

/// Inclusive numeric range; either end may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl Band {
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Whether `value` falls inside the band
    pub fn contains(&self, value: u32) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Division eligibility rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_band: Option<Band>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_band: Option<Band>,
}

impl Eligibility {
    pub fn is_unrestricted(&self) -> bool {
        self.age_band.is_none() && self.grade_band.is_none()
    }
}

/// A competitive division
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub name: String,
    #[serde(default)]
    pub eligibility: Eligibility,
    pub gender_policy: GenderPolicy,
}

/// Grand-final format for double elimination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finals {
    /// One grand-final match
    Single,
    /// A reset match is played if the losers-bracket finalist wins the first
    IfNecessary,
}

/// Pairing used for Swiss round one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwissPairing {
    /// Top half plays bottom half (1 v N/2+1)
    Seed,
    /// Neighbouring seeds play (1 v 2, 3 v 4)
    Adjacent,
}

/// Ordered tie-break criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tiebreaker {
    /// Standing points
    Points,
    /// Points earned in matches among the tied participants only
    HeadToHead,
    /// Scored minus conceded
    GoalDifference,
    /// Total scored
    GoalsFor,
    /// Number of wins
    Wins,
    /// Sum of opponents' standing points
    Buchholz,
    /// Sum of opponents' scored totals
    OpponentsScore,
}

/// Points awarded per result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Points {
    pub win: i32,
    pub draw: i32,
    pub loss: i32,
}

impl Points {
    /// Association-football style 3/1/0
    pub const fn league() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }

    /// Swiss scoring in half-point units (1 / ½ / 0 scaled by two)
    pub const fn swiss() -> Self {
        Self {
            win: 2,
            draw: 1,
            loss: 0,
        }
    }
}

impl Default for Points {
    fn default() -> Self {
        Self::league()
    }
}

/// How a leaderboard result is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureType {
    /// Lower is better
    Time,
    /// Higher is better
    Score,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleStage {
    pub size: u32,
    #[serde(default)]
    pub third_place: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoubleStage {
    pub size: u32,
    pub finals: Finals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_games_guaranteed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRobinStage {
    pub groups: u32,
    pub group_size: u32,
    pub points: Points,
    #[serde(default)]
    pub tiebreakers: Vec<Tiebreaker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwissStage {
    pub rounds: u32,
    pub pairing: SwissPairing,
    #[serde(default)]
    pub tiebreakers: Vec<Tiebreaker>,
}

/// One measured event of a leaderboard stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub measure_type: MeasureType,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStage {
    pub events: Vec<LeaderboardEvent>,
}

/// One phase of a tournament, tagged by the engine that runs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum Stage {
    Single(SingleStage),
    Double(DoubleStage),
    RoundRobin(RoundRobinStage),
    Swiss(SwissStage),
    Leaderboard(LeaderboardStage),
}

impl Stage {
    pub const ENGINES: [&'static str; 5] =
        ["single", "double", "round_robin", "swiss", "leaderboard"];

    /// Engine key as it appears in JSON
    pub fn engine(&self) -> &'static str {
        match self {
            Stage::Single(_) => "single",
            Stage::Double(_) => "double",
            Stage::RoundRobin(_) => "round_robin",
            Stage::Swiss(_) => "swiss",
            Stage::Leaderboard(_) => "leaderboard",
        }
    }

    pub fn is_elimination(&self) -> bool {
        matches!(self, Stage::Single(_) | Stage::Double(_))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.engine())
    }
}

/// Initial ordering of participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedingMethod {
    Random,
    SeedOrder,
    RatingBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seeding {
    pub method: SeedingMethod,
}

/// Venue/time availability consumed by external schedulers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheduling {
    #[serde(default)]
    pub venues: Vec<String>,
    #[serde(default)]
    pub time_windows: Vec<TimeWindow>,
}

/// Canonical, persisted tournament configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentConfig {
    pub meta: Meta,
    pub divisions: Vec<Division>,
    pub stages: Vec<Stage>,
    pub seeding: Seeding,
    #[serde(default)]
    pub scheduling: Scheduling,
}

impl TournamentConfig {
    /// An open single-division config with one stage and seed-order seeding
    pub fn simple(name: impl Into<String>, participant_count: u32, stage: Stage) -> Self {
        Self {
            meta: Meta {
                name: name.into(),
                participant_type: ParticipantType::Individual,
                team_size: None,
                participant_count,
            },
            divisions: vec![Division {
                name: "Open".to_string(),
                eligibility: Eligibility::default(),
                gender_policy: GenderPolicy::Open,
            }],
            stages: vec![stage],
            seeding: Seeding {
                method: SeedingMethod::SeedOrder,
            },
            scheduling: Scheduling::default(),
        }
    }

    /// First stage, which is the one generated from the entry list
    pub fn first_stage(&self) -> Option<&Stage> {
        self.stages.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_is_tagged_by_engine() {
        let stage = Stage::RoundRobin(RoundRobinStage {
            groups: 4,
            group_size: 5,
            points: Points::league(),
            tiebreakers: vec![Tiebreaker::HeadToHead],
        });
        let value = serde_json::to_value(&stage).unwrap();
        assert_eq!(value["engine"], "round_robin");
        assert_eq!(value["groupSize"], 5);
        assert_eq!(value["tiebreakers"], json!(["head_to_head"]));
    }

    #[test]
    fn test_double_stage_finals_wire_format() {
        let value = json!({ "engine": "double", "size": 8, "finals": "if_necessary" });
        let stage: Stage = serde_json::from_value(value).unwrap();
        match stage {
            Stage::Double(d) => {
                assert_eq!(d.finals, Finals::IfNecessary);
                assert_eq!(d.min_games_guaranteed, None);
            }
            other => panic!("unexpected stage {other}"),
        }
    }

    #[test]
    fn test_seeding_method_is_kebab_case() {
        let seeding = Seeding {
            method: SeedingMethod::RatingBased,
        };
        assert_eq!(serde_json::to_value(seeding).unwrap()["method"], "rating-based");
    }

    #[test]
    fn test_band_contains() {
        let band = Band::new(Some(14), Some(18));
        assert!(band.contains(14));
        assert!(band.contains(18));
        assert!(!band.contains(19));
        assert!(Band::new(Some(35), None).contains(90));
    }

    #[test]
    fn test_simple_config_round_trips_through_json() {
        let config = TournamentConfig::simple(
            "Spring Open",
            16,
            Stage::Single(SingleStage {
                size: 16,
                third_place: true,
            }),
        );
        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains("\"participantType\":\"individual\""));
        let back: TournamentConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
