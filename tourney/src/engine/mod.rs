//! Format engines that turn a stage definition and a seeded entry list into
//! matches (or heats).
//!
//! Each stage variant implements [`FormatEngine`]; [`StageEngine`] dispatches
//! over them with `enum_dispatch` so the generator never matches on the
//! variant itself.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{
    DoubleStage, LeaderboardStage, RoundRobinStage, SingleStage, Stage, SwissStage, TournamentId,
};

pub mod elimination;
pub mod generator;
pub mod leaderboard;
pub mod round_robin;
pub mod standings;
pub mod swiss;

pub use generator::{Participant, generate, generate_stage, seed_participants};
pub use leaderboard::{
    Aggregation, BestPlacement, EventPlacement, OverallStanding, PlacementPoints, RankSum,
    overall_leaderboard, rank_event,
};
pub use standings::{StandingsRow, compute_standings};
pub use swiss::pair_round;

/// Generation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Invalid config: {}", .0.join(", "))]
    InvalidConfig(Vec<String>),

    #[error("Not enough participants: need at least {needed}, have {actual}")]
    NotEnoughParticipants { needed: usize, actual: usize },

    #[error("Too many participants: capacity {capacity}, have {actual}")]
    OverCapacity { capacity: usize, actual: usize },

    #[error("Group {group} has {size} members, need at least 2")]
    GroupTooSmall { group: usize, size: usize },

    #[error("Stage {index} does not exist ({count} stages configured)")]
    StageOutOfRange { index: usize, count: usize },

    #[error("Rating-based seeding needs a rating for {0}")]
    RatingMissing(String),
}

pub type GenerationResult<T> = Result<T, GenerationError>;

/// Which part of a stage a match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketKind {
    Winners,
    Losers,
    Championship,
    ThirdPlace,
    Group,
    Swiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    InProgress,
    Completed,
}

/// Where a pending slot gets its participant from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Winner(String),
    Loser(String),
}

/// A scheduled or played match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub tournament_id: TournamentId,
    pub stage: usize,
    pub bracket: BracketKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<usize>,
    pub round: u32,
    pub position: u32,
    pub team1: Option<String>,
    pub team2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team1_from: Option<Feed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team2_from: Option<Feed>,
    pub team1_score: Option<i64>,
    pub team2_score: Option<i64>,
    pub winner: Option<String>,
    pub status: MatchStatus,
    #[serde(default)]
    pub if_necessary: bool,
}

impl Match {
    /// An upcoming match with empty slots
    pub fn new(
        id: impl Into<String>,
        tournament_id: TournamentId,
        stage: usize,
        bracket: BracketKind,
        round: u32,
        position: u32,
    ) -> Self {
        Self {
            id: id.into(),
            tournament_id,
            stage,
            bracket,
            group: None,
            round,
            position,
            team1: None,
            team2: None,
            team1_from: None,
            team2_from: None,
            team1_score: None,
            team2_score: None,
            winner: None,
            status: MatchStatus::Upcoming,
            if_necessary: false,
        }
    }

    /// A completed bye awarding the round to `participant`
    pub fn bye(
        id: impl Into<String>,
        tournament_id: TournamentId,
        stage: usize,
        bracket: BracketKind,
        round: u32,
        position: u32,
        participant: &str,
    ) -> Self {
        let mut m = Self::new(id, tournament_id, stage, bracket, round, position);
        m.team1 = Some(participant.to_string());
        m.winner = Some(participant.to_string());
        m.status = MatchStatus::Completed;
        m
    }

    pub fn with_teams(mut self, team1: &str, team2: &str) -> Self {
        self.team1 = Some(team1.to_string());
        self.team2 = Some(team2.to_string());
        self
    }

    pub fn is_bye(&self) -> bool {
        self.status == MatchStatus::Completed && self.team1.is_some() && self.team2.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Both assigned participants, if the match is fully set
    pub fn pairing(&self) -> Option<(&str, &str)> {
        match (&self.team1, &self.team2) {
            (Some(a), Some(b)) => Some((a.as_str(), b.as_str())),
            _ => None,
        }
    }

    /// Whether `participant` occupies either slot
    pub fn involves(&self, participant: &str) -> bool {
        self.team1.as_deref() == Some(participant) || self.team2.as_deref() == Some(participant)
    }

    /// Record a final score; equal scores are a draw
    pub fn record_result(&mut self, team1_score: i64, team2_score: i64) {
        self.team1_score = Some(team1_score);
        self.team2_score = Some(team2_score);
        self.winner = match team1_score.cmp(&team2_score) {
            std::cmp::Ordering::Greater => self.team1.clone(),
            std::cmp::Ordering::Less => self.team2.clone(),
            std::cmp::Ordering::Equal => None,
        };
        self.status = MatchStatus::Completed;
    }

    /// The participant who lost a decided match
    pub fn loser(&self) -> Option<&str> {
        let winner = self.winner.as_deref()?;
        let (a, b) = self.pairing()?;
        if winner == a { Some(b) } else { Some(a) }
    }
}

/// A leaderboard heat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heat {
    pub tournament_id: TournamentId,
    pub stage: usize,
    pub event: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub heat: u32,
    pub participants: Vec<String>,
}

/// Everything generated for one stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    pub matches: Vec<Match>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub heats: Vec<Heat>,
    pub total_rounds: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Bracket {
    pub fn find(&self, id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn matches_in(&self, bracket: BracketKind) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.bracket == bracket)
    }
}

/// Where generated matches belong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageContext {
    pub tournament_id: TournamentId,
    pub stage: usize,
}

impl StageContext {
    pub fn new(tournament_id: TournamentId, stage: usize) -> Self {
        Self {
            tournament_id,
            stage,
        }
    }
}

/// Generates the opening schedule of one stage from seeded participants
#[enum_dispatch]
pub trait FormatEngine {
    /// Participants are ordered best seed first
    fn generate(&self, ctx: StageContext, participants: &[String]) -> GenerationResult<Bracket>;

    /// Most entrants the stage can hold, if bounded
    fn capacity(&self) -> Option<usize>;
}

/// Stage definitions dispatched to their engine
#[enum_dispatch(FormatEngine)]
#[derive(Debug, Clone)]
pub enum StageEngine {
    SingleStage,
    DoubleStage,
    RoundRobinStage,
    SwissStage,
    LeaderboardStage,
}

impl From<&Stage> for StageEngine {
    fn from(stage: &Stage) -> Self {
        match stage {
            Stage::Single(s) => s.clone().into(),
            Stage::Double(d) => d.clone().into(),
            Stage::RoundRobin(rr) => rr.clone().into(),
            Stage::Swiss(sw) => sw.clone().into(),
            Stage::Leaderboard(lb) => lb.clone().into(),
        }
    }
}

pub(crate) fn require_participants(participants: &[String]) -> GenerationResult<()> {
    if participants.len() < 2 {
        return Err(GenerationError::NotEnoughParticipants {
            needed: 2,
            actual: participants.len(),
        });
    }
    Ok(())
}

/// Balanced bucket sizes: `count` items over `buckets`, extras front-loaded
pub(crate) fn balanced_sizes(count: usize, buckets: usize) -> Vec<usize> {
    if buckets == 0 {
        return Vec::new();
    }
    let base = count / buckets;
    let extra = count % buckets;
    (0..buckets).map(|i| base + usize::from(i < extra)).collect()
}

/// Deal items into buckets snake-wise (0,1,..,k-1,k-1,..,0,0,..), skipping
/// buckets that already hold their target size.
pub(crate) fn serpentine<T: Clone>(items: &[T], targets: &[usize]) -> Vec<Vec<T>> {
    let k = targets.len();
    let mut buckets: Vec<Vec<T>> = targets.iter().map(|&t| Vec::with_capacity(t)).collect();
    if k == 0 {
        return buckets;
    }
    let order: Vec<usize> = (0..k).chain((0..k).rev()).collect();
    let capacity: usize = targets.iter().sum();
    let mut cursor = 0;

    for item in items.iter().take(capacity) {
        loop {
            let b = order[cursor % order.len()];
            cursor += 1;
            if buckets[b].len() < targets[b] {
                buckets[b].push(item.clone());
                break;
            }
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("P{i}")).collect()
    }

    #[test]
    fn test_balanced_sizes_front_loads_extras() {
        assert_eq!(balanced_sizes(10, 3), vec![4, 3, 3]);
        assert_eq!(balanced_sizes(20, 4), vec![5, 5, 5, 5]);
        assert_eq!(balanced_sizes(3, 4), vec![1, 1, 1, 0]);
    }

    #[test]
    fn test_serpentine_spreads_top_seeds() {
        let items = names(8);
        let buckets = serpentine(&items, &balanced_sizes(8, 4));
        assert_eq!(buckets[0], vec!["P1", "P8"]);
        assert_eq!(buckets[1], vec!["P2", "P7"]);
        assert_eq!(buckets[3], vec!["P4", "P5"]);
    }

    #[test]
    fn test_serpentine_skips_full_buckets() {
        let items = names(7);
        let buckets = serpentine(&items, &balanced_sizes(7, 3));
        let sizes: Vec<usize> = buckets.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
        assert_eq!(buckets[0], vec!["P1", "P6", "P7"]);
    }

    #[test]
    fn test_record_result_and_loser() {
        let mut m = Match::new("W1-1", 1, 0, BracketKind::Winners, 1, 1).with_teams("A", "B");
        m.record_result(1, 3);
        assert_eq!(m.winner.as_deref(), Some("B"));
        assert_eq!(m.loser(), Some("A"));
        assert!(m.is_completed());

        m.record_result(2, 2);
        assert_eq!(m.winner, None);
        assert_eq!(m.loser(), None);
    }

    #[test]
    fn test_bye_is_completed_win() {
        let bye = Match::bye("S1-4", 1, 0, BracketKind::Swiss, 1, 4, "P7");
        assert!(bye.is_bye());
        assert_eq!(bye.winner.as_deref(), Some("P7"));
        assert_eq!(bye.pairing(), None);
    }

    #[test]
    fn test_feed_wire_format() {
        let value = serde_json::to_value(Feed::Loser("W2-1".to_string())).unwrap();
        assert_eq!(value, serde_json::json!({ "loser": "W2-1" }));
    }
}
