//! Heat-based events ranked by a measured value, and the overall leaderboard
//! across events.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::{
    Bracket, FormatEngine, GenerationResult, Heat, StageContext, balanced_sizes,
    require_participants, serpentine,
};
use crate::config::{LeaderboardEvent, LeaderboardStage, MeasureType};

/// A participant's placing in one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPlacement {
    pub participant: String,
    pub value: f64,
    pub rank: u32,
}

/// A participant's line on the overall leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStanding {
    pub participant: String,
    pub score: f64,
    pub rank: u32,
}

/// Split the field into heats for one event
pub fn heats_for_event(
    event: &LeaderboardEvent,
    ctx: StageContext,
    event_index: usize,
    participants: &[String],
) -> Vec<Heat> {
    let cap = event
        .max_participants
        .map_or(participants.len(), |m| m.max(1) as usize);
    let count = participants.len().div_ceil(cap.max(1));

    serpentine(participants, &balanced_sizes(participants.len(), count))
        .into_iter()
        .enumerate()
        .map(|(i, members)| Heat {
            tournament_id: ctx.tournament_id,
            stage: ctx.stage,
            event: event_index,
            event_name: event.name.clone(),
            heat: i as u32 + 1,
            participants: members,
        })
        .collect()
}

/// Rank results for one event. Times rank ascending, scores descending;
/// equal values share a rank and the next rank skips (1, 2, 2, 4).
pub fn rank_event(event: &LeaderboardEvent, results: &[(String, f64)]) -> Vec<EventPlacement> {
    let mut sorted: Vec<&(String, f64)> = results.iter().collect();
    let better = |a: f64, b: f64| match event.measure_type {
        MeasureType::Time => a.total_cmp(&b),
        MeasureType::Score => b.total_cmp(&a),
    };
    sorted.sort_by(|a, b| better(a.1, b.1));
    competition_ranks(sorted.into_iter().map(|(p, v)| (p.clone(), *v)))
        .into_iter()
        .map(|(participant, value, rank)| EventPlacement {
            participant,
            value,
            rank,
        })
        .collect()
}

/// Assign shared ranks to an already ordered sequence
fn competition_ranks(ordered: impl Iterator<Item = (String, f64)>) -> Vec<(String, f64, u32)> {
    let mut out: Vec<(String, f64, u32)> = Vec::new();
    for (i, (participant, value)) in ordered.enumerate() {
        let rank = match out.last() {
            Some((_, prev, prev_rank)) if prev.total_cmp(&value) == Ordering::Equal => *prev_rank,
            _ => i as u32 + 1,
        };
        out.push((participant, value, rank));
    }
    out
}

/// Combines per-event placements into one overall score
pub trait Aggregation: Send + Sync {
    fn name(&self) -> &'static str;

    /// Overall score from one placement per event (`None` when absent)
    fn score(&self, placements: &[Option<u32>], field_size: usize) -> f64;

    /// Whether a larger score ranks higher
    fn higher_is_better(&self) -> bool;
}

/// Lowest sum of placements wins; a missed event counts as last place plus one
#[derive(Debug, Clone, Copy, Default)]
pub struct RankSum;

impl Aggregation for RankSum {
    fn name(&self) -> &'static str {
        "rank_sum"
    }

    fn score(&self, placements: &[Option<u32>], field_size: usize) -> f64 {
        placements
            .iter()
            .map(|p| f64::from(p.unwrap_or(field_size as u32 + 1)))
            .sum()
    }

    fn higher_is_better(&self) -> bool {
        false
    }
}

/// Points by placement from a table (index 0 is first place)
#[derive(Debug, Clone)]
pub struct PlacementPoints {
    pub table: Vec<u32>,
}

impl Default for PlacementPoints {
    fn default() -> Self {
        Self {
            table: vec![10, 8, 6, 5, 4, 3, 2, 1],
        }
    }
}

impl Aggregation for PlacementPoints {
    fn name(&self) -> &'static str {
        "placement_points"
    }

    fn score(&self, placements: &[Option<u32>], _field_size: usize) -> f64 {
        placements
            .iter()
            .flatten()
            .filter_map(|&rank| self.table.get(rank.checked_sub(1)? as usize))
            .map(|&points| f64::from(points))
            .sum()
    }

    fn higher_is_better(&self) -> bool {
        true
    }
}

/// Best single placement across events
#[derive(Debug, Clone, Copy, Default)]
pub struct BestPlacement;

impl Aggregation for BestPlacement {
    fn name(&self) -> &'static str {
        "best_placement"
    }

    fn score(&self, placements: &[Option<u32>], field_size: usize) -> f64 {
        let best = placements.iter().flatten().min().copied();
        f64::from(best.unwrap_or(field_size as u32 + 1))
    }

    fn higher_is_better(&self) -> bool {
        false
    }
}

/// Overall standings for `participants` from each event's placements
pub fn overall_leaderboard(
    participants: &[String],
    events: &[Vec<EventPlacement>],
    aggregation: &dyn Aggregation,
) -> Vec<OverallStanding> {
    let lookups: Vec<HashMap<&str, u32>> = events
        .iter()
        .map(|placements| {
            placements
                .iter()
                .map(|p| (p.participant.as_str(), p.rank))
                .collect()
        })
        .collect();

    let mut scored: Vec<(usize, f64)> = participants
        .iter()
        .enumerate()
        .map(|(i, participant)| {
            let placements: Vec<Option<u32>> = lookups
                .iter()
                .map(|l| l.get(participant.as_str()).copied())
                .collect();
            (i, aggregation.score(&placements, participants.len()))
        })
        .collect();

    scored.sort_by(|(ia, a), (ib, b)| {
        let ord = if aggregation.higher_is_better() {
            b.total_cmp(a)
        } else {
            a.total_cmp(b)
        };
        ord.then(ia.cmp(ib))
    });

    competition_ranks(
        scored
            .into_iter()
            .map(|(i, score)| (participants[i].clone(), score)),
    )
    .into_iter()
    .map(|(participant, score, rank)| OverallStanding {
        participant,
        score,
        rank,
    })
    .collect()
}

impl FormatEngine for LeaderboardStage {
    fn generate(&self, ctx: StageContext, participants: &[String]) -> GenerationResult<Bracket> {
        require_participants(participants)?;
        let heats: Vec<Heat> = self
            .events
            .iter()
            .enumerate()
            .flat_map(|(i, event)| heats_for_event(event, ctx, i, participants))
            .collect();

        log::debug!(
            "Generated {} heats across {} events for {} entrants",
            heats.len(),
            self.events.len(),
            participants.len()
        );

        Ok(Bracket {
            matches: Vec::new(),
            heats,
            total_rounds: self.events.len() as u32,
            warnings: Vec::new(),
        })
    }

    fn capacity(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(measure_type: MeasureType, max: Option<u32>) -> LeaderboardEvent {
        LeaderboardEvent {
            name: Some("100m".to_string()),
            measure_type,
            unit: "seconds".to_string(),
            max_participants: max,
        }
    }

    fn results(list: &[(&str, f64)]) -> Vec<(String, f64)> {
        list.iter().map(|(p, v)| (p.to_string(), *v)).collect()
    }

    #[test]
    fn test_time_ranks_ascending_with_shared_places() {
        let placements = rank_event(
            &event(MeasureType::Time, None),
            &results(&[("A", 12.4), ("B", 11.9), ("C", 12.4), ("D", 13.0)]),
        );
        let view: Vec<(&str, u32)> = placements
            .iter()
            .map(|p| (p.participant.as_str(), p.rank))
            .collect();
        assert_eq!(view, vec![("B", 1), ("A", 2), ("C", 2), ("D", 4)]);
    }

    #[test]
    fn test_score_ranks_descending() {
        let placements = rank_event(
            &event(MeasureType::Score, None),
            &results(&[("A", 70.0), ("B", 90.0), ("C", 80.0)]),
        );
        assert_eq!(placements[0].participant, "B");
        assert_eq!(placements[2].participant, "A");
        assert_eq!(placements[2].rank, 3);
    }

    #[test]
    fn test_heats_balanced_and_serpentine() {
        let field: Vec<String> = (1..=10).map(|i| format!("P{i}")).collect();
        let heats = heats_for_event(
            &event(MeasureType::Time, Some(4)),
            StageContext::new(1, 0),
            0,
            &field,
        );
        let sizes: Vec<usize> = heats.iter().map(|h| h.participants.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(heats[0].participants[0], "P1");
        assert_eq!(heats[1].participants[0], "P2");
        assert_eq!(heats[2].heat, 3);
    }

    #[test]
    fn test_whole_field_single_heat_by_default() {
        let field: Vec<String> = (1..=6).map(|i| format!("P{i}")).collect();
        let heats = heats_for_event(
            &event(MeasureType::Time, None),
            StageContext::new(1, 0),
            0,
            &field,
        );
        assert_eq!(heats.len(), 1);
        assert_eq!(heats[0].participants.len(), 6);
    }

    #[test]
    fn test_aggregations() {
        let field: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let sprint = rank_event(
            &event(MeasureType::Time, None),
            &results(&[("A", 10.0), ("B", 11.0), ("C", 12.0)]),
        );
        let jump = rank_event(
            &event(MeasureType::Score, None),
            &results(&[("B", 7.1), ("C", 6.5)]),
        );
        let events = vec![sprint, jump];

        let by_sum = overall_leaderboard(&field, &events, &RankSum);
        // A: 1 + 4 (missed), B: 2 + 1, C: 3 + 2
        assert_eq!(by_sum[0].participant, "B");
        assert_eq!(by_sum[0].score, 3.0);
        assert_eq!(by_sum[1].participant, "A");
        assert_eq!(by_sum[1].rank, 2);
        assert_eq!(by_sum[2].rank, 2);

        let by_points = overall_leaderboard(&field, &events, &PlacementPoints::default());
        // A: 10, B: 8 + 10, C: 6 + 8
        assert_eq!(by_points[0].participant, "B");
        assert_eq!(by_points[0].score, 18.0);
        assert_eq!(by_points[2].participant, "A");

        let by_best = overall_leaderboard(&field, &events, &BestPlacement);
        assert_eq!(by_best[0].rank, 1);
        assert_eq!(by_best[1].rank, 1);
        assert_eq!(by_best[2].participant, "C");
    }
}
