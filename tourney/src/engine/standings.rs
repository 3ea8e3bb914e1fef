//! Standings tables and tie-break ordering for group and Swiss play.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Match;
use crate::config::{Points, Tiebreaker};

/// One participant's line in a standings table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsRow {
    pub participant: String,
    /// 1-based entry seed, the final tie-break
    pub seed: usize,
    pub rank: usize,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub byes: u32,
    pub points: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub buchholz: i64,
    pub opponents_score: i64,
    #[serde(skip)]
    pub opponents: Vec<usize>,
}

impl StandingsRow {
    pub fn goal_difference(&self) -> i64 {
        self.goals_for - self.goals_against
    }
}

/// Build standings from completed matches.
///
/// Rows come back ranked: points first, then `tiebreakers` in order, then
/// seed. Matches naming unknown participants are ignored.
pub fn compute_standings(
    participants: &[String],
    matches: &[Match],
    points: Points,
    tiebreakers: &[Tiebreaker],
) -> Vec<StandingsRow> {
    let index: HashMap<&str, usize> = participants
        .iter()
        .enumerate()
        .map(|(i, p)| (p.as_str(), i))
        .collect();

    let mut rows: Vec<StandingsRow> = participants
        .iter()
        .enumerate()
        .map(|(i, p)| StandingsRow {
            participant: p.clone(),
            seed: i + 1,
            ..Default::default()
        })
        .collect();

    let completed: Vec<&Match> = matches.iter().filter(|m| m.is_completed()).collect();

    for m in &completed {
        if m.is_bye() {
            if let Some(&i) = m.team1.as_deref().and_then(|t| index.get(t)) {
                rows[i].byes += 1;
                rows[i].wins += 1;
                rows[i].points += i64::from(points.win);
            }
            continue;
        }
        let Some((a, b)) = m.pairing() else { continue };
        let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) else {
            continue;
        };
        let (sa, sb) = (m.team1_score.unwrap_or(0), m.team2_score.unwrap_or(0));

        for (me, them, gf, ga) in [(ia, ib, sa, sb), (ib, ia, sb, sa)] {
            let row = &mut rows[me];
            row.played += 1;
            row.goals_for += gf;
            row.goals_against += ga;
            row.opponents.push(them);
            match m.winner.as_deref() {
                Some(w) if w == participants[me] => {
                    row.wins += 1;
                    row.points += i64::from(points.win);
                }
                Some(_) => {
                    row.losses += 1;
                    row.points += i64::from(points.loss);
                }
                None => {
                    row.draws += 1;
                    row.points += i64::from(points.draw);
                }
            }
        }
    }

    let totals: Vec<(i64, i64)> = rows.iter().map(|r| (r.points, r.goals_for)).collect();
    for row in &mut rows {
        row.buchholz = row.opponents.iter().map(|&o| totals[o].0).sum();
        row.opponents_score = row.opponents.iter().map(|&o| totals[o].1).sum();
    }

    let mut criteria = Vec::with_capacity(tiebreakers.len() + 1);
    criteria.push(Tiebreaker::Points);
    criteria.extend(tiebreakers.iter().copied().filter(|t| *t != Tiebreaker::Points));

    let order = rank_block(
        (0..rows.len()).collect(),
        &criteria,
        &rows,
        &completed,
        &index,
        points,
    );

    let mut ranked: Vec<StandingsRow> = Vec::with_capacity(rows.len());
    let mut slots: Vec<Option<StandingsRow>> = rows.into_iter().map(Some).collect();
    for (rank, i) in order.into_iter().enumerate() {
        if let Some(mut row) = slots[i].take() {
            row.rank = rank + 1;
            ranked.push(row);
        }
    }
    ranked
}

/// Order a block of tied rows by the first criterion, then split into
/// sub-blocks that are still level and recurse with the remaining criteria.
fn rank_block(
    mut block: Vec<usize>,
    criteria: &[Tiebreaker],
    rows: &[StandingsRow],
    matches: &[&Match],
    index: &HashMap<&str, usize>,
    points: Points,
) -> Vec<usize> {
    let Some((&criterion, rest)) = criteria.split_first() else {
        block.sort_by_key(|&i| rows[i].seed);
        return block;
    };
    if block.len() < 2 {
        return block;
    }

    let keys: HashMap<usize, i64> = match criterion {
        Tiebreaker::HeadToHead => head_to_head(&block, matches, index, points),
        _ => block
            .iter()
            .map(|&i| (i, criterion_value(criterion, &rows[i])))
            .collect(),
    };
    let key = |i: &usize| keys.get(i).copied().unwrap_or(0);

    block.sort_by(|a, b| key(b).cmp(&key(a)).then(rows[*a].seed.cmp(&rows[*b].seed)));

    let mut ordered = Vec::with_capacity(block.len());
    let mut start = 0;
    while start < block.len() {
        let level = key(&block[start]);
        let end = block[start..]
            .iter()
            .position(|i| key(i) != level)
            .map_or(block.len(), |offset| start + offset);
        ordered.extend(rank_block(
            block[start..end].to_vec(),
            rest,
            rows,
            matches,
            index,
            points,
        ));
        start = end;
    }
    ordered
}

fn criterion_value(criterion: Tiebreaker, row: &StandingsRow) -> i64 {
    match criterion {
        Tiebreaker::Points => row.points,
        Tiebreaker::GoalDifference => row.goal_difference(),
        Tiebreaker::GoalsFor => row.goals_for,
        Tiebreaker::Wins => i64::from(row.wins),
        Tiebreaker::Buchholz => row.buchholz,
        Tiebreaker::OpponentsScore => row.opponents_score,
        Tiebreaker::HeadToHead => 0,
    }
}

/// Points earned only in matches among the block's members
fn head_to_head(
    block: &[usize],
    matches: &[&Match],
    index: &HashMap<&str, usize>,
    points: Points,
) -> HashMap<usize, i64> {
    let mut mini: HashMap<usize, i64> = block.iter().map(|&i| (i, 0)).collect();
    for m in matches {
        let Some((a, b)) = m.pairing() else { continue };
        let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) else {
            continue;
        };
        if !mini.contains_key(&ia) || !mini.contains_key(&ib) {
            continue;
        }
        let (pa, pb) = match m.winner.as_deref() {
            Some(w) if w == a => (points.win, points.loss),
            Some(_) => (points.loss, points.win),
            None => (points.draw, points.draw),
        };
        *mini.entry(ia).or_default() += i64::from(pa);
        *mini.entry(ib).or_default() += i64::from(pb);
    }
    mini
}
