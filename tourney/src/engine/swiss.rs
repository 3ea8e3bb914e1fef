//! Swiss-system pairing.
//!
//! Round one pairs by seed. Every later round ranks the field from the match
//! history and searches for a pairing where nobody meets a previous opponent,
//! preferring opponents on the nearest score and then the nearest rank.
//!
//! Odd fields are paired as if a phantom entrant sat in the last slot; being
//! paired with it is the bye. While rounds remain, a pairing is only accepted
//! if the rest of the stage can still be played without repeats. Early on this
//! is certified against a circle-method schedule anchored on round one, which
//! keeps a repeat-free continuation open for up to `N - 1` rounds. In the last
//! rounds the unplayed graph is searched exactly.

use std::collections::HashSet;

use super::round_robin::circle_rounds;
use super::{
    Bracket, BracketKind, FormatEngine, GenerationResult, Match, StageContext, compute_standings,
    require_participants,
};
use crate::config::{Points, SwissPairing, SwissStage};

/// Search nodes allowed per attempt before falling back to a weaker mode
const SEARCH_BUDGET: usize = 200_000;

fn match_id(round: u32, position: u32) -> String {
    format!("S{round}-{position}")
}

/// Round-one pairings for the seeded field
pub fn first_round(
    stage: &SwissStage,
    ctx: StageContext,
    participants: &[String],
) -> GenerationResult<Vec<Match>> {
    require_participants(participants)?;

    let (field, bye) = match participants.split_last() {
        Some((last, rest)) if participants.len() % 2 == 1 => (rest, Some(last)),
        _ => (participants, None),
    };

    let half = field.len() / 2;
    let pairs: Vec<(&String, &String)> = match stage.pairing {
        SwissPairing::Seed => (0..half).map(|i| (&field[i], &field[i + half])).collect(),
        SwissPairing::Adjacent => field.chunks(2).map(|c| (&c[0], &c[1])).collect(),
    };

    let mut matches: Vec<Match> = pairs
        .into_iter()
        .enumerate()
        .map(|(i, (a, b))| {
            let position = i as u32 + 1;
            Match::new(
                match_id(1, position),
                ctx.tournament_id,
                ctx.stage,
                BracketKind::Swiss,
                1,
                position,
            )
            .with_teams(a, b)
        })
        .collect();

    if let Some(name) = bye {
        let position = matches.len() as u32 + 1;
        matches.push(Match::bye(
            match_id(1, position),
            ctx.tournament_id,
            ctx.stage,
            BracketKind::Swiss,
            1,
            position,
            name,
        ));
    }
    Ok(matches)
}

/// Pair round `round` (1-based) from the results recorded in `history`.
///
/// `participants` is the seeded entry list. Repeat pairings and second byes
/// are only produced when nothing better exists, and each one is reported in
/// the returned warnings.
pub fn pair_round(
    stage: &SwissStage,
    ctx: StageContext,
    participants: &[String],
    history: &[Match],
    round: u32,
) -> GenerationResult<Bracket> {
    if round <= 1 {
        return Ok(Bracket {
            matches: first_round(stage, ctx, participants)?,
            heats: Vec::new(),
            total_rounds: stage.rounds,
            warnings: Vec::new(),
        });
    }
    require_participants(participants)?;

    let n = participants.len();
    let size = n + n % 2;
    let phantom = n;
    let index = |name: &str| participants.iter().position(|p| p == name);

    let table = compute_standings(participants, history, Points::swiss(), &stage.tiebreakers);
    let ranked: Vec<usize> = table.iter().filter_map(|r| index(&r.participant)).collect();
    let mut rank = vec![0; n];
    let mut points = vec![0; n];
    for (position, row) in table.iter().enumerate() {
        if let Some(i) = index(&row.participant) {
            rank[i] = position;
            points[i] = row.points;
        }
    }

    let mut played = HashSet::new();
    let mut had_bye = HashSet::new();
    for m in history {
        if m.is_bye() {
            if let Some(i) = m.team1.as_deref().and_then(index) {
                had_bye.insert(i);
                played.insert(edge(i, phantom));
            }
        } else if let Some((a, b)) = m.pairing()
            && let (Some(ia), Some(ib)) = (index(a), index(b))
        {
            played.insert(edge(ia, ib));
        }
    }

    let opening = |matches: &[Match]| -> Vec<(usize, usize)> {
        matches
            .iter()
            .filter(|m| m.round == 1)
            .filter_map(|m| {
                let a = index(m.team1.as_deref()?)?;
                if m.is_bye() {
                    Some((a, phantom))
                } else {
                    Some((a, index(m.team2.as_deref()?)?))
                }
            })
            .collect()
    };
    let schedule = Schedule::new(&opening(history), size).or_else(|| {
        let seeded = first_round(stage, ctx, participants).ok()?;
        Schedule::new(&opening(&seeded), size)
    });

    let mut pairer = Pairer {
        n,
        size,
        rank,
        points,
        played,
        schedule,
        rounds_left: stage.rounds.saturating_sub(round) as usize,
        budget: 0,
    };
    if let Some(schedule) = pairer.schedule.as_mut() {
        for &e in &pairer.played {
            schedule.damage(e);
        }
    }

    let mut modes = Vec::new();
    match pairer.rounds_left {
        0 => {}
        1 | 2 => {
            modes.push((false, Lookahead::Exact, false));
            modes.push((false, Lookahead::Schedule, false));
        }
        _ => modes.push((false, Lookahead::Schedule, false)),
    }
    modes.push((false, Lookahead::Off, false));
    if n % 2 == 1 {
        modes.push((false, Lookahead::Off, true));
    }
    modes.push((true, Lookahead::Off, false));

    let everyone: Vec<Option<usize>> = ranked.iter().rev().map(|&i| Some(i)).collect();
    let fresh: Vec<Option<usize>> = everyone
        .iter()
        .copied()
        .filter(|i| i.is_some_and(|i| !had_bye.contains(&i)))
        .collect();
    let no_bye = [None];

    for (allow_repeats, lookahead, second_byes) in modes {
        if lookahead == Lookahead::Schedule && pairer.schedule.is_none() {
            continue;
        }
        let bye_candidates = if n % 2 == 0 {
            &no_bye[..]
        } else if second_byes || fresh.is_empty() {
            &everyone[..]
        } else {
            &fresh[..]
        };

        for &bye in bye_candidates {
            let pool: Vec<usize> = ranked.iter().copied().filter(|&i| Some(i) != bye).collect();
            pairer.budget = SEARCH_BUDGET;
            let Some(pairs) = pairer.solve(&pool, bye, allow_repeats, lookahead) else {
                continue;
            };

            let mut warnings = Vec::new();
            for &(a, b) in &pairs {
                if pairer.played.contains(&edge(a, b)) {
                    let warning = format!(
                        "Round {round}: {} and {} meet again; no repeat-free pairing exists",
                        participants[a], participants[b]
                    );
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
            }
            if let Some(b) = bye
                && had_bye.contains(&b)
            {
                let warning = format!("Round {round}: {} receives a second bye", participants[b]);
                log::warn!("{warning}");
                warnings.push(warning);
            }

            return Ok(Bracket {
                matches: build_round(&pairer, ctx, participants, pairs, bye, round),
                heats: Vec::new(),
                total_rounds: stage.rounds,
                warnings,
            });
        }
        log::debug!(
            "Swiss round {round}: no pairing with repeats={allow_repeats} lookahead={lookahead:?}"
        );
    }

    // Unreachable in practice: with repeats allowed any even pool pairs up.
    Ok(Bracket {
        matches: Vec::new(),
        heats: Vec::new(),
        total_rounds: stage.rounds,
        warnings: vec![format!("Round {round}: no pairing found")],
    })
}

fn build_round(
    pairer: &Pairer,
    ctx: StageContext,
    participants: &[String],
    mut pairs: Vec<(usize, usize)>,
    bye: Option<usize>,
    round: u32,
) -> Vec<Match> {
    for pair in &mut pairs {
        if pairer.rank[pair.1] < pairer.rank[pair.0] {
            *pair = (pair.1, pair.0);
        }
    }
    pairs.sort_by_key(|&(a, _)| pairer.rank[a]);

    let mut matches: Vec<Match> = pairs
        .into_iter()
        .enumerate()
        .map(|(i, (a, b))| {
            let position = i as u32 + 1;
            Match::new(
                match_id(round, position),
                ctx.tournament_id,
                ctx.stage,
                BracketKind::Swiss,
                round,
                position,
            )
            .with_teams(&participants[a], &participants[b])
        })
        .collect();

    if let Some(b) = bye {
        let position = matches.len() as u32 + 1;
        matches.push(Match::bye(
            match_id(round, position),
            ctx.tournament_id,
            ctx.stage,
            BracketKind::Swiss,
            round,
            position,
            &participants[b],
        ));
    }
    matches
}

fn edge(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// How a candidate round is checked against the rounds after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookahead {
    /// Search the unplayed graph for the remaining rounds
    Exact,
    /// Keep enough untouched rounds of the circle schedule open
    Schedule,
    Off,
}

/// A circle-method round robin over the padded field whose first round is
/// the opening pairing. Tracks which of its rounds are still fully unplayed.
struct Schedule {
    size: usize,
    /// Schedule round of each edge, indexed `a * size + b` with `a < b`
    round_of: Vec<usize>,
    damaged: Vec<bool>,
    pending: Vec<usize>,
    open: usize,
}

impl Schedule {
    fn new(opening: &[(usize, usize)], size: usize) -> Option<Self> {
        let half = size / 2;
        if size < 2 || opening.len() != half {
            return None;
        }
        let mut seen = vec![false; size];
        for &(a, b) in opening {
            for v in [a, b] {
                if v >= size || std::mem::replace(&mut seen[v], true) {
                    return None;
                }
            }
        }

        // Slot j faces slot size-1-j in the first circle round
        let mut slot = vec![0; size];
        for (j, &(a, b)) in opening.iter().enumerate() {
            slot[j] = a;
            slot[size - 1 - j] = b;
        }

        let rounds = size - 1;
        let mut round_of = vec![usize::MAX; size * size];
        for (r, pairs) in circle_rounds(size).into_iter().enumerate() {
            for (x, y) in pairs {
                let (a, b) = edge(slot[x], slot[y]);
                round_of[a * size + b] = r;
            }
        }

        Some(Self {
            size,
            round_of,
            damaged: vec![false; rounds],
            pending: vec![0; rounds],
            open: rounds,
        })
    }

    fn round(&self, (a, b): (usize, usize)) -> Option<usize> {
        self.round_of
            .get(a * self.size + b)
            .copied()
            .filter(|&r| r != usize::MAX)
    }

    /// Mark the schedule round containing a played edge as used
    fn damage(&mut self, e: (usize, usize)) {
        if let Some(r) = self.round(e)
            && !self.damaged[r]
        {
            self.damaged[r] = true;
            if self.pending[r] == 0 {
                self.open -= 1;
            }
        }
    }

    fn take(&mut self, e: (usize, usize)) {
        if let Some(r) = self.round(e) {
            if !self.damaged[r] && self.pending[r] == 0 {
                self.open -= 1;
            }
            self.pending[r] += 1;
        }
    }

    fn release(&mut self, e: (usize, usize)) {
        if let Some(r) = self.round(e) {
            self.pending[r] -= 1;
            if !self.damaged[r] && self.pending[r] == 0 {
                self.open += 1;
            }
        }
    }
}

struct Pairer {
    n: usize,
    /// Field size padded to even; index `n` is the phantom when odd
    size: usize,
    rank: Vec<usize>,
    points: Vec<i64>,
    played: HashSet<(usize, usize)>,
    schedule: Option<Schedule>,
    rounds_left: usize,
    budget: usize,
}

impl Pairer {
    fn solve(
        &mut self,
        pool: &[usize],
        bye: Option<usize>,
        allow_repeats: bool,
        lookahead: Lookahead,
    ) -> Option<Vec<(usize, usize)>> {
        let bye_edge = bye.filter(|_| self.size > self.n).map(|b| edge(b, self.n));
        if let Some(e) = bye_edge
            && !self.reserve(e, lookahead)
        {
            return None;
        }

        let mut taken = vec![true; self.n];
        for &i in pool {
            taken[i] = false;
        }
        let mut pairs = Vec::with_capacity(pool.len() / 2);
        let found = self.search(pool, &mut taken, &mut pairs, bye_edge, allow_repeats, lookahead);

        for &(a, b) in &pairs {
            self.unreserve(edge(a, b), lookahead);
        }
        if let Some(e) = bye_edge {
            self.unreserve(e, lookahead);
        }
        found.then_some(pairs)
    }

    fn search(
        &mut self,
        pool: &[usize],
        taken: &mut [bool],
        pairs: &mut Vec<(usize, usize)>,
        bye_edge: Option<(usize, usize)>,
        allow_repeats: bool,
        lookahead: Lookahead,
    ) -> bool {
        if self.budget == 0 {
            return false;
        }
        self.budget -= 1;

        let Some(&top) = pool.iter().find(|&&i| !taken[i]) else {
            return lookahead != Lookahead::Exact || self.continues(pairs, bye_edge);
        };
        taken[top] = true;

        let mut candidates: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|&j| !taken[j] && (allow_repeats || !self.played.contains(&edge(top, j))))
            .collect();
        candidates.sort_by_key(|&j| {
            (
                self.played.contains(&edge(top, j)),
                (self.points[top] - self.points[j]).abs(),
                self.rank[j],
            )
        });

        for j in candidates {
            if !self.reserve(edge(top, j), lookahead) {
                continue;
            }
            taken[j] = true;
            pairs.push((top, j));
            if self.search(pool, taken, pairs, bye_edge, allow_repeats, lookahead) {
                return true;
            }
            pairs.pop();
            taken[j] = false;
            self.unreserve(edge(top, j), lookahead);
        }

        taken[top] = false;
        false
    }

    /// Claim an edge for the round being built. Under the schedule check this
    /// fails when too few schedule rounds would stay open for what follows.
    fn reserve(&mut self, e: (usize, usize), lookahead: Lookahead) -> bool {
        if lookahead != Lookahead::Schedule {
            return true;
        }
        let Some(schedule) = self.schedule.as_mut() else {
            return false;
        };
        schedule.take(e);
        if schedule.open >= self.rounds_left {
            true
        } else {
            schedule.release(e);
            false
        }
    }

    fn unreserve(&mut self, e: (usize, usize), lookahead: Lookahead) {
        if lookahead == Lookahead::Schedule
            && let Some(schedule) = self.schedule.as_mut()
        {
            schedule.release(e);
        }
    }

    /// Whether every remaining round can still be paired without repeats
    /// once `pairs` and the bye are played.
    fn continues(&mut self, pairs: &[(usize, usize)], bye_edge: Option<(usize, usize)>) -> bool {
        let mut blocked: HashSet<(usize, usize)> = pairs
            .iter()
            .map(|&(a, b)| edge(a, b))
            .chain(bye_edge)
            .collect();
        let rounds = self.rounds_left;
        self.decomposes(&mut blocked, rounds)
    }

    fn decomposes(&mut self, blocked: &mut HashSet<(usize, usize)>, rounds: usize) -> bool {
        if rounds == 0 {
            return true;
        }
        let mut used = vec![false; self.size];
        let mut chosen = Vec::with_capacity(self.size / 2);
        self.cover(&mut used, blocked, &mut chosen, rounds)
    }

    fn cover(
        &mut self,
        used: &mut [bool],
        blocked: &mut HashSet<(usize, usize)>,
        chosen: &mut Vec<(usize, usize)>,
        rounds: usize,
    ) -> bool {
        if self.budget == 0 {
            return false;
        }
        self.budget -= 1;

        let Some(i) = used.iter().position(|u| !u) else {
            blocked.extend(chosen.iter().copied());
            let rest = self.decomposes(blocked, rounds - 1);
            for e in chosen.iter() {
                blocked.remove(e);
            }
            return rest;
        };
        used[i] = true;

        for j in i + 1..self.size {
            let e = edge(i, j);
            if used[j] || self.played.contains(&e) || blocked.contains(&e) {
                continue;
            }
            used[j] = true;
            chosen.push(e);
            if self.cover(used, blocked, chosen, rounds) {
                return true;
            }
            chosen.pop();
            used[j] = false;
        }

        used[i] = false;
        false
    }
}

impl FormatEngine for SwissStage {
    fn generate(&self, ctx: StageContext, participants: &[String]) -> GenerationResult<Bracket> {
        let matches = first_round(self, ctx, participants)?;
        log::debug!(
            "Generated Swiss round 1 of {} for {} entrants",
            self.rounds,
            participants.len()
        );
        Ok(Bracket {
            matches,
            heats: Vec::new(),
            total_rounds: self.rounds,
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

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("P{i}")).collect()
    }

    fn stage(rounds: u32, pairing: SwissPairing) -> SwissStage {
        SwissStage {
            rounds,
            pairing,
            tiebreakers: vec![],
        }
    }

    fn ctx() -> StageContext {
        StageContext::new(3, 0)
    }

    /// Lower seed number wins every real match
    fn play_out(matches: &mut [Match]) {
        for m in matches.iter_mut().filter(|m| !m.is_bye()) {
            let seed = |t: &Option<String>| {
                t.as_deref()
                    .and_then(|s| s.trim_start_matches('P').parse::<u32>().ok())
                    .unwrap_or(u32::MAX)
            };
            if seed(&m.team1) < seed(&m.team2) {
                m.record_result(1, 0);
            } else {
                m.record_result(0, 1);
            }
        }
    }

    #[test]
    fn test_first_round_seed_pairing() {
        let matches = first_round(&stage(3, SwissPairing::Seed), ctx(), &names(8)).unwrap();
        let pairs: Vec<(&str, &str)> = matches.iter().filter_map(Match::pairing).collect();
        assert_eq!(pairs, vec![("P1", "P5"), ("P2", "P6"), ("P3", "P7"), ("P4", "P8")]);
    }

    #[test]
    fn test_first_round_adjacent_with_bye() {
        let matches = first_round(&stage(3, SwissPairing::Adjacent), ctx(), &names(5)).unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].pairing(), Some(("P1", "P2")));
        assert_eq!(matches[1].pairing(), Some(("P3", "P4")));
        assert!(matches[2].is_bye());
        assert_eq!(matches[2].winner.as_deref(), Some("P5"));
        assert_eq!(matches[2].id, "S1-3");
    }

    #[test]
    fn test_second_round_pairs_score_groups() {
        let stage = stage(3, SwissPairing::Seed);
        let field = names(8);
        let mut history = first_round(&stage, ctx(), &field).unwrap();
        play_out(&mut history);

        let round = pair_round(&stage, ctx(), &field, &history, 2).unwrap();
        assert!(round.warnings.is_empty());
        assert_eq!(round.matches.len(), 4);
        // Winners meet winners
        let winners = ["P1", "P2", "P3", "P4"];
        for m in &round.matches[..2] {
            let (a, b) = m.pairing().unwrap();
            assert!(winners.contains(&a) && winners.contains(&b));
        }
        assert_eq!(round.matches[0].id, "S2-1");
    }

    #[test]
    fn test_bye_not_repeated() {
        let stage = stage(4, SwissPairing::Seed);
        let field = names(5);
        let mut history = first_round(&stage, ctx(), &field).unwrap();
        play_out(&mut history);

        let mut byes = vec!["P5".to_string()];
        for round in 2..=4 {
            let mut next = pair_round(&stage, ctx(), &field, &history, round).unwrap();
            play_out(&mut next.matches);
            let bye = next.matches.iter().find(|m| m.is_bye()).unwrap();
            let name = bye.team1.clone().unwrap();
            assert!(!byes.contains(&name), "second bye for {name}");
            byes.push(name);
            history.extend(next.matches);
        }
    }

    #[test]
    fn test_repeats_reported_when_unavoidable() {
        let stage = stage(3, SwissPairing::Seed);
        let field = names(2);
        let mut history = first_round(&stage, ctx(), &field).unwrap();
        play_out(&mut history);

        let round = pair_round(&stage, ctx(), &field, &history, 2).unwrap();
        assert_eq!(round.matches.len(), 1);
        assert_eq!(round.warnings.len(), 1);
        assert!(round.warnings[0].contains("meet again"));
    }

    #[test]
    fn test_rounds_up_to_field_size_never_repeat() {
        for (n, rounds) in [(7, 6), (8, 7), (9, 8), (12, 11)] {
            let stage = stage(rounds, SwissPairing::Seed);
            let field = names(n);
            let mut history = first_round(&stage, ctx(), &field).unwrap();
            play_out(&mut history);

            for round in 2..=rounds {
                let mut next = pair_round(&stage, ctx(), &field, &history, round).unwrap();
                assert!(next.warnings.is_empty(), "n={n} round {round}: {:?}", next.warnings);
                play_out(&mut next.matches);
                history.extend(next.matches);
            }

            let mut pairs = HashSet::new();
            let mut byes = HashSet::new();
            for m in &history {
                match m.pairing() {
                    Some((a, b)) => assert!(pairs.insert(edge_names(a, b)), "n={n}: {a} v {b}"),
                    None => assert!(byes.insert(m.team1.clone()), "n={n}: second bye"),
                }
            }
            assert_eq!(pairs.len(), rounds as usize * (n / 2));
        }
    }

    fn edge_names<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
        if a < b { (a, b) } else { (b, a) }
    }

    #[test]
    fn test_schedule_is_a_round_robin_from_the_opening() {
        let opening = [(0, 4), (1, 5), (2, 6), (3, 7)];
        let schedule = Schedule::new(&opening, 8).unwrap();
        assert_eq!(schedule.open, 7);

        let mut per_round = vec![Vec::new(); 7];
        for a in 0..8 {
            for b in a + 1..8 {
                let round = schedule.round((a, b)).expect("every pair is scheduled");
                per_round[round].push((a, b));
            }
        }
        assert_eq!(per_round[0], opening);
        for edges in &per_round {
            let mut seen: Vec<usize> = edges.iter().flat_map(|&(a, b)| [a, b]).collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..8).collect::<Vec<_>>());
        }

        assert!(Schedule::new(&[(0, 1), (1, 2)], 4).is_none());
        assert!(Schedule::new(&[(0, 1)], 4).is_none());
    }

    #[test]
    fn test_second_bye_preferred_over_repeat() {
        let field = names(5);
        let game = |round: u32, position: u32, a: &str, b: &str| {
            let mut m =
                Match::new("", 3, 0, BracketKind::Swiss, round, position).with_teams(a, b);
            m.record_result(1, 0);
            m
        };
        let bye =
            |round: u32, name: &str| Match::bye("", 3, 0, BracketKind::Swiss, round, 3, name);
        // P1 and P5 have no bye yet, but P1 has met P2, P3 and P4 and the
        // rest of the field cannot pair up without a rematch either
        let history = vec![
            game(1, 1, "P1", "P3"),
            game(1, 2, "P4", "P5"),
            bye(1, "P2"),
            game(2, 1, "P1", "P4"),
            game(2, 2, "P2", "P5"),
            bye(2, "P3"),
            game(3, 1, "P1", "P2"),
            game(3, 2, "P3", "P5"),
            bye(3, "P4"),
        ];

        let round = pair_round(&stage(4, SwissPairing::Seed), ctx(), &field, &history, 4).unwrap();
        assert_eq!(round.warnings.len(), 1, "{:?}", round.warnings);
        assert!(round.warnings[0].contains("second bye"));

        let played: HashSet<_> = history
            .iter()
            .filter_map(Match::pairing)
            .map(|(a, b)| edge_names(a, b))
            .collect();
        for (a, b) in round.matches.iter().filter_map(Match::pairing) {
            assert!(!played.contains(&edge_names(a, b)), "{a} and {b} met again");
        }
    }
}
