//! Single and double elimination brackets.
//!
//! The bracket is laid out on the next power of two above the entry count.
//! Missing entrants are byes, placed against the top seeds by the standard
//! seed-position expansion, so two byes never meet. A bye never becomes a
//! match: its opponent is written straight into the next round.

use super::{
    Bracket, BracketKind, Feed, FormatEngine, GenerationError, GenerationResult, Match,
    StageContext, require_participants,
};
use crate::config::{DoubleStage, Finals, SingleStage};

/// Bracket order of seeds for a power-of-two bracket: 1 v N, then each half
/// expanded the same way so seeds 1 and 2 can only meet in the final.
pub fn seed_positions(bracket_size: usize) -> Vec<usize> {
    let mut positions = vec![1];
    while positions.len() < bracket_size {
        let mirror = positions.len() * 2 + 1;
        positions = positions.iter().flat_map(|&s| [s, mirror - s]).collect();
    }
    positions
}

/// Occupant of a bracket slot while the layout is built
#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Team(String),
    Pending(Feed),
    Empty,
}

impl Entry {
    fn is_empty(&self) -> bool {
        matches!(self, Entry::Empty)
    }

    fn fill(self, team: &mut Option<String>, from: &mut Option<Feed>) {
        match self {
            Entry::Team(name) => *team = Some(name),
            Entry::Pending(feed) => *from = Some(feed),
            Entry::Empty => {}
        }
    }
}

struct Layout {
    ctx: StageContext,
    matches: Vec<Match>,
}

impl Layout {
    fn new(ctx: StageContext) -> Self {
        Self {
            ctx,
            matches: Vec::new(),
        }
    }

    /// Meet two slots. Returns the (winner, loser) entries; a slot facing a
    /// bye advances without a match.
    fn play(
        &mut self,
        bracket: BracketKind,
        label: &str,
        round: u32,
        position: u32,
        a: Entry,
        b: Entry,
    ) -> (Entry, Entry) {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => (Entry::Empty, Entry::Empty),
            (false, true) => (a, Entry::Empty),
            (true, false) => (b, Entry::Empty),
            (false, false) => {
                let id = format!("{label}{round}-{position}");
                self.open(id.clone(), bracket, round, position, a, b);
                (
                    Entry::Pending(Feed::Winner(id.clone())),
                    Entry::Pending(Feed::Loser(id)),
                )
            }
        }
    }

    /// Append a match between two occupied slots
    fn open(
        &mut self,
        id: String,
        bracket: BracketKind,
        round: u32,
        position: u32,
        a: Entry,
        b: Entry,
    ) -> &mut Match {
        let mut m = Match::new(
            id,
            self.ctx.tournament_id,
            self.ctx.stage,
            bracket,
            round,
            position,
        );
        a.fill(&mut m.team1, &mut m.team1_from);
        b.fill(&mut m.team2, &mut m.team2_from);
        self.matches.push(m);
        let last = self.matches.len() - 1;
        &mut self.matches[last]
    }

    /// Play a full round of adjacent pairs
    fn round(
        &mut self,
        bracket: BracketKind,
        label: &str,
        round: u32,
        entries: Vec<Entry>,
    ) -> (Vec<Entry>, Vec<Entry>) {
        let mut winners = Vec::with_capacity(entries.len() / 2);
        let mut losers = Vec::with_capacity(entries.len() / 2);
        let mut iter = entries.into_iter();
        let mut position = 1;
        while let (Some(a), Some(b)) = (iter.next(), iter.next()) {
            let (w, l) = self.play(bracket, label, round, position, a, b);
            winners.push(w);
            losers.push(l);
            position += 1;
        }
        (winners, losers)
    }

    /// Play the next losers round. Rounds made up only of byes create no
    /// matches and do not take a round number.
    fn losers_round(&mut self, numbered: &mut u32, entries: Vec<Entry>) -> Vec<Entry> {
        let before = self.matches.len();
        let (winners, _) = self.round(BracketKind::Losers, "L", *numbered + 1, entries);
        if self.matches.len() > before {
            *numbered += 1;
        }
        winners
    }
}

/// Check the entry count and lay out round-one slots
fn opening_entries(participants: &[String], size: u32) -> GenerationResult<(Vec<Entry>, u32)> {
    require_participants(participants)?;
    let capacity = size as usize;
    if participants.len() > capacity {
        return Err(GenerationError::OverCapacity {
            capacity,
            actual: participants.len(),
        });
    }

    let bracket_size = participants.len().next_power_of_two();
    let rounds = bracket_size.trailing_zeros();
    let entries = seed_positions(bracket_size)
        .into_iter()
        .map(|seed| match participants.get(seed - 1) {
            Some(name) => Entry::Team(name.clone()),
            None => Entry::Empty,
        })
        .collect();
    Ok((entries, rounds))
}

impl FormatEngine for SingleStage {
    fn generate(&self, ctx: StageContext, participants: &[String]) -> GenerationResult<Bracket> {
        let (mut entries, rounds) = opening_entries(participants, self.size)?;
        let mut layout = Layout::new(ctx);
        let mut semifinal_losers = Vec::new();

        for round in 1..=rounds {
            let (winners, losers) = layout.round(BracketKind::Winners, "W", round, entries);
            if round + 1 == rounds {
                semifinal_losers = losers;
            }
            entries = winners;
        }

        if self.third_place && rounds >= 2 {
            let mut losers = semifinal_losers.into_iter();
            let a = losers.next().unwrap_or(Entry::Empty);
            let b = losers.next().unwrap_or(Entry::Empty);
            if !a.is_empty() && !b.is_empty() {
                layout.open("3P-1".to_string(), BracketKind::ThirdPlace, rounds, 1, a, b);
            }
        }

        log::debug!(
            "Generated single elimination for {} entrants: {} matches over {} rounds",
            participants.len(),
            layout.matches.len(),
            rounds
        );

        Ok(Bracket {
            matches: layout.matches,
            heats: Vec::new(),
            total_rounds: rounds,
            warnings: Vec::new(),
        })
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.size as usize)
    }
}

impl FormatEngine for DoubleStage {
    fn generate(&self, ctx: StageContext, participants: &[String]) -> GenerationResult<Bracket> {
        let (mut entries, rounds) = opening_entries(participants, self.size)?;
        let mut layout = Layout::new(ctx);

        // Winners bracket, keeping each round's losers for the drop-down
        let mut dropped: Vec<Vec<Entry>> = Vec::with_capacity(rounds as usize);
        for round in 1..=rounds {
            let (winners, losers) = layout.round(BracketKind::Winners, "W", round, entries);
            dropped.push(losers);
            entries = winners;
        }
        let winners_champion = entries.pop().unwrap_or(Entry::Empty);

        // Losers bracket: round 1 pairs the first-round losers, then every
        // even round takes the next winners-bracket drop-down and every odd
        // round halves the survivors.
        let mut drops = dropped.into_iter();
        let mut losers_round = 0;
        let mut survivors = Vec::new();
        let mut losers_champion = Entry::Empty;

        if let Some(first) = drops.next() {
            if rounds == 1 {
                losers_champion = first.into_iter().next().unwrap_or(Entry::Empty);
            } else {
                survivors = layout.losers_round(&mut losers_round, first);
            }
        }

        for drop in drops {
            // Reversed so a dropped player does not meet the opponent they
            // just came through.
            let paired: Vec<Entry> = survivors
                .into_iter()
                .zip(drop.into_iter().rev())
                .flat_map(|(s, d)| [s, d])
                .collect();
            survivors = layout.losers_round(&mut losers_round, paired);

            if survivors.len() > 1 {
                survivors = layout.losers_round(&mut losers_round, survivors);
            }
        }
        if rounds > 1 {
            losers_champion = survivors.pop().unwrap_or(Entry::Empty);
        }

        // Championship
        layout.open(
            "GF-1".to_string(),
            BracketKind::Championship,
            1,
            1,
            winners_champion,
            losers_champion,
        );

        let mut championship_rounds = 1;
        if self.finals == Finals::IfNecessary {
            let reset = layout.open(
                "GF-2".to_string(),
                BracketKind::Championship,
                2,
                1,
                Entry::Pending(Feed::Winner("GF-1".to_string())),
                Entry::Pending(Feed::Loser("GF-1".to_string())),
            );
            reset.if_necessary = true;
            championship_rounds = 2;
        }

        let total_rounds = rounds + losers_round + championship_rounds;
        log::debug!(
            "Generated double elimination for {} entrants: {} matches, {} losers rounds",
            participants.len(),
            layout.matches.len(),
            losers_round
        );

        Ok(Bracket {
            matches: layout.matches,
            heats: Vec::new(),
            total_rounds,
            warnings: Vec::new(),
        })
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.size as usize)
    }
}
