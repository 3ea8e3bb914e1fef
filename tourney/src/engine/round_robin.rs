//! Pool play: balanced groups and circle-method schedules.

use super::{
    Bracket, BracketKind, FormatEngine, GenerationError, GenerationResult, Match, StageContext,
    balanced_sizes, require_participants, serpentine,
};
use crate::config::RoundRobinStage;

/// Split seeded participants into `groups` pools of near-equal size, dealing
/// seeds snake-wise so the top seeds land in different pools.
pub fn partition_groups(
    stage: &RoundRobinStage,
    participants: &[String],
) -> GenerationResult<Vec<Vec<String>>> {
    require_participants(participants)?;
    let groups = stage.groups.max(1) as usize;
    let capacity = groups * stage.group_size as usize;
    if participants.len() > capacity {
        return Err(GenerationError::OverCapacity {
            capacity,
            actual: participants.len(),
        });
    }

    let pools = serpentine(participants, &balanced_sizes(participants.len(), groups));
    if let Some((i, pool)) = pools.iter().enumerate().find(|(_, p)| p.len() < 2) {
        return Err(GenerationError::GroupTooSmall {
            group: i + 1,
            size: pool.len(),
        });
    }
    Ok(pools)
}

/// Rounds of the circle method for `members`; each round lists index pairs.
///
/// The first member stays fixed while the rest rotate. Odd groups get a
/// phantom slot, and whoever meets it sits the round out.
pub fn circle_rounds(members: usize) -> Vec<Vec<(usize, usize)>> {
    if members < 2 {
        return Vec::new();
    }
    let slots = members + members % 2;
    let mut ring: Vec<usize> = (0..slots).collect();
    let mut rounds = Vec::with_capacity(slots - 1);

    for round in 0..slots - 1 {
        let mut pairs = Vec::with_capacity(slots / 2);
        for i in 0..slots / 2 {
            let (a, b) = (ring[i], ring[slots - 1 - i]);
            if a >= members || b >= members {
                continue;
            }
            // Alternate the fixed member's side so it is not always team one
            if i == 0 && round % 2 == 1 {
                pairs.push((b, a));
            } else {
                pairs.push((a, b));
            }
        }
        rounds.push(pairs);
        ring[1..].rotate_right(1);
    }
    rounds
}

impl FormatEngine for RoundRobinStage {
    fn generate(&self, ctx: StageContext, participants: &[String]) -> GenerationResult<Bracket> {
        let pools = partition_groups(self, participants)?;
        let mut matches = Vec::new();
        let mut total_rounds = 0;

        for (g, pool) in pools.iter().enumerate() {
            let group = g + 1;
            let rounds = circle_rounds(pool.len());
            total_rounds = total_rounds.max(rounds.len() as u32);

            for (r, pairs) in rounds.iter().enumerate() {
                let round = r as u32 + 1;
                for (p, &(a, b)) in pairs.iter().enumerate() {
                    let position = p as u32 + 1;
                    let mut m = Match::new(
                        format!("G{group}-R{round}-{position}"),
                        ctx.tournament_id,
                        ctx.stage,
                        BracketKind::Group,
                        round,
                        position,
                    )
                    .with_teams(&pool[a], &pool[b]);
                    m.group = Some(group);
                    matches.push(m);
                }
            }
        }

        log::debug!(
            "Generated round robin for {} entrants in {} groups: {} matches",
            participants.len(),
            pools.len(),
            matches.len()
        );

        Ok(Bracket {
            matches,
            heats: Vec::new(),
            total_rounds,
            warnings: Vec::new(),
        })
    }

    fn capacity(&self) -> Option<usize> {
        Some((self.groups * self.group_size) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Points, Tiebreaker};
    use std::collections::HashSet;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("P{i}")).collect()
    }

    fn stage(groups: u32, group_size: u32) -> RoundRobinStage {
        RoundRobinStage {
            groups,
            group_size,
            points: Points::league(),
            tiebreakers: vec![Tiebreaker::HeadToHead],
        }
    }

    #[test]
    fn test_four_groups_of_five() {
        let bracket = stage(4, 5)
            .generate(StageContext::new(1, 0), &names(20))
            .unwrap();
        assert_eq!(bracket.matches.len(), 40);
        assert_eq!(bracket.total_rounds, 5);
        for g in 1..=4 {
            let count = bracket.matches.iter().filter(|m| m.group == Some(g)).count();
            assert_eq!(count, 10);
        }
    }

    #[test]
    fn test_every_pair_meets_once() {
        for size in 2..=9 {
            let rounds = circle_rounds(size);
            let mut seen = HashSet::new();
            for pairs in &rounds {
                let mut busy = HashSet::new();
                for &(a, b) in pairs {
                    assert!(busy.insert(a) && busy.insert(b), "double-booked in size {size}");
                    assert!(seen.insert((a.min(b), a.max(b))), "repeat in size {size}");
                }
            }
            assert_eq!(seen.len(), size * (size - 1) / 2);
        }
    }

    #[test]
    fn test_partition_spreads_seeds() {
        let pools = partition_groups(&stage(3, 4), &names(10)).unwrap();
        let sizes: Vec<usize> = pools.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(pools[0][0], "P1");
        assert_eq!(pools[1][0], "P2");
        assert_eq!(pools[2][0], "P3");
    }

    #[test]
    fn test_group_too_small() {
        assert_eq!(
            partition_groups(&stage(4, 5), &names(7)),
            Err(GenerationError::GroupTooSmall { group: 4, size: 1 })
        );
    }

    #[test]
    fn test_over_capacity() {
        assert_eq!(
            partition_groups(&stage(2, 3), &names(7)),
            Err(GenerationError::OverCapacity {
                capacity: 6,
                actual: 7
            })
        );
    }
}
