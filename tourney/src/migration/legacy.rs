//! Legacy tournament records as stored before canonical configs existed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{TournamentConfig, TournamentId};

/// A roster entry: either a bare name or an object carrying one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyTeam {
    Name(String),
    Record {
        #[serde(default)]
        name: Option<String>,
    },
}

impl LegacyTeam {
    /// Display name; unnamed records read as "Team"
    pub fn name(&self) -> &str {
        match self {
            LegacyTeam::Name(name) => name,
            LegacyTeam::Record { name } => name.as_deref().unwrap_or("Team"),
        }
    }
}

/// Sport-specific tournament record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTournament {
    pub id: TournamentId,
    pub name: String,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub team_size: Option<u32>,
    #[serde(default)]
    pub tournament_type: Option<String>,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub gender_division: Option<String>,
    #[serde(default)]
    pub divisions: Option<Vec<Value>>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub teams_count: Option<u32>,
    #[serde(default)]
    pub teams: Option<Vec<LegacyTeam>>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl LegacyTournament {
    /// A bare record with only the required fields set
    pub fn new(id: TournamentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sport: None,
            team_size: None,
            tournament_type: None,
            age_group: None,
            gender_division: None,
            divisions: None,
            max_participants: None,
            teams_count: None,
            teams: None,
            user_id: None,
            status: None,
        }
    }

    /// Declared field size: `maxParticipants`, else `teamsCount`; zero counts as unset
    pub fn declared_participants(&self) -> Option<u32> {
        self.max_participants
            .filter(|&n| n > 0)
            .or(self.teams_count.filter(|&n| n > 0))
    }

    /// Roster names in entry order (empty when no roster is recorded)
    pub fn roster(&self) -> Vec<String> {
        self.teams
            .iter()
            .flatten()
            .map(|t| t.name().to_string())
            .collect()
    }

    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }
}

/// A stored tournament: the legacy fields plus the canonical config, if migrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentRecord {
    #[serde(flatten)]
    pub legacy: LegacyTournament,
    #[serde(default)]
    pub config: Option<TournamentConfig>,
}

impl TournamentRecord {
    pub fn legacy(legacy: LegacyTournament) -> Self {
        Self {
            legacy,
            config: None,
        }
    }

    pub fn id(&self) -> TournamentId {
        self.legacy.id
    }

    pub fn is_migrated(&self) -> bool {
        self.config.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_reads_flat_json() {
        let record: TournamentRecord = serde_json::from_value(json!({
            "id": 12,
            "name": "Fall Classic",
            "sport": "Basketball",
            "teamSize": 5,
            "tournamentType": "double-elimination",
            "maxParticipants": 8,
            "teams": ["Hawks", { "name": "Owls" }, {}],
            "userId": "u-1",
            "status": "upcoming",
            "config": null
        }))
        .unwrap();

        assert_eq!(record.id(), 12);
        assert!(!record.is_migrated());
        assert_eq!(record.legacy.roster(), vec!["Hawks", "Owls", "Team"]);
        assert_eq!(record.legacy.declared_participants(), Some(8));
    }

    #[test]
    fn test_declared_participants_skips_zero() {
        let mut legacy = LegacyTournament::new(1, "Zero");
        legacy.max_participants = Some(0);
        legacy.teams_count = Some(12);
        assert_eq!(legacy.declared_participants(), Some(12));

        legacy.teams_count = Some(0);
        assert_eq!(legacy.declared_participants(), None);
    }
}
