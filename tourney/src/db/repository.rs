//! Storage port for tournament records and generated matches.
//!
//! The migration pipeline only talks to [`TournamentRepository`], so it can
//! run against PostgreSQL in production and the in-memory store in tests.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::{TournamentConfig, TournamentId};
use crate::engine::Match;
use crate::migration::legacy::{LegacyTeam, LegacyTournament, TournamentRecord};

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Tournament storage operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Fetch one tournament
    async fn get_tournament(&self, id: TournamentId) -> RepositoryResult<Option<TournamentRecord>>;

    /// Fetch every tournament, ordered by id
    async fn get_tournaments(&self) -> RepositoryResult<Vec<TournamentRecord>>;

    /// Overwrite the config (`None` restores legacy behaviour). Returns the
    /// updated record, or `None` if the tournament does not exist.
    async fn update_config(
        &self,
        id: TournamentId,
        config: Option<&TournamentConfig>,
    ) -> RepositoryResult<Option<TournamentRecord>>;

    /// Write `config` only if the tournament has none. Returns whether it was written.
    async fn set_config_if_absent(
        &self,
        id: TournamentId,
        config: &TournamentConfig,
    ) -> RepositoryResult<bool>;

    /// Generated matches for a tournament, in generation order
    async fn get_matches(&self, id: TournamentId) -> RepositoryResult<Vec<Match>>;

    /// Atomically replace all generated matches (an empty slice clears them)
    async fn replace_matches(&self, id: TournamentId, matches: &[Match]) -> RepositoryResult<()>;
}

/// In-process store; counts every successful write
#[derive(Debug, Default)]
pub struct InMemoryTournamentRepository {
    tournaments: RwLock<BTreeMap<TournamentId, TournamentRecord>>,
    matches: RwLock<HashMap<TournamentId, Vec<Match>>>,
    writes: AtomicUsize,
}

impl InMemoryTournamentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store; seeding does not count as a write
    pub fn with_tournaments(records: impl IntoIterator<Item = TournamentRecord>) -> Self {
        let tournaments = records.into_iter().map(|r| (r.id(), r)).collect();
        Self {
            tournaments: RwLock::new(tournaments),
            ..Self::default()
        }
    }

    pub async fn insert(&self, record: TournamentRecord) {
        self.tournaments.write().await.insert(record.id(), record);
    }

    /// Number of writes performed through the repository interface
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TournamentRepository for InMemoryTournamentRepository {
    async fn get_tournament(&self, id: TournamentId) -> RepositoryResult<Option<TournamentRecord>> {
        Ok(self.tournaments.read().await.get(&id).cloned())
    }

    async fn get_tournaments(&self) -> RepositoryResult<Vec<TournamentRecord>> {
        Ok(self.tournaments.read().await.values().cloned().collect())
    }

    async fn update_config(
        &self,
        id: TournamentId,
        config: Option<&TournamentConfig>,
    ) -> RepositoryResult<Option<TournamentRecord>> {
        let mut tournaments = self.tournaments.write().await;
        let Some(record) = tournaments.get_mut(&id) else {
            return Ok(None);
        };
        record.config = config.cloned();
        self.record_write();
        Ok(Some(record.clone()))
    }

    async fn set_config_if_absent(
        &self,
        id: TournamentId,
        config: &TournamentConfig,
    ) -> RepositoryResult<bool> {
        let mut tournaments = self.tournaments.write().await;
        let record = tournaments
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        if record.config.is_some() {
            return Ok(false);
        }
        record.config = Some(config.clone());
        self.record_write();
        Ok(true)
    }

    async fn get_matches(&self, id: TournamentId) -> RepositoryResult<Vec<Match>> {
        Ok(self
            .matches
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_matches(&self, id: TournamentId, matches: &[Match]) -> RepositoryResult<()> {
        if !self.tournaments.read().await.contains_key(&id) {
            return Err(RepositoryError::NotFound(id));
        }
        let mut all = self.matches.write().await;
        if matches.is_empty() {
            all.remove(&id);
        } else {
            all.insert(id, matches.to_vec());
        }
        self.record_write();
        Ok(())
    }
}

const TOURNAMENT_COLUMNS: &str = "id, name, sport, team_size, tournament_type, age_group, \
     gender_division, divisions, max_participants, teams_count, teams, user_id, status, config";

/// PostgreSQL implementation of `TournamentRepository`.
///
/// Configs live in the JSONB `tournaments.config` column; matches are rows of
/// `tournament_matches` holding the serialized match.
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &PgRow) -> RepositoryResult<TournamentRecord> {
        let count = |column: &str| -> Result<Option<u32>, sqlx::Error> {
            Ok(row
                .try_get::<Option<i32>, _>(column)?
                .and_then(|n| u32::try_from(n).ok()))
        };

        let divisions: Option<serde_json::Value> = row.try_get("divisions")?;
        let divisions = match divisions {
            Some(serde_json::Value::Array(items)) => Some(items),
            _ => None,
        };
        let teams: Option<serde_json::Value> = row.try_get("teams")?;
        let teams = teams
            .filter(|v| !v.is_null())
            .map(serde_json::from_value::<Vec<LegacyTeam>>)
            .transpose()?;
        let config: Option<serde_json::Value> = row.try_get("config")?;
        let config = config
            .filter(|v| !v.is_null())
            .map(serde_json::from_value::<TournamentConfig>)
            .transpose()?;

        Ok(TournamentRecord {
            legacy: LegacyTournament {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                sport: row.try_get("sport")?,
                team_size: count("team_size")?,
                tournament_type: row.try_get("tournament_type")?,
                age_group: row.try_get("age_group")?,
                gender_division: row.try_get("gender_division")?,
                divisions,
                max_participants: count("max_participants")?,
                teams_count: count("teams_count")?,
                teams,
                user_id: row.try_get("user_id")?,
                status: row.try_get("status")?,
            },
            config,
        })
    }
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn get_tournament(&self, id: TournamentId) -> RepositoryResult<Option<TournamentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn get_tournaments(&self) -> RepositoryResult<Vec<TournamentRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn update_config(
        &self,
        id: TournamentId,
        config: Option<&TournamentConfig>,
    ) -> RepositoryResult<Option<TournamentRecord>> {
        let value = config.map(serde_json::to_value).transpose()?;
        let row = sqlx::query(&format!(
            "UPDATE tournaments SET config = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {TOURNAMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn set_config_if_absent(
        &self,
        id: TournamentId,
        config: &TournamentConfig,
    ) -> RepositoryResult<bool> {
        let value = serde_json::to_value(config)?;
        let result = sqlx::query(
            "UPDATE tournaments SET config = $2, updated_at = NOW() \
             WHERE id = $1 AND config IS NULL",
        )
        .bind(id)
        .bind(value)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists = sqlx::query("SELECT 1 FROM tournaments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match exists {
            Some(_) => Ok(false),
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    async fn get_matches(&self, id: TournamentId) -> RepositoryResult<Vec<Match>> {
        let rows = sqlx::query(
            "SELECT data FROM tournament_matches WHERE tournament_id = $1 ORDER BY seq",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> RepositoryResult<Match> {
                let data: serde_json::Value = row.try_get("data")?;
                Ok(serde_json::from_value(data)?)
            })
            .collect()
    }

    async fn replace_matches(&self, id: TournamentId, matches: &[Match]) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM tournaments WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound(id));
        }

        sqlx::query("DELETE FROM tournament_matches WHERE tournament_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (seq, m) in matches.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tournament_matches (tournament_id, seq, match_id, stage, data) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id)
            .bind(seq as i32)
            .bind(&m.id)
            .bind(m.stage as i32)
            .bind(serde_json::to_value(m)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        log::debug!("Stored {} matches for tournament {}", matches.len(), id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SingleStage, Stage};

    fn config() -> TournamentConfig {
        TournamentConfig::simple(
            "Cup",
            4,
            Stage::Single(SingleStage {
                size: 4,
                third_place: false,
            }),
        )
    }

    fn store() -> InMemoryTournamentRepository {
        InMemoryTournamentRepository::with_tournaments([
            TournamentRecord::legacy(LegacyTournament::new(1, "One")),
            TournamentRecord::legacy(LegacyTournament::new(2, "Two")),
        ])
    }

    #[tokio::test]
    async fn test_compare_and_set_config() {
        let repo = store();
        assert!(repo.set_config_if_absent(1, &config()).await.unwrap());
        assert!(!repo.set_config_if_absent(1, &config()).await.unwrap());
        assert_eq!(repo.write_count(), 1);
        assert!(matches!(
            repo.set_config_if_absent(9, &config()).await,
            Err(RepositoryError::NotFound(9))
        ));
    }

    #[tokio::test]
    async fn test_update_config_to_null() {
        let repo = store();
        repo.update_config(2, Some(&config())).await.unwrap();
        let record = repo.update_config(2, None).await.unwrap().unwrap();
        assert!(!record.is_migrated());
        assert!(repo.update_config(9, None).await.unwrap().is_none());
        assert_eq!(repo.write_count(), 2);
    }

    #[tokio::test]
    async fn test_replace_and_clear_matches() {
        let repo = store();
        let m = Match::new("W1-1", 1, 0, crate::engine::BracketKind::Winners, 1, 1)
            .with_teams("A", "B");
        repo.replace_matches(1, &[m.clone()]).await.unwrap();
        assert_eq!(repo.get_matches(1).await.unwrap(), vec![m]);

        repo.replace_matches(1, &[]).await.unwrap();
        assert!(repo.get_matches(1).await.unwrap().is_empty());
        assert!(repo.replace_matches(5, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_reads_do_not_count_as_writes() {
        let repo = store();
        repo.get_tournaments().await.unwrap();
        repo.get_tournament(1).await.unwrap();
        repo.get_matches(1).await.unwrap();
        assert_eq!(repo.write_count(), 0);
    }
}
