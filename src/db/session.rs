use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite, Transaction,
};
use tracing::{info, warn};

use crate::analysis::LearningModel;
use crate::models::{ArchiveEntry, Match, Prediction, ProcessedFile};
use crate::service::AnalyzerService;

/// SQLite store holding one analyzer session between runs
pub struct SessionStore {
    pool: Pool<Sqlite>,
}

impl SessionStore {
    /// Open the store and initialize the schema
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if !path.starts_with(":memory:") {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .context("Failed to create database directory")?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);

        // Every connection to an in-memory URL is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("Session store initialized");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL,
                match_date TEXT,
                home TEXT NOT NULL,
                away TEXT NOT NULL,
                league TEXT NOT NULL,
                odds1 REAL,
                odds_x REAL,
                odds2 REAL,
                file_name TEXT NOT NULL,
                row_index INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create matches table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS processed_files (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                size INTEGER NOT NULL,
                total_matches INTEGER NOT NULL,
                new_matches INTEGER NOT NULL,
                duplicates INTEGER NOT NULL,
                processed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create processed_files table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS archive (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL,
                added_at TEXT NOT NULL,
                payload TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create archive table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_archive_status
            ON archive (status)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                position INTEGER PRIMARY KEY,
                payload TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create predictions table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS learning_model (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create learning_model table")?;

        Ok(())
    }

    /// Replace the stored session with `service`
    pub async fn save(&self, service: &AnalyzerService) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        clear_tables(&mut tx).await?;

        for (position, m) in service.repository().all().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO matches (
                    position, id, match_date, home, away, league,
                    odds1, odds_x, odds2, file_name, row_index
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(position as i64)
            .bind(&m.id)
            .bind(m.date.map(|d| d.to_string()))
            .bind(&m.home)
            .bind(&m.away)
            .bind(&m.league)
            .bind(m.odds1)
            .bind(m.odds_x)
            .bind(m.odds2)
            .bind(&m.file_name)
            .bind(m.row_index as i64)
            .execute(&mut *tx)
            .await
            .context("Failed to insert match")?;
        }

        for (position, file) in service.processed_files().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO processed_files (
                    position, name, size, total_matches, new_matches, duplicates, processed_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(position as i64)
            .bind(&file.name)
            .bind(file.size as i64)
            .bind(file.total_matches as i64)
            .bind(file.new_matches as i64)
            .bind(file.duplicates as i64)
            .bind(file.processed_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .context("Failed to insert processed file")?;
        }

        for (position, entry) in service.archive().entries().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO archive (position, id, status, added_at, payload)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(position as i64)
            .bind(&entry.id)
            .bind(entry.status.as_str())
            .bind(entry.added_at.to_rfc3339())
            .bind(serde_json::to_string(entry).context("Failed to encode archive entry")?)
            .execute(&mut *tx)
            .await
            .context("Failed to insert archive entry")?;
        }

        for (position, prediction) in service.predictions().iter().enumerate() {
            sqlx::query("INSERT INTO predictions (position, payload) VALUES (?, ?)")
                .bind(position as i64)
                .bind(serde_json::to_string(prediction).context("Failed to encode prediction")?)
                .execute(&mut *tx)
                .await
                .context("Failed to insert prediction")?;
        }

        sqlx::query("INSERT INTO learning_model (id, payload, updated_at) VALUES (1, ?, ?)")
            .bind(
                serde_json::to_string(service.learning())
                    .context("Failed to encode learning model")?,
            )
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .context("Failed to store learning model")?;

        tx.commit().await.context("Failed to commit session")?;

        info!(
            "Saved session: {} matches, {} archived predictions",
            service.repository().len(),
            service.archive().len()
        );
        Ok(())
    }

    /// Rebuild the stored session; an empty store yields a fresh one
    pub async fn load(&self) -> Result<AnalyzerService> {
        let matches: Vec<Match> = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, match_date, home, away, league, odds1, odds_x, odds2, file_name, row_index
            FROM matches
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch matches")?
        .into_iter()
        .map(Match::from)
        .collect();

        let processed_files: Vec<ProcessedFile> = sqlx::query_as::<_, ProcessedFileRow>(
            r#"
            SELECT name, size, total_matches, new_matches, duplicates, processed_at
            FROM processed_files
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch processed files")?
        .into_iter()
        .map(ProcessedFile::from)
        .collect();

        let archive_payloads: Vec<(String,)> =
            sqlx::query_as("SELECT payload FROM archive ORDER BY position")
                .fetch_all(&self.pool)
                .await
                .context("Failed to fetch archive")?;
        let archive = archive_payloads
            .into_iter()
            .map(|(payload,)| serde_json::from_str::<ArchiveEntry>(&payload))
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to decode archive entry")?;

        let prediction_payloads: Vec<(String,)> =
            sqlx::query_as("SELECT payload FROM predictions ORDER BY position")
                .fetch_all(&self.pool)
                .await
                .context("Failed to fetch predictions")?;
        let predictions = prediction_payloads
            .into_iter()
            .map(|(payload,)| serde_json::from_str::<Prediction>(&payload))
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to decode prediction")?;

        let model_payload: Option<(String,)> =
            sqlx::query_as("SELECT payload FROM learning_model WHERE id = 1")
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch learning model")?;
        let learning = match model_payload {
            Some((payload,)) => {
                serde_json::from_str(&payload).context("Failed to decode learning model")?
            }
            None => LearningModel::new(),
        };

        let service =
            AnalyzerService::from_parts(matches, processed_files, predictions, archive, learning)?;

        info!(
            "Loaded session: {} matches, {} archived predictions",
            service.repository().len(),
            service.archive().len()
        );
        Ok(service)
    }

    /// Remove every stored row
    pub async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        clear_tables(&mut tx).await?;
        tx.commit().await.context("Failed to commit clear")?;
        info!("Session store cleared");
        Ok(())
    }
}

async fn clear_tables(tx: &mut Transaction<'_, Sqlite>) -> Result<()> {
    for table in [
        "matches",
        "processed_files",
        "archive",
        "predictions",
        "learning_model",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to clear {}", table))?;
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
struct MatchRow {
    id: String,
    match_date: Option<String>,
    home: String,
    away: String,
    league: String,
    odds1: Option<f64>,
    odds_x: Option<f64>,
    odds2: Option<f64>,
    file_name: String,
    row_index: i64,
}

impl From<MatchRow> for Match {
    fn from(row: MatchRow) -> Self {
        let date = row.match_date.as_deref().and_then(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|_| warn!("Stored match {} has invalid date '{}'", row.id, d))
                .ok()
        });

        Match {
            id: row.id,
            date,
            home: row.home,
            away: row.away,
            league: row.league,
            odds1: row.odds1,
            odds_x: row.odds_x,
            odds2: row.odds2,
            file_name: row.file_name,
            row_index: row.row_index.max(0) as usize,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProcessedFileRow {
    name: String,
    size: i64,
    total_matches: i64,
    new_matches: i64,
    duplicates: i64,
    processed_at: String,
}

impl From<ProcessedFileRow> for ProcessedFile {
    fn from(row: ProcessedFileRow) -> Self {
        ProcessedFile {
            name: row.name,
            size: row.size.max(0) as u64,
            total_matches: row.total_matches.max(0) as usize,
            new_matches: row.new_matches.max(0) as usize,
            duplicates: row.duplicates.max(0) as usize,
            processed_at: DateTime::parse_from_rfc3339(&row.processed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{Cell, Sheet};
    use crate::models::{ArchiveStatus, BetType};

    fn session() -> AnalyzerService {
        let rows = [
            ["Date", "Home", "Away", "League", "1", "X", "2"],
            ["2024-03-10", "Arsenal", "Chelsea", "Premier League", "2.5", "3.8", "4.0"],
            ["2024-03-10", "Ajax", "PSV", "Eredivisie", "2.1", "3.4", "3.3"],
            ["", "Real Madrid", "Barcelona", "", "", "", ""],
        ];
        let sheet = Sheet {
            name: "round.csv".to_string(),
            size: 180,
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| Cell::from(*c)).collect())
                .collect(),
        };

        let mut service = AnalyzerService::new();
        service.ingest_sheet(&sheet).unwrap();
        service
            .start_analysis(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), 60)
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_empty_store_loads_fresh_session() {
        let store = SessionStore::new("sqlite::memory:").await.unwrap();
        let service = store.load().await.unwrap();

        assert!(service.repository().is_empty());
        assert!(service.archive().is_empty());
        assert_eq!(service.learning(), &LearningModel::new());
    }

    #[tokio::test]
    async fn test_save_and_load_session() {
        let store = SessionStore::new("sqlite::memory:").await.unwrap();
        let mut service = session();

        let mut first = true;
        let mut source = |entry: &ArchiveEntry| -> Option<BetType> {
            let settle = first;
            first = false;
            settle.then_some(entry.prediction.bet_type)
        };
        service.verify_pending(&mut source);
        store.save(&service).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.repository().all(), service.repository().all());
        assert_eq!(loaded.repository().all()[2].date, None);
        assert_eq!(loaded.repository().all()[2].league, "Unknown League");
        assert_eq!(loaded.processed_files(), service.processed_files());
        assert_eq!(loaded.archive().entries(), service.archive().entries());
        assert_eq!(loaded.predictions(), service.predictions());
        assert_eq!(loaded.learning(), service.learning());
        assert!(loaded.cache().is_empty());

        let statuses: Vec<ArchiveStatus> =
            loaded.archive().entries().iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![ArchiveStatus::Correct, ArchiveStatus::Pending]);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_session() {
        let store = SessionStore::new("sqlite::memory:").await.unwrap();
        store.save(&session()).await.unwrap();

        let mut smaller = session();
        smaller.clear();
        store.save(&smaller).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert!(loaded.repository().is_empty());
        assert!(loaded.archive().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = SessionStore::new("sqlite::memory:").await.unwrap();
        store.save(&session()).await.unwrap();
        store.clear().await.unwrap();

        let loaded = store.load().await.unwrap();
        assert!(loaded.repository().is_empty());
        assert!(loaded.processed_files().is_empty());
    }
}
