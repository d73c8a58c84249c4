use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::TvShelfError;
use crate::models::{RecentShow, SeasonEpisode, Show};

const SCHEMA_V1: &str = include_str!("../../../migrations/001_initial.sql");

const EPISODE_COLUMNS: &str = "episode_id, tv_show_id, season_number, episode_number, name,
     air_date, overview, vote_average, image, is_watched";

/// SQLite-backed storage for cached episodes, watched flags and recent shows.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, TvShelfError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, TvShelfError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    // ── Season episodes ─────────────────────────────────────────

    /// Insert or refresh a cached episode.
    ///
    /// The watched flag is only written when the row is new. An existing row
    /// keeps its stored flag, which only `set_watched_status` changes.
    pub fn upsert_episode(&self, episode: &SeasonEpisode) -> Result<(), TvShelfError> {
        self.conn.execute(
            "INSERT INTO season_episode (episode_id, tv_show_id, season_number, episode_number,
             name, air_date, overview, vote_average, image, is_watched)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(episode_id) DO UPDATE SET
               tv_show_id = excluded.tv_show_id,
               season_number = excluded.season_number,
               episode_number = excluded.episode_number,
               name = excluded.name,
               air_date = excluded.air_date,
               overview = excluded.overview,
               vote_average = excluded.vote_average,
               image = excluded.image",
            params![
                episode.episode_id,
                episode.tv_show_id,
                episode.season_number,
                episode.episode_number,
                episode.name,
                episode.air_date,
                episode.overview,
                episode.vote_average,
                episode.image,
                episode.is_watched as i32,
            ],
        )?;
        Ok(())
    }

    /// All cached episodes of one season, in episode order.
    pub fn get_episodes_by_season(
        &self,
        tv_show_id: i64,
        season_number: u32,
    ) -> Result<Vec<SeasonEpisode>, TvShelfError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EPISODE_COLUMNS} FROM season_episode
             WHERE tv_show_id = ?1 AND season_number = ?2
             ORDER BY episode_number, episode_id"
        ))?;
        let rows = stmt
            .query_map(params![tv_show_id, season_number], |row| {
                Ok(row_to_episode(row))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Highest-rated cached episodes of a show across all seasons.
    pub fn get_top_episodes(
        &self,
        tv_show_id: i64,
        limit: u32,
    ) -> Result<Vec<SeasonEpisode>, TvShelfError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EPISODE_COLUMNS} FROM season_episode
             WHERE tv_show_id = ?1
             ORDER BY vote_average DESC, season_number, episode_number
             LIMIT ?2"
        ))?;
        let rows = stmt
            .query_map(params![tv_show_id, limit], |row| Ok(row_to_episode(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Watched flag for an episode. Unknown episodes are unwatched.
    pub fn get_watched_status(&self, episode_id: i64) -> Result<bool, TvShelfError> {
        let watched: Option<i32> = self
            .conn
            .query_row(
                "SELECT is_watched FROM season_episode WHERE episode_id = ?1",
                params![episode_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(watched.unwrap_or(0) != 0)
    }

    /// Persist a watched flag.
    ///
    /// If the episode has not been cached yet a placeholder row is created,
    /// so the flag survives until the episode is fetched and upserted.
    pub fn set_watched_status(&self, episode_id: i64, watched: bool) -> Result<(), TvShelfError> {
        self.conn.execute(
            "INSERT INTO season_episode (episode_id, is_watched) VALUES (?1, ?2)
             ON CONFLICT(episode_id) DO UPDATE SET is_watched = excluded.is_watched",
            params![episode_id, watched as i32],
        )?;
        Ok(())
    }

    // ── Recent shows ────────────────────────────────────────────

    /// Insert a recent show, or refresh its data and timestamp if already present.
    pub fn upsert_recent_show(&self, recent: &RecentShow) -> Result<(), TvShelfError> {
        self.conn.execute(
            "INSERT INTO recent_show (show_id, title, description, poster_path, air_date, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(show_id) DO UPDATE SET
               title = excluded.title,
               description = excluded.description,
               poster_path = excluded.poster_path,
               air_date = excluded.air_date,
               added_at = excluded.added_at",
            params![
                recent.show.id,
                recent.show.title,
                recent.show.description,
                recent.show.poster_path,
                recent.show.air_date,
                recent.added_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All recent shows, most recently opened first.
    pub fn get_recent_shows(&self) -> Result<Vec<RecentShow>, TvShelfError> {
        let mut stmt = self.conn.prepare(
            "SELECT show_id, title, description, poster_path, air_date, added_at
             FROM recent_show
             ORDER BY added_at DESC, show_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let added_at_str: String = row.get(5)?;
                Ok(RecentShow {
                    show: Show {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        poster_path: row.get(3)?,
                        air_date: row.get(4)?,
                    },
                    added_at: parse_datetime(&added_at_str),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}

// ── Migrations ──────────────────────────────────────────────────

/// Run schema migrations using `PRAGMA user_version` for version tracking.
fn run_migrations(conn: &Connection) -> Result<(), TvShelfError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
        tracing::debug!("applied schema v1");
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

/// Parse a datetime string from SQLite (either RFC 3339 or SQLite's `datetime('now')` format).
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    tracing::warn!(value = s, "unparseable timestamp in database");
    DateTime::default()
}

fn row_to_episode(row: &rusqlite::Row<'_>) -> SeasonEpisode {
    SeasonEpisode {
        episode_id: row.get(0).unwrap_or(0),
        tv_show_id: row.get(1).unwrap_or(0),
        season_number: row.get(2).unwrap_or(0),
        episode_number: row.get(3).unwrap_or(0),
        name: row.get(4).unwrap_or_default(),
        air_date: row.get(5).unwrap_or_default(),
        overview: row.get(6).unwrap_or_default(),
        vote_average: row.get(7).unwrap_or(0.0),
        image: row.get(8).unwrap_or_default(),
        is_watched: row.get::<_, i32>(9).unwrap_or(0) != 0,
    }
}
