use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::MusicModeTag;

pub const KEY_TOUR_ACTIVE: &str = "tourActive";
pub const KEY_MUSIC_MODE: &str = "musicMode";
pub const KEY_IS_PLAYING: &str = "isPlaying";

/// Durable key-value preference store backed by SQLite.
///
/// Writes are last-write-wins and idempotent; there is no transactional
/// coupling between keys. Absent keys read as `false` / `none` through the
/// typed accessors.
#[derive(Clone)]
pub struct Preferences {
    pool: Pool<Sqlite>,
}

impl Preferences {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;

        let preferences = Self { pool };
        preferences.ensure_preferences_table().await?;
        Ok(preferences)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_preferences_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure preferences table exists")?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read preference '{key}'"))?;

        match row {
            Some(row) => {
                let value: String = row
                    .try_get("value")
                    .with_context(|| format!("failed to decode preference '{key}'"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE
            SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write preference '{key}'"))?;
        Ok(())
    }

    pub async fn tour_active(&self) -> Result<bool> {
        Ok(self.get(KEY_TOUR_ACTIVE).await?.as_deref() == Some("true"))
    }

    pub async fn set_tour_active(&self, active: bool) -> Result<()> {
        self.set(KEY_TOUR_ACTIVE, bool_value(active)).await
    }

    pub async fn is_playing(&self) -> Result<bool> {
        Ok(self.get(KEY_IS_PLAYING).await?.as_deref() == Some("true"))
    }

    pub async fn set_is_playing(&self, playing: bool) -> Result<()> {
        self.set(KEY_IS_PLAYING, bool_value(playing)).await
    }

    pub async fn music_mode(&self) -> Result<MusicModeTag> {
        Ok(self
            .get(KEY_MUSIC_MODE)
            .await?
            .map(|raw| MusicModeTag::parse(&raw))
            .unwrap_or(MusicModeTag::None))
    }

    pub async fn set_music_mode(&self, mode: MusicModeTag) -> Result<()> {
        self.set(KEY_MUSIC_MODE, mode.as_str()).await
    }
}

fn bool_value(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
