// Store migrations and seed data
use anyhow::Result;
use rusqlite::{params, Connection};

use crate::db::models::UserSettings;
use crate::technique::catalog::builtin_techniques;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS techniques (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            inhale REAL NOT NULL,
            hold1 REAL,
            exhale REAL NOT NULL,
            hold2 REAL,
            total_cycle REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_stats (
            id TEXT PRIMARY KEY,
            technique TEXT NOT NULL,
            duration INTEGER NOT NULL,
            cycles_completed INTEGER NOT NULL,
            timestamp TEXT NOT NULL
        )",
        [],
    )?;

    // Single-row table; settings are a document, not a collection.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS user_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            volume INTEGER NOT NULL,
            session_duration INTEGER NOT NULL,
            background_sound TEXT NOT NULL,
            voice_guidance BOOLEAN NOT NULL,
            dark_mode BOOLEAN NOT NULL
        )",
        [],
    )?;

    seed(conn)?;

    Ok(())
}

fn seed(conn: &Connection) -> Result<()> {
    for technique in builtin_techniques() {
        conn.execute(
            "INSERT OR IGNORE INTO techniques
                (id, name, description, icon, color, inhale, hold1, exhale, hold2, total_cycle)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                technique.id,
                technique.name,
                technique.description,
                technique.icon,
                technique.color,
                technique.inhale,
                technique.hold1,
                technique.exhale,
                technique.hold2,
                technique.total_cycle,
            ],
        )?;
    }

    let defaults = UserSettings::default();
    conn.execute(
        "INSERT OR IGNORE INTO user_settings
            (id, volume, session_duration, background_sound, voice_guidance, dark_mode)
         VALUES (1, ?1, ?2, ?3, ?4, ?5)",
        params![
            defaults.volume,
            defaults.session_duration,
            defaults.background_sound,
            defaults.voice_guidance,
            defaults.dark_mode,
        ],
    )?;

    Ok(())
}
