use rusqlite::{params, OptionalExtension, Row};

use crate::db::connection::StoreConnection;
use crate::db::models::{BreathingTechnique, SessionStats, UserSettings, UserSettingsPatch};

/// Store operations for the catalog, session stats and settings
pub struct DbOperations;

impl DbOperations {
    pub fn get_techniques(db: &StoreConnection) -> Result<Vec<BreathingTechnique>, anyhow::Error> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, name, description, icon, color, inhale, hold1, exhale, hold2, total_cycle
             FROM techniques ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], Self::technique_from_row)?;

        let mut techniques = Vec::new();
        for row in rows {
            techniques.push(row?);
        }
        Ok(techniques)
    }

    pub fn get_technique(
        db: &StoreConnection,
        id: &str,
    ) -> Result<Option<BreathingTechnique>, anyhow::Error> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let technique = conn
            .query_row(
                "SELECT id, name, description, icon, color, inhale, hold1, exhale, hold2, total_cycle
                 FROM techniques WHERE id = ?1",
                params![id],
                Self::technique_from_row,
            )
            .optional()?;
        Ok(technique)
    }

    pub fn add_session_stats(
        db: &StoreConnection,
        stats: &SessionStats,
    ) -> Result<(), anyhow::Error> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        conn.execute(
            "INSERT INTO session_stats (id, technique, duration, cycles_completed, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                stats.id,
                stats.technique,
                stats.duration,
                stats.cycles_completed,
                stats.timestamp,
            ],
        )?;
        Ok(())
    }

    pub fn get_session_stats(db: &StoreConnection) -> Result<Vec<SessionStats>, anyhow::Error> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, technique, duration, cycles_completed, timestamp
             FROM session_stats ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SessionStats {
                id: row.get(0)?,
                technique: row.get(1)?,
                duration: row.get(2)?,
                cycles_completed: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        Ok(stats)
    }

    pub fn get_user_settings(db: &StoreConnection) -> Result<UserSettings, anyhow::Error> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();
        Self::read_settings(&conn)
    }

    /// PATCH semantics: absent fields keep their stored value.
    pub fn update_user_settings(
        db: &StoreConnection,
        patch: &UserSettingsPatch,
    ) -> Result<UserSettings, anyhow::Error> {
        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let mut settings = Self::read_settings(&conn)?;
        settings.apply(patch);

        conn.execute(
            "UPDATE user_settings
             SET volume = ?1, session_duration = ?2, background_sound = ?3,
                 voice_guidance = ?4, dark_mode = ?5
             WHERE id = 1",
            params![
                settings.volume,
                settings.session_duration,
                settings.background_sound,
                settings.voice_guidance,
                settings.dark_mode,
            ],
        )?;
        Ok(settings)
    }

    fn read_settings(conn: &rusqlite::Connection) -> Result<UserSettings, anyhow::Error> {
        let settings = conn.query_row(
            "SELECT volume, session_duration, background_sound, voice_guidance, dark_mode
             FROM user_settings WHERE id = 1",
            [],
            |row| {
                Ok(UserSettings {
                    volume: row.get(0)?,
                    session_duration: row.get(1)?,
                    background_sound: row.get(2)?,
                    voice_guidance: row.get(3)?,
                    dark_mode: row.get(4)?,
                })
            },
        )?;
        Ok(settings)
    }

    fn technique_from_row(row: &Row<'_>) -> rusqlite::Result<BreathingTechnique> {
        Ok(BreathingTechnique {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            icon: row.get(3)?,
            color: row.get(4)?,
            inhale: row.get(5)?,
            hold1: row.get(6)?,
            exhale: row.get(7)?,
            hold2: row.get(8)?,
            total_cycle: row.get(9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StoreConnection {
        StoreConnection::open_in_memory().expect("in-memory store")
    }

    #[test]
    fn catalog_is_seeded() {
        let db = store();
        let techniques = DbOperations::get_techniques(&db).unwrap();
        assert_eq!(techniques.len(), 3);
        let ids: Vec<&str> = techniques.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["deep", "box", "478"]);
    }

    #[test]
    fn unknown_technique_is_none() {
        let db = store();
        assert!(DbOperations::get_technique(&db, "nope").unwrap().is_none());
    }

    #[test]
    fn stats_append_and_list_in_order() {
        let db = store();
        for (id, cycles) in [("a", 3), ("b", 5)] {
            DbOperations::add_session_stats(
                &db,
                &SessionStats {
                    id: id.to_string(),
                    technique: "box".to_string(),
                    duration: 60,
                    cycles_completed: cycles,
                    timestamp: "2024-01-01T00:00:00Z".to_string(),
                },
            )
            .unwrap();
        }

        let stats = DbOperations::get_session_stats(&db).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].cycles_completed, 3);
        assert_eq!(stats[1].cycles_completed, 5);
    }

    #[test]
    fn settings_default_then_patch() {
        let db = store();
        assert_eq!(
            DbOperations::get_user_settings(&db).unwrap(),
            UserSettings::default()
        );

        let updated = DbOperations::update_user_settings(
            &db,
            &UserSettingsPatch {
                volume: Some(40),
                background_sound: Some("rain".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.volume, 40);
        assert_eq!(updated.background_sound, "rain");
        // unpatched fields survive
        assert!(updated.voice_guidance);
        assert_eq!(updated.session_duration, 10);

        // and the merge is persisted
        assert_eq!(DbOperations::get_user_settings(&db).unwrap(), updated);
    }
}
