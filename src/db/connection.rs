// Store connection management
use anyhow::Result;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use super::migrations::run_migrations;

/// Handle to the in-memory store. Contents live as long as the process;
/// every launch starts again from the seeded catalog and default settings.
pub struct StoreConnection {
    conn: Arc<Mutex<Connection>>,
}

impl StoreConnection {
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        // Run migrations and seed data
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn get_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

impl Clone for StoreConnection {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}
