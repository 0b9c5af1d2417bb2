// Breathwell - Guided Breathing Companion
// Module declarations
pub mod audio;
pub mod commands;
pub mod db;
pub mod session;
pub mod state;
pub mod technique;

use std::sync::Arc;

use anyhow::Result;

use audio::manager::AudioManager;
use db::connection::StoreConnection;
use db::operations::DbOperations;
use session::engine::SessionEngine;
use state::AppState;

/// Build the application state: open the in-memory store (seeding the
/// technique catalog and default settings), create the audio manager with
/// the persisted volume, and wire up the session engine.
pub fn bootstrap() -> Result<AppState> {
    let db = StoreConnection::open_in_memory()?;

    let audio = Arc::new(AudioManager::new());
    let settings = DbOperations::get_user_settings(&db)?;
    audio.set_volume(settings.volume as f32);

    let session = Arc::new(SessionEngine::new(Arc::clone(&audio)));

    Ok(AppState::new(session, audio, db))
}
