// Application state management
use std::sync::Arc;

use crate::audio::manager::AudioManager;
use crate::db::connection::StoreConnection;
use crate::session::engine::SessionEngine;

pub struct AppState {
    pub session: Arc<SessionEngine>,
    pub audio: Arc<AudioManager>,
    pub db: StoreConnection,
}

impl AppState {
    pub fn new(session: Arc<SessionEngine>, audio: Arc<AudioManager>, db: StoreConnection) -> Self {
        Self { session, audio, db }
    }
}
