// UI-facing command handlers
// The surface a frontend or transport layer mounts; errors flatten to strings
use crate::db::models::{BreathingTechnique, SessionStats, UserSettings, UserSettingsPatch};
use crate::db::operations::DbOperations;
use crate::session::engine::SessionSnapshot;
use crate::state::AppState;

// ===== Session Control Commands =====

pub async fn play(state: &AppState) -> Result<(), String> {
    state
        .session
        .play()
        .await
        .map_err(|e| format!("Failed to start session: {}", e))
}

pub fn pause(state: &AppState) -> Result<(), String> {
    state.session.pause();
    Ok(())
}

pub fn reset(state: &AppState) -> Result<(), String> {
    state.session.reset();
    Ok(())
}

pub fn select_technique(state: &AppState, id: &str) -> Result<BreathingTechnique, String> {
    let technique = DbOperations::get_technique(&state.db, id)
        .map_err(|e| format!("Failed to fetch technique: {}", e))?
        .ok_or_else(|| format!("Technique not found: {}", id))?;

    state
        .session
        .load_technique(&technique)
        .map_err(|e| format!("Failed to load technique: {}", e))?;

    Ok(technique)
}

pub fn get_session_state(state: &AppState) -> Result<SessionSnapshot, String> {
    Ok(state.session.snapshot())
}

// ===== Technique Catalog Commands =====

pub fn get_techniques(state: &AppState) -> Result<Vec<BreathingTechnique>, String> {
    DbOperations::get_techniques(&state.db).map_err(|e| format!("Failed to fetch techniques: {}", e))
}

pub fn get_technique(state: &AppState, id: &str) -> Result<BreathingTechnique, String> {
    DbOperations::get_technique(&state.db, id)
        .map_err(|e| format!("Failed to fetch technique: {}", e))?
        .ok_or_else(|| format!("Technique not found: {}", id))
}

// ===== Session Stats Commands =====

pub fn get_session_stats(state: &AppState) -> Result<Vec<SessionStats>, String> {
    DbOperations::get_session_stats(&state.db)
        .map_err(|e| format!("Failed to fetch session stats: {}", e))
}

pub fn add_session_stats(state: &AppState, stats: SessionStats) -> Result<SessionStats, String> {
    DbOperations::add_session_stats(&state.db, &stats)
        .map_err(|e| format!("Failed to save session stats: {}", e))?;
    Ok(stats)
}

// ===== Settings Commands =====

pub fn get_settings(state: &AppState) -> Result<UserSettings, String> {
    DbOperations::get_user_settings(&state.db).map_err(|e| format!("Failed to fetch settings: {}", e))
}

/// PATCH the stored settings; a changed volume is forwarded to the audio
/// manager immediately.
pub fn update_settings(
    state: &AppState,
    patch: UserSettingsPatch,
) -> Result<UserSettings, String> {
    let volume_changed = patch.volume.is_some();
    let settings = DbOperations::update_user_settings(&state.db, &patch)
        .map_err(|e| format!("Failed to update settings: {}", e))?;

    if volume_changed {
        state.audio.set_volume(settings.volume as f32);
    }
    Ok(settings)
}

// ===== Audio Commands =====

pub fn set_volume(state: &AppState, volume: f32) -> Result<(), String> {
    state.audio.set_volume(volume);
    Ok(())
}

pub fn set_recorded_audio(state: &AppState, enabled: bool) -> Result<(), String> {
    state.audio.set_use_recorded(enabled);
    Ok(())
}
