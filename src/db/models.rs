// Data models shared with the UI layer
// Field names serialize in camelCase to match the client-facing JSON schema
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathingTechnique {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    /// Inhale duration in seconds, must be positive.
    pub inhale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold1: Option<f64>,
    /// Exhale duration in seconds, must be positive.
    pub exhale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold2: Option<f64>,
    /// Sum of the four durations above; used for display pacing.
    pub total_cycle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub id: String,
    pub technique: String,
    /// Session length in seconds.
    pub duration: i64,
    pub cycles_completed: i64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Volume percentage, 0-100.
    pub volume: u8,
    /// Preferred session length in minutes.
    pub session_duration: u32,
    pub background_sound: String,
    pub voice_guidance: bool,
    pub dark_mode: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            volume: 70,
            session_duration: 10,
            background_sound: "ocean".to_string(),
            voice_guidance: true,
            dark_mode: false,
        }
    }
}

/// Partial update for `UserSettings`; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsPatch {
    pub volume: Option<u8>,
    pub session_duration: Option<u32>,
    pub background_sound: Option<String>,
    pub voice_guidance: Option<bool>,
    pub dark_mode: Option<bool>,
}

impl UserSettings {
    pub fn apply(&mut self, patch: &UserSettingsPatch) {
        if let Some(volume) = patch.volume {
            self.volume = volume.min(100);
        }
        if let Some(session_duration) = patch.session_duration {
            self.session_duration = session_duration;
        }
        if let Some(background_sound) = &patch.background_sound {
            self.background_sound = background_sound.clone();
        }
        if let Some(voice_guidance) = patch.voice_guidance {
            self.voice_guidance = voice_guidance;
        }
        if let Some(dark_mode) = patch.dark_mode {
            self.dark_mode = dark_mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn technique_serializes_with_camel_case_and_optional_holds() {
        let technique = BreathingTechnique {
            id: "478".to_string(),
            name: "4-7-8 Technique".to_string(),
            description: "Dr. Weil's technique for anxiety relief and better sleep.".to_string(),
            icon: "bed".to_string(),
            color: "from-green-400 to-green-600".to_string(),
            inhale: 4.0,
            hold1: Some(7.0),
            exhale: 8.0,
            hold2: None,
            total_cycle: 19.0,
        };

        let json = serde_json::to_value(&technique).unwrap();
        assert_eq!(json["totalCycle"], 19.0);
        assert_eq!(json["hold1"], 7.0);
        assert!(json.get("hold2").is_none());
    }

    #[test]
    fn stats_round_trip_uses_camel_case() {
        let json = r#"{"id":"1","technique":"box","duration":120,"cyclesCompleted":7,"timestamp":"2024-01-01T00:00:00Z"}"#;
        let stats: SessionStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.cycles_completed, 7);
        let back = serde_json::to_string(&stats).unwrap();
        assert!(back.contains("cyclesCompleted"));
    }

    #[test]
    fn patch_merges_and_clamps_volume() {
        let mut settings = UserSettings::default();
        settings.apply(&UserSettingsPatch {
            volume: Some(110),
            dark_mode: Some(true),
            ..Default::default()
        });
        assert_eq!(settings.volume, 100);
        assert!(settings.dark_mode);
        // untouched fields keep their defaults
        assert_eq!(settings.background_sound, "ocean");
        assert!(settings.voice_guidance);
    }
}
