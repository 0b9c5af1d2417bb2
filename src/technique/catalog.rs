// Builtin technique catalog
// Seeded into the store at startup; ids are stable and referenced by stats
use crate::db::models::BreathingTechnique;

/// The three shipped techniques.
pub fn builtin_techniques() -> Vec<BreathingTechnique> {
    vec![
        BreathingTechnique {
            id: "deep".to_string(),
            name: "Deep Breathing".to_string(),
            description: "Simple inhale and exhale pattern for relaxation and stress relief."
                .to_string(),
            icon: "lungs".to_string(),
            color: "from-blue-400 to-blue-600".to_string(),
            inhale: 2.0,
            hold1: None,
            exhale: 2.0,
            hold2: None,
            total_cycle: 4.0,
        },
        BreathingTechnique {
            id: "box".to_string(),
            name: "Box Breathing".to_string(),
            description: "Four-count breathing used by Navy SEALs for focus and calm.".to_string(),
            icon: "square".to_string(),
            color: "from-purple-400 to-purple-600".to_string(),
            inhale: 4.0,
            hold1: Some(4.0),
            exhale: 4.0,
            hold2: Some(4.0),
            total_cycle: 16.0,
        },
        BreathingTechnique {
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
        },
    ]
}

/// Look up a builtin technique by id.
pub fn builtin_technique(id: &str) -> Option<BreathingTechnique> {
    builtin_techniques().into_iter().find(|t| t.id == id)
}
