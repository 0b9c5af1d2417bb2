// Phase derivation
// Expands a technique's durations into the ordered, cyclic phase sequence
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::db::models::BreathingTechnique;

pub const INHALE_INSTRUCTION: &str = "Breathe in slowly through your nose";
pub const HOLD_INSTRUCTION: &str = "Hold your breath";
pub const EXHALE_INSTRUCTION: &str = "Breathe out slowly through your mouth";

/// Tolerance when checking `totalCycle` against the summed durations.
const CYCLE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseName {
    Inhale,
    Hold,
    Exhale,
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseName::Inhale => write!(f, "Inhale"),
            PhaseName::Hold => write!(f, "Hold"),
            PhaseName::Exhale => write!(f, "Exhale"),
        }
    }
}

/// One segment of a breathing cycle. The sequence wraps: after the last
/// phase the next phase is the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreathingPhase {
    pub name: PhaseName,
    pub duration_ms: u64,
    pub instruction: &'static str,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TechniqueError {
    #[error("technique `{id}`: {field} must be greater than zero")]
    NonPositiveDuration { id: String, field: &'static str },
    #[error("technique `{id}`: hold durations cannot be negative")]
    NegativeHold { id: String },
    #[error("technique `{id}`: totalCycle {total_cycle} does not match the duration sum {sum}")]
    CycleMismatch { id: String, total_cycle: f64, sum: f64 },
}

/// Expand a technique into its phase sequence: Inhale, optional Hold,
/// Exhale, optional trailing Hold. Rejects malformed durations before any
/// session state is touched.
pub fn derive_phases(technique: &BreathingTechnique) -> Result<Vec<BreathingPhase>, TechniqueError> {
    validate(technique)?;

    let mut phases = vec![BreathingPhase {
        name: PhaseName::Inhale,
        duration_ms: to_ms(technique.inhale),
        instruction: INHALE_INSTRUCTION,
    }];

    if let Some(hold) = technique.hold1.filter(|h| *h > 0.0) {
        phases.push(BreathingPhase {
            name: PhaseName::Hold,
            duration_ms: to_ms(hold),
            instruction: HOLD_INSTRUCTION,
        });
    }

    phases.push(BreathingPhase {
        name: PhaseName::Exhale,
        duration_ms: to_ms(technique.exhale),
        instruction: EXHALE_INSTRUCTION,
    });

    if let Some(hold) = technique.hold2.filter(|h| *h > 0.0) {
        phases.push(BreathingPhase {
            name: PhaseName::Hold,
            duration_ms: to_ms(hold),
            instruction: HOLD_INSTRUCTION,
        });
    }

    Ok(phases)
}

fn validate(technique: &BreathingTechnique) -> Result<(), TechniqueError> {
    if technique.inhale <= 0.0 {
        return Err(TechniqueError::NonPositiveDuration {
            id: technique.id.clone(),
            field: "inhale",
        });
    }
    if technique.exhale <= 0.0 {
        return Err(TechniqueError::NonPositiveDuration {
            id: technique.id.clone(),
            field: "exhale",
        });
    }
    if technique.hold1.is_some_and(|h| h < 0.0) || technique.hold2.is_some_and(|h| h < 0.0) {
        return Err(TechniqueError::NegativeHold {
            id: technique.id.clone(),
        });
    }

    let sum = technique.inhale
        + technique.hold1.unwrap_or(0.0)
        + technique.exhale
        + technique.hold2.unwrap_or(0.0);
    if (sum - technique.total_cycle).abs() > CYCLE_EPSILON {
        return Err(TechniqueError::CycleMismatch {
            id: technique.id.clone(),
            total_cycle: technique.total_cycle,
            sum,
        });
    }

    Ok(())
}

fn to_ms(seconds: f64) -> u64 {
    (seconds * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technique::catalog::builtin_technique;

    fn technique(
        inhale: f64,
        hold1: Option<f64>,
        exhale: f64,
        hold2: Option<f64>,
    ) -> BreathingTechnique {
        BreathingTechnique {
            id: "test".to_string(),
            name: "Test".to_string(),
            description: String::new(),
            icon: "lungs".to_string(),
            color: "from-blue-400 to-blue-600".to_string(),
            inhale,
            hold1,
            exhale,
            hold2,
            total_cycle: inhale + hold1.unwrap_or(0.0) + exhale + hold2.unwrap_or(0.0),
        }
    }

    #[test]
    fn both_holds_give_four_phases_in_order() {
        let phases = derive_phases(&technique(4.0, Some(4.0), 4.0, Some(4.0))).unwrap();
        let names: Vec<PhaseName> = phases.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                PhaseName::Inhale,
                PhaseName::Hold,
                PhaseName::Exhale,
                PhaseName::Hold
            ]
        );
    }

    #[test]
    fn no_holds_give_two_phases() {
        let phases = derive_phases(&technique(2.0, None, 2.0, None)).unwrap();
        let names: Vec<PhaseName> = phases.iter().map(|p| p.name).collect();
        assert_eq!(names, vec![PhaseName::Inhale, PhaseName::Exhale]);
    }

    #[test]
    fn only_first_hold_gives_three_phases() {
        let phases = derive_phases(&technique(4.0, Some(7.0), 8.0, None)).unwrap();
        assert_eq!(phases.len(), 3);
        let durations: Vec<u64> = phases.iter().map(|p| p.duration_ms).collect();
        assert_eq!(durations, vec![4000, 7000, 8000]);
    }

    #[test]
    fn zero_hold_is_treated_as_absent() {
        let phases = derive_phases(&technique(4.0, Some(0.0), 6.0, None)).unwrap();
        assert_eq!(phases.len(), 2);
    }

    #[test]
    fn instructions_match_the_guide_text() {
        let phases = derive_phases(&technique(4.0, Some(4.0), 4.0, None)).unwrap();
        assert_eq!(phases[0].instruction, INHALE_INSTRUCTION);
        assert_eq!(phases[1].instruction, HOLD_INSTRUCTION);
        assert_eq!(phases[2].instruction, EXHALE_INSTRUCTION);
    }

    #[test]
    fn rejects_non_positive_required_durations() {
        let mut bad = technique(0.0, None, 4.0, None);
        bad.total_cycle = 4.0;
        assert!(matches!(
            derive_phases(&bad),
            Err(TechniqueError::NonPositiveDuration { field: "inhale", .. })
        ));

        let mut bad = technique(4.0, None, -1.0, None);
        bad.total_cycle = 3.0;
        assert!(matches!(
            derive_phases(&bad),
            Err(TechniqueError::NonPositiveDuration { field: "exhale", .. })
        ));
    }

    #[test]
    fn rejects_negative_holds_and_cycle_mismatch() {
        let bad = technique(4.0, Some(-2.0), 4.0, None);
        assert!(matches!(
            derive_phases(&bad),
            Err(TechniqueError::NegativeHold { .. })
        ));

        let mut bad = technique(4.0, Some(4.0), 4.0, Some(4.0));
        bad.total_cycle = 15.0;
        assert!(matches!(
            derive_phases(&bad),
            Err(TechniqueError::CycleMismatch { .. })
        ));
    }

    #[test]
    fn builtin_catalog_passes_validation() {
        for id in ["deep", "box", "478"] {
            let technique = builtin_technique(id).unwrap();
            derive_phases(&technique).unwrap();
        }
    }
}
