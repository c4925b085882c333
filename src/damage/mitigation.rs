use serde::{Deserialize, Serialize};

/// The defending side of a damage calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    pub defense: f64,
    /// Resistance to the attack type, in percent.
    pub type_resistance: f64,
    /// Resistance to the attack element, in percent.
    pub element_resistance: f64,
    /// Only used for time-to-kill; 0 means unknown.
    pub hp: f64,
}

impl Target {
    pub fn new(defense: f64, type_resistance: f64, element_resistance: f64) -> Self {
        Self {
            defense,
            type_resistance,
            element_resistance,
            hp: 0.0,
        }
    }

    pub fn with_hp(mut self, hp: f64) -> Self {
        self.hp = hp;
        self
    }

    fn type_factor(&self) -> f64 {
        1.0 - self.type_resistance / 100.0
    }

    fn element_factor(&self) -> f64 {
        1.0 - self.element_resistance / 100.0
    }
}

/// `(hit − defense/2) × (1 − typeRes/100) × (1 − elemRes/100)`, at least 1.
pub fn mitigate_hit(hit: f64, target: &Target) -> f64 {
    ((hit - target.defense / 2.0) * target.type_factor() * target.element_factor()).max(1.0)
}

/// Additional-attack term: both resistances, floored at 0, defense ignored.
pub fn mitigate_extra(raw: f64, target: &Target) -> f64 {
    (raw * target.type_factor() * target.element_factor()).max(0.0)
}

/// Additional-attack term that already accounted for element resistance.
pub fn mitigate_extra_type_only(raw: f64, target: &Target) -> f64 {
    (raw * target.type_factor()).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn hit_mitigation_applies_defense_then_resistances() {
        let target = Target::new(40.0, 20.0, 50.0);
        // (100 − 20) × 0.8 × 0.5
        assert!(approx_eq(mitigate_hit(100.0, &target), 32.0));
    }

    #[test]
    fn hit_is_floored_at_one() {
        let target = Target::new(1_000.0, 0.0, 0.0);
        assert_eq!(mitigate_hit(50.0, &target), 1.0);
    }

    #[test]
    fn extra_term_is_floored_at_zero() {
        let target = Target::new(0.0, 150.0, 0.0);
        assert_eq!(mitigate_extra(40.0, &target), 0.0);
        assert!(approx_eq(
            mitigate_extra_type_only(40.0, &Target::new(0.0, 50.0, 90.0)),
            20.0
        ));
    }
}
