//! Helium abundance corrections to the ion fluid.

use crate::error::{PhysicsError, PhysicsResult};

/// Correction factors derived from the helium-to-hydrogen number ratio.
///
/// With helium present the ion fluid is no longer pure protons: the average
/// ion charge rises above one and the mean ion mass above the proton mass.
/// `boltzmann_correction` scales `k_B` in the ion equation of state and
/// `ion_mass_correction` scales the proton mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbundanceCorrection {
    pub boltzmann_correction: f64,
    pub ion_mass_correction: f64,
}

impl AbundanceCorrection {
    /// Compute both factors from the helium-to-hydrogen ratio.
    pub fn from_helium_ratio(helium_to_hydrogen_ratio: f64) -> PhysicsResult<Self> {
        if !helium_to_hydrogen_ratio.is_finite() || helium_to_hydrogen_ratio < 0.0 {
            return Err(PhysicsError::NonPhysical {
                what: "helium_to_hydrogen_ratio",
                value: helium_to_hydrogen_ratio,
            });
        }
        let r = helium_to_hydrogen_ratio;
        let z_avg = (1.0 + 2.0 * r) / (1.0 + r);
        let boltzmann_correction = (1.0 + 1.0 / z_avg) / 2.0;
        let ion_mass_correction = (1.0 + 4.0 * r) / (2.0 + 3.0 * r) * 2.0 * boltzmann_correction;
        Ok(Self {
            boltzmann_correction,
            ion_mass_correction,
        })
    }

    /// Pure hydrogen plasma: both factors are one.
    pub fn hydrogen_only() -> Self {
        Self {
            boltzmann_correction: 1.0,
            ion_mass_correction: 1.0,
        }
    }
}

impl Default for AbundanceCorrection {
    fn default() -> Self {
        Self::hydrogen_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn zero_helium_is_identity() {
        let c = AbundanceCorrection::from_helium_ratio(0.0).unwrap();
        assert!(close(c.boltzmann_correction, 1.0));
        assert!(close(c.ion_mass_correction, 1.0));
        assert_eq!(c, AbundanceCorrection::hydrogen_only());
    }

    #[test]
    fn tenth_helium() {
        // z_avg = 12/11, so (1 + 11/12)/2 = 23/24 and (1.4/2.3)*2*(23/24) = 7/6
        let c = AbundanceCorrection::from_helium_ratio(0.1).unwrap();
        assert!(close(c.boltzmann_correction, 23.0 / 24.0));
        assert!(close(c.ion_mass_correction, 7.0 / 6.0));
    }

    #[test]
    fn equal_helium() {
        let c = AbundanceCorrection::from_helium_ratio(1.0).unwrap();
        assert!(close(c.boltzmann_correction, 5.0 / 6.0));
        assert!(close(c.ion_mass_correction, 5.0 / 3.0));
    }

    #[test]
    fn rejects_negative_ratio() {
        assert!(AbundanceCorrection::from_helium_ratio(-0.1).is_err());
        assert!(AbundanceCorrection::from_helium_ratio(f64::NAN).is_err());
    }

    proptest! {
        #[test]
        fn deterministic_and_bounded(r in 0.0f64..10.0) {
            let a = AbundanceCorrection::from_helium_ratio(r).unwrap();
            let b = AbundanceCorrection::from_helium_ratio(r).unwrap();
            prop_assert_eq!(a, b);
            // z_avg lies in [1, 2) so the Boltzmann factor lies in (3/4, 1]
            prop_assert!(a.boltzmann_correction <= 1.0 + 1e-15);
            prop_assert!(a.boltzmann_correction > 0.75);
            prop_assert!(a.ion_mass_correction >= 1.0 - 1e-12);
        }
    }
}
