// cl-core/src/units.rs
//
// Loop lengths arrive in Mm. The physics kernel works in cgs, so conversions
// funnel through uom here.

use uom::si::f64::Length as UomLength;

// Public canonical unit type (SI, f64)
pub type Length = UomLength;

/// Length from megameters (1 Mm = 1e8 cm), the unit loop lengths are quoted in.
#[inline]
pub fn megameters(v: f64) -> Length {
    use uom::si::length::megameter;
    Length::new::<megameter>(v)
}

/// Length expressed in centimeters.
#[inline]
pub fn to_cm(l: Length) -> f64 {
    use uom::si::length::centimeter;
    l.get::<centimeter>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn megameter_to_centimeter() {
        assert!((to_cm(megameters(40.0)) - 4.0e9).abs() < 1.0);
        assert!((to_cm(megameters(1.0)) - 1.0e8).abs() < 1e-3);
    }
}
