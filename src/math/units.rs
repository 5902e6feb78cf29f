use serde::Deserialize;

/// Length units accepted at construction time. Everything is stored in mm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Millimeter,
    Centimeter,
    Meter,
}

impl LengthUnit {
    /// Converts `value` expressed in this unit to millimeters.
    #[must_use]
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Self::Millimeter => value,
            Self::Centimeter => value * 10.0,
            Self::Meter => value * 1000.0,
        }
    }
}

/// Angle units accepted at construction time. Everything is stored in radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Radian,
    Degree,
}

impl AngleUnit {
    /// Converts `value` expressed in this unit to radians.
    #[must_use]
    pub fn to_rad(self, value: f64) -> f64 {
        match self {
            Self::Radian => value,
            Self::Degree => value.to_radians(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lengths_normalize_to_mm() {
        assert_relative_eq!(LengthUnit::Meter.to_mm(5.0), 5000.0);
        assert_relative_eq!(LengthUnit::Centimeter.to_mm(2.5), 25.0);
        assert_relative_eq!(LengthUnit::Millimeter.to_mm(0.017), 0.017);
    }

    #[test]
    fn degrees_normalize_to_radians() {
        assert_relative_eq!(AngleUnit::Degree.to_rad(180.0), std::f64::consts::PI);
        assert_relative_eq!(AngleUnit::Radian.to_rad(1.25), 1.25);
    }
}
