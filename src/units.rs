use crate::entity::Header;

/// Drawing length units.
///
/// The discriminants are an external contract shared with callers
/// (0=unspecified, 1=inches, 2=feet, 3=mm, 4=cm, 5=m) and must not be
/// renumbered. Note this is *not* the DXF `$INSUNITS` encoding; see
/// [`Unit::from_insunits`] for that mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    Unspecified,
    Inches,
    Feet,
    Millimeters,
    Centimeters,
    Meters,
}

impl Unit {
    /// Length of one unit expressed in millimeters.
    pub fn to_mm(self) -> f64 {
        match self {
            Unit::Inches => 25.4,
            Unit::Feet => 304.8,
            Unit::Millimeters => 1.0,
            Unit::Centimeters => 10.0,
            Unit::Meters => 1000.0,
            Unit::Unspecified => 1.0,
        }
    }

    /// Multiplier converting coordinates in `source` units to `target` units.
    pub fn scale_factor(source: Unit, target: Unit) -> f64 {
        source.to_mm() / target.to_mm()
    }

    /// External integer code (the fixed caller-facing contract).
    pub fn code(self) -> i32 {
        match self {
            Unit::Unspecified => 0,
            Unit::Inches => 1,
            Unit::Feet => 2,
            Unit::Millimeters => 3,
            Unit::Centimeters => 4,
            Unit::Meters => 5,
        }
    }

    pub fn from_code(code: i32) -> Unit {
        match code {
            1 => Unit::Inches,
            2 => Unit::Feet,
            3 => Unit::Millimeters,
            4 => Unit::Centimeters,
            5 => Unit::Meters,
            _ => Unit::Unspecified,
        }
    }

    /// Maps a DXF `$INSUNITS` header value. Codes this tool does not work
    /// with (angstroms, parsecs, ...) collapse to unspecified.
    pub fn from_insunits(value: i32) -> Unit {
        match value {
            1 => Unit::Inches,
            2 => Unit::Feet,
            4 => Unit::Millimeters,
            5 => Unit::Centimeters,
            6 => Unit::Meters,
            _ => Unit::Unspecified,
        }
    }

    /// The `$INSUNITS` header value naming this unit on export.
    pub fn insunits_code(self) -> i32 {
        match self {
            Unit::Inches => 1,
            Unit::Feet => 2,
            Unit::Millimeters => 4,
            Unit::Centimeters => 5,
            Unit::Meters => 6,
            Unit::Unspecified => 0,
        }
    }

    pub fn is_metric(self) -> bool {
        matches!(self, Unit::Millimeters | Unit::Centimeters | Unit::Meters)
    }

    /// Reads the unit from header metadata: `$INSUNITS` when present,
    /// otherwise the `$MEASUREMENT` system flag (0=English, else metric).
    pub fn detect_from_header(header: &Header) -> Unit {
        if let Some(insunits) = header.insunits {
            return Unit::from_insunits(insunits);
        }
        if let Some(measurement) = header.measurement {
            return if measurement == 0 {
                Unit::Inches
            } else {
                Unit::Millimeters
            };
        }
        Unit::Unspecified
    }

    /// Guesses the unit from raw drawing extents. Fallback only, for files
    /// whose header carries no unit metadata.
    pub fn detect_from_dimensions(width: f64, height: f64) -> Unit {
        let max_dim = f64::max(width.abs(), height.abs());
        if max_dim < 1.0 {
            Unit::Inches
        } else if max_dim > 1000.0 {
            Unit::Meters
        } else if max_dim < 10.0 {
            Unit::Centimeters
        } else {
            Unit::Millimeters
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Unit::Inches => "inches",
            Unit::Feet => "feet",
            Unit::Millimeters => "millimeters",
            Unit::Centimeters => "centimeters",
            Unit::Meters => "meters",
            Unit::Unspecified => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factor_to_mm() {
        assert_eq!(Unit::scale_factor(Unit::Inches, Unit::Millimeters), 25.4);
        assert_eq!(Unit::scale_factor(Unit::Feet, Unit::Millimeters), 304.8);
        assert_eq!(Unit::scale_factor(Unit::Millimeters, Unit::Millimeters), 1.0);
        assert_eq!(Unit::scale_factor(Unit::Centimeters, Unit::Millimeters), 10.0);
        assert_eq!(Unit::scale_factor(Unit::Meters, Unit::Millimeters), 1000.0);
        assert_eq!(Unit::scale_factor(Unit::Unspecified, Unit::Millimeters), 1.0);
    }

    #[test]
    fn test_code_round_trip() {
        for code in 0..=5 {
            assert_eq!(Unit::from_code(code).code(), code);
        }
        assert_eq!(Unit::from_code(99), Unit::Unspecified);
    }

    #[test]
    fn test_insunits_mapping_differs_from_codes() {
        assert_eq!(Unit::from_insunits(4), Unit::Millimeters);
        assert_eq!(Unit::from_insunits(6), Unit::Meters);
        assert_eq!(Unit::from_insunits(3), Unit::Unspecified);
    }

    #[test]
    fn test_detect_from_header_prefers_insunits() {
        let header = Header {
            insunits: Some(1),
            measurement: Some(1),
        };
        assert_eq!(Unit::detect_from_header(&header), Unit::Inches);
    }

    #[test]
    fn test_detect_from_header_measurement_fallback() {
        let english = Header {
            insunits: None,
            measurement: Some(0),
        };
        assert_eq!(Unit::detect_from_header(&english), Unit::Inches);

        let metric = Header {
            insunits: None,
            measurement: Some(1),
        };
        assert_eq!(Unit::detect_from_header(&metric), Unit::Millimeters);

        let empty = Header::default();
        assert_eq!(Unit::detect_from_header(&empty), Unit::Unspecified);
    }

    #[test]
    fn test_detect_from_dimensions() {
        assert_eq!(Unit::detect_from_dimensions(0.5, 0.8), Unit::Inches);
        assert_eq!(Unit::detect_from_dimensions(1500.0, 200.0), Unit::Meters);
        assert_eq!(Unit::detect_from_dimensions(5.0, 5.0), Unit::Centimeters);
        assert_eq!(Unit::detect_from_dimensions(200.0, 100.0), Unit::Millimeters);
    }
}
