use std::{fmt, str::FromStr};

use crate::ConfigError;

/// Requested window geometry in X geometry syntax: `[=][W][xH][{+-}X{+-}Y]`.
///
/// A zero width means "size to content". The height counts notifications,
/// not pixels. A `-` offset anchors the window to the far edge of the
/// monitor, the stored offset is then negative (or zero for `-0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub x_negative: bool,
    pub y_negative: bool,
}

impl FromStr for Geometry {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidGeometry(s.to_string());
        let spec = s.trim();
        let spec = spec.strip_prefix('=').unwrap_or(spec);

        let mut geometry = Geometry::default();
        let split = spec.find(['+', '-']).unwrap_or(spec.len());
        let (size, offsets) = spec.split_at(split);

        if !size.is_empty() {
            let (w, h) = match size.split_once(['x', 'X']) {
                // a separator must be followed by a height
                Some((_, "")) => return Err(invalid()),
                Some((w, h)) => (w, Some(h)),
                None => (size, None),
            };
            if !w.is_empty() {
                geometry.width = w.parse().map_err(|_| invalid())?;
            }
            if let Some(h) = h {
                geometry.height = h.parse().map_err(|_| invalid())?;
            }
        }

        if !offsets.is_empty() {
            let (x, x_negative, rest) = parse_offset(offsets).ok_or_else(invalid)?;
            let (y, y_negative, rest) = parse_offset(rest).ok_or_else(invalid)?;
            if !rest.is_empty() {
                return Err(invalid());
            }
            geometry.x = x;
            geometry.x_negative = x_negative;
            geometry.y = y;
            geometry.y_negative = y_negative;
        }

        Ok(geometry)
    }
}

/// Parse one signed offset, returning the value, whether it is anchored to
/// the far edge, and the unparsed remainder.
fn parse_offset(s: &str) -> Option<(i32, bool, &str)> {
    let negative = match s.chars().next()? {
        '+' => false,
        '-' => true,
        _ => return None,
    };
    let digits = &s[1..];
    let end = digits.find(['+', '-']).unwrap_or(digits.len());
    let value: i32 = digits[..end].parse().ok()?;
    Some((if negative { -value } else { value }, negative, &digits[end..]))
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        let sign = |negative: bool| if negative { '-' } else { '+' };
        write!(
            f,
            "{}{}{}{}",
            sign(self.x_negative),
            self.x.unsigned_abs(),
            sign(self.y_negative),
            self.y.unsigned_abs()
        )
    }
}

impl TryFrom<String> for Geometry {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Geometry> for String {
    fn from(value: Geometry) -> Self {
        value.to_string()
    }
}
