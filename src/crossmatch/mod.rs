//! Positional cross-match against stellar catalogs.
//!
//! A [`CrossMatcher`] takes one sky position and returns the nearest catalog
//! source inside its search cone, if any. Positions come from the scraped
//! sexagesimal strings and are parsed here into decimal degrees.

pub mod gaia;

use crate::candidate::{CatalogMatch, SkyCoordinates};
use thiserror::Error;

pub use gaia::GaiaTapClient;

/// Parsing failures for a sexagesimal coordinate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("empty {axis} coordinate")]
    Empty { axis: &'static str },
    #[error("malformed {axis} coordinate '{value}'")]
    Malformed { axis: &'static str, value: String },
    #[error("{axis} coordinate '{value}' is out of range")]
    OutOfRange { axis: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum CrossMatchError {
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog returned HTTP {status}")]
    Status { status: u16 },
    #[error("unexpected catalog response: {0}")]
    Response(String),
}

/// ICRS position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPosition {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

impl SkyPosition {
    /// Parse right ascension (hours) and declination (degrees).
    ///
    /// Accepts `21:42:15.42`, `21 42 15.42`, `12h30m45s` for RA and
    /// `+53:17:43.1`, `-05 12 07`, `+45d30m15s`, `+53°17'43"` for Dec.
    pub fn parse(ra: &str, dec: &str) -> Result<Self, CoordinateError> {
        let (ra_negative, ra_hours) = parse_sexagesimal(ra, "RA")?;
        if ra_negative || !(0.0..24.0).contains(&ra_hours) {
            return Err(CoordinateError::OutOfRange {
                axis: "RA",
                value: ra.trim().to_string(),
            });
        }

        let (dec_negative, dec_abs) = parse_sexagesimal(dec, "Dec")?;
        if dec_abs > 90.0 {
            return Err(CoordinateError::OutOfRange {
                axis: "Dec",
                value: dec.trim().to_string(),
            });
        }

        Ok(Self {
            ra_deg: ra_hours * 15.0,
            dec_deg: if dec_negative { -dec_abs } else { dec_abs },
        })
    }

    pub fn from_coordinates(coords: &SkyCoordinates) -> Result<Self, CoordinateError> {
        Self::parse(&coords.ra, &coords.dec)
    }

    /// Great-circle distance in arcseconds (haversine)
    #[must_use]
    pub fn separation_arcsec(&self, other: &Self) -> f64 {
        let (ra1, dec1) = (self.ra_deg.to_radians(), self.dec_deg.to_radians());
        let (ra2, dec2) = (other.ra_deg.to_radians(), other.dec_deg.to_radians());
        let half_ddec = ((dec2 - dec1) / 2.0).sin();
        let half_dra = ((ra2 - ra1) / 2.0).sin();
        let h = (dec1.cos() * dec2.cos()).mul_add(half_dra * half_dra, half_ddec * half_ddec);
        2.0 * h.sqrt().min(1.0).asin().to_degrees() * 3600.0
    }
}

/// Split a sexagesimal string into (is negative, absolute value in its base unit)
fn parse_sexagesimal(text: &str, axis: &'static str) -> Result<(bool, f64), CoordinateError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoordinateError::Empty { axis });
    }
    let malformed = || CoordinateError::Malformed {
        axis,
        value: trimmed.to_string(),
    };

    let (negative, body) = match trimmed.chars().next() {
        Some('-' | '\u{2212}') => (true, trimmed.trim_start_matches(['-', '\u{2212}'])),
        Some('+') => (false, trimmed.trim_start_matches('+')),
        _ => (false, trimmed),
    };

    let normalized: String = body
        .chars()
        .map(|c| match c {
            'h' | 'm' | 's' | 'd' | ':' | '\'' | '"' | '°' | '′' | '″' => ' ',
            other => other,
        })
        .collect();

    let parts = normalized
        .split_whitespace()
        .map(|part| part.parse::<f64>().map_err(|_| malformed()))
        .collect::<Result<Vec<f64>, _>>()?;

    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(malformed());
    }
    if parts.iter().skip(1).any(|p| *p >= 60.0) {
        return Err(CoordinateError::OutOfRange {
            axis,
            value: trimmed.to_string(),
        });
    }

    let value = parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(part, divisor)| part / divisor)
        .sum::<f64>();

    Ok((negative, value))
}

/// A catalog that can be queried one position at a time
pub trait CrossMatcher: Send + Sync {
    /// Short catalog name for logs
    fn name(&self) -> &str;

    /// Nearest catalog source within the search cone, `None` when the cone is empty
    fn lookup(&self, position: &SkyPosition) -> Result<Option<CatalogMatch>, CrossMatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_colon_separated() {
        let pos = SkyPosition::parse("21:42:15.42", "+53:17:43.1").expect("valid position");
        assert!(close(pos.ra_deg, (21.0 + 42.0 / 60.0 + 15.42 / 3600.0) * 15.0));
        assert!(close(pos.dec_deg, 53.0 + 17.0 / 60.0 + 43.1 / 3600.0));
    }

    #[test]
    fn test_letter_separated_and_negative() {
        let pos = SkyPosition::parse("12h30m45s", "-45d30m15s").expect("valid position");
        assert!(close(pos.ra_deg, 187.6875));
        assert!(close(pos.dec_deg, -(45.0 + 30.0 / 60.0 + 15.0 / 3600.0)));
    }

    #[test]
    fn test_space_and_symbol_separated() {
        let pos = SkyPosition::parse("06 12 34.56", "+05°07'08\"").expect("valid position");
        assert!(close(pos.ra_deg, (6.0 + 12.0 / 60.0 + 34.56 / 3600.0) * 15.0));
        assert!(close(pos.dec_deg, 5.0 + 7.0 / 60.0 + 8.0 / 3600.0));
    }

    #[test]
    fn test_negative_zero_degrees_keeps_sign() {
        let pos = SkyPosition::parse("00:00:00", "-00:30:00").expect("valid position");
        assert!(close(pos.dec_deg, -0.5));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            SkyPosition::parse("", "+10:00:00"),
            Err(CoordinateError::Empty { axis: "RA" })
        );
        assert!(matches!(
            SkyPosition::parse("ab:cd", "+10:00:00"),
            Err(CoordinateError::Malformed { .. })
        ));
        assert!(matches!(
            SkyPosition::parse("25:00:00", "+10:00:00"),
            Err(CoordinateError::OutOfRange { axis: "RA", .. })
        ));
        assert!(matches!(
            SkyPosition::parse("10:00:00", "+91:00:00"),
            Err(CoordinateError::OutOfRange { axis: "Dec", .. })
        ));
        assert!(matches!(
            SkyPosition::parse("10:75:00", "+10:00:00"),
            Err(CoordinateError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_separation() {
        let a = SkyPosition { ra_deg: 10.0, dec_deg: 20.0 };
        let b = SkyPosition { ra_deg: 10.0, dec_deg: 20.001 };
        assert!((a.separation_arcsec(&b) - 3.6).abs() < 1e-6);
        assert!(a.separation_arcsec(&a).abs() < 1e-9);
    }
}
