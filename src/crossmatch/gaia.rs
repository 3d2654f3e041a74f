use crate::candidate::CatalogMatch;
use crate::crossmatch::{CrossMatchError, CrossMatcher, SkyPosition};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Public Gaia archive TAP endpoint (synchronous queries)
pub const DEFAULT_TAP_URL: &str = "https://gea.esac.esa.int/tap-server/tap/sync";
pub const DEFAULT_RADIUS_ARCSEC: f64 = 3.0;

/// Gaia DR3 cone search through the archive's TAP interface.
///
/// Only the nearest source inside the cone is returned.
pub struct GaiaTapClient {
    client: Client,
    endpoint: String,
    radius_arcsec: f64,
}

#[derive(Debug, Deserialize)]
struct TapColumn {
    name: String,
}

/// `FORMAT=json` payload: column metadata plus row-major data
#[derive(Debug, Deserialize)]
struct TapResponse {
    metadata: Vec<TapColumn>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

impl GaiaTapClient {
    pub fn new(
        endpoint: impl Into<String>,
        radius_arcsec: f64,
        timeout: Duration,
    ) -> Result<Self, CrossMatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("astra/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            radius_arcsec,
        })
    }

    /// ADQL for the nearest `gaiadr3.gaia_source` row inside the cone
    #[must_use]
    pub fn cone_search_query(position: &SkyPosition, radius_arcsec: f64) -> String {
        let SkyPosition { ra_deg, dec_deg } = *position;
        let radius_deg = radius_arcsec / 3600.0;
        format!(
            "SELECT TOP 1 ra, dec, pmra, pmdec, parallax, phot_g_mean_mag, \
             DISTANCE(POINT('ICRS', ra, dec), POINT('ICRS', {ra_deg:.7}, {dec_deg:.7})) AS dist \
             FROM gaiadr3.gaia_source \
             WHERE 1 = CONTAINS(POINT('ICRS', ra, dec), CIRCLE('ICRS', {ra_deg:.7}, {dec_deg:.7}, {radius_deg:.8})) \
             ORDER BY dist ASC"
        )
    }
}

impl CrossMatcher for GaiaTapClient {
    fn name(&self) -> &str {
        "Gaia DR3"
    }

    fn lookup(&self, position: &SkyPosition) -> Result<Option<CatalogMatch>, CrossMatchError> {
        let query = Self::cone_search_query(position, self.radius_arcsec);
        tracing::debug!("Gaia cone search: {query}");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "json"),
                ("QUERY", query.as_str()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrossMatchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text()?;
        parse_tap_response(&body, position)
    }
}

/// Turn a TAP JSON result into the nearest catalog match
fn parse_tap_response(
    body: &str,
    position: &SkyPosition,
) -> Result<Option<CatalogMatch>, CrossMatchError> {
    let response: TapResponse = serde_json::from_str(body)
        .map_err(|e| CrossMatchError::Response(format!("invalid TAP JSON: {e}")))?;

    let Some(row) = response.data.first() else {
        return Ok(None);
    };

    let column = |name: &str| -> Option<f64> {
        response
            .metadata
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .and_then(|idx| row.get(idx))
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    };

    let separation_arcsec = column("dist").map(|deg| deg * 3600.0).or_else(|| {
        let ra_deg = column("ra")?;
        let dec_deg = column("dec")?;
        Some(position.separation_arcsec(&SkyPosition { ra_deg, dec_deg }))
    });

    Ok(Some(CatalogMatch {
        proper_motion_ra: column("pmra"),
        proper_motion_dec: column("pmdec"),
        parallax: column("parallax"),
        catalog_magnitude: column("phot_g_mean_mag"),
        separation_arcsec,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITION: SkyPosition = SkyPosition {
        ra_deg: 325.564_25,
        dec_deg: 53.295_306,
    };

    #[test]
    fn test_query_contains_cone() {
        let query = GaiaTapClient::cone_search_query(&POSITION, 3.0);
        assert!(query.contains("FROM gaiadr3.gaia_source"));
        assert!(query.contains("CIRCLE('ICRS', 325.5642500, 53.2953060, 0.00083333)"));
        assert!(query.starts_with("SELECT TOP 1"));
    }

    #[test]
    fn test_parse_full_row() {
        let body = r#"{
            "metadata": [
                {"name": "ra"}, {"name": "dec"}, {"name": "pmra"}, {"name": "pmdec"},
                {"name": "parallax"}, {"name": "phot_g_mean_mag"}, {"name": "dist"}
            ],
            "data": [[325.5643, 53.2953, 80.0, 60.0, 2.5, 17.9, 0.0001]]
        }"#;

        let catalog = parse_tap_response(body, &POSITION)
            .expect("valid response")
            .expect("one row");
        assert_eq!(catalog.total_proper_motion(), Some(100.0));
        assert_eq!(catalog.distance_pc(), Some(400.0));
        assert_eq!(catalog.catalog_magnitude, Some(17.9));
        assert!((catalog.separation_arcsec.expect("separation") - 0.36).abs() < 1e-9);
    }

    #[test]
    fn test_parse_nulls_and_computed_separation() {
        let body = r#"{
            "metadata": [{"name": "ra"}, {"name": "dec"}, {"name": "pmra"}, {"name": "parallax"}],
            "data": [[325.56425, 53.295306, null, null]]
        }"#;

        let catalog = parse_tap_response(body, &POSITION)
            .expect("valid response")
            .expect("one row");
        assert_eq!(catalog.proper_motion_ra, None);
        assert_eq!(catalog.parallax, None);
        assert!(catalog.separation_arcsec.expect("separation") < 1e-6);
    }

    #[test]
    fn test_parse_empty_cone() {
        let body = r#"{"metadata": [{"name": "ra"}], "data": []}"#;
        assert!(parse_tap_response(body, &POSITION).expect("valid response").is_none());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_tap_response("<html>maintenance</html>", &POSITION),
            Err(CrossMatchError::Response(_))
        ));
    }
}
